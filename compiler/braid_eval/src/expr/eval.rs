//! Tree-walking evaluation of expressions against a scope.

use std::cmp::Ordering;

use super::parser::{BinaryOp, Expr, UnaryOp};
use crate::stack::ensure_sufficient_stack;
use crate::value::{HostFunction, Value};
use crate::Scope;

/// Why an expression could not produce a value.
#[derive(Debug)]
pub(super) enum Fault {
    /// A name is not bound in the scope.
    Unbound(Box<str>),
    /// Property read on `undefined` or `null`.
    NoProperty { property: String, on: &'static str },
    /// Call target is not a function.
    NotCallable(String),
    /// A host function returned an error.
    Host { name: String, message: String },
}

pub(super) fn eval(expr: &Expr, scope: &Scope) -> Result<Value, Fault> {
    ensure_sufficient_stack(|| eval_inner(expr, scope))
}

fn eval_inner(expr: &Expr, scope: &Scope) -> Result<Value, Fault> {
    match expr {
        Expr::Literal(value) => Ok(value.clone()),
        Expr::Ident(name) => lookup(name, scope),
        Expr::Array(items) => items
            .iter()
            .map(|item| eval(item, scope))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::list),
        Expr::Member(object, property) => {
            let object = eval(object, scope)?;
            read_property(&object, property)
        }
        Expr::Index(object, key) => {
            let object = eval(object, scope)?;
            let key = eval(key, scope)?;
            if matches!(object, Value::Undefined | Value::Null) {
                return Err(Fault::NoProperty {
                    property: key.to_string(),
                    on: object.type_name(),
                });
            }
            Ok(object.index(&key))
        }
        Expr::Call(callee, args) => call(callee, args, scope),
        Expr::Unary(op, operand) => {
            let value = eval(operand, scope)?;
            Ok(match op {
                UnaryOp::Not => Value::Bool(!value.is_truthy()),
                UnaryOp::Neg => Value::Number(-value.to_number()),
                UnaryOp::Plus => Value::Number(value.to_number()),
            })
        }
        Expr::Binary(BinaryOp::And, left, right) => {
            let left = eval(left, scope)?;
            if left.is_truthy() {
                eval(right, scope)
            } else {
                Ok(left)
            }
        }
        Expr::Binary(BinaryOp::Or, left, right) => {
            let left = eval(left, scope)?;
            if left.is_truthy() {
                Ok(left)
            } else {
                eval(right, scope)
            }
        }
        Expr::Binary(op, left, right) => {
            let left = eval(left, scope)?;
            let right = eval(right, scope)?;
            Ok(binary(*op, &left, &right))
        }
        Expr::Conditional(condition, then, otherwise) => {
            if eval(condition, scope)?.is_truthy() {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
    }
}

/// Name under which an unshadowed scope is visible as a map.
const SCOPE_VIEW: &str = "$_scope";

#[inline]
pub(super) fn lookup(name: &str, scope: &Scope) -> Result<Value, Fault> {
    match scope.get(name) {
        Some(value) => Ok(value.clone()),
        None if name == SCOPE_VIEW => Ok(scope_view(scope)),
        None => Err(Fault::Unbound(name.into())),
    }
}

/// Snapshot of every binding, for keys that are not valid identifiers.
#[cold]
fn scope_view(scope: &Scope) -> Value {
    Value::map(scope.iter().map(|(name, value)| (name, value.clone())).collect())
}

fn read_property(object: &Value, property: &str) -> Result<Value, Fault> {
    if matches!(object, Value::Undefined | Value::Null) {
        return Err(Fault::NoProperty {
            property: property.to_owned(),
            on: object.type_name(),
        });
    }
    Ok(object.member(property))
}

fn call(callee: &Expr, args: &[Expr], scope: &Scope) -> Result<Value, Fault> {
    let args = args
        .iter()
        .map(|arg| eval(arg, scope))
        .collect::<Result<Vec<_>, _>>()?;

    if let Expr::Member(object, method) = callee {
        let receiver = eval(object, scope)?;
        return match read_property(&receiver, method)? {
            Value::Function(func) => invoke(&func, &args),
            _ => builtin_method(&receiver, method, &args),
        };
    }

    match eval(callee, scope)? {
        Value::Function(func) => invoke(&func, &args),
        _ => Err(Fault::NotCallable(describe_callee(callee))),
    }
}

fn invoke(func: &HostFunction, args: &[Value]) -> Result<Value, Fault> {
    func.call(args).map_err(|message| Fault::Host {
        name: func.name().to_owned(),
        message,
    })
}

/// Methods every list and string understands.
fn builtin_method(receiver: &Value, method: &str, args: &[Value]) -> Result<Value, Fault> {
    let arg = |i: usize| args.get(i).cloned().unwrap_or_default();
    let result = match (receiver, method) {
        (Value::String(s), "toUpperCase") => Value::from(s.to_uppercase()),
        (Value::String(s), "toLowerCase") => Value::from(s.to_lowercase()),
        (Value::String(s), "trim") => Value::from(s.trim()),
        (Value::String(s), "indexOf") => {
            let needle = arg(0).to_string();
            s.find(needle.as_str())
                .map_or(Value::from(-1), |byte| Value::from(s[..byte].chars().count()))
        }
        (Value::String(s), "includes") => Value::Bool(s.contains(arg(0).to_string().as_str())),
        (Value::List(items), "indexOf") => {
            let needle = arg(0);
            items
                .iter()
                .position(|item| item.strict_equals(&needle))
                .map_or(Value::from(-1), Value::from)
        }
        (Value::List(items), "includes") => {
            let needle = arg(0);
            Value::Bool(items.iter().any(|item| item.strict_equals(&needle)))
        }
        (Value::List(items), "join") => {
            let separator = match arg(0) {
                Value::Undefined => ",".to_owned(),
                other => other.to_string(),
            };
            let parts: Vec<String> = items
                .iter()
                .map(|item| match item {
                    Value::Undefined | Value::Null => String::new(),
                    other => other.to_string(),
                })
                .collect();
            Value::from(parts.join(&separator))
        }
        (_, "toString") => Value::from(receiver.to_string()),
        _ => return Err(Fault::NotCallable(method.to_owned())),
    };
    Ok(result)
}

fn describe_callee(callee: &Expr) -> String {
    match callee {
        Expr::Ident(name) => name.to_string(),
        Expr::Member(_, name) => name.to_string(),
        _ => "expression".to_owned(),
    }
}

fn binary(op: BinaryOp, left: &Value, right: &Value) -> Value {
    match op {
        BinaryOp::Add => {
            if is_textual(left) || is_textual(right) {
                Value::from(format!("{left}{right}"))
            } else {
                Value::Number(left.to_number() + right.to_number())
            }
        }
        BinaryOp::Sub => Value::Number(left.to_number() - right.to_number()),
        BinaryOp::Mul => Value::Number(left.to_number() * right.to_number()),
        BinaryOp::Div => Value::Number(left.to_number() / right.to_number()),
        BinaryOp::Rem => Value::Number(left.to_number() % right.to_number()),
        BinaryOp::Lt => Value::Bool(compare(left, right) == Some(Ordering::Less)),
        BinaryOp::Le => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Less | Ordering::Equal)
        )),
        BinaryOp::Gt => Value::Bool(compare(left, right) == Some(Ordering::Greater)),
        BinaryOp::Ge => Value::Bool(matches!(
            compare(left, right),
            Some(Ordering::Greater | Ordering::Equal)
        )),
        BinaryOp::Eq => Value::Bool(left.loose_equals(right)),
        BinaryOp::NotEq => Value::Bool(!left.loose_equals(right)),
        BinaryOp::StrictEq => Value::Bool(left.strict_equals(right)),
        BinaryOp::StrictNotEq => Value::Bool(!left.strict_equals(right)),
        // Short-circuit forms are handled before both sides are evaluated.
        BinaryOp::And | BinaryOp::Or => Value::Undefined,
    }
}

fn is_textual(value: &Value) -> bool {
    matches!(
        value,
        Value::String(_) | Value::List(_) | Value::Map(_) | Value::Function(_)
    )
}

/// Strings compare lexically, everything else numerically.
fn compare(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        _ => left.to_number().partial_cmp(&right.to_number()),
    }
}
