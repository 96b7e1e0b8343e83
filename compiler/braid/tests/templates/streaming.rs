//! `Engine::format` over readers and sinks.

use std::io::{self, Read};

use braid::{BufferSink, Engine, RenderMode, Scope, Sink, TemplateError};
use pretty_assertions::assert_eq;
use serde_json::json;

use crate::common::scope;

/// Reader that hands out its input a few bytes at a time and is
/// interrupted once along the way.
struct Trickle {
    data: Vec<u8>,
    pos: usize,
    interrupted: bool,
}

impl Trickle {
    fn new(text: &str) -> Self {
        Trickle {
            data: text.as_bytes().to_vec(),
            pos: 0,
            interrupted: false,
        }
    }
}

impl Read for Trickle {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if !self.interrupted && self.pos > 0 {
            self.interrupted = true;
            return Err(io::Error::new(io::ErrorKind::Interrupted, "again"));
        }
        let n = buf.len().min(3).min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }
}

struct FailingReader;

impl Read for FailingReader {
    fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
        Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"))
    }
}

/// Sink whose close always fails.
#[derive(Default)]
struct StubbornSink {
    out: String,
    closes: usize,
}

impl Sink for StubbornSink {
    fn write(&mut self, chunk: &str) -> io::Result<()> {
        self.out.push_str(chunk);
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closes += 1;
        Err(io::Error::other("refused"))
    }
}

fn format(engine: &Engine, input: impl Read, scope: &mut Scope) -> (BufferSink, Vec<bool>) {
    let sink = BufferSink::new();
    let mut writer = sink.clone();
    let mut reports = Vec::new();
    engine.format(input, &mut writer, scope, |result| reports.push(result.is_ok()));
    (sink, reports)
}

#[test]
fn chunked_input_with_multibyte_text() {
    let mut scope = scope(json!({ "name": "Zoë" }));
    let (sink, reports) = format(
        &Engine::new(),
        Trickle::new("héllo {{= name in html}} …"),
        &mut scope,
    );
    assert_eq!(sink.output(), "héllo Zoë …");
    assert_eq!(sink.close_count(), 1);
    assert_eq!(reports, vec![true]);
}

#[test]
fn every_mode_streams() {
    for mode in [RenderMode::Interpret, RenderMode::Compile, RenderMode::Sandboxed] {
        let engine = Engine::builder().mode(mode).build();
        let mut scope = scope(json!({ "xs": [1, 2] }));
        let (sink, reports) = format(&engine, "{{for x in xs {{{{= x}};}}}}".as_bytes(), &mut scope);
        assert_eq!(sink.output(), "1;2;", "mode {mode:?}");
        assert_eq!(sink.close_count(), 1);
        assert_eq!(reports, vec![true]);
    }
}

#[test]
fn render_failure_still_closes_once() {
    let (sink, reports) = format(&Engine::new(), "a {{= ghost}} b".as_bytes(), &mut Scope::new());
    assert_eq!(sink.output(), "a ");
    assert_eq!(sink.close_count(), 1);
    assert_eq!(reports, vec![false]);
}

#[test]
fn read_failure_is_reported() {
    let sink = BufferSink::new();
    let mut writer = sink.clone();
    let mut error = None;
    Engine::new().format(FailingReader, &mut writer, &mut Scope::new(), |result| {
        error = result.err();
    });
    assert!(matches!(error, Some(TemplateError::Io(_))));
    assert_eq!(sink.output(), "");
    assert_eq!(sink.close_count(), 1);
}

#[test]
fn invalid_utf8_is_reported() {
    let mut error = None;
    let mut out = String::new();
    Engine::new().format(&[b'o', b'k', 0xFF][..], &mut out, &mut Scope::new(), |result| {
        error = result.err();
    });
    assert!(matches!(
        error,
        Some(TemplateError::Scan(braid::ScanError::InvalidUtf8 { offset: 2 }))
    ));
}

#[test]
fn close_failure_does_not_hide_the_result() {
    let mut sink = StubbornSink::default();
    let mut reports = Vec::new();
    Engine::new().format("done".as_bytes(), &mut sink, &mut Scope::new(), |result| {
        reports.push(result.is_ok());
    });
    assert_eq!(sink.out, "done");
    assert_eq!(sink.closes, 1);
    assert_eq!(reports, vec![true]);
}
