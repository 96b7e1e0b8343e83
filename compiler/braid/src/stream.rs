//! Streaming entry point.
//!
//! `format` reads the whole template from an `io::Read`, renders it, closes
//! the sink exactly once and reports the outcome to a completion callback
//! exactly once. Close failures are logged and never replace the render
//! result.

use std::io::{self, Read};

use braid_eval::{Scope, Sink, TemplateError};
use braid_scan::SourceBuffer;
use tracing::warn;

use crate::Engine;

const READ_CHUNK: usize = 8 * 1024;

impl Engine {
    /// Read a template from `input`, render it into `sink` and call `on_done`.
    #[tracing::instrument(level = "debug", skip_all, fields(mode = ?self.mode()))]
    pub fn format<R, F>(&self, input: R, sink: &mut dyn Sink, scope: &mut Scope, on_done: F)
    where
        R: Read,
        F: FnOnce(Result<(), TemplateError>),
    {
        let result = read_source(input).and_then(|text| self.render_with_mode(&text, scope, sink));
        if let Err(err) = sink.close() {
            warn!(%err, "closing output sink failed");
        }
        on_done(result);
    }
}

fn read_source(mut input: impl Read) -> Result<String, TemplateError> {
    let mut source = SourceBuffer::new();
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => source.push(&chunk[..n]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err.into()),
        }
    }
    Ok(source.finish()?)
}
