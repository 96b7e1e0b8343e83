//! Output sinks.
//!
//! Rendering emits output as a sequence of chunks through a [`Sink`]. The
//! concatenation of the chunks is the rendered text; chunk boundaries carry
//! no meaning and empty chunks are never emitted.
//!
//! - `String`: appends in memory
//! - [`WriterSink`]: any `io::Write` (file, socket, stdout)
//! - [`BufferSink`]: cloneable shared buffer, readable while another thread
//!   renders into it
//! - [`FnSink`]: a closure per chunk
//! - [`NullSink`]: discards everything

use std::io;
use std::sync::Arc;

use parking_lot::Mutex;

/// Destination for rendered output.
pub trait Sink {
    /// Receive the next chunk of output.
    fn write(&mut self, chunk: &str) -> io::Result<()>;

    /// Finish output. Called at most once, after the last `write`.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Sink for String {
    fn write(&mut self, chunk: &str) -> io::Result<()> {
        self.push_str(chunk);
        Ok(())
    }
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write(&mut self, chunk: &str) -> io::Result<()> {
        (**self).write(chunk)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, chunk: &str) -> io::Result<()> {
        (**self).write(chunk)
    }

    fn close(&mut self) -> io::Result<()> {
        (**self).close()
    }
}

/// Sink over an `io::Write`; `close` flushes.
#[derive(Debug)]
pub struct WriterSink<W: io::Write> {
    inner: W,
}

impl<W: io::Write> WriterSink<W> {
    pub fn new(inner: W) -> Self {
        WriterSink { inner }
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: io::Write> Sink for WriterSink<W> {
    fn write(&mut self, chunk: &str) -> io::Result<()> {
        self.inner.write_all(chunk.as_bytes())
    }

    fn close(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

#[derive(Debug, Default)]
struct BufferState {
    output: String,
    chunks: usize,
    closes: usize,
}

/// Shared in-memory sink.
///
/// Clones write into the same buffer, so one clone can be handed to a
/// renderer and another kept for reading the result.
#[derive(Clone, Debug, Default)]
pub struct BufferSink {
    state: Arc<Mutex<BufferState>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn output(&self) -> String {
        self.state.lock().output.clone()
    }

    /// Number of chunks received.
    pub fn chunk_count(&self) -> usize {
        self.state.lock().chunks
    }

    /// Number of times `close` was called.
    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    pub fn clear(&self) {
        let mut state = self.state.lock();
        state.output.clear();
        state.chunks = 0;
    }
}

impl Sink for BufferSink {
    fn write(&mut self, chunk: &str) -> io::Result<()> {
        let mut state = self.state.lock();
        state.output.push_str(chunk);
        state.chunks += 1;
        Ok(())
    }

    fn close(&mut self) -> io::Result<()> {
        self.state.lock().closes += 1;
        Ok(())
    }
}

/// Sink that hands every chunk to a closure.
pub struct FnSink<F: FnMut(&str)>(pub F);

impl<F: FnMut(&str)> Sink for FnSink<F> {
    fn write(&mut self, chunk: &str) -> io::Result<()> {
        (self.0)(chunk);
        Ok(())
    }
}

/// Sink that discards output.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullSink;

impl Sink for NullSink {
    fn write(&mut self, _chunk: &str) -> io::Result<()> {
        Ok(())
    }
}
