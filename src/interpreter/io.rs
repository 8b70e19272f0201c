//! Exit statuses and the I/O container.
//!
//! Every execution-producing node takes an [`IoContainer`]: a triple of a
//! readable input and writable output/error streams. The enum variants
//! cover the places bytes actually go in this shell: inherited stdio,
//! anonymous OS pipes between pipeline stages, in-memory capture buffers
//! for `$(...)` and embedding, and the null device.

use std::io::{self, Cursor, PipeReader, PipeWriter, Read, Write};
use std::sync::{Arc, Mutex};

/// A command's exit status. Zero is success; everything else is failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitStatus(pub u32);

impl ExitStatus {
    pub const SUCCESS: ExitStatus = ExitStatus(0);
    pub const FAILURE: ExitStatus = ExitStatus(1);
    pub const NOT_EXECUTABLE: ExitStatus = ExitStatus(126);
    pub const UNKNOWN_COMMAND: ExitStatus = ExitStatus(127);

    pub fn is_success(self) -> bool {
        self.0 == 0
    }

    /// Success and failure swapped, for `!` pipelines.
    pub fn negate(self) -> ExitStatus {
        if self.is_success() {
            ExitStatus::FAILURE
        } else {
            ExitStatus::SUCCESS
        }
    }

    pub fn code(self) -> i32 {
        self.0 as i32
    }
}

impl From<std::process::ExitStatus> for ExitStatus {
    fn from(status: std::process::ExitStatus) -> Self {
        match status.code() {
            Some(code) if code >= 0 => ExitStatus(code as u32),
            // Killed by a signal, or an unreportable code.
            _ => ExitStatus::FAILURE,
        }
    }
}

/// Where a command reads its input from.
#[derive(Debug)]
pub enum ByteSource {
    /// Immediate EOF.
    Null,
    /// An in-memory buffer.
    Buffer(Cursor<Vec<u8>>),
    /// The read end of an anonymous pipe.
    Pipe(PipeReader),
    /// The process's own stdin.
    Stdin,
}

impl ByteSource {
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        ByteSource::Buffer(Cursor::new(bytes.into()))
    }
}

impl Read for ByteSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            ByteSource::Null => Ok(0),
            ByteSource::Buffer(c) => c.read(buf),
            ByteSource::Pipe(r) => r.read(buf),
            ByteSource::Stdin => io::stdin().read(buf),
        }
    }
}

/// Where a command writes its output. Dropping a `Pipe` sink closes the
/// write end, which is how downstream pipeline stages see EOF.
#[derive(Debug)]
pub enum ByteSink {
    Stdout,
    Stderr,
    Null,
    Pipe(PipeWriter),
    Capture(Arc<Mutex<Vec<u8>>>),
}

impl ByteSink {
    /// A capture sink plus the shared buffer it fills.
    pub fn capture() -> (ByteSink, Arc<Mutex<Vec<u8>>>) {
        let buf = Arc::new(Mutex::new(Vec::new()));
        (ByteSink::Capture(Arc::clone(&buf)), buf)
    }

    /// A second handle on the same destination. Needed when pipeline
    /// stages share the parent's stderr.
    pub fn try_clone(&self) -> io::Result<ByteSink> {
        Ok(match self {
            ByteSink::Stdout => ByteSink::Stdout,
            ByteSink::Stderr => ByteSink::Stderr,
            ByteSink::Null => ByteSink::Null,
            ByteSink::Pipe(w) => ByteSink::Pipe(w.try_clone()?),
            ByteSink::Capture(buf) => ByteSink::Capture(Arc::clone(buf)),
        })
    }
}

impl Write for ByteSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            ByteSink::Stdout => io::stdout().write(buf),
            ByteSink::Stderr => io::stderr().write(buf),
            ByteSink::Null => Ok(buf.len()),
            ByteSink::Pipe(w) => w.write(buf),
            ByteSink::Capture(shared) => {
                let mut guard = shared.lock().unwrap_or_else(|e| e.into_inner());
                guard.extend_from_slice(buf);
                Ok(buf.len())
            }
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            ByteSink::Stdout => io::stdout().flush(),
            ByteSink::Stderr => io::stderr().flush(),
            ByteSink::Pipe(w) => w.flush(),
            ByteSink::Null | ByteSink::Capture(_) => Ok(()),
        }
    }
}

/// The captured bytes so far, lossily decoded.
pub fn captured_string(buf: &Arc<Mutex<Vec<u8>>>) -> String {
    let guard = buf.lock().unwrap_or_else(|e| e.into_inner());
    String::from_utf8_lossy(&guard).into_owned()
}

/// The in/out/err triple threaded through evaluation.
#[derive(Debug)]
pub struct IoContainer {
    pub input: ByteSource,
    pub output: ByteSink,
    pub error: ByteSink,
}

impl IoContainer {
    /// The process's own stdio.
    pub fn inherited() -> Self {
        Self { input: ByteSource::Stdin, output: ByteSink::Stdout, error: ByteSink::Stderr }
    }

    /// Capture sinks with no input; returns the stdout and stderr buffers.
    pub fn captured() -> (Self, Arc<Mutex<Vec<u8>>>, Arc<Mutex<Vec<u8>>>) {
        let (out, out_buf) = ByteSink::capture();
        let (err, err_buf) = ByteSink::capture();
        (Self { input: ByteSource::Null, output: out, error: err }, out_buf, err_buf)
    }
}
