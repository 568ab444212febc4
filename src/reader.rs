//! Line-buffering reader over the child's output handle.
//!
//! The underlying read may block indefinitely, so it runs on a dedicated
//! thread that appends into a shared buffer. The driver side only ever
//! takes bounded waits: a condvar is signalled on every append and when
//! the stream ends, so the poll loop wakes as soon as bytes arrive
//! instead of spinning on a fixed interval.

use parking_lot::{Condvar, Mutex};
use std::io::Read;
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::trace;

struct State {
    buffer: Vec<u8>,
    alive: bool,
}

struct Shared {
    state: Mutex<State>,
    wakeup: Condvar,
}

/// Background reader with a non-blocking query surface.
pub struct StreamReader {
    shared: Arc<Shared>,
    handle: Option<thread::JoinHandle<()>>,
}

impl StreamReader {
    /// Start the read loop against `source`.
    ///
    /// The loop ends on end-of-stream or the first read error; either way
    /// any bytes already buffered stay retrievable.
    pub fn spawn(mut source: Box<dyn Read + Send>) -> Self {
        let shared = Arc::new(Shared {
            state: Mutex::new(State {
                buffer: Vec::new(),
                alive: true,
            }),
            wakeup: Condvar::new(),
        });

        let reader_shared = Arc::clone(&shared);
        let handle = thread::spawn(move || {
            let mut chunk = [0u8; 4096];
            loop {
                match source.read(&mut chunk) {
                    Ok(0) => break,
                    Ok(count) => {
                        trace!(count, "buffered output bytes");
                        let mut state = reader_shared.state.lock();
                        state.buffer.extend_from_slice(&chunk[..count]);
                        reader_shared.wakeup.notify_all();
                    }
                    Err(err) => {
                        // A pty master reports EIO once the child side is
                        // closed; treat it the same as end-of-stream.
                        trace!(%err, "output stream closed");
                        break;
                    }
                }
            }
            let mut state = reader_shared.state.lock();
            state.alive = false;
            reader_shared.wakeup.notify_all();
        });

        Self {
            shared,
            handle: Some(handle),
        }
    }

    /// Remove and return every completed line currently buffered.
    ///
    /// The split point is the end of the last line terminator, preferring
    /// `\r\n` over bare `\n`. An unterminated trailing fragment stays in
    /// the buffer for the next call; the result is empty when no
    /// terminator is present at all.
    pub fn drain_lines(&self) -> Vec<u8> {
        let mut state = self.shared.state.lock();
        split_completed(&mut state.buffer)
    }

    /// Take and clear the whole buffer, terminated or not.
    pub fn take_remaining(&self) -> Vec<u8> {
        let mut state = self.shared.state.lock();
        std::mem::take(&mut state.buffer)
    }

    /// Whether the unterminated tail currently starts with `prefix`.
    pub fn tail_starts_with(&self, prefix: &[u8]) -> bool {
        let state = self.shared.state.lock();
        state.buffer.starts_with(prefix)
    }

    /// Whether any unterminated bytes are buffered.
    pub fn has_partial(&self) -> bool {
        let state = self.shared.state.lock();
        !state.buffer.is_empty()
    }

    /// Whether the read loop is still running.
    pub fn is_alive(&self) -> bool {
        self.shared.state.lock().alive
    }

    /// Block for at most `timeout`, waking early when bytes arrive or the
    /// read loop ends. Returns the liveness state on wake.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut state = self.shared.state.lock();
        if !state.alive {
            return false;
        }
        let _ = self.shared.wakeup.wait_for(&mut state, timeout);
        state.alive
    }

    /// Join the reader thread to completion.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

// No Drop: dropping detaches the thread. It exits on its own once the
// source closes, which the driver guarantees by reaping the child.
// Joining in drop would deadlock error paths that still own the child.

/// Split off every completed line, leaving the unterminated tail.
///
/// `\r\n` is checked before bare `\n`: pty echo terminates lines with
/// `\r\n`, and splitting on the `\n` first could strand a bare `\r` at
/// the head of the next fragment.
fn split_completed(buffer: &mut Vec<u8>) -> Vec<u8> {
    let end = buffer
        .windows(2)
        .rposition(|pair| pair == b"\r\n")
        .map(|at| at + 2)
        .or_else(|| buffer.iter().rposition(|&byte| byte == b'\n').map(|at| at + 1));
    match end {
        Some(end) => {
            let tail = buffer.split_off(end);
            std::mem::replace(buffer, tail)
        }
        None => Vec::new(),
    }
}
