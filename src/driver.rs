//! Process driver: owns one child process end to end.
//!
//! Spawns the child on a pseudo-terminal, polls the [`StreamReader`] for
//! completed lines, detects interactive prompts on the unterminated tail,
//! writes the response back, and reaps the child on every exit path.

use std::io::{self, Write};
use std::time::Duration;

use portable_pty::{native_pty_system, PtySize};
use scopeguard::ScopeGuard;
use tracing::debug;

use crate::error::{AuthError, Result};
use crate::invocation::VaultCommand;
use crate::prompt::PromptResponder;
use crate::reader::StreamReader;

/// Side channel receiving the child's diagnostic output as it arrives,
/// so an interactive user sees the same prompts the child produced.
pub trait DiagnosticSink {
    fn emit(&mut self, text: &str);
}

/// Any `FnMut(&str)` closure works as a sink.
impl<F> DiagnosticSink for F
where
    F: FnMut(&str),
{
    fn emit(&mut self, text: &str) {
        self(text)
    }
}

/// Default sink: stderr, flushed per chunk so prompts show up unbuffered.
pub struct StderrSink;

impl DiagnosticSink for StderrSink {
    fn emit(&mut self, text: &str) {
        let mut stderr = io::stderr();
        let _ = stderr.write_all(text.as_bytes());
        let _ = stderr.flush();
    }
}

/// Tunables for the poll loop and prompt detection.
#[derive(Debug, Clone)]
pub struct DriverConfig {
    /// Byte prefix marking an unterminated tail as an interactive prompt.
    /// Known approximation: a non-terminated informational line with the
    /// same prefix would also match.
    pub prompt_signature: Vec<u8>,
    /// Upper bound on one poll wait.
    pub poll_interval: Duration,
    /// Extra wait granted on each poll iteration with a non-empty tail,
    /// before the tail is judged to be a stalled prompt, so a burst
    /// write in flight can finish first.
    pub burst_grace: Duration,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            prompt_signature: b"Enter ".to_vec(),
            poll_interval: Duration::from_millis(50),
            burst_grace: Duration::from_millis(10),
        }
    }
}

/// What a completed run leaves behind.
#[derive(Debug)]
pub struct RunOutcome {
    pub exit_code: u32,
    /// Everything forwarded to the diagnostic sink, in arrival order.
    pub diagnostics: String,
    /// Unterminated bytes left after the output stream closed. On the
    /// combined pty stream this is the credential payload.
    pub remainder: Vec<u8>,
}

/// Echo handling after a response is written to a pty: the line
/// discipline echoes the typed input back on the output stream.
enum EchoState {
    Idle,
    /// Suppress the next completed line iff it equals the response.
    Expect(String),
    /// Response matched; swallow the blank lines produced by the echoed
    /// terminator until real output resumes.
    DrainBlanks,
}

pub struct ProcessDriver {
    config: DriverConfig,
}

impl ProcessDriver {
    pub fn new(config: DriverConfig) -> Self {
        Self { config }
    }

    /// Run `command` to completion.
    ///
    /// Prompt detection only happens when `command` is in driver prompt
    /// mode; otherwise the loop just streams diagnostics. A non-zero exit
    /// is a hard failure carrying the captured text. The reader is
    /// joined, the pty handles closed and the child reaped on every
    /// path out of this function.
    pub fn run(
        &self,
        command: &VaultCommand,
        responder: &mut dyn PromptResponder,
        sink: &mut dyn DiagnosticSink,
    ) -> Result<RunOutcome> {
        let spawn_err = |source: anyhow::Error| AuthError::Spawn {
            command: command.command().to_string(),
            source,
        };

        let pty_system = native_pty_system();
        let pair = pty_system
            .openpty(PtySize {
                rows: 24,
                cols: 80,
                pixel_width: 0,
                pixel_height: 0,
            })
            .map_err(spawn_err)?;

        let mut cmd = command.to_builder();
        cmd.cwd(std::env::current_dir()?);

        let child = pair.slave.spawn_command(cmd).map_err(spawn_err)?;
        drop(pair.slave);
        debug!(command = %command.command(), pid = ?child.process_id(), "child spawned");

        let output = pair.master.try_clone_reader().map_err(spawn_err)?;
        let mut input = pair.master.take_writer().map_err(spawn_err)?;

        // Reap on every exit path; defused after the normal wait below.
        let mut child = scopeguard::guard(child, |mut child| {
            let _ = child.kill();
            let _ = child.wait();
        });

        let mut reader = StreamReader::spawn(output);
        let mut diagnostics = String::new();
        let mut echo = EchoState::Idle;
        let intercept = command.prompt().is_driver();

        // The loop keys off the reader, not the exit status: output can
        // close before the process is reaped.
        while reader.is_alive() {
            reader.wait_timeout(self.config.poll_interval);
            forward_lines(&reader, sink, &mut diagnostics, &mut echo);

            if intercept && reader.is_alive() && reader.has_partial() {
                // The tail may just be a burst write still in flight;
                // give it a bounded chance to complete.
                reader.wait_timeout(self.config.burst_grace);
                forward_lines(&reader, sink, &mut diagnostics, &mut echo);

                if reader.tail_starts_with(&self.config.prompt_signature) {
                    let prompt_bytes = reader.take_remaining();
                    let prompt = String::from_utf8_lossy(&prompt_bytes).into_owned();
                    debug!(prompt = %prompt, "interactive prompt detected");
                    sink.emit(&prompt);
                    diagnostics.push_str(&prompt);

                    let interrupted = |diagnostics: &String, source: io::Error| {
                        AuthError::Interrupted {
                            diagnostics: diagnostics.clone(),
                            source,
                        }
                    };
                    let response = responder
                        .respond(&prompt)
                        .map_err(|e| interrupted(&diagnostics, e))?;
                    // Pty line discipline expects CR+NL as the input
                    // terminator; it will echo the response back.
                    input
                        .write_all(response.as_bytes())
                        .and_then(|_| input.write_all(b"\r\n"))
                        .and_then(|_| input.flush())
                        .map_err(|e| interrupted(&diagnostics, e))?;
                    echo = EchoState::Expect(response);
                }
            }
        }

        reader.join();
        forward_lines(&reader, sink, &mut diagnostics, &mut echo);
        let remainder = reader.take_remaining();

        // Close our side of the pty input before reaping.
        drop(input);

        let status = child.wait()?;
        drop(ScopeGuard::into_inner(child));
        debug!(code = status.exit_code(), "child exited");

        if !status.success() {
            return Err(AuthError::AbnormalExit {
                command: command.command().to_string(),
                code: status.exit_code(),
                diagnostics,
                remainder: String::from_utf8_lossy(&remainder).into_owned(),
            });
        }

        Ok(RunOutcome {
            exit_code: status.exit_code(),
            diagnostics,
            remainder,
        })
    }
}

/// Drain completed lines into the sink, filtering the pty echo of the
/// last response. A line equal to the response (terminator stripped) is
/// swallowed exactly once; a line carrying anything else ends echo
/// handling and is surfaced as usual.
///
/// One `drain_lines` call splits at the last `\r\n` and can leave a
/// completed bare-LF line behind it, so the drain loops until empty:
/// only then is the remaining tail truly unterminated.
fn forward_lines(
    reader: &StreamReader,
    sink: &mut dyn DiagnosticSink,
    diagnostics: &mut String,
    echo: &mut EchoState,
) {
    loop {
        let lines = reader.drain_lines();
        if lines.is_empty() {
            return;
        }
        let text = String::from_utf8_lossy(&lines);
        for line in text.split_inclusive('\n') {
            let body = line.trim_end_matches(['\r', '\n']);
            match echo {
                EchoState::Expect(response) => {
                    if body == response {
                        *echo = EchoState::DrainBlanks;
                        continue;
                    }
                    *echo = EchoState::Idle;
                }
                EchoState::DrainBlanks => {
                    if body.is_empty() {
                        continue;
                    }
                    *echo = EchoState::Idle;
                }
                EchoState::Idle => {}
            }
            sink.emit(line);
            diagnostics.push_str(line);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    struct OnceSource(Option<Vec<u8>>);

    impl Read for OnceSource {
        fn read(&mut self, out: &mut [u8]) -> io::Result<usize> {
            match self.0.take() {
                Some(bytes) => {
                    out[..bytes.len()].copy_from_slice(&bytes);
                    Ok(bytes.len())
                }
                None => Ok(0),
            }
        }
    }

    fn reader_over(bytes: &[u8]) -> StreamReader {
        let mut reader = StreamReader::spawn(Box::new(OnceSource(Some(bytes.to_vec()))));
        reader.join();
        reader
    }

    fn collect(reader: &StreamReader, echo: &mut EchoState) -> (String, String) {
        let mut seen = String::new();
        let mut diagnostics = String::new();
        let mut sink = |text: &str| seen.push_str(text);
        forward_lines(reader, &mut sink, &mut diagnostics, echo);
        (seen, diagnostics)
    }

    #[test]
    fn exact_echo_is_suppressed() {
        let reader = reader_over(b"123456\r\n\r\nnext line\n");
        let mut echo = EchoState::Expect("123456".to_string());
        let (seen, diagnostics) = collect(&reader, &mut echo);
        assert_eq!(seen, "next line\n");
        assert_eq!(diagnostics, "next line\n");
    }

    #[test]
    fn echo_with_extra_bytes_is_surfaced() {
        let reader = reader_over(b"123456 and more\r\n");
        let mut echo = EchoState::Expect("123456".to_string());
        let (seen, _) = collect(&reader, &mut echo);
        assert_eq!(seen, "123456 and more\r\n");
    }

    #[test]
    fn echo_state_only_eats_one_matching_line() {
        let reader = reader_over(b"123456\r\n123456\r\n");
        let mut echo = EchoState::Expect("123456".to_string());
        let (seen, _) = collect(&reader, &mut echo);
        // The second occurrence is real output, not echo.
        assert_eq!(seen, "123456\r\n");
    }

    #[test]
    fn mixed_terminators_drain_fully_before_remainder() {
        // A completed bare-LF line after the last CRLF must still reach
        // the sink; only the unterminated payload stays behind.
        let reader = reader_over(b"123456\r\nwarning line\n{\"AWS_VAULT\":\"work\"}");
        let mut echo = EchoState::Expect("123456".to_string());
        let (seen, diagnostics) = collect(&reader, &mut echo);
        assert_eq!(seen, "warning line\n");
        assert_eq!(diagnostics, "warning line\n");
        assert_eq!(reader.take_remaining(), b"{\"AWS_VAULT\":\"work\"}");
    }

    #[test]
    fn idle_state_passes_everything_through() {
        let reader = reader_over(b"one\ntwo\r\n");
        let mut echo = EchoState::Idle;
        let (seen, diagnostics) = collect(&reader, &mut echo);
        assert_eq!(seen, "one\ntwo\r\n");
        assert_eq!(diagnostics, seen);
    }
}
