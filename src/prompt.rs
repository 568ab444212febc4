//! Prompt response providers.

use std::io::{self, BufRead, Write};

/// Capability for answering an interactive prompt from the child tool.
///
/// Implementations may block (console input, a GUI dialog) or answer
/// immediately (a pre-fetched token). The driver calls this at most once
/// per detected prompt and writes the returned text, plus the transport's
/// line terminator, to the child's input handle.
pub trait PromptResponder {
    fn respond(&mut self, prompt: &str) -> io::Result<String>;
}

/// Any `FnMut(&str) -> String` closure works as a responder.
impl<F> PromptResponder for F
where
    F: FnMut(&str) -> String,
{
    fn respond(&mut self, prompt: &str) -> io::Result<String> {
        Ok(self(prompt))
    }
}

/// Default responder: echo the prompt to stderr and read one line from
/// stdin. This is what makes the flow usable from a plain terminal or a
/// notebook-style host that proxies stdin.
pub struct ConsoleResponder;

impl PromptResponder for ConsoleResponder {
    fn respond(&mut self, prompt: &str) -> io::Result<String> {
        let mut stderr = io::stderr();
        writeln!(stderr, "{prompt}")?;
        stderr.flush()?;

        let mut entered = String::new();
        io::stdin().lock().read_line(&mut entered)?;
        while entered.ends_with('\n') || entered.ends_with('\r') {
            entered.pop();
        }
        Ok(entered)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closures_are_responders() {
        let mut responder = |prompt: &str| format!("saw: {prompt}");
        let answer = responder.respond("Enter code: ").unwrap();
        assert_eq!(answer, "saw: Enter code: ");
    }

    #[test]
    fn stateful_closure_responder() {
        let mut calls = 0u32;
        {
            let mut responder = |_: &str| {
                calls += 1;
                "123456".to_string()
            };
            responder.respond("Enter MFA code for arn: ").unwrap();
        }
        assert_eq!(calls, 1);
    }
}
