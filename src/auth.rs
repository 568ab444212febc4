//! Top-level authentication flow.

use tracing::debug;

use crate::convert::{Auth, OutputFormat};
use crate::credentials::{self, CredentialRecord};
use crate::driver::{DiagnosticSink, DriverConfig, ProcessDriver, StderrSink};
use crate::error::Result;
use crate::invocation::{resolve_prompt_mode, VaultCommand, DEFAULT_VAULT_CMD};
use crate::prompt::{ConsoleResponder, PromptResponder};

/// Builder for one authentication run.
///
/// Defaults match interactive terminal use: `aws-vault` on PATH, the MFA
/// prompt answered from the console, diagnostics mirrored to stderr.
///
/// ```no_run
/// use vault_auth::Authenticator;
///
/// let credentials = Authenticator::new()
///     .with_flag("duration", Some("8h".to_string()))
///     .authenticate("work")?;
/// # Ok::<(), vault_auth::AuthError>(())
/// ```
pub struct Authenticator {
    vault_cmd: String,
    prompt: Option<String>,
    flags: Vec<(String, Option<String>)>,
    env: Vec<(String, String)>,
    config: DriverConfig,
    responder: Box<dyn PromptResponder>,
    sink: Box<dyn DiagnosticSink>,
}

impl Authenticator {
    pub fn new() -> Self {
        Self {
            vault_cmd: DEFAULT_VAULT_CMD.to_string(),
            prompt: None,
            flags: Vec::new(),
            env: Vec::new(),
            config: DriverConfig::default(),
            responder: Box::new(ConsoleResponder),
            sink: Box::new(StderrSink),
        }
    }

    /// Name or path of the aws-vault executable.
    pub fn with_vault_cmd(mut self, command: impl Into<String>) -> Self {
        self.vault_cmd = command.into();
        self
    }

    /// Explicit prompt mode. `"driver"` keeps interception in-process;
    /// anything else is forwarded to aws-vault's `--prompt`. When unset,
    /// the `VAULT_AUTH_PROMPT` environment variable decides.
    pub fn with_prompt_mode(mut self, mode: impl Into<String>) -> Self {
        self.prompt = Some(mode.into());
        self
    }

    /// Extra aws-vault flag (`duration` → `--duration`, `None` value for
    /// bare flags such as `no_session`).
    pub fn with_flag(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.flags.push((name.into(), value));
        self
    }

    /// Environment override merged on top of the inherited environment.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    pub fn with_driver_config(mut self, config: DriverConfig) -> Self {
        self.config = config;
        self
    }

    /// Replace the prompt responder (hard-coded token provider, dialog, ...).
    pub fn with_responder(mut self, responder: impl PromptResponder + 'static) -> Self {
        self.responder = Box::new(responder);
        self
    }

    /// Replace the diagnostic sink.
    pub fn with_sink(mut self, sink: impl DiagnosticSink + 'static) -> Self {
        self.sink = Box::new(sink);
        self
    }

    /// Authenticate `profile` and return the filtered credential record.
    pub fn authenticate(mut self, profile: &str) -> Result<CredentialRecord> {
        let prompt = resolve_prompt_mode(self.prompt.as_deref(), &self.env);
        debug!(profile, ?prompt, "starting authentication");

        let mut command = VaultCommand::new(&self.vault_cmd, profile, prompt);
        for (name, value) in self.flags.drain(..) {
            command = command.with_flag(name, value);
        }
        for (name, value) in self.env.drain(..) {
            command = command.with_env(name, value);
        }

        let driver = ProcessDriver::new(self.config.clone());
        let outcome = driver.run(&command, self.responder.as_mut(), self.sink.as_mut())?;
        credentials::extract(&outcome.remainder, &outcome.diagnostics)
    }

    /// Authenticate and project the record into the requested shape.
    /// Format validation happens at [`OutputFormat`] parse time, before
    /// any process is spawned.
    pub fn authenticate_as(self, profile: &str, format: OutputFormat) -> Result<Auth> {
        let record = self.authenticate(profile)?;
        Auth::from_record(record, format)
    }
}

impl Default for Authenticator {
    fn default() -> Self {
        Self::new()
    }
}
