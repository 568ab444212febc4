//! Child invocation assembly — argv and environment in one place.
//!
//! The driven tool is `aws-vault exec`. Instead of `--json`, the inner
//! command dumps the `AWS_`-prefixed environment of the *target* session
//! as a single JSON object, which also captures the region and vault
//! marker variables the JSON flag would omit.

use portable_pty::CommandBuilder;

/// Default child tool name, overridable per invocation.
pub const DEFAULT_VAULT_CMD: &str = "aws-vault";

/// Driver-level override variable: selects the default prompt mode when
/// the caller gives none. Meaningless to the child, so it is removed
/// from the environment before spawn.
pub const PROMPT_ENV_VAR: &str = "VAULT_AUTH_PROMPT";

const ENV_DUMP_PROGRAM: &str = "python3";
const ENV_DUMP_SCRIPT: &str = "import json, os, sys; json.dump({k: v for k, v in os.environ.items() if k.startswith('AWS_')}, sys.stdout)";

/// How MFA prompts are handled for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMode {
    /// This process intercepts the prompt: aws-vault runs with
    /// `--prompt terminal` and the driver answers on its pty.
    Driver,
    /// The named aws-vault prompt mechanism (`osascript`, `kdialog`, ...)
    /// handles it; the driver only streams diagnostics.
    Passthrough(String),
}

impl PromptMode {
    /// Value passed to aws-vault's `--prompt` flag.
    pub fn vault_argument(&self) -> &str {
        match self {
            PromptMode::Driver => "terminal",
            PromptMode::Passthrough(mode) => mode,
        }
    }

    pub fn is_driver(&self) -> bool {
        matches!(self, PromptMode::Driver)
    }
}

/// Pick the prompt mode: explicit choice, then the caller's env
/// overrides, then the process environment, then the driver default.
pub fn resolve_prompt_mode(explicit: Option<&str>, overrides: &[(String, String)]) -> PromptMode {
    let chosen = explicit
        .map(str::to_string)
        .or_else(|| {
            overrides
                .iter()
                .find(|(name, _)| name == PROMPT_ENV_VAR)
                .map(|(_, value)| value.clone())
        })
        .or_else(|| std::env::var(PROMPT_ENV_VAR).ok());
    match chosen.as_deref() {
        None | Some("driver") => PromptMode::Driver,
        Some(other) => PromptMode::Passthrough(other.to_string()),
    }
}

/// Builder for one `aws-vault exec` invocation.
#[derive(Debug, Clone)]
pub struct VaultCommand {
    command: String,
    profile: String,
    prompt: PromptMode,
    flags: Vec<(String, Option<String>)>,
    env: Vec<(String, String)>,
}

impl VaultCommand {
    pub fn new(command: impl Into<String>, profile: impl Into<String>, prompt: PromptMode) -> Self {
        Self {
            command: command.into(),
            profile: profile.into(),
            prompt,
            flags: Vec::new(),
            env: Vec::new(),
        }
    }

    /// Add an extra aws-vault flag. Underscores in `name` become hyphens;
    /// a `None` value produces a bare flag (`no_session` → `--no-session`).
    pub fn with_flag(mut self, name: impl Into<String>, value: Option<String>) -> Self {
        self.flags.push((name.into(), value));
        self
    }

    /// Merge an environment override on top of the inherited environment.
    pub fn with_env(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((name.into(), value.into()));
        self
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    pub fn prompt(&self) -> &PromptMode {
        &self.prompt
    }

    /// Full argument vector: tool, subcommand, prompt flag, extra flags,
    /// profile, separator, then the fixed env-dump inner command.
    pub fn argv(&self) -> Vec<String> {
        let mut argv = vec![
            self.command.clone(),
            "exec".to_string(),
            "--prompt".to_string(),
            self.prompt.vault_argument().to_string(),
        ];
        for (name, value) in &self.flags {
            argv.push(format!("--{}", name.replace('_', "-")));
            if let Some(value) = value {
                argv.push(value.clone());
            }
        }
        argv.push(self.profile.clone());
        argv.push("--".to_string());
        argv.push(ENV_DUMP_PROGRAM.to_string());
        argv.push("-c".to_string());
        argv.push(ENV_DUMP_SCRIPT.to_string());
        argv
    }

    /// Materialize as a pty `CommandBuilder`: inherited environment plus
    /// overrides, minus the driver-level prompt variable.
    pub fn to_builder(&self) -> CommandBuilder {
        let argv = self.argv();
        let mut cmd = CommandBuilder::new(&argv[0]);
        cmd.args(&argv[1..]);
        for (name, value) in &self.env {
            cmd.env(name, value);
        }
        cmd.env_remove(PROMPT_ENV_VAR);
        cmd
    }
}
