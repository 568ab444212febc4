//! Drive `aws-vault` through a pseudo-terminal, answer its interactive
//! MFA prompt, and extract the credential payload it emits.
//!
//! The hard part is the interactive process driver: reading a live pty
//! stream without blocking, reconstructing line boundaries from partial
//! reads, telling an ordinary log line apart from a prompt awaiting
//! input, injecting the response at the right instant, and guaranteeing
//! the child is reaped on every exit path.
//!
//! Entry point is [`Authenticator`]; the pieces (reader, driver,
//! extractor) are public for callers that need finer control.

mod auth;
pub mod convert;
pub mod credentials;
pub mod driver;
pub mod error;
pub mod invocation;
pub mod prompt;
pub mod reader;

pub use auth::Authenticator;
pub use convert::{Auth, BotoAuth, OutputFormat, S3fsAuth};
pub use credentials::{CredentialRecord, AWS_ENV_VARS};
pub use driver::{DiagnosticSink, DriverConfig, ProcessDriver, RunOutcome, StderrSink};
pub use error::{AuthError, Result};
pub use invocation::{PromptMode, VaultCommand, DEFAULT_VAULT_CMD, PROMPT_ENV_VAR};
pub use prompt::{ConsoleResponder, PromptResponder};
