//! Thin CLI over the library: authenticate a profile and print the
//! requested credential shape as JSON on stdout. Child diagnostics go
//! to stderr, so stdout stays machine-readable.

use std::io;

use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use vault_auth::{Auth, Authenticator, OutputFormat};

#[derive(Parser)]
#[command(name = "vault-auth", version, about = "Authenticate an AWS profile via aws-vault")]
struct Cli {
    /// AWS profile to authenticate.
    profile: String,

    /// Output shape: vault, boto, s3fs or env.
    #[arg(long, default_value = "vault")]
    format: String,

    /// Name or path of the aws-vault executable.
    #[arg(long, default_value = vault_auth::DEFAULT_VAULT_CMD)]
    vault_cmd: String,

    /// Prompt mode: "driver" answers the MFA prompt in this process;
    /// any other value is forwarded to aws-vault's --prompt.
    #[arg(long)]
    prompt: Option<String>,

    /// Extra aws-vault flag, repeatable. `--flag duration=8h` becomes
    /// `--duration 8h`; `--flag no_session` becomes `--no-session`.
    #[arg(long = "flag", value_name = "NAME[=VALUE]")]
    flags: Vec<String>,
}

fn main() {
    init_tracing();
    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("vault-auth: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> vault_auth::Result<()> {
    // Validate the requested shape before anything is spawned.
    let format: OutputFormat = cli.format.parse()?;

    let mut auth = Authenticator::new().with_vault_cmd(cli.vault_cmd);
    if let Some(prompt) = cli.prompt {
        auth = auth.with_prompt_mode(prompt);
    }
    for flag in cli.flags {
        auth = match flag.split_once('=') {
            // A literal `none` value means a bare flag, like an absent one.
            Some((name, "none")) => auth.with_flag(name, None),
            Some((name, value)) => auth.with_flag(name, Some(value.to_string())),
            None => auth.with_flag(flag.as_str(), None),
        };
    }

    let result: Auth = auth.authenticate_as(&cli.profile, format)?;
    let rendered = serde_json::to_string_pretty(&result).map_err(io::Error::from)?;
    println!("{rendered}");
    Ok(())
}

/// Log to stderr, quiet by default; `RUST_LOG` opens it up.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_ansi(false))
        .init();
}
