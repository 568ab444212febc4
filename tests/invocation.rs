use vault_auth::invocation::{resolve_prompt_mode, PromptMode, VaultCommand, PROMPT_ENV_VAR};

fn command(prompt: PromptMode) -> VaultCommand {
    VaultCommand::new("aws-vault", "work", prompt)
}

// -- argument vector ----------------------------------------------------------

#[test]
fn argv_starts_with_exec_and_prompt_flag() {
    let argv = command(PromptMode::Driver).argv();
    assert_eq!(&argv[..4], &["aws-vault", "exec", "--prompt", "terminal"]);
}

#[test]
fn profile_precedes_separator() {
    let argv = command(PromptMode::Driver).argv();
    let separator = argv.iter().position(|a| a == "--").expect("separator");
    assert_eq!(argv[separator - 1], "work");
}

#[test]
fn inner_command_dumps_target_environment() {
    let argv = command(PromptMode::Driver).argv();
    let separator = argv.iter().position(|a| a == "--").expect("separator");
    assert_eq!(argv[separator + 1], "python3");
    assert_eq!(argv[separator + 2], "-c");
    assert!(argv[separator + 3].contains("startswith('AWS_')"));
    // The payload must survive as the unterminated tail of the output.
    assert!(!argv[separator + 3].contains("print"));
}

#[test]
fn underscores_in_flag_names_become_hyphens() {
    let argv = command(PromptMode::Driver)
        .with_flag("no_session", None)
        .argv();
    assert!(argv.contains(&"--no-session".to_string()));
    assert!(!argv.iter().any(|a| a.contains('_') && a.starts_with("--")));
}

#[test]
fn valued_flags_keep_their_value_adjacent() {
    let argv = command(PromptMode::Driver)
        .with_flag("duration", Some("8h".to_string()))
        .argv();
    let at = argv.iter().position(|a| a == "--duration").expect("flag");
    assert_eq!(argv[at + 1], "8h");
}

#[test]
fn flag_order_is_preserved() {
    let argv = command(PromptMode::Driver)
        .with_flag("region", Some("ap-southeast-2".to_string()))
        .with_flag("no_session", None)
        .argv();
    let region = argv.iter().position(|a| a == "--region").expect("region");
    let bare = argv.iter().position(|a| a == "--no-session").expect("bare");
    assert!(region < bare);
}

// -- prompt modes -------------------------------------------------------------

#[test]
fn driver_mode_runs_aws_vault_with_terminal_prompt() {
    let cmd = command(PromptMode::Driver);
    assert!(cmd.prompt().is_driver());
    assert_eq!(cmd.prompt().vault_argument(), "terminal");
}

#[test]
fn passthrough_mode_is_forwarded_verbatim() {
    let cmd = command(PromptMode::Passthrough("osascript".to_string()));
    assert!(!cmd.prompt().is_driver());
    assert_eq!(cmd.argv()[3], "osascript");
}

#[test]
fn explicit_mode_beats_environment_override() {
    let overrides = vec![(PROMPT_ENV_VAR.to_string(), "kdialog".to_string())];
    let mode = resolve_prompt_mode(Some("driver"), &overrides);
    assert!(mode.is_driver());
}

#[test]
fn override_variable_supplies_default_mode() {
    let overrides = vec![(PROMPT_ENV_VAR.to_string(), "osascript".to_string())];
    let mode = resolve_prompt_mode(None, &overrides);
    assert_eq!(mode, PromptMode::Passthrough("osascript".to_string()));
}
