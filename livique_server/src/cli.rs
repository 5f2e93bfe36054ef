use std::{env, env::VarError};

/// There's no real CLI for the server. Any argument prints the help text and the current configuration.
pub fn handle_command_line_args() -> bool {
    let has_cli_args = env::args().count() > 1;
    if has_cli_args {
        display_readme();
        display_envs();
    }
    has_cli_args
}

fn display_readme() {
    const README: &str = include_str!("./cli-help.txt");
    println!("\n{README}\n");
}

fn display_envs() {
    // Secrets are deliberately left off this list
    const DISPLAY_ENVS: [&str; 14] = [
        "RUST_LOG",
        "LVQ_HOST",
        "LVQ_PORT",
        "LVQ_DATABASE_URL",
        "LVQ_USE_X_FORWARDED_FOR",
        "LVQ_USE_FORWARDED",
        "LVQ_GATEWAY_ADJUSTS_INVENTORY",
        "LVQ_EVENT_BUFFER_SIZE",
        "LVQ_NOTIFY_TIMEOUT_MS",
        "LVQ_OTP_TTL_SECS",
        "LVQ_MAIL_API_URL",
        "LVQ_MAIL_FROM",
        "LVQ_OPERATOR_EMAIL",
        "LVQ_PUSH_API_URL",
    ];

    println!("Current environment values (EXCLUDING variables that contain secrets):");
    DISPLAY_ENVS.iter().for_each(|&name| {
        let val = match env::var(name) {
            Ok(s) => s,
            Err(VarError::NotPresent) => "Not set".into(),
            Err(VarError::NotUnicode(s)) => format!("Invalid value: {}", s.to_string_lossy()),
        };
        println!("  {name:<35} {val:<15}");
    })
}
