use std::{env, str::FromStr};

/// Reads a boolean flag from the environment. Accepts `1/true/yes/on` and `0/false/no/off` (case-insensitive).
/// Anything else, including an unset variable, yields `default`.
pub fn env_flag(name: &str, default: bool) -> bool {
    parse_boolean_flag(env::var(name).ok(), default)
}

pub fn parse_boolean_flag(value: Option<String>, default: bool) -> bool {
    let Some(value) = value else {
        return default;
    };
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => true,
        "0" | "false" | "no" | "off" => false,
        _ => default,
    }
}

/// Reads and parses an environment variable. Returns `None` if the variable is unset, and `Some(Err)` if it is set
/// but cannot be parsed, so that callers can log the difference.
pub fn env_parse<T: FromStr>(name: &str) -> Option<Result<T, T::Err>> {
    env::var(name).ok().map(|s| s.trim().parse::<T>())
}

/// Returns the value of a non-empty environment variable.
pub fn env_non_empty(name: &str) -> Option<String> {
    env::var(name).ok().filter(|s| !s.trim().is_empty())
}
