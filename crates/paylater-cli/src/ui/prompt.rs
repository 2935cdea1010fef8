//! Line and password prompts for the sign-in and sign-up pages.

use std::io::{self, BufRead, IsTerminal, Write};

use anyhow::{bail, Result};

/// Maximum length for a prompted line.
const MAX_LINE_LENGTH: usize = 254;

/// Maximum length for password input.
/// 128 chars accommodates password managers and passphrases.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Read one line. An empty answer takes `default` when one is given.
pub fn line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => eprint!("{} [{}]: ", label, d),
        None => eprint!("{}: ", label),
    }
    io::stderr().flush()?;

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input)? == 0 {
        bail!("No input for {}", label.to_lowercase());
    }
    Ok(with_default(clean_line(&input, MAX_LINE_LENGTH), default))
}

/// Read a password without echoing it.
///
/// Reads a plain line when stdin is not a terminal, so the password can be
/// piped in.
pub fn password(label: &str) -> Result<String> {
    let password = if io::stdin().is_terminal() {
        rpassword::prompt_password(format!("{}: ", label))?
    } else {
        let mut input = String::new();
        io::stdin().lock().read_line(&mut input)?;
        input
    };
    let password = password.trim_end_matches(['\r', '\n']);
    if password.chars().count() > MAX_PASSWORD_LENGTH {
        bail!("Password is longer than {} characters", MAX_PASSWORD_LENGTH);
    }
    Ok(password.to_string())
}

fn clean_line(input: &str, max_len: usize) -> String {
    input
        .trim()
        .chars()
        .filter(|c| !c.is_control())
        .take(max_len)
        .collect()
}

fn with_default(answer: String, default: Option<&str>) -> String {
    match default {
        Some(d) if answer.is_empty() => d.to_string(),
        _ => answer,
    }
}
