// SPDX-FileCopyrightText: 2026 Keeper Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Password acquisition via TTY prompt or environment variables.
//!
//! `KEEPER_MASTER_PASSWORD` supplies the current master password and
//! `KEEPER_NEW_MASTER_PASSWORD` the replacement during a password change, for
//! scripted use. Entry passwords are read from the TTY, or from one line of
//! stdin when it is not a terminal.

use std::io::{BufRead, IsTerminal};

use keeper_core::KeeperError;
use secrecy::{ExposeSecret, SecretString};
use zeroize::Zeroizing;

/// Environment variable consulted before prompting for the master password.
pub const MASTER_PASSWORD_ENV_VAR: &str = "KEEPER_MASTER_PASSWORD";

/// Environment variable consulted before prompting for a new master password.
pub const NEW_MASTER_PASSWORD_ENV_VAR: &str = "KEEPER_NEW_MASTER_PASSWORD";

fn from_env(var: &str) -> Option<SecretString> {
    std::env::var(var)
        .ok()
        .filter(|value| !value.is_empty())
        .map(SecretString::from)
}

fn read_tty(label: &str) -> Result<Zeroizing<String>, KeeperError> {
    eprint!("{label}: ");
    rpassword::read_password()
        .map(Zeroizing::new)
        .map_err(|e| KeeperError::Prompt(format!("failed to read password: {e}")))
}

fn read_nonempty_tty(label: &str) -> Result<SecretString, KeeperError> {
    let value = read_tty(label)?;
    if value.is_empty() {
        return Err(KeeperError::Prompt("empty master password not allowed".to_string()));
    }
    Ok(SecretString::from(value.as_str()))
}

fn no_source(var: &str) -> KeeperError {
    KeeperError::Prompt(format!(
        "no master password provided. Set {var} or run interactively."
    ))
}

fn acquire(var: &str, label: &str, confirm: bool) -> Result<SecretString, KeeperError> {
    // The environment is taken as-is, without confirmation.
    if let Some(password) = from_env(var) {
        return Ok(password);
    }
    if !std::io::stdin().is_terminal() {
        return Err(no_source(var));
    }

    let first = read_nonempty_tty(label)?;
    if confirm {
        let second = read_nonempty_tty(&format!("Confirm {}", label.to_lowercase()))?;
        if first.expose_secret() != second.expose_secret() {
            return Err(KeeperError::Prompt("passwords do not match".to_string()));
        }
    }
    Ok(first)
}

/// Get the master password from the environment or an interactive prompt.
pub fn get_master_password() -> Result<SecretString, KeeperError> {
    acquire(MASTER_PASSWORD_ENV_VAR, "Master password", false)
}

/// Get a master password for a new vault, prompting twice.
pub fn get_master_password_with_confirm() -> Result<SecretString, KeeperError> {
    acquire(MASTER_PASSWORD_ENV_VAR, "New master password", true)
}

/// Get the replacement master password for a password change, prompting twice.
pub fn get_new_master_password() -> Result<SecretString, KeeperError> {
    acquire(NEW_MASTER_PASSWORD_ENV_VAR, "New master password", true)
}

/// Read an entry password. An empty answer means "no password".
pub fn get_entry_password(label: &str) -> Result<SecretString, KeeperError> {
    let stdin = std::io::stdin();
    if stdin.is_terminal() {
        let value = read_tty(label)?;
        return Ok(SecretString::from(value.as_str()));
    }

    let mut line = Zeroizing::new(String::new());
    stdin
        .lock()
        .read_line(&mut line)
        .map_err(|e| KeeperError::Prompt(format!("failed to read password from stdin: {e}")))?;
    Ok(SecretString::from(line.trim_end_matches(['\r', '\n'])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn master_password_from_env_var() {
        // SAFETY: env mutation is serialized across tests by #[serial].
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "from-env") };
        let result = get_master_password();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "from-env");
    }

    #[test]
    #[serial]
    fn confirm_is_skipped_for_env_var() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "from-env") };
        let result = get_master_password_with_confirm();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        assert!(result.is_ok());
    }

    #[test]
    #[serial]
    fn new_master_password_uses_its_own_variable() {
        unsafe {
            std::env::set_var(MASTER_PASSWORD_ENV_VAR, "old");
            std::env::set_var(NEW_MASTER_PASSWORD_ENV_VAR, "new");
        }
        let current = get_master_password();
        let replacement = get_new_master_password();
        unsafe {
            std::env::remove_var(MASTER_PASSWORD_ENV_VAR);
            std::env::remove_var(NEW_MASTER_PASSWORD_ENV_VAR);
        }

        assert_eq!(current.unwrap().expose_secret(), "old");
        assert_eq!(replacement.unwrap().expose_secret(), "new");
    }

    #[test]
    #[serial]
    fn empty_env_var_without_tty_is_prompt_error() {
        unsafe { std::env::set_var(MASTER_PASSWORD_ENV_VAR, "") };
        let result = get_master_password();
        unsafe { std::env::remove_var(MASTER_PASSWORD_ENV_VAR) };

        // Under the test harness stdin is normally not a terminal.
        if !std::io::stdin().is_terminal() {
            assert!(matches!(result, Err(KeeperError::Prompt(_))));
        }
    }
}
