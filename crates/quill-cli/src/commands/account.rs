//! Account lifecycle commands: setup, login, logout, status.

use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;

use chrono::DateTime;

use quill_core::{SessionToken, SqliteStore, Vault, VaultError};

use crate::app::{exit_auth_failed, resolve_config_path, AppContext};
use crate::cli::{LoginArgs, SetupArgs};
use crate::config::{write_config, QuillConfig};
use crate::constants::exit_codes;
use crate::helpers::{prompt_new_password, prompt_password, prompt_setup_token, resolve_email};
use crate::session::{clear_session, load_session, save_session, session_file_path};

pub fn handle_setup(ctx: &AppContext, args: &SetupArgs) -> anyhow::Result<()> {
    let interactive = std::io::stdin().is_terminal() && !args.no_input;
    let vault_path = ctx.vault_path()?;
    let vault = ctx.open_vault_for_setup()?;

    let presented = prompt_setup_token(args.setup_token.as_deref(), interactive)?;
    let email = resolve_email(args.email.as_deref(), interactive)?;
    let password = prompt_new_password(interactive)?;

    match vault.setup(&presented, &email, &password) {
        Ok(account_id) => {
            write_default_config_if_missing(ctx, &vault_path)?;
            if !ctx.quiet() {
                println!("Initialized vault at {}", vault_path.display());
                println!("Created account {} for {}", account_id, email);
                println!();
                println!("Run `quill login` to start a session.");
            }
            Ok(())
        }
        Err(VaultError::Authentication) => exit_auth_failed(
            "Setup token does not match.",
            "Hint: Check QUILL_SETUP_TOKEN against the configured value.",
        ),
        Err(err @ VaultError::AccountExists) => Err(anyhow::anyhow!(
            "{}\n\nHint: Run `quill login` to use the existing account.",
            err
        )),
        Err(err) => Err(err.into()),
    }
}

pub fn handle_login(ctx: &AppContext, args: &LoginArgs) -> anyhow::Result<()> {
    let interactive = std::io::stdin().is_terminal() && !args.no_input;
    let vault = ctx.open_vault()?;
    let email = resolve_email(args.email.as_deref(), interactive)?;

    let env_password = std::env::var("QUILL_PASSWORD")
        .ok()
        .filter(|v| !v.trim().is_empty());
    let token = if let Some(password) = env_password {
        match vault.login(&email, &password) {
            Ok(token) => token,
            Err(VaultError::Authentication) => {
                eprintln!("Error: Authentication failed.");
                std::process::exit(exit_codes::AUTH_FAILED);
            }
            Err(err) => return Err(err.into()),
        }
    } else {
        login_with_retry(&vault, &email, interactive)?
    };

    let claims = vault.session_claims(&token)?;
    let session_path = session_file_path()?;
    save_session(&session_path, &token)?;

    if !ctx.quiet() {
        println!("Logged in as {}", email);
        println!("Session expires {}", format_expiry(claims.expires_at));
    }
    Ok(())
}

pub fn handle_logout(ctx: &AppContext) -> anyhow::Result<()> {
    let session_path = session_file_path()?;
    let had_session = clear_session(&session_path)?;
    if !ctx.quiet() {
        if had_session {
            println!("Logged out.");
        } else {
            println!("No active session.");
        }
    }
    Ok(())
}

pub fn handle_status(ctx: &AppContext) -> anyhow::Result<()> {
    let vault_path = ctx.vault_path()?;
    if !vault_path.exists() {
        println!("Vault: {} (not found)", vault_path.display());
        println!("Run `quill setup` to create it.");
        return Ok(());
    }
    println!("Vault: {}", vault_path.display());

    let vault = ctx.open_vault()?;
    let session_path = session_file_path()?;
    match load_session(&session_path)? {
        Some(token) => match vault.session_account(&token) {
            Ok(account) => {
                let claims = vault.session_claims(&token)?;
                println!("Account: {}", account.email);
                println!(
                    "Session: active, expires {}",
                    format_expiry(claims.expires_at)
                );
            }
            Err(VaultError::SessionExpired) => {
                print_account_line(&vault)?;
                println!("Session: expired");
            }
            Err(VaultError::SessionInvalid) => {
                print_account_line(&vault)?;
                println!("Session: invalid");
            }
            Err(err) => return Err(err.into()),
        },
        None => {
            print_account_line(&vault)?;
            println!("Session: none");
        }
    }
    Ok(())
}

fn login_with_retry(
    vault: &Vault<Arc<SqliteStore>>,
    email: &str,
    interactive: bool,
) -> anyhow::Result<SessionToken> {
    let max_attempts: u32 = if interactive { 3 } else { 1 };
    let mut attempts: u32 = 0;

    loop {
        attempts += 1;
        let password = prompt_password(interactive)?;
        match vault.login(email, &password) {
            Ok(token) => return Ok(token),
            Err(VaultError::Authentication) => {
                let remaining = max_attempts.saturating_sub(attempts);
                if remaining == 0 {
                    eprintln!("Error: Too many failed authentication attempts.");
                    eprintln!(
                        "Hint: If you forgot your password, the vault's notes cannot be recovered."
                    );
                    std::process::exit(exit_codes::AUTH_FAILED);
                }
                eprintln!(
                    "Authentication failed. {} attempt{} remaining.",
                    remaining,
                    if remaining == 1 { "" } else { "s" }
                );
                continue;
            }
            Err(err) => return Err(err.into()),
        }
    }
}

fn write_default_config_if_missing(ctx: &AppContext, vault_path: &Path) -> anyhow::Result<()> {
    let config_path = resolve_config_path()?;
    if config_path.exists() {
        return Ok(());
    }
    let config = QuillConfig::new(vault_path.to_path_buf(), ctx.session_ttl_seconds()?);
    write_config(&config_path, &config)
}

fn print_account_line(vault: &Vault<Arc<SqliteStore>>) -> anyhow::Result<()> {
    if vault.has_account()? {
        println!("Account: configured");
    } else {
        println!("Account: none");
    }
    Ok(())
}

fn format_expiry(timestamp: i64) -> String {
    DateTime::from_timestamp(timestamp, 0)
        .map(|moment| moment.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| "unknown".to_string())
}
