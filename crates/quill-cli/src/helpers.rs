//! Input helper functions for the CLI.

use std::io::{self, IsTerminal, Read};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use dialoguer::{Input, Password};

/// Prompt for the account password, or read from QUILL_PASSWORD env var.
pub fn prompt_password(interactive: bool) -> anyhow::Result<String> {
    if let Ok(value) = std::env::var("QUILL_PASSWORD") {
        if !value.trim().is_empty() {
            return Ok(value);
        }
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No password provided and no TTY available. Set QUILL_PASSWORD."
        ));
    }
    Password::new()
        .with_prompt("Password")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Prompt for a new password with confirmation (for setup), or read from
/// QUILL_PASSWORD env var.
pub fn prompt_new_password(interactive: bool) -> anyhow::Result<String> {
    if let Ok(value) = std::env::var("QUILL_PASSWORD") {
        if !value.trim().is_empty() {
            return Ok(value);
        }
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No password provided and no TTY available. Set QUILL_PASSWORD."
        ));
    }
    Password::new()
        .with_prompt("Enter password")
        .with_confirmation("Confirm password", "Passwords do not match")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read password: {}", e))
}

/// Resolve the setup token from --setup-token, QUILL_SETUP_TOKEN, or a prompt.
pub fn prompt_setup_token(flag: Option<&str>, interactive: bool) -> anyhow::Result<String> {
    if let Some(value) = flag {
        return Ok(value.to_string());
    }
    if let Ok(value) = std::env::var("QUILL_SETUP_TOKEN") {
        if !value.trim().is_empty() {
            return Ok(value);
        }
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No setup token provided and no TTY available. Set QUILL_SETUP_TOKEN."
        ));
    }
    Password::new()
        .with_prompt("Setup token")
        .interact()
        .map_err(|e| anyhow::anyhow!("Failed to read setup token: {}", e))
}

/// Resolve the account email from --email / QUILL_EMAIL, or a prompt.
pub fn resolve_email(flag: Option<&str>, interactive: bool) -> anyhow::Result<String> {
    if let Some(value) = flag {
        return Ok(value.to_string());
    }
    if !interactive {
        return Err(anyhow::anyhow!(
            "No email provided. Use --email or set QUILL_EMAIL."
        ));
    }
    Input::<String>::new()
        .with_prompt("Email")
        .interact_text()
        .map_err(|e| anyhow::anyhow!("Failed to read email: {}", e))
}

/// Read note content from --content, stdin, or $EDITOR.
///
/// An explicit --content value is stored verbatim, the empty string included.
/// Piped stdin is trimmed of trailing whitespace and must not be empty. When
/// editing, `initial` seeds the editor buffer with the current content.
pub fn read_note_content(
    no_input: bool,
    content: Option<String>,
    initial: Option<&str>,
) -> anyhow::Result<String> {
    if let Some(value) = content {
        return Ok(value);
    }

    if !io::stdin().is_terminal() {
        let mut buffer = String::new();
        io::stdin()
            .read_to_string(&mut buffer)
            .map_err(|e| anyhow::anyhow!("Failed to read stdin: {}", e))?;
        let trimmed = buffer.trim_end().to_string();
        if trimmed.is_empty() {
            return Err(anyhow::anyhow!("No content provided on stdin"));
        }
        return Ok(trimmed);
    }

    if no_input {
        return Err(anyhow::anyhow!(
            "--no-input requires --content or piped stdin"
        ));
    }

    read_content_from_editor(initial)
}

/// Open $EDITOR to compose note content.
fn read_content_from_editor(initial: Option<&str>) -> anyhow::Result<String> {
    let editor = std::env::var("EDITOR").map_err(|_| {
        anyhow::anyhow!("$EDITOR is not set; use --content or pipe content via stdin")
    })?;

    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| anyhow::anyhow!("System time error: {}", e))?
        .as_nanos();
    let filename = format!("quill_note_{}_{}.md", std::process::id(), nanos);
    let path = std::env::temp_dir().join(filename);

    std::fs::write(&path, initial.unwrap_or(""))
        .map_err(|e| anyhow::anyhow!("Failed to create temp file: {}", e))?;

    let status = Command::new(editor)
        .arg(&path)
        .status()
        .map_err(|e| anyhow::anyhow!("Failed to launch editor: {}", e))?;
    if !status.success() {
        let _ = std::fs::remove_file(&path);
        return Err(anyhow::anyhow!("Editor exited with failure"));
    }

    let contents = std::fs::read_to_string(&path)
        .map_err(|e| anyhow::anyhow!("Failed to read temp file: {}", e))?;
    let _ = std::fs::remove_file(&path);

    // Unlike stdin, an empty buffer saved from the editor is deliberate.
    Ok(contents.trim_end().to_string())
}

/// Output format for the list command.
#[derive(Clone, Copy)]
pub enum OutputFormat {
    Table,
    Plain,
}

/// Parse output format string.
pub fn parse_output_format(value: Option<&str>) -> anyhow::Result<Option<OutputFormat>> {
    match value {
        None => Ok(None),
        Some("table") => Ok(Some(OutputFormat::Table)),
        Some("plain") => Ok(Some(OutputFormat::Plain)),
        Some(other) => Err(anyhow::anyhow!(
            "Unsupported format: {} (use table or plain)",
            other
        )),
    }
}
