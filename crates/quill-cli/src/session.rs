//! Session token persistence.
//!
//! One session file per user, stored under the XDG data directory. The file
//! holds the opaque token issued by `quill login`; a token issued by a
//! different vault fails signature verification and is discarded.

use std::path::{Path, PathBuf};

use quill_core::SessionToken;

use crate::config::xdg_data_dir;

pub fn session_file_path() -> anyhow::Result<PathBuf> {
    Ok(xdg_data_dir()?.join("session"))
}

pub fn load_session(path: &Path) -> anyhow::Result<Option<SessionToken>> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(anyhow::anyhow!(
                "Failed to read session file {}: {}",
                path.display(),
                e
            ))
        }
    };
    let token = contents.trim();
    if token.is_empty() {
        return Ok(None);
    }
    Ok(Some(SessionToken::new(token.to_string())))
}

pub fn save_session(path: &Path, token: &SessionToken) -> anyhow::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            anyhow::anyhow!(
                "Failed to create session directory {}: {}",
                parent.display(),
                e
            )
        })?;
    }
    std::fs::write(path, token.as_str())
        .map_err(|e| anyhow::anyhow!("Failed to write session file {}: {}", path.display(), e))?;
    set_file_permissions(path)
}

pub fn clear_session(path: &Path) -> anyhow::Result<bool> {
    match std::fs::remove_file(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(anyhow::anyhow!(
            "Failed to remove session file {}: {}",
            path.display(),
            e
        )),
    }
}

fn set_file_permissions(path: &Path) -> anyhow::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = std::fs::metadata(path)?.permissions();
        perms.set_mode(0o600);
        std::fs::set_permissions(path, perms)?;
    }
    #[cfg(not(unix))]
    {
        let _ = path;
    }
    Ok(())
}
