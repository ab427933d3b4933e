use std::path::{Path, PathBuf};

use vetter_core::types::Principal;

/// Default identity, read from `~/.vetter/identity.toml`.
#[derive(serde::Serialize, serde::Deserialize, Default, Clone)]
pub struct IdentityConfig {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub groups: Vec<String>,
}

fn home_dir() -> anyhow::Result<PathBuf> {
    dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not find home directory"))
}

pub fn identity_config_path() -> anyhow::Result<PathBuf> {
    Ok(home_dir()?.join(".vetter").join("identity.toml"))
}

pub fn load_identity_config() -> IdentityConfig {
    match identity_config_path() {
        Ok(path) => read_identity_file(&path),
        Err(_) => IdentityConfig::default(),
    }
}

/// Falls back to the anonymous default when the file cannot be used.
fn read_identity_file(path: &Path) -> IdentityConfig {
    if !path.exists() {
        return IdentityConfig::default();
    }
    match std::fs::read_to_string(path) {
        Ok(content) => match toml::from_str(&content) {
            Ok(config) => return config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring malformed identity file")
            }
        },
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable identity file")
        }
    }
    IdentityConfig::default()
}

/// Builds the acting principal from flags, falling back to the identity file.
/// With neither, the caller is anonymous.
pub fn resolve_principal(user: Option<String>, groups: Vec<String>) -> anyhow::Result<Principal> {
    let (account, mut groups) = match user {
        Some(user) => (Some(user), groups),
        None => {
            let config = load_identity_config();
            let mut all = config.groups;
            all.extend(groups);
            (config.username, all)
        }
    };
    let mut principal = match account {
        Some(name) if !name.trim().is_empty() => Principal::user(name.trim()),
        Some(_) => anyhow::bail!("--user must not be blank"),
        None => Principal::anonymous(),
    };
    for group in groups.drain(..) {
        principal = principal.with_group(group);
    }
    Ok(principal)
}
