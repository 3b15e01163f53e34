//! Credential storage: three independent JSON files in one owner-only directory

use crate::auth::{OAuth1Token, OAuth2Token, UserProfile};
use crate::error::AppError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const OAUTH1_TOKEN_FILE: &str = "oauth1_token.json";
pub const OAUTH2_TOKEN_FILE: &str = "oauth2_token.json";
pub const PROFILE_FILE: &str = "profile.json";

/// Everything that survives a process restart
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredTokens {
    pub oauth1: Option<OAuth1Token>,
    pub oauth2: Option<OAuth2Token>,
    pub profile: Option<UserProfile>,
}

impl StoredTokens {
    pub fn is_empty(&self) -> bool {
        self.oauth1.is_none() && self.oauth2.is_none() && self.profile.is_none()
    }

    /// Whether these tokens can authenticate without a password: an OAuth1
    /// token to mint bearer tokens from, or a live bearer token plus profile
    pub fn can_resume(&self, now: i64) -> bool {
        let live_bearer = self
            .oauth2
            .as_ref()
            .map_or(false, |t| !t.is_expired_at(now));
        self.oauth1.is_some() || (live_bearer && self.profile.is_some())
    }
}

/// File-backed token store rooted at a fixed directory
#[derive(Debug, Clone)]
pub struct TokenStore {
    dir: PathBuf,
}

impl TokenStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load whatever is persisted. Missing files are simply absent; if any
    /// present file cannot be read or parsed, nothing is returned at all.
    pub fn load(&self) -> StoredTokens {
        match self.try_load() {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!("Ignoring persisted tokens in {}: {}", self.dir.display(), e);
                StoredTokens::default()
            }
        }
    }

    fn try_load(&self) -> Result<StoredTokens, AppError> {
        Ok(StoredTokens {
            oauth1: self.read_file(OAUTH1_TOKEN_FILE)?,
            oauth2: self.read_file(OAUTH2_TOKEN_FILE)?,
            profile: self.read_file(PROFILE_FILE)?,
        })
    }

    fn read_file<T: DeserializeOwned>(&self, name: &str) -> Result<Option<T>, AppError> {
        let path = self.dir.join(name);
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(AppError::Storage(format!(
                    "Failed to read {}: {}",
                    path.display(),
                    e
                )))
            }
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| AppError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Write each present entity to its own file; absent ones are left alone
    pub fn save(&self, tokens: &StoredTokens) -> Result<(), AppError> {
        self.ensure_dir()?;

        if let Some(oauth1) = &tokens.oauth1 {
            self.write_file(OAUTH1_TOKEN_FILE, oauth1)?;
        }
        if let Some(oauth2) = &tokens.oauth2 {
            self.write_file(OAUTH2_TOKEN_FILE, oauth2)?;
        }
        if let Some(profile) = &tokens.profile {
            self.write_file(PROFILE_FILE, profile)?;
        }

        debug!("Saved tokens to {}", self.dir.display());
        Ok(())
    }

    /// Delete all persisted files
    pub fn clear(&self) -> Result<(), AppError> {
        for name in [OAUTH1_TOKEN_FILE, OAUTH2_TOKEN_FILE, PROFILE_FILE] {
            match fs::remove_file(self.dir.join(name)) {
                Ok(()) => {}
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    return Err(AppError::Storage(format!("Failed to remove {}: {}", name, e)))
                }
            }
        }
        Ok(())
    }

    fn ensure_dir(&self) -> Result<(), AppError> {
        if self.dir.exists() {
            return Ok(());
        }

        let mut builder = fs::DirBuilder::new();
        builder.recursive(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::DirBuilderExt;
            builder.mode(0o700);
        }
        builder.create(&self.dir).map_err(|e| {
            AppError::Storage(format!(
                "Failed to create token directory {}: {}",
                self.dir.display(),
                e
            ))
        })
    }

    fn write_file<T: Serialize>(&self, name: &str, value: &T) -> Result<(), AppError> {
        let path = self.dir.join(name);
        let contents = serde_json::to_string_pretty(value)
            .map_err(|e| AppError::Storage(format!("Failed to serialize {}: {}", name, e)))?;

        write_private(&path, contents.as_bytes())
            .map_err(|e| AppError::Storage(format!("Failed to write {}: {}", path.display(), e)))
    }
}

/// Write a file readable by the owner only
fn write_private(path: &Path, contents: &[u8]) -> io::Result<()> {
    use std::io::Write;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    file.write_all(contents)?;

    // mode() only applies on creation
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}
