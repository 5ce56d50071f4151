//! Account file storage
//!
//! The account file is the only state that survives a restart. It is read
//! once at startup and rewritten in full after every completed cycle. Writes
//! go through temp-file + rename so a crash mid-write leaves the previous
//! cycle's file intact.

use std::path::{Path, PathBuf};

use common::Secret;
use farm_client::TokenPair;
use tracing::{debug, info};

use crate::error::{Error, Result};

/// Separator between the access token and the refresh token on a line.
const SEPARATOR: char = '|';

/// Credentials of one account.
#[derive(Debug, Clone)]
pub struct Account {
    pub token: Secret<String>,
    pub refresh_token: Secret<String>,
}

impl Account {
    pub fn new(token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            token: Secret::new(token.into()),
            refresh_token: Secret::new(refresh_token.into()),
        }
    }

    pub fn token(&self) -> &str {
        self.token.expose()
    }

    pub fn refresh_token(&self) -> &str {
        self.refresh_token.expose()
    }

    /// Current credentials as a token pair.
    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }

    /// Replace both tokens with a newer pair.
    pub fn adopt(&mut self, tokens: TokenPair) {
        self.token = tokens.access_token;
        self.refresh_token = tokens.refresh_token;
    }
}

/// Reads and rewrites the account file.
pub struct AccountStore {
    path: PathBuf,
}

impl AccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load all accounts in file order.
    ///
    /// A missing file yields an empty list; the caller decides whether that
    /// is fatal.
    pub async fn load(&self) -> Result<Vec<Account>> {
        if !self.path.exists() {
            info!(path = %self.path.display(), "account file not found");
            return Ok(Vec::new());
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::Io(format!("reading account file: {e}")))?;
        let accounts = parse_accounts(&contents)?;
        info!(path = %self.path.display(), accounts = accounts.len(), "loaded accounts");
        Ok(accounts)
    }

    /// Rewrite the file with `accounts`, in order.
    pub async fn save(&self, accounts: &[Account]) -> Result<()> {
        write_atomic(&self.path, &render_accounts(accounts)).await?;
        debug!(path = %self.path.display(), accounts = accounts.len(), "persisted accounts");
        Ok(())
    }
}

/// Parse `token|refreshToken` lines.
///
/// Blank lines are skipped. A line missing either half is rejected instead of
/// dropped, since the next save would erase it from the file.
pub fn parse_accounts(contents: &str) -> Result<Vec<Account>> {
    let mut accounts = Vec::new();
    for (idx, raw) in contents.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let (token, refresh) = line
            .split_once(SEPARATOR)
            .ok_or_else(|| Error::MalformedAccount {
                line: idx + 1,
                reason: format!("expected token{SEPARATOR}refreshToken"),
            })?;
        let (token, refresh) = (token.trim(), refresh.trim());
        if token.is_empty() || refresh.is_empty() {
            return Err(Error::MalformedAccount {
                line: idx + 1,
                reason: "empty token".into(),
            });
        }
        accounts.push(Account::new(token, refresh));
    }
    Ok(accounts)
}

/// Render accounts back into the file format, one per line.
pub fn render_accounts(accounts: &[Account]) -> String {
    accounts
        .iter()
        .map(|a| format!("{}{SEPARATOR}{}", a.token(), a.refresh_token()))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Write the account file atomically.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target. Sets file permissions to 0600 (owner read/write only) since
/// the file contains bearer tokens.
async fn write_atomic(path: &Path, data: &str) -> Result<()> {
    let dir = path
        .parent()
        .ok_or_else(|| Error::Io("account path has no parent directory".into()))?;

    let tmp_path = dir.join(format!(".accounts.tmp.{}", std::process::id()));

    tokio::fs::write(&tmp_path, data.as_bytes())
        .await
        .map_err(|e| Error::Io(format!("writing temp account file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        tokio::fs::set_permissions(&tmp_path, perms)
            .await
            .map_err(|e| Error::Io(format!("setting account file permissions: {e}")))?;
    }

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| Error::Io(format!("renaming temp account file: {e}")))?;

    Ok(())
}
