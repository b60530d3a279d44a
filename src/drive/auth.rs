//! Credential acquisition
//!
//! Produces the bearer-token [`Session`] every Drive request carries. The
//! token comes from the command line / environment or from a token file,
//! either raw text (as printed by `gcloud auth print-access-token`) or a
//! JSON document with an `access_token` field.

use crate::error::{MigrateError, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Environment variable holding an access token
pub const ACCESS_TOKEN_ENV: &str = "DRIVEMOVE_ACCESS_TOKEN";

/// Environment variable holding a token file path
pub const TOKEN_FILE_ENV: &str = "DRIVEMOVE_TOKEN_FILE";

/// Where to look for credentials
#[derive(Debug, Clone, Default)]
pub struct CredentialSource {
    /// Access token given directly
    pub access_token: Option<String>,
    /// File containing the token
    pub token_file: Option<PathBuf>,
}

impl CredentialSource {
    /// Read the source from environment variables
    pub fn from_env() -> Self {
        Self {
            access_token: std::env::var(ACCESS_TOKEN_ENV).ok(),
            token_file: std::env::var(TOKEN_FILE_ENV).ok().map(PathBuf::from),
        }
    }
}

/// An authenticated session
#[derive(Clone)]
pub struct Session {
    access_token: String,
    expires_at: Option<DateTime<Utc>>,
}

impl Session {
    /// Wrap an access token
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            expires_at: None,
        }
    }

    /// Bearer token for request headers
    pub fn access_token(&self) -> &str {
        &self.access_token
    }

    /// Expiry recorded in the token file, if any
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct TokenFile {
    #[serde(alias = "token")]
    access_token: String,
    #[serde(default, alias = "expires_at")]
    expiry: Option<DateTime<Utc>>,
}

/// Establish a session from the first available credential
///
/// An explicit token wins over a token file.
pub fn acquire_credentials(source: &CredentialSource) -> Result<Session> {
    if let Some(token) = source.access_token.as_deref().map(str::trim) {
        if !token.is_empty() {
            tracing::debug!("Using access token from arguments/environment");
            return Ok(Session::new(token));
        }
    }

    if let Some(path) = &source.token_file {
        return load_token_file(path, Utc::now());
    }

    Err(MigrateError::Auth(format!(
        "no credentials found; pass --access-token or --token-file (or set {} / {})",
        ACCESS_TOKEN_ENV, TOKEN_FILE_ENV
    )))
}

fn load_token_file(path: &Path, now: DateTime<Utc>) -> Result<Session> {
    let contents = std::fs::read_to_string(path).map_err(|e| MigrateError::io(path, e))?;
    let trimmed = contents.trim();

    let session = if trimmed.starts_with('{') {
        let parsed: TokenFile = serde_json::from_str(trimmed).map_err(|e| {
            MigrateError::Auth(format!("unreadable token file {}: {}", path.display(), e))
        })?;
        Session {
            access_token: parsed.access_token.trim().to_string(),
            expires_at: parsed.expiry,
        }
    } else {
        Session::new(trimmed)
    };

    if session.access_token.is_empty() {
        return Err(MigrateError::Auth(format!(
            "token file {} is empty",
            path.display()
        )));
    }

    if let Some(expiry) = session.expires_at {
        if expiry <= now {
            return Err(MigrateError::Auth(format!(
                "token in {} expired at {}",
                path.display(),
                expiry.to_rfc3339()
            )));
        }
    }

    tracing::debug!("Loaded access token from {:?}", path);
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn token_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_explicit_token_wins() {
        let file = token_file("from-file");
        let source = CredentialSource {
            access_token: Some("  from-flag \n".to_string()),
            token_file: Some(file.path().to_path_buf()),
        };
        let session = acquire_credentials(&source).unwrap();
        assert_eq!(session.access_token(), "from-flag");
    }

    #[test]
    fn test_raw_token_file() {
        let file = token_file("ya29.raw-token\n");
        let source = CredentialSource {
            access_token: None,
            token_file: Some(file.path().to_path_buf()),
        };
        assert_eq!(acquire_credentials(&source).unwrap().access_token(), "ya29.raw-token");
    }

    #[test]
    fn test_json_token_file() {
        let file = token_file(r#"{"access_token": "ya29.json", "expiry": "2999-01-01T00:00:00Z"}"#);
        let session = load_token_file(file.path(), Utc::now()).unwrap();
        assert_eq!(session.access_token(), "ya29.json");
        assert!(session.expires_at().is_some());
    }

    #[test]
    fn test_expired_token_file() {
        let file = token_file(r#"{"token": "old", "expires_at": "2000-01-01T00:00:00Z"}"#);
        let err = load_token_file(file.path(), Utc::now()).unwrap_err();
        assert!(matches!(err, MigrateError::Auth(_)));
    }

    #[test]
    fn test_missing_credentials() {
        let err = acquire_credentials(&CredentialSource::default()).unwrap_err();
        assert!(matches!(err, MigrateError::Auth(_)));
    }

    #[test]
    fn test_missing_token_file() {
        let source = CredentialSource {
            access_token: Some(String::new()),
            token_file: Some(PathBuf::from("/nonexistent/drivemove/token.json")),
        };
        assert!(matches!(
            acquire_credentials(&source).unwrap_err(),
            MigrateError::Io { .. }
        ));
    }

    #[test]
    fn test_debug_redacts_token() {
        let session = Session::new("secret-value");
        assert!(!format!("{:?}", session).contains("secret-value"));
    }
}
