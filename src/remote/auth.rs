use super::drive::DriveSession;
use crate::config::RemoteConfig;
use crate::error::AuthError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Tokens are refreshed this long before they actually expire.
const EXPIRY_SKEW_SECS: i64 = 60;

fn default_token_uri() -> String {
    "https://oauth2.googleapis.com/token".to_string()
}

/// OAuth client credentials plus the last issued tokens.
///
/// The refresh token comes from a one-time interactive consent done outside
/// this program; everything after that is handled here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub refresh_token: String,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub expiry: Option<DateTime<Utc>>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

impl StoredCredentials {
    /// Whether the access token is missing or about to expire at `now`.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        match (&self.access_token, self.expiry) {
            (Some(_), Some(expiry)) => expiry - ChronoDuration::seconds(EXPIRY_SKEW_SECS) <= now,
            _ => true,
        }
    }

    /// Exchange the refresh token for a new access token.
    pub async fn refresh(&mut self, client: &reqwest::Client) -> Result<(), AuthError> {
        debug!("Refreshing access token at {}", self.token_uri);

        let response = client
            .post(&self.token_uri)
            .form(&[
                ("grant_type", "refresh_token"),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", self.refresh_token.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AuthError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        let token: TokenResponse = response.json().await?;
        self.apply(token, Utc::now());
        info!("Access token refreshed");
        Ok(())
    }

    fn apply(&mut self, token: TokenResponse, now: DateTime<Utc>) {
        self.access_token = Some(token.access_token);
        self.expiry = Some(now + ChronoDuration::seconds(token.expires_in));
        if let Some(refresh_token) = token.refresh_token {
            self.refresh_token = refresh_token;
        }
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
    #[serde(default)]
    refresh_token: Option<String>,
}

/// The credentials cache on disk, a single JSON document.
#[derive(Debug, Clone)]
pub struct CredentialsFile {
    path: PathBuf,
}

impl CredentialsFile {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn read(&self) -> Result<StoredCredentials, AuthError> {
        let bytes = fs::read(&self.path)
            .await
            .map_err(|e| AuthError::CredentialsMissing {
                path: self.path.display().to_string(),
                source: e,
            })?;
        serde_json::from_slice(&bytes).map_err(|e| AuthError::CredentialsMalformed {
            path: self.path.display().to_string(),
            source: e,
        })
    }

    pub async fn write(&self, credentials: &StoredCredentials) -> Result<(), AuthError> {
        let value = serde_json::to_vec_pretty(credentials).map_err(|e| {
            AuthError::CredentialsMalformed {
                path: self.path.display().to_string(),
                source: e,
            }
        })?;
        let write_error = |e: std::io::Error| AuthError::CredentialsWrite {
            path: self.path.display().to_string(),
            source: e,
        };

        fs::write(&self.path, &value).await.map_err(write_error)?;

        // Holds the client secret and refresh token: owner-only, also when the
        // file already existed with wider permissions
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&self.path, std::fs::Permissions::from_mode(0o600))
                .await
                .map_err(write_error)?;
        }

        Ok(())
    }
}

/// Load cached credentials, refresh them if needed, save them back and open a session.
pub async fn authenticate(config: &RemoteConfig) -> Result<DriveSession, AuthError> {
    authenticate_with(config, reqwest::Client::new()).await
}

/// [`authenticate`] over a caller-supplied HTTP client.
pub async fn authenticate_with(
    config: &RemoteConfig,
    client: reqwest::Client,
) -> Result<DriveSession, AuthError> {
    info!("Authenticating with remote storage...");

    let file = CredentialsFile::new(&config.credentials_path);
    let mut credentials = file.read().await?;

    if credentials.needs_refresh(Utc::now()) {
        credentials.refresh(&client).await?;
    } else {
        debug!("Cached access token still valid");
    }

    file.write(&credentials).await?;

    DriveSession::new(config, client, file, credentials)
}
