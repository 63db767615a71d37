use super::auth::{CredentialsFile, StoredCredentials};
use super::{RemoteFile, RemoteFolder, RemoteStore};
use crate::config::RemoteConfig;
use crate::error::{AuthError, RemoteError};
use async_trait::async_trait;
use chrono::Utc;
use reqwest::{header, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use url::Url;

pub const FOLDER_MIME_TYPE: &str = "application/vnd.google-apps.folder";
const ROOT_PARENT: &str = "root";

/// Authorized Google Drive v3 session.
pub struct DriveSession {
    client: reqwest::Client,
    api_base: Url,
    upload_base: Url,
    credentials_file: CredentialsFile,
    credentials: Mutex<StoredCredentials>,
}

#[derive(Deserialize)]
struct FileList {
    #[serde(default)]
    files: Vec<RemoteFolder>,
}

impl DriveSession {
    pub fn new(
        config: &RemoteConfig,
        client: reqwest::Client,
        credentials_file: CredentialsFile,
        credentials: StoredCredentials,
    ) -> Result<Self, AuthError> {
        Ok(Self {
            client,
            api_base: Url::parse(&config.api_base)?,
            upload_base: Url::parse(&config.upload_base)?,
            credentials_file,
            credentials: Mutex::new(credentials),
        })
    }

    pub fn credentials_path(&self) -> &Path {
        self.credentials_file.path()
    }

    fn endpoint(base: &Url, path: &str) -> String {
        format!("{}/{}", base.as_str().trim_end_matches('/'), path)
    }

    /// Build an authorized request, refreshing the access token first if it expired.
    async fn request(&self, method: Method, url: String) -> Result<RequestBuilder, RemoteError> {
        let mut credentials = self.credentials.lock().await;

        if credentials.needs_refresh(Utc::now()) {
            credentials
                .refresh(&self.client)
                .await
                .map_err(|e| RemoteError::Unauthorized(e.to_string()))?;
            if let Err(e) = self.credentials_file.write(&credentials).await {
                warn!("Failed to save refreshed credentials: {}", e);
            }
        }

        let access_token = credentials
            .access_token
            .as_deref()
            .ok_or_else(|| RemoteError::Unauthorized("no access token".to_string()))?;

        Ok(self
            .client
            .request(method, url)
            .header(header::AUTHORIZATION, format!("Bearer {}", access_token)))
    }
}

/// Drive search expression for un-trashed folders named `name` directly under `parent`.
pub fn folder_query(name: &str, parent: Option<&str>) -> String {
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false and '{}' in parents",
        escape_query_value(name),
        FOLDER_MIME_TYPE,
        escape_query_value(parent.unwrap_or(ROOT_PARENT))
    )
}

fn escape_query_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Body for a `multipart/related` upload: JSON metadata part, then the media part.
pub(crate) fn multipart_related_body(
    boundary: &str,
    metadata: &serde_json::Value,
    media_type: &str,
    media: &[u8],
) -> Vec<u8> {
    let mut body = Vec::with_capacity(media.len() + 512);
    body.extend_from_slice(
        format!(
            "--{boundary}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n\
             --{boundary}\r\nContent-Type: {media_type}\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(media);
    body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());
    body
}

#[async_trait]
trait ResponseExt {
    async fn parse<T: DeserializeOwned>(self) -> Result<T, RemoteError>;
}

#[async_trait]
impl ResponseExt for reqwest::Response {
    async fn parse<T: DeserializeOwned>(self) -> Result<T, RemoteError> {
        let status = self.status();
        if status.is_success() {
            Ok(self.json().await?)
        } else {
            let body = self.text().await.unwrap_or_default();
            Err(RemoteError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }
}

#[async_trait]
impl RemoteStore for DriveSession {
    async fn find_folders(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<Vec<RemoteFolder>, RemoteError> {
        let query = folder_query(name, parent);
        debug!("Folder query: {}", query);

        let list: FileList = self
            .request(Method::GET, Self::endpoint(&self.api_base, "files"))
            .await?
            .query(&[
                ("q", query.as_str()),
                ("fields", "files(id,name)"),
                ("spaces", "drive"),
            ])
            .send()
            .await?
            .parse()
            .await?;

        Ok(list.files)
    }

    async fn create_folder(
        &self,
        name: &str,
        parent: Option<&str>,
    ) -> Result<RemoteFolder, RemoteError> {
        let folder: RemoteFolder = self
            .request(Method::POST, Self::endpoint(&self.api_base, "files"))
            .await?
            .query(&[("fields", "id,name")])
            .json(&json!({
                "name": name,
                "mimeType": FOLDER_MIME_TYPE,
                "parents": [parent.unwrap_or(ROOT_PARENT)],
            }))
            .send()
            .await?
            .parse()
            .await?;

        info!("Created folder: {}", name);
        Ok(folder)
    }

    async fn upload_file(
        &self,
        local_path: &Path,
        name: &str,
        parent: &str,
    ) -> Result<RemoteFile, RemoteError> {
        let media = tokio::fs::read(local_path)
            .await
            .map_err(|e| RemoteError::LocalFile {
                path: local_path.display().to_string(),
                source: e,
            })?;

        let boundary = format!("plantcam-{}", uuid::Uuid::new_v4().simple());
        let metadata = json!({ "name": name, "parents": [parent] });
        let body = multipart_related_body(&boundary, &metadata, "image/jpeg", &media);

        let file: RemoteFile = self
            .request(Method::POST, Self::endpoint(&self.upload_base, "files"))
            .await?
            .query(&[("uploadType", "multipart"), ("fields", "id,name")])
            .header(
                header::CONTENT_TYPE,
                format!("multipart/related; boundary={}", boundary),
            )
            .body(body)
            .send()
            .await?
            .parse()
            .await?;

        debug!("Uploaded {} ({} bytes) as {}", name, media.len(), file.id);
        Ok(file)
    }
}
