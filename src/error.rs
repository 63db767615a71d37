use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlantcamError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Camera error: {0}")]
    Camera(#[from] CameraError),

    #[error("Remote storage error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),

    #[error("System error: {message}")]
    System { message: String },
}

impl PlantcamError {
    pub fn system<S: Into<String>>(message: S) -> Self {
        Self::System {
            message: message.into(),
        }
    }
}

/// Failures while loading or refreshing remote credentials. Always fatal at startup.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("credentials file {path} could not be read (complete the one-time consent flow to create it): {source}")]
    CredentialsMissing {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("credentials file {path} is malformed: {source}")]
    CredentialsMalformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to persist credentials to {path}: {source}")]
    CredentialsWrite {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("token refresh request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("token endpoint rejected refresh ({status}): {body}")]
    Rejected { status: u16, body: String },

    #[error("invalid endpoint URL: {0}")]
    Endpoint(#[from] url::ParseError),

    #[error("top-level folder {name} could not be resolved: {source}")]
    RootFolder {
        name: String,
        #[source]
        source: RemoteError,
    },
}

/// Failures of a single capture attempt.
#[derive(Error, Debug)]
pub enum CameraError {
    #[error("cannot open camera device {index}: {details}")]
    DeviceOpen { index: u32, details: String },

    #[error("camera produced no frame: {details}")]
    NoFrame { details: String },

    #[error("failed to encode frame: {details}")]
    Encode { details: String },

    #[error("failed to write {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("image file {path} not created or too small ({size} bytes, need more than {minimum})")]
    TooSmall { path: String, size: u64, minimum: u64 },
}

/// Failures talking to the remote store.
#[derive(Error, Debug)]
pub enum RemoteError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("invalid endpoint URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("remote store returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to read local file {path}: {source}")]
    LocalFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("session is not authorized: {0}")]
    Unauthorized(String),

    #[error("{0}")]
    Other(String),
}

/// Upload gave up after every attempt failed.
#[derive(Error, Debug)]
#[error("upload of {file_name} failed after {attempts} attempts: {last}")]
pub struct UploadError {
    pub file_name: String,
    pub attempts: u32,
    #[source]
    pub last: RemoteError,
}

pub type Result<T> = std::result::Result<T, PlantcamError>;
