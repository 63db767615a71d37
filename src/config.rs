use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct PlantcamConfig {
    pub capture: CaptureConfig,
    pub camera: CameraConfig,
    pub storage: StorageConfig,
    pub remote: RemoteConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CaptureConfig {
    /// Seconds between capture cycles
    #[serde(default = "default_interval_seconds")]
    pub interval_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CameraConfig {
    /// Camera device index (e.g., 0 for /dev/video0)
    #[serde(default = "default_camera_index")]
    pub index: u32,

    /// Requested resolution (width, height); the device may ignore it
    #[serde(default = "default_camera_resolution")]
    pub resolution: (u32, u32),

    /// JPEG quality, 1-100
    #[serde(default = "default_jpeg_quality")]
    pub jpeg_quality: u8,

    /// Seconds to let auto-exposure settle before grabbing a frame
    #[serde(default = "default_warmup_seconds")]
    pub warmup_seconds: u64,

    /// A written image must be strictly larger than this
    #[serde(default = "default_min_file_bytes")]
    pub min_file_bytes: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    /// Local root under which day directories are created
    #[serde(default = "default_image_root")]
    pub image_root: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct RemoteConfig {
    /// Top-level remote folder holding the day folders
    #[serde(default = "default_root_folder")]
    pub root_folder: String,

    /// Cached OAuth credentials, rewritten after every refresh
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,

    /// Upload attempts per image
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    /// Fixed pause between failed upload attempts
    #[serde(default = "default_retry_delay_seconds")]
    pub retry_delay_seconds: u64,

    #[serde(default = "default_api_base")]
    pub api_base: String,

    #[serde(default = "default_upload_base")]
    pub upload_base: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Directory for the dated log file
    #[serde(default = "default_log_directory")]
    pub directory: String,

    /// Log file name prefix; the date is appended
    #[serde(default = "default_log_file_prefix")]
    pub file_prefix: String,
}

impl PlantcamConfig {
    /// Load configuration from default sources (file + environment variables)
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_file("plantcam.toml")
    }

    /// Load configuration from a specific file path
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path_str = path.as_ref().to_string_lossy();
        debug!("Loading configuration from: {}", path_str);

        let settings = Config::builder()
            .set_default("capture.interval_seconds", default_interval_seconds())?
            .set_default("camera.index", default_camera_index())?
            .set_default(
                "camera.resolution",
                vec![default_camera_resolution().0, default_camera_resolution().1],
            )?
            .set_default("camera.jpeg_quality", default_jpeg_quality() as u64)?
            .set_default("camera.warmup_seconds", default_warmup_seconds())?
            .set_default("camera.min_file_bytes", default_min_file_bytes())?
            .set_default("storage.image_root", default_image_root())?
            .set_default("remote.root_folder", default_root_folder())?
            .set_default("remote.credentials_path", default_credentials_path())?
            .set_default("remote.max_retries", default_max_retries())?
            .set_default("remote.retry_delay_seconds", default_retry_delay_seconds())?
            .set_default("remote.api_base", default_api_base())?
            .set_default("remote.upload_base", default_upload_base())?
            .set_default("logging.directory", default_log_directory())?
            .set_default("logging.file_prefix", default_log_file_prefix())?
            .add_source(File::with_name(&path_str).required(false))
            .add_source(
                Environment::with_prefix("PLANTCAM")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()?;

        let config: PlantcamConfig = settings.try_deserialize()?;

        info!("Configuration loaded successfully");
        debug!("Final configuration: {:#?}", config);

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capture.interval_seconds == 0 {
            return Err(ConfigError::Message(
                "Capture interval_seconds must be greater than 0".to_string(),
            ));
        }

        if self.camera.resolution.0 == 0 || self.camera.resolution.1 == 0 {
            return Err(ConfigError::Message(
                "Camera resolution must be greater than 0".to_string(),
            ));
        }

        if !(1..=100).contains(&self.camera.jpeg_quality) {
            return Err(ConfigError::Message(
                "Camera jpeg_quality must be between 1 and 100".to_string(),
            ));
        }

        if self.remote.max_retries == 0 {
            return Err(ConfigError::Message(
                "Remote max_retries must be at least 1".to_string(),
            ));
        }

        if self.remote.root_folder.trim().is_empty() {
            return Err(ConfigError::Message(
                "Remote root_folder must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    pub fn capture_interval(&self) -> Duration {
        Duration::from_secs(self.capture.interval_seconds)
    }
}

impl CameraConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_secs(self.warmup_seconds)
    }
}

impl RemoteConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_seconds)
    }
}

impl Default for PlantcamConfig {
    fn default() -> Self {
        Self {
            capture: CaptureConfig {
                interval_seconds: default_interval_seconds(),
            },
            camera: CameraConfig {
                index: default_camera_index(),
                resolution: default_camera_resolution(),
                jpeg_quality: default_jpeg_quality(),
                warmup_seconds: default_warmup_seconds(),
                min_file_bytes: default_min_file_bytes(),
            },
            storage: StorageConfig {
                image_root: default_image_root(),
            },
            remote: RemoteConfig {
                root_folder: default_root_folder(),
                credentials_path: default_credentials_path(),
                max_retries: default_max_retries(),
                retry_delay_seconds: default_retry_delay_seconds(),
                api_base: default_api_base(),
                upload_base: default_upload_base(),
            },
            logging: LoggingConfig {
                directory: default_log_directory(),
                file_prefix: default_log_file_prefix(),
            },
        }
    }
}

// Default value functions
fn default_interval_seconds() -> u64 {
    60
}

fn default_camera_index() -> u32 {
    0
}
fn default_camera_resolution() -> (u32, u32) {
    (1920, 1080)
}
fn default_jpeg_quality() -> u8 {
    95
}
fn default_warmup_seconds() -> u64 {
    2
}
fn default_min_file_bytes() -> u64 {
    1000
}

fn default_image_root() -> String {
    "captured_images".to_string()
}

fn default_root_folder() -> String {
    "plants".to_string()
}
fn default_credentials_path() -> String {
    "mycreds.json".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay_seconds() -> u64 {
    5
}
fn default_api_base() -> String {
    "https://www.googleapis.com/drive/v3".to_string()
}
fn default_upload_base() -> String {
    "https://www.googleapis.com/upload/drive/v3".to_string()
}

fn default_log_directory() -> String {
    ".".to_string()
}
fn default_log_file_prefix() -> String {
    "plant_monitor".to_string()
}
