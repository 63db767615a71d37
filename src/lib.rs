pub mod app;
pub mod camera;
pub mod capture;
pub mod config;
pub mod error;
pub mod remote;
pub mod storage;

pub use app::{CycleOutcome, LoopState, PlantcamOrchestrator, ShutdownReason};
pub use camera::{CameraBackend, CameraDevice, Frame};
pub use capture::{CaptureStation, CapturedImage};
pub use config::PlantcamConfig;
pub use error::{AuthError, CameraError, PlantcamError, RemoteError, Result, UploadError};
pub use remote::{DriveSession, FolderResolver, MemoryStore, RemoteStore, Uploader};
pub use storage::{ImageStore, KeepAll, RetentionPolicy};
