mod interface;
mod mock;
#[cfg(all(feature = "camera", target_os = "linux"))]
mod pipeline;

pub use interface::{system_backend, CameraBackend, CameraDevice, Frame, UnavailableBackend};
pub use mock::{noise_frame, ScriptedCamera, ScriptedOutcome};
#[cfg(all(feature = "camera", target_os = "linux"))]
pub use pipeline::GstCameraBackend;
