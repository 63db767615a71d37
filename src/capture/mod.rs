mod core;
mod encode;
#[cfg(test)]
mod tests;

pub use self::core::{CaptureStation, CapturedImage};
pub use encode::encode_jpeg;
