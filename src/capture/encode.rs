use crate::camera::Frame;
use crate::error::CameraError;
use image::codecs::jpeg::JpegEncoder;
use image::ColorType;
use tracing::debug;

/// Encode an RGB8 frame as JPEG at `quality` (1-100).
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>, CameraError> {
    if frame.is_empty() {
        return Err(CameraError::NoFrame {
            details: "frame has no data".to_string(),
        });
    }

    let expected = frame.width as usize * frame.height as usize * 3;
    if frame.data.len() != expected {
        return Err(CameraError::Encode {
            details: format!(
                "{}x{} RGB frame needs {} bytes, got {}",
                frame.width,
                frame.height,
                expected,
                frame.data.len()
            ),
        });
    }

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, quality.clamp(1, 100))
        .encode(&frame.data, frame.width, frame.height, ColorType::Rgb8)
        .map_err(|e| CameraError::Encode {
            details: e.to_string(),
        })?;

    debug!(
        "Encoded {}x{} frame at quality {} into {} bytes",
        frame.width,
        frame.height,
        quality,
        jpeg.len()
    );
    Ok(jpeg)
}
