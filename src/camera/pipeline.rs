use super::interface::{CameraBackend, CameraDevice, Frame};
use crate::error::CameraError;
use gstreamer::prelude::*;
use gstreamer::Pipeline;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use tracing::{debug, info, warn};

const STATE_CHANGE_TIMEOUT_SECS: u64 = 5;
const PULL_TIMEOUT_SECS: u64 = 5;

/// GStreamer camera backend reading `/dev/video<index>` through v4l2src.
#[derive(Debug, Default, Clone, Copy)]
pub struct GstCameraBackend;

impl GstCameraBackend {
    pub fn new() -> Self {
        Self
    }

    /// Ask the source for `resolution` (raw or MJPEG), decode, convert to
    /// packed RGB. No scaling: frames keep the size the device negotiated. The
    /// appsink keeps only the newest frame so warmup frames are discarded.
    fn preferred_pipeline_string(index: u32, resolution: (u32, u32)) -> String {
        let (width, height) = resolution;
        Self::pipeline_string(
            index,
            &format!(
                "capsfilter caps=\"video/x-raw,width={w},height={h};image/jpeg,width={w},height={h}\" ! ",
                w = width,
                h = height
            ),
        )
    }

    /// Same pipeline with whatever size the device offers first.
    fn fallback_pipeline_string(index: u32) -> String {
        Self::pipeline_string(index, "")
    }

    fn pipeline_string(index: u32, source_caps: &str) -> String {
        format!(
            "v4l2src device=/dev/video{} ! \
             {}decodebin ! \
             videoconvert ! video/x-raw,format=RGB ! \
             appsink name=sink sync=false max-buffers=1 drop=true enable-last-sample=false",
            index, source_caps
        )
    }

    fn start(index: u32, pipeline_desc: &str) -> Result<GstCameraDevice, CameraError> {
        debug!("Creating GStreamer pipeline: {}", pipeline_desc);

        let pipeline = gstreamer::parse::launch(pipeline_desc)
            .map_err(|e| CameraError::DeviceOpen {
                index,
                details: format!("Failed to create pipeline: {}", e),
            })?
            .downcast::<Pipeline>()
            .map_err(|_| CameraError::DeviceOpen {
                index,
                details: "Failed to downcast to Pipeline".to_string(),
            })?;

        let appsink = pipeline
            .by_name("sink")
            .and_then(|element| element.downcast::<AppSink>().ok())
            .ok_or_else(|| CameraError::DeviceOpen {
                index,
                details: "Pipeline has no appsink".to_string(),
            })?;

        // Wrap before changing state so a failure below still tears the pipeline down
        let device = GstCameraDevice {
            index,
            pipeline,
            appsink,
        };

        device
            .pipeline
            .set_state(gstreamer::State::Playing)
            .map_err(|e| CameraError::DeviceOpen {
                index,
                details: format!("Failed to start pipeline: {}", e),
            })?;

        let (result, _current, _pending) = device
            .pipeline
            .state(gstreamer::ClockTime::from_seconds(STATE_CHANGE_TIMEOUT_SECS));
        result.map_err(|e| CameraError::DeviceOpen {
            index,
            details: format!("Device did not start: {}", e),
        })?;

        Ok(device)
    }
}

impl CameraBackend for GstCameraBackend {
    fn open(
        &self,
        index: u32,
        resolution: (u32, u32),
    ) -> Result<Box<dyn CameraDevice>, CameraError> {
        gstreamer::init().map_err(|e| CameraError::DeviceOpen {
            index,
            details: format!("Failed to initialize GStreamer: {}", e),
        })?;

        // The requested size is a preference; the device may not offer it
        let device = match Self::start(index, &Self::preferred_pipeline_string(index, resolution)) {
            Ok(device) => device,
            Err(e) => {
                warn!(
                    "Camera {} rejected {}x{} ({}), using its default size",
                    index, resolution.0, resolution.1, e
                );
                Self::start(index, &Self::fallback_pipeline_string(index))?
            }
        };

        info!("Opened camera /dev/video{}", index);
        Ok(Box::new(device))
    }
}

struct GstCameraDevice {
    index: u32,
    pipeline: Pipeline,
    appsink: AppSink,
}

impl CameraDevice for GstCameraDevice {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        let sample = self
            .appsink
            .try_pull_sample(gstreamer::ClockTime::from_seconds(PULL_TIMEOUT_SECS))
            .ok_or_else(|| CameraError::NoFrame {
                details: format!("no sample within {}s", PULL_TIMEOUT_SECS),
            })?;

        let caps = sample.caps().ok_or_else(|| CameraError::NoFrame {
            details: "sample has no caps".to_string(),
        })?;
        let video_info = VideoInfo::from_caps(caps).map_err(|e| CameraError::NoFrame {
            details: format!("unreadable caps: {}", e),
        })?;

        let buffer = sample.buffer().ok_or_else(|| CameraError::NoFrame {
            details: "sample has no buffer".to_string(),
        })?;
        let map = buffer.map_readable().map_err(|e| CameraError::NoFrame {
            details: format!("buffer not readable: {}", e),
        })?;

        let width = video_info.width();
        let height = video_info.height();
        let row_bytes = width as usize * 3;
        let stride = video_info.stride()[0] as usize;
        let bytes = map.as_slice();

        if width == 0
            || height == 0
            || stride < row_bytes
            || bytes.len() < stride * (height as usize - 1) + row_bytes
        {
            return Err(CameraError::NoFrame {
                details: format!(
                    "short buffer: {} bytes for {}x{} stride {}",
                    bytes.len(),
                    width,
                    height,
                    stride
                ),
            });
        }

        let mut data = Vec::with_capacity(row_bytes * height as usize);
        for row in bytes.chunks(stride).take(height as usize) {
            data.extend_from_slice(&row[..row_bytes]);
        }

        debug!("Read {}x{} frame from /dev/video{}", width, height, self.index);
        Ok(Frame::new(width, height, data))
    }
}

impl Drop for GstCameraDevice {
    fn drop(&mut self) {
        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!("Failed to release camera /dev/video{}: {}", self.index, e);
        } else {
            debug!("Released camera /dev/video{}", self.index);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preferred_pipeline_requests_size_at_source() {
        let desc = GstCameraBackend::preferred_pipeline_string(2, (640, 480));

        assert!(desc.starts_with("v4l2src device=/dev/video2 ! capsfilter"));
        assert!(desc.contains("video/x-raw,width=640,height=480"));
        assert!(desc.contains("image/jpeg,width=640,height=480"));
        // Size constraint sits before decoding, output caps carry no size
        assert!(desc.find("width=640").unwrap() < desc.find("decodebin").unwrap());
        assert!(desc.contains("videoconvert ! video/x-raw,format=RGB ! appsink"));
        assert!(!desc.contains("videoscale"));
    }

    #[test]
    fn test_fallback_pipeline_has_no_size() {
        let desc = GstCameraBackend::fallback_pipeline_string(0);

        assert!(desc.starts_with("v4l2src device=/dev/video0 ! decodebin"));
        assert!(!desc.contains("width="));
        assert!(!desc.contains("videoscale"));
    }
}
