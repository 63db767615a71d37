use super::interface::{CameraBackend, CameraDevice, Frame};
use crate::error::CameraError;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// What the next `open` of a [`ScriptedCamera`] does.
#[derive(Debug, Clone)]
pub enum ScriptedOutcome {
    /// Open succeeds and the read returns this frame
    Frame(Frame),
    /// Open fails
    OpenFails,
    /// Open succeeds but the read fails
    NoFrame,
    /// Open succeeds and the read returns an empty buffer
    EmptyFrame,
}

/// Camera backend without hardware, replaying a script of outcomes.
///
/// Once the script runs out the last outcome repeats. Opens and releases are
/// counted so callers can check that every device handle is given back.
#[derive(Clone)]
pub struct ScriptedCamera {
    script: Arc<Mutex<VecDeque<ScriptedOutcome>>>,
    last: Arc<Mutex<ScriptedOutcome>>,
    opens: Arc<AtomicUsize>,
    releases: Arc<AtomicUsize>,
}

impl ScriptedCamera {
    pub fn new<I>(script: I) -> Self
    where
        I: IntoIterator<Item = ScriptedOutcome>,
    {
        let script: VecDeque<_> = script.into_iter().collect();
        let last = script.back().cloned().unwrap_or(ScriptedOutcome::OpenFails);
        Self {
            script: Arc::new(Mutex::new(script)),
            last: Arc::new(Mutex::new(last)),
            opens: Arc::new(AtomicUsize::new(0)),
            releases: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Always returns a deterministic noise frame of the given size.
    pub fn noise(width: u32, height: u32) -> Self {
        Self::new([ScriptedOutcome::Frame(noise_frame(width, height))])
    }

    /// Every open fails, as with a missing device index.
    pub fn missing() -> Self {
        Self::new([ScriptedOutcome::OpenFails])
    }

    /// Number of `open` calls, successful or not.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }

    /// Number of devices dropped after a successful open.
    pub fn release_count(&self) -> usize {
        self.releases.load(Ordering::SeqCst)
    }

    fn next_outcome(&self) -> ScriptedOutcome {
        match self.script.lock().pop_front() {
            Some(outcome) => {
                *self.last.lock() = outcome.clone();
                outcome
            }
            None => self.last.lock().clone(),
        }
    }
}

impl CameraBackend for ScriptedCamera {
    fn open(
        &self,
        index: u32,
        _resolution: (u32, u32),
    ) -> Result<Box<dyn CameraDevice>, CameraError> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let outcome = self.next_outcome();
        if let ScriptedOutcome::OpenFails = outcome {
            debug!("Scripted camera {} refuses to open", index);
            return Err(CameraError::DeviceOpen {
                index,
                details: "scripted open failure".to_string(),
            });
        }

        Ok(Box::new(ScriptedDevice {
            outcome: Some(outcome),
            releases: Arc::clone(&self.releases),
        }))
    }
}

struct ScriptedDevice {
    outcome: Option<ScriptedOutcome>,
    releases: Arc<AtomicUsize>,
}

impl CameraDevice for ScriptedDevice {
    fn read_frame(&mut self) -> Result<Frame, CameraError> {
        match self.outcome.take() {
            Some(ScriptedOutcome::Frame(frame)) => Ok(frame),
            Some(ScriptedOutcome::EmptyFrame) => Ok(Frame::new(0, 0, Vec::new())),
            _ => Err(CameraError::NoFrame {
                details: "scripted read failure".to_string(),
            }),
        }
    }
}

impl Drop for ScriptedDevice {
    fn drop(&mut self) {
        self.releases.fetch_add(1, Ordering::SeqCst);
    }
}

/// RGB noise from a fixed-seed LCG; compresses poorly, so the JPEG is never tiny.
pub fn noise_frame(width: u32, height: u32) -> Frame {
    let mut state: u32 = 0x1234_5678;
    let data = (0..width as usize * height as usize * 3)
        .map(|_| {
            state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
            (state >> 24) as u8
        })
        .collect();
    Frame::new(width, height, data)
}
