/// Scheduler loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Stopping,
}

/// Why the loop stopped
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShutdownReason {
    Signal(String),
    UserRequest,
    /// The loop was entered before `initialize()` succeeded
    NotInitialized,
}

/// Result of one capture → resolve → upload cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Image stored locally and remotely
    Uploaded { file_name: String, remote_id: String },
    /// No usable image; nothing written, nothing uploaded
    CaptureFailed,
    /// Image kept locally, day folder could not be resolved
    FolderUnavailable { file_name: String },
    /// Image kept locally, every upload attempt failed
    UploadFailed { file_name: String },
    /// Loop already stopping; cycle skipped
    Skipped,
}

impl CycleOutcome {
    pub fn is_uploaded(&self) -> bool {
        matches!(self, Self::Uploaded { .. })
    }
}
