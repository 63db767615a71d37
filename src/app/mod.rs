mod cycle;
mod orchestrator;
mod runtime;
mod startup;
mod types;


pub use orchestrator::PlantcamOrchestrator;
pub use types::{CycleOutcome, LoopState, ShutdownReason};
