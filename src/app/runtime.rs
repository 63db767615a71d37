use super::orchestrator::request_shutdown;
use super::{CycleOutcome, LoopState, PlantcamOrchestrator, ShutdownReason};
use crate::error::Result;
use std::sync::Arc;
use tokio::signal;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, error, info};

impl PlantcamOrchestrator {
    /// Run the capture loop with signal handling until SIGINT or SIGTERM.
    pub async fn run(&mut self) -> Result<i32> {
        info!(
            "Capturing an image every {} seconds. Press Ctrl+C to stop.",
            self.config.capture.interval_seconds
        );

        self.setup_signal_handlers();

        let shutdown_reason = self.run_loop().await;
        info!("Shutdown initiated: {:?}", shutdown_reason);

        info!("Plant monitor stopped");
        Ok(match shutdown_reason {
            ShutdownReason::NotInitialized => 1,
            _ => 0,
        })
    }

    /// Run a single cycle and stop. Used by `--once`.
    pub async fn run_once(&mut self) -> CycleOutcome {
        let outcome = self.run_cycle().await;
        self.apply_retention();
        self.state = LoopState::Stopping;
        outcome
    }

    /// The first cycle runs immediately, later cycles on each interval tick.
    ///
    /// Cancellation is only observed between cycles; a cycle that has started
    /// always runs to completion. A cycle that overruns the interval delays the
    /// next tick instead of queueing missed ones.
    pub async fn run_loop(&mut self) -> ShutdownReason {
        // Only a successful initialize() enters Running
        if self.state != LoopState::Running || self.root_folder_id.is_none() {
            error!("Capture loop started before remote storage was initialized");
            return ShutdownReason::NotInitialized;
        }

        let token = self.cancellation_token.clone();
        let mut ticker = interval(self.config.capture_interval());
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }

            let outcome = self.run_cycle().await;
            debug!("Cycle finished: {:?}", outcome);
            self.apply_retention();
        }

        self.state = LoopState::Stopping;
        self.shutdown_reason
            .lock()
            .clone()
            .unwrap_or(ShutdownReason::UserRequest)
    }

    /// SIGTERM (systemd stop) and SIGINT (Ctrl+C) both cancel the loop token.
    fn setup_signal_handlers(&self) {
        #[cfg(unix)]
        {
            let token = self.cancellation_token.clone();
            let slot = Arc::clone(&self.shutdown_reason);
            tokio::spawn(async move {
                let mut sigterm = match signal::unix::signal(signal::unix::SignalKind::terminate())
                {
                    Ok(sigterm) => sigterm,
                    Err(e) => {
                        error!("Failed to register SIGTERM handler: {}", e);
                        return;
                    }
                };
                if let Some(()) = sigterm.recv().await {
                    info!("Received SIGTERM signal");
                    request_shutdown(&token, &slot, ShutdownReason::Signal("SIGTERM".to_string()));
                }
            });
        }

        let token = self.cancellation_token.clone();
        let slot = Arc::clone(&self.shutdown_reason);
        tokio::spawn(async move {
            if let Ok(()) = signal::ctrl_c().await {
                info!("Received SIGINT signal (Ctrl+C)");
                request_shutdown(&token, &slot, ShutdownReason::Signal("SIGINT".to_string()));
            }
        });
    }
}
