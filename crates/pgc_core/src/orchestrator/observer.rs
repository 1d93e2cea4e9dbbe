//! Observer interface for conversion progress.

use super::runner::{CommandLine, ProcessExit};
use super::types::{OutputStream, RunState, Stage};

/// Receives everything a front end shows while a run is active.
///
/// Callbacks can arrive on any runtime worker thread; implementations
/// marshal to their own context if they need to. All methods default to
/// no-ops.
pub trait ConversionObserver: Send + Sync {
    /// The orchestrator state changed.
    fn on_state_changed(&self, _state: &RunState) {}

    /// A process is about to start.
    fn on_started(&self, _stage: &Stage, _command: &CommandLine) {}

    /// A chunk of output, forwarded as soon as it is read.
    fn on_output(&self, _stream: OutputStream, _chunk: &str) {}

    /// A process exited (or was killed).
    fn on_finished(&self, _stage: &Stage, _exit: &ProcessExit) {}
}

/// Observer that writes everything to `tracing`, for headless use.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl ConversionObserver for TracingObserver {
    fn on_state_changed(&self, state: &RunState) {
        tracing::debug!("Run state: {:?}", state);
    }

    fn on_output(&self, stream: OutputStream, chunk: &str) {
        for line in chunk.lines() {
            match stream {
                OutputStream::Stderr => tracing::warn!(target: "pandoc", "{}", line),
                OutputStream::Stdout | OutputStream::Log => tracing::info!(target: "pandoc", "{}", line),
            }
        }
    }

    fn on_finished(&self, stage: &Stage, exit: &ProcessExit) {
        tracing::info!("{} finished: {:?}", stage, exit);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl ConversionObserver for Silent {}

    #[test]
    fn observers_accept_every_event() {
        let command = CommandLine::new("pandoc").arg("--version");
        let observers: [&dyn ConversionObserver; 2] = [&Silent, &TracingObserver];
        for observer in observers {
            observer.on_state_changed(&RunState::Running(Stage::Single));
            observer.on_started(&Stage::Single, &command);
            observer.on_output(OutputStream::Stderr, "[WARNING] a\n[WARNING] b\n");
            observer.on_finished(&Stage::Single, &ProcessExit::Exited(0));
        }
    }
}
