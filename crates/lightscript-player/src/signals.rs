//! Process signal handling
//!
//! SIGINT and SIGTERM request a graceful shutdown. SIGHUP re-reads the
//! script file and queues it for the next pass; a script that fails to
//! parse is logged and the current one keeps playing.

use crate::state::PlaybackControl;
use lightscript_core::Script;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};

/// A control request delivered to the player
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlSignal {
    /// SIGINT
    Interrupt,
    /// SIGTERM
    Terminate,
    /// SIGHUP
    Reload,
}

/// Routes control signals into [`PlaybackControl`]
#[derive(Debug, Clone)]
pub struct SignalManager {
    control: Arc<PlaybackControl>,
    script_path: PathBuf,
}

impl SignalManager {
    pub fn new(control: Arc<PlaybackControl>, script_path: impl Into<PathBuf>) -> Self {
        Self {
            control,
            script_path: script_path.into(),
        }
    }

    /// Apply one signal
    pub fn handle(&self, signal: ControlSignal) {
        match signal {
            ControlSignal::Interrupt => {
                info!("Interrupt received, stopping after the current command");
                self.control.request_shutdown();
            }
            ControlSignal::Terminate => {
                info!("Terminate received, stopping after the current command");
                self.control.request_shutdown();
            }
            ControlSignal::Reload => {
                info!("Reloading script from {}", self.script_path.display());
                match Script::load(&self.script_path) {
                    Ok(script) => self.control.submit_script(script),
                    Err(e) => error!("Reload failed, keeping current script: {}", e),
                }
            }
        }
    }

    /// Install the process signal handlers and serve them in a background task
    #[cfg(unix)]
    pub fn listen(self) -> io::Result<JoinHandle<()>> {
        use tokio::signal::unix::{signal, SignalKind};

        let mut interrupt = signal(SignalKind::interrupt())?;
        let mut terminate = signal(SignalKind::terminate())?;
        let mut hangup = signal(SignalKind::hangup())?;

        Ok(tokio::spawn(async move {
            loop {
                let received = tokio::select! {
                    Some(()) = interrupt.recv() => ControlSignal::Interrupt,
                    Some(()) = terminate.recv() => ControlSignal::Terminate,
                    Some(()) = hangup.recv() => ControlSignal::Reload,
                    else => break,
                };

                // Reload reads and parses the script file
                let manager = self.clone();
                if let Err(e) = tokio::task::spawn_blocking(move || manager.handle(received)).await
                {
                    error!("Signal handler failed: {}", e);
                }
            }
        }))
    }

    /// Install the process signal handlers and serve them in a background task
    ///
    /// Only Ctrl-C is available here; reload is not supported.
    #[cfg(not(unix))]
    pub fn listen(self) -> io::Result<JoinHandle<()>> {
        Ok(tokio::spawn(async move {
            while tokio::signal::ctrl_c().await.is_ok() {
                self.handle(ControlSignal::Interrupt);
            }
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn script_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_interrupt_and_terminate_request_shutdown() {
        for signal in [ControlSignal::Interrupt, ControlSignal::Terminate] {
            let control = Arc::new(PlaybackControl::new());
            let manager = SignalManager::new(control.clone(), "unused.ls");

            manager.handle(signal);
            assert!(control.is_shutdown());

            // A second request is harmless
            manager.handle(signal);
            assert!(control.is_shutdown());
        }
    }

    #[test]
    fn test_reload_queues_script() {
        let file = script_file("{ 30, { 'c', 255, 0, 0 } },\n{ 30, { 'c', 0, 0, 0 } },\n");
        let control = Arc::new(PlaybackControl::new());
        let manager = SignalManager::new(control.clone(), file.path());

        manager.handle(ControlSignal::Reload);

        let script = control.take_script().expect("script queued");
        assert_eq!(script.len(), 2);
        assert!(!control.is_shutdown());
    }

    #[test]
    fn test_reload_invalid_script_keeps_nothing_queued() {
        let file = script_file("{ 30, { 'c', 255, 0 } },\n");
        let control = Arc::new(PlaybackControl::new());
        let manager = SignalManager::new(control.clone(), file.path());

        manager.handle(ControlSignal::Reload);
        assert!(control.take_script().is_none());
    }

    #[test]
    fn test_reload_missing_file() {
        let control = Arc::new(PlaybackControl::new());
        let manager = SignalManager::new(control.clone(), "/nonexistent/show.ls");

        manager.handle(ControlSignal::Reload);
        assert!(control.take_script().is_none());
    }

    #[test]
    fn test_latest_reload_wins() {
        let first = script_file("{ 1, { 'c', 1, 1, 1 } },\n");
        let second = script_file("{ 1, { 'c', 2, 2, 2 } },\n{ 1, { 'c', 0, 0, 0 } },\n");
        let control = Arc::new(PlaybackControl::new());

        SignalManager::new(control.clone(), first.path()).handle(ControlSignal::Reload);
        SignalManager::new(control.clone(), second.path()).handle(ControlSignal::Reload);

        assert_eq!(control.take_script().unwrap().len(), 2);
        assert!(control.take_script().is_none());
    }
}
