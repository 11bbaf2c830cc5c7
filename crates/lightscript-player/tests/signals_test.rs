//! Process signals delivered to a running `SignalManager`

#![cfg(unix)]

use lightscript_player::{PlaybackControl, SignalManager};
use std::io::Write;
use std::process::Command;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;

fn send(signal: &str) {
    let status = Command::new("kill")
        .args([signal, &std::process::id().to_string()])
        .status()
        .unwrap();
    assert!(status.success());
}

async fn wait_for(mut done: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if done() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_hangup_reloads_then_interrupt_stops() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"{ 30, { 'c', 0, 0, 255 } },\n{ 30, { 'c', 0, 0, 0 } },\n")
        .unwrap();

    let control = Arc::new(PlaybackControl::new());
    let listener = SignalManager::new(control.clone(), file.path())
        .listen()
        .unwrap();

    send("-HUP");
    let mut reloaded = None;
    assert!(wait_for(|| {
        reloaded = control.take_script();
        reloaded.is_some()
    })
    .await);
    assert_eq!(reloaded.unwrap().len(), 2);
    assert!(!control.is_shutdown());

    send("-INT");
    assert!(wait_for(|| control.is_shutdown()).await);

    listener.abort();
}
