//! End-to-end playback against a simulated bulb, on a paused clock

use lightscript_bulb::{BulbCall, BulbError, BulbSnapshot, Rgb, SimulatedConnector};
use lightscript_core::Script;
use lightscript_player::{
    ControlSignal, PlaybackControl, Player, PlayerConfig, PlayerError, SignalManager,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tempfile::NamedTempFile;
use tokio::time::{sleep_until, Instant};
use tokio_test::{assert_err, assert_ok};

const RED: Rgb = Rgb::new(255, 0, 0);
const GREEN: Rgb = Rgb::new(0, 255, 0);
const BLUE: Rgb = Rgb::new(0, 0, 255);

const RED_GREEN: &str = "
{ 30, { 'c', 255, 0, 0 } },
{ 30, { 'c', 0, 255, 0 } },
";

fn connector() -> SimulatedConnector {
    SimulatedConnector::new("3").with_light(false, Rgb::new(10, 20, 30))
}

fn player(
    connector: &SimulatedConnector,
    script: &str,
    control: &Arc<PlaybackControl>,
) -> Player<SimulatedConnector> {
    Player::new(
        connector.clone(),
        Script::parse(script).unwrap(),
        control.clone(),
        PlayerConfig::default(),
    )
    .with_rng(StdRng::seed_from_u64(7))
}

fn script_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

async fn at(start: Instant, millis: u64) {
    sleep_until(start + Duration::from_millis(millis)).await;
}

#[tokio::test(start_paused = true)]
async fn test_plays_timeline_and_restores() {
    let start = Instant::now();
    let connector = connector();
    let before = connector.light();
    let control = Arc::new(PlaybackControl::new());

    let script = "
        { 30, { 'c', 255, 0, 0 } },
        { 30, { 'c', 0, 0, 0 } },
    ";
    let handle = tokio::spawn(player(&connector, script, &control).run());

    at(start, 500).await;
    assert!(connector.light().on);
    assert_eq!(connector.light().rgb, RED);

    at(start, 1500).await;
    assert!(!connector.light().on);

    at(start, 2500).await;
    assert!(connector.light().on);
    assert_eq!(connector.light().rgb, RED);

    control.request_shutdown();
    let summary = assert_ok!(handle.await.unwrap());
    assert_eq!(summary.passes, 2);
    assert_eq!(summary.commands, 3);
    assert_eq!(summary.reconnects, 0);

    // Stops at the next command boundary, then restores
    assert_eq!(start.elapsed(), Duration::from_secs(3));
    let after = connector.light();
    assert!(!after.on);
    assert_eq!(after.hsb, before.hsb);

    let writes = connector.writes();
    assert_eq!(
        writes,
        vec![
            BulbCall::TurnOn,
            BulbCall::SetRgb(RED),
            BulbCall::TurnOff,
            BulbCall::TurnOn,
            BulbCall::SetRgb(RED),
            BulbCall::RestoreSnapshot(BulbSnapshot {
                on: false,
                hsb: before.hsb,
                transition_secs: None,
            }),
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_time_adjust_resets_each_pass() {
    let start = Instant::now();
    let connector = connector();
    let control = Arc::new(PlaybackControl::new());

    // Each pass: 0.5s, 1.5s, 1.5s
    let script = "
        { 0,  { 't', 15 } },
        { 30, { 'c', 255, 0, 0 } },
        { 30, { 'c', 0, 0, 0 } },
    ";
    let handle = tokio::spawn(player(&connector, script, &control).run());

    at(start, 1400).await;
    assert!(connector.light().on);
    at(start, 1900).await;
    assert!(connector.light().on);
    at(start, 2100).await;
    assert!(!connector.light().on);

    // Second pass starts at 3.5s with the same timing
    at(start, 3800).await;
    assert!(!connector.light().on);
    at(start, 4200).await;
    assert!(connector.light().on);
    at(start, 5300).await;
    assert!(connector.light().on);
    at(start, 5700).await;
    assert!(!connector.light().on);

    control.request_shutdown();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_interrupt_during_sleep() {
    let start = Instant::now();
    let connector = connector();
    let before = connector.light();
    let control = Arc::new(PlaybackControl::new());
    let signals = SignalManager::new(control.clone(), "unused.ls");

    let script = "{ 300, { 'c', 0, 0, 255 } },";
    let handle = tokio::spawn(player(&connector, script, &control).run());

    at(start, 1000).await;
    assert_eq!(connector.light().rgb, BLUE);
    signals.handle(ControlSignal::Interrupt);

    let summary = assert_ok!(handle.await.unwrap());
    assert_eq!(summary.commands, 1);
    assert_eq!(start.elapsed(), Duration::from_secs(10));
    assert_eq!(connector.light().hsb, before.hsb);
    assert!(!connector.light().on);
}

#[tokio::test(start_paused = true)]
async fn test_reload_switches_at_pass_boundary() {
    let start = Instant::now();
    let connector = connector();
    let control = Arc::new(PlaybackControl::new());
    let reloaded = script_file("{ 30, { 'c', 0, 0, 255 } },\n");
    let signals = SignalManager::new(control.clone(), reloaded.path());

    let handle = tokio::spawn(player(&connector, RED_GREEN, &control).run());

    at(start, 500).await;
    signals.handle(ControlSignal::Reload);

    // The current pass finishes first
    at(start, 1500).await;
    assert_eq!(connector.light().rgb, GREEN);

    at(start, 2500).await;
    assert_eq!(connector.light().rgb, BLUE);
    at(start, 3500).await;
    assert_eq!(connector.light().rgb, BLUE);

    control.request_shutdown();
    let summary = assert_ok!(handle.await.unwrap());
    assert_eq!(summary.passes, 3);
}

#[tokio::test(start_paused = true)]
async fn test_invalid_reload_keeps_script() {
    let start = Instant::now();
    let connector = connector();
    let control = Arc::new(PlaybackControl::new());
    let broken = script_file("{ 30, { 'c', 0, 0 } },\n");
    let signals = SignalManager::new(control.clone(), broken.path());

    let handle = tokio::spawn(player(&connector, RED_GREEN, &control).run());

    at(start, 500).await;
    signals.handle(ControlSignal::Reload);

    at(start, 2500).await;
    assert_eq!(connector.light().rgb, RED);
    at(start, 3500).await;
    assert_eq!(connector.light().rgb, GREEN);

    control.request_shutdown();
    assert_ok!(handle.await.unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_retries_with_backoff_after_connectivity_loss() {
    let start = Instant::now();
    let connector = connector();
    let control = Arc::new(PlaybackControl::new());

    let handle = tokio::spawn(player(&connector, RED_GREEN, &control).run());

    at(start, 500).await;
    connector.fail_operations(2);
    connector.fail_connects(1);

    // 1s: operation fails, wait 1s
    // 2s: connect fails, wait 2s
    // 4s: reconnects, operation fails, wait 4s
    // 8s: reconnects, green goes through
    at(start, 7900).await;
    assert_eq!(connector.light().rgb, RED);
    at(start, 8100).await;
    assert_eq!(connector.light().rgb, GREEN);

    // Backoff was reset, so the next pass keeps normal pace
    at(start, 9100).await;
    assert_eq!(connector.light().rgb, RED);

    control.request_shutdown();
    let summary = assert_ok!(handle.await.unwrap());
    assert_eq!(summary.reconnects, 2);
    assert_eq!(connector.connects(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_shutdown_during_backoff_stops_reconnecting() {
    let start = Instant::now();
    let connector = connector();
    let control = Arc::new(PlaybackControl::new());

    let handle = tokio::spawn(player(&connector, RED_GREEN, &control).run());

    at(start, 500).await;
    connector.fail_operations(1);
    connector.fail_connects(1);

    // 1s: green fails, wait 1s; 2s: connect fails, wait 2s until 4s
    at(start, 2500).await;
    control.request_shutdown();

    let summary = assert_ok!(handle.await.unwrap());
    assert_eq!(start.elapsed(), Duration::from_secs(4));

    // The only reconnect is the one made to restore
    assert_eq!(summary.reconnects, 1);
    assert_eq!(connector.connects(), 2);
    assert!(!connector.writes().contains(&BulbCall::SetRgb(GREEN)));
    assert!(matches!(
        connector.calls().last(),
        Some(BulbCall::RestoreSnapshot(_))
    ));
    assert!(!connector.light().on);
}

#[tokio::test(start_paused = true)]
async fn test_restore_retries_while_bulb_unreachable() {
    let start = Instant::now();
    let connector = connector();
    let before = connector.light();
    let control = Arc::new(PlaybackControl::new());

    let handle = tokio::spawn(player(&connector, RED_GREEN, &control).run());

    at(start, 500).await;
    connector.fail_operations(1);
    connector.fail_connects(3);
    at(start, 2500).await;
    control.request_shutdown();

    // Playback stops at 4s; restore connects fail at 4s and 8s, then
    // succeed at 16s
    let summary = assert_ok!(handle.await.unwrap());
    assert_eq!(start.elapsed(), Duration::from_secs(16));
    assert_eq!(summary.reconnects, 1);
    assert!(matches!(
        connector.calls().last(),
        Some(BulbCall::RestoreSnapshot(_))
    ));
    assert_eq!(connector.light().hsb, before.hsb);
    assert!(!connector.light().on);
}

#[tokio::test(start_paused = true)]
async fn test_restore_gives_up_after_repeated_failures() {
    let start = Instant::now();
    let connector = connector();
    let control = Arc::new(PlaybackControl::new());

    let handle = tokio::spawn(player(&connector, RED_GREEN, &control).run());

    at(start, 500).await;
    connector.fail_operations(1);
    connector.fail_connects(100);
    at(start, 2500).await;
    control.request_shutdown();

    // Restore tries at 4s, 8s, 16s, 32s and 62s
    let err = assert_err!(handle.await.unwrap());
    assert!(matches!(err, PlayerError::Bulb(ref e) if e.is_connectivity()));
    assert_eq!(start.elapsed(), Duration::from_secs(62));
    assert!(!connector
        .calls()
        .iter()
        .any(|call| matches!(call, BulbCall::RestoreSnapshot(_))));
}

#[tokio::test(start_paused = true)]
async fn test_rejected_operation_is_fatal_but_restores() {
    let start = Instant::now();
    let connector = connector();
    let control = Arc::new(PlaybackControl::new());

    let handle = tokio::spawn(player(&connector, RED_GREEN, &control).run());

    at(start, 500).await;
    connector.reject_operations(1);

    let err = assert_err!(handle.await.unwrap());
    assert!(matches!(err, PlayerError::Bulb(BulbError::Rejected { .. })));
    assert!(matches!(
        connector.calls().last(),
        Some(BulbCall::RestoreSnapshot(_))
    ));
}

#[tokio::test]
async fn test_unreachable_bulb_at_startup() {
    let connector = connector();
    connector.fail_connects(1);
    let control = Arc::new(PlaybackControl::new());

    let err = assert_err!(player(&connector, RED_GREEN, &control).run().await);
    assert!(matches!(err, PlayerError::Bulb(ref e) if e.is_connectivity()));
    assert!(connector.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_empty_script_idles() {
    let start = Instant::now();
    let connector = connector();
    let control = Arc::new(PlaybackControl::new());

    let handle = tokio::spawn(player(&connector, "", &control).run());

    at(start, 2500).await;
    control.request_shutdown();

    let summary = assert_ok!(handle.await.unwrap());
    assert_eq!(summary.passes, 3);
    assert_eq!(summary.commands, 0);
    assert_eq!(connector.writes().len(), 2);
}
