//! Integration tests for the tokio event loop
//!
//! Tests run on a paused clock so the timers advance as soon as the
//! runtime is idle.

use std::time::Duration;

use office_traffic::core::config::GameConfig;
use office_traffic::core::types::{EntityId, Location};
use office_traffic::simulation::{
    spawn_session, DefeatCause, Outcome, PlacementOutcome, PlacementTarget, SessionController,
    SessionEvent,
};

fn controller() -> SessionController {
    SessionController::with_seed(GameConfig::default(), 7).unwrap()
}

#[tokio::test(start_paused = true)]
async fn test_unattended_session_is_defeated() {
    let (handle, mut events, task) = spawn_session(controller());
    handle.start().await.unwrap();

    let mut ended = Vec::new();
    while let Ok(Some(event)) = tokio::time::timeout(Duration::from_secs(60), events.recv()).await {
        if let SessionEvent::SessionEnded { outcome, .. } = event {
            ended.push(outcome);
        }
    }
    assert_eq!(ended.len(), 1);

    match &ended[0] {
        Outcome::Defeat {
            cause: DefeatCause::PatienceExhausted { entity, .. },
        } => assert_eq!(*entity, EntityId(1)),
        other => panic!("expected patience defeat, got {:?}", other),
    }

    handle.shutdown().await.unwrap();
    let outcome = task.await.unwrap().unwrap();
    assert_eq!(outcome.as_ref(), Some(&ended[0]));
}

#[tokio::test(start_paused = true)]
async fn test_placement_through_handle() {
    let (handle, _events, task) = spawn_session(controller());
    handle.start().await.unwrap();

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.is_running);
    let first = snapshot.entity(EntityId(1)).unwrap().clone();
    let slot = snapshot
        .slots
        .iter()
        .find(|s| s.is_free() && s.accepted == first.station_type)
        .unwrap()
        .id
        .clone();

    let outcome = handle
        .place(first.id, PlacementTarget::Slot(slot.clone()))
        .await
        .unwrap();
    assert_eq!(outcome, PlacementOutcome::PlacedInService);

    let snapshot = handle.snapshot().await.unwrap();
    let placed = snapshot.entity(EntityId(1)).unwrap();
    assert_eq!(placed.location, Location::InService);
    assert_eq!(placed.slot.as_ref(), Some(&slot));

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_stop_then_shutdown_has_no_outcome() {
    let (handle, _events, task) = spawn_session(controller());
    handle.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(3)).await;

    handle.stop().await.unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert!(!snapshot.is_running);

    handle.shutdown().await.unwrap();
    assert_eq!(task.await.unwrap().unwrap(), None);
    assert!(handle.snapshot().await.is_err());
}

#[tokio::test(start_paused = true)]
async fn test_restart_rearms_session() {
    let (handle, _events, task) = spawn_session(controller());
    handle.start().await.unwrap();
    tokio::time::sleep(Duration::from_secs(10)).await;

    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.time_remaining < 120);

    handle.restart().await.unwrap();
    let snapshot = handle.snapshot().await.unwrap();
    assert!(snapshot.is_running);
    assert_eq!(snapshot.time_remaining, 120);
    assert_eq!(snapshot.spawned_count, 1);
    assert_eq!(snapshot.completed_count, 0);

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_arrival_cadence_follows_phase() {
    let mut config = GameConfig::default();
    // Nobody gives up and the desk never fills, so arrivals keep coming
    config.patience.holding_decay = 0.1;
    config.holding_capacity = 15;
    let controller = SessionController::with_seed(config, 7).unwrap();

    let (handle, mut events, task) = spawn_session(controller);
    let started = tokio::time::Instant::now();
    handle.start().await.unwrap();

    let mut arrivals = Vec::new();
    while arrivals.len() < 10 {
        let event = tokio::time::timeout(Duration::from_secs(60), events.recv())
            .await
            .unwrap()
            .unwrap();
        if let SessionEvent::EntityCreated { .. } = event {
            let at = tokio::time::Instant::now() - started;
            arrivals.push(at.as_secs_f64().round() as u64);
        }
    }

    // 6s apart during the warm-up, 4s once the bottleneck phase is active
    assert_eq!(arrivals, vec![0, 6, 12, 18, 24, 30, 36, 42, 46, 50]);

    handle.shutdown().await.unwrap();
    task.await.unwrap().unwrap();
}
