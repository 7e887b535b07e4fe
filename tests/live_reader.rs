//! Live reader sessions against a mock metering API
//!
//! Run with: cargo test --test live_reader

mod mock_servers;

use heatnet_console::bus::{create_bus, BusEvent, SharedBus};
use heatnet_console::config::ApiConfig;
use heatnet_console::pollers::{
    FeedMode, LiveReaderRegistry, ReaderError, ReaderState, IDLE_POLLS,
};
use heatnet_console::upstream::ApiClient;
use mock_servers::{unreachable_base_url, MockMeteringApi};
use serde_json::json;
use std::time::Duration;
use tokio::sync::broadcast;

const POLL: Duration = Duration::from_millis(40);

fn registry(base_url: String, fallback: bool, bus: SharedBus) -> LiveReaderRegistry {
    let api = ApiClient::new(&ApiConfig {
        base_url,
        timeout_secs: 2,
    })
    .unwrap()
    .with_demo_fallback(fallback);
    LiveReaderRegistry::new(api, bus, POLL)
}

/// Wait for an event matching `predicate`
async fn expect_event<F>(rx: &mut broadcast::Receiver<BusEvent>, predicate: F, timeout_ms: u64) -> BusEvent
where
    F: Fn(&BusEvent) -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_millis(timeout_ms);
    loop {
        let remaining = deadline.saturating_duration_since(tokio::time::Instant::now());
        match tokio::time::timeout(remaining, rx.recv()).await {
            Ok(Ok(event)) if predicate(&event) => return event,
            Ok(Ok(_)) => continue,
            Ok(Err(e)) => panic!("bus closed: {}", e),
            Err(_) => panic!("timed out after {}ms waiting for event", timeout_ms),
        }
    }
}

/// Poll the snapshot until `gateway` has at least `polls` committed polls
async fn wait_for_polls(readers: &LiveReaderRegistry, gateway: &str, polls: u64) {
    for _ in 0..100 {
        if readers.snapshot(gateway).await.polls >= polls {
            return;
        }
        tokio::time::sleep(POLL / 2).await;
    }
    panic!("{} never reached {} polls", gateway, polls);
}

#[tokio::test]
async fn connected_gateway_reads_live() {
    let api = MockMeteringApi::start().await;
    api.reply_json("GET", "/api/mbus/connected", 200, json!({ "gateways": [{ "id": "gw-1" }] }))
        .await;
    api.reply_json(
        "GET",
        "/api/mbus/readings/gw-1",
        200,
        json!([{ "meter_id": "HM-100", "value": "1520.4", "unit": "kWh" }]),
    )
    .await;
    let readers = registry(api.base_url(), true, create_bus());

    let connected = readers.connect("gw-1").await.unwrap();
    assert_eq!(connected.state, ReaderState::Connected);
    assert_eq!(connected.mode, Some(FeedMode::Live));

    readers.start("gw-1").await.unwrap();
    wait_for_polls(&readers, "gw-1", 2).await;

    let snapshot = readers.snapshot("gw-1").await;
    assert_eq!(snapshot.state, ReaderState::Reading);
    assert_eq!(snapshot.readings[0].meter_id.as_str(), "HM-100");
    assert_eq!(snapshot.readings[0].value, Some(1520.4));
    assert_eq!(readers.reading().await, vec!["gw-1".to_string()]);

    readers.shutdown().await;
}

#[tokio::test]
async fn no_readings_after_stop() {
    let api = MockMeteringApi::start().await;
    api.reply_json("GET", "/api/mbus/connected", 200, json!(["gw-2"])).await;
    api.reply_json("GET", "/api/mbus/readings/gw-2", 200, json!([{ "meter_id": "HM-1", "value": 1 }]))
        .await;
    let readers = registry(api.base_url(), true, create_bus());

    readers.connect("gw-2").await.unwrap();
    readers.start("gw-2").await.unwrap();
    wait_for_polls(&readers, "gw-2", 1).await;

    let stopped = readers.stop("gw-2").await.unwrap();
    assert_eq!(stopped.state, ReaderState::Stopped);
    let hits = api.hits("GET", "/api/mbus/readings/gw-2").await;

    tokio::time::sleep(POLL * 5).await;

    let later = readers.snapshot("gw-2").await;
    assert_eq!(later.polls, stopped.polls);
    assert_eq!(later.readings, stopped.readings);
    // At most one request was already in flight when stop returned
    assert!(api.hits("GET", "/api/mbus/readings/gw-2").await <= hits + 1);
    assert!(readers.reading().await.is_empty());
}

#[tokio::test]
async fn unconnected_gateway_is_simulated_with_fallback() {
    let api = MockMeteringApi::start().await;
    api.reply_json("GET", "/api/mbus/connected", 200, json!([])).await;
    let readers = registry(api.base_url(), true, create_bus());

    let connected = readers.connect("gw-3").await.unwrap();
    assert_eq!(connected.mode, Some(FeedMode::Simulated));

    readers.start("gw-3").await.unwrap();
    wait_for_polls(&readers, "gw-3", 1).await;

    let snapshot = readers.snapshot("gw-3").await;
    assert!(snapshot
        .readings
        .iter()
        .all(|r| r.meter_id.as_str().starts_with("SIM-")));
    assert_eq!(api.hits("GET", "/api/mbus/readings/gw-3").await, 0);

    readers.shutdown().await;
}

#[tokio::test]
async fn connect_fails_without_fallback() {
    let readers = registry(unreachable_base_url().await, false, create_bus());

    let result = readers.connect("gw-4").await;

    match result {
        Err(ReaderError::Unavailable(gateway)) => assert_eq!(gateway, "gw-4"),
        other => panic!("expected unavailable, got {:?}", other),
    }
    assert_eq!(readers.snapshot("gw-4").await.state, ReaderState::Disconnected);
    assert_eq!(readers.session_count().await, 0);
}

#[tokio::test]
async fn start_before_connect_is_refused() {
    let readers = registry(unreachable_base_url().await, true, create_bus());

    let result = readers.start("gw-5").await;

    assert!(matches!(result, Err(ReaderError::Transition(_))));
    assert_eq!(readers.snapshot("gw-5").await.state, ReaderState::Disconnected);
    assert_eq!(readers.session_count().await, 0);
}

#[tokio::test]
async fn refused_actions_leave_no_session() {
    let readers = registry(unreachable_base_url().await, true, create_bus());

    for i in 0..50 {
        let gateway = format!("junk-{}", i);
        assert!(readers.start(&gateway).await.is_err());
        assert!(readers.stop(&gateway).await.is_err());
        assert!(readers.disconnect(&gateway).await.is_err());
    }

    assert_eq!(readers.session_count().await, 0);
}

#[tokio::test]
async fn disconnect_forgets_the_session() {
    let api = MockMeteringApi::start().await;
    api.reply_json("GET", "/api/mbus/connected", 200, json!([])).await;
    let readers = registry(api.base_url(), true, create_bus());

    readers.connect("gw-7").await.unwrap();
    readers.start("gw-7").await.unwrap();
    assert_eq!(readers.session_count().await, 1);

    readers.disconnect("gw-7").await.unwrap();

    assert_eq!(readers.session_count().await, 0);
    assert!(readers.reading().await.is_empty());
    assert!(matches!(
        readers.stop("gw-7").await,
        Err(ReaderError::Transition(_))
    ));
}

#[tokio::test]
async fn unwatched_reader_stops_itself() {
    let api = MockMeteringApi::start().await;
    api.reply_json("GET", "/api/mbus/connected", 200, json!(["gw-8"])).await;
    api.reply_json("GET", "/api/mbus/readings/gw-8", 200, json!([{ "meter_id": "HM-8", "value": 8 }]))
        .await;
    let bus = create_bus();
    let mut rx = bus.subscribe();
    let readers = registry(api.base_url(), true, bus);

    readers.connect("gw-8").await.unwrap();
    readers.start("gw-8").await.unwrap();

    // Nobody asks for the state, so the loop gives up on its own
    expect_event(
        &mut rx,
        |e| matches!(e, BusEvent::ReaderStateChanged { gateway_id, state } if gateway_id == "gw-8" && state == "stopped"),
        (POLL * IDLE_POLLS * 4).as_millis() as u64,
    )
    .await;
    assert!(readers.reading().await.is_empty());

    let hits = api.hits("GET", "/api/mbus/readings/gw-8").await;
    tokio::time::sleep(POLL * 5).await;
    assert_eq!(api.hits("GET", "/api/mbus/readings/gw-8").await, hits);
    assert_eq!(readers.snapshot("gw-8").await.state, ReaderState::Stopped);

    readers.shutdown().await;
}

#[tokio::test]
async fn watched_reader_keeps_reading() {
    let api = MockMeteringApi::start().await;
    api.reply_json("GET", "/api/mbus/connected", 200, json!([])).await;
    let readers = registry(api.base_url(), true, create_bus());

    readers.connect("gw-9").await.unwrap();
    readers.start("gw-9").await.unwrap();

    let deadline = tokio::time::Instant::now() + POLL * IDLE_POLLS * 2;
    while tokio::time::Instant::now() < deadline {
        assert_eq!(readers.snapshot("gw-9").await.state, ReaderState::Reading);
        tokio::time::sleep(POLL).await;
    }

    readers.shutdown().await;
}

#[tokio::test]
async fn state_changes_and_readings_are_published() {
    let api = MockMeteringApi::start().await;
    api.reply_json("GET", "/api/mbus/connected", 200, json!([])).await;
    let bus = create_bus();
    let mut rx = bus.subscribe();
    let readers = registry(api.base_url(), true, bus);

    readers.connect("gw-6").await.unwrap();
    expect_event(
        &mut rx,
        |e| matches!(e, BusEvent::ReaderStateChanged { gateway_id, state } if gateway_id == "gw-6" && state == "connected"),
        1000,
    )
    .await;

    readers.start("gw-6").await.unwrap();
    expect_event(
        &mut rx,
        |e| matches!(e, BusEvent::LiveReading { gateway_id, .. } if gateway_id == "gw-6"),
        1000,
    )
    .await;

    let disconnected = readers.disconnect("gw-6").await.unwrap();
    assert_eq!(disconnected.state, ReaderState::Disconnected);
    assert!(disconnected.readings.is_empty());
    expect_event(
        &mut rx,
        |e| matches!(e, BusEvent::ReaderStateChanged { state, .. } if state == "disconnected"),
        1000,
    )
    .await;
}

#[tokio::test]
async fn shutdown_stops_every_session() {
    let api = MockMeteringApi::start().await;
    api.reply_json("GET", "/api/mbus/connected", 200, json!([])).await;
    let readers = registry(api.base_url(), true, create_bus());

    for gateway in ["gw-a", "gw-b"] {
        readers.connect(gateway).await.unwrap();
        readers.start(gateway).await.unwrap();
    }
    assert_eq!(readers.reading().await.len(), 2);

    readers.shutdown().await;

    assert!(readers.reading().await.is_empty());
    assert_eq!(readers.snapshot("gw-a").await.state, ReaderState::Disconnected);
}
