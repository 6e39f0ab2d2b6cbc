//! End-to-end tests of the purchase flow: file-backed identity, HTTP client
//! and controller against the fake purchase server.
//!
//! Real time is used throughout (paused time would fire the HTTP timeouts),
//! so cooldowns run on a short tick period.

#![allow(clippy::unwrap_used)]

use std::path::Path;
use std::time::Duration;

use bobs_corn_integration_tests::{FakeCornServer, ScriptedResponse};
use bobs_corn_storefront::config::ApiConfig;
use bobs_corn_storefront::db::{FileStore, IdentityStore};
use bobs_corn_storefront::purchase::HttpPurchaseClient;
use bobs_corn_storefront::services::{
    ControllerEvent, CooldownTimer, Notice, Phase, PurchaseController,
};
use tokio::sync::mpsc;

const BOUGHT_AT_MS: i64 = 1_700_000_000_000;
const FAST_TICK: Duration = Duration::from_millis(20);

struct Session {
    controller: PurchaseController<HttpPurchaseClient>,
    inbox: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl Session {
    fn open(server: &FakeCornServer, state_path: &Path) -> Self {
        Self::open_with(&server.api_config().unwrap(), state_path)
    }

    fn open_with(api: &ApiConfig, state_path: &Path) -> Self {
        let client = HttpPurchaseClient::new(api).unwrap();
        let mut identities = IdentityStore::new(FileStore::new(state_path));
        let (events, inbox) = mpsc::unbounded_channel();
        let controller = PurchaseController::with_identity_store(client, &mut identities, events)
            .unwrap()
            .with_timer(CooldownTimer::with_period(FAST_TICK));
        Self { controller, inbox }
    }

    /// Deliver the next event from the channel.
    async fn pump(&mut self) -> Option<Notice> {
        let event = tokio::time::timeout(Duration::from_secs(5), self.inbox.recv())
            .await
            .unwrap()
            .unwrap();
        self.controller.handle(event)
    }

    /// Press buy and wait for the attempt to finish.
    async fn buy(&mut self) -> Notice {
        assert_eq!(self.controller.handle(ControllerEvent::BuyPressed), None);
        assert_eq!(self.controller.phase(), Phase::InFlight);
        self.pump().await.unwrap()
    }

    /// Pump ticks until the controller is ready again.
    async fn wait_out_cooldown(&mut self) -> usize {
        let mut ticks = 0;
        while self.controller.phase() == Phase::Cooldown {
            self.pump().await;
            ticks += 1;
        }
        ticks
    }
}

#[tokio::test]
async fn test_fresh_store_first_purchase_succeeds() {
    let server = FakeCornServer::start([ScriptedResponse::success(BOUGHT_AT_MS)])
        .await
        .unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let mut session = Session::open(&server, &tmp.path().join("state.json"));

    let notice = session.buy().await;

    assert!(matches!(notice, Notice::Purchased { .. }));
    let snapshot = session.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert!(snapshot.cooldown.is_idle());
    assert!(snapshot.last_attempt.unwrap().outcome.is_success());
}

#[tokio::test]
async fn test_rate_limited_then_cooldown_then_real_call() {
    let server = FakeCornServer::start([
        ScriptedResponse::success(BOUGHT_AT_MS),
        ScriptedResponse::rate_limited(Some(15), Some(45)),
        ScriptedResponse::success(BOUGHT_AT_MS + 60_000),
    ])
    .await
    .unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let mut session = Session::open(&server, &tmp.path().join("state.json"));

    session.buy().await;
    let notice = session.buy().await;
    assert_eq!(
        notice,
        Notice::RateLimited {
            retry_after_seconds: 15
        }
    );
    let cooldown = session.controller.snapshot().cooldown;
    assert_eq!(cooldown.total_seconds(), 15);
    assert_eq!(cooldown.remaining_seconds(), 15);

    // Pressing buy during the cooldown never reaches the server
    for _ in 0..5 {
        assert!(matches!(
            session.controller.handle(ControllerEvent::BuyPressed),
            Some(Notice::CoolingDown { .. })
        ));
    }
    assert_eq!(server.request_count(), 2);

    assert_eq!(session.wait_out_cooldown().await, 15);
    assert_eq!(session.controller.phase(), Phase::Ready);

    let notice = session.buy().await;
    assert!(matches!(notice, Notice::Purchased { .. }));
    assert_eq!(server.request_count(), 3);
}

#[tokio::test]
async fn test_malformed_response_then_immediate_retry() {
    let server = FakeCornServer::start([
        ScriptedResponse::raw(axum::http::StatusCode::SERVICE_UNAVAILABLE, "down"),
        ScriptedResponse::success(BOUGHT_AT_MS),
    ])
    .await
    .unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let mut session = Session::open(&server, &tmp.path().join("state.json"));

    assert_eq!(session.buy().await, Notice::MalformedResponse);
    assert_eq!(session.controller.phase(), Phase::Ready);

    assert!(matches!(session.buy().await, Notice::Purchased { .. }));
    assert_eq!(server.request_count(), 2);
}

#[tokio::test]
async fn test_unreachable_server_then_immediate_retry() {
    // Bind then drop a listener so nothing is accepting on the port
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let tmp = tempfile::tempdir().unwrap();
    let api = ApiConfig::with_base_url(&format!("http://{addr}/api")).unwrap();
    let mut session = Session::open_with(&api, &tmp.path().join("state.json"));

    assert_eq!(session.buy().await, Notice::NetworkFailure);
    let snapshot = session.controller.snapshot();
    assert_eq!(snapshot.phase, Phase::Ready);
    assert!(snapshot.cooldown.is_idle());

    // No cooldown: the next press goes straight back out
    assert_eq!(session.buy().await, Notice::NetworkFailure);
}

#[tokio::test]
async fn test_identity_stable_across_sessions() {
    let server = FakeCornServer::start([
        ScriptedResponse::success(BOUGHT_AT_MS),
        ScriptedResponse::rate_limited(None, Some(1)),
    ])
    .await
    .unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let state_path = tmp.path().join("nested").join("state.json");

    let first_identity = {
        let mut session = Session::open(&server, &state_path);
        session.buy().await;
        session.controller.teardown();
        session.controller.identity().clone()
    };

    // Restart: new controller, same state file
    let mut session = Session::open(&server, &state_path);
    assert_eq!(session.controller.identity(), &first_identity);
    session.buy().await;

    let ids: Vec<_> = server
        .requests()
        .into_iter()
        .map(|request| request.client_id.unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            first_identity.as_str().to_string(),
            first_identity.as_str().to_string()
        ]
    );
}

#[tokio::test]
async fn test_teardown_during_request_discards_result() {
    let server = FakeCornServer::start([
        ScriptedResponse::success(BOUGHT_AT_MS).delayed(Duration::from_millis(100))
    ])
    .await
    .unwrap();
    let tmp = tempfile::tempdir().unwrap();
    let mut session = Session::open(&server, &tmp.path().join("state.json"));

    session.controller.handle(ControllerEvent::BuyPressed);
    session.controller.teardown();

    assert_eq!(session.pump().await, None);
    assert_eq!(session.controller.snapshot().last_attempt, None);
    assert_eq!(server.request_count(), 1);
}
