//! Update procedure integration tests.
//!
//! These tests drive a full update run through the public orchestrator API:
//! idle -> checking -> (awaiting consent) -> downloading -> complete

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use updraft_core::{
    testing::{fixtures, MockConsentPrompt, MockHost, MockTransport},
    update::UpdateSession,
    Collaborators, Connectivity, SessionState, SharedConnectivity, StringTable, UpdateConfig,
    UpdateError, UpdateOrchestrator,
};

/// Test helper wiring mock collaborators to an orchestrator.
struct TestHarness {
    transport: Arc<MockTransport>,
    prompt: Arc<MockConsentPrompt>,
    host: Arc<MockHost>,
    connectivity: Arc<SharedConnectivity>,
}

impl TestHarness {
    fn new(connectivity: Connectivity) -> Self {
        Self {
            transport: Arc::new(MockTransport::new()),
            prompt: Arc::new(MockConsentPrompt::new()),
            host: Arc::new(MockHost::new()),
            connectivity: Arc::new(SharedConnectivity::new(connectivity)),
        }
    }

    fn create_orchestrator(&self, config: UpdateConfig) -> UpdateOrchestrator {
        UpdateOrchestrator::new(
            config,
            Collaborators {
                transport: self.transport.clone(),
                prompt: self.prompt.clone(),
                host: self.host.clone(),
                connectivity: self.connectivity.clone(),
                localizer: Arc::new(StringTable::with_defaults()),
            },
        )
    }
}

#[test]
fn test_full_update_run() {
    let harness = TestHarness::new(Connectivity::Unrestricted);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    assert_eq!(orchestrator.state(), SessionState::Checking);

    harness
        .transport
        .publish(fixtures::check_complete_event(3, 3000));
    assert_eq!(orchestrator.state(), SessionState::Downloading);

    harness
        .transport
        .publish_all(fixtures::successful_download("ui.dat", 1000));
    harness
        .transport
        .publish_all(fixtures::successful_download("music.dat", 1000));

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.success_count, 2);
    assert_eq!(snapshot.transferred_bytes, 2000);
    assert!(!orchestrator.tick());

    harness
        .transport
        .publish_all(fixtures::successful_download("scenes.dat", 1000));
    harness.transport.publish(fixtures::all_complete_event());

    assert!(orchestrator.tick());
    let reports = harness.host.advances();
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].success_count, 3);
    assert_eq!(reports[0].total_item_count, 3);
    assert!(!reports[0].is_degraded());

    orchestrator.leave(false);
    assert_eq!(harness.transport.subscriber_count(), 0);
}

#[test]
fn test_synchronous_transport_does_not_deadlock() {
    let harness = TestHarness::new(Connectivity::Unrestricted);
    harness
        .transport
        .set_check_script(vec![fixtures::check_complete_event(1, 500)]);
    let mut download = fixtures::successful_download("a.dat", 500);
    download.push(fixtures::all_complete_event());
    harness.transport.set_update_script(download);

    let orchestrator = harness.create_orchestrator(UpdateConfig::default());
    orchestrator.enter();

    assert_eq!(orchestrator.state(), SessionState::Complete);
    assert!(orchestrator.tick());
    assert_eq!(harness.transport.update_requests(), 1);
}

#[test]
fn test_metered_run_waits_for_consent() {
    let harness = TestHarness::new(Connectivity::Metered);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(5, 5000));

    assert_eq!(harness.prompt.request_count(), 1);
    for _ in 0..3 {
        assert!(!orchestrator.tick());
    }
    assert_eq!(harness.transport.update_requests(), 0);

    let request = harness.prompt.take_request().unwrap();
    assert_eq!(request.title, "Update Resources");
    request.reply.confirm().unwrap();

    assert_eq!(harness.transport.update_requests(), 1);
    assert_eq!(orchestrator.state(), SessionState::Downloading);
}

#[test]
fn test_metered_without_consent_setting_downloads_directly() {
    let harness = TestHarness::new(Connectivity::Metered);
    let config = UpdateConfig {
        consent_on_metered: false,
        ..Default::default()
    };
    let orchestrator = harness.create_orchestrator(config);

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(2, 100));

    assert_eq!(harness.prompt.request_count(), 0);
    assert_eq!(harness.transport.update_requests(), 1);
}

#[test]
fn test_offline_proceeds_to_download() {
    let harness = TestHarness::new(Connectivity::Offline);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(2, 100));

    assert_eq!(harness.prompt.request_count(), 0);
    assert_eq!(orchestrator.state(), SessionState::Downloading);
}

#[test]
fn test_declined_consent_shuts_down() {
    let harness = TestHarness::new(Connectivity::Metered);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(5, 5000));
    harness
        .prompt
        .take_request()
        .unwrap()
        .reply
        .cancel()
        .unwrap();

    assert_eq!(harness.host.shutdown_count(), 1);
    assert_eq!(orchestrator.state(), SessionState::Cancelled);
    assert!(!orchestrator.tick());
    assert!(harness.host.advances().is_empty());
}

#[test]
fn test_exhausted_failure_still_completes_degraded() {
    let harness = TestHarness::new(Connectivity::Unrestricted);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(2, 2000));

    harness.transport.publish(fixtures::start_event("a.dat"));
    harness.transport.publish(fixtures::failure_event("a.dat", 1, 3));
    harness.transport.publish(fixtures::start_event("a.dat"));
    harness.transport.publish(fixtures::failure_event("a.dat", 3, 3));
    harness
        .transport
        .publish_all(fixtures::successful_download("b.dat", 1000));
    harness.transport.publish(fixtures::all_complete_event());

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.transient_failures, 1);
    assert_eq!(snapshot.failed_resources, vec!["a.dat".to_string()]);
    assert!(snapshot.entries.iter().all(|e| e.name != "a.dat"));

    assert!(orchestrator.tick());
    let report = &harness.host.advances()[0];
    assert!(report.is_degraded());
    assert_eq!(report.success_count, 1);
}

#[test]
fn test_out_of_order_events_are_ignored() {
    let harness = TestHarness::new(Connectivity::Unrestricted);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();

    // Item events before the check result
    harness
        .transport
        .publish_all(fixtures::successful_download("early.dat", 100));
    harness.transport.publish(fixtures::all_complete_event());

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.state, SessionState::Checking);
    assert_eq!(snapshot.success_count, 0);
    assert!(snapshot.entries.is_empty());
    assert!(!snapshot.all_complete);

    harness
        .transport
        .publish(fixtures::check_complete_event(1, 100));
    // Progress and success for a resource that never started
    harness
        .transport
        .publish(fixtures::changed_event("ghost.dat", 50));
    harness
        .transport
        .publish(fixtures::success_event("ghost.dat", 100));

    assert_eq!(orchestrator.snapshot().success_count, 0);
    assert!(!orchestrator.tick());
}

#[test]
fn test_repeated_success_counts_each_time() {
    let harness = TestHarness::new(Connectivity::Unrestricted);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(2, 200));
    harness
        .transport
        .publish_all(fixtures::successful_download("a.dat", 100));
    harness
        .transport
        .publish(fixtures::success_event("a.dat", 100));
    assert_eq!(orchestrator.snapshot().success_count, 2);

    harness
        .transport
        .publish(fixtures::success_event("a.dat", 100));
    assert_eq!(orchestrator.snapshot().success_count, 2);
}

#[test]
fn test_reentry_starts_clean_session() {
    let harness = TestHarness::new(Connectivity::Unrestricted);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(0, 0));
    assert!(orchestrator.tick());

    orchestrator.leave(false);
    orchestrator.enter();

    assert!(!orchestrator.has_advanced());
    assert_eq!(harness.transport.subscriber_count(), 1);
    assert_eq!(orchestrator.state(), SessionState::Checking);

    harness
        .transport
        .publish(fixtures::check_complete_event(0, 0));
    assert!(orchestrator.tick());
    assert_eq!(harness.host.advances().len(), 2);
    assert_ne!(
        harness.host.advances()[0].session_id,
        harness.host.advances()[1].session_id
    );
}

#[test]
fn test_consent_reply_after_leave_is_ignored() {
    let harness = TestHarness::new(Connectivity::Metered);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(5, 5000));
    let request = harness.prompt.take_request().unwrap();
    orchestrator.leave(true);

    let result = request.reply.confirm();
    assert!(matches!(result, Err(UpdateError::NotEntered)));
    assert_eq!(harness.transport.update_requests(), 0);
}

#[test]
fn test_concurrent_delivery_from_threads() {
    let harness = TestHarness::new(Connectivity::Unrestricted);
    let orchestrator = harness.create_orchestrator(UpdateConfig::default());

    orchestrator.enter();
    harness
        .transport
        .publish(fixtures::check_complete_event(8, 8000));

    let workers: Vec<_> = (0..8)
        .map(|i| {
            let transport = harness.transport.clone();
            thread::spawn(move || {
                transport.publish_all(fixtures::successful_download(&format!("{}.dat", i), 1000));
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let snapshot = orchestrator.snapshot();
    assert_eq!(snapshot.success_count, 8);
    assert_eq!(snapshot.transferred_bytes, 8000);
    assert!((snapshot.progress - 1.0).abs() < f64::EPSILON);

    harness.transport.publish(fixtures::all_complete_event());
    assert!(orchestrator.tick());
}

#[test]
fn test_session_can_be_driven_directly() {
    let gate = updraft_core::update::NetworkPolicyGate::new(
        Arc::new(SharedConnectivity::default()),
        true,
    );
    let mut session = UpdateSession::new(gate);

    assert!(session.begin().is_some());
    assert!(session.on_check_complete(&fixtures::check_complete(0, 0)).is_none());
    assert!(session.is_complete());
    assert_eq!(session.gate_evaluations(), 0);
}

#[tokio::test]
async fn test_tick_loop_drives_advance() {
    let harness = TestHarness::new(Connectivity::Unrestricted);
    let config = UpdateConfig {
        tick_interval_ms: 10,
        ..Default::default()
    };
    let orchestrator = harness.create_orchestrator(config);

    orchestrator.enter();
    let handle = orchestrator.spawn_tick_loop();

    harness
        .transport
        .publish(fixtures::check_complete_event(1, 100));
    harness
        .transport
        .publish_all(fixtures::successful_download("a.dat", 100));
    harness.transport.publish(fixtures::all_complete_event());

    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("tick loop did not finish")
        .unwrap();

    assert!(orchestrator.has_advanced());
    assert_eq!(harness.host.advances().len(), 1);
}
