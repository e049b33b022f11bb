use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::time::{sleep, Duration};

use super::*;

/// Fake platform adapter that records registration requests
struct FakePlatformAdapter {
    requests: Mutex<Vec<Vec<NotificationCapability>>>,
    request_count: AtomicU32,
}

impl FakePlatformAdapter {
    fn new() -> Self {
        Self {
            requests: Mutex::new(Vec::new()),
            request_count: AtomicU32::new(0),
        }
    }

    fn request_count(&self) -> u32 {
        self.request_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PlatformPushAdapter for FakePlatformAdapter {
    async fn register_for_remote_notifications(
        &self,
        capabilities: Vec<NotificationCapability>,
    ) {
        self.requests.lock().unwrap().push(capabilities);
        self.request_count.fetch_add(1, Ordering::SeqCst);
    }
}

/// Fake backend that records register/unregister requests
struct FakeBackend {
    register_requests: Mutex<Vec<BackendRegistrationRequest>>,
    unregister_requests: Mutex<Vec<BackendUnregistrationRequest>>,
}

impl FakeBackend {
    fn new() -> Self {
        Self {
            register_requests: Mutex::new(Vec::new()),
            unregister_requests: Mutex::new(Vec::new()),
        }
    }

    fn register_count(&self) -> usize {
        self.register_requests.lock().unwrap().len()
    }

    fn unregister_count(&self) -> usize {
        self.unregister_requests.lock().unwrap().len()
    }
}

#[async_trait]
impl BackendRegistrationApi for FakeBackend {
    async fn register_device(&self, request: BackendRegistrationRequest) {
        self.register_requests.lock().unwrap().push(request);
    }

    async fn unregister_device(&self, request: BackendUnregistrationRequest) {
        self.unregister_requests.lock().unwrap().push(request);
    }
}

/// Listener that records every outcome it receives
struct RecordingListener {
    outcomes: Mutex<Vec<RegistrationOutcome>>,
}

impl RecordingListener {
    fn new() -> Self {
        Self {
            outcomes: Mutex::new(Vec::new()),
        }
    }

    fn outcome_count(&self) -> usize {
        self.outcomes.lock().unwrap().len()
    }

    fn last_outcome(&self) -> Option<RegistrationOutcome> {
        self.outcomes.lock().unwrap().last().cloned()
    }
}

impl RegistrationListener for RecordingListener {
    fn registration_did_complete(&self, outcome: RegistrationOutcome) {
        self.outcomes.lock().unwrap().push(outcome);
    }
}

fn parameters(previous_device_token: Option<&str>) -> RegistrationParameters {
    RegistrationParameters {
        service_url: "https://push.test.local".to_string(),
        platform_uuid: "5d3e2f9c-1f6a-4f7e-9a43-5f2b6f1d8f00".to_string(),
        platform_secret: "secret".to_string(),
        device_alias: "test-device".to_string(),
        capabilities: vec![
            NotificationCapability::Alert,
            NotificationCapability::Badge,
        ],
        tags: vec!["news".to_string()],
        custom_attributes: vec![CustomAttribute {
            key: "cohort".to_string(),
            value: "a".to_string(),
        }],
        previous_device_token: previous_device_token.map(str::to_string),
        unregister_failure_policy: UnregisterFailurePolicy::Continue,
    }
}

struct Harness {
    adapter: Arc<FakePlatformAdapter>,
    backend: Arc<FakeBackend>,
    listener: Arc<RecordingListener>,
    engine: Arc<RegistrationEngine>,
}

fn harness() -> Harness {
    let adapter = Arc::new(FakePlatformAdapter::new());
    let backend = Arc::new(FakeBackend::new());
    let listener = Arc::new(RecordingListener::new());
    let engine = RegistrationEngine::new(adapter.clone(), backend.clone());
    Harness {
        adapter,
        backend,
        listener,
        engine,
    }
}

#[tokio::test]
async fn test_success_without_prior_token() {
    let h = harness();

    h.engine
        .start_registration(parameters(None), h.listener.clone())
        .await
        .unwrap();

    // The platform request carries the requested capability set.
    assert_eq!(h.adapter.request_count(), 1);
    assert_eq!(
        h.adapter.requests.lock().unwrap()[0],
        vec![NotificationCapability::Alert, NotificationCapability::Badge]
    );
    assert_eq!(h.listener.outcome_count(), 0);

    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK1".to_string(),
        })
        .await
        .unwrap();

    // No prior token: unregistration is skipped entirely.
    assert_eq!(h.backend.unregister_count(), 0);
    assert_eq!(h.backend.register_count(), 1);
    let request = h.backend.register_requests.lock().unwrap()[0].clone();
    assert_eq!(request.device_token, "TK1");
    assert_eq!(request.service_url, "https://push.test.local");
    assert_eq!(request.device_alias, "test-device");
    assert_eq!(request.tags, vec!["news".to_string()]);

    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();

    assert_eq!(h.listener.outcome_count(), 1);
    assert_eq!(
        h.listener.last_outcome(),
        Some(RegistrationOutcome::Succeeded {
            device_token: "TK1".to_string()
        })
    );

    let progress = h.engine.progress();
    assert!(progress.did_start_registration);
    assert!(progress.did_finish_platform_registration);
    assert!(!progress.did_start_backend_unregistration);
    assert!(!progress.did_finish_backend_unregistration);
    assert!(progress.did_finish_backend_registration);
    assert!(progress.did_registration_succeed);
    assert!(!progress.did_registration_fail);
}

#[tokio::test]
async fn test_platform_failure_is_terminal_without_backend_calls() {
    let h = harness();

    h.engine
        .start_registration(parameters(None), h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Failed {
            message: "denied".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.listener.outcome_count(), 1);
    assert_eq!(
        h.listener.last_outcome(),
        Some(RegistrationOutcome::Failed {
            stage: RegistrationStage::Platform,
            message: "denied".to_string()
        })
    );
    assert_eq!(h.backend.unregister_count(), 0);
    assert_eq!(h.backend.register_count(), 0);

    let progress = h.engine.progress();
    assert!(!progress.did_start_backend_registration);
    assert!(!progress.did_registration_succeed);
    assert!(progress.did_registration_fail);
}

#[tokio::test]
async fn test_stale_token_is_unregistered_before_registration() {
    let h = harness();

    h.engine
        .start_registration(parameters(Some("OLD")), h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "NEW".to_string(),
        })
        .await
        .unwrap();

    // Unregistration of the stale token is requested first; registration
    // waits for its completion.
    assert_eq!(h.backend.unregister_count(), 1);
    assert_eq!(
        h.backend.unregister_requests.lock().unwrap()[0].device_token,
        "OLD"
    );
    assert_eq!(h.backend.register_count(), 0);

    h.engine
        .backend_unregistration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();
    assert_eq!(h.backend.register_count(), 1);
    assert_eq!(
        h.backend.register_requests.lock().unwrap()[0].device_token,
        "NEW"
    );

    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();

    assert_eq!(
        h.listener.last_outcome(),
        Some(RegistrationOutcome::Succeeded {
            device_token: "NEW".to_string()
        })
    );
    let progress = h.engine.progress();
    assert!(progress.did_start_backend_unregistration);
    assert!(progress.did_finish_backend_unregistration);
}

#[tokio::test]
async fn test_unregistration_failure_is_non_fatal_by_default() {
    let h = harness();

    h.engine
        .start_registration(parameters(Some("OLD")), h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "NEW".to_string(),
        })
        .await
        .unwrap();
    h.engine
        .backend_unregistration_complete(BackendOperationOutcome::Failed {
            message: "410 gone".to_string(),
        })
        .await
        .unwrap();

    // The attempt still proceeds to registration.
    assert_eq!(h.backend.register_count(), 1);
    assert_eq!(h.listener.outcome_count(), 0);

    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();

    assert_eq!(
        h.listener.last_outcome(),
        Some(RegistrationOutcome::Succeeded {
            device_token: "NEW".to_string()
        })
    );
    // The unregistration stage was attempted but never finished successfully.
    let progress = h.engine.progress();
    assert!(progress.did_start_backend_unregistration);
    assert!(!progress.did_finish_backend_unregistration);
    assert!(progress.did_registration_succeed);
}

#[tokio::test]
async fn test_unregistration_failure_aborts_under_strict_policy() {
    let h = harness();
    let mut params = parameters(Some("OLD"));
    params.unregister_failure_policy = UnregisterFailurePolicy::Abort;

    h.engine
        .start_registration(params, h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "NEW".to_string(),
        })
        .await
        .unwrap();
    h.engine
        .backend_unregistration_complete(BackendOperationOutcome::Failed {
            message: "410 gone".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.backend.register_count(), 0);
    assert_eq!(
        h.listener.last_outcome(),
        Some(RegistrationOutcome::Failed {
            stage: RegistrationStage::BackendUnregistration,
            message: "410 gone".to_string()
        })
    );
    assert!(h.engine.progress().did_registration_fail);
}

#[tokio::test]
async fn test_matching_previous_token_skips_unregistration() {
    let h = harness();

    h.engine
        .start_registration(parameters(Some("SAME")), h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "SAME".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.backend.unregister_count(), 0);
    assert_eq!(h.backend.register_count(), 1);
    assert!(!h.engine.progress().did_start_backend_unregistration);
}

#[tokio::test]
async fn test_backend_registration_failure_is_terminal() {
    let h = harness();

    h.engine
        .start_registration(parameters(None), h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK1".to_string(),
        })
        .await
        .unwrap();
    h.engine
        .backend_registration_complete(BackendOperationOutcome::Failed {
            message: "conflict".to_string(),
        })
        .await
        .unwrap();

    assert_eq!(h.listener.outcome_count(), 1);
    assert_eq!(
        h.listener.last_outcome(),
        Some(RegistrationOutcome::Failed {
            stage: RegistrationStage::BackendRegistration,
            message: "conflict".to_string()
        })
    );
    let progress = h.engine.progress();
    assert!(progress.did_registration_fail);
    assert!(!progress.did_registration_succeed);
}

#[tokio::test]
async fn test_duplicate_completion_after_terminal_is_a_noop() {
    let h = harness();

    h.engine
        .start_registration(parameters(None), h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK1".to_string(),
        })
        .await
        .unwrap();
    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();
    assert_eq!(h.listener.outcome_count(), 1);
    let progress_before = h.engine.progress();

    // A duplicate platform completion after termination changes nothing.
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK1".to_string(),
        })
        .await
        .unwrap();
    // So does a duplicate backend completion.
    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();

    assert_eq!(h.listener.outcome_count(), 1);
    assert_eq!(h.backend.register_count(), 1);
    let progress_after = h.engine.progress();
    assert_eq!(
        progress_before.did_registration_succeed,
        progress_after.did_registration_succeed
    );
    assert_eq!(
        progress_before.did_finish_backend_registration,
        progress_after.did_finish_backend_registration
    );
}

#[tokio::test]
async fn test_out_of_sequence_completion_is_a_protocol_violation() {
    let h = harness();

    // Nothing was ever started.
    let result = h
        .engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await;
    assert!(matches!(
        result,
        Err(RegistrationError::ProtocolViolation { .. })
    ));

    let result = h
        .engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK1".to_string(),
        })
        .await;
    assert!(matches!(
        result,
        Err(RegistrationError::ProtocolViolation { .. })
    ));

    // State and listener are untouched.
    assert_eq!(h.listener.outcome_count(), 0);
    assert!(!h.engine.progress().did_start_registration);
}

#[tokio::test]
async fn test_duplicate_platform_completion_mid_flight_is_a_protocol_violation() {
    let h = harness();

    h.engine
        .start_registration(parameters(None), h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK1".to_string(),
        })
        .await
        .unwrap();

    // The attempt is now waiting on the backend; a second platform
    // completion is out of sequence, not a late duplicate.
    let result = h
        .engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK2".to_string(),
        })
        .await;
    assert!(matches!(
        result,
        Err(RegistrationError::ProtocolViolation { .. })
    ));

    // The original attempt is undisturbed and completes normally.
    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();
    assert_eq!(
        h.listener.last_outcome(),
        Some(RegistrationOutcome::Succeeded {
            device_token: "TK1".to_string()
        })
    );
}

#[tokio::test]
async fn test_start_while_in_flight_is_rejected() {
    let h = harness();

    h.engine
        .start_registration(parameters(None), h.listener.clone())
        .await
        .unwrap();

    let second_listener = Arc::new(RecordingListener::new());
    let result = h
        .engine
        .start_registration(parameters(None), second_listener.clone())
        .await;
    assert!(matches!(result, Err(RegistrationError::AttemptInProgress)));
    assert_eq!(h.adapter.request_count(), 1);

    // The first attempt is unaffected.
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK1".to_string(),
        })
        .await
        .unwrap();
    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();
    assert_eq!(h.listener.outcome_count(), 1);
    assert_eq!(second_listener.outcome_count(), 0);
}

#[tokio::test]
async fn test_sequential_attempts_reset_progress() {
    let h = harness();

    h.engine
        .start_registration(parameters(None), h.listener.clone())
        .await
        .unwrap();
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Failed {
            message: "denied".to_string(),
        })
        .await
        .unwrap();
    assert!(h.engine.progress().did_registration_fail);

    // A new attempt is allowed from a terminal state and starts fresh.
    h.engine
        .start_registration(parameters(None), h.listener.clone())
        .await
        .unwrap();
    let progress = h.engine.progress();
    assert!(progress.did_start_registration);
    assert!(!progress.did_registration_fail);
    assert!(!progress.did_finish_platform_registration);

    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK2".to_string(),
        })
        .await
        .unwrap();
    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();

    assert_eq!(h.listener.outcome_count(), 2);
    assert_eq!(
        h.listener.last_outcome(),
        Some(RegistrationOutcome::Succeeded {
            device_token: "TK2".to_string()
        })
    );
}

/// Waits until the fake adapter has seen `count` requests.
async fn wait_for_platform_requests(adapter: &FakePlatformAdapter, count: u32) {
    for _ in 0..100 {
        if adapter.request_count() >= count {
            return;
        }
        sleep(Duration::from_millis(5)).await;
    }
    panic!("platform adapter never received {count} request(s)");
}

#[tokio::test]
async fn test_register_resolves_with_the_token() {
    let h = harness();

    let engine = h.engine.clone();
    let handle =
        tokio::spawn(async move { engine.register(parameters(None)).await });

    wait_for_platform_requests(&h.adapter, 1).await;
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Registered {
            device_token: "TK9".to_string(),
        })
        .await
        .unwrap();
    h.engine
        .backend_registration_complete(BackendOperationOutcome::Completed)
        .await
        .unwrap();

    let result = handle.await.unwrap();
    assert_eq!(result.unwrap(), "TK9");
}

#[tokio::test]
async fn test_register_resolves_with_the_typed_error() {
    let h = harness();

    let engine = h.engine.clone();
    let handle =
        tokio::spawn(async move { engine.register(parameters(None)).await });

    wait_for_platform_requests(&h.adapter, 1).await;
    h.engine
        .platform_registration_complete(PlatformRegistrationOutcome::Failed {
            message: "denied".to_string(),
        })
        .await
        .unwrap();

    let result = handle.await.unwrap();
    match result {
        Err(RegistrationError::PlatformRegistrationFailed { message }) => {
            assert_eq!(message, "denied");
        }
        other => panic!("expected PlatformRegistrationFailed, got {other:?}"),
    }
}
