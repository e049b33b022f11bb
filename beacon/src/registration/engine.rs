use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use tokio::sync::oneshot;

use crate::registration::adapter::{PlatformPushAdapter, PlatformRegistrationOutcome};
use crate::registration::backend::{
    BackendOperationOutcome, BackendRegistrationApi, BackendRegistrationRequest,
    BackendUnregistrationRequest,
};
use crate::registration::error::RegistrationError;
use crate::registration::listener::{
    RegistrationListener, RegistrationOutcome, RegistrationStage,
};
use crate::registration::parameters::{
    RegistrationParameters, UnregisterFailurePolicy,
};
use crate::registration::state::{
    ProgressFlags, RegistrationPhase, RegistrationProgress,
};

/// Mutable state of the engine's current attempt. Guarded by the engine's
/// single lock; this is the only shared mutable state in the module.
struct Attempt {
    phase: RegistrationPhase,
    flags: ProgressFlags,
    parameters: Option<RegistrationParameters>,
    listener: Option<Arc<dyn RegistrationListener>>,
}

impl Attempt {
    const fn idle() -> Self {
        Self {
            phase: RegistrationPhase::Idle,
            flags: ProgressFlags {
                did_start_registration: false,
                did_start_platform_registration: false,
                did_finish_platform_registration: false,
                did_start_backend_unregistration: false,
                did_finish_backend_unregistration: false,
                did_start_backend_registration: false,
                did_finish_backend_registration: false,
            },
            parameters: None,
            listener: None,
        }
    }
}

/// A dispatch decided while holding the attempt lock and performed after it
/// is released, so collaborator and listener code never runs under the lock.
enum Followup {
    None,
    RequestUnregistration(BackendUnregistrationRequest),
    RequestRegistration(BackendRegistrationRequest),
    Notify(Arc<dyn RegistrationListener>, RegistrationOutcome),
}

/// Coordinates one push-registration attempt at a time.
///
/// The engine sequences platform registration, conditional backend
/// unregistration of a stale token, and backend registration, advancing only
/// on the completion notifications its collaborators deliver. It performs no
/// blocking work and owns no background tasks: every method locks the attempt
/// state, decides the transition and the next dispatch, releases the lock,
/// then performs the dispatch.
///
/// ## Platform usage (Swift/Kotlin)
///
/// ```swift
/// let engine = RegistrationEngine(platform: apnsAdapter, backend: pushApi)
/// try await engine.startRegistration(parameters: params, listener: listener)
/// // apnsAdapter later calls:
/// try await engine.platformRegistrationComplete(
///     outcome: .registered(deviceToken: token))
/// ```
///
/// ```kotlin
/// val engine = RegistrationEngine(fcmAdapter, pushApi)
/// engine.startRegistration(params, listener)
/// engine.platformRegistrationComplete(
///     PlatformRegistrationOutcome.Registered(token))
/// ```
///
/// The listener fires exactly once per started attempt. Completion
/// notifications arriving after the attempt terminated are ignored; ones
/// arriving out of sequence are rejected with
/// [`RegistrationError::ProtocolViolation`] and mutate nothing.
#[derive(uniffi::Object)]
pub struct RegistrationEngine {
    platform: Arc<dyn PlatformPushAdapter>,
    backend: Arc<dyn BackendRegistrationApi>,
    attempt: Mutex<Attempt>,
}

#[uniffi::export(async_runtime = "tokio")]
impl RegistrationEngine {
    /// Creates an engine bound to its platform and backend collaborators.
    #[uniffi::constructor]
    pub fn new(
        platform: Arc<dyn PlatformPushAdapter>,
        backend: Arc<dyn BackendRegistrationApi>,
    ) -> Arc<Self> {
        Arc::new(Self {
            platform,
            backend,
            attempt: Mutex::new(Attempt::idle()),
        })
    }

    /// Starts a registration attempt.
    ///
    /// Resets the progress state, requests platform registration for the
    /// capability set named in `parameters`, and returns. The terminal
    /// outcome is delivered through `listener`, never synchronously.
    ///
    /// One attempt is in flight per engine at any time; a start during a
    /// running attempt is rejected and leaves the running attempt untouched.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::AttemptInProgress` if an attempt is
    /// already in flight.
    pub async fn start_registration(
        &self,
        parameters: RegistrationParameters,
        listener: Arc<dyn RegistrationListener>,
    ) -> Result<(), RegistrationError> {
        let capabilities = {
            let mut attempt = self.lock_attempt();
            if !matches!(attempt.phase, RegistrationPhase::Idle)
                && !attempt.phase.is_terminal()
            {
                return Err(RegistrationError::AttemptInProgress);
            }

            let capabilities = parameters.capabilities.clone();
            *attempt = Attempt {
                phase: RegistrationPhase::PlatformRegistering,
                flags: ProgressFlags {
                    did_start_registration: true,
                    did_start_platform_registration: true,
                    ..ProgressFlags::default()
                },
                parameters: Some(parameters),
                listener: Some(listener),
            };
            capabilities
        };

        log::info!(
            "registration.started capabilities={} timestamp={}",
            capabilities.len(),
            Utc::now().to_rfc3339()
        );

        self.platform
            .register_for_remote_notifications(capabilities)
            .await;
        Ok(())
    }

    /// Reports the outcome of the platform registration request.
    ///
    /// Called by the [`PlatformPushAdapter`] exactly once per attempt. On a
    /// token, the engine proceeds to backend unregistration (when a differing
    /// previous token exists) or straight to backend registration. On a
    /// platform failure the attempt terminates; no backend calls are made.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::ProtocolViolation` if no platform
    /// registration is awaited and the attempt is not terminal. Late
    /// duplicates after termination are no-ops.
    pub async fn platform_registration_complete(
        &self,
        outcome: PlatformRegistrationOutcome,
    ) -> Result<(), RegistrationError> {
        let followup = {
            let mut attempt = self.lock_attempt();
            if attempt.phase.is_terminal() {
                Self::log_late_completion("platform_registration_complete");
                return Ok(());
            }
            if !matches!(attempt.phase, RegistrationPhase::PlatformRegistering) {
                return Err(Self::protocol_violation(
                    "platform_registration_complete",
                    &attempt.phase,
                ));
            }

            match outcome {
                PlatformRegistrationOutcome::Registered { device_token } => {
                    attempt.flags.did_finish_platform_registration = true;
                    let Some(parameters) = attempt.parameters.clone() else {
                        return Err(Self::protocol_violation(
                            "platform_registration_complete",
                            &attempt.phase,
                        ));
                    };

                    if parameters.needs_backend_unregistration(&device_token) {
                        let stale_token = parameters
                            .previous_device_token
                            .clone()
                            .unwrap_or_default();
                        attempt.flags.did_start_backend_unregistration = true;
                        attempt.phase =
                            RegistrationPhase::BackendUnregistering { device_token };
                        Followup::RequestUnregistration(BackendUnregistrationRequest {
                            service_url: parameters.resolved_service_url(),
                            platform_uuid: parameters.platform_uuid.clone(),
                            platform_secret: parameters.platform_secret.clone(),
                            device_token: stale_token,
                        })
                    } else {
                        attempt.flags.did_start_backend_registration = true;
                        attempt.phase = RegistrationPhase::BackendRegistering {
                            device_token: device_token.clone(),
                        };
                        Followup::RequestRegistration(Self::registration_request(
                            &parameters,
                            device_token,
                        ))
                    }
                }
                PlatformRegistrationOutcome::Failed { message } => Self::fail_attempt(
                    &mut attempt,
                    RegistrationStage::Platform,
                    message,
                ),
            }
        };

        self.perform(followup).await;
        Ok(())
    }

    /// Reports the outcome of the backend unregistration request.
    ///
    /// Called by the [`BackendRegistrationApi`] at most once per attempt, and
    /// only when the engine requested an unregistration. A failure here is
    /// non-fatal under the default [`UnregisterFailurePolicy::Continue`]: it
    /// is logged and the attempt proceeds to backend registration, since a
    /// fresh valid registration is still achievable. Under
    /// [`UnregisterFailurePolicy::Abort`] the attempt terminates instead.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::ProtocolViolation` if no unregistration is
    /// awaited and the attempt is not terminal. Late duplicates after
    /// termination are no-ops.
    pub async fn backend_unregistration_complete(
        &self,
        outcome: BackendOperationOutcome,
    ) -> Result<(), RegistrationError> {
        let followup = {
            let mut attempt = self.lock_attempt();
            if attempt.phase.is_terminal() {
                Self::log_late_completion("backend_unregistration_complete");
                return Ok(());
            }
            let RegistrationPhase::BackendUnregistering { device_token } =
                attempt.phase.clone()
            else {
                return Err(Self::protocol_violation(
                    "backend_unregistration_complete",
                    &attempt.phase,
                ));
            };
            let Some(parameters) = attempt.parameters.clone() else {
                return Err(Self::protocol_violation(
                    "backend_unregistration_complete",
                    &attempt.phase,
                ));
            };

            match outcome {
                BackendOperationOutcome::Completed => {
                    attempt.flags.did_finish_backend_unregistration = true;
                    Self::proceed_to_backend_registration(
                        &mut attempt,
                        &parameters,
                        device_token,
                    )
                }
                BackendOperationOutcome::Failed { message } => {
                    match parameters.unregister_failure_policy {
                        UnregisterFailurePolicy::Continue => {
                            log::warn!(
                                "registration.backend_unregistration_failed policy=continue error={message} timestamp={}",
                                Utc::now().to_rfc3339()
                            );
                            Self::proceed_to_backend_registration(
                                &mut attempt,
                                &parameters,
                                device_token,
                            )
                        }
                        UnregisterFailurePolicy::Abort => Self::fail_attempt(
                            &mut attempt,
                            RegistrationStage::BackendUnregistration,
                            message,
                        ),
                    }
                }
            }
        };

        self.perform(followup).await;
        Ok(())
    }

    /// Reports the outcome of the backend registration request.
    ///
    /// Called by the [`BackendRegistrationApi`] at most once per attempt.
    /// Terminates the attempt either way and notifies the listener.
    ///
    /// # Errors
    ///
    /// Returns `RegistrationError::ProtocolViolation` if no backend
    /// registration is awaited and the attempt is not terminal. Late
    /// duplicates after termination are no-ops.
    pub async fn backend_registration_complete(
        &self,
        outcome: BackendOperationOutcome,
    ) -> Result<(), RegistrationError> {
        let followup = {
            let mut attempt = self.lock_attempt();
            if attempt.phase.is_terminal() {
                Self::log_late_completion("backend_registration_complete");
                return Ok(());
            }
            let RegistrationPhase::BackendRegistering { device_token } =
                attempt.phase.clone()
            else {
                return Err(Self::protocol_violation(
                    "backend_registration_complete",
                    &attempt.phase,
                ));
            };

            match outcome {
                BackendOperationOutcome::Completed => {
                    attempt.flags.did_finish_backend_registration = true;
                    attempt.phase = RegistrationPhase::Succeeded {
                        device_token: device_token.clone(),
                    };
                    attempt.listener.take().map_or(Followup::None, |listener| {
                        Followup::Notify(
                            listener,
                            RegistrationOutcome::Succeeded { device_token },
                        )
                    })
                }
                BackendOperationOutcome::Failed { message } => Self::fail_attempt(
                    &mut attempt,
                    RegistrationStage::BackendRegistration,
                    message,
                ),
            }
        };

        self.perform(followup).await;
        Ok(())
    }

    /// Observable snapshot of the current attempt's progress.
    #[must_use]
    pub fn progress(&self) -> RegistrationProgress {
        let attempt = self.lock_attempt();
        attempt.flags.snapshot(&attempt.phase)
    }

    /// Runs one attempt to completion and returns its outcome.
    ///
    /// Awaitable convenience over `start_registration`: adapts the listener
    /// to a oneshot channel and resolves when the attempt terminates.
    ///
    /// # Errors
    ///
    /// `RegistrationError::AttemptInProgress` if an attempt is already in
    /// flight; `RegistrationError::PlatformRegistrationFailed`,
    /// `BackendUnregistrationFailed` or `BackendRegistrationFailed` with the
    /// collaborator-reported message when the attempt fails.
    pub async fn register(
        &self,
        parameters: RegistrationParameters,
    ) -> Result<String, RegistrationError> {
        let (sender, receiver) = oneshot::channel();
        let listener = Arc::new(ChannelListener {
            sender: Mutex::new(Some(sender)),
        });
        self.start_registration(parameters, listener).await?;

        match receiver.await {
            Ok(RegistrationOutcome::Succeeded { device_token }) => Ok(device_token),
            Ok(RegistrationOutcome::Failed { stage, message }) => {
                Err(Self::stage_error(stage, message))
            }
            Err(_) => Err(RegistrationError::Generic {
                message: "registration outcome channel closed".to_string(),
            }),
        }
    }
}

impl RegistrationEngine {
    fn lock_attempt(&self) -> MutexGuard<'_, Attempt> {
        self.attempt.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Terminal failure transition. Takes the listener so it can never fire
    /// a second time.
    fn fail_attempt(
        attempt: &mut Attempt,
        stage: RegistrationStage,
        message: String,
    ) -> Followup {
        attempt.phase = RegistrationPhase::Failed {
            stage,
            message: message.clone(),
        };
        attempt.listener.take().map_or(Followup::None, |listener| {
            Followup::Notify(listener, RegistrationOutcome::Failed { stage, message })
        })
    }

    fn proceed_to_backend_registration(
        attempt: &mut Attempt,
        parameters: &RegistrationParameters,
        device_token: String,
    ) -> Followup {
        attempt.flags.did_start_backend_registration = true;
        attempt.phase = RegistrationPhase::BackendRegistering {
            device_token: device_token.clone(),
        };
        Followup::RequestRegistration(Self::registration_request(
            parameters,
            device_token,
        ))
    }

    fn registration_request(
        parameters: &RegistrationParameters,
        device_token: String,
    ) -> BackendRegistrationRequest {
        BackendRegistrationRequest {
            service_url: parameters.resolved_service_url(),
            platform_uuid: parameters.platform_uuid.clone(),
            platform_secret: parameters.platform_secret.clone(),
            device_token,
            device_alias: parameters.device_alias.clone(),
            tags: parameters.tags.clone(),
            custom_attributes: parameters.custom_attributes.clone(),
        }
    }

    /// Performs a dispatch decided under the lock. Collaborator and listener
    /// code runs here, after the lock is released, so a listener may start
    /// the next attempt from inside its callback.
    async fn perform(&self, followup: Followup) {
        match followup {
            Followup::None => {}
            Followup::RequestUnregistration(request) => {
                log::info!(
                    "registration.backend_unregistration_requested timestamp={}",
                    Utc::now().to_rfc3339()
                );
                self.backend.unregister_device(request).await;
            }
            Followup::RequestRegistration(request) => {
                log::info!(
                    "registration.backend_registration_requested timestamp={}",
                    Utc::now().to_rfc3339()
                );
                self.backend.register_device(request).await;
            }
            Followup::Notify(listener, outcome) => {
                match &outcome {
                    RegistrationOutcome::Succeeded { device_token } => {
                        log::info!(
                            "registration.succeeded device_token_len={} timestamp={}",
                            device_token.len(),
                            Utc::now().to_rfc3339()
                        );
                    }
                    RegistrationOutcome::Failed { stage, message } => {
                        log::warn!(
                            "registration.failed stage={} error={message} timestamp={}",
                            stage.as_str(),
                            Utc::now().to_rfc3339()
                        );
                    }
                }
                listener.registration_did_complete(outcome);
            }
        }
    }

    fn protocol_violation(
        operation: &str,
        phase: &RegistrationPhase,
    ) -> RegistrationError {
        log::error!(
            "registration.protocol_violation operation={operation} phase={} timestamp={}",
            phase.name(),
            Utc::now().to_rfc3339()
        );
        RegistrationError::ProtocolViolation {
            message: format!("{operation} received in phase {}", phase.name()),
        }
    }

    fn log_late_completion(operation: &str) {
        log::debug!(
            "registration.late_completion operation={operation} timestamp={}",
            Utc::now().to_rfc3339()
        );
    }

    fn stage_error(stage: RegistrationStage, message: String) -> RegistrationError {
        match stage {
            RegistrationStage::Platform => {
                RegistrationError::PlatformRegistrationFailed { message }
            }
            RegistrationStage::BackendUnregistration => {
                RegistrationError::BackendUnregistrationFailed { message }
            }
            RegistrationStage::BackendRegistration => {
                RegistrationError::BackendRegistrationFailed { message }
            }
        }
    }
}

/// Adapts the listener callback to a oneshot channel for [`RegistrationEngine::register`].
struct ChannelListener {
    sender: Mutex<Option<oneshot::Sender<RegistrationOutcome>>>,
}

impl RegistrationListener for ChannelListener {
    fn registration_did_complete(&self, outcome: RegistrationOutcome) {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(sender) = sender {
            // The receiver is gone only if the register() future was dropped.
            let _ = sender.send(outcome);
        }
    }
}
