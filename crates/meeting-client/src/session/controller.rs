//! Call session lifecycle controller.
//!
//! Drives one participant through authenticate, connect, probe, create,
//! join and feature activation, then owns the joined call until it is left
//! locally, ended remotely, or the controller is dropped.
//!
//! # Guarantees
//!
//! - `start` runs at most once; later calls fail with `InvalidTransition`
//!   and make no remote calls.
//! - Cleanup (feature deactivation, then leave) runs at most once, whichever
//!   trigger wins. Exactly one caller moves `Joined -> Ending` under the
//!   state lock; everyone else observes `Ending`/`Ended`.
//! - A leave during `start` is recorded and honoured at the next step
//!   boundary. Before the join returns this means no further protocol calls
//!   and a `Failed` session; after it returns the joined call is cleaned up
//!   first.
//! - Dropping the `start` future before it settles fails the session and
//!   leaves any joined call in a background task.
//!
//! The lock is never held across a remote call.

use super::state::{
    EndReason, HandleStatus, LeaveOutcome, SessionHandle, SessionSnapshot, SessionStatus,
};
use crate::assistant::{notify_in_background, AssistantActivation, HttpAssistantNotifier};
use crate::config::{ClientConfig, SessionSettings};
use crate::connection::{ConnectionManager, TransportConnector};
use crate::devices::{CapabilityProber, MediaDevices};
use crate::errors::ClientError;
use crate::observability::metrics;
use crate::remote::{
    CallEvent, CallRef, CallService, CallSettings, CreateCallRequest, Feature, FeatureOptions,
    JoinOptions, JoinedCall, LocalMedia,
};
use crate::token::{HttpTokenProvider, TokenProvider};
use common::types::{CallId, Identity};
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::{watch, Mutex};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};

/// Collaborators shared by every session of one client.
#[derive(Clone)]
pub struct SessionServices {
    pub tokens: Arc<dyn TokenProvider>,
    pub connections: Arc<ConnectionManager>,
    pub prober: CapabilityProber,
    pub assistant: Option<Arc<dyn AssistantActivation>>,
}

impl SessionServices {
    /// Wire the HTTP token provider, a fresh connection manager and, when an
    /// endpoint is configured, the HTTP assistant notifier.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Config` if an HTTP client cannot be built.
    pub fn from_config(
        config: &ClientConfig,
        connector: Arc<dyn TransportConnector>,
        devices: Arc<dyn MediaDevices>,
    ) -> Result<Self, ClientError> {
        let tokens = HttpTokenProvider::new(config.token_endpoint.clone(), config.http_timeout)?;

        let assistant = match &config.assistant_endpoint {
            Some(endpoint) => Some(Arc::new(HttpAssistantNotifier::new(
                endpoint,
                config.http_timeout,
            )?) as Arc<dyn AssistantActivation>),
            None => None,
        };

        Ok(Self {
            tokens: Arc::new(tokens),
            connections: Arc::new(ConnectionManager::new(config.api_key.clone(), connector)),
            prober: CapabilityProber::new(devices),
            assistant,
        })
    }
}

/// A joined call and everything needed to tear it down.
struct ActiveCall {
    calls: Arc<dyn CallService>,
    joined: JoinedCall,
    features: BTreeSet<Feature>,
    subscription: Option<CancellationToken>,
}

struct Machine {
    status: SessionStatus,
    /// First end request seen while starting.
    end_requested: Option<EndReason>,
    active: Option<ActiveCall>,
}

/// Result of an end request, before any waiting.
enum EndStep {
    NotStarted,
    CleanedUp,
    Requested,
    InProgress,
    Finished,
}

struct Inner {
    settings: SessionSettings,
    services: SessionServices,
    machine: Mutex<Machine>,
    state: watch::Sender<SessionSnapshot>,
}

/// Lifecycle controller for one participant in one call.
pub struct SessionController {
    inner: Arc<Inner>,
}

impl SessionController {
    #[must_use]
    pub fn new(settings: SessionSettings, services: SessionServices) -> Self {
        let (state, _) = watch::channel(SessionSnapshot::default());

        Self {
            inner: Arc::new(Inner {
                settings,
                services,
                machine: Mutex::new(Machine {
                    status: SessionStatus::Idle,
                    end_requested: None,
                    active: None,
                }),
                state,
            }),
        }
    }

    /// Join `call_id` as `identity`.
    ///
    /// # Errors
    ///
    /// - `InvalidTransition` if `start` was already called (no state change)
    /// - `TokenExchange`/`MissingToken`, `Connection`, `CallCreate`,
    ///   `CallJoin` for fatal step failures (session is `Failed`)
    /// - `LeftBeforeJoin` if `leave` was requested first, `EndedBeforeJoin`
    ///   if the call ended remotely first (session is `Failed`)
    ///
    /// Dropping the returned future before it completes fails the session
    /// with `StartCancelled`.
    pub async fn start(
        &self,
        call_id: CallId,
        identity: Identity,
    ) -> Result<SessionHandle, ClientError> {
        self.inner.start(call_id, identity).await
    }

    /// Leave the call. Idempotent; safe before `start` and during it.
    pub async fn leave(&self) -> LeaveOutcome {
        match self.inner.end(EndReason::LocalLeave).await {
            EndStep::NotStarted => LeaveOutcome::NotStarted,
            EndStep::CleanedUp => LeaveOutcome::Left,
            EndStep::Finished => LeaveOutcome::AlreadyEnded,
            EndStep::InProgress => {
                self.wait_until_terminal().await;
                LeaveOutcome::AlreadyEnded
            }
            EndStep::Requested => match self.wait_until_terminal().await.status {
                SessionStatus::Failed => LeaveOutcome::AbortedStart,
                _ => LeaveOutcome::AlreadyEnded,
            },
        }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.state.borrow().status
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn handle(&self) -> Option<SessionHandle> {
        self.inner.state.borrow().handle()
    }

    /// Observe state changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    /// Wait until the session is `Ended` or `Failed`.
    pub async fn wait_until_terminal(&self) -> SessionSnapshot {
        let mut rx = self.inner.state.subscribe();
        let terminal = rx
            .wait_for(|s| s.status.is_terminal())
            .await
            .map(|snapshot| (*snapshot).clone());
        // Sender lives in `inner`, which we hold
        terminal.unwrap_or_else(|_| self.snapshot())
    }
}

impl Drop for SessionController {
    fn drop(&mut self) {
        if self.status() != SessionStatus::Joined {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let inner = Arc::clone(&self.inner);
                runtime.spawn(async move {
                    inner.end(EndReason::Teardown).await;
                });
            }
            Err(_) => warn!(
                target: "meeting_client.session",
                "Controller dropped outside a runtime while joined, call not left"
            ),
        }
    }
}

impl Inner {
    #[instrument(
        skip_all,
        name = "meeting_client.session.start",
        fields(call_id = %call_id, user_id = %identity.id)
    )]
    async fn start(
        self: &Arc<Self>,
        call_id: CallId,
        identity: Identity,
    ) -> Result<SessionHandle, ClientError> {
        {
            let mut machine = self.machine.lock().await;
            machine.status = machine
                .status
                .transition(SessionStatus::Authenticating)
                .inspect_err(|e| {
                    warn!(target: "meeting_client.session", error = %e, "Start rejected");
                })?;
            self.state.send_modify(|s| {
                s.status = SessionStatus::Authenticating;
                s.call_id = Some(call_id.clone());
            });
        }

        info!(target: "meeting_client.session", "Starting session");
        let started = Instant::now();
        let guard = StartGuard {
            inner: Arc::clone(self),
            armed: true,
        };

        let result = match self.run(&call_id, &identity).await {
            Ok(handle) => {
                metrics::record_session_outcome("joined");
                metrics::record_join_duration(started.elapsed());
                info!(
                    target: "meeting_client.session",
                    features = ?handle.features_active,
                    "Session joined"
                );
                Ok(handle)
            }
            Err(e) => {
                self.fail(&e, EndReason::StartAborted).await;
                Err(e)
            }
        };
        guard.disarm();
        result
    }

    async fn run(
        self: &Arc<Self>,
        call_id: &CallId,
        identity: &Identity,
    ) -> Result<SessionHandle, ClientError> {
        let credential = self.services.tokens.fetch_token(&identity.id).await?;

        self.advance(SessionStatus::Connecting).await?;
        let pair = self
            .services
            .connections
            .connect(identity, credential)
            .await?;
        let calls = pair.video().calls();

        self.advance(SessionStatus::Probing).await?;
        let capabilities = self.services.prober.probe().await;
        if let Some(warning) = &capabilities.warning {
            info!(target: "meeting_client.session", warning = %warning, "Joining with degraded devices");
        }
        self.state
            .send_modify(|s| s.capabilities = Some(capabilities.clone()));

        self.advance(SessionStatus::Creating).await?;
        let call = CallRef::new(self.settings.call_type.clone(), call_id.clone());
        let settings = CallSettings::new(
            &capabilities,
            &self.settings.features,
            &self.settings.language,
        );
        let request = CreateCallRequest::for_creator(&identity.id, settings);
        calls
            .get_or_create_call(&call, &request)
            .await
            .map_err(ClientError::CallCreate)?;

        self.advance(SessionStatus::Joining).await?;
        let joined = calls
            .join(&call, JoinOptions { create: true })
            .await
            .map_err(ClientError::CallJoin)?;
        debug!(target: "meeting_client.session", session_id = %joined.session_id, "Join accepted");

        // Joined remotely: every exit path from here must leave the call
        self.machine.lock().await.active = Some(ActiveCall {
            calls: Arc::clone(&calls),
            joined: joined.clone(),
            features: BTreeSet::new(),
            subscription: None,
        });

        self.advance(SessionStatus::ActivatingFeatures).await?;
        self.activate_features(calls.as_ref(), &joined).await;

        let media = LocalMedia {
            camera: capabilities.has_camera,
            microphone: capabilities.has_microphone,
        };
        if !media.is_empty() {
            if let Err(e) = calls.publish_local_media(&joined, media).await {
                warn!(target: "meeting_client.session", error = %e, "Failed to publish local media");
            }
        }

        match calls.subscribe(&joined) {
            Ok(events) => {
                let token = CancellationToken::new();
                if let Some(active) = self.machine.lock().await.active.as_mut() {
                    active.subscription = Some(token.clone());
                }
                tokio::spawn(watch_termination(Arc::clone(self), events, token));
            }
            Err(e) => warn!(
                target: "meeting_client.session",
                error = %e,
                "Failed to subscribe to call events, remote termination will not be observed"
            ),
        }

        let handle = {
            let mut machine = self.machine.lock().await;
            if let Some(reason) = machine.end_requested {
                return Err(abort_error(reason));
            }
            machine.status = machine.status.transition(SessionStatus::Joined)?;
            let features_active = machine
                .active
                .as_ref()
                .map(|a| a.features.clone())
                .unwrap_or_default();
            self.state.send_modify(|s| s.status = SessionStatus::Joined);

            SessionHandle {
                call_id: call_id.clone(),
                status: HandleStatus::Joined,
                features_active,
            }
        };

        if let Some(assistant) = &self.services.assistant {
            notify_in_background(Arc::clone(assistant), call_id.clone());
        }

        Ok(handle)
    }

    /// Move to `next` unless an end was requested.
    async fn advance(&self, next: SessionStatus) -> Result<(), ClientError> {
        let mut machine = self.machine.lock().await;
        if let Some(reason) = machine.end_requested {
            debug!(
                target: "meeting_client.session",
                next = %next,
                reason = reason.as_str(),
                "End requested, aborting start"
            );
            return Err(abort_error(reason));
        }
        machine.status = machine.status.transition(next)?;
        self.state.send_modify(|s| s.status = next);
        debug!(target: "meeting_client.session", status = %next, "Session state changed");
        Ok(())
    }

    /// Enable the configured features in order; failures are logged only.
    async fn activate_features(&self, calls: &dyn CallService, joined: &JoinedCall) {
        let options = FeatureOptions {
            language: self.settings.language.clone(),
        };

        for feature in &self.settings.features {
            match calls.enable_feature(joined, *feature, &options).await {
                Ok(()) => {
                    metrics::record_feature_activation(feature.as_str(), "success");
                    if let Some(active) = self.machine.lock().await.active.as_mut() {
                        active.features.insert(*feature);
                    }
                    self.state.send_modify(|s| {
                        s.features_active.insert(*feature);
                    });
                    debug!(target: "meeting_client.session", feature = %feature, "Feature enabled");
                }
                Err(e) => {
                    metrics::record_feature_activation(feature.as_str(), "error");
                    warn!(
                        target: "meeting_client.session",
                        feature = %feature,
                        error = %e,
                        "Failed to enable feature"
                    );
                }
            }
        }
    }

    /// Record a fatal start failure, leaving the call first if it was joined.
    async fn fail(&self, err: &ClientError, reason: EndReason) {
        let active = self.machine.lock().await.active.take();
        if let Some(active) = active {
            self.cleanup(active, reason).await;
        }

        let mut machine = self.machine.lock().await;
        match machine.status.transition(SessionStatus::Failed) {
            Ok(next) => {
                machine.status = next;
                let message = err.client_message();
                self.state.send_modify(|s| {
                    s.status = SessionStatus::Failed;
                    s.features_active.clear();
                    s.error = Some(message);
                });
                metrics::record_session_outcome("failed");
                warn!(target: "meeting_client.session", error = %err, "Session failed");
            }
            Err(e) => error!(
                target: "meeting_client.session",
                error = %e,
                cause = %err,
                "Could not record session failure"
            ),
        }
    }

    /// Fail a session whose start was dropped, leaving any joined call.
    async fn abandon_start(&self) {
        let status = self.machine.lock().await.status;
        if !status.is_starting() {
            return;
        }

        info!(target: "meeting_client.session", status = %status, "Start cancelled");
        self.fail(&ClientError::StartCancelled, EndReason::Teardown)
            .await;
    }

    /// Shared end path for leave, remote termination and teardown.
    async fn end(&self, reason: EndReason) -> EndStep {
        let mut machine = self.machine.lock().await;
        let status = machine.status;

        match status {
            SessionStatus::Idle => EndStep::NotStarted,
            SessionStatus::Joined => {
                machine.status = SessionStatus::Ending;
                let active = machine.active.take();
                self.state.send_modify(|s| s.status = SessionStatus::Ending);
                drop(machine);

                info!(target: "meeting_client.session", reason = reason.as_str(), "Ending session");
                if let Some(active) = active {
                    self.cleanup(active, reason).await;
                }

                let mut machine = self.machine.lock().await;
                machine.status = SessionStatus::Ended;
                self.state.send_modify(|s| {
                    s.status = SessionStatus::Ended;
                    s.features_active.clear();
                });
                metrics::record_session_outcome("ended");
                EndStep::CleanedUp
            }
            SessionStatus::Ending => EndStep::InProgress,
            SessionStatus::Ended | SessionStatus::Failed => EndStep::Finished,
            _ => {
                if machine.end_requested.is_none() {
                    info!(
                        target: "meeting_client.session",
                        status = %status,
                        reason = reason.as_str(),
                        "End requested while starting"
                    );
                    machine.end_requested = Some(reason);
                }
                EndStep::Requested
            }
        }
    }

    /// Cancel the subscription, disable features, leave. Best-effort.
    #[instrument(skip_all, name = "meeting_client.session.cleanup", fields(reason = reason.as_str()))]
    async fn cleanup(&self, active: ActiveCall, reason: EndReason) {
        let ActiveCall {
            calls,
            joined,
            features,
            subscription,
        } = active;

        if let Some(token) = subscription {
            token.cancel();
        }

        for feature in features {
            if let Err(e) = calls.disable_feature(&joined, feature).await {
                warn!(
                    target: "meeting_client.session",
                    feature = %feature,
                    error = %e,
                    "Failed to disable feature"
                );
            }
        }

        if let Err(e) = calls.leave(&joined).await {
            warn!(target: "meeting_client.session", error = %e, "Failed to leave call");
        }

        metrics::record_cleanup(reason.as_str());
        info!(target: "meeting_client.session", "Session cleanup complete");
    }
}

/// Fails a session whose `start` future was dropped before it settled.
struct StartGuard {
    inner: Arc<Inner>,
    armed: bool,
}

impl StartGuard {
    fn disarm(mut self) {
        self.armed = false;
    }
}

impl Drop for StartGuard {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }

        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                let inner = Arc::clone(&self.inner);
                runtime.spawn(async move {
                    inner.abandon_start().await;
                });
            }
            Err(_) => warn!(
                target: "meeting_client.session",
                "Start dropped outside a runtime, session left starting"
            ),
        }
    }
}

/// The error a start aborted by an end request fails with.
fn abort_error(reason: EndReason) -> ClientError {
    match reason {
        EndReason::RemoteEnded => ClientError::EndedBeforeJoin,
        EndReason::LocalLeave | EndReason::Teardown | EndReason::StartAborted => {
            ClientError::LeftBeforeJoin
        }
    }
}

/// Run the end path when the calling service reports the session ended.
async fn watch_termination(
    inner: Arc<Inner>,
    mut events: broadcast::Receiver<CallEvent>,
    token: CancellationToken,
) {
    loop {
        tokio::select! {
            () = token.cancelled() => {
                debug!(target: "meeting_client.session", "Termination subscription cancelled");
                return;
            }
            event = events.recv() => match event {
                Ok(CallEvent::SessionEnded) => {
                    info!(target: "meeting_client.session", "Call session ended remotely");
                    inner.end(EndReason::RemoteEnded).await;
                    return;
                }
                Ok(other) => {
                    debug!(target: "meeting_client.session", event_type = other.event_type(), "Ignoring call event");
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(target: "meeting_client.session", skipped, "Call event stream lagged");
                }
                Err(RecvError::Closed) => {
                    debug!(target: "meeting_client.session", "Call event stream closed");
                    return;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_remote_end_before_join_is_not_reported_as_leave() {
        assert!(matches!(
            abort_error(EndReason::RemoteEnded),
            ClientError::EndedBeforeJoin
        ));
        assert!(matches!(
            abort_error(EndReason::LocalLeave),
            ClientError::LeftBeforeJoin
        ));
        assert_eq!(
            abort_error(EndReason::RemoteEnded).client_message(),
            "Call ended before it was joined"
        );
    }
}
