//! Mock remote calling service.
//!
//! Records every operation in order so tests can assert on sequencing
//! (create before join, every disable before leave). Failures are configured
//! per operation through the builder. Events are pushed to subscribers with
//! [`MockCallService::emit`].
//!
//! # Example
//!
//! ```rust,ignore
//! use client_test_utils::MockCallService;
//!
//! let calls = MockCallService::builder()
//!     .fail_join("SFU unreachable")
//!     .build();
//! ```

use async_trait::async_trait;
use meeting_client::errors::RemoteError;
use meeting_client::remote::{
    CallEvent, CallRef, CallService, CreateCallRequest, Feature, FeatureOptions, JoinOptions,
    JoinedCall, LocalMedia,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, Notify};

/// One recorded calling service operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOp {
    GetOrCreate(CreateCallRequest),
    Join { create: bool },
    EnableFeature(Feature),
    DisableFeature(Feature),
    PublishLocalMedia(LocalMedia),
    Leave,
    Subscribe,
}

/// Mock calling service.
#[derive(Debug)]
pub struct MockCallService {
    ops: Mutex<Vec<CallOp>>,
    call_refs: Mutex<Vec<CallRef>>,
    create_error: Option<String>,
    join_error: Option<String>,
    enable_errors: HashMap<Feature, String>,
    disable_error: Option<String>,
    leave_error: Option<String>,
    subscribe_error: Option<String>,
    join_gate: Option<Arc<Notify>>,
    enable_gate: Option<Arc<Notify>>,
    join_entered: Arc<Notify>,
    enable_entered: Arc<Notify>,
    leave_called: Arc<Notify>,
    events: broadcast::Sender<CallEvent>,
}

impl Default for MockCallService {
    fn default() -> Self {
        MockCallServiceBuilder::default().build()
    }
}

impl MockCallService {
    /// Create a new builder.
    #[must_use]
    pub fn builder() -> MockCallServiceBuilder {
        MockCallServiceBuilder::default()
    }

    /// All operations so far, in call order.
    pub fn ops(&self) -> Vec<CallOp> {
        self.ops.lock().unwrap().clone()
    }

    /// Call references passed to create and join.
    pub fn call_refs(&self) -> Vec<CallRef> {
        self.call_refs.lock().unwrap().clone()
    }

    /// Number of recorded operations matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&CallOp) -> bool) -> usize {
        self.ops.lock().unwrap().iter().filter(|op| predicate(op)).count()
    }

    /// Number of `leave` calls.
    pub fn leave_count(&self) -> usize {
        self.count(|op| matches!(op, CallOp::Leave))
    }

    /// Number of `join` calls.
    pub fn join_count(&self) -> usize {
        self.count(|op| matches!(op, CallOp::Join { .. }))
    }

    /// The create request, if create was called.
    pub fn create_request(&self) -> Option<CreateCallRequest> {
        self.ops.lock().unwrap().iter().find_map(|op| match op {
            CallOp::GetOrCreate(request) => Some(request.clone()),
            _ => None,
        })
    }

    /// Let a held `join` proceed. Only meaningful with `hold_join`.
    pub fn release_join(&self) {
        if let Some(gate) = &self.join_gate {
            gate.notify_one();
        }
    }

    /// Resolves once `join` has been entered.
    pub async fn join_entered(&self) {
        self.join_entered.notified().await;
    }

    /// Resolves once `enable_feature` has been entered.
    pub async fn enable_entered(&self) {
        self.enable_entered.notified().await;
    }

    /// Resolves once `leave` has been called.
    pub async fn leave_called(&self) {
        self.leave_called.notified().await;
    }

    /// Push an event to every subscriber. Returns the number of receivers.
    pub fn emit(&self, event: CallEvent) -> usize {
        self.events.send(event).unwrap_or(0)
    }

    /// Number of live event subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn record(&self, op: CallOp) {
        self.ops.lock().unwrap().push(op);
    }

    fn result(error: Option<&String>) -> Result<(), RemoteError> {
        match error {
            Some(message) => Err(RemoteError::new(message.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl CallService for MockCallService {
    async fn get_or_create_call(
        &self,
        call: &CallRef,
        request: &CreateCallRequest,
    ) -> Result<(), RemoteError> {
        self.call_refs.lock().unwrap().push(call.clone());
        self.record(CallOp::GetOrCreate(request.clone()));
        Self::result(self.create_error.as_ref())
    }

    async fn join(&self, call: &CallRef, options: JoinOptions) -> Result<JoinedCall, RemoteError> {
        self.call_refs.lock().unwrap().push(call.clone());
        self.record(CallOp::Join {
            create: options.create,
        });
        self.join_entered.notify_one();

        if let Some(gate) = &self.join_gate {
            gate.notified().await;
        }

        Self::result(self.join_error.as_ref())?;
        Ok(JoinedCall {
            call: call.clone(),
            session_id: format!("session-{}", call.call_id),
        })
    }

    async fn enable_feature(
        &self,
        _call: &JoinedCall,
        feature: Feature,
        _options: &FeatureOptions,
    ) -> Result<(), RemoteError> {
        self.record(CallOp::EnableFeature(feature));
        self.enable_entered.notify_one();

        if let Some(gate) = &self.enable_gate {
            gate.notified().await;
        }

        Self::result(self.enable_errors.get(&feature))
    }

    async fn disable_feature(
        &self,
        _call: &JoinedCall,
        feature: Feature,
    ) -> Result<(), RemoteError> {
        self.record(CallOp::DisableFeature(feature));
        Self::result(self.disable_error.as_ref())
    }

    async fn publish_local_media(
        &self,
        _call: &JoinedCall,
        media: LocalMedia,
    ) -> Result<(), RemoteError> {
        self.record(CallOp::PublishLocalMedia(media));
        Ok(())
    }

    async fn leave(&self, _call: &JoinedCall) -> Result<(), RemoteError> {
        self.record(CallOp::Leave);
        self.leave_called.notify_one();
        Self::result(self.leave_error.as_ref())
    }

    fn subscribe(&self, _call: &JoinedCall) -> Result<broadcast::Receiver<CallEvent>, RemoteError> {
        self.record(CallOp::Subscribe);
        Self::result(self.subscribe_error.as_ref())?;
        Ok(self.events.subscribe())
    }
}

/// Builder for MockCallService configuration.
#[derive(Debug, Default)]
pub struct MockCallServiceBuilder {
    create_error: Option<String>,
    join_error: Option<String>,
    enable_errors: HashMap<Feature, String>,
    disable_error: Option<String>,
    leave_error: Option<String>,
    subscribe_error: Option<String>,
    hold_join: bool,
    hold_enable: bool,
}

impl MockCallServiceBuilder {
    /// Fail create-or-get with the given message.
    #[must_use]
    pub fn fail_create(mut self, message: impl Into<String>) -> Self {
        self.create_error = Some(message.into());
        self
    }

    /// Fail join with the given message.
    #[must_use]
    pub fn fail_join(mut self, message: impl Into<String>) -> Self {
        self.join_error = Some(message.into());
        self
    }

    /// Fail enabling one feature.
    #[must_use]
    pub fn fail_enable(mut self, feature: Feature, message: impl Into<String>) -> Self {
        self.enable_errors.insert(feature, message.into());
        self
    }

    /// Fail every disable call.
    #[must_use]
    pub fn fail_disable(mut self, message: impl Into<String>) -> Self {
        self.disable_error = Some(message.into());
        self
    }

    /// Fail leave.
    #[must_use]
    pub fn fail_leave(mut self, message: impl Into<String>) -> Self {
        self.leave_error = Some(message.into());
        self
    }

    /// Fail event subscription.
    #[must_use]
    pub fn fail_subscribe(mut self, message: impl Into<String>) -> Self {
        self.subscribe_error = Some(message.into());
        self
    }

    /// Block `join` until [`MockCallService::release_join`] is called.
    #[must_use]
    pub fn hold_join(mut self) -> Self {
        self.hold_join = true;
        self
    }

    /// Block every `enable_feature` call. The gate is never opened.
    #[must_use]
    pub fn hold_enable(mut self) -> Self {
        self.hold_enable = true;
        self
    }

    /// Build the MockCallService.
    #[must_use]
    pub fn build(self) -> MockCallService {
        let (events, _) = broadcast::channel(16);

        MockCallService {
            ops: Mutex::new(Vec::new()),
            call_refs: Mutex::new(Vec::new()),
            create_error: self.create_error,
            join_error: self.join_error,
            enable_errors: self.enable_errors,
            disable_error: self.disable_error,
            leave_error: self.leave_error,
            subscribe_error: self.subscribe_error,
            join_gate: self.hold_join.then(|| Arc::new(Notify::new())),
            enable_gate: self.hold_enable.then(|| Arc::new(Notify::new())),
            join_entered: Arc::new(Notify::new()),
            enable_entered: Arc::new(Notify::new()),
            leave_called: Arc::new(Notify::new()),
            events,
        }
    }
}
