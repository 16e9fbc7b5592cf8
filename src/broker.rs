use crate::{
    ConnectOptions, InboundMessage, PublishOptions, Result, StreamBusError, StreamOptions,
    SubscribeOptions,
};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;
use tracing::debug;

/// Push subscription callback invoked once per inbound broker message
///
/// Runs on broker delivery tasks, possibly concurrently with itself; it must
/// be re-entrant.
pub type PushHandler = Arc<dyn Fn(InboundMessage) + Send + Sync>;

/// Broker session capability
#[async_trait]
pub trait BrokerConnector: Send + Sync {
    /// Open a broker session
    async fn connect(
        &self,
        addr: &str,
        options: &ConnectOptions,
    ) -> Result<Arc<dyn BrokerSession>>;
}

/// An established broker session
#[async_trait]
pub trait BrokerSession: Send + Sync {
    /// Derive a stream-capable context from the session
    async fn stream_context(&self, options: &StreamOptions) -> Result<Arc<dyn StreamContext>>;
}

/// Stream-capable context capability
///
/// One provisioned stream handle. Implementations must be safe to share
/// between publish calls and broker-side delivery tasks.
#[async_trait]
pub trait StreamContext: Send + Sync {
    /// Declare a stream: create-if-absent, no-op-if-matching
    async fn declare_stream(&self, name: &str, subjects: &[String]) -> Result<()>;

    /// Publish one frame and block until the broker acknowledges persistence
    async fn publish(&self, subject: &str, payload: Bytes, options: &PublishOptions)
        -> Result<()>;

    /// Issue one non-blocking publish call
    ///
    /// Returns immediately; an error is an issue-time rejection, not a
    /// delivery failure. Acknowledgment is observed through
    /// [`await_async_complete`](StreamContext::await_async_complete).
    fn publish_async(&self, subject: &str, payload: Bytes, options: &PublishOptions)
        -> Result<()>;

    /// Resolve once every outstanding async publish has been acknowledged
    ///
    /// Resolves immediately when nothing is outstanding. Callers bound the
    /// wait themselves.
    async fn await_async_complete(&self);

    /// Register a push-style subscription
    async fn subscribe_push(
        &self,
        subject: &str,
        handler: PushHandler,
        options: &SubscribeOptions,
    ) -> Result<()>;

    /// Register a pull-style subscription
    async fn subscribe_pull(&self, subject: &str, options: &SubscribeOptions) -> Result<()>;
}

/// Check a subject against a pattern with `*` (one token) and `>` (tail)
fn subject_matches(pattern: &str, subject: &str) -> bool {
    let mut pattern_tokens = pattern.split('.');
    let mut subject_tokens = subject.split('.');

    loop {
        match (pattern_tokens.next(), subject_tokens.next()) {
            (Some(">"), Some(_)) => return true,
            (Some("*"), Some(_)) => continue,
            (Some(p), Some(s)) if p == s => continue,
            (None, None) => return true,
            _ => return false,
        }
    }
}

/// Shared state behind every handle the in-memory broker gives out
struct BrokerState {
    /// Declared streams: name to covered subjects
    streams: RwLock<HashMap<String, Vec<String>>>,
    /// Registered push subscriptions: pattern and handler
    push_subscriptions: RwLock<Vec<(String, PushHandler)>>,
    /// Pull subscription queues keyed by pattern
    pull_queues: RwLock<HashMap<String, VecDeque<InboundMessage>>>,
    /// Every frame accepted at issue time, sync and async
    published: RwLock<Vec<InboundMessage>>,
    /// Outstanding async publishes awaiting acknowledgment
    pending_async: AtomicUsize,
    /// Signalled when the outstanding count drops to zero
    async_done: Notify,
    /// Acknowledgment latency; `None` means acks never arrive
    ack_delay: RwLock<Option<Duration>>,
    /// Reject async publishes at issue time once this many were issued
    async_reject_after: RwLock<Option<usize>>,
    fail_connect: AtomicBool,
    fail_stream_context: AtomicBool,
    fail_publish: AtomicBool,
    fail_subscribe: AtomicBool,
    connect_calls: AtomicUsize,
    stream_context_calls: AtomicUsize,
    declare_calls: AtomicUsize,
    publish_calls: AtomicUsize,
    async_issued: AtomicUsize,
    subscribe_push_calls: AtomicUsize,
    subscribe_pull_calls: AtomicUsize,
}

impl BrokerState {
    fn new() -> Self {
        Self {
            streams: RwLock::new(HashMap::new()),
            push_subscriptions: RwLock::new(Vec::new()),
            pull_queues: RwLock::new(HashMap::new()),
            published: RwLock::new(Vec::new()),
            pending_async: AtomicUsize::new(0),
            async_done: Notify::new(),
            ack_delay: RwLock::new(Some(Duration::ZERO)),
            async_reject_after: RwLock::new(None),
            fail_connect: AtomicBool::new(false),
            fail_stream_context: AtomicBool::new(false),
            fail_publish: AtomicBool::new(false),
            fail_subscribe: AtomicBool::new(false),
            connect_calls: AtomicUsize::new(0),
            stream_context_calls: AtomicUsize::new(0),
            declare_calls: AtomicUsize::new(0),
            publish_calls: AtomicUsize::new(0),
            async_issued: AtomicUsize::new(0),
            subscribe_push_calls: AtomicUsize::new(0),
            subscribe_pull_calls: AtomicUsize::new(0),
        }
    }

    /// Route a frame to every matching push handler and pull queue
    fn deliver(&self, frame: &InboundMessage) {
        let handlers: Vec<PushHandler> = {
            let subscriptions = self.push_subscriptions.read();
            subscriptions
                .iter()
                .filter(|(pattern, _)| subject_matches(pattern, &frame.subject))
                .map(|(_, handler)| handler.clone())
                .collect()
        };

        for handler in handlers {
            handler(frame.clone());
        }

        let mut queues = self.pull_queues.write();
        for (pattern, queue) in queues.iter_mut() {
            if subject_matches(pattern, &frame.subject) {
                queue.push_back(frame.clone());
            }
        }
    }

    fn acknowledge_one(&self) {
        if self.pending_async.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.async_done.notify_waiters();
        }
    }
}

/// In-memory broker implementing the full capability surface
///
/// Serves as the test double for the real broker adapter: frames are routed
/// to push handlers and pull queues in process, async acknowledgment latency
/// is controllable, and every failure mode the client must handle can be
/// forced. Handles returned by `connect` share this broker's state, so
/// counters and controls stay usable after provisioning.
#[derive(Clone)]
pub struct InMemoryBroker {
    state: Arc<BrokerState>,
}

impl InMemoryBroker {
    /// Create a new in-memory broker
    pub fn new() -> Self {
        Self {
            state: Arc::new(BrokerState::new()),
        }
    }

    /// Set the async acknowledgment latency; `None` suppresses acks entirely
    pub fn set_ack_delay(&self, delay: Option<Duration>) {
        *self.state.ack_delay.write() = delay;
    }

    /// Reject async publishes at issue time once `limit` calls were issued
    pub fn reject_async_publishes_after(&self, limit: usize) {
        *self.state.async_reject_after.write() = Some(limit);
    }

    /// Force session establishment to fail
    pub fn fail_connect(&self) {
        self.state.fail_connect.store(true, Ordering::SeqCst);
    }

    /// Force stream context derivation to fail
    pub fn fail_stream_context(&self) {
        self.state.fail_stream_context.store(true, Ordering::SeqCst);
    }

    /// Force synchronous publishes to fail
    pub fn fail_publish(&self) {
        self.state.fail_publish.store(true, Ordering::SeqCst);
    }

    /// Force subscription registration to fail
    pub fn fail_subscribe(&self) {
        self.state.fail_subscribe.store(true, Ordering::SeqCst);
    }

    /// Number of `connect` calls observed
    pub fn connect_count(&self) -> usize {
        self.state.connect_calls.load(Ordering::SeqCst)
    }

    /// Number of stream context derivations observed
    pub fn stream_context_count(&self) -> usize {
        self.state.stream_context_calls.load(Ordering::SeqCst)
    }

    /// Number of stream declarations observed
    pub fn declare_count(&self) -> usize {
        self.state.declare_calls.load(Ordering::SeqCst)
    }

    /// Number of synchronous publish calls observed
    pub fn publish_count(&self) -> usize {
        self.state.publish_calls.load(Ordering::SeqCst)
    }

    /// Number of async publish calls accepted at issue time
    pub fn async_issued_count(&self) -> usize {
        self.state.async_issued.load(Ordering::SeqCst)
    }

    /// Number of push subscription registrations observed
    pub fn subscribe_push_count(&self) -> usize {
        self.state.subscribe_push_calls.load(Ordering::SeqCst)
    }

    /// Number of pull subscription registrations observed
    pub fn subscribe_pull_count(&self) -> usize {
        self.state.subscribe_pull_calls.load(Ordering::SeqCst)
    }

    /// Every frame accepted at issue time, in order
    pub fn published_frames(&self) -> Vec<InboundMessage> {
        self.state.published.read().clone()
    }

    /// Declared streams and the subjects they cover
    pub fn declared_streams(&self) -> HashMap<String, Vec<String>> {
        self.state.streams.read().clone()
    }

    /// Pop the next queued frame for a pull subscription
    pub fn pull_next(&self, pattern: &str) -> Option<InboundMessage> {
        self.state.pull_queues.write().get_mut(pattern)?.pop_front()
    }
}

impl Default for InMemoryBroker {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BrokerConnector for InMemoryBroker {
    async fn connect(
        &self,
        addr: &str,
        _options: &ConnectOptions,
    ) -> Result<Arc<dyn BrokerSession>> {
        self.state.connect_calls.fetch_add(1, Ordering::SeqCst);

        if self.state.fail_connect.load(Ordering::SeqCst) {
            return Err(StreamBusError::connection(format!(
                "broker at '{addr}' refused the session"
            )));
        }

        debug!("opened in-memory broker session to '{}'", addr);
        Ok(Arc::new(InMemorySession {
            state: self.state.clone(),
        }))
    }
}

struct InMemorySession {
    state: Arc<BrokerState>,
}

#[async_trait]
impl BrokerSession for InMemorySession {
    async fn stream_context(&self, _options: &StreamOptions) -> Result<Arc<dyn StreamContext>> {
        self.state
            .stream_context_calls
            .fetch_add(1, Ordering::SeqCst);

        if self.state.fail_stream_context.load(Ordering::SeqCst) {
            return Err(StreamBusError::stream_context(
                "session does not support streams",
            ));
        }

        Ok(Arc::new(InMemoryStream {
            state: self.state.clone(),
        }))
    }
}

struct InMemoryStream {
    state: Arc<BrokerState>,
}

#[async_trait]
impl StreamContext for InMemoryStream {
    async fn declare_stream(&self, name: &str, subjects: &[String]) -> Result<()> {
        self.state.declare_calls.fetch_add(1, Ordering::SeqCst);

        let mut streams = self.state.streams.write();
        match streams.get(name) {
            Some(existing) if existing.as_slice() == subjects => Ok(()),
            Some(_) => Err(StreamBusError::stream_provision(format!(
                "stream '{name}' already exists with different subjects"
            ))),
            None => {
                streams.insert(name.to_string(), subjects.to_vec());
                debug!("declared stream '{}' covering {:?}", name, subjects);
                Ok(())
            }
        }
    }

    async fn publish(
        &self,
        subject: &str,
        payload: Bytes,
        _options: &PublishOptions,
    ) -> Result<()> {
        self.state.publish_calls.fetch_add(1, Ordering::SeqCst);

        if self.state.fail_publish.load(Ordering::SeqCst) {
            return Err(StreamBusError::publish(format!(
                "broker rejected publish on '{subject}'"
            )));
        }

        let frame = InboundMessage::new(subject, payload);
        self.state.published.write().push(frame.clone());
        self.state.deliver(&frame);
        Ok(())
    }

    fn publish_async(
        &self,
        subject: &str,
        payload: Bytes,
        _options: &PublishOptions,
    ) -> Result<()> {
        let issued = self.state.async_issued.load(Ordering::SeqCst);
        if let Some(limit) = *self.state.async_reject_after.read() {
            if issued >= limit {
                return Err(StreamBusError::publish(format!(
                    "async publish on '{subject}' rejected at issue time"
                )));
            }
        }

        self.state.async_issued.fetch_add(1, Ordering::SeqCst);
        let frame = InboundMessage::new(subject, payload);
        self.state.published.write().push(frame.clone());
        self.state.pending_async.fetch_add(1, Ordering::SeqCst);

        // No spawned ack task means the publish stays outstanding forever.
        if let Some(delay) = *self.state.ack_delay.read() {
            let state = self.state.clone();
            tokio::spawn(async move {
                if !delay.is_zero() {
                    tokio::time::sleep(delay).await;
                }
                state.deliver(&frame);
                state.acknowledge_one();
            });
        }

        Ok(())
    }

    async fn await_async_complete(&self) {
        loop {
            let notified = self.state.async_done.notified();
            if self.state.pending_async.load(Ordering::SeqCst) == 0 {
                return;
            }
            notified.await;
        }
    }

    async fn subscribe_push(
        &self,
        subject: &str,
        handler: PushHandler,
        _options: &SubscribeOptions,
    ) -> Result<()> {
        self.state
            .subscribe_push_calls
            .fetch_add(1, Ordering::SeqCst);

        if self.state.fail_subscribe.load(Ordering::SeqCst) {
            return Err(StreamBusError::subscribe(format!(
                "broker rejected push subscription on '{subject}'"
            )));
        }

        self.state
            .push_subscriptions
            .write()
            .push((subject.to_string(), handler));
        debug!("registered push subscription on '{}'", subject);
        Ok(())
    }

    async fn subscribe_pull(&self, subject: &str, _options: &SubscribeOptions) -> Result<()> {
        self.state
            .subscribe_pull_calls
            .fetch_add(1, Ordering::SeqCst);

        if self.state.fail_subscribe.load(Ordering::SeqCst) {
            return Err(StreamBusError::subscribe(format!(
                "broker rejected pull subscription on '{subject}'"
            )));
        }

        self.state
            .pull_queues
            .write()
            .entry(subject.to_string())
            .or_default();
        debug!("registered pull subscription on '{}'", subject);
        Ok(())
    }
}
