//! In-process publish/subscribe event bus.
//!
//! Topics are dot-segmented strings (`order.created`). Subscriptions use
//! glob patterns: `*` alone matches everything; a pattern containing `*`
//! matches with `*` standing for any substring (not limited to dot
//! boundaries); anything else is an exact match.
//!
//! Dispatch for one publish is concurrent: every matched handler is spawned
//! as its own task and raced against a per-handler timeout. A handler that
//! fails or times out is logged and never fails the publish; a timed-out
//! handler keeps running detached (there is no forced cancellation).
//! `publish` resolves only after every matched handler has settled.

use std::collections::{HashMap, VecDeque};
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use opshub_core::config::events::EventBusConfig;
use opshub_core::events::{EventPayload, PluginEvent};
use opshub_core::result::AppResult;

/// Trait for event handler implementations.
#[async_trait]
pub trait EventHandler: Send + Sync {
    /// Handles one delivered event.
    async fn handle(&self, event: Arc<PluginEvent>) -> AppResult<()>;
}

/// A closure-based event handler for quick handler creation.
pub struct FnHandler {
    handler: Arc<
        dyn Fn(Arc<PluginEvent>) -> Pin<Box<dyn Future<Output = AppResult<()>> + Send>>
            + Send
            + Sync,
    >,
}

impl std::fmt::Debug for FnHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnHandler")
            .field("handler", &"<closure>")
            .finish()
    }
}

impl FnHandler {
    /// Wraps an async closure into an `Arc<dyn EventHandler>`.
    pub fn new<F, Fut>(handler: F) -> Arc<dyn EventHandler>
    where
        F: Fn(Arc<PluginEvent>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = AppResult<()>> + Send + 'static,
    {
        Arc::new(Self {
            handler: Arc::new(move |event| Box::pin(handler(event))),
        })
    }
}

#[async_trait]
impl EventHandler for FnHandler {
    async fn handle(&self, event: Arc<PluginEvent>) -> AppResult<()> {
        (self.handler)(event).await
    }
}

/// Handle returned by [`EventBus::subscribe`], used to unsubscribe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subscription {
    pattern: String,
    id: u64,
}

impl Subscription {
    /// The pattern this subscription was registered under.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }
}

/// One registered handler inside a pattern bucket.
struct HandlerEntry {
    id: u64,
    handler: Arc<dyn EventHandler>,
    subscriber: Option<String>,
}

impl std::fmt::Debug for HandlerEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerEntry")
            .field("id", &self.id)
            .field("subscriber", &self.subscriber)
            .finish()
    }
}

/// Process-wide publish/subscribe bus with bounded history.
///
/// Constructed once at application start and threaded through module
/// constructors; there is no global instance.
#[derive(Debug)]
pub struct EventBus {
    /// Pattern → registered handlers.
    handlers: RwLock<HashMap<String, Vec<HandlerEntry>>>,
    /// Subscriber identity → (pattern, handler id) pairs, for bulk teardown.
    subscriber_index: RwLock<HashMap<String, Vec<(String, u64)>>>,
    /// Bounded FIFO of published events, oldest first.
    history: RwLock<VecDeque<PluginEvent>>,
    /// Monotonic handler id source.
    next_id: AtomicU64,
    history_capacity: usize,
    default_timeout: Duration,
}

impl EventBus {
    /// Creates a bus with default settings (history 100, timeout 5000 ms).
    pub fn new() -> Self {
        Self::with_config(&EventBusConfig::default())
    }

    /// Creates a bus from configuration.
    pub fn with_config(config: &EventBusConfig) -> Self {
        Self {
            handlers: RwLock::new(HashMap::new()),
            subscriber_index: RwLock::new(HashMap::new()),
            history: RwLock::new(VecDeque::new()),
            next_id: AtomicU64::new(1),
            history_capacity: config.history_capacity,
            default_timeout: Duration::from_millis(config.dispatch_timeout_ms),
        }
    }

    /// Registers a handler under a topic pattern.
    ///
    /// Re-subscribing the identical handler instance (same `Arc`) under the
    /// same pattern is a no-op and returns the existing subscription.
    /// `subscriber` ties the subscription to an identity for
    /// [`EventBus::unsubscribe_all`].
    pub async fn subscribe(
        &self,
        pattern: &str,
        handler: Arc<dyn EventHandler>,
        subscriber: Option<&str>,
    ) -> Subscription {
        let mut handlers = self.handlers.write().await;
        let bucket = handlers.entry(pattern.to_string()).or_default();

        if let Some(existing) = bucket.iter().find(|e| Arc::ptr_eq(&e.handler, &handler)) {
            return Subscription {
                pattern: pattern.to_string(),
                id: existing.id,
            };
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        bucket.push(HandlerEntry {
            id,
            handler,
            subscriber: subscriber.map(str::to_string),
        });
        drop(handlers);

        if let Some(subscriber) = subscriber {
            let mut index = self.subscriber_index.write().await;
            index
                .entry(subscriber.to_string())
                .or_default()
                .push((pattern.to_string(), id));
        }

        debug!(
            pattern,
            subscriber = subscriber.unwrap_or("anonymous"),
            "Subscribed"
        );

        Subscription {
            pattern: pattern.to_string(),
            id,
        }
    }

    /// Removes a single subscription.
    pub async fn unsubscribe(&self, subscription: &Subscription) {
        let subscriber = {
            let mut handlers = self.handlers.write().await;
            let Some(bucket) = handlers.get_mut(&subscription.pattern) else {
                return;
            };
            let Some(position) = bucket.iter().position(|e| e.id == subscription.id) else {
                return;
            };
            let entry = bucket.remove(position);
            if bucket.is_empty() {
                handlers.remove(&subscription.pattern);
            }
            entry.subscriber
        };

        if let Some(subscriber) = subscriber {
            let mut index = self.subscriber_index.write().await;
            if let Some(entries) = index.get_mut(&subscriber) {
                entries.retain(|(p, id)| !(p == &subscription.pattern && *id == subscription.id));
                if entries.is_empty() {
                    index.remove(&subscriber);
                }
            }
        }
    }

    /// Removes every subscription registered under a subscriber identity.
    ///
    /// Intended for module/component teardown.
    pub async fn unsubscribe_all(&self, subscriber: &str) {
        let Some(entries) = self.subscriber_index.write().await.remove(subscriber) else {
            return;
        };

        let mut handlers = self.handlers.write().await;
        for (pattern, id) in entries {
            if let Some(bucket) = handlers.get_mut(&pattern) {
                bucket.retain(|e| e.id != id);
                if bucket.is_empty() {
                    handlers.remove(&pattern);
                }
            }
        }

        debug!(subscriber, "All subscriptions removed");
    }

    /// Publishes an event with the configured default timeout.
    pub async fn publish(&self, event: PluginEvent) {
        self.publish_with_timeout(event, self.default_timeout).await;
    }

    /// Publishes an event, racing each matched handler against `timeout`.
    ///
    /// The event is appended to history (and the history trimmed) before any
    /// handler runs. Resolves once every matched handler has succeeded,
    /// failed, or timed out.
    pub async fn publish_with_timeout(&self, event: PluginEvent, timeout: Duration) {
        {
            let mut history = self.history.write().await;
            history.push_back(event.clone());
            while history.len() > self.history_capacity {
                history.pop_front();
            }
        }

        let event = Arc::new(event);
        debug!(topic = %event.topic, source = %event.source, "Event published");

        let matched: Vec<(Arc<dyn EventHandler>, Option<String>)> = {
            let handlers = self.handlers.read().await;
            handlers
                .iter()
                .filter(|(pattern, _)| topic_matches(pattern, &event.topic))
                .flat_map(|(_, bucket)| {
                    bucket
                        .iter()
                        .map(|e| (e.handler.clone(), e.subscriber.clone()))
                })
                .collect()
        };

        if matched.is_empty() {
            return;
        }

        debug!(
            topic = %event.topic,
            handler_count = matched.len(),
            "Dispatching event"
        );

        let dispatches = matched.into_iter().map(|(handler, subscriber)| {
            let event = event.clone();
            async move {
                let topic = event.topic.clone();
                let subscriber = subscriber.as_deref().unwrap_or("anonymous").to_string();
                let started = Instant::now();

                // Spawn so a timed-out handler keeps running detached
                // instead of being cancelled mid-flight.
                let task = tokio::spawn(async move { handler.handle(event).await });

                match tokio::time::timeout(timeout, task).await {
                    Ok(Ok(Ok(()))) => {
                        debug!(
                            topic = %topic,
                            subscriber = %subscriber,
                            elapsed_ms = started.elapsed().as_millis() as u64,
                            "Handler completed"
                        );
                    }
                    Ok(Ok(Err(error))) => {
                        warn!(
                            topic = %topic,
                            subscriber = %subscriber,
                            error = %error,
                            "Event handler failed"
                        );
                    }
                    Ok(Err(join_error)) => {
                        warn!(
                            topic = %topic,
                            subscriber = %subscriber,
                            error = %join_error,
                            "Event handler panicked"
                        );
                    }
                    Err(_) => {
                        warn!(
                            topic = %topic,
                            subscriber = %subscriber,
                            timeout_ms = timeout.as_millis() as u64,
                            "Event handler timed out; task left running"
                        );
                    }
                }
            }
        });

        futures::future::join_all(dispatches).await;
    }

    /// Publishes a well-known payload under its bound topic.
    pub async fn publish_typed<P: EventPayload>(&self, payload: P, source: &str) -> AppResult<()> {
        let event = PluginEvent::new(P::TOPIC, serde_json::to_value(&payload)?, source);
        self.publish(event).await;
        Ok(())
    }

    /// Returns the last `limit` events in publish order (oldest first).
    pub async fn get_event_history(&self, limit: usize) -> Vec<PluginEvent> {
        let history = self.history.read().await;
        let skip = history.len().saturating_sub(limit);
        history.iter().skip(skip).cloned().collect()
    }

    /// Empties the stored history. Subscriptions are unaffected.
    pub async fn clear_history(&self) {
        self.history.write().await.clear();
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Glob-style topic matching.
///
/// `*` alone matches every topic. A pattern containing `*` matches with each
/// `*` standing for any substring (segment-agnostic); all other characters
/// match literally. Patterns without `*` are exact comparisons.
fn topic_matches(pattern: &str, topic: &str) -> bool {
    if pattern == "*" {
        return true;
    }
    if !pattern.contains('*') {
        return pattern == topic;
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut rest = topic;

    // The first fragment anchors at the start, the last at the end, and the
    // middle fragments must appear in order in between.
    let first = parts[0];
    if !rest.starts_with(first) {
        return false;
    }
    rest = &rest[first.len()..];

    let last = parts[parts.len() - 1];
    for middle in &parts[1..parts.len() - 1] {
        match rest.find(middle) {
            Some(at) => rest = &rest[at + middle.len()..],
            None => return false,
        }
    }

    rest.ends_with(last)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    use opshub_core::events::OrderCreated;
    use serde_json::json;

    fn event(topic: &str) -> PluginEvent {
        PluginEvent::new(topic, json!({}), "test")
    }

    fn counting_handler(counter: Arc<AtomicUsize>) -> Arc<dyn EventHandler> {
        FnHandler::new(move |_| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        })
    }

    #[test]
    fn pattern_matching_rules() {
        assert!(topic_matches("*", "order.created"));
        assert!(topic_matches("*", "anything"));
        assert!(topic_matches("order.created", "order.created"));
        assert!(!topic_matches("order.created", "order.updated"));
        assert!(topic_matches("order.*", "order.created"));
        assert!(topic_matches("order.*", "order.updated"));
        assert!(!topic_matches("order.*", "payment.received"));
        // '*' is segment-agnostic.
        assert!(topic_matches("order.*", "order.item.added"));
        assert!(topic_matches("*.created", "order.created"));
        assert!(topic_matches("order*created", "order.created"));
        assert!(!topic_matches("order.*", "reorder.created"));
        assert!(!topic_matches("order.created", "order"));
    }

    #[tokio::test]
    async fn wildcard_receives_everything() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("*", counting_handler(count.clone()), None)
            .await;

        bus.publish(event("order.created")).await;
        bus.publish(event("payment.received")).await;
        bus.publish(event("something.else")).await;

        assert_eq!(count.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn prefix_glob_filters_topics() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("order.*", counting_handler(count.clone()), None)
            .await;

        bus.publish(event("order.created")).await;
        bus.publish(event("order.updated")).await;
        bus.publish(event("payment.received")).await;

        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn unsubscribe_stops_delivery() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let sub = bus
            .subscribe("order.created", counting_handler(count.clone()), None)
            .await;

        bus.publish(event("order.created")).await;
        bus.unsubscribe(&sub).await;
        bus.publish(event("order.created")).await;

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unsubscribe_all_tears_down_subscriber() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("order.*", counting_handler(count.clone()), Some("ops"))
            .await;
        bus.subscribe(
            "payment.received",
            counting_handler(count.clone()),
            Some("ops"),
        )
        .await;
        bus.subscribe("order.*", counting_handler(count.clone()), Some("other"))
            .await;

        bus.unsubscribe_all("ops").await;
        bus.publish(event("order.created")).await;
        bus.publish(event("payment.received")).await;

        // Only the "other" subscription is left.
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn resubscribing_identical_handler_is_a_noop() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let handler = counting_handler(count.clone());

        let first = bus.subscribe("order.*", handler.clone(), None).await;
        let second = bus.subscribe("order.*", handler, None).await;
        assert_eq!(first, second);

        bus.publish(event("order.created")).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn handler_error_does_not_fail_publish() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            "order.*",
            FnHandler::new(|_| async {
                Err(opshub_core::AppError::internal("handler exploded"))
            }),
            Some("broken"),
        )
        .await;
        bus.subscribe("order.*", counting_handler(count.clone()), None)
            .await;

        bus.publish(event("order.created")).await;

        // The sibling handler still ran and history recorded the event.
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(bus.get_event_history(10).await.len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn hanging_handler_times_out_and_publish_resolves() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe(
            "order.*",
            FnHandler::new(|_| async {
                futures::future::pending::<()>().await;
                Ok(())
            }),
            Some("stuck"),
        )
        .await;
        bus.subscribe("order.*", counting_handler(count.clone()), None)
            .await;

        bus.publish_with_timeout(event("order.created"), Duration::from_millis(50))
            .await;

        // publish resolved despite the never-settling handler.
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn history_is_bounded_and_oldest_first() {
        let bus = EventBus::new();
        for i in 0..105 {
            bus.publish(event(&format!("tick.{i}"))).await;
        }

        let full = bus.get_event_history(100).await;
        assert_eq!(full.len(), 100);
        assert_eq!(full.first().unwrap().topic, "tick.5");
        assert_eq!(full.last().unwrap().topic, "tick.104");

        let tail = bus.get_event_history(5).await;
        assert_eq!(tail.len(), 5);
        assert_eq!(tail.first().unwrap().topic, "tick.100");
        assert_eq!(tail.last().unwrap().topic, "tick.104");
    }

    #[tokio::test]
    async fn clear_history_keeps_subscriptions() {
        let bus = EventBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        bus.subscribe("*", counting_handler(count.clone()), None)
            .await;

        bus.publish(event("order.created")).await;
        bus.clear_history().await;
        assert!(bus.get_event_history(10).await.is_empty());

        bus.publish(event("order.created")).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(bus.get_event_history(10).await.len(), 1);
    }

    #[tokio::test]
    async fn typed_publish_round_trip() {
        let bus = EventBus::new();
        let seen = Arc::new(RwLock::new(None));
        let sink = seen.clone();
        bus.subscribe(
            "order.*",
            FnHandler::new(move |event| {
                let sink = sink.clone();
                async move {
                    *sink.write().await = Some(event);
                    Ok(())
                }
            }),
            Some("observer"),
        )
        .await;

        let payload = OrderCreated {
            order_id: "X".to_string(),
            amount: 10.0,
            customer_id: "C".to_string(),
        };
        bus.publish_typed(payload.clone(), "ops").await.unwrap();

        let history = bus.get_event_history(1).await;
        assert_eq!(history[0].topic, "order.created");
        assert_eq!(history[0].source, "ops");
        assert_eq!(
            history[0].payload,
            json!({ "orderId": "X", "amount": 10.0, "customerId": "C" })
        );

        let delivered = seen.read().await.clone().expect("handler saw the event");
        let decoded: OrderCreated = serde_json::from_value(delivered.payload.clone()).unwrap();
        assert_eq!(decoded, payload);
    }
}
