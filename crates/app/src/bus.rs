use std::{collections::HashSet, time::Duration};

use axum::response::sse::{Event, KeepAlive};
use chrono::{DateTime, Utc};
use isa_invest_core::{EventSink, PublishError};
use metrics::counter;
use serde::Serialize;
use serde_json::Value;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio_stream::{wrappers::BroadcastStream, Stream, StreamExt};
use tracing::{debug, warn};

/// A domain event as carried on the in-process bus.
#[derive(Debug, Clone, Serialize)]
pub struct BusMessage {
    pub ts: DateTime<Utc>,
    pub subject: String,
    pub payload: Value,
}

impl BusMessage {
    pub fn into_sse_event(self) -> Result<Event, serde_json::Error> {
        let event = Event::default().event(self.subject.as_str());
        let data = serde_json::to_string(&self)?;
        Ok(event.data(data))
    }
}

/// Broadcast-backed event sink.
///
/// Every subscriber sees every message published after it subscribed.
/// Publishing while nobody listens fails with [`PublishError::NoSubscribers`].
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<BusMessage>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<BusMessage> {
        self.sender.subscribe()
    }

    /// Spawns a consumer that writes every bus message to the debug log.
    pub fn spawn_audit_logger(&self) {
        let mut receiver = self.subscribe();
        tokio::spawn(async move {
            loop {
                match receiver.recv().await {
                    Ok(message) => debug!(
                        stage = "bus",
                        subject = %message.subject,
                        payload = %message.payload,
                        "event observed"
                    ),
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(stage = "bus", skipped, "audit logger lagged behind the event bus")
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        });
    }
}

impl EventSink for EventBus {
    fn publish_value(&self, subject: &str, payload: Value) -> Result<(), PublishError> {
        let message = BusMessage {
            ts: Utc::now(),
            subject: subject.to_string(),
            payload,
        };

        match self.sender.send(message) {
            Ok(receivers) => {
                counter!("events_published_total", "subject" => subject.to_string()).increment(1);
                debug!(stage = "bus", subject, receivers, "event broadcast");
                Ok(())
            }
            Err(_) => {
                counter!("event_publish_failures_total", "subject" => subject.to_string())
                    .increment(1);
                Err(PublishError::NoSubscribers)
            }
        }
    }
}

/// Subject filter for event streams.
///
/// Entries match exactly, except that an entry ending in `.>` matches every
/// subject under that prefix (`investment.>` matches `investment.created`).
#[derive(Debug, Clone, Default)]
pub struct SubjectFilter {
    subjects: Option<HashSet<String>>,
}

impl SubjectFilter {
    pub fn from_subjects(subjects: Option<HashSet<String>>) -> Self {
        Self { subjects }
    }

    pub fn matches(&self, subject: &str) -> bool {
        let Some(patterns) = &self.subjects else {
            return true;
        };
        patterns.iter().any(|pattern| match pattern.strip_suffix('>') {
            Some(prefix) if prefix.ends_with('.') => subject.starts_with(prefix),
            _ => pattern == subject,
        })
    }
}

pub fn event_stream(
    bus: EventBus,
    filter: SubjectFilter,
) -> impl Stream<Item = Result<Event, serde_json::Error>> + Send + 'static {
    BroadcastStream::new(bus.subscribe()).filter_map(move |result| match result {
        Ok(message) if filter.matches(&message.subject) => Some(message.into_sse_event()),
        Ok(_) => None,
        Err(_) => None,
    })
}

pub fn event_keep_alive() -> KeepAlive {
    KeepAlive::new()
        .interval(Duration::from_secs(20))
        .text("heartbeat")
}

pub fn parse_subject_list(value: Option<String>) -> Option<HashSet<String>> {
    let raw = value?;
    let set: HashSet<String> = raw
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    if set.is_empty() {
        None
    } else {
        Some(set)
    }
}
