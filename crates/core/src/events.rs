use std::{collections::HashSet, sync::Mutex};

use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Announces that a record exists.
pub const SUBJECT_CREATED: &str = "investment.created";
/// Announces that processing of the record has started.
pub const SUBJECT_PROCESSED: &str = "investment.processed";
/// Announces that the record awaits external validation.
pub const SUBJECT_VALIDATION_PENDING: &str = "investment.validation.pending";

/// Subjects published for every created investment, in emission order.
pub const LIFECYCLE_SUBJECTS: [&str; 3] =
    [SUBJECT_CREATED, SUBJECT_PROCESSED, SUBJECT_VALIDATION_PENDING];

/// Outbound channel for domain events.
///
/// Delivery is at-most-once and unacknowledged; callers treat failures as
/// non-fatal.
pub trait EventSink: Send + Sync {
    fn publish_value(&self, subject: &str, payload: Value) -> Result<(), PublishError>;
}

/// Serializing front end for any [`EventSink`].
pub trait EventSinkExt: EventSink {
    fn publish<T>(&self, subject: &str, payload: &T) -> Result<(), PublishError>
    where
        T: Serialize + ?Sized,
    {
        let value = serde_json::to_value(payload).map_err(PublishError::Encode)?;
        self.publish_value(subject, value)
    }
}

impl<S: EventSink + ?Sized> EventSinkExt for S {}

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode event payload: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("no subscriber is listening for events")]
    NoSubscribers,
    #[error("event sink rejected message: {0}")]
    Rejected(String),
}

/// A publish attempt captured by [`RecordingEventSink`].
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedEvent {
    pub subject: String,
    pub payload: Value,
    pub delivered: bool,
}

#[derive(Debug, Clone, Default)]
enum FailureMode {
    #[default]
    Never,
    Subjects(HashSet<String>),
    Always,
}

/// In-memory sink that records every publish attempt in order.
///
/// It can be configured to reject some or all subjects to exercise the
/// failure paths of callers.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<PublishedEvent>>,
    failure: FailureMode,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rejects publishes to the listed subjects.
    pub fn failing_on(subjects: &[&str]) -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            failure: FailureMode::Subjects(subjects.iter().map(|s| s.to_string()).collect()),
        }
    }

    /// Rejects every publish.
    pub fn failing() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            failure: FailureMode::Always,
        }
    }

    /// Returns every attempt, delivered or not.
    pub fn events(&self) -> Vec<PublishedEvent> {
        self.lock().clone()
    }

    /// Returns the attempted subjects in order.
    pub fn subjects(&self) -> Vec<String> {
        self.lock().iter().map(|event| event.subject.clone()).collect()
    }

    pub fn attempts(&self) -> usize {
        self.lock().len()
    }

    fn rejects(&self, subject: &str) -> bool {
        match &self.failure {
            FailureMode::Never => false,
            FailureMode::Subjects(subjects) => subjects.contains(subject),
            FailureMode::Always => true,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<PublishedEvent>> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EventSink for RecordingEventSink {
    fn publish_value(&self, subject: &str, payload: Value) -> Result<(), PublishError> {
        let delivered = !self.rejects(subject);
        self.lock().push(PublishedEvent {
            subject: subject.to_string(),
            payload,
            delivered,
        });

        if delivered {
            Ok(())
        } else {
            Err(PublishError::Rejected(format!("subject {subject} is configured to fail")))
        }
    }
}
