//! Domain layer for investment creation and lookup.
//!
//! The crate hosts the [`Investment`] record, the seams the engine depends on
//! ([`InvestmentRepository`], [`EventSink`]) and the [`InvestmentEngine`]
//! that ties them together. Concrete storage and transport live in other crates.

pub mod engine;
pub mod events;
pub mod repository;
pub mod types;

pub use engine::{Clock, EngineError, InvestmentEngine};
pub use events::{
    EventSink, EventSinkExt, PublishError, PublishedEvent, RecordingEventSink,
    LIFECYCLE_SUBJECTS, SUBJECT_CREATED, SUBJECT_PROCESSED, SUBJECT_VALIDATION_PENDING,
};
pub use repository::{InvestmentRepository, RepositoryError};
pub use types::{Investment, InvestmentStatus};
