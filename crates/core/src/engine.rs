use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::events::{EventSink, EventSinkExt, LIFECYCLE_SUBJECTS};
use crate::repository::{InvestmentRepository, RepositoryError};
use crate::types::Investment;

pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Sole write path for investments, plus the validated read façade.
///
/// The engine owns no mutable state of its own; all sharing happens inside the
/// repository, so clones are cheap and may be used from any task.
#[derive(Clone)]
pub struct InvestmentEngine {
    repository: Arc<dyn InvestmentRepository>,
    sink: Arc<dyn EventSink>,
    clock: Clock,
}

impl InvestmentEngine {
    pub fn new(repository: Arc<dyn InvestmentRepository>, sink: Arc<dyn EventSink>) -> Self {
        Self {
            repository,
            sink,
            clock: Arc::new(Utc::now),
        }
    }

    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> DateTime<Utc> {
        (self.clock)()
    }

    /// Validates, persists and announces a new investment.
    ///
    /// Once the record is stored the call succeeds, whatever happens to the
    /// lifecycle events afterwards.
    pub fn create_investment(
        &self,
        customer_id: &str,
        fund_id: &str,
        amount: f64,
    ) -> Result<Investment, EngineError> {
        if customer_id.is_empty() {
            warn!(stage = "engine", "missing customer id in creation request");
            return Err(EngineError::MissingCustomerId);
        }
        if fund_id.is_empty() {
            warn!(stage = "engine", %customer_id, "missing fund id in creation request");
            return Err(EngineError::MissingFundId);
        }
        if !(amount.is_finite() && amount > 0.0) {
            warn!(stage = "engine", %customer_id, %fund_id, amount, "invalid transaction amount in creation request");
            return Err(EngineError::NonPositiveAmount);
        }

        let investment = Investment::pending(
            Uuid::new_v4().to_string(),
            customer_id,
            fund_id,
            amount,
            self.now(),
        );

        if let Err(err) = self.repository.create(investment.clone()) {
            error!(stage = "engine", investment_id = %investment.id, error = %err, "failed to persist investment");
            return Err(EngineError::Storage(err));
        }
        info!(
            stage = "engine",
            investment_id = %investment.id,
            %customer_id,
            %fund_id,
            amount,
            status = investment.status.as_str(),
            "investment created"
        );

        self.announce(&investment);
        Ok(investment)
    }

    /// Publishes every lifecycle subject in order. Each failure is logged and skipped.
    fn announce(&self, investment: &Investment) {
        for subject in LIFECYCLE_SUBJECTS {
            match self.sink.publish(subject, investment) {
                Ok(()) => {
                    debug!(stage = "engine", investment_id = %investment.id, subject, "event published")
                }
                Err(err) => error!(
                    stage = "engine",
                    investment_id = %investment.id,
                    subject,
                    error = %err,
                    "failed to publish investment event"
                ),
            }
        }
    }

    pub fn get_investment_by_id(&self, id: &str) -> Result<Investment, EngineError> {
        if id.is_empty() {
            warn!(stage = "engine", "missing investment id in lookup");
            return Err(EngineError::MissingId);
        }
        self.repository.get_by_id(id).map_err(EngineError::from)
    }

    pub fn get_investments_by_customer_id(
        &self,
        customer_id: &str,
    ) -> Result<Vec<Investment>, EngineError> {
        if customer_id.is_empty() {
            warn!(stage = "engine", "missing customer id in lookup");
            return Err(EngineError::MissingCustomerId);
        }
        self.repository
            .get_by_customer_id(customer_id)
            .map_err(EngineError::from)
    }
}

/// Failures returned by [`InvestmentEngine`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("customer id is required")]
    MissingCustomerId,
    #[error("fund id is required")]
    MissingFundId,
    #[error("investment id is required")]
    MissingId,
    #[error("transaction amount must be greater than 0")]
    NonPositiveAmount,
    #[error("investment with id {0} not found")]
    NotFound(String),
    #[error("investment storage failure: {0}")]
    Storage(RepositoryError),
}

impl EngineError {
    /// Stable snake_case label for problem types and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MissingCustomerId => "missing_customer_id",
            Self::MissingFundId => "missing_fund_id",
            Self::MissingId => "missing_id",
            Self::NonPositiveAmount => "non_positive_amount",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_failure",
        }
    }

    /// Returns `true` when the caller supplied an invalid request.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

impl From<RepositoryError> for EngineError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(id) => Self::NotFound(id),
            other => Self::Storage(other),
        }
    }
}
