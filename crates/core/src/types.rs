use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A customer's placement of money into a fund.
///
/// The record is the payload of every lifecycle event, so its JSON shape is part
/// of the public contract with downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Investment {
    pub id: String,
    pub customer_id: String,
    pub fund_id: String,
    pub amount: f64,
    pub status: InvestmentStatus,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl Investment {
    /// Builds a freshly created record awaiting external validation.
    pub fn pending(
        id: impl Into<String>,
        customer_id: impl Into<String>,
        fund_id: impl Into<String>,
        amount: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: id.into(),
            customer_id: customer_id.into(),
            fund_id: fund_id.into(),
            amount,
            status: InvestmentStatus::Pending,
            created_at,
            completed_at: None,
            failure_reason: None,
        }
    }
}

/// Lifecycle status of an investment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvestmentStatus {
    Pending,
    Completed,
    Failed,
}

impl InvestmentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}
