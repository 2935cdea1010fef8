use serde::{Deserialize, Serialize};

/// Outcome the service assigned to a purchase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Rejected,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn label(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Rejected => "rejected",
            TransactionStatus::Unknown => "unknown",
        }
    }

    /// Parse a user-supplied filter value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "success" | "ok" | "approved" => Some(TransactionStatus::Success),
            "rejected" | "declined" => Some(TransactionStatus::Rejected),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: i64,
    pub merchant_id: i64,
    pub amount: f64,
    pub fee_amount: f64,
    pub merchant_payout: f64,
    pub status: TransactionStatus,
    #[serde(default)]
    pub rejection_reason: Option<String>,
    pub created_at: String,
}

impl Transaction {
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }

    pub fn is_rejected(&self) -> bool {
        self.status == TransactionStatus::Rejected
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct NewTransaction {
    pub user_name: String,
    pub merchant_name: String,
    pub amount: f64,
}

/// Response to a new purchase: approved, or rejected with a reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionOutcome {
    pub status: TransactionStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

impl TransactionOutcome {
    pub fn is_success(&self) -> bool {
        self.status == TransactionStatus::Success
    }
}
