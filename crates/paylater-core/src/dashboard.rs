//! Display figures for the dashboard.
//!
//! Everything here is derived from data the service already returned; no
//! credit decision is made on the client.

use crate::models::{Transaction, User};

/// Number of transactions shown in the dashboard's recent list
pub const RECENT_TRANSACTIONS: usize = 10;

#[derive(Debug, Clone, PartialEq)]
pub struct DashboardSummary {
    pub credit_limit: f64,
    pub dues: f64,
    /// Credit left for display, never below zero
    pub available_credit: f64,
    pub successful: usize,
    pub rejected: usize,
}

impl DashboardSummary {
    pub fn new(profile: &User, dues: f64, transactions: &[Transaction]) -> Self {
        Self {
            credit_limit: profile.credit_limit,
            dues,
            available_credit: (profile.credit_limit - dues).max(0.0),
            successful: transactions.iter().filter(|t| t.is_success()).count(),
            rejected: transactions.iter().filter(|t| t.is_rejected()).count(),
        }
    }

    /// Share of the credit limit in use, 0.0 to 1.0
    pub fn utilization(&self) -> f64 {
        if self.credit_limit <= 0.0 {
            if self.dues > 0.0 {
                1.0
            } else {
                0.0
            }
        } else {
            (self.dues / self.credit_limit).clamp(0.0, 1.0)
        }
    }
}

/// Most recent transactions first, capped at `limit`.
pub fn recent_transactions(transactions: &[Transaction], limit: usize) -> Vec<&Transaction> {
    let mut sorted: Vec<&Transaction> = transactions.iter().collect();
    // Timestamps share one format, so string order is time order; id breaks ties
    sorted.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.cmp(&a.id))
    });
    sorted.truncate(limit);
    sorted
}
