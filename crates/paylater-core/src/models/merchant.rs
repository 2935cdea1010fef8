use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Merchant {
    pub id: i64,
    pub name: String,
    pub fee_percentage: f64,
    pub created_at: String,
}

/// Body of merchant create/update requests and their responses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MerchantSummary {
    pub name: String,
    pub fee_percentage: f64,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct FeeUpdate {
    pub fee_percentage: f64,
}
