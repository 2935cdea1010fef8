use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct NewPayback {
    pub user_name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaybackReceipt {
    pub user_name: String,
    pub remaining_dues: f64,
}
