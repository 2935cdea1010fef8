//! Data models for PayLater entities.
//!
//! These mirror the JSON bodies of the PayLater service:
//!
//! - `User`, `UserIdentity`, `NewUser`: accounts and the identity snapshot kept in a session
//! - `Merchant`, `MerchantSummary`: onboarded merchants and their fee percentage
//! - `Transaction`, `TransactionStatus`, `TransactionOutcome`: purchases
//! - `PaybackReceipt`: result of paying back dues
//! - Report types: `FeeReport`, `DuesReport`, `TotalDuesReport`

pub mod merchant;
pub mod payback;
pub mod report;
pub mod transaction;
pub mod user;

pub use merchant::{Merchant, MerchantSummary};
pub use payback::{NewPayback, PaybackReceipt};
pub use report::{DuesReport, FeeReport, ServiceInfo, TotalDuesReport};
pub use transaction::{NewTransaction, Transaction, TransactionOutcome, TransactionStatus};
pub use user::{AccessToken, LoginRequest, NewUser, User, UserIdentity};
