//! Terminal input and output for the PayLater client.
//!
//! - `table`: column-aligned plain-text tables
//! - `styles`: message prefixes and stat lines shared by all pages
//! - `prompt`: line and hidden-password input (`rpassword`)

pub mod prompt;
pub mod styles;
pub mod table;

pub use styles::{danger, heading, notice, stat, success, warning};
pub use table::{Align, Table};
