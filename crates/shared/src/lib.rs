#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Plangate Shared Types and Utilities
//!
//! Types and database helpers shared by the API server and the billing crate.

pub mod db;
pub mod types;

pub use db::*;
pub use types::*;
