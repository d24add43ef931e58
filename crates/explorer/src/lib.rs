//! Explorer access for address statistics.
//!
//! The enrichment loop talks to the explorer through the [`AddressSource`]
//! trait so that backends (or test stubs) can be swapped in without touching
//! the loop. [`ExplorerClient`] is the shipped implementation, targeting
//! Etherscan-compatible HTTP APIs.

pub mod client;
pub mod error;
pub mod source;

pub use client::ExplorerClient;
pub use error::{ExplorerError, ExplorerResult};
pub use source::{ActivityWindow, AddressSource, Direction};
