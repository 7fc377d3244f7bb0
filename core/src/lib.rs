//! Client-side orchestration for a marketplace where every listing is its own
//! deployed contract instance: argument encoding, transaction building, group
//! commitment, and listing discovery from indexed ledger state.

pub mod address;
pub mod builder;
pub mod codec;
pub mod config;
pub mod discovery;
pub mod error;
pub mod marketplace;
pub mod models;
pub mod services;
pub mod state;
pub mod transaction;

pub use address::Address;
pub use builder::Programs;
pub use config::Config;
pub use discovery::Discovery;
pub use error::{MarketError, Result, ValidationError};
pub use marketplace::Marketplace;
pub use models::{Listing, NewListing};
