//! HTTP implementations of the node and indexer capabilities.

mod algod;
mod http;
mod indexer;

pub use algod::{AlgodClient, TESTNET_ALGOD};
pub use http::ApiError;
pub use indexer::{IndexerClient, TESTNET_INDEXER};
