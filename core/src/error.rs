use thiserror::Error;

use crate::address::AddressError;

/// Failure type handed back by the external signer, node and indexer capabilities.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

pub type Result<T, E = MarketError> = std::result::Result<T, E>;

/// Local precondition failures. None of these ever reach the network.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("price must be greater than zero")]
    NonPositivePrice,

    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    #[error("discount {discount} must be lower than the price {amount}")]
    DiscountTooHigh { discount: u64, amount: u64 },

    #[error("{field} is not a number: {input:?}")]
    NotANumber { field: &'static str, input: String },

    #[error("{field} does not fit in an unsigned 64-bit integer")]
    OutOfRange { field: &'static str },

    #[error("listing {app_id} is out of stock")]
    SoldOut { app_id: u64 },

    #[error("stock must be greater than zero")]
    ZeroStock,
}

/// Why a single contract instance could not be turned into a listing.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("state value for {key} is not valid base64")]
    Base64 {
        key: &'static str,
        #[source]
        source: base64::DecodeError,
    },

    #[error("state value for {key} is not valid UTF-8")]
    Utf8 {
        key: &'static str,
        #[source]
        source: std::string::FromUtf8Error,
    },

    #[error("state value for {key} has the wrong type")]
    TypeMismatch { key: &'static str },

    #[error("creator address is invalid")]
    Creator(#[from] AddressError),
}

/// Terminal outcomes of waiting on a submitted transaction.
#[derive(Debug, Error)]
pub enum ConfirmationError {
    #[error("transaction {tx_id} not confirmed after {rounds} rounds")]
    Timeout { tx_id: String, rounds: u64 },

    #[error("transaction {tx_id} rejected: {reason}")]
    Rejected { tx_id: String, reason: String },

    #[error("confirmation transport failure")]
    Transport(#[source] BoxError),
}

#[derive(Debug, Error)]
pub enum MarketError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("signing failed")]
    Signing(#[source] BoxError),

    #[error("submission rejected")]
    Submission(#[source] BoxError),

    #[error("transaction {tx_id} not confirmed within {rounds} rounds")]
    ConfirmationTimeout { tx_id: String, rounds: u64 },

    #[error("network request failed")]
    Network(#[source] BoxError),

    #[error("transaction encoding failed")]
    Encode(#[from] rmp::encode::ValueWriteError),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}

impl From<ConfirmationError> for MarketError {
    fn from(err: ConfirmationError) -> Self {
        match err {
            ConfirmationError::Timeout { tx_id, rounds } => {
                MarketError::ConfirmationTimeout { tx_id, rounds }
            }
            ConfirmationError::Rejected { .. } => MarketError::Submission(Box::new(err)),
            ConfirmationError::Transport(source) => MarketError::Network(source),
        }
    }
}

