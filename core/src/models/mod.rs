use serde::{Deserialize, Serialize};

use crate::address::Address;

// one deployed contract instance, rebuilt from its global state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Listing {
    pub app_id: u64,
    pub owner: Address,
    pub name: String,
    pub image: String,
    pub description: String,
    pub amount: u64,
    pub stock: u64,
    pub discount: u64,
}

impl Listing {
    /// What a buyer pays the owner, `None` when the stored discount exceeds the price.
    pub fn price(&self) -> Option<u64> {
        self.amount.checked_sub(self.discount)
    }

    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

// user input for a new listing, before it becomes a contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewListing {
    pub name: String,
    pub image: String,
    pub description: String,
    pub amount: u64,
    pub stock: u64,
    pub discount: u64,
}

/// Indexer filter for discovery: note prefix (base64), transaction type and round floor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionQuery {
    pub note_prefix: String,
    pub tx_type: &'static str,
    pub min_round: u64,
    pub next: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TransactionPage {
    #[serde(default)]
    pub transactions: Vec<IndexedTransaction>,
    pub next_token: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct IndexedTransaction {
    #[serde(default)]
    pub id: String,
    pub created_application_index: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationInfo {
    pub id: u64,
    #[serde(default)]
    pub deleted: bool,
    pub params: ApplicationParams,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApplicationParams {
    #[serde(default)]
    pub creator: String,
    #[serde(default)]
    pub global_state: Vec<TealKeyValue>,
}

/// One global-state slot as the indexer reports it: base64 key, tagged value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TealKeyValue {
    pub key: String,
    pub value: TealValue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TealValue {
    #[serde(rename = "type")]
    pub kind: u8,
    #[serde(default)]
    pub bytes: String,
    #[serde(default)]
    pub uint: u64,
}

impl TealValue {
    pub const BYTES: u8 = 1;
    pub const UINT: u8 = 2;

    pub fn bytes(base64: impl Into<String>) -> Self {
        Self { kind: Self::BYTES, bytes: base64.into(), uint: 0 }
    }

    pub fn uint(value: u64) -> Self {
        Self { kind: Self::UINT, bytes: String::new(), uint: value }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Confirmation {
    pub confirmed_round: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingInfo {
    pub confirmed_round: Option<u64>,
    pub pool_error: String,
    pub created_application_id: Option<u64>,
    pub deleted_application_id: Option<u64>,
}
