use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;
use wear_core::{
    error::{BoxError, ConfirmationError},
    models::{Confirmation, PendingInfo},
    services::Algod,
    transaction::{OnComplete, SuggestedParams},
};

use crate::http::{read_json, ApiError, Endpoint};

pub const TESTNET_ALGOD: &str = "https://testnet-api.algonode.cloud";
const TOKEN_HEADER: &str = "X-Algo-API-Token";
/// Rounds a transaction stays valid after the node's current round.
const VALIDITY_WINDOW: u64 = 1000;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct TransactionParams {
    fee: u64,
    min_fee: u64,
    genesis_id: String,
    genesis_hash: String,
    last_round: u64,
}

impl TryFrom<TransactionParams> for SuggestedParams {
    type Error = BoxError;

    fn try_from(params: TransactionParams) -> Result<Self, Self::Error> {
        let genesis_hash: [u8; 32] = STANDARD
            .decode(&params.genesis_hash)?
            .try_into()
            .map_err(|_| "genesis hash must be 32 bytes")?;
        Ok(SuggestedParams {
            fee: params.fee,
            min_fee: params.min_fee,
            flat_fee: false,
            first_valid: params.last_round,
            last_valid: params.last_round + VALIDITY_WINDOW,
            genesis_id: params.genesis_id,
            genesis_hash,
        })
    }
}

#[derive(Debug, Deserialize)]
struct CompileResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubmitResponse {
    tx_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct NodeStatus {
    last_round: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PendingResponse {
    confirmed_round: Option<u64>,
    #[serde(default)]
    pool_error: String,
    application_index: Option<u64>,
    #[serde(default)]
    txn: SignedTxn,
}

#[derive(Debug, Default, Deserialize)]
struct SignedTxn {
    #[serde(default)]
    txn: TxnFields,
}

#[derive(Debug, Default, Deserialize)]
struct TxnFields {
    apid: Option<u64>,
    apan: Option<u64>,
}

impl From<PendingResponse> for PendingInfo {
    fn from(pending: PendingResponse) -> Self {
        let deleted = pending.txn.txn.apan == Some(OnComplete::DeleteApplication as u64);
        PendingInfo {
            confirmed_round: pending.confirmed_round.filter(|round| *round > 0),
            pool_error: pending.pool_error,
            created_application_id: pending.application_index.filter(|id| *id > 0),
            deleted_application_id: if deleted { pending.txn.txn.apid } else { None },
        }
    }
}

/// A 404 from the pending pool means the node has not seen the transaction yet.
fn not_seen_yet(err: &BoxError) -> bool {
    err.downcast_ref::<ApiError>()
        .is_some_and(|api| api.status == StatusCode::NOT_FOUND)
}

pub struct AlgodClient {
    endpoint: Endpoint,
}

impl AlgodClient {
    pub fn new() -> Self {
        Self::new_with_endpoint(TESTNET_ALGOD, None)
    }

    pub fn new_with_endpoint(endpoint: &str, token: Option<String>) -> Self {
        Self { endpoint: Endpoint::new(endpoint, TOKEN_HEADER, token) }
    }

    async fn status(&self) -> Result<NodeStatus, BoxError> {
        read_json(self.endpoint.get("/v2/status").send().await?).await
    }

    async fn pending(&self, tx_id: &str) -> Result<PendingResponse, BoxError> {
        let path = format!("/v2/transactions/pending/{tx_id}?format=json");
        read_json(self.endpoint.get(&path).send().await?).await
    }

    async fn wait_for_block_after(&self, round: u64) -> Result<NodeStatus, BoxError> {
        let path = format!("/v2/status/wait-for-block-after/{round}");
        read_json(self.endpoint.get(&path).send().await?).await
    }
}

impl Default for AlgodClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Algod for AlgodClient {
    async fn suggested_params(&self) -> Result<SuggestedParams, BoxError> {
        let params: TransactionParams =
            read_json(self.endpoint.get("/v2/transactions/params").send().await?).await?;
        params.try_into()
    }

    async fn compile(&self, source: &str) -> Result<Vec<u8>, BoxError> {
        let response: CompileResponse = read_json(
            self.endpoint
                .post("/v2/teal/compile")
                .header("Content-Type", "application/x-binary")
                .body(source.to_string())
                .send()
                .await?,
        )
        .await?;
        Ok(STANDARD.decode(response.result)?)
    }

    async fn submit(&self, signed: &[Vec<u8>]) -> Result<String, BoxError> {
        let response: SubmitResponse = read_json(
            self.endpoint
                .post("/v2/transactions")
                .header("Content-Type", "application/x-binary")
                .body(signed.concat())
                .send()
                .await?,
        )
        .await?;
        Ok(response.tx_id)
    }

    /// Polls the pending pool once per round, for at most `max_rounds` rounds.
    async fn await_confirmation(&self, tx_id: &str, max_rounds: u64) -> Result<Confirmation, ConfirmationError> {
        let status = self.status().await.map_err(ConfirmationError::Transport)?;
        let start = status.last_round + 1;
        let mut round = start;

        while round < start + max_rounds {
            match self.pending(tx_id).await {
                Ok(pending) => {
                    if let Some(confirmed_round) = pending.confirmed_round.filter(|r| *r > 0) {
                        return Ok(Confirmation { confirmed_round });
                    }
                    if !pending.pool_error.is_empty() {
                        return Err(ConfirmationError::Rejected {
                            tx_id: tx_id.to_string(),
                            reason: pending.pool_error,
                        });
                    }
                }
                Err(err) if not_seen_yet(&err) => debug!(tx_id, "transaction not in the pending pool yet"),
                Err(err) => return Err(ConfirmationError::Transport(err)),
            }

            self.wait_for_block_after(round)
                .await
                .map_err(ConfirmationError::Transport)?;
            round += 1;
        }

        Err(ConfirmationError::Timeout { tx_id: tx_id.to_string(), rounds: max_rounds })
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingInfo, BoxError> {
        Ok(self.pending(tx_id).await?.into())
    }
}
