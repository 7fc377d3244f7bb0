#![allow(dead_code)]

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use data_encoding::BASE32_NOPAD;
use rmpv::Value;
use sha2::{Digest, Sha512_256};
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
};
use wear_core::{
    codec::{decode_uint64, utf8_to_base64},
    error::{BoxError, ConfirmationError},
    models::{
        ApplicationInfo, ApplicationParams, Confirmation, IndexedTransaction, PendingInfo, TealKeyValue,
        TealValue, TransactionPage, TransactionQuery,
    },
    services::{Algod, Indexer, Signer},
    transaction::SuggestedParams,
    Address,
};

pub const NOTE: &str = "wear:uv3";
pub const MIN_ROUND: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmMode {
    #[default]
    Confirm,
    Timeout,
}

#[derive(Debug, Clone)]
struct StoredApp {
    creator: Address,
    deleted: bool,
    state: BTreeMap<String, TealValue>,
}

#[derive(Debug)]
struct Created {
    id: String,
    note: Vec<u8>,
    round: u64,
    app_id: Option<u64>,
}

#[derive(Debug, Default)]
struct LedgerState {
    round: u64,
    next_app_id: u64,
    apps: BTreeMap<u64, StoredApp>,
    history: Vec<Created>,
    pending: HashMap<String, PendingInfo>,
    unavailable: HashSet<u64>,
    malformed: HashSet<u64>,
    submissions: usize,
    payments: Vec<(Address, u64)>,
    confirm_mode: ConfirmMode,
    pending_unavailable: bool,
    page_size: usize,
}

/// In-memory node + indexer that interprets submitted MessagePack the way the
/// deployed marketplace contract would.
#[derive(Clone)]
pub struct FakeLedger(Arc<Mutex<LedgerState>>);

impl Default for FakeLedger {
    fn default() -> Self {
        Self(Arc::new(Mutex::new(LedgerState {
            round: MIN_ROUND,
            next_app_id: 1000,
            page_size: 2,
            ..LedgerState::default()
        })))
    }
}

pub fn params() -> SuggestedParams {
    SuggestedParams {
        fee: 0,
        min_fee: 1000,
        flat_fee: false,
        first_valid: MIN_ROUND,
        last_valid: MIN_ROUND + 1000,
        genesis_id: "testnet-v1.0".into(),
        genesis_hash: [7; 32],
    }
}

fn field<'a>(txn: &'a Value, key: &str) -> Option<&'a Value> {
    txn.as_map()?
        .iter()
        .find(|(k, _)| k.as_str() == Some(key))
        .map(|(_, v)| v)
}

fn uint(txn: &Value, key: &str) -> u64 {
    field(txn, key).and_then(Value::as_u64).unwrap_or(0)
}

fn bytes(txn: &Value, key: &str) -> Vec<u8> {
    field(txn, key).and_then(Value::as_slice).map(<[u8]>::to_vec).unwrap_or_default()
}

fn address(txn: &Value, key: &str) -> Address {
    let raw: [u8; 32] = bytes(txn, key).try_into().expect("32-byte address");
    Address::new(raw)
}

fn args(txn: &Value) -> Vec<Vec<u8>> {
    field(txn, "apaa")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(Value::as_slice).map(<[u8]>::to_vec).collect())
        .unwrap_or_default()
}

fn tagged_hash(tag: &[u8], body: &[u8]) -> Vec<u8> {
    let mut hasher = Sha512_256::new();
    hasher.update(tag);
    hasher.update(body);
    hasher.finalize().to_vec()
}

fn tx_id(encoded: &[u8]) -> String {
    BASE32_NOPAD.encode(&tagged_hash(b"TX", encoded))
}

fn write(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    rmpv::encode::write_value(&mut buf, value).expect("in-memory write");
    buf
}

/// Recomputes the group commitment from the legs themselves: each leg is
/// re-encoded without `grp`, hashed under "TX", and the ordered ids are
/// hashed under "TG" as `{"txlist": [...]}`.
fn expected_group(txns: &[(Value, String)]) -> Vec<u8> {
    let ids = txns
        .iter()
        .map(|(txn, _)| {
            let ungrouped: Vec<(Value, Value)> = txn
                .as_map()
                .map(|entries| entries.iter().filter(|(k, _)| k.as_str() != Some("grp")).cloned().collect())
                .unwrap_or_default();
            Value::Binary(tagged_hash(b"TX", &write(&Value::Map(ungrouped))))
        })
        .collect();
    let txlist = Value::Map(vec![(Value::from("txlist"), Value::Array(ids))]);
    tagged_hash(b"TG", &write(&txlist))
}

impl FakeLedger {
    pub fn set_confirm_mode(&self, mode: ConfirmMode) {
        self.0.lock().unwrap().confirm_mode = mode;
    }

    /// Makes pending-pool lookups fail while confirmation still succeeds.
    pub fn make_pending_unavailable(&self) {
        self.0.lock().unwrap().pending_unavailable = true;
    }

    pub fn submissions(&self) -> usize {
        self.0.lock().unwrap().submissions
    }

    pub fn payments(&self) -> Vec<(Address, u64)> {
        self.0.lock().unwrap().payments.clone()
    }

    pub fn make_unavailable(&self, app_id: u64) {
        self.0.lock().unwrap().unavailable.insert(app_id);
    }

    pub fn make_malformed(&self, app_id: u64) {
        self.0.lock().unwrap().malformed.insert(app_id);
    }

    /// Records an application call that carries the note but created nothing.
    pub fn record_plain_call(&self) {
        let mut ledger = self.0.lock().unwrap();
        ledger.round += 1;
        let round = ledger.round;
        ledger.history.push(Created {
            id: format!("CALL{round}"),
            note: NOTE.as_bytes().to_vec(),
            round,
            app_id: None,
        });
    }

    /// Records a creation below the discovery round floor.
    pub fn record_old_creation(&self, app_id: u64) {
        self.0.lock().unwrap().history.push(Created {
            id: format!("OLD{app_id}"),
            note: NOTE.as_bytes().to_vec(),
            round: MIN_ROUND - 1,
            app_id: Some(app_id),
        });
    }

    fn apply(ledger: &mut LedgerState, txns: &[(Value, String)]) -> Result<Option<PendingInfo>, String> {
        let (first, _) = &txns[0];
        let sender = address(first, "snd");

        if txns.len() == 2 {
            let (payment, _) = &txns[1];
            let group = bytes(first, "grp");
            if group.len() != 32 || group != bytes(payment, "grp") {
                return Err("group id missing or mismatched".into());
            }
            if group != expected_group(txns) {
                return Err("group id does not commit to its transactions".into());
            }
            let app_id = uint(first, "apid");
            let app = ledger.apps.get_mut(&app_id).ok_or("no such application")?;
            let stock = app.state["_stock"].uint;
            let price = app.state["_amount"].uint - app.state["_discount"].uint;
            let ok = args(first) == vec![b"buy".to_vec()]
                && field(payment, "type").and_then(Value::as_str) == Some("pay")
                && address(payment, "rcv") == app.creator
                && address(payment, "snd") == sender
                && uint(payment, "amt") == price
                && stock > 0;
            if !ok {
                return Err("logic eval error: assert failed".into());
            }
            app.state.insert("_stock".into(), TealValue::uint(stock - 1));
            ledger.payments.push((address(payment, "rcv"), uint(payment, "amt")));
            return Ok(None);
        }

        if field(first, "type").and_then(Value::as_str) != Some("appl") {
            return Err("unexpected transaction type".into());
        }
        let app_id = uint(first, "apid");
        let args = args(first);

        if app_id == 0 {
            let note = bytes(first, "note");
            if note != NOTE.as_bytes() || args.len() != 6 || decode_uint64(&args[3]).unwrap_or(0) == 0 {
                return Err("creation rejected".into());
            }
            let app_id = ledger.next_app_id;
            ledger.next_app_id += 1;

            let mut state = BTreeMap::new();
            state.insert("_creator".into(), TealValue::bytes(STANDARD.encode(sender.as_bytes())));
            state.insert("_name".into(), TealValue::bytes(STANDARD.encode(&args[0])));
            state.insert("_description".into(), TealValue::bytes(STANDARD.encode(&args[1])));
            state.insert("_image".into(), TealValue::bytes(STANDARD.encode(&args[2])));
            state.insert("_amount".into(), TealValue::uint(decode_uint64(&args[3]).unwrap()));
            state.insert("_stock".into(), TealValue::uint(decode_uint64(&args[4]).unwrap()));
            state.insert("_discount".into(), TealValue::uint(decode_uint64(&args[5]).unwrap()));
            ledger.apps.insert(app_id, StoredApp { creator: sender, deleted: false, state });

            let round = ledger.round;
            ledger.history.push(Created {
                id: txns[0].1.clone(),
                note,
                round,
                app_id: Some(app_id),
            });
            return Ok(Some(PendingInfo {
                created_application_id: Some(app_id),
                ..PendingInfo::default()
            }));
        }

        let app = ledger.apps.get_mut(&app_id).ok_or("no such application")?;
        if app.creator != sender {
            return Err("sender is not the creator".into());
        }
        if uint(first, "apan") == 5 {
            app.deleted = true;
            return Ok(Some(PendingInfo {
                deleted_application_id: Some(app_id),
                ..PendingInfo::default()
            }));
        }
        match args.first().map(Vec::as_slice) {
            Some(b"change_discount") if args.len() == 2 => {
                let discount = decode_uint64(&args[1]).ok_or("bad discount")?;
                app.state.insert("_discount".into(), TealValue::uint(discount));
            }
            Some(b"update-stock") if args.len() == 2 => {
                let stock = decode_uint64(&args[1]).ok_or("bad stock")?;
                if stock == 0 {
                    return Err("stock must be positive".into());
                }
                app.state.insert("_stock".into(), TealValue::uint(stock));
            }
            _ => return Err("unknown method".into()),
        }
        Ok(None)
    }
}

#[async_trait]
impl Algod for FakeLedger {
    async fn suggested_params(&self) -> Result<SuggestedParams, BoxError> {
        Ok(params())
    }

    async fn compile(&self, source: &str) -> Result<Vec<u8>, BoxError> {
        Ok(source.as_bytes().to_vec())
    }

    async fn submit(&self, signed: &[Vec<u8>]) -> Result<String, BoxError> {
        let mut ledger = self.0.lock().unwrap();
        ledger.submissions += 1;

        let mut txns = Vec::with_capacity(signed.len());
        for raw in signed {
            let value = rmpv::decode::read_value(&mut &raw[..])?;
            txns.push((value, tx_id(raw)));
        }
        let first_id = txns[0].1.clone();

        let info = Self::apply(&mut ledger, &txns)?;
        ledger.round += 1;
        let round = ledger.round;
        ledger.pending.insert(
            first_id.clone(),
            PendingInfo {
                confirmed_round: Some(round),
                ..info.unwrap_or_default()
            },
        );
        Ok(first_id)
    }

    async fn await_confirmation(&self, tx_id: &str, max_rounds: u64) -> Result<Confirmation, ConfirmationError> {
        let ledger = self.0.lock().unwrap();
        if ledger.confirm_mode == ConfirmMode::Timeout {
            return Err(ConfirmationError::Timeout { tx_id: tx_id.to_string(), rounds: max_rounds });
        }
        match ledger.pending.get(tx_id).and_then(|p| p.confirmed_round) {
            Some(confirmed_round) => Ok(Confirmation { confirmed_round }),
            None => Err(ConfirmationError::Rejected {
                tx_id: tx_id.to_string(),
                reason: "unknown transaction".into(),
            }),
        }
    }

    async fn pending_transaction(&self, tx_id: &str) -> Result<PendingInfo, BoxError> {
        let ledger = self.0.lock().unwrap();
        if ledger.pending_unavailable {
            return Err("pending pool unavailable".into());
        }
        ledger.pending.get(tx_id).cloned().ok_or_else(|| "not found".into())
    }
}

#[async_trait]
impl Indexer for FakeLedger {
    async fn search_transactions(&self, query: &TransactionQuery) -> Result<TransactionPage, BoxError> {
        assert_eq!(query.tx_type, "appl");
        let ledger = self.0.lock().unwrap();
        let matching: Vec<IndexedTransaction> = ledger
            .history
            .iter()
            .filter(|t| t.round >= query.min_round && STANDARD.encode(&t.note).starts_with(&query.note_prefix))
            .map(|t| IndexedTransaction { id: t.id.clone(), created_application_index: t.app_id })
            .collect();

        let offset: usize = query.next.as_deref().map(|n| n.parse().unwrap()).unwrap_or(0);
        let end = (offset + ledger.page_size).min(matching.len());
        let transactions = matching.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let next_token = (end < matching.len()).then(|| end.to_string());
        Ok(TransactionPage { transactions, next_token })
    }

    async fn lookup_application(&self, app_id: u64) -> Result<ApplicationInfo, BoxError> {
        let ledger = self.0.lock().unwrap();
        if ledger.unavailable.contains(&app_id) {
            return Err(format!("application {app_id} unavailable").into());
        }
        let app = ledger.apps.get(&app_id).ok_or("application not found")?;

        let mut global_state: Vec<TealKeyValue> = app
            .state
            .iter()
            .map(|(key, value)| TealKeyValue { key: utf8_to_base64(key), value: value.clone() })
            .collect();
        if ledger.malformed.contains(&app_id) {
            for kv in &mut global_state {
                if kv.key == utf8_to_base64("_name") {
                    kv.value = TealValue::bytes("%%% not base64 %%%");
                }
            }
        }

        Ok(ApplicationInfo {
            id: app_id,
            deleted: app.deleted,
            params: ApplicationParams {
                creator: app.creator.to_string(),
                global_state,
            },
        })
    }
}

/// Passes bytes through unchanged and counts how often it was asked to sign.
#[derive(Default)]
pub struct FakeSigner {
    pub calls: AtomicUsize,
    pub reject: bool,
}

impl FakeSigner {
    pub fn rejecting() -> Self {
        Self { calls: AtomicUsize::new(0), reject: true }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Signer for FakeSigner {
    async fn sign(&self, txn: Vec<u8>) -> Result<Vec<u8>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err("user rejected the request".into());
        }
        Ok(txn)
    }

    async fn sign_group(&self, txns: Vec<Vec<u8>>) -> Result<Vec<Vec<u8>>, BoxError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.reject {
            return Err("user rejected the request".into());
        }
        Ok(txns)
    }
}
