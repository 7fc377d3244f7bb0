//! Unsigned transactions and their canonical MessagePack form.
//!
//! The ledger hashes exactly these bytes for transaction ids and group ids, so
//! encoding is strict: keys sorted, empty fields omitted, smallest integer widths.

use data_encoding::BASE32_NOPAD;
use rmp::encode::{self, ValueWriteError};
use sha2::{Digest, Sha512_256};

use crate::address::Address;

const TX_TAG: &[u8] = b"TX";
const GROUP_TAG: &[u8] = b"TG";
/// Signature bytes a signed transaction carries on top of the unsigned encoding.
const SIGNATURE_OVERHEAD: u64 = 75;

/// Network parameters supplied by the node, used as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SuggestedParams {
    pub fee: u64,
    pub min_fee: u64,
    pub flat_fee: bool,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OnComplete {
    NoOp = 0,
    DeleteApplication = 5,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StateSchema {
    pub num_uint: u64,
    pub num_byte_slice: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplicationCall {
    /// Zero for creation.
    pub app_id: u64,
    pub on_complete: OnComplete,
    pub args: Vec<Vec<u8>>,
    pub approval_program: Vec<u8>,
    pub clear_program: Vec<u8>,
    pub global_schema: StateSchema,
    pub local_schema: StateSchema,
}

impl ApplicationCall {
    pub fn call(app_id: u64, args: Vec<Vec<u8>>) -> Self {
        Self {
            app_id,
            on_complete: OnComplete::NoOp,
            args,
            approval_program: Vec::new(),
            clear_program: Vec::new(),
            global_schema: StateSchema::default(),
            local_schema: StateSchema::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionKind {
    Payment { receiver: Address, amount: u64 },
    ApplicationCall(ApplicationCall),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transaction {
    pub sender: Address,
    pub fee: u64,
    pub first_valid: u64,
    pub last_valid: u64,
    pub genesis_id: String,
    pub genesis_hash: [u8; 32],
    pub note: Vec<u8>,
    pub group: Option<[u8; 32]>,
    pub kind: TransactionKind,
}

enum Field<'a> {
    Uint(u64),
    Str(&'a str),
    Bin(&'a [u8]),
    BinArray(&'a [Vec<u8>]),
    Schema(StateSchema),
}

impl Field<'_> {
    fn is_empty(&self) -> bool {
        match self {
            Field::Uint(v) => *v == 0,
            Field::Str(s) => s.is_empty(),
            Field::Bin(b) => b.is_empty(),
            Field::BinArray(a) => a.is_empty(),
            Field::Schema(s) => *s == StateSchema::default(),
        }
    }

    fn write(&self, buf: &mut Vec<u8>) -> Result<(), ValueWriteError> {
        match self {
            Field::Uint(v) => {
                encode::write_uint(buf, *v)?;
            }
            Field::Str(s) => encode::write_str(buf, s)?,
            Field::Bin(b) => encode::write_bin(buf, b)?,
            Field::BinArray(items) => {
                encode::write_array_len(buf, items.len() as u32)?;
                for item in items.iter() {
                    encode::write_bin(buf, item)?;
                }
            }
            Field::Schema(schema) => write_map(
                buf,
                vec![
                    ("nbs", Field::Uint(schema.num_byte_slice)),
                    ("nui", Field::Uint(schema.num_uint)),
                ],
            )?,
        }
        Ok(())
    }
}

fn write_map(buf: &mut Vec<u8>, mut fields: Vec<(&str, Field<'_>)>) -> Result<(), ValueWriteError> {
    fields.retain(|(_, field)| !field.is_empty());
    fields.sort_by(|a, b| a.0.cmp(b.0));

    encode::write_map_len(buf, fields.len() as u32)?;
    for (key, field) in &fields {
        encode::write_str(buf, key)?;
        field.write(buf)?;
    }
    Ok(())
}

fn sha512_256(tag: &[u8], body: &[u8]) -> [u8; 32] {
    let mut hasher = Sha512_256::new();
    hasher.update(tag);
    hasher.update(body);
    hasher.finalize().into()
}

impl Transaction {
    pub fn new(sender: Address, params: &SuggestedParams, kind: TransactionKind) -> Self {
        Self {
            sender,
            fee: params.fee,
            first_valid: params.first_valid,
            last_valid: params.last_valid,
            genesis_id: params.genesis_id.clone(),
            genesis_hash: params.genesis_hash,
            note: Vec::new(),
            group: None,
            kind,
        }
    }

    pub fn with_note(mut self, note: impl Into<Vec<u8>>) -> Self {
        self.note = note.into();
        self
    }

    /// Sets the fee from the node's parameters: flat fees are taken verbatim,
    /// per-byte fees are scaled by the signed size and floored at the minimum.
    pub fn with_fee(mut self, params: &SuggestedParams) -> Result<Self, ValueWriteError> {
        if params.flat_fee {
            self.fee = params.fee;
        } else {
            self.fee = 0;
            let size = self.encode()?.len() as u64 + SIGNATURE_OVERHEAD;
            self.fee = params.fee.saturating_mul(size).max(params.min_fee);
        }
        Ok(self)
    }

    pub fn type_tag(&self) -> &'static str {
        match self.kind {
            TransactionKind::Payment { .. } => "pay",
            TransactionKind::ApplicationCall(_) => "appl",
        }
    }

    /// Canonical MessagePack bytes, the form handed to the signer.
    pub fn encode(&self) -> Result<Vec<u8>, ValueWriteError> {
        let group = self.group.as_ref().map_or(&[][..], |g| &g[..]);

        let mut fields = vec![
            ("fee", Field::Uint(self.fee)),
            ("fv", Field::Uint(self.first_valid)),
            ("lv", Field::Uint(self.last_valid)),
            ("gen", Field::Str(&self.genesis_id)),
            ("gh", Field::Bin(&self.genesis_hash)),
            ("grp", Field::Bin(group)),
            ("note", Field::Bin(&self.note)),
            ("snd", Field::Bin(self.sender.as_bytes())),
            ("type", Field::Str(self.type_tag())),
        ];
        match &self.kind {
            TransactionKind::Payment { receiver, amount } => {
                fields.push(("amt", Field::Uint(*amount)));
                fields.push(("rcv", Field::Bin(receiver.as_bytes())));
            }
            TransactionKind::ApplicationCall(call) => {
                fields.push(("apid", Field::Uint(call.app_id)));
                fields.push(("apan", Field::Uint(call.on_complete as u64)));
                fields.push(("apaa", Field::BinArray(&call.args)));
                fields.push(("apap", Field::Bin(&call.approval_program)));
                fields.push(("apsu", Field::Bin(&call.clear_program)));
                fields.push(("apgs", Field::Schema(call.global_schema)));
                fields.push(("apls", Field::Schema(call.local_schema)));
            }
        }

        let mut buf = Vec::with_capacity(256);
        write_map(&mut buf, fields)?;
        Ok(buf)
    }

    pub fn raw_id(&self) -> Result<[u8; 32], ValueWriteError> {
        Ok(sha512_256(TX_TAG, &self.encode()?))
    }

    pub fn id(&self) -> Result<String, ValueWriteError> {
        Ok(BASE32_NOPAD.encode(&self.raw_id()?))
    }
}

/// Computes the group commitment over the ordered transactions and stamps it on each.
pub fn assign_group_id(txns: &mut [Transaction]) -> Result<[u8; 32], ValueWriteError> {
    let mut ids = Vec::with_capacity(txns.len());
    for txn in txns.iter_mut() {
        txn.group = None;
        ids.push(txn.raw_id()?.to_vec());
    }

    let mut buf = Vec::with_capacity(16 + 34 * ids.len());
    write_map(&mut buf, vec![("txlist", Field::BinArray(&ids))])?;
    let group = sha512_256(GROUP_TAG, &buf);

    for txn in txns.iter_mut() {
        txn.group = Some(group);
    }
    Ok(group)
}
