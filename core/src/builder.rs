//! Builds the five unsigned transaction shapes the marketplace contract accepts.
//!
//! Argument order and the literal method names are the deployed contract's
//! calling convention and must not change.

use crate::{
    address::Address,
    codec::{encode_str, encode_uint64},
    error::{Result, ValidationError},
    models::{Listing, NewListing},
    services::Algod,
    transaction::{
        assign_group_id, ApplicationCall, OnComplete, StateSchema, SuggestedParams, Transaction,
        TransactionKind,
    },
    MarketError,
};

pub const BUY: &str = "buy";
pub const CHANGE_DISCOUNT: &str = "change_discount";
pub const UPDATE_STOCK: &str = "update-stock";

/// `_amount`, `_stock`, `_discount`
pub const GLOBAL_SCHEMA: StateSchema = StateSchema { num_uint: 3, num_byte_slice: 4 };
pub const LOCAL_SCHEMA: StateSchema = StateSchema { num_uint: 0, num_byte_slice: 0 };

/// Compiled approval and clear-state programs attached to every creation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Programs {
    pub approval: Vec<u8>,
    pub clear: Vec<u8>,
}

impl Programs {
    pub async fn compile<A: Algod>(algod: &A, approval_source: &str, clear_source: &str) -> Result<Self> {
        let approval = algod.compile(approval_source).await.map_err(MarketError::Network)?;
        let clear = algod.compile(clear_source).await.map_err(MarketError::Network)?;
        Ok(Self { approval, clear })
    }
}

pub fn validate_new_listing(listing: &NewListing) -> Result<(), ValidationError> {
    if listing.name.trim().is_empty() {
        return Err(ValidationError::EmptyField("name"));
    }
    if listing.image.trim().is_empty() {
        return Err(ValidationError::EmptyField("image"));
    }
    if listing.description.trim().is_empty() {
        return Err(ValidationError::EmptyField("description"));
    }
    if listing.amount == 0 {
        return Err(ValidationError::NonPositivePrice);
    }
    validate_discount(listing.discount, listing.amount)
}

pub fn validate_discount(discount: u64, amount: u64) -> Result<(), ValidationError> {
    if discount >= amount {
        return Err(ValidationError::DiscountTooHigh { discount, amount });
    }
    Ok(())
}

fn app_call(sender: Address, params: &SuggestedParams, call: ApplicationCall) -> Transaction {
    Transaction::new(sender, params, TransactionKind::ApplicationCall(call))
}

pub fn build_create(
    sender: Address,
    params: &SuggestedParams,
    note: &str,
    listing: &NewListing,
    programs: &Programs,
) -> Result<Transaction> {
    validate_new_listing(listing)?;

    let args = vec![
        encode_str(&listing.name),
        encode_str(&listing.description),
        encode_str(&listing.image),
        encode_uint64(listing.amount),
        encode_uint64(listing.stock),
        encode_uint64(listing.discount),
    ];
    let call = ApplicationCall {
        approval_program: programs.approval.clone(),
        clear_program: programs.clear.clone(),
        global_schema: GLOBAL_SCHEMA,
        local_schema: LOCAL_SCHEMA,
        ..ApplicationCall::call(0, args)
    };

    Ok(app_call(sender, params, call)
        .with_note(note.as_bytes())
        .with_fee(params)?)
}

/// The purchase group: contract call first, payment to the owner second,
/// both stamped with the same group id.
pub fn build_buy(sender: Address, params: &SuggestedParams, listing: &Listing) -> Result<[Transaction; 2]> {
    let price = listing.price().ok_or(ValidationError::DiscountTooHigh {
        discount: listing.discount,
        amount: listing.amount,
    })?;

    let call = app_call(sender, params, ApplicationCall::call(listing.app_id, vec![encode_str(BUY)]))
        .with_fee(params)?;
    let payment = Transaction::new(
        sender,
        params,
        TransactionKind::Payment { receiver: listing.owner, amount: price },
    )
    .with_fee(params)?;

    let mut group = [call, payment];
    assign_group_id(&mut group)?;
    Ok(group)
}

pub fn build_change_discount(
    sender: Address,
    params: &SuggestedParams,
    listing: &Listing,
    new_discount: u64,
) -> Result<Transaction> {
    let args = vec![encode_str(CHANGE_DISCOUNT), encode_uint64(new_discount)];
    Ok(app_call(sender, params, ApplicationCall::call(listing.app_id, args)).with_fee(params)?)
}

pub fn build_update_stock(
    sender: Address,
    params: &SuggestedParams,
    listing: &Listing,
    new_stock: u64,
) -> Result<Transaction> {
    let args = vec![encode_str(UPDATE_STOCK), encode_uint64(new_stock)];
    Ok(app_call(sender, params, ApplicationCall::call(listing.app_id, args)).with_fee(params)?)
}

pub fn build_delete(sender: Address, params: &SuggestedParams, app_id: u64) -> Result<Transaction> {
    let call = ApplicationCall {
        on_complete: OnComplete::DeleteApplication,
        ..ApplicationCall::call(app_id, Vec::new())
    };
    Ok(app_call(sender, params, call).with_fee(params)?)
}
