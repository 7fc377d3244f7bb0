//! The five marketplace actions.
//!
//! Each one runs build, sign, submit and a bounded confirmation wait, and
//! reports exactly one outcome. Nothing is retried and no local state is kept:
//! callers re-run discovery to observe the effect.

use tracing::{info, instrument, warn};

use crate::{
    address::Address,
    builder::{self, Programs},
    codec::parse_amount,
    error::{Result, ValidationError},
    models::{Confirmation, Listing, NewListing},
    services::{Algod, Signer},
    transaction::{SuggestedParams, Transaction},
    MarketError,
};

pub struct Marketplace<A, S> {
    algod: A,
    signer: S,
    programs: Programs,
    note: String,
    confirmation_rounds: u64,
}

impl<A: Algod, S: Signer> Marketplace<A, S> {
    pub fn new(algod: A, signer: S, programs: Programs, note: impl Into<String>, confirmation_rounds: u64) -> Self {
        Self {
            algod,
            signer,
            programs,
            note: note.into(),
            confirmation_rounds,
        }
    }

    /// Deploys a new listing contract and returns the application id the ledger assigned.
    #[instrument(skip_all, fields(name = %listing.name))]
    pub async fn create(&self, sender: Address, listing: &NewListing) -> Result<u64> {
        builder::validate_new_listing(listing)?;
        let params = self.params().await?;
        let txn = builder::build_create(sender, &params, &self.note, listing, &self.programs)?;

        let (tx_id, _) = self.execute(txn).await?;
        let pending = self
            .algod
            .pending_transaction(&tx_id)
            .await
            .map_err(MarketError::Network)?;
        let app_id = pending.created_application_id.ok_or_else(|| {
            MarketError::Network(format!("transaction {tx_id} did not report a created application").into())
        })?;
        info!(app_id, "created new application");
        Ok(app_id)
    }

    #[instrument(skip_all, fields(app_id = listing.app_id))]
    pub async fn buy(&self, sender: Address, listing: &Listing) -> Result<Confirmation> {
        if !listing.in_stock() {
            return Err(ValidationError::SoldOut { app_id: listing.app_id }.into());
        }
        if listing.price().is_none() {
            return Err(ValidationError::DiscountTooHigh {
                discount: listing.discount,
                amount: listing.amount,
            }
            .into());
        }
        let params = self.params().await?;
        let group = builder::build_buy(sender, &params, listing)?;

        let unsigned = group
            .iter()
            .map(Transaction::encode)
            .collect::<Result<Vec<_>, _>>()?;
        let signed = self.signer.sign_group(unsigned).await.map_err(MarketError::Signing)?;
        info!("signed group transaction");

        let tx_id = self.algod.submit(&signed).await.map_err(MarketError::Submission)?;
        let confirmation = self.confirm(&tx_id).await?;
        info!(tx_id = %tx_id, round = confirmation.confirmed_round, "group transaction confirmed");
        Ok(confirmation)
    }

    #[instrument(skip_all, fields(app_id = listing.app_id, new_discount = new_discount))]
    pub async fn change_discount(&self, sender: Address, listing: &Listing, new_discount: u64) -> Result<Confirmation> {
        builder::validate_discount(new_discount, listing.amount)?;
        let params = self.params().await?;
        let txn = builder::build_change_discount(sender, &params, listing, new_discount)?;
        Ok(self.execute(txn).await?.1)
    }

    #[instrument(skip_all, fields(app_id = listing.app_id, new_stock = new_stock))]
    pub async fn update_stock(&self, sender: Address, listing: &Listing, new_stock: u64) -> Result<Confirmation> {
        if new_stock == 0 {
            return Err(ValidationError::ZeroStock.into());
        }
        let params = self.params().await?;
        let txn = builder::build_update_stock(sender, &params, listing, new_stock)?;
        Ok(self.execute(txn).await?.1)
    }

    /// Same as [`Marketplace::update_stock`] for stock typed into a form.
    pub async fn update_stock_from_input(&self, sender: Address, listing: &Listing, input: &str) -> Result<Confirmation> {
        let new_stock = parse_amount("stock", input)?;
        self.update_stock(sender, listing, new_stock).await
    }

    #[instrument(skip_all, fields(app_id = app_id))]
    pub async fn delete(&self, sender: Address, app_id: u64) -> Result<Confirmation> {
        let params = self.params().await?;
        let txn = builder::build_delete(sender, &params, app_id)?;

        let (tx_id, confirmation) = self.execute(txn).await?;
        // the deletion is already confirmed; the pending record only feeds the log
        match self.algod.pending_transaction(&tx_id).await {
            Ok(pending) => info!(deleted = ?pending.deleted_application_id, "deleted application"),
            Err(err) => warn!(tx_id = %tx_id, error = %err, "deleted application, pending record unavailable"),
        }
        Ok(confirmation)
    }

    async fn params(&self) -> Result<SuggestedParams> {
        self.algod.suggested_params().await.map_err(MarketError::Network)
    }

    async fn execute(&self, txn: Transaction) -> Result<(String, Confirmation)> {
        let tx_id = txn.id()?;
        let signed = self.signer.sign(txn.encode()?).await.map_err(MarketError::Signing)?;
        info!(tx_id = %tx_id, "signed transaction");

        self.algod
            .submit(&[signed])
            .await
            .map_err(MarketError::Submission)?;
        let confirmation = self.confirm(&tx_id).await?;
        info!(tx_id = %tx_id, round = confirmation.confirmed_round, "transaction confirmed");
        Ok((tx_id, confirmation))
    }

    async fn confirm(&self, tx_id: &str) -> Result<Confirmation> {
        Ok(self.algod.await_confirmation(tx_id, self.confirmation_rounds).await?)
    }
}
