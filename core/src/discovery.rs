//! Rebuilds the set of live listings from the indexer.
//!
//! Every call is a full rescan: find creation transactions carrying the
//! marketplace note, then look up and decode each created application.

use futures::{stream, StreamExt};
use tracing::{debug, info, warn};

use crate::{
    codec::utf8_to_base64,
    error::Result,
    models::{Listing, TransactionQuery},
    services::Indexer,
    state::decode_listing,
    MarketError,
};

const APPLICATION_CALL: &str = "appl";
/// Application lookups kept in flight at once.
const LOOKUP_CONCURRENCY: usize = 8;

pub struct Discovery<I> {
    indexer: I,
    note: String,
    min_round: u64,
}

impl<I: Indexer> Discovery<I> {
    pub fn new(indexer: I, note: impl Into<String>, min_round: u64) -> Self {
        Self { indexer, note: note.into(), min_round }
    }

    pub async fn discover(&self) -> Result<Vec<Listing>> {
        info!("fetching listings");
        let app_ids = self.created_applications().await?;

        let listings: Vec<Listing> = stream::iter(app_ids)
            .map(|app_id| self.fetch_or_skip(app_id))
            .buffered(LOOKUP_CONCURRENCY)
            .filter_map(|listing| async move { listing })
            .collect()
            .await;

        info!(count = listings.len(), "listings fetched");
        Ok(listings)
    }

    /// Looks up a single application. `Ok(None)` when it has been deleted.
    pub async fn fetch(&self, app_id: u64) -> Result<Option<Listing>> {
        let app = self
            .indexer
            .lookup_application(app_id)
            .await
            .map_err(MarketError::Network)?;
        Ok(decode_listing(&app)?)
    }

    async fn fetch_or_skip(&self, app_id: u64) -> Option<Listing> {
        match self.fetch(app_id).await {
            Ok(Some(listing)) => Some(listing),
            Ok(None) => {
                debug!(app_id, "skipping deleted application");
                None
            }
            Err(err) => {
                warn!(app_id, error = %err, "skipping undecodable application");
                None
            }
        }
    }

    async fn created_applications(&self) -> Result<Vec<u64>> {
        let mut query = TransactionQuery {
            note_prefix: utf8_to_base64(&self.note),
            tx_type: APPLICATION_CALL,
            min_round: self.min_round,
            next: None,
        };

        let mut app_ids = Vec::new();
        loop {
            let page = self
                .indexer
                .search_transactions(&query)
                .await
                .map_err(MarketError::Network)?;
            if page.transactions.is_empty() {
                break;
            }
            app_ids.extend(page.transactions.iter().filter_map(|t| t.created_application_index));

            match page.next_token {
                Some(token) if query.next.as_deref() != Some(token.as_str()) => query.next = Some(token),
                _ => break,
            }
        }
        Ok(app_ids)
    }
}
