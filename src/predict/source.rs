//! OrderSource implementation backed by the predict.fun API

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use super::rest::PredictRestClient;
use crate::common::errors::{NotifierError, Result};
use crate::common::traits::OrderSource;
use crate::common::types::{Order, OrderFill, OrderStatus};

/// Fetches one signer's open limit orders, enriched with market titles and
/// the best opposing book price
///
/// A failure of the open-orders call itself aborts the cycle; enrichment
/// failures degrade to missing titles or prices and the order is still
/// evaluated. Also serves the recent-fills feed off the matches endpoint.
pub struct PredictOrderSource {
    rest: PredictRestClient,
    /// Signer address whose orders are watched
    signer_address: String,
    /// Page size for the open-orders query
    page_size: u32,
    /// Page size for the recent-matches query
    matches_page_size: u32,
}

impl PredictOrderSource {
    pub fn new(rest: PredictRestClient, signer_address: &str) -> Self {
        Self {
            rest,
            signer_address: signer_address.to_string(),
            page_size: 50,
            matches_page_size: 20,
        }
    }

    /// Set the open-orders page size
    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = page_size;
        self
    }

    /// Set the recent-matches page size
    pub fn with_matches_page_size(mut self, matches_page_size: u32) -> Self {
        self.matches_page_size = matches_page_size;
        self
    }
}

#[async_trait]
impl OrderSource for PredictOrderSource {
    #[instrument(skip(self))]
    async fn fetch_open_orders(&self) -> Result<Vec<Order>> {
        let entries = self
            .rest
            .get_open_orders(&self.signer_address, self.page_size)
            .await
            .map_err(|e| NotifierError::SourceUnavailable(e.to_string()))?;

        debug!(entries = entries.len(), "fetched open order entries");

        // Market titles rarely change; one lookup per market per cycle
        let mut titles: HashMap<i64, Option<String>> = HashMap::new();
        let mut orders = Vec::with_capacity(entries.len());

        for entry in entries {
            if !entry.is_limit() {
                debug!(order_id = %entry.order.hash, strategy = %entry.strategy, "skipping non-limit order");
                continue;
            }

            let side = entry.side();

            if !titles.contains_key(&entry.market_id) {
                let title = match self.rest.get_market(entry.market_id).await {
                    Ok(market) => Some(market.title_or_fallback(entry.market_id)),
                    Err(e) => {
                        warn!(market_id = entry.market_id, "market fetch failed: {}", e);
                        None
                    }
                };
                titles.insert(entry.market_id, title);
            }
            let market_title = titles.get(&entry.market_id).cloned().flatten();

            let market_price = match self.rest.get_orderbook(entry.market_id).await {
                Ok(book) => book.best_opposing_price(side),
                Err(e) => {
                    warn!(market_id = entry.market_id, "orderbook fetch failed: {}", e);
                    None
                }
            };

            let limit_price = entry.limit_price();
            if limit_price.is_none() {
                warn!(order_id = %entry.order.hash, "order has no usable limit price");
            }

            orders.push(Order {
                id: entry.order.hash.clone(),
                market_id: entry.market_id,
                market_title,
                side,
                limit_price,
                size: entry.size().unwrap_or_default(),
                size_filled: entry.size_filled().unwrap_or_default(),
                market_price,
                status: OrderStatus::Open,
            });
        }

        Ok(orders)
    }

    #[instrument(skip(self))]
    async fn fetch_recent_fills(&self) -> Result<Vec<OrderFill>> {
        let entries = self
            .rest
            .get_order_matches(&self.signer_address, self.matches_page_size)
            .await
            .map_err(|e| NotifierError::SourceUnavailable(e.to_string()))?;

        debug!(entries = entries.len(), "fetched match entries");

        let mut fills = Vec::with_capacity(entries.len());
        for entry in entries {
            // Matches without a hash yet are still settling; they come back
            // with one on a later poll
            let tx_hash = match &entry.transaction_hash {
                Some(hash) if !hash.is_empty() => hash.clone(),
                _ => {
                    debug!("skipping match without a transaction hash");
                    continue;
                }
            };

            fills.push(OrderFill {
                tx_hash,
                market_title: entry.market_title(),
                outcome: entry.outcome_name(),
                side: entry.side(),
                size_filled: entry.size_filled(),
                price: entry.price(),
                executed_at: entry.executed_at.clone(),
            });
        }

        Ok(fills)
    }
}
