//! predict.fun wire message types

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::common::types::Side;

/// 1e18 scale used by on-chain amounts
const WEI_SCALE: Decimal = dec!(1_000_000_000_000_000_000);

/// Parse a 1e18-scaled wei string into share/price units
pub fn wei_to_decimal(wei: &str) -> Option<Decimal> {
    let value: Decimal = wei.trim().parse().ok()?;
    Some(value / WEI_SCALE)
}

fn default_wei_zero() -> String {
    "0".to_string()
}

/// Envelope wrapping every predict.fun response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiEnvelope<T> {
    pub success: bool,
    #[serde(default = "Option::default")]
    pub data: Option<T>,
}

/// The signed order inside an open-order entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDetail {
    /// Order hash, the stable identifier
    pub hash: String,
    /// 0 = buy, 1 = sell
    pub side: i32,
    /// What the signer gives, 1e18-scaled wei string
    #[serde(rename = "makerAmount")]
    pub maker_amount: String,
    /// What the signer receives, 1e18-scaled wei string
    #[serde(rename = "takerAmount")]
    pub taker_amount: String,
}

/// One entry from `GET /v1/orders`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpenOrderEntry {
    pub order: OrderDetail,
    #[serde(rename = "marketId")]
    pub market_id: i64,
    /// Total order size, 1e18-scaled wei string
    pub amount: String,
    /// Filled portion, 1e18-scaled wei string
    #[serde(rename = "amountFilled", default = "default_wei_zero")]
    pub amount_filled: String,
    /// Order strategy (LIMIT, MARKET, ...)
    #[serde(default)]
    pub strategy: String,
}

impl OpenOrderEntry {
    /// Order side from the wire encoding
    pub fn side(&self) -> Side {
        if self.order.side == 0 {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    /// Whether this is a resting limit order
    pub fn is_limit(&self) -> bool {
        self.strategy == "LIMIT"
    }

    /// Limit price implied by the maker/taker amounts
    ///
    /// Buy = maker/taker, sell = taker/maker; the 1e18 scale cancels.
    /// `None` when the amounts are unparseable or the price degenerates
    /// to zero.
    pub fn limit_price(&self) -> Option<Decimal> {
        let maker: Decimal = self.order.maker_amount.trim().parse().ok()?;
        let taker: Decimal = self.order.taker_amount.trim().parse().ok()?;

        let price = match self.side() {
            Side::Buy => {
                if taker.is_zero() {
                    return None;
                }
                maker / taker
            }
            Side::Sell => {
                if maker.is_zero() {
                    return None;
                }
                taker / maker
            }
        };

        (price > Decimal::ZERO).then_some(price)
    }

    /// Total size in shares
    pub fn size(&self) -> Option<Decimal> {
        wei_to_decimal(&self.amount)
    }

    /// Filled size in shares
    pub fn size_filled(&self) -> Option<Decimal> {
        wei_to_decimal(&self.amount_filled)
    }
}

/// `GET /v1/markets/{id}` payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketData {
    #[serde(default)]
    pub title: Option<String>,
}

impl MarketData {
    /// Title with a readable fallback for untitled markets
    pub fn title_or_fallback(&self, market_id: i64) -> String {
        match &self.title {
            Some(title) if !title.is_empty() => title.clone(),
            _ => format!("Market {}", market_id),
        }
    }
}

/// `GET /v1/markets/{id}/orderbook` payload
///
/// Levels are `[price, size]` pairs of 1e18-scaled wei strings, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderbookData {
    #[serde(default)]
    pub bids: Vec<(String, String)>,
    #[serde(default)]
    pub asks: Vec<(String, String)>,
}

impl OrderbookData {
    /// Best price on the side this order would fill against
    ///
    /// A buy fills against the best ask, a sell against the best bid.
    pub fn best_opposing_price(&self, side: Side) -> Option<Decimal> {
        let levels = match side {
            Side::Buy => &self.asks,
            Side::Sell => &self.bids,
        };
        let (price, _size) = levels.first()?;
        wei_to_decimal(price)
    }
}

/// One entry from `GET /v1/orders/matches`
///
/// Every field except the hash shows up missing in practice while a match
/// settles, so the whole shape is optional and callers degrade.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchEntry {
    /// On-chain transaction hash of the match
    #[serde(rename = "transactionHash", default)]
    pub transaction_hash: Option<String>,
    /// Shares executed, 1e18-scaled wei string
    #[serde(rename = "amountFilled", default)]
    pub amount_filled: Option<String>,
    /// Execution price, 1e18-scaled wei string
    #[serde(rename = "priceExecuted", default)]
    pub price_executed: Option<String>,
    /// Execution timestamp as reported, passed through unparsed
    #[serde(rename = "executedAt", default)]
    pub executed_at: Option<String>,
    #[serde(default)]
    pub market: Option<MatchMarket>,
    #[serde(default)]
    pub taker: Option<MatchTaker>,
}

/// Market block nested in a match entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchMarket {
    #[serde(default)]
    pub title: Option<String>,
}

/// Taker block nested in a match entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchTaker {
    #[serde(default)]
    pub outcome: Option<MatchOutcome>,
    /// "Bid" when the taker lifted an ask, "Ask" when it hit a bid
    #[serde(rename = "quoteType", default)]
    pub quote_type: Option<String>,
}

/// Outcome block nested in a match taker
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchOutcome {
    #[serde(default)]
    pub name: Option<String>,
}

impl MatchEntry {
    /// Side of the resting order from the taker's quote type
    ///
    /// A "Bid" quote bought from a resting order, so the fill is a buy
    /// from the account's perspective; anything else reads as a sell.
    pub fn side(&self) -> Side {
        let quote_type = self
            .taker
            .as_ref()
            .and_then(|taker| taker.quote_type.as_deref());
        if quote_type == Some("Bid") {
            Side::Buy
        } else {
            Side::Sell
        }
    }

    /// Executed size in shares
    pub fn size_filled(&self) -> Option<Decimal> {
        wei_to_decimal(self.amount_filled.as_deref()?)
    }

    /// Execution price in market units
    pub fn price(&self) -> Option<Decimal> {
        wei_to_decimal(self.price_executed.as_deref()?)
    }

    /// Market title, when the nested block carried one
    pub fn market_title(&self) -> Option<String> {
        self.market
            .as_ref()
            .and_then(|market| market.title.clone())
            .filter(|title| !title.is_empty())
    }

    /// Outcome name, when the nested block carried one
    pub fn outcome_name(&self) -> Option<String> {
        self.taker
            .as_ref()
            .and_then(|taker| taker.outcome.as_ref())
            .and_then(|outcome| outcome.name.clone())
            .filter(|name| !name.is_empty())
    }
}
