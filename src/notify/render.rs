//! HTML message rendering for outbound notifications

use crate::common::types::{FireReason, Order, OrderFill, Prediction, Side};

/// Block explorer that resolves fill transaction hashes
const EXPLORER_TX_URL: &str = "https://bscscan.com/tx";

/// Escape text for a Telegram HTML-mode message
///
/// Telegram's HTML parse mode only reserves these three characters.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}

/// Render the alert body for one prediction
///
/// Market titles come from the upstream API and are escaped; everything else
/// is generated locally.
pub fn render_alert(order: &Order, prediction: &Prediction, reason: &FireReason) -> String {
    let title = order.market_title.as_deref().unwrap_or("Unknown market");

    let mut lines = vec![
        format!(
            "\u{1F514} <b>Order Alert: {}</b>",
            escape_html(&prediction.label.to_uppercase())
        ),
        String::new(),
        format!("\u{1F4CA} <b>Market:</b> {}", escape_html(title)),
        format!("\u{1F4B9} <b>Your {} Order:</b>", order.side),
    ];

    if let Some(limit) = order.limit_price {
        lines.push(format!("\u{2022} Limit Price: {:.4}", limit));
    }
    if let Some(market) = order.market_price {
        lines.push(format!("\u{2022} Market Price: {:.4}", market));
    }
    lines.push(format!(
        "\u{2022} Shares Remaining: {:.4}",
        order.size_remaining()
    ));

    lines.push(String::new());
    lines.push(format!(
        "Fill likelihood: <b>{:.2}</b>",
        prediction.score
    ));
    lines.push(format!("\u{23F0} {}", reason));

    lines.join("\n")
}

/// Render the announcement body for one executed fill
///
/// Fields the API left out are omitted rather than rendered as unknowns;
/// the transaction link is always present.
pub fn render_fill(fill: &OrderFill) -> String {
    let emoji = match fill.side {
        Side::Buy => "\u{1F7E2}",
        Side::Sell => "\u{1F534}",
    };
    let title = fill.market_title.as_deref().unwrap_or("Unknown market");

    let mut lines = vec![
        format!("{} <b>Order Filled ({})</b>", emoji, fill.side),
        String::new(),
        format!("\u{1F4CA} <b>Market:</b> {}", escape_html(title)),
    ];

    if let Some(outcome) = &fill.outcome {
        lines.push(format!("\u{1F3AF} <b>Outcome:</b> {}", escape_html(outcome)));
    }
    if let Some(size) = fill.size_filled {
        lines.push(format!("\u{2022} Shares: {:.2}", size));
    }
    if let Some(price) = fill.price {
        lines.push(format!("\u{2022} Price: {:.4}", price));
    }
    if let Some(value) = fill.notional() {
        lines.push(format!("\u{2022} Value: ${:.2}", value));
    }

    lines.push(String::new());
    lines.push(format!(
        "\u{1F517} <a href=\"{}/{}\">View transaction</a>",
        EXPLORER_TX_URL,
        escape_html(&fill.tx_hash)
    ));

    lines.join("\n")
}

/// Render the announcement body for one newly placed order
pub fn render_placed(order: &Order) -> String {
    let title = order.market_title.as_deref().unwrap_or("Unknown market");

    let mut lines = vec![
        "\u{1F4DD} <b>New Order Placed</b>".to_string(),
        String::new(),
        format!("\u{1F4CA} <b>Market:</b> {}", escape_html(title)),
        format!("\u{1F4B9} <b>Your {} Order:</b>", order.side),
    ];

    if let Some(limit) = order.limit_price {
        lines.push(format!("\u{2022} Limit Price: {:.4}", limit));
    }
    lines.push(format!("\u{2022} Size: {:.4}", order.size));

    lines.join("\n")
}
