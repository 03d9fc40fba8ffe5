//! Order → Telegram message rendering.
//!
//! Output uses Telegram's HTML parse mode, so every value taken from the
//! order document is escaped before it is interpolated.

use chrono::{Local, NaiveDateTime};

use crate::orders::types::OrderRecord;

pub const PLACEHOLDER: &str = "N/A";
pub const NO_PAYMENT_METHOD: &str = "not selected";

const TIME_FORMAT: &str = "%H:%M %d.%m.%Y";

/// Render `order` stamped with the current local time.
pub fn format_order(order: &OrderRecord) -> String {
    format_order_at(order, Local::now().naive_local())
}

/// Render `order` stamped with `now`. Never fails: absent fields fall back
/// to placeholders.
pub fn format_order_at(order: &OrderRecord, now: NaiveDateTime) -> String {
    let product = field_or(&order.product, PLACEHOLDER);
    let client = field_or(&order.client, PLACEHOLDER);
    let payment_method = field_or(&order.payment_method, NO_PAYMENT_METHOD);
    let id = field_or(&order.id, PLACEHOLDER);

    format!(
        "🆕 <b>NEW ORDER</b>\n\
         \n\
         📦 <b>Product:</b> {product}\n\
         💰 <b>Amount:</b> {price}\n\
         👤 <b>Client:</b> {client}\n\
         💳 <b>Payment method:</b> {payment_method}\n\
         \n\
         🆔 <b>ID:</b> <code>{id}</code>\n\
         ⏰ <b>Time:</b> {time}\n",
        price = price_line(order),
        time = now.format(TIME_FORMAT),
    )
}

/// Struck-through original price when a promo code produced a final price.
fn price_line(order: &OrderRecord) -> String {
    let price = field_or(&order.price, PLACEHOLDER);

    match (present(&order.promocode_used), present(&order.final_price)) {
        (Some(promo), Some(final_price)) => format!(
            "<s>{}</s> {} (promo code: {})",
            price,
            escape_html(final_price),
            escape_html(promo),
        ),
        _ => price,
    }
}

fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|value| !value.is_empty())
}

fn field_or(field: &Option<String>, placeholder: &str) -> String {
    match field.as_deref() {
        Some(value) => escape_html(value),
        None => placeholder.to_string(),
    }
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            other => escaped.push(other),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;

    fn fixed_now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .unwrap()
            .and_hms_opt(9, 5, 0)
            .unwrap()
    }

    fn full_order() -> OrderRecord {
        OrderRecord {
            id: Some("ord-981".into()),
            product: Some("Sourdough starter".into()),
            price: Some("1200".into()),
            final_price: None,
            promocode_used: None,
            client: Some("@marta".into()),
            payment_method: Some("card".into()),
            created_at: Some("2024-03-07T09:04:59.000Z".into()),
        }
    }

    #[test]
    fn renders_all_fields() {
        let message = format_order_at(&full_order(), fixed_now());

        assert!(message.starts_with("🆕 <b>NEW ORDER</b>"));
        assert!(message.contains("<b>Product:</b> Sourdough starter"));
        assert!(message.contains("<b>Amount:</b> 1200\n"));
        assert!(message.contains("<b>Client:</b> @marta"));
        assert!(message.contains("<b>Payment method:</b> card"));
        assert!(message.contains("<code>ord-981</code>"));
        assert!(message.contains("<b>Time:</b> 09:05 07.03.2024"));
    }

    #[test]
    fn promo_order_strikes_through_original_price() {
        let order = OrderRecord {
            final_price: Some("900".into()),
            promocode_used: Some("WELCOME".into()),
            ..full_order()
        };

        let message = format_order_at(&order, fixed_now());
        assert!(message.contains("<s>1200</s> 900 (promo code: WELCOME)"));
    }

    #[test]
    fn promo_without_final_price_renders_plain_price() {
        let order = OrderRecord {
            promocode_used: Some("WELCOME".into()),
            ..full_order()
        };

        let message = format_order_at(&order, fixed_now());
        assert!(!message.contains("<s>"));
        assert!(message.contains("<b>Amount:</b> 1200\n"));
    }

    #[test]
    fn empty_promo_code_counts_as_absent() {
        let order = OrderRecord {
            final_price: Some("900".into()),
            promocode_used: Some(String::new()),
            ..full_order()
        };

        assert!(!format_order_at(&order, fixed_now()).contains("<s>"));
    }

    #[test]
    fn empty_order_uses_placeholders() {
        let message = format_order_at(&OrderRecord::default(), fixed_now());

        assert!(message.contains("<b>Product:</b> N/A"));
        assert!(message.contains("<b>Amount:</b> N/A"));
        assert!(message.contains("<b>Client:</b> N/A"));
        assert!(message.contains("<b>Payment method:</b> not selected"));
        assert!(message.contains("<code>N/A</code>"));
    }

    #[test]
    fn markup_in_values_is_escaped() {
        let order = OrderRecord {
            product: Some("<b>Salt & Pepper</b>".into()),
            ..full_order()
        };

        let message = format_order_at(&order, fixed_now());
        assert!(message.contains("&lt;b&gt;Salt &amp; Pepper&lt;/b&gt;"));
    }

    #[test]
    fn format_order_uses_wall_clock() {
        let message = format_order(&full_order());
        assert!(message.contains("<b>Time:</b> "));
    }

    fn opt_text() -> impl Strategy<Value = Option<String>> {
        proptest::option::of("[a-zA-Z0-9 <>&.]{0,12}")
    }

    fn any_order() -> impl Strategy<Value = OrderRecord> {
        (
            opt_text(),
            opt_text(),
            opt_text(),
            opt_text(),
            opt_text(),
            opt_text(),
            opt_text(),
        )
            .prop_map(
                |(id, product, price, final_price, promocode_used, client, payment_method)| {
                    OrderRecord {
                        id,
                        product,
                        price,
                        final_price,
                        promocode_used,
                        client,
                        payment_method,
                        created_at: None,
                    }
                },
            )
    }

    proptest! {
        #[test]
        fn strike_through_iff_promo_and_final_price(order in any_order()) {
            let message = format_order_at(&order, fixed_now());
            let discounted = present(&order.promocode_used).is_some()
                && present(&order.final_price).is_some();

            if discounted {
                let price = field_or(&order.price, PLACEHOLDER);
                let expected_struck = format!("<s>{}</s>", price);
                let final_price = escape_html(order.final_price.as_deref().unwrap());
                let promo = escape_html(order.promocode_used.as_deref().unwrap());
                prop_assert!(message.contains(&expected_struck));
                prop_assert!(message.contains(&final_price));
                prop_assert!(message.contains(&promo));
            } else {
                prop_assert!(!message.contains("<s>"));
            }
        }

        #[test]
        fn absent_fields_fall_back_to_placeholders(order in any_order()) {
            let message = format_order_at(&order, fixed_now());

            if order.product.is_none() {
                prop_assert!(message.contains("<b>Product:</b> N/A"));
            }
            if order.client.is_none() {
                prop_assert!(message.contains("<b>Client:</b> N/A"));
            }
            if order.payment_method.is_none() {
                prop_assert!(message.contains("<b>Payment method:</b> not selected"));
            }
            if order.id.is_none() {
                prop_assert!(message.contains("<code>N/A</code>"));
            }
        }
    }
}
