//! Order record as stored in the `orders` collection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// A single order document.
///
/// Every field is optional: documents are written by the shop frontend and
/// this service only reads them. Numeric prices are kept as display text.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderRecord {
    #[serde(default, deserialize_with = "display_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub product: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub price: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub final_price: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub promocode_used: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub client: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub payment_method: Option<String>,
    #[serde(default, deserialize_with = "display_text")]
    pub created_at: Option<String>,
}

impl OrderRecord {
    /// `createdAt` as a timestamp, when it is valid RFC 3339.
    pub fn created_at_timestamp(&self) -> Option<DateTime<Utc>> {
        self.created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|ts| ts.with_timezone(&Utc))
    }

    /// Identifier used in log lines.
    pub fn log_id(&self) -> &str {
        self.id.as_deref().unwrap_or("<no id>")
    }
}

/// Accept strings, numbers and booleans; treat `null` as absent.
fn display_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(Value::Null) => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Number(number)) => Some(number_text(&number)),
        Some(Value::Bool(flag)) => Some(flag.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Whole floats render without a trailing `.0`, like the shop frontend does.
fn number_text(number: &serde_json::Number) -> String {
    match number.as_f64() {
        Some(f) if number.is_f64() && f.fract() == 0.0 && f.abs() < 1e15 => {
            format!("{}", f as i64)
        }
        _ => number.to_string(),
    }
}
