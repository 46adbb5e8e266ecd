use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use sqlx::FromRow;
use uuid::Uuid;

use crate::utils::error::AppError;

/// Largest value the `NUMERIC(10,2)` price column holds.
pub const MAX_PRICE: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, 2);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "event_status", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum EventStatus {
    Draft,
    #[default]
    Published,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub city: String,
    pub country_code: String,
    pub address: Option<String>,
    pub cover_image: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub status: EventStatus,
    pub organizer_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Event {
    pub fn from_draft(draft: EventDraft, organizer_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: draft.title,
            description: draft.description,
            start_at: draft.start_at,
            end_at: draft.end_at,
            city: draft.city,
            country_code: draft.country_code,
            address: draft.address,
            cover_image: draft.cover_image,
            price: draft.price,
            currency: draft.currency,
            status: draft.status,
            organizer_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Full overwrite of every mutable field; identity and ownership stay.
    pub fn replace_with(&mut self, draft: EventDraft) {
        self.title = draft.title;
        self.description = draft.description;
        self.start_at = draft.start_at;
        self.end_at = draft.end_at;
        self.city = draft.city;
        self.country_code = draft.country_code;
        self.address = draft.address;
        self.cover_image = draft.cover_image;
        self.price = draft.price;
        self.currency = draft.currency;
        self.status = draft.status;
        self.updated_at = Utc::now();
    }

    /// Case-insensitive match of an already lowercased needle against title,
    /// city and address.
    pub fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.city.to_lowercase().contains(needle)
            || self
                .address
                .as_deref()
                .is_some_and(|a| a.to_lowercase().contains(needle))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrganizerSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventWithOrganizer {
    #[serde(flatten)]
    pub event: Event,
    pub organizer: OrganizerSummary,
}

/// Request body shared by create and update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventInput {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_at: String,
    pub end_at: String,
    pub city: String,
    pub country_code: String,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default, deserialize_with = "deserialize_price")]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub status: Option<EventStatus>,
}

/// Validated and normalized event fields.
#[derive(Debug, Clone, PartialEq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub city: String,
    pub country_code: String,
    pub address: Option<String>,
    pub cover_image: Option<String>,
    pub price: Option<Decimal>,
    pub currency: Option<String>,
    pub status: EventStatus,
}

impl EventInput {
    pub fn validate(self) -> Result<EventDraft, AppError> {
        let title = self.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::ValidationError("title must not be empty".into()));
        }

        let city = self.city.trim().to_string();
        if city.is_empty() {
            return Err(AppError::ValidationError("city must not be empty".into()));
        }

        let country_code = self.country_code.trim().to_ascii_uppercase();
        if country_code.len() != 2 || !country_code.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(AppError::ValidationError(
                "countryCode must be a two-letter code".into(),
            ));
        }

        let currency = non_blank(self.currency).map(|c| c.to_ascii_uppercase());
        if let Some(code) = &currency {
            if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
                return Err(AppError::ValidationError(
                    "currency must be a three-letter code".into(),
                ));
            }
        }

        let price = match self.price {
            Some(p) if p.is_sign_negative() => {
                return Err(AppError::ValidationError(
                    "price must not be negative".into(),
                ))
            }
            Some(mut p) => {
                p.rescale(2);
                if p > MAX_PRICE {
                    return Err(AppError::ValidationError(format!(
                        "price must not exceed {MAX_PRICE}"
                    )));
                }
                Some(p)
            }
            None => None,
        };

        let start_at = parse_timestamp("startAt", &self.start_at)?;
        let end_at = parse_timestamp("endAt", &self.end_at)?;
        if end_at < start_at {
            tracing::warn!(%start_at, %end_at, "Event ends before it starts");
        }

        Ok(EventDraft {
            title,
            description: non_blank(self.description),
            start_at,
            end_at,
            city,
            country_code,
            address: non_blank(self.address),
            cover_image: non_blank(self.cover_image),
            price,
            currency,
            status: self.status.unwrap_or_default(),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts RFC 3339 as well as the zone-less `datetime-local` form, read as UTC.
pub fn parse_timestamp(field: &str, raw: &str) -> Result<DateTime<Utc>, AppError> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
        .ok_or_else(|| AppError::ValidationError(format!("{field} is not a valid timestamp")))
}

/// Price arrives as a JSON number, a numeric string, or nothing at all.
fn deserialize_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Decimal::from_str(s.trim())
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid price: {s}"))),
        Some(Value::Number(n)) => {
            let text = n.to_string();
            Decimal::from_str(&text)
                .or_else(|_| Decimal::from_scientific(&text))
                .map(Some)
                .map_err(|_| de::Error::custom(format!("invalid price: {text}")))
        }
        Some(other) => Err(de::Error::custom(format!("invalid price: {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn input(price: Value) -> EventInput {
        serde_json::from_value(json!({
            "title": "Demo Conf",
            "startAt": "2025-01-10T09:00:00Z",
            "endAt": "2025-01-10T17:00:00Z",
            "city": "Austin",
            "countryCode": "us",
            "currency": "usd",
            "price": price,
        }))
        .unwrap()
    }

    #[test]
    fn test_price_accepts_number_and_string() {
        assert_eq!(input(json!(10.5)).price, Some(Decimal::new(105, 1)));
        assert_eq!(input(json!("299.99")).price, Some(Decimal::new(29999, 2)));
    }

    #[test]
    fn test_empty_or_missing_price_is_none() {
        assert_eq!(input(json!("")).price, None);
        assert_eq!(input(Value::Null).price, None);

        let without: EventInput = serde_json::from_value(json!({
            "title": "t",
            "startAt": "2025-01-10T09:00:00Z",
            "endAt": "2025-01-10T17:00:00Z",
            "city": "Austin",
            "countryCode": "US",
        }))
        .unwrap();
        assert_eq!(without.price, None);
    }

    #[test]
    fn test_garbage_price_is_rejected() {
        let result: Result<EventInput, _> = serde_json::from_value(json!({
            "title": "t",
            "startAt": "2025-01-10T09:00:00Z",
            "endAt": "2025-01-10T17:00:00Z",
            "city": "Austin",
            "countryCode": "US",
            "price": "ten dollars",
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_normalizes_codes_and_defaults_status() {
        let draft = input(json!(10)).validate().unwrap();
        assert_eq!(draft.country_code, "US");
        assert_eq!(draft.currency.as_deref(), Some("USD"));
        assert_eq!(draft.status, EventStatus::Published);
        assert_eq!(draft.price.unwrap().to_string(), "10.00");
    }

    #[test]
    fn test_price_is_bounded_by_the_column() {
        assert!(input(json!("99999999.99")).validate().is_ok());
        assert!(matches!(
            input(json!("100000000")).validate(),
            Err(AppError::ValidationError(_))
        ));
    }

    #[test]
    fn test_validate_rejects_bad_country_code() {
        let mut bad = input(Value::Null);
        bad.country_code = "USA".into();
        assert!(matches!(bad.validate(), Err(AppError::ValidationError(_))));
    }

    #[test]
    fn test_parse_timestamp_forms() {
        let a = parse_timestamp("startAt", "2025-01-10T09:00:00Z").unwrap();
        let b = parse_timestamp("startAt", "2025-01-10T09:00").unwrap();
        let c = parse_timestamp("startAt", "2025-01-10T10:00:00+01:00").unwrap();
        assert_eq!(a, b);
        assert_eq!(a, c);
        assert!(parse_timestamp("startAt", "next tuesday").is_err());
    }

    #[test]
    fn test_end_before_start_is_allowed() {
        let mut inverted = input(Value::Null);
        inverted.end_at = "2025-01-09T09:00:00Z".into();
        assert!(inverted.validate().is_ok());
    }

    #[test]
    fn test_matches_title_city_and_address() {
        let mut draft = input(Value::Null).validate().unwrap();
        draft.address = Some("123 Tech Blvd".into());
        let event = Event::from_draft(draft, Uuid::new_v4());
        assert!(event.matches("demo"));
        assert!(event.matches("austin"));
        assert!(event.matches("tech blvd"));
        assert!(!event.matches("berlin"));
    }
}
