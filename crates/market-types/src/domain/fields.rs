//! Decoding of loosely-typed request fields.
//!
//! Form bodies deliver every value as a string while JSON bodies carry real
//! numbers, so both end up in a [`FieldMap`] and are coerced per column here.

use chrono::NaiveDate;
use serde_json::{Map, Value};

pub type FieldMap = Map<String, Value>;

/// Date layouts accepted for `start_date` / `end_date`.
pub const DATE_FORMATS: [&str; 2] = ["%m/%d/%Y", "%Y-%m-%d"];

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FieldError {
    #[error("field `{field}` must be an integer, got {value}")]
    NotAnInteger { field: &'static str, value: String },

    #[error("field `{field}` must be a string, got {value}")]
    NotText { field: &'static str, value: String },

    #[error("field `{field}` is not a date (expected MM/DD/YYYY or YYYY-MM-DD): {value}")]
    NotADate { field: &'static str, value: String },
}

pub fn text(map: &FieldMap, field: &'static str) -> Result<Option<String>, FieldError> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => Ok(Some(v.to_string())),
        Some(other) => Err(FieldError::NotText {
            field,
            value: other.to_string(),
        }),
    }
}

pub fn integer(map: &FieldMap, field: &'static str) -> Result<Option<i64>, FieldError> {
    let invalid = |v: &Value| FieldError::NotAnInteger {
        field,
        value: v.to_string(),
    };
    match map.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v @ Value::Number(n)) => n.as_i64().map(Some).ok_or_else(|| invalid(v)),
        Some(v @ Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>().map(Some).map_err(|_| invalid(v))
        }
        Some(other) => Err(invalid(other)),
    }
}

/// A text field that must hold a calendar date when non-empty. The input
/// string is kept so clients read back exactly what they sent.
pub fn date(map: &FieldMap, field: &'static str) -> Result<Option<String>, FieldError> {
    let value = text(map, field)?;
    if let Some(s) = value.as_deref() {
        let trimmed = s.trim();
        if !trimmed.is_empty()
            && !DATE_FORMATS
                .iter()
                .any(|fmt| NaiveDate::parse_from_str(trimmed, fmt).is_ok())
        {
            return Err(FieldError::NotADate {
                field,
                value: s.to_string(),
            });
        }
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn map(v: Value) -> FieldMap {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn integers_accept_numbers_and_numeric_strings() {
        let m = map(json!({"a": 30, "b": " 42 ", "c": "", "d": null}));
        assert_eq!(integer(&m, "a").unwrap(), Some(30));
        assert_eq!(integer(&m, "b").unwrap(), Some(42));
        assert_eq!(integer(&m, "c").unwrap(), None);
        assert_eq!(integer(&m, "d").unwrap(), None);
        assert_eq!(integer(&m, "missing").unwrap(), None);
    }

    #[test]
    fn malformed_integers_are_rejected() {
        let m = map(json!({"age": "thirty", "price": 1.5, "id": [1]}));
        assert!(matches!(
            integer(&m, "age"),
            Err(FieldError::NotAnInteger { field: "age", .. })
        ));
        assert!(integer(&m, "price").is_err());
        assert!(integer(&m, "id").is_err());
    }

    #[test]
    fn text_stringifies_scalars_but_not_structures() {
        let m = map(json!({"phone": 5550101, "role": "customer", "email": {"x": 1}}));
        assert_eq!(text(&m, "phone").unwrap().as_deref(), Some("5550101"));
        assert_eq!(text(&m, "role").unwrap().as_deref(), Some("customer"));
        assert!(text(&m, "email").is_err());
    }

    #[test]
    fn dates_are_checked_but_kept_verbatim() {
        let m = map(json!({
            "us": "02/08/2013",
            "iso": "2013-02-08",
            "empty": "",
            "bad": "next tuesday"
        }));
        assert_eq!(date(&m, "us").unwrap().as_deref(), Some("02/08/2013"));
        assert_eq!(date(&m, "iso").unwrap().as_deref(), Some("2013-02-08"));
        assert_eq!(date(&m, "empty").unwrap().as_deref(), Some(""));
        assert!(matches!(
            date(&m, "bad"),
            Err(FieldError::NotADate { field: "bad", .. })
        ));
    }
}
