pub mod apparel;
pub mod orders;
pub mod payments;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::str::FromStr;

/// Accepts a JSON string or number (storefront forms post both) as text.
pub(crate) fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(other) => Some(other.to_string()),
    })
}

/// Outcome of reading a numeric field that may arrive as a number or a string.
#[derive(Debug, PartialEq)]
pub(crate) enum NumericField<T> {
    /// Absent, null, blank or zero
    Missing,
    Invalid,
    Value(T),
}

pub(crate) fn decimal_field(value: Option<&Value>) -> NumericField<Decimal> {
    let text = match value {
        None | Some(Value::Null) => return NumericField::Missing,
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::String(s)) => s.trim().to_string(),
        Some(_) => return NumericField::Invalid,
    };
    if text.is_empty() {
        return NumericField::Missing;
    }
    match Decimal::from_str(&text).or_else(|_| Decimal::from_scientific(&text)) {
        Ok(d) if d.is_zero() => NumericField::Missing,
        Ok(d) => NumericField::Value(d),
        Err(_) => NumericField::Invalid,
    }
}

pub(crate) fn integer_field(value: Option<&Value>) -> NumericField<i64> {
    match decimal_field(value) {
        NumericField::Value(d) if d.fract().is_zero() => {
            use rust_decimal::prelude::ToPrimitive;
            d.to_i64()
                .map(NumericField::Value)
                .unwrap_or(NumericField::Invalid)
        }
        NumericField::Value(_) => NumericField::Invalid,
        NumericField::Missing => NumericField::Missing,
        NumericField::Invalid => NumericField::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn decimal_field_accepts_numbers_and_strings() {
        assert_eq!(
            decimal_field(Some(&json!("399.00"))),
            NumericField::Value(dec!(399.00))
        );
        assert_eq!(
            decimal_field(Some(&json!(399.5))),
            NumericField::Value(dec!(399.5))
        );
        assert_eq!(decimal_field(Some(&json!(0))), NumericField::Missing);
        assert_eq!(decimal_field(Some(&json!(""))), NumericField::Missing);
        assert_eq!(decimal_field(None), NumericField::Missing);
        assert_eq!(decimal_field(Some(&json!("abc"))), NumericField::Invalid);
        assert_eq!(decimal_field(Some(&json!([1]))), NumericField::Invalid);
    }

    #[test]
    fn integer_field_rejects_fractions() {
        assert_eq!(integer_field(Some(&json!("2"))), NumericField::Value(2));
        assert_eq!(integer_field(Some(&json!(3))), NumericField::Value(3));
        assert_eq!(integer_field(Some(&json!(1.5))), NumericField::Invalid);
        assert_eq!(integer_field(Some(&json!(0))), NumericField::Missing);
    }
}
