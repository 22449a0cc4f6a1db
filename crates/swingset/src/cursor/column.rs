//! Column types and scalar conversion.

use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;

use crate::error::ConversionError;

/// SQL type of a cursor column, as reported by result-set metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    /// 32-bit integer.
    Integer,
    /// 64-bit integer.
    BigInt,
    /// Single-precision float.
    Float,
    /// Double-precision float.
    Double,
    /// Exact decimal.
    Numeric,
    /// Boolean / bit.
    Boolean,
    /// Calendar date.
    Date,
    /// Date and time without zone.
    Timestamp,
    /// Fixed-width character data.
    Char,
    /// Variable-width character data.
    VarChar,
}

impl ColumnType {
    /// Whether values of this type are numbers.
    pub fn is_numeric(self) -> bool {
        matches!(
            self,
            Self::Integer | Self::BigInt | Self::Float | Self::Double | Self::Numeric
        )
    }

    /// Whether values of this type are character data.
    pub fn is_character(self) -> bool {
        matches!(self, Self::Char | Self::VarChar)
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "INTEGER",
            Self::BigInt => "BIGINT",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Numeric => "NUMERIC",
            Self::Boolean => "BOOLEAN",
            Self::Date => "DATE",
            Self::Timestamp => "TIMESTAMP",
            Self::Char => "CHAR",
            Self::VarChar => "VARCHAR",
        };
        f.write_str(name)
    }
}

/// A Rust scalar that can be stored in a cursor column as text.
///
/// Mapping keys of selection controllers and values of bound fields are
/// `ColumnScalar`s.
pub trait ColumnScalar: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {
    /// Name used in conversion error messages.
    const TYPE_NAME: &'static str;

    /// Parse non-null column text.
    fn parse_column(text: &str, column_type: ColumnType) -> Result<Self, ConversionError>;

    /// Render the value as column text for a column of `column_type`.
    fn format_column(&self, column_type: ColumnType) -> String;

    /// Convert nullable column text.
    ///
    /// SQL NULL reads as `None`. Blank text also reads as `None` unless the
    /// column holds character data.
    fn read_column(
        text: Option<&str>,
        column_type: ColumnType,
    ) -> Result<Option<Self>, ConversionError> {
        match text {
            None => Ok(None),
            Some(t) if t.trim().is_empty() && !column_type.is_character() => Ok(None),
            Some(t) => Self::parse_column(t, column_type).map(Some),
        }
    }
}

macro_rules! from_str_scalar {
    ($($ty:ty => $name:literal),* $(,)?) => {
        $(
            impl ColumnScalar for $ty {
                const TYPE_NAME: &'static str = $name;

                fn parse_column(text: &str, column_type: ColumnType) -> Result<Self, ConversionError> {
                    <$ty>::from_str(text.trim())
                        .map_err(|e| ConversionError::new(text, Self::TYPE_NAME, column_type, e))
                }

                fn format_column(&self, _column_type: ColumnType) -> String {
                    self.to_string()
                }
            }
        )*
    };
}

from_str_scalar! {
    i32 => "i32",
    i64 => "i64",
    f64 => "f64",
    Decimal => "Decimal",
}

impl ColumnScalar for String {
    const TYPE_NAME: &'static str = "String";

    fn parse_column(text: &str, _column_type: ColumnType) -> Result<Self, ConversionError> {
        Ok(text.to_string())
    }

    fn format_column(&self, _column_type: ColumnType) -> String {
        self.clone()
    }
}

impl ColumnScalar for bool {
    const TYPE_NAME: &'static str = "bool";

    fn parse_column(text: &str, column_type: ColumnType) -> Result<Self, ConversionError> {
        match text.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "t" | "y" | "yes" => Ok(true),
            "0" | "false" | "f" | "n" | "no" => Ok(false),
            _ => Err(ConversionError::new(
                text,
                Self::TYPE_NAME,
                column_type,
                "not a boolean literal",
            )),
        }
    }

    fn format_column(&self, column_type: ColumnType) -> String {
        match (column_type.is_numeric(), *self) {
            (true, true) => "1".into(),
            (true, false) => "0".into(),
            (false, value) => value.to_string(),
        }
    }
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

fn parse_timestamp(text: &str) -> Option<NaiveDateTime> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
}

impl ColumnScalar for NaiveDate {
    const TYPE_NAME: &'static str = "NaiveDate";

    fn parse_column(text: &str, column_type: ColumnType) -> Result<Self, ConversionError> {
        let trimmed = text.trim();
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .or_else(|e| parse_timestamp(trimmed).map(|ts| ts.date()).ok_or(e))
            .map_err(|e| ConversionError::new(text, Self::TYPE_NAME, column_type, e))
    }

    fn format_column(&self, _column_type: ColumnType) -> String {
        self.format(DATE_FORMAT).to_string()
    }
}

impl ColumnScalar for NaiveDateTime {
    const TYPE_NAME: &'static str = "NaiveDateTime";

    fn parse_column(text: &str, column_type: ColumnType) -> Result<Self, ConversionError> {
        let trimmed = text.trim();
        if let Some(ts) = parse_timestamp(trimmed) {
            return Ok(ts);
        }
        NaiveDate::parse_from_str(trimmed, DATE_FORMAT)
            .map(|date| date.and_time(chrono::NaiveTime::MIN))
            .map_err(|e| ConversionError::new(text, Self::TYPE_NAME, column_type, e))
    }

    fn format_column(&self, _column_type: ColumnType) -> String {
        self.format(TIMESTAMP_FORMATS[0]).to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_parsing() {
        assert_eq!(i32::parse_column(" 42 ", ColumnType::Integer), Ok(42));
        assert_eq!(i64::parse_column("9000000000", ColumnType::BigInt), Ok(9_000_000_000));

        let err = i32::parse_column("4x2", ColumnType::Integer).unwrap_err();
        assert_eq!(err.text, "4x2");
        assert_eq!(err.target, "i32");
        assert_eq!(err.column_type, ColumnType::Integer);
    }

    #[test]
    fn test_null_and_blank_text() {
        assert_eq!(i32::read_column(None, ColumnType::Integer), Ok(None));
        assert_eq!(i32::read_column(Some("  "), ColumnType::Integer), Ok(None));
        assert_eq!(
            String::read_column(Some(""), ColumnType::VarChar),
            Ok(Some(String::new()))
        );
    }

    #[test]
    fn test_numeric_decimal() {
        let value = Decimal::parse_column("12.50", ColumnType::Numeric).unwrap();
        assert_eq!(value.format_column(ColumnType::Numeric), "12.50");
    }

    #[test]
    fn test_bool_formats_by_column_type() {
        assert_eq!(true.format_column(ColumnType::Integer), "1");
        assert_eq!(false.format_column(ColumnType::Integer), "0");
        assert_eq!(true.format_column(ColumnType::Boolean), "true");
        assert_eq!(bool::parse_column("Y", ColumnType::Char), Ok(true));
        assert_eq!(bool::parse_column("0", ColumnType::Integer), Ok(false));
        assert!(bool::parse_column("maybe", ColumnType::Boolean).is_err());
    }

    #[test]
    fn test_dates_and_timestamps() {
        let date = NaiveDate::parse_column("2024-02-29", ColumnType::Date).unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 2, 29).unwrap());
        assert_eq!(
            NaiveDate::parse_column("2024-02-29 13:45:00", ColumnType::Timestamp).unwrap(),
            date
        );

        let ts = NaiveDateTime::parse_column("2024-02-29 13:45:07", ColumnType::Timestamp).unwrap();
        assert_eq!(ts.format_column(ColumnType::Timestamp), "2024-02-29 13:45:07");

        let midnight = NaiveDateTime::parse_column("2024-02-29", ColumnType::Date).unwrap();
        assert_eq!(midnight.format_column(ColumnType::Timestamp), "2024-02-29 00:00:00");

        assert!(NaiveDate::parse_column("29/02/2024", ColumnType::Date).is_err());
    }

    #[test]
    fn test_column_type_display_and_classes() {
        assert_eq!(ColumnType::VarChar.to_string(), "VARCHAR");
        assert!(ColumnType::Numeric.is_numeric());
        assert!(!ColumnType::Date.is_numeric());
        assert!(ColumnType::Char.is_character());
    }
}
