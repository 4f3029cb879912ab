//! The typed, nullable scalar value system.
//!
//! `BoxedValue` is a sum type (a closed [`Scalar`] enum under an
//! `Option`), not a class hierarchy, per the no-virtual-dispatch design
//! note this engine follows. It supports parsing from and formatting
//! to text, equality, and a fallible total order (comparing across
//! `DataType`s is a type error, never a panic).

use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The closed set of scalar types a column may hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DataType {
    Integer,
    Text,
    Boolean,
    Float,
    Double,
    Char,
    Date,
    Time,
    DateTime,
}

impl DataType {
    /// Resolves a DDL type name. Exact upper-case spelling, as listed
    /// in the external keyword/type table; anything else is not a
    /// known type.
    pub fn from_ddl_name(name: &str) -> Option<DataType> {
        Some(match name {
            "INTEGER" => DataType::Integer,
            "TEXT" => DataType::Text,
            "BOOLEAN" => DataType::Boolean,
            "FLOAT" => DataType::Float,
            "DOUBLE" => DataType::Double,
            "CHAR" => DataType::Char,
            "DATE" => DataType::Date,
            "TIME" => DataType::Time,
            "DATETIME" => DataType::DateTime,
            _ => return None,
        })
    }
}

impl fmt::Display for DataType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DataType::Integer => "INTEGER",
            DataType::Text => "TEXT",
            DataType::Boolean => "BOOLEAN",
            DataType::Float => "FLOAT",
            DataType::Double => "DOUBLE",
            DataType::Char => "CHAR",
            DataType::Date => "DATE",
            DataType::Time => "TIME",
            DataType::DateTime => "DATETIME",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
enum Scalar {
    Integer(i64),
    Text(String),
    Boolean(bool),
    Float(f32),
    Double(f64),
    Char(char),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
}

/// A typed, nullable value. `NULL` is represented by `scalar` being
/// absent; the `DataType` is always known even for a NULL, since it
/// comes from the owning column.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxedValue {
    data_type: DataType,
    scalar: Option<Scalar>,
}

const DATE_FORMAT: &str = "%Y-%m-%d";
const TIME_FORMAT: &str = "%H:%M:%S";
const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

impl BoxedValue {
    /// The NULL value of a given type.
    pub fn null(data_type: DataType) -> Self {
        BoxedValue {
            data_type,
            scalar: None,
        }
    }

    pub fn data_type(&self) -> DataType {
        self.data_type
    }

    pub fn is_absent(&self) -> bool {
        self.scalar.is_none()
    }

    /// Parses literal text against a declared type. The literal
    /// `"NULL"` (exact case, regardless of whether it came from a
    /// quoted string or a bare identifier token) always yields an
    /// absent value — a quirk carried over from the source program,
    /// where the value parser never distinguishes how a literal was
    /// lexed.
    pub fn from_text(text: &str, data_type: DataType) -> Result<Self> {
        if text == "NULL" {
            return Ok(BoxedValue::null(data_type));
        }
        let scalar = match data_type {
            DataType::Integer => Scalar::Integer(
                text.parse::<i64>()
                    .map_err(|_| Error::Type(format!("'{text}' is not a valid INTEGER")))?,
            ),
            DataType::Float => Scalar::Float(
                text.parse::<f32>()
                    .map_err(|_| Error::Type(format!("'{text}' is not a valid FLOAT")))?,
            ),
            DataType::Double => Scalar::Double(
                text.parse::<f64>()
                    .map_err(|_| Error::Type(format!("'{text}' is not a valid DOUBLE")))?,
            ),
            DataType::Boolean => match text {
                "true" => Scalar::Boolean(true),
                "false" => Scalar::Boolean(false),
                _ => {
                    return Err(Error::Type(format!(
                        "'{text}' is not a valid BOOLEAN (expected true or false)"
                    )))
                }
            },
            DataType::Text => Scalar::Text(text.to_string()),
            DataType::Char => {
                let mut chars = text.chars();
                let (Some(c), None) = (chars.next(), chars.next()) else {
                    return Err(Error::Type(format!(
                        "'{text}' is not a valid CHAR (expected exactly one character)"
                    )));
                };
                Scalar::Char(c)
            }
            DataType::Date => Scalar::Date(
                NaiveDate::parse_from_str(text, DATE_FORMAT)
                    .map_err(|_| Error::Type(format!("'{text}' is not a valid DATE")))?,
            ),
            DataType::Time => Scalar::Time(
                NaiveTime::parse_from_str(text, TIME_FORMAT)
                    .map_err(|_| Error::Type(format!("'{text}' is not a valid TIME")))?,
            ),
            DataType::DateTime => Scalar::DateTime(
                NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
                    .map_err(|_| Error::Type(format!("'{text}' is not a valid DATETIME")))?,
            ),
        };
        Ok(BoxedValue {
            data_type,
            scalar: Some(scalar),
        })
    }

    /// Formats this value back to text. Inverse of [`Self::from_text`]
    /// up to the canonical form of each type.
    pub fn to_text(&self) -> String {
        match &self.scalar {
            None => "NULL".to_string(),
            Some(Scalar::Integer(v)) => v.to_string(),
            Some(Scalar::Float(v)) => v.to_string(),
            Some(Scalar::Double(v)) => v.to_string(),
            Some(Scalar::Boolean(v)) => v.to_string(),
            Some(Scalar::Text(v)) => v.clone(),
            Some(Scalar::Char(v)) => v.to_string(),
            Some(Scalar::Date(v)) => v.format(DATE_FORMAT).to_string(),
            Some(Scalar::Time(v)) => v.format(TIME_FORMAT).to_string(),
            Some(Scalar::DateTime(v)) => v.format(DATETIME_FORMAT).to_string(),
        }
    }

    /// Value equality: two absent values are equal; presence vs.
    /// absence is never equal; values of different declared types are
    /// never equal (this never happens in practice, since every
    /// comparison site in the engine drives both sides from the same
    /// column's type).
    pub fn value_eq(&self, other: &BoxedValue) -> bool {
        if self.data_type != other.data_type {
            return false;
        }
        match (&self.scalar, &other.scalar) {
            (None, None) => true,
            (None, Some(_)) | (Some(_), None) => false,
            (Some(a), Some(b)) => a == b,
        }
    }

    /// The fallible total order: absent sorts below present; among
    /// present values of the same type, ordinary ordering applies
    /// except for `FLOAT`/`DOUBLE`, where NaN is defined to compare
    /// equal to NaN and greater than any non-NaN value (the NaN-as-
    /// maximal policy — see DESIGN.md). Comparing across `DataType`s
    /// is a type error.
    pub fn compare(&self, other: &BoxedValue) -> Result<Ordering> {
        if self.data_type != other.data_type {
            return Err(Error::Type(format!(
                "cannot compare {} with {}",
                self.data_type, other.data_type
            )));
        }
        match (&self.scalar, &other.scalar) {
            (None, None) => Ok(Ordering::Equal),
            (None, Some(_)) => Ok(Ordering::Less),
            (Some(_), None) => Ok(Ordering::Greater),
            (Some(a), Some(b)) => Ok(Self::compare_scalars(a, b)),
        }
    }

    fn compare_scalars(a: &Scalar, b: &Scalar) -> Ordering {
        match (a, b) {
            (Scalar::Integer(a), Scalar::Integer(b)) => a.cmp(b),
            (Scalar::Text(a), Scalar::Text(b)) => a.cmp(b),
            (Scalar::Boolean(a), Scalar::Boolean(b)) => a.cmp(b),
            (Scalar::Char(a), Scalar::Char(b)) => a.cmp(b),
            (Scalar::Date(a), Scalar::Date(b)) => a.cmp(b),
            (Scalar::Time(a), Scalar::Time(b)) => a.cmp(b),
            (Scalar::DateTime(a), Scalar::DateTime(b)) => a.cmp(b),
            (Scalar::Float(a), Scalar::Float(b)) => Self::compare_nan_as_maximal(
                f64::from(*a),
                f64::from(*b),
            ),
            (Scalar::Double(a), Scalar::Double(b)) => Self::compare_nan_as_maximal(*a, *b),
            _ => unreachable!("compare_scalars called on mismatched variants"),
        }
    }

    fn compare_nan_as_maximal(a: f64, b: f64) -> Ordering {
        match (a.is_nan(), b.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Greater,
            (false, true) => Ordering::Less,
            (false, false) => a.partial_cmp(&b).expect("non-NaN floats are always ordered"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_integer_text_and_boolean() {
        for (text, ty) in [
            ("42", DataType::Integer),
            ("-7", DataType::Integer),
            ("hello", DataType::Text),
            ("true", DataType::Boolean),
            ("false", DataType::Boolean),
        ] {
            let v = BoxedValue::from_text(text, ty).unwrap();
            assert_eq!(v.to_text(), text);
        }
    }

    #[test]
    fn round_trips_temporal_types() {
        let date = BoxedValue::from_text("2024-01-05", DataType::Date).unwrap();
        assert_eq!(date.to_text(), "2024-01-05");
        let time = BoxedValue::from_text("08:30:00", DataType::Time).unwrap();
        assert_eq!(time.to_text(), "08:30:00");
        let dt = BoxedValue::from_text("2024-01-05T08:30:00", DataType::DateTime).unwrap();
        assert_eq!(dt.to_text(), "2024-01-05T08:30:00");
    }

    #[test]
    fn null_literal_yields_absent_regardless_of_type() {
        let v = BoxedValue::from_text("NULL", DataType::Integer).unwrap();
        assert!(v.is_absent());
        assert_eq!(v.to_text(), "NULL");
    }

    #[test]
    fn char_requires_exactly_one_character() {
        assert!(BoxedValue::from_text("a", DataType::Char).is_ok());
        assert!(BoxedValue::from_text("ab", DataType::Char).is_err());
        assert!(BoxedValue::from_text("", DataType::Char).is_err());
    }

    #[test]
    fn absent_sorts_below_present() {
        let null = BoxedValue::null(DataType::Integer);
        let one = BoxedValue::from_text("1", DataType::Integer).unwrap();
        assert_eq!(null.compare(&one).unwrap(), Ordering::Less);
        assert_eq!(one.compare(&null).unwrap(), Ordering::Greater);
        assert_eq!(null.compare(&BoxedValue::null(DataType::Integer)).unwrap(), Ordering::Equal);
    }

    #[test]
    fn total_order_on_integers() {
        let a = BoxedValue::from_text("1", DataType::Integer).unwrap();
        let b = BoxedValue::from_text("2", DataType::Integer).unwrap();
        assert_eq!(a.compare(&b).unwrap(), Ordering::Less);
        assert_eq!(b.compare(&a).unwrap(), Ordering::Greater);
        assert_eq!(a.compare(&a).unwrap(), Ordering::Equal);
    }

    #[test]
    fn nan_compares_equal_to_nan_and_greater_than_anything_else() {
        let nan = BoxedValue::from_text("NaN", DataType::Double).unwrap();
        let other_nan = BoxedValue::from_text("NaN", DataType::Double).unwrap();
        let one = BoxedValue::from_text("1.0", DataType::Double).unwrap();
        assert_eq!(nan.compare(&other_nan).unwrap(), Ordering::Equal);
        assert_eq!(nan.compare(&one).unwrap(), Ordering::Greater);
        assert_eq!(one.compare(&nan).unwrap(), Ordering::Less);
    }

    #[test]
    fn comparing_different_types_is_a_type_error() {
        let int = BoxedValue::from_text("1", DataType::Integer).unwrap();
        let text = BoxedValue::from_text("1", DataType::Text).unwrap();
        assert!(int.compare(&text).is_err());
    }

    #[test]
    fn value_eq_treats_two_absent_as_equal_and_presence_as_unequal() {
        let a = BoxedValue::null(DataType::Integer);
        let b = BoxedValue::null(DataType::Integer);
        let c = BoxedValue::from_text("1", DataType::Integer).unwrap();
        assert!(a.value_eq(&b));
        assert!(!a.value_eq(&c));
    }
}
