use std::cmp::Ordering;
use std::str::FromStr;

use crate::error::SortError;
use crate::field::Field;
use crate::field_type::FieldType;
use crate::value::Value;

#[derive(Debug)]
pub(crate) enum Key {
    String {
        s: String
    },
    Integer {
        i: i64
    },
    Number {
        n: f64
    },
}

impl Key {
    /// Build the key of `text` as declared by `field_def`.
    pub(crate) fn new(text: &str, field_def: &Field) -> Result<Key, SortError> {
        let unorderable = || SortError::Unorderable {
            column: field_def.name().to_string(),
            value: text.to_string(),
            field_type: field_def.field_type().to_string(),
        };
        match field_def.field_type() {
            FieldType::String => {
                let mut key = text.to_string();
                if field_def.ignore_blanks() {
                    key = key.trim().to_string();
                }

                if field_def.ignore_case() {
                    key = key.to_uppercase()
                }

                Ok(
                    Key::String {
                        s: key
                    }
                )
            }
            FieldType::Integer => {
                let i = i64::from_str(text.trim()).map_err(|_| unorderable())?;
                Ok(
                    Key::Integer {
                        i
                    }
                )
            }
            FieldType::Number => {
                let n = f64::from_str(text.trim()).map_err(|_| unorderable())?;
                Ok(
                    Key::Number {
                        n
                    }
                )
            }
        }
    }

    /// Build the key of a record value. The value goes through its text rendering so that it
    /// orders exactly like the same value read back from a file.
    pub(crate) fn from_value(value: &Value, field_def: &Field) -> Result<Key, SortError> {
        match value.as_field() {
            None => Err(
                SortError::MissingColumn {
                    column: field_def.name().to_string()
                }
            ),
            Some(text) => Key::new(&text, field_def),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            Key::String { .. } => 0,
            Key::Integer { .. } => 1,
            Key::Number { .. } => 2,
        }
    }
}

impl Eq for Key {}

impl PartialEq<Self> for Key {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd<Self> for Key {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Key {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Key::String { s }, Key::String { s: other }) => s.cmp(other),
            (Key::Integer { i }, Key::Integer { i: other }) => i.cmp(other),
            (Key::Number { n }, Key::Number { n: other }) => {
                if n.is_nan() && other.is_nan() {
                    Ordering::Equal
                } else if !n.is_nan() && other.is_nan() {
                    Ordering::Greater
                } else if n.is_nan() && !other.is_nan() {
                    Ordering::Less
                } else {
                    n.partial_cmp(other).unwrap_or(Ordering::Equal)
                }
            }
            // keys at one position share a field definition, mixed variants do not occur
            _ => self.rank().cmp(&other.rank()),
        }
    }
}
