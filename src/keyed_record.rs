use std::cmp::Ordering;
use std::path::Path;

use crate::error::SortError;
use crate::field::Field;
use crate::key::Key;
use crate::order::Order;
use crate::record::Record;

/// An item paired with its sort key. Items compare by key only.
#[derive(Debug)]
pub(crate) struct KeyedRecord<T> {
    item: T,
    keys: Vec<Key>,
    order: Order,
}

impl KeyedRecord<Record> {
    pub(crate) fn from_record(record: Record, fields: &[Field], order: Order) -> Result<KeyedRecord<Record>, SortError> {
        let mut keys = Vec::with_capacity(fields.len());
        for field in fields {
            let value = record.get(field.name()).ok_or_else(
                || SortError::MissingColumn {
                    column: field.name().to_string()
                }
            )?;
            keys.push(Key::from_value(value, field)?);
        }
        Ok(
            KeyedRecord {
                item: record,
                keys,
                order,
            }
        )
    }
}

impl KeyedRecord<Vec<String>> {
    /// Key a parsed row using column positions resolved by [resolve_indices].
    pub(crate) fn from_row(row: Vec<String>, indices: &[usize], fields: &[Field], order: Order) -> Result<KeyedRecord<Vec<String>>, SortError> {
        let mut keys = Vec::with_capacity(fields.len());
        for (index, field) in indices.iter().zip(fields) {
            let text = row.get(*index).map(String::as_str).unwrap_or("");
            keys.push(Key::new(text, field)?);
        }
        Ok(
            KeyedRecord {
                item: row,
                keys,
                order,
            }
        )
    }
}

impl<T> KeyedRecord<T> {
    pub(crate) fn item(&self) -> &T {
        &self.item
    }
}

/// Positions of the sort fields within `header`.
pub(crate) fn resolve_indices(header: &[String], fields: &[Field], path: &Path) -> Result<Vec<usize>, SortError> {
    fields
        .iter()
        .map(
            |field| header
                .iter()
                .position(|column| column == field.name())
                .ok_or_else(
                    || SortError::UnknownColumn {
                        column: field.name().to_string(),
                        path: path.display().to_string(),
                    }
                )
        )
        .collect()
}

impl<T> Eq for KeyedRecord<T> {}

impl<T> PartialEq<Self> for KeyedRecord<T> {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys
    }
}

impl<T> PartialOrd<Self> for KeyedRecord<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for KeyedRecord<T> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.order.apply(self.keys.cmp(&other.keys))
    }
}
