use indexmap::IndexMap;

use crate::value::Value;

/// Column name to value mapping. Columns keep the order they were inserted in.
///
/// # Examples
/// ```
/// use delimited_sort::record::Record;
/// let record = Record::new()
///     .with("name", "Tom Hanks")
///     .with("age", 59);
/// assert_eq!(record.columns().collect::<Vec<&str>>(), vec!["name", "age"]);
/// ```
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Record {
    values: IndexMap<String, Value>,
}

impl Record {
    pub fn new() -> Record {
        Record {
            values: IndexMap::new(),
        }
    }

    pub fn with<V: Into<Value>>(mut self, column: &str, value: V) -> Record {
        self.insert(column, value);
        self
    }

    pub fn insert<V: Into<Value>>(&mut self, column: &str, value: V) -> Option<Value> {
        self.values.insert(column.to_string(), value.into())
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.values.get(column)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Record {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Record {
            values: iter
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        }
    }
}
