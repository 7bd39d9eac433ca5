use std::fmt::{Display, Formatter};

/// Field type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldType {
    /// String, compared lexicographically
    String,
    /// Signed 64 bit integer
    Integer,
    /// 64 bit floating point number
    Number,
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            FieldType::String => write!(f, "string"),
            FieldType::Integer => write!(f, "integer"),
            FieldType::Number => write!(f, "number"),
        }
    }
}
