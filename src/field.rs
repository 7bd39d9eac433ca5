use crate::field_type::FieldType;

/// Defines a sort key column.
///
/// The same definition is used to order records in memory and rows read back from disk, so the
/// declared [FieldType] decides the ordering in both places.
///
/// # Examples
/// ```
/// // order by the "city" column ignoring case and surrounding blanks
/// use delimited_sort::field::Field;
/// use delimited_sort::field_type::FieldType;
/// let field = Field::new("city", FieldType::String)
///     .with_ignore_blanks(true)
///     .with_ignore_case(true);
/// ```
#[derive(Clone, Debug)]
pub struct Field {
    name: String,
    field_type: FieldType,
    ignore_blanks: bool,
    ignore_case: bool,
}

impl Field {
    /// Create a new [Field]
    ///
    /// # Arguments
    /// * `name` - the column name, matched against record keys and file headers
    /// * `field_type` - the type of the field. See [FieldType] for supported types
    ///
    /// # Examples
    /// ```
    /// use delimited_sort::field::Field;
    /// use delimited_sort::field_type::FieldType;
    /// let field = Field::new("age", FieldType::Integer);
    /// ```
    pub fn new(name: &str, field_type: FieldType) -> Field {
        Field {
            name: name.to_string(),
            field_type,
            ignore_blanks: false,
            ignore_case: false,
        }
    }

    /// A String field compared lexicographically.
    pub fn string(name: &str) -> Field {
        Field::new(name, FieldType::String)
    }

    /// Column name matched against record keys and file headers.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn field_type(&self) -> FieldType {
        self.field_type
    }

    pub fn ignore_blanks(&self) -> bool {
        self.ignore_blanks
    }

    pub fn ignore_case(&self) -> bool {
        self.ignore_case
    }

    /// Replace the declared [FieldType].
    pub fn with_field_type(mut self, field_type: FieldType) -> Field {
        self.field_type = field_type;
        self
    }

    /// Trim surrounding whitespace from String keys. Integer and Number keys are always trimmed.
    pub fn with_ignore_blanks(mut self, ignore_blanks: bool) -> Field {
        self.ignore_blanks = ignore_blanks;
        self
    }

    /// Compare String keys in upper case.
    pub fn with_ignore_case(mut self, ignore_case: bool) -> Field {
        self.ignore_case = ignore_case;
        self
    }
}
