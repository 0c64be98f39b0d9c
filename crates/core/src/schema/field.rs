use std::fmt;

/// Storage type tag for key attributes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// String
    S,
    /// Number
    N,
    /// Binary
    B,
}

impl TypeTag {
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeTag::S => "S",
            TypeTag::N => "N",
            TypeTag::B => "B",
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The kind of value a schema field accepts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Integer,
    Float,
    Number,
    /// Exact decimal, carried as text.
    Decimal,
    Boolean,
    /// RFC 3339 timestamp.
    DateTime,
    /// `YYYY-MM-DD`.
    Date,
    Uuid,
    Email,
    /// Opaque bytes, base64 encoded in documents.
    Raw,
    List(Box<FieldKind>),
    Dict,
}

impl FieldKind {
    /// Maps a field kind to the storage type tag used for its key attribute.
    ///
    /// Numeric kinds store as `N`, raw bytes as `B`, and everything else as `S`.
    pub fn type_tag(&self) -> TypeTag {
        match self {
            FieldKind::Integer | FieldKind::Float | FieldKind::Number | FieldKind::Decimal => {
                TypeTag::N
            }
            FieldKind::Raw => TypeTag::B,
            _ => TypeTag::S,
        }
    }

    /// Whether a field of this kind can serve as a hash or range key.
    pub fn is_key_kind(&self) -> bool {
        !matches!(
            self,
            FieldKind::Boolean | FieldKind::List(_) | FieldKind::Dict
        )
    }

    pub fn name(&self) -> String {
        match self {
            FieldKind::String => "string".to_string(),
            FieldKind::Integer => "integer".to_string(),
            FieldKind::Float => "float".to_string(),
            FieldKind::Number => "number".to_string(),
            FieldKind::Decimal => "decimal".to_string(),
            FieldKind::Boolean => "boolean".to_string(),
            FieldKind::DateTime => "datetime".to_string(),
            FieldKind::Date => "date".to_string(),
            FieldKind::Uuid => "uuid".to_string(),
            FieldKind::Email => "email".to_string(),
            FieldKind::Raw => "raw".to_string(),
            FieldKind::List(inner) => format!("list<{}>", inner.name()),
            FieldKind::Dict => "dict".to_string(),
        }
    }
}

/// A named, typed schema field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub name: String,
    pub kind: FieldKind,
    pub required: bool,
}
