use crate::converter::BoxError;
use crate::value::TypeInfo;

#[derive(Debug, thiserror::Error)]
pub enum CopyError {
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    #[error("source pointer is nil")]
    NilSource,

    #[error("{side} must be a record, found {kind} {found}", kind = .found.kind())]
    TypeMismatch { side: &'static str, found: TypeInfo },

    #[error("error copying field {field}: {source}")]
    Field {
        field: &'static str,
        source: Box<CopyError>,
    },

    #[error("cannot convert from {from} to {to}")]
    UnsupportedConversion { from: TypeInfo, to: TypeInfo },

    #[error("parse error: {0}")]
    Parse(#[from] chrono::ParseError),

    #[error("cannot assign {found} to {expected}")]
    IncompatibleValue { expected: TypeInfo, found: TypeInfo },

    #[error(transparent)]
    Converter(BoxError),

    #[error("deep copy exceeded max depth {limit}")]
    DepthExceeded { limit: usize },
}

impl CopyError {
    pub(crate) fn in_field(self, field: &'static str) -> Self {
        CopyError::Field {
            field,
            source: Box::new(self),
        }
    }

    /// Name of the destination field that failed, if this is a field error.
    pub fn field_name(&self) -> Option<&'static str> {
        match self {
            CopyError::Field { field, .. } => Some(field),
            _ => None,
        }
    }

    /// The innermost error, unwrapping field context.
    pub fn root_cause(&self) -> &CopyError {
        match self {
            CopyError::Field { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
