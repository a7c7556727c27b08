use crate::value::{TypeInfo, Value};

/// Error type returned by caller-supplied converters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Caller-supplied field converter.
///
/// Consulted only when the source and destination field types differ, and
/// always before the built-in rules. The returned value is assigned to the
/// destination as-is; if it is not of type `target` the copy fails with
/// `IncompatibleValue` at assignment time.
pub trait Converter: Send + Sync {
    fn convert(&self, value: &dyn Value, target: TypeInfo) -> Result<Box<dyn Value>, BoxError>;
}

impl<F> Converter for F
where
    F: Fn(&dyn Value, TypeInfo) -> Result<Box<dyn Value>, BoxError> + Send + Sync,
{
    fn convert(&self, value: &dyn Value, target: TypeInfo) -> Result<Box<dyn Value>, BoxError> {
        self(value, target)
    }
}
