use crate::value::Value;

/// Static description of a single record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldInfo {
    pub name: &'static str,
    /// `true` for plain `pub` fields. Only exported fields are name-matched.
    pub exported: bool,
}

/// Field-level access to a structured value.
///
/// Implemented by `#[derive(Record)]`. Indices are positions in
/// [`Record::fields`], i.e. declaration order.
pub trait Record {
    fn fields(&self) -> &'static [FieldInfo];

    fn field(&self, index: usize) -> Option<&dyn Value>;

    /// `None` means the field cannot be written through this record.
    fn field_mut(&mut self, index: usize) -> Option<&mut dyn Value>;
}
