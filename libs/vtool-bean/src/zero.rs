use crate::value::{Value, ValueRef};

/// Zero-value test used by `ignore_empty`.
///
/// Empty: `false`, numeric zero, `""`, arrays whose elements are all empty,
/// `None`, and slices or maps without entries. Timestamps, records and
/// opaque values are never empty.
pub fn is_empty(value: &dyn Value) -> bool {
    match value.reflect() {
        ValueRef::Unit => true,
        ValueRef::Bool(b) => !b,
        ValueRef::Number(n) => n.is_zero(),
        ValueRef::Str(s) => s.is_empty(),
        ValueRef::Array(items) => (0..items.len()).all(|i| items.get(i).is_none_or(is_empty)),
        ValueRef::Slice(items) => items.is_empty(),
        ValueRef::Map(entries) => entries.is_empty(),
        ValueRef::Pointer(p) => p.is_nil(),
        ValueRef::Time(_) | ValueRef::Record(_) | ValueRef::Opaque => false,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use chrono::{DateTime, Utc};

    use super::*;

    #[test]
    fn scalars() {
        assert!(is_empty(&false));
        assert!(!is_empty(&true));
        assert!(is_empty(&0i32));
        assert!(!is_empty(&-1i64));
        assert!(is_empty(&0u8));
        assert!(is_empty(&0.0f64));
        assert!(!is_empty(&0.5f32));
        assert!(is_empty(&String::new()));
        assert!(!is_empty(&String::from("x")));
    }

    #[test]
    fn arrays_are_empty_only_when_every_element_is() {
        assert!(is_empty(&[0u8; 4]));
        assert!(!is_empty(&[0u8, 0, 1, 0]));
        assert!(is_empty(&[String::new(), String::new()]));
    }

    #[test]
    fn containers_and_pointers() {
        assert!(is_empty(&Vec::<i32>::new()));
        assert!(!is_empty(&vec![0]));
        assert!(is_empty(&HashMap::<String, i32>::new()));
        assert!(is_empty(&None::<Box<i32>>));
        assert!(!is_empty(&Some(0)));
        assert!(!is_empty(&Box::new(0)));
    }

    #[test]
    fn opaque_kinds_are_never_empty() {
        assert!(!is_empty(&DateTime::<Utc>::default()));
        assert!(!is_empty(&'\0'));
    }
}
