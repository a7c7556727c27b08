//! Reflective struct-to-struct copying.
//!
//! Records opt in with `#[derive(Record)]`; the engine then matches fields
//! by name and transfers each value by assignment, deep duplication, a
//! caller-supplied [`Converter`] or a built-in conversion, as directed by
//! [`CopyOptions`].

// Lets `#[derive(Record)]` expand to `::vtool_bean::...` inside this crate too.
extern crate self as vtool_bean;

pub mod config;
pub mod converter;
mod convert;
pub mod copier;
mod deep;
pub mod error;
pub mod record;
pub mod value;
pub mod zero;

pub use vtool_bean_derive::Record;

pub use config::{CopyOptions, DEFAULT_MAX_DEPTH};
pub use converter::{BoxError, Converter};
pub use copier::{copy, copy_deep, copy_deep_non_nil_only, copy_with};
pub use error::CopyError;
pub use record::{FieldInfo, Record};
pub use value::{
    Kind, Mapping, Number, NumberSlot, Pointer, Sequence, TypeInfo, Typed, Value, ValueMut,
    ValueRef,
};
pub use zero::is_empty;
