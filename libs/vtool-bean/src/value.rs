use std::any::{Any, TypeId};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::error::CopyError;
use crate::record::Record;

/// Runtime kind of a value. Drives the zero test, deep duplication and
/// built-in conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    /// `()` — the untyped nil argument.
    Unit,
    Bool,
    Int,
    Uint,
    Float,
    String,
    Time,
    Array,
    Slice,
    Map,
    /// Nullable (`Option`) or owning (`Box`, `Rc`, `Arc`) indirection.
    Pointer,
    Record,
    /// Anything the engine does not look into. Copied by assignment.
    Opaque,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Unit => "unit",
            Kind::Bool => "bool",
            Kind::Int => "int",
            Kind::Uint => "uint",
            Kind::Float => "float",
            Kind::String => "string",
            Kind::Time => "time",
            Kind::Array => "array",
            Kind::Slice => "slice",
            Kind::Map => "map",
            Kind::Pointer => "pointer",
            Kind::Record => "record",
            Kind::Opaque => "opaque",
        };
        f.write_str(name)
    }
}

/// Type descriptor. Equality is `TypeId` equality.
#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    id: TypeId,
    name: &'static str,
    kind: Kind,
}

impl TypeInfo {
    pub fn of<T: Typed>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            kind: T::KIND,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl fmt::Display for TypeInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// 64-bit intermediate for numeric conversion.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Number {
    pub fn is_zero(&self) -> bool {
        match *self {
            Number::Int(v) => v == 0,
            Number::Uint(v) => v == 0,
            Number::Float(v) => v == 0.0,
        }
    }
}

/// Write access to a concrete numeric type.
pub trait NumberSlot {
    /// Stores `n` with `as`-cast semantics: integers wrap, floats saturate
    /// when narrowed to integers.
    fn store(&mut self, n: Number);
}

/// Ordered sequence: `Vec<T>` or `[T; N]`.
pub trait Sequence {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn get(&self, index: usize) -> Option<&dyn Value>;

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Value>;

    /// Replaces the contents with `len` zero elements. Fixed-size arrays
    /// keep their length and contents.
    fn reset(&mut self, len: usize);
}

pub trait Mapping {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> Vec<(&dyn Value, &dyn Value)>;

    fn clear(&mut self);

    /// Fails with `IncompatibleValue` if key or value is not of the map's type.
    fn insert(&mut self, key: Box<dyn Value>, value: Box<dyn Value>) -> Result<(), CopyError>;
}

pub trait Pointer {
    fn elem(&self) -> Option<&dyn Value>;

    /// For shared pointers (`Rc`, `Arc`) this detaches the pointee first.
    fn elem_mut(&mut self) -> Option<&mut dyn Value>;

    fn is_nil(&self) -> bool {
        self.elem().is_none()
    }

    /// Attaches a zero pointee if nil.
    fn alloc(&mut self);

    /// No-op for non-nullable pointers.
    fn set_nil(&mut self);
}

/// Shared, kind-dispatched view of a value.
pub enum ValueRef<'a> {
    Unit,
    Bool(bool),
    Number(Number),
    Str(&'a str),
    Time(&'a DateTime<Utc>),
    Array(&'a dyn Sequence),
    Slice(&'a dyn Sequence),
    Map(&'a dyn Mapping),
    Pointer(&'a dyn Pointer),
    Record(&'a dyn Record),
    Opaque,
}

/// Mutable, kind-dispatched view of a value.
pub enum ValueMut<'a> {
    Unit,
    Bool(&'a mut bool),
    Number(&'a mut dyn NumberSlot),
    Str(&'a mut String),
    Time(&'a mut DateTime<Utc>),
    Array(&'a mut dyn Sequence),
    Slice(&'a mut dyn Sequence),
    Map(&'a mut dyn Mapping),
    Pointer(&'a mut dyn Pointer),
    Record(&'a mut dyn Record),
    Opaque,
}

/// Object-safe value accessor used by the engine.
///
/// Not implemented directly: every [`Typed`] type gets it through a blanket impl.
pub trait Value: Any {
    fn type_info(&self) -> TypeInfo;

    fn reflect(&self) -> ValueRef<'_>;

    fn reflect_mut(&mut self) -> ValueMut<'_>;

    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    fn clone_value(&self) -> Box<dyn Value>;

    /// A fresh zero value of the same type.
    fn new_zeroed(&self) -> Box<dyn Value>;

    /// Shallow assignment from a value of the same type (`Clone` semantics).
    fn assign(&mut self, src: &dyn Value) -> Result<(), CopyError>;

    /// Replaces `self` with `value`, which must be of the same type.
    fn set(&mut self, value: Box<dyn Value>) -> Result<(), CopyError>;
}

impl dyn Value {
    pub fn kind(&self) -> Kind {
        self.type_info().kind()
    }

    pub fn is<T: Any>(&self) -> bool {
        self.as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }
}

impl fmt::Debug for dyn Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value<{}>", self.type_info())
    }
}

/// Statically typed values that expose a reflective view.
///
/// Implement this (or derive `Record`) to make a type copyable by the engine.
pub trait Typed: Clone + 'static {
    const KIND: Kind;

    /// The type's zero value.
    fn zeroed() -> Self;

    fn view(&self) -> ValueRef<'_>;

    fn view_mut(&mut self) -> ValueMut<'_>;
}

impl<T: Typed> Value for T {
    fn type_info(&self) -> TypeInfo {
        TypeInfo::of::<T>()
    }

    fn reflect(&self) -> ValueRef<'_> {
        self.view()
    }

    fn reflect_mut(&mut self) -> ValueMut<'_> {
        self.view_mut()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    fn clone_value(&self) -> Box<dyn Value> {
        Box::new(self.clone())
    }

    fn new_zeroed(&self) -> Box<dyn Value> {
        Box::new(T::zeroed())
    }

    fn assign(&mut self, src: &dyn Value) -> Result<(), CopyError> {
        match src.as_any().downcast_ref::<T>() {
            Some(v) => {
                self.clone_from(v);
                Ok(())
            }
            None => Err(CopyError::IncompatibleValue {
                expected: TypeInfo::of::<T>(),
                found: src.type_info(),
            }),
        }
    }

    fn set(&mut self, value: Box<dyn Value>) -> Result<(), CopyError> {
        *self = downcast::<T>(value)?;
        Ok(())
    }
}

/// Boxes a value for returning from a [`Converter`](crate::Converter).
pub fn boxed<T: Typed>(value: T) -> Box<dyn Value> {
    Box::new(value)
}

pub(crate) fn downcast<T: Typed>(value: Box<dyn Value>) -> Result<T, CopyError> {
    let found = value.type_info();
    match value.into_any().downcast::<T>() {
        Ok(v) => Ok(*v),
        Err(_) => Err(CopyError::IncompatibleValue {
            expected: TypeInfo::of::<T>(),
            found,
        }),
    }
}

// ---------------------------------------------------------------------------
// Scalars
// ---------------------------------------------------------------------------

macro_rules! impl_number {
    ($($t:ty => $variant:ident($wide:ty), $kind:ident;)*) => {$(
        impl Typed for $t {
            const KIND: Kind = Kind::$kind;

            fn zeroed() -> Self {
                0 as $t
            }

            fn view(&self) -> ValueRef<'_> {
                ValueRef::Number(Number::$variant(*self as $wide))
            }

            fn view_mut(&mut self) -> ValueMut<'_> {
                ValueMut::Number(self)
            }
        }

        impl NumberSlot for $t {
            fn store(&mut self, n: Number) {
                *self = match n {
                    Number::Int(v) => v as $t,
                    Number::Uint(v) => v as $t,
                    Number::Float(v) => v as $t,
                };
            }
        }
    )*};
}

impl_number! {
    i8 => Int(i64), Int;
    i16 => Int(i64), Int;
    i32 => Int(i64), Int;
    i64 => Int(i64), Int;
    isize => Int(i64), Int;
    u8 => Uint(u64), Uint;
    u16 => Uint(u64), Uint;
    u32 => Uint(u64), Uint;
    u64 => Uint(u64), Uint;
    usize => Uint(u64), Uint;
    f32 => Float(f64), Float;
    f64 => Float(f64), Float;
}

macro_rules! impl_opaque {
    ($($t:ty),*) => {$(
        impl Typed for $t {
            const KIND: Kind = Kind::Opaque;

            fn zeroed() -> Self {
                <$t>::default()
            }

            fn view(&self) -> ValueRef<'_> {
                ValueRef::Opaque
            }

            fn view_mut(&mut self) -> ValueMut<'_> {
                ValueMut::Opaque
            }
        }
    )*};
}

impl_opaque!(char, std::time::Duration);

impl Typed for () {
    const KIND: Kind = Kind::Unit;

    fn zeroed() -> Self {}

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Unit
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Unit
    }
}

impl Typed for bool {
    const KIND: Kind = Kind::Bool;

    fn zeroed() -> Self {
        false
    }

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Bool(*self)
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Bool(self)
    }
}

impl Typed for String {
    const KIND: Kind = Kind::String;

    fn zeroed() -> Self {
        String::new()
    }

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Str(self)
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Str(self)
    }
}

impl Typed for DateTime<Utc> {
    const KIND: Kind = Kind::Time;

    fn zeroed() -> Self {
        DateTime::<Utc>::default()
    }

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Time(self)
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Time(self)
    }
}

// ---------------------------------------------------------------------------
// Sequences
// ---------------------------------------------------------------------------

impl<T: Typed> Typed for Vec<T> {
    const KIND: Kind = Kind::Slice;

    fn zeroed() -> Self {
        Vec::new()
    }

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Slice(self)
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Slice(self)
    }
}

impl<T: Typed> Sequence for Vec<T> {
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    fn get(&self, index: usize) -> Option<&dyn Value> {
        self.as_slice().get(index).map(|v| v as &dyn Value)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Value> {
        self.as_mut_slice().get_mut(index).map(|v| v as &mut dyn Value)
    }

    fn reset(&mut self, len: usize) {
        *self = (0..len).map(|_| T::zeroed()).collect();
    }
}

impl<T: Typed, const N: usize> Typed for [T; N] {
    const KIND: Kind = Kind::Array;

    fn zeroed() -> Self {
        std::array::from_fn(|_| T::zeroed())
    }

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Array(self)
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Array(self)
    }
}

impl<T: Typed, const N: usize> Sequence for [T; N] {
    fn len(&self) -> usize {
        N
    }

    fn get(&self, index: usize) -> Option<&dyn Value> {
        self.as_slice().get(index).map(|v| v as &dyn Value)
    }

    fn get_mut(&mut self, index: usize) -> Option<&mut dyn Value> {
        self.as_mut_slice().get_mut(index).map(|v| v as &mut dyn Value)
    }

    fn reset(&mut self, _len: usize) {}
}

// ---------------------------------------------------------------------------
// Maps
// ---------------------------------------------------------------------------

impl<K: Typed + Eq + Hash, V: Typed> Typed for HashMap<K, V> {
    const KIND: Kind = Kind::Map;

    fn zeroed() -> Self {
        HashMap::new()
    }

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Map(self)
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Map(self)
    }
}

impl<K: Typed + Eq + Hash, V: Typed> Mapping for HashMap<K, V> {
    fn len(&self) -> usize {
        HashMap::len(self)
    }

    fn entries(&self) -> Vec<(&dyn Value, &dyn Value)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Value, v as &dyn Value))
            .collect()
    }

    fn clear(&mut self) {
        HashMap::clear(self);
    }

    fn insert(&mut self, key: Box<dyn Value>, value: Box<dyn Value>) -> Result<(), CopyError> {
        let key = downcast::<K>(key)?;
        let value = downcast::<V>(value)?;
        HashMap::insert(self, key, value);
        Ok(())
    }
}

impl<K: Typed + Ord, V: Typed> Typed for BTreeMap<K, V> {
    const KIND: Kind = Kind::Map;

    fn zeroed() -> Self {
        BTreeMap::new()
    }

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Map(self)
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Map(self)
    }
}

impl<K: Typed + Ord, V: Typed> Mapping for BTreeMap<K, V> {
    fn len(&self) -> usize {
        BTreeMap::len(self)
    }

    fn entries(&self) -> Vec<(&dyn Value, &dyn Value)> {
        self.iter()
            .map(|(k, v)| (k as &dyn Value, v as &dyn Value))
            .collect()
    }

    fn clear(&mut self) {
        BTreeMap::clear(self);
    }

    fn insert(&mut self, key: Box<dyn Value>, value: Box<dyn Value>) -> Result<(), CopyError> {
        let key = downcast::<K>(key)?;
        let value = downcast::<V>(value)?;
        BTreeMap::insert(self, key, value);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Pointers
// ---------------------------------------------------------------------------

impl<T: Typed> Typed for Option<T> {
    const KIND: Kind = Kind::Pointer;

    fn zeroed() -> Self {
        None
    }

    fn view(&self) -> ValueRef<'_> {
        ValueRef::Pointer(self)
    }

    fn view_mut(&mut self) -> ValueMut<'_> {
        ValueMut::Pointer(self)
    }
}

impl<T: Typed> Pointer for Option<T> {
    fn elem(&self) -> Option<&dyn Value> {
        self.as_ref().map(|v| v as &dyn Value)
    }

    fn elem_mut(&mut self) -> Option<&mut dyn Value> {
        self.as_mut().map(|v| v as &mut dyn Value)
    }

    fn alloc(&mut self) {
        if Option::is_none(self) {
            *self = Some(T::zeroed());
        }
    }

    fn set_nil(&mut self) {
        *self = None;
    }
}

macro_rules! impl_owning_pointer {
    ($($ptr:ident => $get_mut:expr;)*) => {$(
        impl<T: Typed> Typed for $ptr<T> {
            const KIND: Kind = Kind::Pointer;

            fn zeroed() -> Self {
                $ptr::new(T::zeroed())
            }

            fn view(&self) -> ValueRef<'_> {
                ValueRef::Pointer(self)
            }

            fn view_mut(&mut self) -> ValueMut<'_> {
                ValueMut::Pointer(self)
            }
        }

        impl<T: Typed> Pointer for $ptr<T> {
            fn elem(&self) -> Option<&dyn Value> {
                Some(&**self as &dyn Value)
            }

            fn elem_mut(&mut self) -> Option<&mut dyn Value> {
                let get_mut: fn(&mut $ptr<T>) -> &mut T = $get_mut;
                Some(get_mut(self) as &mut dyn Value)
            }

            fn alloc(&mut self) {}

            fn set_nil(&mut self) {}
        }
    )*};
}

impl_owning_pointer! {
    Box => |b| &mut **b;
    Rc => Rc::make_mut;
    Arc => Arc::make_mut;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_info_compares_by_type() {
        assert_eq!(TypeInfo::of::<i64>(), 5i64.type_info());
        assert_ne!(TypeInfo::of::<i64>(), TypeInfo::of::<i32>());
        assert_eq!(TypeInfo::of::<Vec<String>>().kind(), Kind::Slice);
        assert!(TypeInfo::of::<Option<u8>>().is::<Option<u8>>());
    }

    #[test]
    fn number_slot_uses_cast_semantics() {
        let mut small = 0u8;
        small.store(Number::Int(300));
        assert_eq!(small, 44);

        let mut int = 0i32;
        int.store(Number::Float(-3.99));
        assert_eq!(int, -3);

        let mut float = 0f32;
        float.store(Number::Uint(7));
        assert_eq!(float, 7.0);
    }

    #[test]
    fn set_rejects_other_types() {
        let mut dst = 1i64;
        let err = Value::set(&mut dst, boxed(String::from("x"))).unwrap_err();
        assert!(matches!(err, CopyError::IncompatibleValue { .. }));
        assert_eq!(dst, 1);

        Value::set(&mut dst, boxed(9i64)).unwrap();
        assert_eq!(dst, 9);
    }

    #[test]
    fn option_pointer_alloc_and_nil() {
        let mut p: Option<String> = None;
        assert!(Pointer::is_nil(&p));
        Pointer::alloc(&mut p);
        assert_eq!(p.as_deref(), Some(""));
        Pointer::set_nil(&mut p);
        assert!(p.is_none());
    }

    #[test]
    fn rc_elem_mut_detaches_shared_pointee() {
        let shared = Rc::new(String::from("a"));
        let mut local = Rc::clone(&shared);
        if let Some(inner) = Pointer::elem_mut(&mut local) {
            Value::set(inner, boxed(String::from("b"))).unwrap();
        }
        assert_eq!(*shared, "a");
        assert_eq!(*local, "b");
    }

    #[test]
    fn map_insert_downcasts_entries() {
        let mut map: HashMap<String, i32> = HashMap::new();
        Mapping::insert(&mut map, boxed(String::from("k")), boxed(3i32)).unwrap();
        assert_eq!(map.get("k"), Some(&3));

        let err = Mapping::insert(&mut map, boxed(1u8), boxed(3i32)).unwrap_err();
        assert!(matches!(err, CopyError::IncompatibleValue { .. }));
    }
}
