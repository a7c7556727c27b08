use crate::error::CopyError;
use crate::record::Record;
use crate::value::{Mapping, Pointer, Sequence, Value, ValueMut, ValueRef};

/// Recursively duplicates `src` into `dst`. Both must be of the same type.
///
/// Pointers, records, sequences and maps are rebuilt in `dst`; everything
/// else is assigned. `depth` counts record and container boundaries only;
/// pointer hops are free. Recursion is bounded by `limit` such levels and
/// there is no cycle detection.
pub(crate) fn duplicate(
    src: &dyn Value,
    dst: &mut dyn Value,
    depth: usize,
    limit: usize,
) -> Result<(), CopyError> {
    if depth > limit {
        return Err(CopyError::DepthExceeded { limit });
    }

    match src.reflect() {
        ValueRef::Pointer(s) => match dst.reflect_mut() {
            ValueMut::Pointer(d) => duplicate_pointer(s, d, depth, limit),
            _ => Err(mismatch(src, dst)),
        },
        ValueRef::Record(s) => match dst.reflect_mut() {
            ValueMut::Record(d) => duplicate_record(s, d, depth, limit),
            _ => Err(mismatch(src, dst)),
        },
        ValueRef::Array(s) | ValueRef::Slice(s) => match dst.reflect_mut() {
            ValueMut::Array(d) | ValueMut::Slice(d) => duplicate_sequence(s, d, depth, limit),
            _ => Err(mismatch(src, dst)),
        },
        ValueRef::Map(s) => match dst.reflect_mut() {
            ValueMut::Map(d) => duplicate_map(s, d, depth, limit),
            _ => Err(mismatch(src, dst)),
        },
        _ => dst.assign(src),
    }
}

fn duplicate_pointer(
    src: &dyn Pointer,
    dst: &mut dyn Pointer,
    depth: usize,
    limit: usize,
) -> Result<(), CopyError> {
    let Some(inner) = src.elem() else {
        dst.set_nil();
        return Ok(());
    };
    if dst.is_nil() {
        dst.alloc();
    }
    match dst.elem_mut() {
        Some(target) => duplicate(inner, target, depth, limit),
        None => Ok(()),
    }
}

/// Structural: visits every reflected field, exported or not.
fn duplicate_record(
    src: &dyn Record,
    dst: &mut dyn Record,
    depth: usize,
    limit: usize,
) -> Result<(), CopyError> {
    for (index, info) in src.fields().iter().enumerate() {
        let (Some(from), Some(to)) = (src.field(index), dst.field_mut(index)) else {
            continue;
        };
        duplicate(from, to, depth + 1, limit).map_err(|e| match e {
            CopyError::DepthExceeded { .. } => e,
            other => other.in_field(info.name),
        })?;
    }
    Ok(())
}

fn duplicate_sequence(
    src: &dyn Sequence,
    dst: &mut dyn Sequence,
    depth: usize,
    limit: usize,
) -> Result<(), CopyError> {
    dst.reset(src.len());
    for index in 0..src.len() {
        if let (Some(from), Some(to)) = (src.get(index), dst.get_mut(index)) {
            duplicate(from, to, depth + 1, limit)?;
        }
    }
    Ok(())
}

fn duplicate_map(
    src: &dyn Mapping,
    dst: &mut dyn Mapping,
    depth: usize,
    limit: usize,
) -> Result<(), CopyError> {
    dst.clear();
    for (key, value) in src.entries() {
        let mut new_key = key.new_zeroed();
        duplicate(key, &mut *new_key, depth + 1, limit)?;
        let mut new_value = value.new_zeroed();
        duplicate(value, &mut *new_value, depth + 1, limit)?;
        dst.insert(new_key, new_value)?;
    }
    Ok(())
}

fn mismatch(src: &dyn Value, dst: &dyn Value) -> CopyError {
    CopyError::IncompatibleValue {
        expected: dst.type_info(),
        found: src.type_info(),
    }
}
