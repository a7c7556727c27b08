use std::collections::HashMap;

use crate::config::CopyOptions;
use crate::convert;
use crate::deep;
use crate::error::CopyError;
use crate::record::Record;
use crate::value::{Kind, Value, ValueMut, ValueRef};
use crate::zero::is_empty;

/// Shallow copy with default options.
///
/// `src` and `dst` are records, or pointers (`Option`, `Box`, `Rc`, `Arc`)
/// leading to records. Exported fields are matched by name; fields present
/// on only one side are skipped.
pub fn copy(src: &dyn Value, dst: &mut dyn Value) -> Result<(), CopyError> {
    copy_with(src, dst, &CopyOptions::default())
}

/// Deep copy: same-typed fields are duplicated instead of assigned.
pub fn copy_deep(src: &dyn Value, dst: &mut dyn Value) -> Result<(), CopyError> {
    copy_with(src, dst, &CopyOptions::deep())
}

/// Deep copy that leaves destination fields alone when the source is empty.
pub fn copy_deep_non_nil_only(src: &dyn Value, dst: &mut dyn Value) -> Result<(), CopyError> {
    copy_with(src, dst, &CopyOptions::deep_non_empty())
}

/// Copies `src` into `dst` as directed by `options`.
///
/// Fails fast: the first field error aborts the copy, and fields copied
/// before it keep their new values.
pub fn copy_with(
    src: &dyn Value,
    dst: &mut dyn Value,
    options: &CopyOptions,
) -> Result<(), CopyError> {
    if src.kind() == Kind::Unit {
        return Err(CopyError::InvalidArgument("source is nil"));
    }
    if dst.kind() == Kind::Unit {
        return Err(CopyError::InvalidArgument("destination is nil"));
    }

    tracing::debug!(
        source = %src.type_info(),
        destination = %dst.type_info(),
        deep = options.deep_copy,
        ignore_empty = options.ignore_empty,
        "copying record"
    );

    let src = source_record(src)?;
    let dst = destination_record(dst)?;
    copy_record(src, dst, options)
}

/// Follows pointers from the source down to a record.
fn source_record(value: &dyn Value) -> Result<&dyn Record, CopyError> {
    let mut current = value;
    loop {
        match current.reflect() {
            ValueRef::Pointer(p) => match p.elem() {
                Some(inner) => current = inner,
                None => return Err(CopyError::NilSource),
            },
            ValueRef::Record(r) => return Ok(r),
            _ => {
                return Err(CopyError::TypeMismatch {
                    side: "source",
                    found: current.type_info(),
                })
            }
        }
    }
}

/// Follows pointers from the destination down to a record, attaching a
/// zero pointee wherever a pointer is nil.
fn destination_record(value: &mut dyn Value) -> Result<&mut dyn Record, CopyError> {
    let found = value.type_info();
    match value.reflect_mut() {
        ValueMut::Pointer(p) => {
            if p.is_nil() {
                tracing::trace!(destination = %found, "allocating nil destination");
                p.alloc();
            }
            match p.elem_mut() {
                Some(inner) => destination_record(inner),
                None => Err(CopyError::InvalidArgument("destination pointer cannot be allocated")),
            }
        }
        ValueMut::Record(r) => Ok(r),
        _ => Err(CopyError::TypeMismatch {
            side: "destination",
            found,
        }),
    }
}

fn copy_record(
    src: &dyn Record,
    dst: &mut dyn Record,
    options: &CopyOptions,
) -> Result<(), CopyError> {
    let by_name: HashMap<&'static str, usize> = src
        .fields()
        .iter()
        .enumerate()
        .filter(|(_, f)| f.exported && !options.is_ignored(f.name))
        .map(|(index, f)| (f.name, index))
        .collect();

    for (index, info) in dst.fields().iter().enumerate() {
        if !info.exported {
            continue;
        }
        let Some(&src_index) = by_name.get(info.name) else {
            tracing::trace!(field = info.name, "no matching source field");
            continue;
        };
        let Some(from) = src.field(src_index) else {
            continue;
        };
        if options.ignore_empty && is_empty(from) {
            tracing::trace!(field = info.name, "source empty, keeping destination");
            continue;
        }
        let Some(to) = dst.field_mut(index) else {
            tracing::trace!(field = info.name, "destination not settable");
            continue;
        };

        if let Err(e) = transfer(info.name, from, to, options) {
            tracing::debug!(field = info.name, error = %e, "field copy failed");
            return Err(e.in_field(info.name));
        }
    }

    Ok(())
}

fn transfer(
    field: &str,
    from: &dyn Value,
    to: &mut dyn Value,
    options: &CopyOptions,
) -> Result<(), CopyError> {
    let target = to.type_info();

    if from.type_info() == target {
        if options.deep_copy {
            tracing::trace!(field, strategy = "deep", "copying field");
            return deep::duplicate(from, to, 0, options.max_depth);
        }
        tracing::trace!(field, strategy = "assign", "copying field");
        return to.assign(from);
    }

    if let Some(converter) = &options.converter {
        tracing::trace!(field, strategy = "converter", to = %target, "copying field");
        let converted = converter
            .convert(from, target)
            .map_err(CopyError::Converter)?;
        return to.set(converted);
    }

    tracing::trace!(field, strategy = "builtin", from = %from.type_info(), to = %target, "copying field");
    convert::convert(from, to)
}
