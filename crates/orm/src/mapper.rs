//! Turns entity instances into column/value pairs and rows back into
//! entities.

use sea_query::Value;

use crate::config::OrmOptions;
use crate::entity::{Entity, ValueKind, is_null};
use crate::error::{Error, Result};
use crate::gateway::{Field, Row};
use crate::metadata::{EntityDescriptor, FieldDescriptor};
use crate::naming;
use crate::table::{Column, Update};

/// Identity column and projection for reads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadColumns {
    pub id: Option<String>,
    pub columns: Vec<Column>,
}

/// Column assignments for an insert, plus the identity field whose value
/// the database will generate.
#[derive(Debug, Clone, PartialEq)]
pub struct InsertPlan {
    pub capture: Option<FieldDescriptor>,
    pub updates: Vec<Update>,
}

/// Column assignments for an update and the current identity value.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdatePlan {
    pub id: Option<Value>,
    pub updates: Vec<Update>,
}

#[must_use]
pub fn resolve_for_read(descriptor: &EntityDescriptor) -> ReadColumns {
    let mut id = None;
    let columns = descriptor
        .fields()
        .iter()
        .map(|field| {
            if field.is_identity() {
                id = Some(field.column.clone());
                Column::new(field.column.clone()).primary_key()
            } else {
                Column::new(field.column.clone())
            }
        })
        .collect();
    ReadColumns { id, columns }
}

/// Collect the non-null columns of a new row.
///
/// A `Random` identity is generated and written onto the instance; a
/// `DatabaseAssigned` identity is left unset and returned for capture.
///
/// # Errors
///
/// Returns [`Error::IllegalState`] if the instance does not expose a declared
/// field, or [`Error::TypeMismatch`] if a generated id does not fit.
pub fn resolve_for_insert<M: Entity>(
    descriptor: &EntityDescriptor, instance: &mut M,
) -> Result<InsertPlan> {
    let mut capture = None;
    let mut updates = Vec::new();

    for field in descriptor.fields() {
        match field.id {
            Some(strategy) if strategy.captures_key() => {
                capture = Some(field.clone());
                continue;
            }
            Some(strategy) => {
                if let Some(value) = strategy.generate() {
                    instance.set_value(field.name, value.clone())?;
                    updates.push(Update::new(field.column.clone(), value));
                    continue;
                }
            }
            None => {}
        }

        let value = instance.value(field.name)?;
        if !is_null(&value) {
            updates.push(Update::new(field.column.clone(), value));
        }
    }

    Ok(InsertPlan { capture, updates })
}

/// Collect the non-null, non-identity columns of an existing row and read
/// its current identity value. Identities are never regenerated here.
///
/// # Errors
///
/// Returns [`Error::IllegalState`] if the instance does not expose a declared
/// field.
pub fn resolve_for_update<M: Entity>(
    descriptor: &EntityDescriptor, instance: &M,
) -> Result<UpdatePlan> {
    let mut id = None;
    let mut updates = Vec::new();

    for field in descriptor.fields() {
        let value = instance.value(field.name)?;
        if field.is_identity() {
            id = Some(value);
        } else if !is_null(&value) {
            updates.push(Update::new(field.column.clone(), value));
        }
    }

    Ok(UpdatePlan { id, updates })
}

/// Store a database-generated key on the identity field, converting it to
/// the field's declared kind.
///
/// # Errors
///
/// Returns [`Error::TypeMismatch`] if the field's kind cannot hold the key.
pub fn set_identity<M: Entity>(instance: &mut M, field: &FieldDescriptor, key: i64) -> Result<()> {
    let mismatch = || Error::TypeMismatch {
        field: field.name.to_string(),
        kind: field.kind,
    };

    let value = match field.kind {
        ValueKind::Int64 => Value::BigInt(Some(key)),
        ValueKind::Int32 => Value::Int(Some(i32::try_from(key).map_err(|_e| mismatch())?)),
        ValueKind::Uint32 => Value::Unsigned(Some(u32::try_from(key).map_err(|_e| mismatch())?)),
        ValueKind::Uint64 => {
            Value::BigUnsigned(Some(u64::try_from(key).map_err(|_e| mismatch())?))
        }
        ValueKind::String => Value::from(key.to_string()),
        _ => return Err(mismatch()),
    };

    instance.set_value(field.name, value)
}

/// Decode a row keyed by column name into an entity.
///
/// Columns belonging to the entity are renamed to their field names; other
/// columns (aliases, joined columns) are converted with
/// [`naming::to_camel`] when the naming toggle is on.
///
/// # Errors
///
/// Returns [`Error::Decode`] if the row does not fit the entity.
pub fn map_row<M: Entity>(
    descriptor: &EntityDescriptor, options: &OrmOptions, row: Row,
) -> Result<M> {
    let fields = row
        .fields
        .into_iter()
        .map(|Field { name, value }| {
            let name = match descriptor.field_for_column(&name) {
                Some(field) => field.name.to_string(),
                None if options.map_underscore_to_camel_case => naming::to_camel(&name),
                None => name,
            };
            Field { name, value }
        })
        .collect();

    M::from_row(&Row { fields }).map_err(Error::Decode)
}
