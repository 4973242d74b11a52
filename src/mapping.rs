//! Declarative field mapping from legacy source entities onto target entities.
//!
//! Each source type declares a static table of [`FieldMap`] entries naming the
//! source field, the target field it lands on, and a resolver producing the
//! value. Resolvers may walk deferred lookup chains (e.g. a task's key date is
//! reached through its custom-field value and the lookup table) and can fail.
//!
//! The mapper resolves every declared entry before touching the destination,
//! so a failing resolver never leaves a half-populated entity behind. Fields a
//! source does not declare stay unset; callers supply them as overrides.

use chrono::{NaiveDate, NaiveDateTime};
use thiserror::Error;
use uuid::Uuid;

/// A resolved field value on its way to a target entity.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Null,
    Bool(bool),
    Int(i64),
    Text(String),
    Uuid(Uuid),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
}

impl FieldValue {
    pub fn kind(&self) -> &'static str {
        match self {
            FieldValue::Null => "null",
            FieldValue::Bool(_) => "bool",
            FieldValue::Int(_) => "int",
            FieldValue::Text(_) => "text",
            FieldValue::Uuid(_) => "uuid",
            FieldValue::Date(_) => "date",
            FieldValue::DateTime(_) => "datetime",
        }
    }

    pub fn into_text(self, field: &str) -> Result<Option<String>, MappingError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Text(s) => Ok(Some(s)),
            other => Err(MappingError::type_mismatch(field, "text", &other)),
        }
    }

    pub fn into_int(self, field: &str) -> Result<Option<i64>, MappingError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Int(v) => Ok(Some(v)),
            other => Err(MappingError::type_mismatch(field, "int", &other)),
        }
    }

    pub fn into_bool(self, field: &str) -> Result<Option<bool>, MappingError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Bool(v) => Ok(Some(v)),
            other => Err(MappingError::type_mismatch(field, "bool", &other)),
        }
    }

    pub fn into_uuid(self, field: &str) -> Result<Option<Uuid>, MappingError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Uuid(v) => Ok(Some(v)),
            FieldValue::Text(s) => Uuid::parse_str(&s)
                .map(Some)
                .map_err(|e| MappingError::Unresolved {
                    field: field.to_string(),
                    reason: e.to_string(),
                }),
            other => Err(MappingError::type_mismatch(field, "uuid", &other)),
        }
    }

    pub fn into_date(self, field: &str) -> Result<Option<NaiveDate>, MappingError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::Date(v) => Ok(Some(v)),
            FieldValue::DateTime(v) => Ok(Some(v.date())),
            other => Err(MappingError::type_mismatch(field, "date", &other)),
        }
    }

    pub fn into_datetime(self, field: &str) -> Result<Option<NaiveDateTime>, MappingError> {
        match self {
            FieldValue::Null => Ok(None),
            FieldValue::DateTime(v) => Ok(Some(v)),
            other => Err(MappingError::type_mismatch(field, "datetime", &other)),
        }
    }
}

impl From<Option<NaiveDateTime>> for FieldValue {
    fn from(value: Option<NaiveDateTime>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::DateTime)
    }
}

impl From<Option<String>> for FieldValue {
    fn from(value: Option<String>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Text)
    }
}

impl From<Option<i64>> for FieldValue {
    fn from(value: Option<i64>) -> Self {
        value.map_or(FieldValue::Null, FieldValue::Int)
    }
}

/// Failure to carry a value from a source entity onto a target entity.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum MappingError {
    /// A deferred source value could not be produced.
    #[error("could not resolve source field '{field}': {reason}")]
    Unresolved { field: String, reason: String },

    /// The target entity has no field with this name.
    #[error("{entity} has no field '{field}'")]
    UnknownField { entity: &'static str, field: String },

    #[error("field '{field}' expects {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// A required target field was never assigned.
    #[error("{entity}.{field} is required but was never set")]
    MissingField {
        entity: &'static str,
        field: &'static str,
    },
}

impl MappingError {
    pub fn unresolved(field: &str, reason: impl Into<String>) -> Self {
        MappingError::Unresolved {
            field: field.to_string(),
            reason: reason.into(),
        }
    }

    fn type_mismatch(field: &str, expected: &'static str, actual: &FieldValue) -> Self {
        MappingError::TypeMismatch {
            field: field.to_string(),
            expected,
            actual: actual.kind(),
        }
    }
}

/// Resolver for one declared field. Deferred lookups fail with [`MappingError`].
pub type Resolver<S> = fn(&S) -> Result<FieldValue, MappingError>;

/// One declared `source field -> target field` entry.
pub struct FieldMap<S: 'static> {
    pub source: &'static str,
    pub target: &'static str,
    pub resolve: Resolver<S>,
}

/// A source entity exposing a static field map.
pub trait MapSource: Sized + 'static {
    fn field_map() -> &'static [FieldMap<Self>];
}

/// A target entity accepting values by field name.
pub trait MapTarget {
    const ENTITY: &'static str;

    fn assign(&mut self, field: &str, value: FieldValue) -> Result<(), MappingError>;

    fn unknown(field: &str) -> MappingError {
        MappingError::UnknownField {
            entity: Self::ENTITY,
            field: field.to_string(),
        }
    }
}

/// Resolve every declared field of `src` without assigning anything.
fn resolve_all<S: MapSource>(src: &S) -> Result<Vec<(&'static str, FieldValue)>, MappingError> {
    S::field_map()
        .iter()
        .map(|m| (m.resolve)(src).map(|value| (m.target, value)))
        .collect()
}

/// Copy the declared fields of `src` onto an existing `dst`.
pub fn map_onto<T, S>(dst: &mut T, src: &S) -> Result<(), MappingError>
where
    T: MapTarget,
    S: MapSource,
{
    let resolved = resolve_all(src)?;
    for (field, value) in resolved {
        dst.assign(field, value)?;
    }
    Ok(())
}

/// Build a fresh `T` from `src`, then apply caller-supplied overrides.
pub fn map_new<T, S>(src: &S, overrides: Vec<(&'static str, FieldValue)>) -> Result<T, MappingError>
where
    T: MapTarget + Default,
    S: MapSource,
{
    let mut dst = T::default();
    map_onto(&mut dst, src)?;
    for (field, value) in overrides {
        dst.assign(field, value)?;
    }
    Ok(dst)
}

/// Unwrap a required draft field.
pub fn required<T>(value: Option<T>, entity: &'static str, field: &'static str) -> Result<T, MappingError> {
    value.ok_or(MappingError::MissingField { entity, field })
}
