use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{AttributeError, SpoofError};
use crate::observability;
use crate::{dlog, elog};

/// Which attribute group a field lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Namespace {
    Primary,
    Version,
}

#[allow(non_camel_case_types)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Field {
    BRAND,
    MANUFACTURER,
    DEVICE,
    PRODUCT,
    HARDWARE,
    MODEL,
    ID,
    FINGERPRINT,
    TYPE,
    TAGS,
    RELEASE,
    INCREMENTAL,
    SECURITY_PATCH,
    DEVICE_INITIAL_SDK_INT,
}

impl Field {
    pub const ALL: [Field; 14] = [
        Field::BRAND,
        Field::MANUFACTURER,
        Field::DEVICE,
        Field::PRODUCT,
        Field::HARDWARE,
        Field::MODEL,
        Field::ID,
        Field::FINGERPRINT,
        Field::TYPE,
        Field::TAGS,
        Field::RELEASE,
        Field::INCREMENTAL,
        Field::SECURITY_PATCH,
        Field::DEVICE_INITIAL_SDK_INT,
    ];

    pub fn namespace(self) -> Namespace {
        match self {
            Field::RELEASE
            | Field::INCREMENTAL
            | Field::SECURITY_PATCH
            | Field::DEVICE_INITIAL_SDK_INT => Namespace::Version,
            _ => Namespace::Primary,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Field::BRAND => "BRAND",
            Field::MANUFACTURER => "MANUFACTURER",
            Field::DEVICE => "DEVICE",
            Field::PRODUCT => "PRODUCT",
            Field::HARDWARE => "HARDWARE",
            Field::MODEL => "MODEL",
            Field::ID => "ID",
            Field::FINGERPRINT => "FINGERPRINT",
            Field::TYPE => "TYPE",
            Field::TAGS => "TAGS",
            Field::RELEASE => "RELEASE",
            Field::INCREMENTAL => "INCREMENTAL",
            Field::SECURITY_PATCH => "SECURITY_PATCH",
            Field::DEVICE_INITIAL_SDK_INT => "DEVICE_INITIAL_SDK_INT",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.namespace() {
            Namespace::Primary => write!(f, "Build.{}", self.as_str()),
            Namespace::Version => write!(f, "Build.VERSION.{}", self.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown build field")]
pub struct UnknownField;

impl FromStr for Field {
    type Err = UnknownField;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .iter()
            .copied()
            .find(|field| field.as_str() == s)
            .ok_or(UnknownField)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    Int(i32),
    Str(String),
}

impl FieldValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            FieldValue::Str(s) => Some(s),
            FieldValue::Int(_) => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Int(v) => write!(f, "{}", v),
            FieldValue::Str(s) => f.write_str(s),
        }
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Str(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Str(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::Int(value)
    }
}

/// One queued attribute override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldWrite {
    pub field: Field,
    pub value: FieldValue,
}

impl FieldWrite {
    pub fn new(field: Field, value: impl Into<FieldValue>) -> Self {
        Self {
            field,
            value: value.into(),
        }
    }
}

/// Narrow read/write access to the host's identity attributes.
pub trait AttributeStore {
    fn set(&mut self, field: Field, value: &FieldValue) -> Result<(), AttributeError>;
    fn get(&self, field: Field) -> Option<FieldValue>;
}

/// Attribute store backed by a map. Fields listed as read-only reject writes.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAttributeStore {
    values: HashMap<Field, FieldValue>,
    read_only: Vec<Field>,
    unsupported: Vec<Field>,
}

impl InMemoryAttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(mut self, field: Field, value: impl Into<FieldValue>) -> Self {
        self.values.insert(field, value.into());
        self
    }

    pub fn with_read_only(mut self, field: Field) -> Self {
        self.read_only.push(field);
        self
    }

    /// Simulates a host build that lacks the field entirely.
    pub fn without_field(mut self, field: Field) -> Self {
        self.unsupported.push(field);
        self
    }
}

impl AttributeStore for InMemoryAttributeStore {
    fn set(&mut self, field: Field, value: &FieldValue) -> Result<(), AttributeError> {
        if self.unsupported.contains(&field) {
            return Err(AttributeError::FieldNotFound(field));
        }
        if self.read_only.contains(&field) {
            return Err(AttributeError::AccessDenied(field));
        }
        let int_field = field == Field::DEVICE_INITIAL_SDK_INT;
        if int_field != matches!(value, FieldValue::Int(_)) {
            return Err(AttributeError::TypeMismatch(field));
        }
        self.values.insert(field, value.clone());
        Ok(())
    }

    fn get(&self, field: Field) -> Option<FieldValue> {
        self.values.get(&field).cloned()
    }
}

/// Outcome of applying a batch of writes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub applied: usize,
    pub failed: Vec<SpoofError>,
}

impl WriteReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies writes in order. A failing field is logged and skipped; the rest
/// of the batch still runs.
pub fn apply_writes(store: &mut dyn AttributeStore, writes: &[FieldWrite]) -> WriteReport {
    let mut report = WriteReport::default();
    for write in writes {
        dlog!("Defining prop {} to {}", write.field.as_str(), write.value);
        match store.set(write.field, &write.value) {
            Ok(()) => {
                report.applied += 1;
                observability::record_write_applied();
            }
            Err(source) => {
                elog!("Failed to set prop {}: {}", write.field.as_str(), source);
                observability::record_error(observability::ErrorClass::FIELD_WRITE);
                report.failed.push(SpoofError::FieldWriteFailed {
                    field: write.field,
                    source,
                });
            }
        }
    }
    report
}
