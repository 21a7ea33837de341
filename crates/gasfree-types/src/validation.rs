//! Field validation for untyped JSON payloads.
//!
//! The signing gateway receives authorization messages as arbitrary JSON and
//! must report the first missing or wrongly typed field by name before any
//! typed deserialization happens. This module provides a small schema
//! framework for that: fields are checked in declaration order and the first
//! failure is returned.

use serde_json::Value;
use thiserror::Error;

/// Errors that can occur during payload validation.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
	/// Error that occurs when a required field is missing.
	#[error("Missing required field: {0}")]
	MissingField(String),
	/// Error that occurs when a field has an invalid value.
	#[error("Invalid value for field '{field}': {message}")]
	InvalidValue { field: String, message: String },
	/// Error that occurs when field type is incorrect.
	#[error("Field '{field}' must be a {expected}, got {actual}")]
	TypeMismatch {
		field: String,
		expected: String,
		actual: String,
	},
	/// Error that occurs when the payload cannot be deserialized at all.
	#[error("Failed to deserialize payload: {0}")]
	DeserializationError(String),
}

impl ValidationError {
	/// Returns the name of the offending field, if the error concerns one.
	pub fn field(&self) -> Option<&str> {
		match self {
			ValidationError::MissingField(field)
			| ValidationError::InvalidValue { field, .. }
			| ValidationError::TypeMismatch { field, .. } => Some(field),
			ValidationError::DeserializationError(_) => None,
		}
	}
}

/// Represents the type of a payload field.
#[derive(Debug)]
pub enum FieldType {
	/// A JSON string.
	String,
	/// A non-negative JSON integer with optional bounds.
	Integer {
		/// Minimum allowed value (inclusive).
		min: Option<u64>,
		/// Maximum allowed value (inclusive).
		max: Option<u64>,
	},
	/// A nested object with its own schema.
	Object(Schema),
}

/// A named field in a schema.
#[derive(Debug)]
pub struct Field {
	pub name: String,
	pub field_type: FieldType,
}

impl Field {
	/// Creates a new field with the given name and type.
	pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
		Self {
			name: name.into(),
			field_type,
		}
	}
}

/// A validation schema for a JSON object.
///
/// Required fields must be present; optional fields are checked only when
/// present. Both lists are checked in order and validation stops at the first
/// failure.
#[derive(Debug)]
pub struct Schema {
	pub required: Vec<Field>,
	pub optional: Vec<Field>,
}

impl Schema {
	/// Creates a new schema with required and optional fields.
	pub fn new(required: Vec<Field>, optional: Vec<Field>) -> Self {
		Self { required, optional }
	}

	/// Validates a JSON value against this schema.
	///
	/// # Errors
	///
	/// Returns the first failure encountered:
	/// - the value is not an object
	/// - a required field is missing (or `null`)
	/// - a field has the wrong type or is out of bounds
	pub fn validate(&self, payload: &Value) -> Result<(), ValidationError> {
		let object = payload
			.as_object()
			.ok_or_else(|| ValidationError::TypeMismatch {
				field: "root".to_string(),
				expected: "object".to_string(),
				actual: json_type_str(payload).to_string(),
			})?;

		for field in &self.required {
			let value = object
				.get(&field.name)
				.filter(|v| !v.is_null())
				.ok_or_else(|| ValidationError::MissingField(field.name.clone()))?;
			validate_field_type(&field.name, value, &field.field_type)?;
		}

		for field in &self.optional {
			if let Some(value) = object.get(&field.name).filter(|v| !v.is_null()) {
				validate_field_type(&field.name, value, &field.field_type)?;
			}
		}

		Ok(())
	}
}

fn validate_field_type(
	field_name: &str,
	value: &Value,
	expected_type: &FieldType,
) -> Result<(), ValidationError> {
	let mismatch = |expected: &str| ValidationError::TypeMismatch {
		field: field_name.to_string(),
		expected: expected.to_string(),
		actual: json_type_str(value).to_string(),
	};

	match expected_type {
		FieldType::String => {
			if !value.is_string() {
				return Err(mismatch("string"));
			}
		},
		FieldType::Integer { min, max } => {
			let int_val = value.as_u64().ok_or_else(|| mismatch("integer"))?;

			if let Some(min_val) = min {
				if int_val < *min_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is less than minimum {}", int_val, min_val),
					});
				}
			}

			if let Some(max_val) = max {
				if int_val > *max_val {
					return Err(ValidationError::InvalidValue {
						field: field_name.to_string(),
						message: format!("Value {} is greater than maximum {}", int_val, max_val),
					});
				}
			}
		},
		FieldType::Object(schema) => {
			if !value.is_object() {
				return Err(mismatch("object"));
			}
			schema.validate(value)?;
		},
	}

	Ok(())
}

/// Returns the JSON type name of a value for error messages.
pub fn json_type_str(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "boolean",
		Value::Number(_) => "number",
		Value::String(_) => "string",
		Value::Array(_) => "array",
		Value::Object(_) => "object",
	}
}
