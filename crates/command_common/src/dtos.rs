//! Transfer representations for the HTTP boundary
//!
//! Text fields on the inbound shapes tolerate missing and `null` values so
//! that a request with an absent field reaches validation and is reported
//! per field, instead of failing inside the JSON decoder.

use serde::{Deserialize, Deserializer, Serialize};
use std::borrow::Cow;
use std::collections::BTreeMap;
use validator::{Validate, ValidationError, ValidationErrors};

/// Output shape: every field including the id
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandReadDto {
    pub id: i64,
    pub how_to: String,
    pub command_line: String,
    pub platform: String,
}

/// Input shape for creation; the id comes from the store
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommandCreateDto {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(
        custom(function = "validate_required"),
        length(max = 250, message = "The howTo field must be at most 250 characters.")
    )]
    pub how_to: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(
        custom(function = "validate_required"),
        length(max = 500, message = "The commandLine field must be at most 500 characters.")
    )]
    pub command_line: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(
        custom(function = "validate_required"),
        length(max = 100, message = "The platform field must be at most 100 characters.")
    )]
    pub platform: String,
}

/// Input shape for full replacement, and the draft patched by PATCH
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CommandUpdateDto {
    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(
        custom(function = "validate_required"),
        length(max = 250, message = "The howTo field must be at most 250 characters.")
    )]
    pub how_to: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(
        custom(function = "validate_required"),
        length(max = 500, message = "The commandLine field must be at most 500 characters.")
    )]
    pub command_line: String,

    #[serde(default, deserialize_with = "null_as_empty")]
    #[validate(
        custom(function = "validate_required"),
        length(max = 100, message = "The platform field must be at most 100 characters.")
    )]
    pub platform: String,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Required text: present and not whitespace-only
fn validate_required(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(Cow::Borrowed("The field is required."));
        return Err(err);
    }
    Ok(())
}

/// Flatten validator output into `{ camelCaseField: [messages] }`.
pub fn field_errors(errors: &ValidationErrors) -> BTreeMap<String, Vec<String>> {
    let mut out = BTreeMap::new();
    for (field, errs) in errors.field_errors() {
        let name = camel_case(&field.to_string());
        let messages = errs
            .iter()
            .map(|e| match &*e.code {
                "required" => format!("The {} field is required.", name),
                _ => e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("The {} field is invalid.", name)),
            })
            .collect();
        out.insert(name, messages);
    }
    out
}

fn camel_case(snake: &str) -> String {
    let mut out = String::with_capacity(snake.len());
    let mut upper = false;
    for c in snake.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
