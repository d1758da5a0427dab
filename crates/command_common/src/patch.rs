//! JSON Patch documents (RFC 6902) applied to transfer shapes
//!
//! The shapes patched here are flat objects, so a pointer names exactly one
//! top-level member. Operations run in order against a draft copy; the
//! caller's value is replaced only when every operation succeeds.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use thiserror::Error;

/// A single patch operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum PatchOperation {
    Add { path: String, value: Value },
    Remove { path: String },
    Replace { path: String, value: Value },
    Move { from: String, path: String },
    Copy { from: String, path: String },
    Test { path: String, value: Value },
}

impl PatchOperation {
    /// Target pointer of the operation
    pub fn path(&self) -> &str {
        match self {
            PatchOperation::Add { path, .. }
            | PatchOperation::Remove { path }
            | PatchOperation::Replace { path, .. }
            | PatchOperation::Move { path, .. }
            | PatchOperation::Copy { path, .. }
            | PatchOperation::Test { path, .. } => path,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            PatchOperation::Add { .. } => "add",
            PatchOperation::Remove { .. } => "remove",
            PatchOperation::Replace { .. } => "replace",
            PatchOperation::Move { .. } => "move",
            PatchOperation::Copy { .. } => "copy",
            PatchOperation::Test { .. } => "test",
        }
    }
}

impl fmt::Display for PatchOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchOperation::Move { from, path } | PatchOperation::Copy { from, path } => {
                write!(f, "{} {} -> {}", self.name().to_uppercase(), from, path)
            }
            _ => write!(f, "{} {}", self.name().to_uppercase(), self.path()),
        }
    }
}

/// Errors raised while applying a patch document
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PatchError {
    #[error("'{0}' is not a valid JSON pointer")]
    InvalidPointer(String),

    #[error("the target location '{0}' was not found")]
    UnknownPath(String),

    #[error("the current value at '{0}' is not equal to the test value")]
    TestFailed(String),

    #[error("patch target must be a JSON object")]
    NotAnObject,

    #[error("the patched document is invalid: {0}")]
    InvalidDocument(String),
}

impl PatchError {
    /// Member name the error refers to, when there is one
    pub fn member(&self) -> Option<String> {
        match self {
            PatchError::InvalidPointer(p) | PatchError::UnknownPath(p) | PatchError::TestFailed(p) => {
                Some(p.trim_start_matches('/').to_string())
            }
            PatchError::NotAnObject | PatchError::InvalidDocument(_) => None,
        }
    }
}

/// An ordered list of patch operations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatchDocument(pub Vec<PatchOperation>);

impl PatchDocument {
    pub fn new(operations: Vec<PatchOperation>) -> Self {
        Self(operations)
    }

    pub fn operations(&self) -> &[PatchOperation] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Apply every operation to `target`, or leave it untouched on error.
    pub fn apply_to(&self, target: &mut Value) -> Result<(), PatchError> {
        let mut draft = match target {
            Value::Object(map) => map.clone(),
            _ => return Err(PatchError::NotAnObject),
        };

        for op in &self.0 {
            apply_operation(&mut draft, op)?;
        }

        *target = Value::Object(draft);
        Ok(())
    }

    /// Patch a serializable shape and decode the result back into it.
    pub fn apply_to_shape<T>(&self, shape: &T) -> Result<T, PatchError>
    where
        T: Serialize + DeserializeOwned,
    {
        let mut value =
            serde_json::to_value(shape).map_err(|e| PatchError::InvalidDocument(e.to_string()))?;
        self.apply_to(&mut value)?;
        serde_json::from_value(value).map_err(|e| PatchError::InvalidDocument(e.to_string()))
    }
}

fn apply_operation(doc: &mut Map<String, Value>, op: &PatchOperation) -> Result<(), PatchError> {
    match op {
        PatchOperation::Add { path, value } | PatchOperation::Replace { path, value } => {
            let key = existing_member(doc, path)?;
            doc.insert(key, value.clone());
        }
        PatchOperation::Remove { path } => {
            let key = existing_member(doc, path)?;
            doc.insert(key, Value::Null);
        }
        PatchOperation::Move { from, path } => {
            let source = existing_member(doc, from)?;
            let dest = existing_member(doc, path)?;
            if source != dest {
                let moved = doc.insert(source, Value::Null).unwrap_or(Value::Null);
                doc.insert(dest, moved);
            }
        }
        PatchOperation::Copy { from, path } => {
            let source = existing_member(doc, from)?;
            let dest = existing_member(doc, path)?;
            let copied = doc.get(&source).cloned().unwrap_or(Value::Null);
            doc.insert(dest, copied);
        }
        PatchOperation::Test { path, value } => {
            let key = existing_member(doc, path)?;
            if doc.get(&key) != Some(value) {
                return Err(PatchError::TestFailed(path.clone()));
            }
        }
    }
    Ok(())
}

/// Resolve a single-segment pointer to a member already present in `doc`
fn existing_member(doc: &Map<String, Value>, pointer: &str) -> Result<String, PatchError> {
    let key = parse_pointer(pointer)?;
    if doc.contains_key(&key) {
        Ok(key)
    } else {
        Err(PatchError::UnknownPath(pointer.to_string()))
    }
}

fn parse_pointer(pointer: &str) -> Result<String, PatchError> {
    let rest = pointer
        .strip_prefix('/')
        .ok_or_else(|| PatchError::InvalidPointer(pointer.to_string()))?;

    // Nested members do not exist on a flat shape
    if rest.contains('/') {
        return Err(PatchError::UnknownPath(pointer.to_string()));
    }

    let mut key = String::with_capacity(rest.len());
    let mut chars = rest.chars();
    while let Some(c) = chars.next() {
        if c == '~' {
            match chars.next() {
                Some('0') => key.push('~'),
                Some('1') => key.push('/'),
                _ => return Err(PatchError::InvalidPointer(pointer.to_string())),
            }
        } else {
            key.push(c);
        }
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dtos::CommandUpdateDto;
    use serde_json::json;

    fn draft() -> CommandUpdateDto {
        CommandUpdateDto {
            how_to: "How to list files".to_string(),
            command_line: "ls -la".to_string(),
            platform: "Linux".to_string(),
        }
    }

    fn doc(ops: Value) -> PatchDocument {
        serde_json::from_value(ops).unwrap()
    }

    #[test]
    fn test_parses_rfc6902_document() {
        let patch = doc(json!([
            { "op": "replace", "path": "/howTo", "value": "x" },
            { "op": "move", "from": "/howTo", "path": "/platform" },
            { "op": "test", "path": "/platform", "value": "x" }
        ]));
        assert_eq!(patch.operations().len(), 3);
        assert_eq!(patch.operations()[1].path(), "/platform");
        assert_eq!(patch.operations()[1].to_string(), "MOVE /howTo -> /platform");
    }

    #[test]
    fn test_empty_document_is_noop() {
        let patched = PatchDocument::default().apply_to_shape(&draft()).unwrap();
        assert_eq!(patched, draft());
    }

    #[test]
    fn test_replace_and_add_overwrite_member() {
        let patch = doc(json!([
            { "op": "replace", "path": "/commandLine", "value": "ls -lah" },
            { "op": "add", "path": "/platform", "value": "macOS" }
        ]));
        let patched = patch.apply_to_shape(&draft()).unwrap();
        assert_eq!(patched.command_line, "ls -lah");
        assert_eq!(patched.platform, "macOS");
        assert_eq!(patched.how_to, "How to list files");
    }

    #[test]
    fn test_remove_clears_member() {
        let patch = doc(json!([{ "op": "remove", "path": "/platform" }]));
        let patched = patch.apply_to_shape(&draft()).unwrap();
        assert_eq!(patched.platform, "");
    }

    #[test]
    fn test_copy_and_move() {
        let patch = doc(json!([
            { "op": "copy", "from": "/platform", "path": "/howTo" },
            { "op": "move", "from": "/commandLine", "path": "/platform" }
        ]));
        let patched = patch.apply_to_shape(&draft()).unwrap();
        assert_eq!(patched.how_to, "Linux");
        assert_eq!(patched.platform, "ls -la");
        assert_eq!(patched.command_line, "");
    }

    #[test]
    fn test_unknown_member_rejected() {
        let patch = doc(json!([{ "op": "replace", "path": "/id", "value": 9 }]));
        let err = patch.apply_to_shape(&draft()).unwrap_err();
        assert_eq!(err, PatchError::UnknownPath("/id".to_string()));
        assert_eq!(err.member().as_deref(), Some("id"));

        let nested = doc(json!([{ "op": "add", "path": "/howTo/0", "value": "x" }]));
        assert!(matches!(
            nested.apply_to_shape(&draft()),
            Err(PatchError::UnknownPath(_))
        ));
    }

    #[test]
    fn test_invalid_pointer() {
        let patch = doc(json!([{ "op": "remove", "path": "howTo" }]));
        assert_eq!(
            patch.apply_to_shape(&draft()).unwrap_err(),
            PatchError::InvalidPointer("howTo".to_string())
        );
        assert!(matches!(parse_pointer("/a~2b"), Err(PatchError::InvalidPointer(_))));
        assert_eq!(parse_pointer("/a~1b~0c").unwrap(), "a/b~c");
    }

    #[test]
    fn test_failed_test_leaves_target_untouched() {
        let mut value = serde_json::to_value(draft()).unwrap();
        let before = value.clone();
        let patch = doc(json!([
            { "op": "replace", "path": "/howTo", "value": "changed" },
            { "op": "test", "path": "/platform", "value": "Windows" }
        ]));

        let err = patch.apply_to(&mut value).unwrap_err();
        assert_eq!(err, PatchError::TestFailed("/platform".to_string()));
        assert_eq!(value, before);
    }

    #[test]
    fn test_non_string_value_rejected_on_decode() {
        let patch = doc(json!([{ "op": "replace", "path": "/howTo", "value": 12 }]));
        assert!(matches!(
            patch.apply_to_shape(&draft()),
            Err(PatchError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_non_object_target() {
        let mut value = json!([1, 2]);
        assert_eq!(
            PatchDocument::default().apply_to(&mut value),
            Err(PatchError::NotAnObject)
        );
    }
}
