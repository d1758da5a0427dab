//! Persistence model

use serde::{Deserialize, Serialize};

/// Maximum length of the how-to text
pub const HOW_TO_MAX_LEN: u64 = 250;
/// Maximum length of the command line
pub const COMMAND_LINE_MAX_LEN: u64 = 500;
/// Maximum length of the platform name
pub const PLATFORM_MAX_LEN: u64 = 100;

/// A stored command record.
///
/// `id` is assigned by the store when the record is first saved and never
/// changes afterwards. An id of `0` marks an entity the store has not seen.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Command {
    pub id: i64,
    pub how_to: String,
    pub command_line: String,
    pub platform: String,
}

impl Command {
    pub fn new(
        how_to: impl Into<String>,
        command_line: impl Into<String>,
        platform: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            how_to: how_to.into(),
            command_line: command_line.into(),
            platform: platform.into(),
        }
    }

    /// Whether the store has assigned an id yet
    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }
}
