//! Message list loading

use std::path::Path;
use std::sync::Arc;

use crate::{QuestError, Result};

pub const DEFAULT_MESSAGES_PATH: &str = "messages.json";

/// Reads the message file once. The list is shared read-only by every wallet task.
pub fn load(path: impl AsRef<Path>) -> Result<Arc<[String]>> {
    let path = path.as_ref();
    let text = std::fs::read_to_string(path).map_err(|source| QuestError::MessageFile {
        path: path.display().to_string(),
        source,
    })?;
    parse(&text).map_err(|source| QuestError::MessageFormat {
        path: path.display().to_string(),
        source,
    })
}

pub fn parse(text: &str) -> core::result::Result<Arc<[String]>, serde_json::Error> {
    let list: Vec<String> = serde_json::from_str(text)?;
    Ok(list.into())
}
