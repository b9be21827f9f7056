//! Annex assembly.
//!
//! Collects file attachments from a demand (the upstream form submission)
//! and restructures them into the nested annex records iA.Delib expects
//! under `__children__`.
//!
//! Sources, always in this order:
//! 1. `simple_files`: names of top-level fields holding one file each
//! 2. `workflow_files`: names of fields under `workflow.fields`
//! 3. `blocs_of_files`: prefixes; when `fields[prefix]` is set, every
//!    entry of `fields["<prefix>_raw"]` contributes its `fichier`
//!
//! Missing or empty fields contribute nothing.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::connectors::json::is_truthy;

/// Post-data keys that select files from the demand.
pub const SELECTOR_KEYS: [&str; 3] = ["simple_files", "workflow_files", "blocs_of_files"];

/// Key under which annexes are embedded in the outbound item.
pub const CHILDREN_KEY: &str = "__children__";

/// Which demand fields hold files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FileSelectors {
    #[serde(default)]
    pub simple_files: Option<Vec<String>>,
    #[serde(default)]
    pub workflow_files: Option<Vec<String>>,
    #[serde(default)]
    pub blocs_of_files: Option<Vec<String>>,
}

impl FileSelectors {
    /// Extract selectors from post data. `Ok(None)` when no selector key is
    /// present at all, so the demand does not need fetching.
    pub fn from_post_data(post_data: &Map<String, Value>) -> Result<Option<Self>, serde_json::Error> {
        if !SELECTOR_KEYS.iter().any(|key| post_data.contains_key(*key)) {
            return Ok(None);
        }
        let subset: Map<String, Value> = SELECTOR_KEYS
            .iter()
            .filter_map(|key| post_data.get(*key).map(|v| (key.to_string(), v.clone())))
            .collect();
        serde_json::from_value(Value::Object(subset)).map(Some)
    }
}

/// `file` part of an annex record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnnexFile {
    pub data: Value,
    pub filename: String,
}

/// An attachment in iA.Delib's nested-children format.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annex {
    #[serde(rename = "@type")]
    pub kind: &'static str,
    pub title: String,
    pub content_category: &'static str,
    pub file: AnnexFile,
}

impl Annex {
    /// Build an annex from a file reference (`{"filename": .., "content": ..}`).
    pub fn from_file_ref(field: &str, file: &Value) -> Result<Self, AnnexError> {
        let malformed = || AnnexError::MalformedFile {
            field: field.to_string(),
        };
        let filename = file
            .get("filename")
            .and_then(Value::as_str)
            .ok_or_else(malformed)?;
        let content = file.get("content").ok_or_else(malformed)?;

        Ok(Self {
            kind: "annex",
            title: filename.to_string(),
            content_category: "annexe",
            file: AnnexFile {
                data: content.clone(),
                filename: filename.to_string(),
            },
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AnnexError {
    #[error("field '{field}' does not hold a file (filename and content are required)")]
    MalformedFile { field: String },
}

/// Assemble annexes from `demand` according to `selectors`.
pub fn collect_annexes(selectors: &FileSelectors, demand: &Value) -> Result<Vec<Annex>, AnnexError> {
    let empty = Map::new();
    let fields = demand
        .get("fields")
        .and_then(Value::as_object)
        .unwrap_or(&empty);
    let workflow_fields = demand
        .pointer("/workflow/fields")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    let mut annexes = Vec::new();
    for name in selectors.simple_files.iter().flatten() {
        if let Some(file) = fields.get(name).filter(|v| is_truthy(v)) {
            annexes.push(Annex::from_file_ref(name, file)?);
        }
    }
    for name in selectors.workflow_files.iter().flatten() {
        if let Some(file) = workflow_fields.get(name).filter(|v| is_truthy(v)) {
            annexes.push(Annex::from_file_ref(name, file)?);
        }
    }
    for prefix in selectors.blocs_of_files.iter().flatten() {
        if !fields.get(prefix).is_some_and(is_truthy) {
            continue;
        }
        let raw_name = format!("{prefix}_raw");
        let rows = fields
            .get(&raw_name)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default();
        for row in rows {
            if let Some(file) = row.get("fichier").filter(|v| is_truthy(v)) {
                annexes.push(Annex::from_file_ref(&raw_name, file)?);
            }
        }
    }
    Ok(annexes)
}

/// Embed `annexes` under `__children__`; leaves `post_data` untouched when
/// there are none.
pub fn attach_children(post_data: &mut Map<String, Value>, annexes: &[Annex]) -> Result<(), serde_json::Error> {
    if !annexes.is_empty() {
        post_data.insert(CHILDREN_KEY.to_string(), serde_json::to_value(annexes)?);
    }
    Ok(())
}
