//! Reply validation shared by the modules.
//!
//! Every failure here is a [`ModuleError::Validation`] (re-prompt) except
//! [`classify_artifact`], which reports [`ModuleError::UnsupportedFormat`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::LazyLock;

use cityapp_protocol::Reply;

use crate::error::{ModuleError, Result};

static LAYER_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z][A-Za-z0-9_]*$").unwrap());

const VECTOR_EXTENSIONS: [&str; 3] = ["geojson", "gpkg", "osm"];
const RASTER_EXTENSIONS: [&str; 3] = ["tif", "tiff", "gtif"];

/// Layer names: a letter followed by letters, digits or `_`.
pub fn is_valid_layer_name(name: &str) -> bool {
    LAYER_NAME.is_match(name)
}

pub fn validate_layer_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if is_valid_layer_name(name) {
        Ok(name)
    } else {
        Err(ModuleError::validation(
            "Invalid map name. Start with a letter and use letters, digits or '_' only.",
        ))
    }
}

/// What an uploaded file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    Vector,
    Raster,
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default()
}

/// Classify an upload by extension, ignoring case.
pub fn classify_artifact(path: &Path) -> Result<ArtifactKind> {
    let ext = extension(path);
    if VECTOR_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ArtifactKind::Vector)
    } else if RASTER_EXTENSIONS.contains(&ext.as_str()) {
        Ok(ArtifactKind::Raster)
    } else {
        Err(ModuleError::UnsupportedFormat {
            file: path.display().to_string(),
            expected: "'geojson', 'gpkg', 'osm', 'tif', 'tiff', 'gtif'",
        })
    }
}

/// `true` when the file carries one of `extensions` (lowercase, no dot).
pub fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    extensions.contains(&extension(path).as_str())
}

/// Answers to yes/no style questions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    Yes,
    No,
    Cancel,
    Ok,
}

impl Choice {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "yes" => Some(Choice::Yes),
            "no" => Some(Choice::No),
            "cancel" => Some(Choice::Cancel),
            "ok" => Some(Choice::Ok),
            _ => None,
        }
    }
}

/// A choice out of `allowed`.
pub fn choice(reply: &Reply, allowed: &[Choice]) -> Result<Choice> {
    text(reply)
        .ok()
        .and_then(Choice::parse)
        .filter(|c| allowed.contains(c))
        .ok_or_else(|| ModuleError::validation("Please answer with one of the offered options."))
}

/// The single value of a reply; a one-element list counts too.
pub fn text(reply: &Reply) -> Result<&str> {
    match reply {
        Reply::Text(value) => Ok(value.as_str()),
        Reply::List(values) if values.len() == 1 => Ok(values[0].as_str()),
        _ => Err(ModuleError::validation("A single value is expected.")),
    }
}

/// List replies as they are; text replies split on whitespace.
pub fn tokens(reply: &Reply) -> Result<Vec<String>> {
    match reply {
        Reply::List(values) => Ok(values.iter().map(|v| v.trim().to_string()).collect()),
        Reply::Text(value) => Ok(value.split_whitespace().map(str::to_string).collect()),
        Reply::File(_) => Err(ModuleError::validation("A list of values is expected.")),
    }
}

pub fn path(reply: &Reply) -> Result<&Path> {
    reply
        .as_path()
        .ok_or_else(|| ModuleError::validation("A file is expected."))
}

pub fn positive_integer(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n > 0)
}

pub fn number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}
