use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ProtocolError;

/// Every wizard module the dispatcher knows about.
///
/// The wire name is the prefix of each message id (`add_map.3`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModuleKind {
    /// Create the base location from an OpenStreetMap extract.
    AddLocation,
    /// Draw the area of interest ("selection") on the base map.
    SetSelection,
    /// Store the default calculation resolution.
    SetResolution,
    /// Add a vector or raster layer to the base mapset.
    AddMap,
    /// Query a layer by attribute inside a drawn area and report statistics.
    AttributeQuery,
}

impl ModuleKind {
    pub const ALL: [ModuleKind; 5] = [
        ModuleKind::AddLocation,
        ModuleKind::SetSelection,
        ModuleKind::SetResolution,
        ModuleKind::AddMap,
        ModuleKind::AttributeQuery,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ModuleKind::AddLocation => "add_location",
            ModuleKind::SetSelection => "set_selection",
            ModuleKind::SetResolution => "set_resolution",
            ModuleKind::AddMap => "add_map",
            ModuleKind::AttributeQuery => "attribute_query",
        }
    }
}

impl fmt::Display for ModuleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModuleKind {
    type Err = ProtocolError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ModuleKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| ProtocolError::UnknownModule(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_names_round_trip() {
        for kind in ModuleKind::ALL {
            assert_eq!(kind.as_str().parse::<ModuleKind>().unwrap(), kind);
        }
    }

    #[test]
    fn unknown_name_is_rejected() {
        let err = "module_9".parse::<ModuleKind>().unwrap_err();
        assert_eq!(err, ProtocolError::UnknownModule("module_9".to_string()));
    }

    #[test]
    fn serde_uses_wire_name() {
        let json = serde_json::to_string(&ModuleKind::AttributeQuery).unwrap();
        assert_eq!(json, "\"attribute_query\"");
    }
}
