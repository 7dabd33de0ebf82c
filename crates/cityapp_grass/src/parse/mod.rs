//! Output Parsers
//!
//! GRASS prints loosely structured text: `key=value` lines, `key:value`
//! blocks and free-form listings. Each submodule turns one of those shapes
//! into a typed value.

mod columns;
mod describe;
mod numeric;
mod topology;
mod univar;

pub use columns::{is_numeric_type, parse_columns, ColumnInfo};
pub use describe::parse_description;
pub use numeric::truncate_decimal;
pub use topology::{Topology, TopologyCounts};
pub use univar::{StatKey, UnivariateStats};

use crate::error::{GrassError, Result};

/// Split `key=value` lines; lines without `=` are skipped.
pub fn parse_key_values(raw: &str) -> Vec<(String, String)> {
    raw.lines()
        .filter_map(|line| line.split_once('='))
        .map(|(key, value)| (key.trim().to_string(), value.trim().to_string()))
        .collect()
}

/// One name per non-empty line (`g.list`).
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Centre of a region from `g.region -cg`: `(easting, northing)`.
pub fn parse_region_center(raw: &str) -> Result<(String, String)> {
    let pairs = parse_key_values(raw);
    let lookup = |key: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| GrassError::parse("g.region", format!("missing {}", key)))
    };
    Ok((lookup("center_easting")?, lookup("center_northing")?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn list_skips_blank_lines() {
        assert_eq!(
            parse_list("lines_osm\n\nparks\n  buildings \n"),
            vec!["lines_osm", "parks", "buildings"]
        );
    }

    #[test]
    fn key_values_ignore_noise() {
        let pairs = parse_key_values("points=3\nnot a pair\nlines = 0\n");
        assert_eq!(
            pairs,
            vec![
                ("points".to_string(), "3".to_string()),
                ("lines".to_string(), "0".to_string())
            ]
        );
    }

    #[test]
    fn region_center_reads_easting_and_northing() {
        let raw = "center_easting=19.0402\ncenter_northing=47.4979\n";
        assert_eq!(
            parse_region_center(raw).unwrap(),
            ("19.0402".to_string(), "47.4979".to_string())
        );
    }

    #[test]
    fn region_center_requires_both_values() {
        let err = parse_region_center("center_easting=1\n").unwrap_err();
        assert!(err.to_string().contains("center_northing"));
    }
}
