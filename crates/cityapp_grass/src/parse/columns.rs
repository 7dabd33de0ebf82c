use regex::Regex;
use std::sync::LazyLock;

static COLUMN_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^Column \d+: ([^:]+):([^:]+):(\d+)").unwrap()
});

/// One attribute column as listed by `db.describe -c`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub sql_type: String,
    pub width: u32,
}

impl ColumnInfo {
    /// `cat` is the key column every GRASS table carries.
    pub fn is_key(&self) -> bool {
        self.name.eq_ignore_ascii_case("cat")
    }

    /// Queryable numbers: `DOUBLE PRECISION` or `INTEGER`, never `cat`.
    pub fn is_numeric(&self) -> bool {
        is_numeric_type(&self.sql_type) && !self.is_key()
    }
}

pub fn is_numeric_type(sql_type: &str) -> bool {
    matches!(sql_type.trim(), "DOUBLE PRECISION" | "INTEGER")
}

/// Parse the `Column N: name:type:width` lines of `db.describe -c`.
pub fn parse_columns(raw: &str) -> Vec<ColumnInfo> {
    raw.lines()
        .filter_map(|line| COLUMN_LINE.captures(line.trim()))
        .filter_map(|caps| {
            Some(ColumnInfo {
                name: caps.get(1)?.as_str().trim().to_string(),
                sql_type: caps.get(2)?.as_str().trim().to_string(),
                width: caps.get(3)?.as_str().parse().ok()?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIBE_C: &str = "\
ncols: 5
nrows: 120
Column 1: cat:INTEGER:20
Column 2: area_m2:DOUBLE PRECISION:20
Column 3: name:CHARACTER:80
Column 4: floors:INTEGER:20
Column 5: location_id:TEXT:40
";

    #[test]
    fn parses_every_column_line() {
        let cols = parse_columns(DESCRIBE_C);
        assert_eq!(cols.len(), 5);
        assert_eq!(
            cols[1],
            ColumnInfo {
                name: "area_m2".to_string(),
                sql_type: "DOUBLE PRECISION".to_string(),
                width: 20
            }
        );
    }

    #[test]
    fn numeric_filter_excludes_cat_and_text() {
        let numeric: Vec<String> = parse_columns(DESCRIBE_C)
            .into_iter()
            .filter(ColumnInfo::is_numeric)
            .map(|c| c.name)
            .collect();
        assert_eq!(numeric, vec!["area_m2", "floors"]);
    }

    #[test]
    fn cat_match_is_case_insensitive_and_exact() {
        let upper = ColumnInfo {
            name: "CAT".to_string(),
            sql_type: "INTEGER".to_string(),
            width: 20,
        };
        assert!(!upper.is_numeric());

        let category = ColumnInfo {
            name: "category".to_string(),
            sql_type: "INTEGER".to_string(),
            width: 20,
        };
        assert!(category.is_numeric());
    }
}
