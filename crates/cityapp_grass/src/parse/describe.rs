use cityapp_protocol::{DescriptionTable, Row, TableDescription};

/// Parse `db.describe table=<t>` output.
///
/// The output is a table block followed by one block per column, separated
/// by blank lines; every line is `key:value`. Header fields of each table
/// are the keys of its first block plus the synthetic `min` and `max`.
/// Bounds are filled in separately (see [`GisOps::describe_table`]).
///
/// [`GisOps::describe_table`]: crate::ops::GisOps::describe_table
pub fn parse_description(raw: &str) -> TableDescription {
    let mut blocks = split_blocks(raw).into_iter();
    let table_blocks: Vec<Row> = blocks.next().into_iter().collect();
    let column_blocks: Vec<Row> = blocks.collect();

    TableDescription {
        table: format_table(table_blocks),
        columns: format_table(column_blocks),
    }
}

fn split_blocks(raw: &str) -> Vec<Row> {
    let mut blocks = Vec::new();
    let mut current = Row::new();

    for line in raw.lines() {
        if line.trim().is_empty() {
            if !current.is_empty() {
                blocks.push(std::mem::take(&mut current));
            }
            continue;
        }
        let (key, value) = line.split_once(':').unwrap_or((line, ""));
        current.insert(key.trim(), value.trim());
    }
    if !current.is_empty() {
        blocks.push(current);
    }

    blocks
}

fn format_table(rows: Vec<Row>) -> DescriptionTable {
    let mut head_fields: Vec<String> = rows
        .first()
        .map(|row| row.keys().map(str::to_string).collect())
        .unwrap_or_default();
    head_fields.push("min".to_string());
    head_fields.push("max".to_string());

    DescriptionTable { head_fields, rows }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIBE: &str = "\
table:buildings
description:
insert:?
delete:?
ncols:3
nrows:42

column:cat
description:
type:INTEGER
len:20
scale:0
precision:10
default:
nullok:yes
select:?
update:?

column:area_m2
description:
type:DOUBLE PRECISION
len:20
scale:0
precision:15
default:
nullok:yes
select:?
update:?

column:name
description:
type:CHARACTER
len:80
scale:0
precision:0
default:
nullok:yes
select:?
update:?
";

    #[test]
    fn header_is_first_block_keys_plus_bounds() {
        let desc = parse_description(DESCRIBE);
        assert_eq!(desc.table.head_fields.len(), 6 + 2);
        assert_eq!(desc.columns.head_fields.len(), 10 + 2);
        assert_eq!(&desc.columns.head_fields[10..], ["min", "max"]);
        assert_eq!(desc.columns.head_fields[0], "column");
    }

    #[test]
    fn one_row_per_column_block() {
        let desc = parse_description(DESCRIBE);
        assert_eq!(desc.table.rows.len(), 1);
        assert_eq!(desc.table.rows[0].get("nrows"), Some("42"));
        assert_eq!(desc.columns.rows.len(), 3);
        assert_eq!(
            desc.column("area_m2").and_then(|r| r.get("type")),
            Some("DOUBLE PRECISION")
        );
    }

    #[test]
    fn row_keys_are_subset_of_header() {
        let desc = parse_description(DESCRIBE);
        for row in &desc.columns.rows {
            for key in row.keys() {
                assert!(desc.columns.head_fields.iter().any(|h| h == key));
            }
        }
    }

    #[test]
    fn values_keep_everything_after_first_colon() {
        let desc = parse_description("table:t\ndatabase:C:/gis/sqlite.db\n");
        assert_eq!(desc.table.rows[0].get("database"), Some("C:/gis/sqlite.db"));
    }

    #[test]
    fn table_without_columns_still_has_bound_headers() {
        let desc = parse_description("table:empty\nncols:0\n");
        assert!(desc.columns.rows.is_empty());
        assert_eq!(desc.columns.head_fields, vec!["min", "max"]);
    }
}
