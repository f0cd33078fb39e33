use std::collections::HashMap;

use crate::database_schema::ColumnDefinitionRow;
use crate::template::title_case;
use crate::types::{ColumnParam, TableParam, TemplateParam};

/// Groups column rows by exact table name. Tables keep the order in which
/// they first appear, columns keep row order.
pub fn columns_to_template_param(rows: &[ColumnDefinitionRow]) -> TemplateParam {
    let mut positions: HashMap<&str, usize> = HashMap::new();
    let mut table_params: Vec<TableParam> = Vec::new();

    for row in rows {
        let position = *positions.entry(row.table_name.as_str()).or_insert_with(|| {
            table_params.push(TableParam::new(&row.table_name));
            table_params.len() - 1
        });
        table_params[position].columns.push(ColumnParam::from(row));
    }

    TemplateParam { table_params }
}

/// `order_items` -> `OrderItems`, `user_ID` -> `UserID`
pub fn table_name_camel_fu(table_name: &str) -> String {
    let camel = camel_case(table_name, true);
    let camel = if camel.is_empty() {
        table_name
    } else {
        camel.as_str()
    };
    upper_first(&title_case(camel))
}

/// `full_name` -> `fullName`, `userID` stays `userID`
pub fn column_name_camel(column_name: &str) -> String {
    camel_case(column_name, false)
}

/// Drops `_`, `-`, `.` and spaces, upper-casing the letter that follows them
/// or a digit. The first character is upper-cased when `upper_init` is set
/// and lower-cased otherwise; every other character is kept as is.
fn camel_case(name: &str, upper_init: bool) -> String {
    let name = name.trim();
    let mut out = String::with_capacity(name.len());
    let mut cap_next = upper_init;
    for c in name.chars() {
        if matches!(c, '_' | '-' | '.' | ' ') {
            cap_next = upper_init || !out.is_empty();
            continue;
        }
        if out.is_empty() && !upper_init {
            out.extend(c.to_lowercase());
        } else if cap_next {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        cap_next = c.is_ascii_digit();
    }
    out
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(table: &str, column: &str, data_type: &str, is_nullable: bool) -> ColumnDefinitionRow {
        ColumnDefinitionRow {
            table_name: table.to_string(),
            column_name: column.to_string(),
            data_type: data_type.to_string(),
            is_nullable,
        }
    }

    #[test]
    fn test_group_by_table() {
        let rows = vec![
            row("users", "id", "int4", false),
            row("orders", "id", "int8", false),
            row("users", "full_name", "text", true),
            row("orders", "user_id", "int4", false),
            row("Users", "id", "int4", false),
        ];

        let param = columns_to_template_param(&rows);

        let names: Vec<&str> = param
            .table_params
            .iter()
            .map(|t| t.table_name.as_str())
            .collect();
        assert_eq!(names, vec!["users", "orders", "Users"]);

        let users = &param.table_params[0];
        assert_eq!(users.table_name_camel_fu, "Users");
        assert_eq!(
            users.columns,
            vec![
                ColumnParam {
                    column_name: "id".to_string(),
                    column_name_camel: "id".to_string(),
                    column_type: "int4".to_string(),
                    is_nullable: false,
                },
                ColumnParam {
                    column_name: "full_name".to_string(),
                    column_name_camel: "fullName".to_string(),
                    column_type: "text".to_string(),
                    is_nullable: true,
                },
            ]
        );
    }

    #[test]
    fn test_grouping_partitions_every_row_once() {
        let tables = ["a", "b", "a_b", "A", "b"];
        let rows: Vec<_> = (0..40)
            .map(|i| row(tables[i % tables.len()], &format!("c{i}"), "text", i % 3 == 0))
            .collect();

        let param = columns_to_template_param(&rows);

        let total: usize = param.table_params.iter().map(|t| t.columns.len()).sum();
        assert_eq!(total, rows.len());

        let mut seen: Vec<&str> = param
            .table_params
            .iter()
            .map(|t| t.table_name.as_str())
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), param.table_params.len());

        for table in &param.table_params {
            for column in &table.columns {
                assert!(rows.iter().any(|r| r.table_name == table.table_name
                    && r.column_name == column.column_name));
            }
        }
    }

    #[test]
    fn test_empty_rows() {
        assert!(columns_to_template_param(&[]).table_params.is_empty());
    }

    #[test]
    fn test_column_name_camel() {
        assert_eq!(column_name_camel("full_name"), "fullName");
        assert_eq!(column_name_camel("id"), "id");
        assert_eq!(column_name_camel("created_at_utc"), "createdAtUtc");
        assert_eq!(column_name_camel("FullName"), "fullName");
        assert_eq!(column_name_camel("userID"), "userID");
        assert_eq!(column_name_camel("html_URL"), "htmlURL");
        assert_eq!(column_name_camel("address.line-2"), "addressLine2");
        assert_eq!(column_name_camel("v2api"), "v2Api");
        assert_eq!(column_name_camel("_id"), "id");
    }

    #[test]
    fn test_column_name_camel_keeps_camel_input() {
        for name in ["fullName", "userID", "htmlURL", "id", "x", "createdAtUtc", "v2Api"] {
            assert_eq!(column_name_camel(name), name);
        }
    }

    #[test]
    fn test_column_name_camel_is_idempotent() {
        for name in ["full_name", "userID", "HTTPStatus", "already_camelCase", "x", "a1_b2", "_id"] {
            let once = column_name_camel(name);
            assert_eq!(column_name_camel(&once), once, "{name}");
            assert_eq!(column_name_camel(name), once);
        }
    }

    #[test]
    fn test_table_name_camel_fu() {
        assert_eq!(table_name_camel_fu("users"), "Users");
        assert_eq!(table_name_camel_fu("order_items"), "OrderItems");
        assert_eq!(table_name_camel_fu("orderItems"), "OrderItems");
        assert_eq!(table_name_camel_fu("user profile"), "UserProfile");
        assert_eq!(table_name_camel_fu("user_ID"), "UserID");
        assert_eq!(table_name_camel_fu("api_URL"), "ApiURL");
        assert_eq!(table_name_camel_fu("__"), "__");
    }

    #[test]
    fn test_table_name_camel_fu_starts_upper() {
        for name in ["x", "users", "_private", "é_table", "a-b-c", "ßtraße", "user_ID"] {
            let pascal = table_name_camel_fu(name);
            let first = pascal.chars().next().unwrap();
            assert!(first.is_uppercase(), "{name} -> {pascal}");
        }
        assert!(table_name_camel_fu("1st_place").starts_with('1'));
    }
}
