use crate::database_schema::ColumnDefinitionRow;
use crate::param_builder::column_name_camel;
use crate::template::{Record, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnParam {
    pub column_name: String,       // as declared
    pub column_name_camel: String, // lowerCamelCase
    pub column_type: String,
    pub is_nullable: bool,
}

impl From<&ColumnDefinitionRow> for ColumnParam {
    fn from(row: &ColumnDefinitionRow) -> Self {
        Self {
            column_name: row.column_name.clone(),
            column_name_camel: column_name_camel(&row.column_name),
            column_type: row.data_type.clone(),
            is_nullable: row.is_nullable,
        }
    }
}

impl Record for ColumnParam {
    fn type_name(&self) -> &'static str {
        "ColumnParam"
    }

    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "ColumnName" => Some(Value::from(self.column_name.as_str())),
            "ColumnNameCamel" => Some(Value::from(self.column_name_camel.as_str())),
            "ColumnType" => Some(Value::from(self.column_type.as_str())),
            "IsNullable" => Some(Value::Bool(self.is_nullable)),
            _ => None,
        }
    }
}
