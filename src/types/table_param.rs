use super::column_param::ColumnParam;
use crate::param_builder::table_name_camel_fu;
use crate::template::{Record, Value};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableParam {
    pub table_name: String,
    pub table_name_camel_fu: String, // PascalCase
    pub columns: Vec<ColumnParam>,
}

impl TableParam {
    pub fn new(table_name: &str) -> Self {
        Self {
            table_name: table_name.to_string(),
            table_name_camel_fu: table_name_camel_fu(table_name),
            columns: Vec::new(),
        }
    }
}

impl Record for TableParam {
    fn type_name(&self) -> &'static str {
        "TableParam"
    }

    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "TableName" => Some(Value::from(self.table_name.as_str())),
            "TableNameCamelFU" => Some(Value::from(self.table_name_camel_fu.as_str())),
            "Columns" => Some(Value::records(&self.columns)),
            _ => None,
        }
    }
}
