use super::table_param::TableParam;
use crate::template::{Record, Value};

/// Root of the data every template is executed against.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TemplateParam {
    pub table_params: Vec<TableParam>,
}

impl Record for TemplateParam {
    fn type_name(&self) -> &'static str {
        "TemplateParam"
    }

    fn field(&self, name: &str) -> Option<Value<'_>> {
        match name {
            "TableParams" => Some(Value::records(&self.table_params)),
            _ => None,
        }
    }
}
