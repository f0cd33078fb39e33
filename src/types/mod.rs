pub mod column_param;
pub mod table_param;
pub mod template_param;

pub use column_param::ColumnParam;
pub use table_param::TableParam;
pub use template_param::TemplateParam;
