//! Text templates in the Go `text/template` dialect.
//!
//! Templates are parsed against a [`FuncRegistry`] and executed against a
//! typed [`Record`] tree. Field names that a record does not expose fail the
//! execution instead of printing an empty value.

mod ast;
mod exec;
mod format;
mod funcs;
mod lexer;
mod parse;
mod value;

use thiserror::Error;

pub use funcs::{title_case, FuncRegistry, Helper, HelperError};
pub use value::{Record, Value};

/// Malformed template source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {name}:{line}: {message}")]
pub struct ParseError {
    pub name: String,
    pub line: usize,
    pub message: String,
}

impl ParseError {
    pub(crate) fn new(name: &str, line: usize, message: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            line,
            message: message.into(),
        }
    }
}

/// Failure while executing a parsed template.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("template: {name}:{line}: executing {name:?}: {message}")]
pub struct ExecError {
    pub name: String,
    pub line: usize,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    root: Vec<ast::Node>,
    funcs: FuncRegistry,
}

impl Template {
    pub fn parse(
        name: impl Into<String>,
        src: &str,
        funcs: &FuncRegistry,
    ) -> Result<Self, ParseError> {
        let name = name.into();
        let root = parse::parse(&name, src, funcs)?;
        Ok(Self {
            name,
            root,
            funcs: funcs.clone(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn execute(&self, data: &dyn Record) -> Result<String, ExecError> {
        exec::execute(&self.name, &self.root, &self.funcs, Value::Record(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ColumnParam, TableParam, TemplateParam};

    fn column(name: &str, camel: &str, ty: &str, nullable: bool) -> ColumnParam {
        ColumnParam {
            column_name: name.to_string(),
            column_name_camel: camel.to_string(),
            column_type: ty.to_string(),
            is_nullable: nullable,
        }
    }

    fn sample() -> TemplateParam {
        TemplateParam {
            table_params: vec![
                TableParam {
                    table_name: "users".to_string(),
                    table_name_camel_fu: "Users".to_string(),
                    columns: vec![
                        column("id", "id", "int4", false),
                        column("full_name", "fullName", "text", true),
                    ],
                },
                TableParam {
                    table_name: "order_items".to_string(),
                    table_name_camel_fu: "OrderItems".to_string(),
                    columns: vec![column("sku", "sku", "varchar", false)],
                },
            ],
        }
    }

    fn render(src: &str) -> Result<String, String> {
        let template = Template::parse("test", src, &FuncRegistry::default())
            .map_err(|e| e.to_string())?;
        template.execute(&sample()).map_err(|e| e.to_string())
    }

    #[test]
    fn test_range_over_tables_and_columns() {
        let out = render(
            "{{range .TableParams}}{{.TableNameCamelFU}}:{{range .Columns}} {{.ColumnNameCamel}}{{end}};{{end}}",
        )
        .unwrap();

        assert_eq!(out, "Users: id fullName;OrderItems: sku;");
    }

    #[test]
    fn test_helpers_and_pipelines() {
        let out = render(
            "{{range .TableParams}}{{.TableName | ToUpper}} {{FirstUpper .TableName}} {{AddNum (len .Columns) 10}}\n{{end}}",
        )
        .unwrap();

        assert_eq!(out, "USERS Users 12\nORDER_ITEMS Order_items 11\n");
    }

    #[test]
    fn test_range_index_and_separator() {
        let out = render(
            "{{range $t := .TableParams}}{{range $i, $c := $t.Columns}}{{if $i}}, {{end}}{{AddNum $i 1}}={{$c.ColumnName}}{{end}}|{{end}}",
        )
        .unwrap();

        assert_eq!(out, "1=id, 2=full_name|1=sku|");
    }

    #[test]
    fn test_root_variable_inside_range() {
        let out = render("{{range .TableParams}}{{len $.TableParams}}{{end}}").unwrap();

        assert_eq!(out, "22");
    }

    #[test]
    fn test_if_else_chain_with_builtins() {
        let src = "{{range .TableParams}}{{range .Columns}}\
                   {{if eq .ColumnType \"int4\"}}i{{else if .IsNullable}}n{{else}}o{{end}}\
                   {{end}}{{end}}";

        assert_eq!(render(src).unwrap(), "ino");
    }

    #[test]
    fn test_with_and_else() {
        let out = render(
            "{{with .TableParams}}{{len .}} tables{{end}} {{with $x := 0}}{{$x}}{{else}}zero{{end}}",
        )
        .unwrap();

        assert_eq!(out, "2 tables zero");
    }

    #[test]
    fn test_range_else_and_integers() {
        assert_eq!(render("{{range 3}}{{.}}{{end}}").unwrap(), "012");
        assert_eq!(render("{{range 0}}x{{else}}empty{{end}}").unwrap(), "empty");
    }

    #[test]
    fn test_variables_are_block_scoped() {
        let err = render("{{if true}}{{$x := 1}}{{end}}{{$x}}").unwrap_err();

        assert!(err.contains("undefined variable: $x"), "{err}");
        assert_eq!(render("{{$x := \"a\"}}{{if true}}{{$x}}{{end}}").unwrap(), "a");
    }

    #[test]
    fn test_trim_markers_and_comments() {
        let src = "{{- /* header */ -}}\n{{ range .TableParams -}}\n  {{ .TableName }}\n{{- end }}";

        assert_eq!(render(src).unwrap(), "usersorder_items");
    }

    #[test]
    fn test_unknown_field_is_an_error() {
        let err = render("{{range .TableParams}}\n{{.Name}}{{end}}").unwrap_err();

        assert_eq!(
            err,
            "template: test:2: executing \"test\": can't evaluate field Name in type TableParam"
        );
    }

    #[test]
    fn test_field_on_scalar_is_an_error() {
        let err = render("{{range .TableParams}}{{.TableName.Length}}{{end}}").unwrap_err();

        assert!(err.contains("can't evaluate field Length in type string"), "{err}");
    }

    #[test]
    fn test_helper_failure_is_an_error() {
        let err = render("{{ AddNum \"a\" 1 }}").unwrap_err();

        assert!(err.contains("error calling AddNum"), "{err}");
    }

    #[test]
    fn test_printing_a_record_is_an_error() {
        let err = render("{{ . }}").unwrap_err();

        assert!(err.contains("can't print value of type TemplateParam"), "{err}");
    }

    #[test]
    fn test_argument_to_non_function() {
        assert!(render("{{ .TableParams 1 }}").is_err());
        assert!(render("{{ 1 | 2 }}").is_err());
        assert!(render("{{ nil }}").is_err());
    }

    #[test]
    fn test_print_builtins() {
        let out = render("{{range .TableParams}}{{printf \"%s_%d\" .TableName 1}} {{end}}").unwrap();
        assert_eq!(out, "users_1 order_items_1 ");

        assert_eq!(render("{{print 1 2 \"x\"}}").unwrap(), "1 2x");
        assert_eq!(render("{{println \"a\" 1}}").unwrap(), "a 1\n");
        assert_eq!(
            render("{{range .TableParams}}{{len .Columns | printf \"%02d\"}}{{end}}").unwrap(),
            "0201"
        );
    }

    #[test]
    fn test_and_or_stop_at_deciding_argument() {
        assert_eq!(
            render("{{if and false (index .TableParams 3)}}x{{end}}ok").unwrap(),
            "ok"
        );
        assert_eq!(
            render("{{if or true (index .TableParams 3)}}yes{{end}}").unwrap(),
            "yes"
        );
        assert_eq!(render("{{or 0 (len .TableParams) (index .TableParams 9)}}").unwrap(), "2");
        assert_eq!(render("{{\"\" | and 1}}|{{0 | or \"\"}}").unwrap(), "|0");

        let err = render("{{and true (index .TableParams 3)}}").unwrap_err();
        assert!(err.contains("index out of range: 3"), "{err}");
    }

    #[test]
    fn test_range_over_integer_variable() {
        assert_eq!(render("{{range $n := 3}}{{$n}}{{end}}").unwrap(), "012");
        assert_eq!(render("{{range $n := 0}}{{$n}}{{else}}none{{end}}").unwrap(), "none");
    }

    #[test]
    fn test_internal_whitespace_is_preserved() {
        assert_eq!(render("  a \n\n b  ").unwrap(), "  a \n\n b  ");
    }

    #[test]
    fn test_custom_registry_is_used_for_parsing() {
        fn twice<'a>(args: &[Value<'a>]) -> Result<Value<'a>, HelperError> {
            let s = args[0]
                .as_str()
                .ok_or_else(|| HelperError::new("want string"))?;
            Ok(Value::from(s.repeat(2)))
        }

        let funcs = FuncRegistry::default().merge(&FuncRegistry::empty().with("Twice", twice));
        let template = Template::parse("t", "{{ \"ab\" | Twice }}", &funcs).unwrap();

        assert_eq!(template.execute(&TemplateParam::default()).unwrap(), "abab");
        assert!(Template::parse("t", "{{ Twice \"ab\" }}", &FuncRegistry::default()).is_err());
    }
}
