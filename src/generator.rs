use std::fs;
use tracing::{info, instrument, warn};

use crate::config::{Config, TemplateConfig};
use crate::database_schema::{PgSchemaReader, SchemaSource};
use crate::error::GenerateError;
use crate::param_builder::columns_to_template_param;
use crate::template::{FuncRegistry, Template};
use crate::types::TemplateParam;
use crate::writer::{write_all, RenderedOutput};

/// Renders every configured template against the schema of one database.
#[derive(Clone, Debug, Default)]
pub struct Generator {
    funcs: FuncRegistry,
}

impl Generator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds helpers on top of the current ones; same-named helpers are
    /// replaced.
    pub fn with_funcs(self, funcs: &FuncRegistry) -> Self {
        Self {
            funcs: self.funcs.merge(funcs),
        }
    }

    pub fn funcs(&self) -> &FuncRegistry {
        &self.funcs
    }

    /// Connects to the configured database and runs the whole pipeline.
    pub async fn generate(&self, cfg: &Config) -> Result<(), GenerateError> {
        let mut reader = PgSchemaReader::connect(&cfg.db).await?;
        let result = self.generate_from(&mut reader, cfg).await;
        reader.close().await;
        result
    }

    /// Runs the pipeline against any schema source. Nothing is written unless
    /// every template renders.
    #[instrument(skip_all, fields(schema = %cfg.target_schema))]
    pub async fn generate_from<S>(&self, source: &mut S, cfg: &Config) -> Result<(), GenerateError>
    where
        S: SchemaSource + Send,
    {
        let rows = source.column_definitions(&cfg.target_schema).await?;
        let param = columns_to_template_param(&rows);
        info!(
            tables = param.table_params.len(),
            columns = rows.len(),
            "loaded schema"
        );

        let outputs = self.render_all(&param, &cfg.templates)?;
        write_all(&outputs)
    }

    /// Renders jobs in order. When several jobs share an output path only
    /// the last one is kept.
    pub fn render_all(
        &self,
        param: &TemplateParam,
        jobs: &[TemplateConfig],
    ) -> Result<Vec<RenderedOutput>, GenerateError> {
        let mut outputs: Vec<RenderedOutput> = Vec::with_capacity(jobs.len());
        for job in jobs {
            let output = self.render(param, job)?;
            if let Some(pos) = outputs
                .iter()
                .position(|o| o.output_path == output.output_path)
            {
                warn!(
                    path = %output.output_path.display(),
                    "output path used by several templates; keeping the last"
                );
                outputs.remove(pos);
            }
            outputs.push(output);
        }
        Ok(outputs)
    }

    pub fn render(
        &self,
        param: &TemplateParam,
        job: &TemplateConfig,
    ) -> Result<RenderedOutput, GenerateError> {
        info!(template = %job.template_path.display(), "generate");

        let source = fs::read_to_string(&job.template_path).map_err(|source| {
            GenerateError::Read {
                path: job.template_path.clone(),
                source,
            }
        })?;
        let template = Template::parse(
            job.template_path.display().to_string(),
            &source,
            &self.funcs,
        )?;
        let rendered = template.execute(param)?;

        Ok(RenderedOutput {
            output_path: job.output_path.clone(),
            contents: trim_output(rendered.as_bytes()).to_vec(),
        })
    }
}

/// Strips leading and trailing newlines and spaces, nothing else.
pub fn trim_output(bytes: &[u8]) -> &[u8] {
    let is_trimmed = |b: &u8| *b == b'\n' || *b == b' ';
    let start = bytes
        .iter()
        .position(|b| !is_trimmed(b))
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !is_trimmed(b))
        .map_or(start, |i| i + 1);
    &bytes[start..end]
}
