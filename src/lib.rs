pub mod config;
pub mod database_schema;
pub mod error;
pub mod generator;
pub mod logging;
pub mod param_builder;
pub mod template;
pub mod types;
pub mod writer;

pub use config::{Config, DbConfig, TemplateConfig};
pub use error::GenerateError;
pub use generator::Generator;
