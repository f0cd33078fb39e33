use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::GenerateError;

/// A rendered template waiting to be written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RenderedOutput {
    pub output_path: PathBuf,
    pub contents: Vec<u8>,
}

/// Writes outputs in order, stopping at the first failure. Files written
/// before the failure are left in place.
pub fn write_all(outputs: &[RenderedOutput]) -> Result<(), GenerateError> {
    for output in outputs {
        info!(path = %output.output_path.display(), "write");
        write_output(&output.output_path, &output.contents)?;
    }
    Ok(())
}

/// Creates or truncates `path`; new files get mode 0644 on Unix.
pub fn write_output(path: &Path, contents: &[u8]) -> Result<(), GenerateError> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o644);
    }

    let to_error = |source| GenerateError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut file = options.open(path).map_err(to_error)?;
    file.write_all(contents).map_err(to_error)
}
