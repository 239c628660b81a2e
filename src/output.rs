//! JSON file input and output.
//!
//! Writes go to a temporary file in the destination directory which is then
//! renamed over the target, so an interrupted run never leaves a truncated
//! file behind. Output is pretty-printed UTF-8 with non-ASCII text kept as is.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tempfile::NamedTempFile;

use crate::errors::{PipelineError, PipelineResult};

/// Serialize `value` to `path`, replacing any previous content atomically
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> PipelineResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let tmp = NamedTempFile::new_in(dir)?;
    {
        let mut writer = BufWriter::new(tmp.as_file());
        serde_json::to_writer_pretty(&mut writer, value)?;
        writer.write_all(b"\n")?;
        writer.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| PipelineError::Io(e.error))?;

    debug!("Wrote {}", path.display());
    Ok(())
}

/// Read a JSON file written by an earlier run
///
/// # Errors
///
/// [`PipelineError::MissingInputFile`] when `path` does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> PipelineResult<T> {
    if !path.exists() {
        return Err(PipelineError::MissingInputFile(path.to_path_buf()));
    }
    let reader = BufReader::new(File::open(path)?);
    Ok(serde_json::from_reader(reader)?)
}
