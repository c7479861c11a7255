//! JSON output helpers shared by the subcommands.

use std::io::Write;

use camino::Utf8Path;
use log::info;
use serde::Serialize;

use crate::CliError;

/// Write `value` as pretty JSON followed by a newline.
pub(crate) fn write_json<T: Serialize + ?Sized>(
    writer: &mut dyn Write,
    value: &T,
) -> Result<(), CliError> {
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseView)?;
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)?;
    writer.write_all(b"\n").map_err(CliError::WriteOutput)?;
    Ok(())
}

/// Write `value` as pretty JSON to `path`, creating parent directories.
pub(crate) fn write_json_file<T: Serialize + ?Sized>(
    path: &Utf8Path,
    value: &T,
) -> Result<(), CliError> {
    let write_error = |source: std::io::Error| CliError::WriteOutputFile {
        path: path.to_path_buf(),
        source,
    };
    let payload = serde_json::to_string_pretty(value).map_err(CliError::SerialiseView)?;
    let mut file = loopstat_fs::create_utf8_file(path).map_err(write_error)?;
    file.write_all(payload.as_bytes()).map_err(write_error)?;
    file.write_all(b"\n").map_err(write_error)?;
    info!("wrote {path}");
    Ok(())
}
