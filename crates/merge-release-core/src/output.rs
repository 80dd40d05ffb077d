use crate::errors::{Result, io_error_with_path};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::Path;

/// Emit a GitHub Actions step output.
///
/// Appends `key=value` to the `GITHUB_OUTPUT` file when one is configured,
/// otherwise prints the legacy `::set-output` workflow command to stdout.
pub fn emit_output(output_file: Option<&Path>, key: &str, value: &str) -> Result<()> {
    match output_file {
        Some(path) => {
            let mut file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| io_error_with_path(e, path))?;
            writeln!(file, "{}={}", key, value).map_err(|e| io_error_with_path(e, path))?;
        }
        None => println!("::set-output name={}::{}", key, value),
    }
    Ok(())
}
