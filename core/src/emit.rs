//! # Emission
//!
//! Writes rendered module bodies to their destinations, each preceded by
//! exactly one header block.

use crate::config::GenerationOptions;
use crate::error::AppResult;
use chrono::{DateTime, SecondsFormat, Utc};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::info;

/// Marker written on the first line of every built-in header.
pub const GENERATOR_MARKER: &str = "# generated by modelsmith:";

/// The header block written above a module body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHeader {
    custom: Option<String>,
    filename: String,
    timestamp: Option<DateTime<Utc>>,
    version: Option<String>,
}

impl FileHeader {
    /// A header naming `filename` as the source, shaped by the header toggles.
    pub fn from_options(options: &GenerationOptions, filename: &str) -> Self {
        FileHeader {
            custom: options.custom_file_header.clone(),
            filename: filename.to_string(),
            timestamp: (!options.disable_timestamp).then(Utc::now),
            version: options
                .enable_version_header
                .then(|| env!("CARGO_PKG_VERSION").to_string()),
        }
    }

    /// Pins the timestamp line to a fixed instant.
    pub fn with_timestamp(mut self, timestamp: Option<DateTime<Utc>>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// The header text, without a trailing newline.
    pub fn render(&self) -> String {
        if let Some(custom) = &self.custom {
            return custom.trim_end_matches('\n').to_string();
        }
        let mut lines = vec![
            GENERATOR_MARKER.to_string(),
            format!("#   filename:  {}", self.filename),
        ];
        if let Some(timestamp) = &self.timestamp {
            lines.push(format!(
                "#   timestamp: {}",
                timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)
            ));
        }
        if let Some(version) = &self.version {
            lines.push(format!("#   version:   {}", version));
        }
        lines.join("\n")
    }
}

/// Writes the header, then a blank line and the body with trailing
/// whitespace stripped. An empty body leaves only the header.
pub fn write_module<W: Write>(writer: &mut W, header: &FileHeader, body: &str) -> AppResult<()> {
    writeln!(writer, "{}", header.render())?;
    let body = body.trim_end();
    if !body.is_empty() {
        writeln!(writer)?;
        writeln!(writer, "{}", body)?;
    }
    Ok(())
}

/// Writes one module to `path`, creating or truncating the file.
pub fn write_file(path: &Path, header: &FileHeader, body: &str) -> AppResult<()> {
    {
        let mut writer = BufWriter::new(File::create(path)?);
        write_module(&mut writer, header, body)?;
        writer.flush()?;
    }
    info!(path = %path.display(), bytes = body.len(), "Wrote generated module");
    Ok(())
}

/// Writes every `(destination, body)` pair, stopping at the first failure.
pub fn emit<'a, I>(outputs: I, header: &FileHeader) -> AppResult<Vec<PathBuf>>
where
    I: IntoIterator<Item = (&'a Path, &'a str)>,
{
    let mut written = Vec::new();
    for (path, body) in outputs {
        write_file(path, header, body)?;
        written.push(path.to_path_buf());
    }
    Ok(written)
}
