use anyhow::{Context, Result};
use clap::ValueEnum;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::io::{BufWriter, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::info;

use gazetteer::Gazetteer;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Comma-separated with a header row
    Csv,
    /// One JSON object per line
    Jsonl,
}

fn write_rows<W: Write>(mut writer: W, format: OutputFormat, gazetteer: &Gazetteer) -> Result<W> {
    match format {
        OutputFormat::Csv => {
            let mut csv_writer = csv::Writer::from_writer(writer);
            csv_writer.write_record(gazetteer.schema.columns())?;
            for row in &gazetteer.rows {
                csv_writer.write_record(row.to_record())?;
            }
            csv_writer
                .into_inner()
                .map_err(|e| e.into_error())
                .context("Failed to flush CSV output")
        }
        OutputFormat::Jsonl => {
            for row in &gazetteer.rows {
                serde_json::to_writer(&mut writer, row)?;
                writer.write_all(b"\n")?;
            }
            Ok(writer)
        }
    }
}

/// Write the gazetteer to `path`, gzip-compressed when it ends in `.gz`.
///
/// Rows go to a temporary file in the destination directory, which only
/// replaces `path` once everything has been written.
pub fn write_gazetteer(path: &Path, format: OutputFormat, gazetteer: &Gazetteer) -> Result<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let gzip = path.extension().map_or(false, |e| e == "gz");
    if gzip {
        let encoder = GzEncoder::new(BufWriter::new(tmp.as_file()), Compression::default());
        write_rows(encoder, format, gazetteer)?
            .finish()?
            .flush()?;
    } else {
        write_rows(BufWriter::new(tmp.as_file()), format, gazetteer)?.flush()?;
    }

    tmp.persist(path)
        .with_context(|| format!("Failed to move output into {}", path.display()))?;
    info!(
        "Wrote {} rows ({} columns) to {}",
        gazetteer.rows.len(),
        gazetteer.schema.len(),
        path.display()
    );
    Ok(())
}
