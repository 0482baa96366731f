use std::path::Path;

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;

use super::lines::format_table;
use super::model::{LineRecord, Spectrum};

/// Create the parent directory of `path` if it does not exist yet.
pub fn ensure_parent(path: &Path) -> Result<()> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => std::fs::create_dir_all(dir)
            .with_context(|| format!("creating directory {}", dir.display())),
        _ => Ok(()),
    }
}

/// Write the fixed-width line table, replacing any existing file.
pub fn write_line_table(path: &Path, records: &[LineRecord]) -> Result<()> {
    ensure_parent(path)?;
    std::fs::write(path, format_table(records))
        .with_context(|| format!("writing line table {}", path.display()))?;
    info!("wrote {} lines to {}", records.len(), path.display());
    Ok(())
}

#[derive(Serialize)]
struct SpectrumRow {
    wavelength: f64,
    flux: f64,
}

/// Write the spectrum as `wavelength,flux` CSV.
pub fn write_spectrum_csv(path: &Path, spectrum: &Spectrum) -> Result<()> {
    ensure_parent(path)?;
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("opening {}", path.display()))?;
    for (wavelength, flux) in spectrum.points() {
        writer
            .serialize(SpectrumRow { wavelength, flux })
            .context("writing spectrum row")?;
    }
    writer.flush().context("flushing spectrum CSV")?;
    info!("wrote {} spectrum samples to {}", spectrum.len(), path.display());
    Ok(())
}
