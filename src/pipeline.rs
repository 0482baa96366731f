use anyhow::{Context, Result};
use log::{debug, info};

use crate::config::Config;
use crate::data::aperture::{crop, extract_spectrum};
use crate::data::export::{write_line_table, write_spectrum_csv};
use crate::data::lines::map_lines;
use crate::data::loader::{read_cube, write_cube};
use crate::data::model::{LineRecord, Spectrum};
use crate::render::{annotate, figure};

// ---------------------------------------------------------------------------
// Single-pass run
// ---------------------------------------------------------------------------

/// Everything the figure needs.
pub struct Products {
    pub lines: Vec<LineRecord>,
    pub spectrum: Spectrum,
}

/// Run the whole pipeline: line table, cube extraction, figures.
pub fn run(config: &Config) -> Result<()> {
    let products = extract(config)?;
    render(config, &products)
}

/// Map the line catalogue and extract the aperture spectrum, writing the
/// line table, the cropped cube and the spectrum CSV along the way.
pub fn extract(config: &Config) -> Result<Products> {
    let lines = map_lines(config.redshift, &config.lines).context("mapping line catalogue")?;
    for rec in &lines {
        debug!(
            "{:<6} {:8.2} Å -> {:8.2} Å",
            rec.identifier, rec.rest_wavelength, rec.observed_wavelength
        );
    }
    write_line_table(&config.output.line_table, &lines)?;

    let cube = read_cube(&config.input_cube, config.input_hdu)?;
    let cropped = crop(&cube, &config.crop).context("cropping cube")?;
    drop(cube);
    debug!(
        "cropped reference pixel: CRPIX1 {:?}, CRPIX2 {:?}",
        cropped.card_f64("CRPIX1"),
        cropped.card_f64("CRPIX2")
    );
    write_cube(&config.output.cropped_cube, &cropped)?;
    drop(cropped);

    let cube = read_cube(&config.output.cropped_cube, 0)?;
    let spectrum = extract_spectrum(&cube, &config.aperture).context("extracting spectrum")?;
    info!(
        "extracted {} samples, peak flux {:?}",
        spectrum.len(),
        spectrum.max_flux()
    );
    write_spectrum_csv(&config.output.spectrum_csv, &spectrum)?;

    Ok(Products { lines, spectrum })
}

/// Draw the annotated spectrum to the vector and raster outputs.
pub fn render(config: &Config, products: &Products) -> Result<()> {
    let markers = annotate::markers(&products.lines);
    let size = (config.figure.width, config.figure.height);

    figure::render_svg(
        &config.output.figure_svg,
        &products.spectrum,
        &markers,
        size,
        None,
    )?;
    figure::render_png(
        &config.output.figure_png,
        &products.spectrum,
        &markers,
        size,
        Some(config.figure.title.as_str()),
    )?;
    Ok(())
}
