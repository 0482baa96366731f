use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use serde::{Deserialize, Serialize};

use crate::data::aperture::{CircularAperture, CropWindow};
use crate::data::lines::default_catalogue;
use crate::data::model::SpectralLine;

// ---------------------------------------------------------------------------
// Run configuration
// ---------------------------------------------------------------------------

/// Every tunable of a run. Missing fields in a config file fall back to the
/// MRC 0943-242 defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Systemic redshift of the target.
    pub redshift: f64,
    /// Lines to mark, in table order.
    pub lines: Vec<SpectralLine>,
    /// Source cube.
    pub input_cube: PathBuf,
    /// HDU holding the flux (MUSE: extension 1).
    pub input_hdu: usize,
    /// Spatial region copied into the intermediate cube.
    pub crop: CropWindow,
    /// Aperture in pixel coordinates of the cropped cube.
    pub aperture: CircularAperture,
    pub output: OutputPaths,
    pub figure: FigureConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            redshift: 2.923,
            lines: default_catalogue(),
            input_cube: PathBuf::from("data/MRC0943_ZAP_astrom_corr.fits"),
            input_hdu: 1,
            crop: CropWindow {
                y: 185..285,
                x: 120..220,
            },
            aperture: CircularAperture {
                center_y: 52.0,
                center_x: 46.0,
                radius: 12.0,
            },
            output: OutputPaths::default(),
            figure: FigureConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputPaths {
    pub line_table: PathBuf,
    /// Cropped cube, re-read before extraction.
    pub cropped_cube: PathBuf,
    pub spectrum_csv: PathBuf,
    pub figure_svg: PathBuf,
    pub figure_png: PathBuf,
}

impl Default for OutputPaths {
    fn default() -> Self {
        Self {
            line_table: PathBuf::from("out/0943_spectrum.txt"),
            cropped_cube: PathBuf::from("out/0943_spec_cube.fits"),
            spectrum_csv: PathBuf::from("out/0943_spectrum.csv"),
            figure_svg: PathBuf::from("out/0943_spectrum.svg"),
            figure_png: PathBuf::from("out/0943-242 spectrum.png"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureConfig {
    /// Pixel size of both renderings.
    pub width: u32,
    pub height: u32,
    /// Caption of the raster figure; the vector figure is left untitled.
    pub title: String,
}

impl Default for FigureConfig {
    fn default() -> Self {
        Self {
            width: 1800,
            height: 800,
            title: "0943-242 Galaxy Spectrum".to_string(),
        }
    }
}

impl Config {
    /// Read a JSON config file, or return the defaults when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("no config file given, using built-in defaults");
            return Ok(Self::default());
        };
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Config = serde_json::from_str(&text)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!("loaded config from {}", path.display());
        Ok(config)
    }
}
