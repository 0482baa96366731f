use std::collections::BTreeMap;

use ndarray::Array3;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// SpectralLine / LineRecord – the line catalogue
// ---------------------------------------------------------------------------

/// A rest-frame emission line, e.g. `CIV` at 1548.2 Å.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectralLine {
    pub identifier: String,
    /// Rest-frame wavelength in Å.
    pub rest_wavelength: f64,
}

impl SpectralLine {
    pub fn new(identifier: &str, rest_wavelength: f64) -> Self {
        Self {
            identifier: identifier.to_string(),
            rest_wavelength,
        }
    }
}

/// One row of the line table: a catalogue entry and where it lands after
/// redshifting.
#[derive(Debug, Clone, PartialEq)]
pub struct LineRecord {
    pub identifier: String,
    pub rest_wavelength: f64,
    pub observed_wavelength: f64,
}

// ---------------------------------------------------------------------------
// Spectrum – the 1-D extraction result
// ---------------------------------------------------------------------------

/// Flux versus wavelength, increasing in wavelength.
#[derive(Debug, Clone, PartialEq)]
pub struct Spectrum {
    /// Wavelength axis in Å.
    pub wavelength: Vec<f64>,
    /// Summed flux density, same length as `wavelength`.
    pub flux: Vec<f64>,
}

impl Spectrum {
    pub fn len(&self) -> usize {
        self.wavelength.len()
    }

    pub fn is_empty(&self) -> bool {
        self.wavelength.is_empty()
    }

    /// Iterate over `(wavelength, flux)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.wavelength.iter().copied().zip(self.flux.iter().copied())
    }

    /// Largest finite flux value, if any.
    pub fn max_flux(&self) -> Option<f64> {
        self.flux
            .iter()
            .copied()
            .filter(|v| v.is_finite())
            .fold(None, |acc, v| Some(acc.map_or(v, |m: f64| m.max(v))))
    }
}

// ---------------------------------------------------------------------------
// WavelengthAxis – linear spectral WCS (axis 3)
// ---------------------------------------------------------------------------

/// Linear spectral axis: `λ(k) = crval + (k + 1 - crpix) * cdelt`, with `k`
/// the zero-based slice index and `crpix` one-based as in FITS.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WavelengthAxis {
    pub crval: f64,
    pub cdelt: f64,
    pub crpix: f64,
}

impl WavelengthAxis {
    /// Wavelength in Å of slice `index`.
    pub fn wavelength(&self, index: usize) -> f64 {
        self.crval + (index as f64 + 1.0 - self.crpix) * self.cdelt
    }

    /// Wavelengths of the first `len` slices.
    pub fn wavelengths(&self, len: usize) -> Vec<f64> {
        (0..len).map(|k| self.wavelength(k)).collect()
    }
}

impl Default for WavelengthAxis {
    /// Pixel indices as wavelengths, used when a cube carries no spectral WCS.
    fn default() -> Self {
        Self {
            crval: 1.0,
            cdelt: 1.0,
            crpix: 1.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Header cards carried through crop / write
// ---------------------------------------------------------------------------

/// A header value that survives a crop and is written back unchanged
/// (apart from reference pixel shifts).
#[derive(Debug, Clone, PartialEq)]
pub enum CardValue {
    Float(f64),
    Text(String),
}

/// On-disk sample type of the source cube.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleFormat {
    /// BITPIX = -32
    Single,
    /// BITPIX = -64
    Double,
    /// Signed integer BITPIX, promoted on read and written back as `Single`.
    Integer,
}

// ---------------------------------------------------------------------------
// DataCube – flux indexed by (wavelength, y, x)
// ---------------------------------------------------------------------------

/// A spectral data cube held in memory.
#[derive(Debug, Clone)]
pub struct DataCube {
    /// Flux samples indexed `[wavelength, y, x]`.
    pub flux: Array3<f64>,
    pub axis: WavelengthAxis,
    pub format: SampleFormat,
    /// World-coordinate and unit cards other than the spectral axis.
    pub cards: BTreeMap<String, CardValue>,
}

impl DataCube {
    pub fn new(flux: Array3<f64>, axis: WavelengthAxis) -> Self {
        Self {
            flux,
            axis,
            format: SampleFormat::Double,
            cards: BTreeMap::new(),
        }
    }

    /// `(n_wavelength, n_y, n_x)`.
    pub fn dim(&self) -> (usize, usize, usize) {
        self.flux.dim()
    }

    /// Wavelength of every slice, increasing when `cdelt > 0`.
    pub fn wavelengths(&self) -> Vec<f64> {
        self.axis.wavelengths(self.flux.dim().0)
    }

    /// Numeric value of a pass-through card.
    pub fn card_f64(&self, key: &str) -> Option<f64> {
        match self.cards.get(key) {
            Some(CardValue::Float(v)) => Some(*v),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wavelength_axis_honours_reference_pixel() {
        let axis = WavelengthAxis {
            crval: 4750.0,
            cdelt: 1.25,
            crpix: 3.0,
        };
        assert_eq!(axis.wavelength(2), 4750.0);
        assert_eq!(axis.wavelength(0), 4747.5);
        assert_eq!(axis.wavelengths(4), vec![4747.5, 4748.75, 4750.0, 4751.25]);
    }

    #[test]
    fn max_flux_ignores_nan() {
        let sp = Spectrum {
            wavelength: vec![1.0, 2.0, 3.0],
            flux: vec![f64::NAN, 4.0, -1.0],
        };
        assert_eq!(sp.max_flux(), Some(4.0));

        let blank = Spectrum {
            wavelength: vec![1.0],
            flux: vec![f64::NAN],
        };
        assert_eq!(blank.max_flux(), None);
    }
}
