use std::ops::Range;

use log::{debug, warn};
use ndarray::{s, Axis};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::model::{CardValue, DataCube, Spectrum};

#[derive(Debug, Error, PartialEq)]
pub enum ExtractError {
    #[error("crop window y {y:?}, x {x:?} lies outside the {ny}x{nx} spatial extent")]
    Shape {
        y: Range<usize>,
        x: Range<usize>,
        ny: usize,
        nx: usize,
    },
    #[error("aperture at (y {center_y}, x {center_x}) with radius {radius} contains no pixels")]
    EmptyAperture {
        center_y: f64,
        center_x: f64,
        radius: f64,
    },
}

// ---------------------------------------------------------------------------
// Crop window
// ---------------------------------------------------------------------------

/// Half-open pixel ranges selecting a rectangular spatial region.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CropWindow {
    pub y: Range<usize>,
    pub x: Range<usize>,
}

/// Cut the spatial window out of `cube`, keeping every wavelength slice.
///
/// The spatial reference pixels are shifted so world coordinates of the
/// remaining pixels are unchanged.
pub fn crop(cube: &DataCube, window: &CropWindow) -> Result<DataCube, ExtractError> {
    let (_, ny, nx) = cube.dim();
    let fits = |r: &Range<usize>, n: usize| r.start < r.end && r.end <= n;
    if !fits(&window.y, ny) || !fits(&window.x, nx) {
        return Err(ExtractError::Shape {
            y: window.y.clone(),
            x: window.x.clone(),
            ny,
            nx,
        });
    }

    let flux = cube
        .flux
        .slice(s![.., window.y.clone(), window.x.clone()])
        .to_owned();

    let mut cards = cube.cards.clone();
    for (key, offset) in [("CRPIX1", window.x.start), ("CRPIX2", window.y.start)] {
        if let Some(CardValue::Float(v)) = cards.get_mut(key) {
            *v -= offset as f64;
        }
    }

    debug!("cropped cube {:?} -> {:?}", cube.dim(), flux.dim());
    Ok(DataCube {
        flux,
        axis: cube.axis,
        format: cube.format,
        cards,
    })
}

// ---------------------------------------------------------------------------
// Circular aperture
// ---------------------------------------------------------------------------

/// A circle in pixel space. Pixel `(y, x)` belongs to it when its distance
/// from the centre is at most `radius`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CircularAperture {
    pub center_y: f64,
    pub center_x: f64,
    pub radius: f64,
}

impl CircularAperture {
    pub fn contains(&self, y: usize, x: usize) -> bool {
        let dy = y as f64 - self.center_y;
        let dx = x as f64 - self.center_x;
        dy * dy + dx * dx <= self.radius * self.radius
    }

    /// Pixels of an `ny`×`nx` grid inside the circle, row-major. Parts of the
    /// circle beyond the grid are dropped.
    pub fn pixels(&self, ny: usize, nx: usize) -> Vec<(usize, usize)> {
        if self.radius.is_nan() || self.radius < 0.0 {
            return Vec::new();
        }
        let lo = |c: f64| (c - self.radius).ceil().max(0.0) as usize;
        let hi = |c: f64, n: usize| {
            ((c + self.radius).floor() + 1.0).clamp(0.0, n as f64) as usize
        };

        let mut out = Vec::new();
        for y in lo(self.center_y)..hi(self.center_y, ny) {
            for x in lo(self.center_x)..hi(self.center_x, nx) {
                if self.contains(y, x) {
                    out.push((y, x));
                }
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

/// Sum the flux inside `aperture` for every wavelength slice.
///
/// Blank (non-finite) samples are skipped; a slice without any finite sample
/// inside the aperture yields `NaN`. The result is ordered by increasing
/// wavelength.
pub fn extract_spectrum(
    cube: &DataCube,
    aperture: &CircularAperture,
) -> Result<Spectrum, ExtractError> {
    let (_, ny, nx) = cube.dim();
    let pixels = aperture.pixels(ny, nx);
    if pixels.is_empty() {
        return Err(ExtractError::EmptyAperture {
            center_y: aperture.center_y,
            center_x: aperture.center_x,
            radius: aperture.radius,
        });
    }
    debug!("aperture covers {} pixels", pixels.len());

    let mut skipped = 0usize;
    let mut flux: Vec<f64> = cube
        .flux
        .axis_iter(Axis(0))
        .map(|slice| {
            let mut sum = 0.0;
            let mut finite = 0usize;
            for &(y, x) in &pixels {
                let v = slice[[y, x]];
                if v.is_finite() {
                    sum += v;
                    finite += 1;
                } else {
                    skipped += 1;
                }
            }
            if finite == 0 {
                f64::NAN
            } else {
                sum
            }
        })
        .collect();

    if skipped > 0 {
        warn!("skipped {skipped} non-finite samples inside the aperture");
    }

    let mut wavelength = cube.wavelengths();
    if cube.axis.cdelt < 0.0 {
        wavelength.reverse();
        flux.reverse();
    }

    Ok(Spectrum { wavelength, flux })
}

#[cfg(test)]
mod tests {
    use ndarray::Array3;

    use super::*;
    use crate::data::model::WavelengthAxis;

    fn ramp_cube(nz: usize, ny: usize, nx: usize) -> DataCube {
        let flux = Array3::from_shape_fn((nz, ny, nx), |(k, y, x)| {
            (k * 1000 + y * 37 + x * 11 % 7) as f64 + 0.25
        });
        DataCube::new(
            flux,
            WavelengthAxis {
                crval: 4750.0,
                cdelt: 1.25,
                crpix: 1.0,
            },
        )
    }

    fn full_sum(cube: &DataCube) -> Vec<f64> {
        cube.flux
            .axis_iter(Axis(0))
            .map(|slice| slice.iter().sum())
            .collect()
    }

    #[test]
    fn crop_keeps_spectral_axis_and_selects_window() {
        let cube = ramp_cube(3, 10, 12);
        let window = CropWindow { y: 2..6, x: 5..12 };
        let cut = crop(&cube, &window).unwrap();

        assert_eq!(cut.dim(), (3, 4, 7));
        assert_eq!(cut.flux[[1, 0, 0]], cube.flux[[1, 2, 5]]);
        assert_eq!(cut.flux[[2, 3, 6]], cube.flux[[2, 5, 11]]);
        assert_eq!(cut.wavelengths(), cube.wavelengths());
    }

    #[test]
    fn crop_shifts_reference_pixels() {
        let mut cube = ramp_cube(1, 10, 10);
        cube.cards.insert("CRPIX1".into(), CardValue::Float(50.0));
        cube.cards.insert("CRPIX2".into(), CardValue::Float(40.0));
        cube.cards.insert("BUNIT".into(), CardValue::Text("adu".into()));

        let cut = crop(&cube, &CropWindow { y: 3..8, x: 4..9 }).unwrap();
        assert_eq!(cut.card_f64("CRPIX1"), Some(46.0));
        assert_eq!(cut.card_f64("CRPIX2"), Some(37.0));
        assert_eq!(cut.cards.get("BUNIT"), cube.cards.get("BUNIT"));
    }

    #[test]
    fn crop_outside_extent_is_rejected() {
        let cube = ramp_cube(2, 10, 10);
        let err = crop(&cube, &CropWindow { y: 5..11, x: 0..4 }).unwrap_err();
        assert_eq!(
            err,
            ExtractError::Shape {
                y: 5..11,
                x: 0..4,
                ny: 10,
                nx: 10
            }
        );
        assert!(crop(&cube, &CropWindow { y: 4..4, x: 0..4 }).is_err());
    }

    #[test]
    fn zero_radius_is_single_pixel() {
        let cube = ramp_cube(5, 8, 8);
        let ap = CircularAperture {
            center_y: 3.0,
            center_x: 6.0,
            radius: 0.0,
        };
        assert_eq!(ap.pixels(8, 8), vec![(3, 6)]);

        let sp = extract_spectrum(&cube, &ap).unwrap();
        let expected: Vec<f64> = (0..5).map(|k| cube.flux[[k, 3, 6]]).collect();
        assert_eq!(sp.flux, expected);
    }

    #[test]
    fn radius_covering_window_equals_full_sum() {
        let cube = crop(&ramp_cube(4, 30, 30), &CropWindow { y: 5..15, x: 10..18 }).unwrap();
        let ap = CircularAperture {
            center_y: 4.5,
            center_x: 3.5,
            radius: 100.0,
        };
        assert_eq!(ap.pixels(10, 8).len(), 80);

        let sp = extract_spectrum(&cube, &ap).unwrap();
        assert_eq!(sp.flux, full_sum(&cube));
    }

    #[test]
    fn summation_is_translation_invariant() {
        let cube = ramp_cube(6, 40, 40);
        let ap = CircularAperture {
            center_y: 20.0,
            center_x: 17.0,
            radius: 4.5,
        };
        let direct = extract_spectrum(&cube, &ap).unwrap();

        let (dy, dx) = (12, 9);
        let shifted_cube = crop(&cube, &CropWindow { y: dy..35, x: dx..30 }).unwrap();
        let shifted_ap = CircularAperture {
            center_y: ap.center_y - dy as f64,
            center_x: ap.center_x - dx as f64,
            radius: ap.radius,
        };
        let shifted = extract_spectrum(&shifted_cube, &shifted_ap).unwrap();

        assert_eq!(direct, shifted);
    }

    #[test]
    fn sum_is_not_normalised_by_area() {
        let flux = Array3::from_elem((2, 5, 5), 2.0);
        let cube = DataCube::new(flux, WavelengthAxis::default());
        let ap = CircularAperture {
            center_y: 2.0,
            center_x: 2.0,
            radius: 1.0,
        };
        // centre plus the four direct neighbours
        let sp = extract_spectrum(&cube, &ap).unwrap();
        assert_eq!(sp.flux, vec![10.0, 10.0]);
    }

    #[test]
    fn aperture_partially_outside_is_clamped() {
        let flux = Array3::from_elem((1, 4, 4), 1.0);
        let cube = DataCube::new(flux, WavelengthAxis::default());
        let ap = CircularAperture {
            center_y: 0.0,
            center_x: 0.0,
            radius: 1.0,
        };
        assert_eq!(ap.pixels(4, 4), vec![(0, 0), (0, 1), (1, 0)]);
        assert_eq!(extract_spectrum(&cube, &ap).unwrap().flux, vec![3.0]);
    }

    #[test]
    fn aperture_without_pixels_is_rejected() {
        let cube = ramp_cube(2, 5, 5);
        let ap = CircularAperture {
            center_y: -10.0,
            center_x: 2.0,
            radius: 3.0,
        };
        assert!(matches!(
            extract_spectrum(&cube, &ap),
            Err(ExtractError::EmptyAperture { .. })
        ));

        let negative = CircularAperture {
            center_y: 2.0,
            center_x: 2.0,
            radius: -1.0,
        };
        assert!(extract_spectrum(&cube, &negative).is_err());
    }

    #[test]
    fn blank_samples_are_skipped() {
        let mut flux = Array3::from_elem((2, 3, 3), 1.0);
        flux[[0, 1, 1]] = f64::NAN;
        for v in flux.slice_mut(s![1, .., ..]) {
            *v = f64::NAN;
        }
        let cube = DataCube::new(flux, WavelengthAxis::default());
        let ap = CircularAperture {
            center_y: 1.0,
            center_x: 1.0,
            radius: 5.0,
        };
        let sp = extract_spectrum(&cube, &ap).unwrap();
        assert_eq!(sp.flux[0], 8.0);
        assert!(sp.flux[1].is_nan());
    }

    #[test]
    fn descending_axis_is_returned_increasing() {
        let flux = Array3::from_shape_fn((3, 1, 1), |(k, _, _)| k as f64);
        let cube = DataCube::new(
            flux,
            WavelengthAxis {
                crval: 5000.0,
                cdelt: -2.0,
                crpix: 1.0,
            },
        );
        let ap = CircularAperture {
            center_y: 0.0,
            center_x: 0.0,
            radius: 0.0,
        };
        let sp = extract_spectrum(&cube, &ap).unwrap();
        assert_eq!(sp.wavelength, vec![4996.0, 4998.0, 5000.0]);
        assert_eq!(sp.flux, vec![2.0, 1.0, 0.0]);
    }
}
