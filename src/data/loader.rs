use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{bail, Context, Result};
use fitrs::{Fits, FitsData, Hdu, HeaderValue};
use log::{debug, info, warn};
use ndarray::Array3;

use super::model::{CardValue, DataCube, SampleFormat, WavelengthAxis};

/// Numeric world-coordinate cards copied from the source header.
const FLOAT_CARDS: [&str; 12] = [
    "CRPIX1", "CRPIX2", "CRVAL1", "CRVAL2", "CDELT1", "CDELT2", "CD1_1", "CD1_2", "CD2_1",
    "CD2_2", "EQUINOX", "MJD-OBS",
];

/// Text cards copied from the source header.
const TEXT_CARDS: [&str; 8] = [
    "CTYPE1", "CTYPE2", "CTYPE3", "CUNIT1", "CUNIT2", "BUNIT", "RADESYS", "OBJECT",
];

// ---------------------------------------------------------------------------
// Reading
// ---------------------------------------------------------------------------

/// Load a three-axis image HDU as a [`DataCube`].
///
/// `hdu_index` counts from the primary HDU (0). MUSE products keep the flux
/// in extension 1.
pub fn read_cube(path: &Path, hdu_index: usize) -> Result<DataCube> {
    let fits = Fits::open(path).with_context(|| format!("opening {}", path.display()))?;
    let hdu = fits
        .get(hdu_index)
        .with_context(|| format!("{} has no HDU {hdu_index}", path.display()))?;

    let naxis = header_f64(&hdu, "NAXIS").context("header has no NAXIS card")?;
    if naxis as usize != 3 {
        bail!("expected a 3-axis cube, HDU {hdu_index} has NAXIS = {naxis}");
    }
    let nx = axis_len(&hdu, 1)?;
    let ny = axis_len(&hdu, 2)?;
    let nz = axis_len(&hdu, 3)?;

    let (samples, format): (Vec<f64>, SampleFormat) = match hdu.read_data() {
        FitsData::FloatingPoint32(arr) => (
            arr.data.into_iter().map(|v| v as f64).collect(),
            SampleFormat::Single,
        ),
        FitsData::FloatingPoint64(arr) => (arr.data, SampleFormat::Double),
        FitsData::IntegersI32(arr) => {
            let bscale = header_f64(&hdu, "BSCALE").unwrap_or(1.0);
            let bzero = header_f64(&hdu, "BZERO").unwrap_or(0.0);
            (
                arr.data
                    .into_iter()
                    .map(|v| v.map_or(f64::NAN, |i| i as f64 * bscale + bzero))
                    .collect(),
                SampleFormat::Integer,
            )
        }
        _ => bail!("HDU {hdu_index} does not hold float or signed-integer image data"),
    };

    // FITS stores NAXIS1 (x) fastest, so the flat buffer is already
    // row-major in (wavelength, y, x).
    let flux = Array3::from_shape_vec((nz, ny, nx), samples)
        .with_context(|| format!("data size does not match {nx}x{ny}x{nz}"))?;

    let axis = spectral_axis(&hdu);
    let cards = passthrough_cards(&hdu);

    info!(
        "read {} HDU {hdu_index}: {nz} slices of {ny}x{nx} px, {:.2}-{:.2} Å",
        path.display(),
        axis.wavelength(0),
        axis.wavelength(nz.saturating_sub(1))
    );
    Ok(DataCube {
        flux,
        axis,
        format,
        cards,
    })
}

fn axis_len(hdu: &Hdu, n: usize) -> Result<usize> {
    let key = format!("NAXIS{n}");
    let len = header_f64(hdu, &key).with_context(|| format!("header has no {key} card"))?;
    if len < 1.0 {
        bail!("{key} = {len}, cube is empty");
    }
    Ok(len as usize)
}

fn header_f64(hdu: &Hdu, key: &str) -> Option<f64> {
    match hdu.value(key)? {
        HeaderValue::RealFloatingNumber(v) => Some(*v),
        HeaderValue::IntegerNumber(v) => Some(*v as f64),
        _ => None,
    }
}

fn header_str(hdu: &Hdu, key: &str) -> Option<String> {
    match hdu.value(key)? {
        HeaderValue::CharacterString(s) => Some(s.trim().to_string()),
        _ => None,
    }
}

/// Spectral axis from `CRVAL3` / `CDELT3` (or `CD3_3`) / `CRPIX3`, in Å.
fn spectral_axis(hdu: &Hdu) -> WavelengthAxis {
    let cdelt = header_f64(hdu, "CDELT3").or_else(|| header_f64(hdu, "CD3_3"));
    let (Some(crval), Some(cdelt)) = (header_f64(hdu, "CRVAL3"), cdelt) else {
        warn!("no spectral WCS on axis 3, using slice numbers as wavelengths");
        return WavelengthAxis::default();
    };
    let crpix = header_f64(hdu, "CRPIX3").unwrap_or(1.0);
    let scale = angstrom_per_unit(header_str(hdu, "CUNIT3").as_deref());

    WavelengthAxis {
        crval: crval * scale,
        cdelt: cdelt * scale,
        crpix,
    }
}

fn angstrom_per_unit(unit: Option<&str>) -> f64 {
    match unit.map(str::to_ascii_lowercase).as_deref() {
        Some("m") => 1e10,
        Some("um") => 1e4,
        Some("nm") => 10.0,
        Some("angstrom") | Some("aa") | None => 1.0,
        Some(other) => {
            warn!("unknown CUNIT3 '{other}', assuming Angstrom");
            1.0
        }
    }
}

fn passthrough_cards(hdu: &Hdu) -> BTreeMap<String, CardValue> {
    let mut cards = BTreeMap::new();
    for key in FLOAT_CARDS {
        if let Some(v) = header_f64(hdu, key) {
            cards.insert(key.to_string(), CardValue::Float(v));
        }
    }
    for key in TEXT_CARDS {
        if let Some(s) = header_str(hdu, key) {
            cards.insert(key.to_string(), CardValue::Text(s));
        }
    }
    debug!("carrying {} header cards", cards.len());
    cards
}

// ---------------------------------------------------------------------------
// Writing
// ---------------------------------------------------------------------------

/// Write `cube` as the primary HDU of a new FITS file, replacing any existing
/// file. Samples keep the precision they were read with.
pub fn write_cube(path: &Path, cube: &DataCube) -> Result<()> {
    super::export::ensure_parent(path)?;

    let (nz, ny, nx) = cube.dim();
    let shape = [nx, ny, nz];
    let mut hdu = match cube.format {
        SampleFormat::Double => Hdu::new(&shape, cube.flux.iter().copied().collect::<Vec<f64>>()),
        SampleFormat::Single | SampleFormat::Integer => Hdu::new(
            &shape,
            cube.flux.iter().map(|&v| v as f32).collect::<Vec<f32>>(),
        ),
    };

    for (key, value) in &cube.cards {
        match value {
            CardValue::Float(v) => {
                hdu.insert(key.as_str(), *v);
            }
            CardValue::Text(s) => {
                hdu.insert(key.as_str(), s.as_str());
            }
        }
    }
    hdu.insert("CRVAL3", cube.axis.crval);
    hdu.insert("CDELT3", cube.axis.cdelt);
    hdu.insert("CRPIX3", cube.axis.crpix);
    hdu.insert("CUNIT3", "Angstrom");

    Fits::create(path, hdu).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {nz}x{ny}x{nx} cube to {}", path.display());
    Ok(())
}
