use std::collections::BTreeSet;

use plotters::style::{RGBColor, BLACK, RED};

use crate::data::model::{LineRecord, Spectrum};

/// Lowest flux shown; markers start here.
const FLUX_FLOOR: f64 = -250.0;
/// Space above the spectrum peak reserved for labels.
const FLUX_HEADROOM: f64 = 5.0e3;
/// Label baseline above the spectrum peak.
const LABEL_OFFSET: f64 = 1.0e3;

// ---------------------------------------------------------------------------
// Label lookup
// ---------------------------------------------------------------------------

struct LabelSpec {
    identifier: &'static str,
    text: &'static str,
    /// Hand-placed x position in Å, tuned for the 0943-242 spectrum.
    x: f64,
    color: RGBColor,
}

static LABELS: [LabelSpec; 10] = [
    LabelSpec { identifier: "Lya", text: "Lyα", x: 4720.2, color: RED },
    LabelSpec { identifier: "NV", text: "NV doublet", x: 4816.8, color: BLACK },
    LabelSpec { identifier: "CII", text: "CII", x: 5209.0, color: BLACK },
    LabelSpec { identifier: "SiIV", text: "SiIV", x: 5458.2, color: BLACK },
    LabelSpec { identifier: "NIV]", text: "NIV]", x: 5784.5, color: BLACK },
    LabelSpec { identifier: "CIV", text: "CIV doublet", x: 6028.6, color: BLACK },
    LabelSpec { identifier: "HeII", text: "HeII", x: 6382.3, color: BLACK },
    LabelSpec { identifier: "OIII]", text: "OIII] doublet", x: 6468.3, color: BLACK },
    LabelSpec { identifier: "CIII]", text: "CIII] doublet", x: 7436.8, color: BLACK },
    LabelSpec { identifier: "CII]", text: "CII]", x: 9074.9, color: BLACK },
];

fn label_spec(identifier: &str) -> Option<&'static LabelSpec> {
    LABELS.iter().find(|spec| spec.identifier == identifier)
}

// ---------------------------------------------------------------------------
// Markers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub x: f64,
}

/// A vertical reference line at an observed wavelength, optionally labeled.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub wavelength: f64,
    pub color: RGBColor,
    pub label: Option<Label>,
}

/// One marker per record. Each identifier is labeled once, at its first
/// record, so doublets carry a single label.
pub fn markers(records: &[LineRecord]) -> Vec<Marker> {
    let mut labeled: BTreeSet<&str> = BTreeSet::new();
    records
        .iter()
        .map(|rec| {
            let spec = label_spec(&rec.identifier);
            let label = labeled.insert(rec.identifier.as_str()).then(|| match spec {
                Some(spec) => Label {
                    text: spec.text.to_string(),
                    x: spec.x,
                },
                None => Label {
                    text: rec.identifier.clone(),
                    x: rec.observed_wavelength,
                },
            });
            Marker {
                wavelength: rec.observed_wavelength,
                color: spec.map_or(BLACK, |s| s.color),
                label,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Flux axis
// ---------------------------------------------------------------------------

/// Vertical extent of the figure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FluxRange {
    pub floor: f64,
    pub top: f64,
    pub label_y: f64,
}

impl FluxRange {
    pub fn for_spectrum(spectrum: &Spectrum) -> Self {
        let peak = spectrum.max_flux().unwrap_or(0.0);
        Self {
            floor: FLUX_FLOOR,
            top: peak + FLUX_HEADROOM,
            label_y: peak + LABEL_OFFSET,
        }
    }
}

/// Flux tick text: value in units of 10³, truncated to an integer.
pub fn flux_tick(value: f64) -> String {
    format!("{}", (value * 1e-3).trunc() as i64)
}
