use std::fmt::Write as _;

use thiserror::Error;

use super::model::{LineRecord, SpectralLine};

/// Header written above the line table. The observed wavelengths assume each
/// line centre sits at the systemic velocity.
const TABLE_HEADER: [&str; 4] = [
    "Assuming Unshifted Line Centre from Vsys",
    "wav_em: rest-frame wavelength",
    "wav_o: redshifted wavelength",
    "",
];

#[derive(Debug, Error, PartialEq)]
pub enum LineError {
    #[error("redshift {0} is invalid: 1 + z must be positive and finite")]
    InvalidRedshift(f64),
    #[error("line '{identifier}' has invalid rest wavelength {wavelength}")]
    InvalidWavelength { identifier: String, wavelength: f64 },
}

// ---------------------------------------------------------------------------
// Catalogue
// ---------------------------------------------------------------------------

/// UV emission lines seen in high-redshift radio galaxy hosts, in table order.
pub fn default_catalogue() -> Vec<SpectralLine> {
    [
        ("Lya", 1215.7),
        ("NV", 1238.8),
        ("NV", 1242.8),
        ("CII", 1338.0),
        ("SiIV", 1402.8),
        ("NIV]", 1486.5),
        ("CIV", 1548.2),
        ("CIV", 1550.8),
        ("HeII", 1640.4),
        ("OIII]", 1660.8),
        ("OIII]", 1666.1),
        ("CIII]", 1906.7),
        ("CIII]", 1908.7),
        ("CII]", 2326.0),
    ]
    .into_iter()
    .map(|(id, wav)| SpectralLine::new(id, wav))
    .collect()
}

// ---------------------------------------------------------------------------
// Redshift mapping
// ---------------------------------------------------------------------------

/// Observed wavelength of a line emitted at `rest` from redshift `z`.
pub fn observed_wavelength(rest: f64, z: f64) -> f64 {
    rest * (1.0 + z)
}

/// Map every catalogue line to its observed wavelength, keeping input order.
pub fn map_lines(z: f64, lines: &[SpectralLine]) -> Result<Vec<LineRecord>, LineError> {
    if !z.is_finite() || z <= -1.0 {
        return Err(LineError::InvalidRedshift(z));
    }

    lines
        .iter()
        .map(|line| {
            let rest = line.rest_wavelength;
            if !rest.is_finite() || rest <= 0.0 {
                return Err(LineError::InvalidWavelength {
                    identifier: line.identifier.clone(),
                    wavelength: rest,
                });
            }
            Ok(LineRecord {
                identifier: line.identifier.clone(),
                rest_wavelength: rest,
                observed_wavelength: observed_wavelength(rest, z),
            })
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Table formatting
// ---------------------------------------------------------------------------

/// Render the fixed-width line table, header lines prefixed with `#`.
pub fn format_table(records: &[LineRecord]) -> String {
    let mut out = String::new();
    for line in TABLE_HEADER {
        if line.is_empty() {
            out.push_str("#\n");
        } else {
            let _ = writeln!(out, "# {line}");
        }
    }
    let _ = writeln!(out, "# {:<10} {:<7} {}", "line", "wav_em", "wav_o");

    for rec in records {
        let _ = writeln!(
            out,
            "{:<10} {:.2} {:.2}",
            rec.identifier, rec.rest_wavelength, rec.observed_wavelength
        );
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const Z: f64 = 2.923;

    #[test]
    fn observed_follows_one_plus_z() {
        for line in default_catalogue() {
            let obs = observed_wavelength(line.rest_wavelength, Z);
            assert!((obs - line.rest_wavelength * (1.0 + Z)).abs() < 1e-9);
        }
    }

    #[test]
    fn lyman_alpha_lands_near_4769() {
        let obs = observed_wavelength(1215.7, Z);
        assert!((obs - 4769.1911).abs() < 1e-6, "got {obs}");
    }

    #[test]
    fn mapping_keeps_catalogue_order() {
        let catalogue = default_catalogue();
        let records = map_lines(Z, &catalogue).unwrap();
        assert_eq!(records.len(), 14);
        for (line, rec) in catalogue.iter().zip(&records) {
            assert_eq!(line.identifier, rec.identifier);
            assert_eq!(line.rest_wavelength, rec.rest_wavelength);
        }
        assert_eq!(records[0].identifier, "Lya");
        assert_eq!(records[13].identifier, "CII]");
    }

    #[test]
    fn recomputation_is_bit_identical() {
        let a = map_lines(Z, &default_catalogue()).unwrap();
        let b = map_lines(Z, &default_catalogue()).unwrap();
        for (x, y) in a.iter().zip(&b) {
            assert_eq!(
                x.observed_wavelength.to_bits(),
                y.observed_wavelength.to_bits()
            );
        }
        assert_eq!(format_table(&a), format_table(&b));
    }

    #[test]
    fn rejects_unphysical_redshift() {
        let lines = default_catalogue();
        assert_eq!(
            map_lines(-1.0, &lines),
            Err(LineError::InvalidRedshift(-1.0))
        );
        assert!(map_lines(f64::NAN, &lines).is_err());
        // Blueshift is fine as long as 1 + z stays positive.
        assert!(map_lines(-0.5, &lines).is_ok());
    }

    #[test]
    fn rejects_non_positive_wavelength() {
        let lines = vec![SpectralLine::new("Lya", 1215.7), SpectralLine::new("bad", 0.0)];
        let err = map_lines(Z, &lines).unwrap_err();
        assert_eq!(
            err,
            LineError::InvalidWavelength {
                identifier: "bad".into(),
                wavelength: 0.0
            }
        );
    }

    #[test]
    fn table_layout() {
        let records = map_lines(Z, &default_catalogue()).unwrap();
        let table = format_table(&records);
        let lines: Vec<&str> = table.lines().collect();

        assert_eq!(lines[0], "# Assuming Unshifted Line Centre from Vsys");
        assert_eq!(lines[3], "#");
        assert_eq!(lines[4], "# line       wav_em  wav_o");
        assert_eq!(lines.len(), 5 + 14);
        assert_eq!(lines[5], "Lya        1215.70 4769.19");
        assert_eq!(lines[18], "CII]       2326.00 9124.90");
        assert!(table.ends_with('\n'));
    }
}
