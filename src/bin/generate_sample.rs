//! Writes a small synthetic emission-line cube plus a matching run config,
//! so the pipeline can be tried without the MUSE data:
//!
//! ```text
//! cargo run --bin generate_sample
//! cargo run -- sample_config.json
//! ```

use anyhow::{Context, Result};
use fitrs::{Fits, Hdu};
use serde_json::json;

const REDSHIFT: f64 = 2.923;
const NY: usize = 60;
const NX: usize = 60;
const CRVAL3: f64 = 4750.0;
const CD3_3: f64 = 1.25;
const NZ: usize = 3681;

/// (rest wavelength Å, peak surface brightness)
const LINES: [(f64, f64); 14] = [
    (1215.7, 400.0),
    (1238.8, 12.0),
    (1242.8, 8.0),
    (1338.0, 3.0),
    (1402.8, 5.0),
    (1486.5, 4.0),
    (1548.2, 40.0),
    (1550.8, 25.0),
    (1640.4, 45.0),
    (1660.8, 4.0),
    (1666.1, 6.0),
    (1906.7, 20.0),
    (1908.7, 14.0),
    (2326.0, 10.0),
];

fn gaussian(x: f64, mu: f64, sigma: f64, amplitude: f64) -> f64 {
    amplitude * (-(x - mu).powi(2) / (2.0 * sigma.powi(2))).exp()
}

/// Spectrum of the nucleus: weak continuum plus redshifted lines.
fn nuclear_spectrum(wavelengths: &[f64]) -> Vec<f64> {
    wavelengths
        .iter()
        .map(|&wav| {
            let lines: f64 = LINES
                .iter()
                .map(|&(rest, amp)| gaussian(wav, rest * (1.0 + REDSHIFT), 4.0, amp))
                .sum();
            1.5 + lines
        })
        .collect()
}

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    /// Box-Muller transform for normal distribution
    fn gauss(&mut self, mean: f64, std_dev: f64) -> f64 {
        let u1 = self.next_f64().max(1e-15);
        let u2 = self.next_f64();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * std::f64::consts::PI * u2).cos();
        mean + std_dev * z
    }
}

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);

    let wavelengths: Vec<f64> = (0..NZ).map(|k| CRVAL3 + k as f64 * CD3_3).collect();
    let nucleus = nuclear_spectrum(&wavelengths);

    // Gaussian surface-brightness profile centred on the galaxy.
    let (cy, cx, sigma) = (30.0, 30.0, 4.0);
    let profile: Vec<f64> = (0..NY)
        .flat_map(|y| (0..NX).map(move |x| (y, x)))
        .map(|(y, x)| {
            let r2 = (y as f64 - cy).powi(2) + (x as f64 - cx).powi(2);
            (-r2 / (2.0 * sigma * sigma)).exp()
        })
        .collect();

    // FITS order: x fastest, wavelength slowest.
    let mut data: Vec<f32> = Vec::with_capacity(NZ * NY * NX);
    for &spec in &nucleus {
        for &weight in &profile {
            data.push((spec * weight + rng.gauss(0.0, 0.3)) as f32);
        }
    }

    let mut hdu = Hdu::new(&[NX, NY, NZ], data);
    hdu.insert("CTYPE3", "AWAV");
    hdu.insert("CUNIT3", "Angstrom");
    hdu.insert("CRVAL3", CRVAL3);
    hdu.insert("CD3_3", CD3_3);
    hdu.insert("CRPIX3", 1.0);
    hdu.insert("CRPIX1", 31.0);
    hdu.insert("CRPIX2", 31.0);
    hdu.insert("BUNIT", "10**(-20)*erg/s/cm**2/Angstrom");
    hdu.insert("OBJECT", "synthetic 0943-242");

    let cube_path = "sample_cube.fits";
    Fits::create(cube_path, hdu).context("writing sample cube")?;

    let config = json!({
        "input_cube": cube_path,
        "input_hdu": 0,
        "crop": { "y": { "start": 5, "end": 55 }, "x": { "start": 5, "end": 55 } },
        "aperture": { "center_y": 25.0, "center_x": 25.0, "radius": 12.0 },
        "output": {
            "line_table": "out/sample_lines.txt",
            "cropped_cube": "out/sample_crop.fits",
            "spectrum_csv": "out/sample_spectrum.csv",
            "figure_svg": "out/sample_spectrum.svg",
            "figure_png": "out/sample_spectrum.png"
        },
        "figure": { "title": "Synthetic Galaxy Spectrum" }
    });
    let config_path = "sample_config.json";
    std::fs::write(config_path, serde_json::to_string_pretty(&config)?)
        .context("writing sample config")?;

    println!(
        "Wrote {NZ}x{NY}x{NX} cube ({:.0}-{:.0} Å) to {cube_path} and run config to {config_path}",
        wavelengths[0],
        wavelengths[NZ - 1]
    );
    Ok(())
}
