/// Data layer: core types, cube I/O, aperture extraction and line mapping.
///
/// Architecture:
/// ```text
///  cube.fits (HDU n)                 line catalogue + z
///        │                                  │
///        ▼                                  ▼
///   ┌──────────┐                      ┌──────────┐
///   │  loader   │  FITS → DataCube    │  lines    │  rest → observed
///   └──────────┘                      └──────────┘
///        │                                  │
///        ▼                                  ▼
///   ┌──────────┐                      ┌──────────┐
///   │ aperture  │  crop + circle sum  │  export   │  text table / CSV
///   └──────────┘                      └──────────┘
///        │
///        ▼
///     Spectrum  (wavelength, flux)
/// ```

pub mod aperture;
pub mod export;
pub mod lines;
pub mod loader;
pub mod model;
