use std::path::Path;

use anyhow::{bail, Context, Result};
use log::info;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;
use plotters::style::FontTransform;

use super::annotate::{flux_tick, FluxRange, Marker};
use crate::data::export::ensure_parent;
use crate::data::model::Spectrum;

const SPECTRUM_COLOR: RGBColor = RGBColor(128, 0, 128);
const FLUX_AXIS_TITLE: &str = "Flux Density (10⁻¹⁷ erg s⁻¹ cm⁻² Å⁻¹)";
const WAVELENGTH_AXIS_TITLE: &str = "Wavelength (Å)";

// ---------------------------------------------------------------------------
// Output formats
// ---------------------------------------------------------------------------

/// Render the figure as SVG.
pub fn render_svg(
    path: &Path,
    spectrum: &Spectrum,
    markers: &[Marker],
    size: (u32, u32),
    title: Option<&str>,
) -> Result<()> {
    ensure_parent(path)?;
    let root = SVGBackend::new(path, size).into_drawing_area();
    draw(&root, spectrum, markers, title)?;
    root.present().with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

/// Render the figure into an RGB buffer and encode it as PNG.
pub fn render_png(
    path: &Path,
    spectrum: &Spectrum,
    markers: &[Marker],
    size: (u32, u32),
    title: Option<&str>,
) -> Result<()> {
    ensure_parent(path)?;
    let (width, height) = size;
    let mut buffer = vec![0u8; width as usize * height as usize * 3];
    {
        let root = BitMapBackend::with_buffer(&mut buffer, size).into_drawing_area();
        draw(&root, spectrum, markers, title)?;
        root.present()?;
    }

    let img = image::RgbImage::from_raw(width, height, buffer)
        .context("raster buffer does not match figure size")?;
    img.save(path).with_context(|| format!("writing {}", path.display()))?;
    info!("wrote {}", path.display());
    Ok(())
}

// ---------------------------------------------------------------------------
// Drawing
// ---------------------------------------------------------------------------

fn draw<DB>(
    root: &DrawingArea<DB, Shift>,
    spectrum: &Spectrum,
    markers: &[Marker],
    title: Option<&str>,
) -> Result<()>
where
    DB: DrawingBackend,
    DB::ErrorType: 'static,
{
    if spectrum.is_empty() {
        bail!("spectrum has no samples to plot");
    }
    let mut x_min = spectrum.wavelength[0];
    let mut x_max = spectrum.wavelength[spectrum.len() - 1];
    // A single sample has no extent; give the axis one ångström either side.
    if x_max <= x_min {
        x_min -= 1.0;
        x_max += 1.0;
    }
    let range = FluxRange::for_spectrum(spectrum);

    root.fill(&WHITE)?;

    let mut builder = ChartBuilder::on(root);
    builder.margin(20).x_label_area_size(50).y_label_area_size(70);
    if let Some(title) = title {
        builder.caption(title, ("sans-serif", 28).into_font());
    }
    let mut chart = builder.build_cartesian_2d(x_min..x_max, range.floor..range.top)?;

    chart
        .configure_mesh()
        .x_desc(WAVELENGTH_AXIS_TITLE)
        .y_desc(FLUX_AXIS_TITLE)
        .y_label_formatter(&|v| flux_tick(*v))
        .label_style(("sans-serif", 16).into_font())
        .axis_desc_style(("sans-serif", 18).into_font())
        .light_line_style(WHITE.mix(0.0))
        .draw()?;

    chart.draw_series(LineSeries::new(
        spectrum.points().filter(|(_, flux)| flux.is_finite()),
        SPECTRUM_COLOR.stroke_width(1),
    ))?;

    chart.draw_series(DashedLineSeries::new(
        vec![(x_min, 0.0), (x_max, 0.0)],
        8,
        4,
        BLACK.stroke_width(1),
    ))?;

    for marker in markers {
        chart.draw_series(DashedLineSeries::new(
            vec![(marker.wavelength, range.floor), (marker.wavelength, range.top)],
            6,
            4,
            marker.color.stroke_width(1),
        ))?;

        if let Some(label) = &marker.label {
            let style = ("sans-serif", 14)
                .into_font()
                .transform(FontTransform::Rotate270)
                .color(&marker.color);
            chart.draw_series(std::iter::once(Text::new(
                label.text.clone(),
                (label.x, range.label_y),
                style,
            )))?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_sample() -> Spectrum {
        Spectrum {
            wavelength: vec![4769.19],
            flux: vec![120.0],
        }
    }

    #[test]
    fn single_sample_renders_to_both_formats() {
        let dir = tempfile::tempdir().unwrap();
        let svg = dir.path().join("one.svg");
        let png = dir.path().join("one.png");
        let spectrum = single_sample();

        render_svg(&svg, &spectrum, &[], (240, 160), None).unwrap();
        render_png(&png, &spectrum, &[], (240, 160), Some("one sample")).unwrap();

        assert!(svg.exists());
        let img = image::open(&png).unwrap().to_rgb8();
        assert_eq!(img.dimensions(), (240, 160));
    }

    #[test]
    fn empty_spectrum_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let empty = Spectrum {
            wavelength: vec![],
            flux: vec![],
        };
        let path = dir.path().join("empty.svg");
        assert!(render_svg(&path, &empty, &[], (240, 160), None).is_err());
    }
}
