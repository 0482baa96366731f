/// Rendering: line markers and the spectrum figure.
///
/// `annotate` turns line records into reference lines and text labels;
/// `figure` draws them over the spectrum to SVG and PNG.
pub mod annotate;
pub mod figure;
