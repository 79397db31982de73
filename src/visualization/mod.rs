//! Visualization module
//!
//! SVG rendering of the fitted tree and its feature importances.

pub mod bar_chart;
pub mod svg;
pub mod tree_plot;

pub use bar_chart::BarChart;
pub use svg::{SvgDocument, SvgElement, TextAnchor};
pub use tree_plot::TreePlot;
