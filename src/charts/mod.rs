//! Charts module - Chart rendering

mod plotter;
mod renderer;

pub use plotter::{ChartPlotter, CONVERSION_COLOR, TEST_DRIVE_COLOR, WALK_IN_COLOR};
pub use renderer::{RenderError, StaticChartRenderer};
