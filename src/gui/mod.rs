//! GUI module - User interface components

mod app;
mod chart_viewer;
mod control_panel;

pub use app::{view_state, DashboardApp, ViewState};
pub use chart_viewer::{format_kpis, ChartViewer, DashboardTab, ViewerAction};
pub use control_panel::{ControlPanel, ControlPanelAction};
