// Chart module - animated bar chart over a sample set
//
// `ChartView` holds state and computes frames; adapters (`ChartController`,
// `SvgRenderer`) own the side effects.

mod controller;
mod frame;
mod render;
mod scale;
mod view;

pub use controller::ChartController;
pub use frame::{Bar, BarAnimation, ChartFrame, Rect, Tooltip};
pub use render::{Renderer, SvgRenderer};
pub use scale::{BandScale, LinearScale};
pub use view::{ChartStatus, ChartView, FetchTicket, FETCH_FAILED_MESSAGE};
