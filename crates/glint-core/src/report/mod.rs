pub mod model;
pub mod normalize;
pub mod render;

pub use model::{Issue, Position, Replacement, Report, SEVERITY_ERROR};
pub use normalize::{normalize, parse_report};
