pub mod deterministic;
pub mod paths;
