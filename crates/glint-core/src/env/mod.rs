//! Execution environment construction.
//!
//! Everything here is pure: a run descriptor goes in, a deterministic
//! execution request comes out. Nothing is executed.

pub mod build;
pub mod image;
pub mod request;

pub use build::{Environment, build_request, lint_command};
pub use image::ImageRef;
pub use request::{ExecRequest, FileSource, Mount, StagedFile};
