//! Running execution requests.

pub mod artifact;
pub mod docker;
pub mod memo;
pub mod provider;

pub use artifact::Artifact;
pub use docker::DockerProvider;
pub use memo::Memoized;
pub use provider::ExecutionProvider;
