use std::future::Future;

use crate::env::request::ExecRequest;
use crate::error::ExecError;
use crate::exec::artifact::Artifact;

/// A sandboxed process runner.
///
/// Implementations run `request` to completion and return the file its
/// stdout was redirected to. Any failure to produce that file, including a
/// nonzero exit status, is an [`ExecError`]; implementations never retry.
pub trait ExecutionProvider: Send + Sync {
    fn run(&self, request: &ExecRequest)
    -> impl Future<Output = Result<Artifact, ExecError>> + Send;
}
