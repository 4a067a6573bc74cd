//! Report decoding and normalization.
//!
//! The tool reports filenames relative to its working directory, which is
//! the caller's subpath inside the source tree. Normalization restores
//! paths relative to the source root and fills in the severity the tool
//! leaves empty for its default class.

use tracing::info;

use crate::error::ReportError;
use crate::report::model::{Report, SEVERITY_ERROR};
use crate::util::paths;

/// Severity given to issues the tool left unclassified.
///
/// golangci-lint v1.64 omits `Severity` for default-level findings; this
/// mapping should be rechecked whenever the pinned image changes.
pub const DEFAULT_SEVERITY: &str = SEVERITY_ERROR;

/// Rewrite every issue in place. Applying it twice with a non-empty
/// subpath prefixes twice, so run it exactly once per decoded report.
pub fn normalize(report: &mut Report, subpath: &str) {
    for issue in &mut report.issues {
        issue.pos.filename = paths::join(&[subpath, &issue.pos.filename]);
        if issue.severity.is_empty() {
            issue.severity = DEFAULT_SEVERITY.to_string();
        }
    }
}

/// Decode a raw report document and normalize it for `subpath`.
///
/// Any decode failure is returned as-is; there is no partial recovery.
pub fn parse_report(json: &str, subpath: &str) -> Result<Report, ReportError> {
    let mut report: Report = serde_json::from_str(json)?;
    normalize(&mut report, subpath);

    info!(
        issues = report.issues.len(),
        errors = report.error_count(),
        warnings = report.warning_count(),
        "parsed lint report"
    );
    Ok(report)
}
