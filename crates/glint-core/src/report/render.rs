use crate::report::model::{Issue, Report};

/// One summary line per issue, then a totals line.
pub fn render_text(issues: &[Issue]) -> String {
    let mut out = String::new();
    for issue in issues {
        out.push_str(&issue.summary());
        out.push('\n');
    }

    let errors = issues.iter().filter(|i| i.is_error()).count();
    out.push_str(&format!(
        "{} issues ({} errors, {} warnings)\n",
        issues.len(),
        errors,
        issues.len() - errors
    ));
    out
}

/// Pretty JSON in the tool's own report shape.
pub fn render_json(issues: &[Issue]) -> Result<String, serde_json::Error> {
    let report = Report {
        issues: issues.to_vec(),
    };
    serde_json::to_string_pretty(&report)
}
