use serde::{Deserialize, Deserializer, Serialize};

/// The one severity that fails a lint run.
pub const SEVERITY_ERROR: &str = "error";

/// Parsed golangci-lint JSON report.
///
/// Field names follow the tool's JSON output, so a serialized `Report`
/// is itself a valid report document. Keys the tool emits that are not
/// modelled here (`Report`, `Linters`, ...) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    #[serde(rename = "Issues", default, deserialize_with = "null_as_default")]
    pub issues: Vec<Issue>,
}

impl Report {
    pub fn errors(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.is_error())
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// Everything that is not an error, whatever its severity string.
    pub fn warning_count(&self) -> usize {
        self.issues.iter().filter(|i| !i.is_error()).count()
    }

    /// Findings the tool marked as expected by a `//nolint` directive.
    pub fn suppressed_count(&self) -> usize {
        self.issues.iter().filter(|i| i.expected_no_lint).count()
    }
}

/// A single finding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Issue {
    pub text: String,
    pub from_linter: String,
    #[serde(deserialize_with = "null_as_default")]
    pub source_lines: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<Replacement>,
    pub pos: Position,
    pub expected_no_lint: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub severity: String,
}

impl Issue {
    pub fn is_error(&self) -> bool {
        self.severity == SEVERITY_ERROR
    }

    /// `[linter] file:line: message`
    pub fn summary(&self) -> String {
        format!(
            "[{}] {}:{}: {}",
            self.from_linter, self.pos.filename, self.pos.line, self.text
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Position {
    pub filename: String,
    pub offset: u64,
    pub line: u32,
    pub column: u32,
}

/// Suggested fix text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct Replacement {
    pub text: String,
}

/// The tool encodes empty collections and strings as `null` in places.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn issue(severity: &str) -> Issue {
        Issue {
            text: "unused var".into(),
            from_linter: "unused".into(),
            pos: Position {
                filename: "cmd/app/main.go".into(),
                line: 10,
                column: 2,
                ..Position::default()
            },
            severity: severity.into(),
            ..Issue::default()
        }
    }

    #[test]
    fn summary_matches_diagnostic_format() {
        assert_eq!(
            issue("error").summary(),
            "[unused] cmd/app/main.go:10: unused var"
        );
    }

    #[test]
    fn only_exact_error_severity_is_an_error() {
        assert!(issue("error").is_error());
        assert!(!issue("warning").is_error());
        assert!(!issue("Error").is_error());
        assert!(!issue("info").is_error());
    }

    #[test]
    fn counts_partition_issues() {
        let report = Report {
            issues: vec![issue("error"), issue("warning"), issue("info"), issue("error")],
        };

        assert_eq!(report.error_count(), 2);
        assert_eq!(report.warning_count(), 2);
        assert_eq!(
            report.error_count() + report.warning_count(),
            report.issues.len()
        );
    }

    #[test]
    fn deserializes_full_tool_issue() {
        let json = r#"{
            "Issues": [{
                "FromLinter": "errcheck",
                "Text": "Error return value is not checked",
                "Severity": "warning",
                "SourceLines": ["\tf.Close()"],
                "Replacement": {"NeedOnlyDelete": false, "NewLines": null, "Text": "_ = f.Close()"},
                "Pos": {"Filename": "main.go", "Offset": 120, "Line": 7, "Column": 9},
                "ExpectedNoLint": false,
                "LineRange": {"From": 7, "To": 7}
            }],
            "Report": {"Linters": []}
        }"#;

        let report: Report = serde_json::from_str(json).unwrap();
        let issue = &report.issues[0];

        assert_eq!(issue.from_linter, "errcheck");
        assert_eq!(issue.source_lines, vec!["\tf.Close()"]);
        assert_eq!(issue.replacement.as_ref().unwrap().text, "_ = f.Close()");
        assert_eq!(issue.pos.offset, 120);
        assert_eq!(issue.pos.column, 9);
        assert_eq!(issue.severity, "warning");
    }

    #[test]
    fn nulls_and_missing_fields_default() {
        let json = r#"{"Issues":[{"Text":"x","SourceLines":null,"Replacement":null,"Severity":null}]}"#;
        let report: Report = serde_json::from_str(json).unwrap();
        let issue = &report.issues[0];

        assert!(issue.source_lines.is_empty());
        assert!(issue.replacement.is_none());
        assert_eq!(issue.severity, "");
        assert_eq!(issue.pos, Position::default());

        let empty: Report = serde_json::from_str(r#"{"Issues":null}"#).unwrap();
        assert!(empty.issues.is_empty());
    }

    #[test]
    fn serializes_with_tool_field_names() {
        let value = serde_json::to_value(Report {
            issues: vec![issue("error")],
        })
        .unwrap();

        assert_eq!(value["Issues"][0]["FromLinter"], "unused");
        assert_eq!(value["Issues"][0]["Pos"]["Filename"], "cmd/app/main.go");
        assert_eq!(value["Issues"][0]["ExpectedNoLint"], false);
        assert!(value["Issues"][0].get("Replacement").is_none());
    }
}
