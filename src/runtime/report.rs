//! Report Aggregation
//!
//! Two consumers share the summary format: publishing terminals build a
//! report body from everything upstream, and the engine builds the final
//! executive report from completed nodes only.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;

use crate::store::NodeResult;

/// Executive report entry stored under the `ai_report` key
#[derive(Debug, Clone, Serialize)]
pub struct ExecutiveReport {
    pub ai_report: String,
    pub security_grade: String,
    pub total_issues: u64,
    pub critical_issues: u64,
    pub report_date: DateTime<Utc>,
    pub generated_by: &'static str,
}

impl ExecutiveReport {
    /// Build the entry, deriving the grading fields from structured
    /// findings rather than hardcoding them.
    pub fn build(ai_report: String, results: &[(Arc<str>, NodeResult)]) -> Self {
        let (total_issues, critical_issues) = count_issues(results);
        Self {
            ai_report,
            security_grade: grade(total_issues, critical_issues).to_string(),
            total_issues,
            critical_issues,
            report_date: Utc::now(),
            generated_by: "Strix AI",
        }
    }
}

/// Sum issue counts from scanner findings
fn count_issues(results: &[(Arc<str>, NodeResult)]) -> (u64, u64) {
    let mut total = 0;
    let mut critical = 0;
    for (_, result) in results {
        let Some(data) = result.data().and_then(Value::as_object) else {
            continue;
        };
        for key in ["vulnerabilities_found", "leaked_secrets"] {
            total += data.get(key).and_then(Value::as_u64).unwrap_or(0);
        }
        critical += data
            .get("severity_critical")
            .and_then(Value::as_u64)
            .unwrap_or(0);
    }
    (total, critical)
}

fn grade(total: u64, critical: u64) -> &'static str {
    if critical > 0 {
        "D"
    } else if total == 0 {
        "A"
    } else if total <= 3 {
        "B"
    } else if total <= 8 {
        "C"
    } else {
        "D"
    }
}

/// Render structured findings for a report body: a vulnerability list
/// when the data has that shape, otherwise fenced pretty JSON.
pub(crate) fn format_scan_data(data: &Value) -> String {
    if let Some(vulns) = data.get("vulnerabilities").and_then(Value::as_array) {
        let lines: Vec<String> = vulns
            .iter()
            .filter_map(Value::as_str)
            .map(|v| format!("- {v}"))
            .collect();
        if !lines.is_empty() {
            return lines.join("\n") + "\n";
        }
    }
    let pretty = serde_json::to_string_pretty(data).unwrap_or_default();
    format!("```json\n{pretty}\n```")
}

/// Summary block for notification terminals: every upstream result with
/// structured data or output, plus auto-fix action lines.
pub(crate) fn notification_summaries(results: &[(Arc<str>, NodeResult)]) -> String {
    let mut summaries = String::new();
    for (node_id, result) in results {
        if let Some(data) = result.data() {
            let formatted = format_scan_data(data);
            summaries.push_str(&format!(
                "Node {node_id} ({}) Output:\n{formatted}\n\n",
                result.label()
            ));
        } else if let Some(output) = result.output() {
            summaries.push_str(&format!(
                "Node {node_id} ({}) Output:\n{output}\n\n",
                result.label()
            ));
        }

        if let NodeResult::AutoFix(fix) = result {
            summaries.push_str(&format!(
                "Auto-Fix Action (Node {node_id}):\nStatus: {}\nPR URL: {}\n\n",
                fix.status, fix.pr_url
            ));
        }
    }
    summaries
}

/// Markdown summary block for issue bodies
pub(crate) fn issue_summaries(results: &[(Arc<str>, NodeResult)]) -> String {
    let mut summaries = String::new();
    for (node_id, result) in results {
        if let Some(data) = result.data() {
            let formatted = format_scan_data(data);
            summaries.push_str(&format!(
                "## Scan: {} (Node {node_id})\n{formatted}\n\n",
                result.label()
            ));
        } else if let Some(output) = result.output() {
            summaries.push_str(&format!(
                "## Scan: {} (Node {node_id})\n```\n{output}\n```\n\n",
                result.label()
            ));
        }
    }
    summaries
}

/// Summary block for the final executive report: completed nodes only
/// (the caller pre-filters by node state), output text only.
pub(crate) fn completed_scan_summaries(results: &[(Arc<str>, NodeResult)]) -> String {
    let mut summaries = String::new();
    for (node_id, result) in results {
        if let Some(output) = result.output() {
            summaries.push_str(&format!(
                "Node {node_id} ({}) Output:\n{output}\n\n",
                result.label()
            ));
        }
    }
    summaries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{AutoFixResult, ScanResult, TriggerResult};
    use serde_json::json;

    fn scan(id: &str, scanner: &str, output: &str, data: Option<Value>) -> (Arc<str>, NodeResult) {
        let mut result = ScanResult::completed(scanner, "t", output);
        result.data = data;
        (Arc::from(id), NodeResult::Scan(result))
    }

    #[test]
    fn completed_summaries_follow_the_documented_format() {
        let results = vec![scan("n1", "nmap", "80/tcp open", None)];
        assert_eq!(
            completed_scan_summaries(&results),
            "Node n1 (nmap) Output:\n80/tcp open\n\n"
        );
    }

    #[test]
    fn trigger_has_no_output_and_is_omitted() {
        let results = vec![(
            Arc::from("t") as Arc<str>,
            NodeResult::Trigger(TriggerResult::new("u")),
        )];
        assert_eq!(completed_scan_summaries(&results), "");
    }

    #[test]
    fn vulnerability_lists_render_as_bullets() {
        let data = json!({"vulnerabilities": ["OSVDB-3092: /admin/", "HTTP TRACE enabled"]});
        let formatted = format_scan_data(&data);
        assert!(formatted.contains("- OSVDB-3092: /admin/"));
        assert!(formatted.contains("- HTTP TRACE enabled"));
        assert!(!formatted.contains("```"));
    }

    #[test]
    fn other_data_renders_as_fenced_json() {
        let formatted = format_scan_data(&json!({"leaked_secrets": 1}));
        assert!(formatted.starts_with("```json"));
        assert!(formatted.contains("\"leaked_secrets\": 1"));
    }

    #[test]
    fn notification_summaries_include_autofix_lines() {
        let results = vec![(
            Arc::from("f") as Arc<str>,
            NodeResult::AutoFix(AutoFixResult::created("https://pr/7", 7, "fix/vuln-1")),
        )];
        let summaries = notification_summaries(&results);
        assert!(summaries.contains("Auto-Fix Action (Node f)"));
        assert!(summaries.contains("https://pr/7"));
    }

    #[test]
    fn issue_summaries_use_markdown_headers() {
        let results = vec![scan("s", "gitleaks", "found stuff", None)];
        let summaries = issue_summaries(&results);
        assert!(summaries.contains("## Scan: gitleaks (Node s)"));
        assert!(summaries.contains("```\nfound stuff\n```"));
    }

    #[test]
    fn grading_derived_from_findings() {
        let clean: Vec<(Arc<str>, NodeResult)> = vec![];
        let report = ExecutiveReport::build("all clear".into(), &clean);
        assert_eq!(report.security_grade, "A");
        assert_eq!(report.total_issues, 0);

        let findings = vec![
            scan("a", "gitleaks", "{}", Some(json!({"leaked_secrets": 2}))),
            scan(
                "b",
                "trivy-sca",
                "{}",
                Some(json!({"vulnerabilities_found": 1, "severity_high": 1})),
            ),
        ];
        let report = ExecutiveReport::build("issues".into(), &findings);
        assert_eq!(report.total_issues, 3);
        assert_eq!(report.critical_issues, 0);
        assert_eq!(report.security_grade, "B");
    }

    #[test]
    fn criticals_force_grade_d() {
        let findings = vec![scan(
            "c",
            "trivy-image",
            "{}",
            Some(json!({"vulnerabilities_found": 1, "severity_critical": 1})),
        )];
        let report = ExecutiveReport::build("bad".into(), &findings);
        assert_eq!(report.critical_issues, 1);
        assert_eq!(report.security_grade, "D");
    }

    #[test]
    fn report_serializes_conventional_fields() {
        let report = ExecutiveReport::build("body".into(), &[]);
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["ai_report"], "body");
        assert_eq!(value["generated_by"], "Strix AI");
        assert!(value["report_date"].is_string());
    }
}
