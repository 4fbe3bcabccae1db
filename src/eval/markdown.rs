use crate::eval::evidence::EvidenceReport;
use crate::eval::labels::LabelReport;

/// Render label metrics as Markdown: one summary and one per-label table per field
pub fn label_report_markdown(report: &LabelReport) -> String {
    let mut lines = vec![
        "# Classification Metrics".to_string(),
        String::new(),
        format!("Total evaluated incidents: {}", report.n),
        String::new(),
    ];

    for (field, metrics) in report.fields.iter() {
        lines.push(format!("## {}", field));
        lines.push(String::new());
        lines.push("| Metric | Value |".to_string());
        lines.push("| --- | --- |".to_string());
        lines.push(format!("| Micro precision | {:.3} |", metrics.micro_precision));
        lines.push(format!("| Micro recall | {:.3} |", metrics.micro_recall));
        lines.push(format!("| Micro F1 | {:.3} |", metrics.micro_f1));
        lines.push(format!("| Macro F1 | {:.3} |", metrics.macro_f1));
        lines.push(String::new());
        lines.push("| Label | Precision | Recall | F1 | Support |".to_string());
        lines.push("| --- | --- | --- | --- | --- |".to_string());
        for (label, m) in &metrics.per_label {
            lines.push(format!(
                "| {} | {:.3} | {:.3} | {:.3} | {} |",
                label, m.precision, m.recall, m.f1, m.support
            ));
        }
        lines.push(String::new());
    }

    lines.join("\n") + "\n"
}

/// Render evidence metrics as Markdown: overall table, then one row per field
pub fn evidence_report_markdown(report: &EvidenceReport) -> String {
    let overall = &report.overall;
    let mut lines = vec![
        "# Evidence Grounding Metrics".to_string(),
        String::new(),
        format!("Evaluated incidents: {}", report.n_incidents),
        String::new(),
        "## Overall".to_string(),
        String::new(),
        "| Metric | Value |".to_string(),
        "| --- | --- |".to_string(),
        format!("| Precision@1 | {:.3} |", overall.metrics.precision_at_1),
        format!("| Precision@3 | {:.3} |", overall.metrics.precision_at_3),
        format!("| Recall@1 | {:.3} |", overall.metrics.recall_at_1),
        format!("| Recall@3 | {:.3} |", overall.metrics.recall_at_3),
        format!("| Coverage | {:.3} |", overall.coverage),
        String::new(),
        "## Per-field".to_string(),
        String::new(),
        "| Field | Precision@1 | Precision@3 | Recall@1 | Recall@3 |".to_string(),
        "| --- | --- | --- | --- | --- |".to_string(),
    ];

    for (field, m) in report.per_field.iter() {
        lines.push(format!(
            "| {} | {:.3} | {:.3} | {:.3} | {:.3} |",
            field, m.precision_at_1, m.precision_at_3, m.recall_at_1, m.recall_at_3
        ));
    }
    lines.push(String::new());

    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::eval::evidence::{EvidenceMetrics, OverallEvidenceMetrics};
    use crate::eval::labels::{FieldMetrics, LabelMetrics};
    use crate::models::{Field, FieldMap};

    #[test]
    fn test_label_markdown() {
        let mut fields = FieldMap::new();
        fields.insert(
            Field::Subsystem,
            FieldMetrics {
                micro_precision: 1.0,
                micro_recall: 0.5,
                micro_f1: 2.0 / 3.0,
                macro_f1: 0.25,
                per_label: vec![(
                    "raptor_engine".to_string(),
                    LabelMetrics {
                        precision: 1.0,
                        recall: 0.5,
                        f1: 2.0 / 3.0,
                        support: 2,
                    },
                )],
            },
        );
        let markdown = label_report_markdown(&LabelReport { n: 3, fields });

        assert!(markdown.starts_with("# Classification Metrics\n\nTotal evaluated incidents: 3\n"));
        assert!(markdown.contains("## subsystem\n"));
        assert!(markdown.contains("| Micro F1 | 0.667 |"));
        assert!(markdown.contains("| raptor_engine | 1.000 | 0.500 | 0.667 | 2 |"));
        assert!(markdown.ends_with("|\n\n"));
    }

    #[test]
    fn test_evidence_markdown() {
        let report = EvidenceReport {
            overall: OverallEvidenceMetrics {
                metrics: EvidenceMetrics {
                    precision_at_1: 0.5,
                    ..Default::default()
                },
                coverage: 1.0,
            },
            per_field: Field::all().map(|f| (f, EvidenceMetrics::default())).collect(),
            n_incidents: 2,
        };
        let markdown = evidence_report_markdown(&report);

        assert!(markdown.contains("Evaluated incidents: 2\n\n## Overall"));
        assert!(markdown.contains("| Precision@1 | 0.500 |"));
        assert!(markdown.contains("| Coverage | 1.000 |\n\n## Per-field"));
        assert!(markdown.contains("| failure_mode | 0.000 | 0.000 | 0.000 | 0.000 |"));
        assert!(markdown.starts_with("# Evidence Grounding Metrics\n\nEvaluated incidents: 2\n"));
        assert!(markdown.ends_with("|\n\n"));
    }
}
