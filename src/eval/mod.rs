//! Evaluation of prediction streams against gold annotations
//!
//! Label metrics follow multi-label set semantics over the schema's label
//! ordering. Evidence metrics score predicted sentence indices against gold
//! evidence in the sentence coordinate system of [`crate::text`].

pub mod evidence;
pub mod labels;
pub mod markdown;

pub use evidence::{
    resolve_evidence, score_at_k, EvidenceEvaluator, EvidenceMetrics, EvidenceReport,
    OverallEvidenceMetrics,
};
pub use labels::{binarize, FieldMetrics, LabelEvaluator, LabelMetrics, LabelReport};
pub use markdown::{evidence_report_markdown, label_report_markdown};
