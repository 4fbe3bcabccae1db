use crate::error::{AppError, Result};
use crate::models::{Field, FieldMap, LabelSchema};
use std::path::Path;
use tracing::warn;

/// Built-in trigger phrases, field -> label -> phrases
const BUILTIN: &[(Field, &[(&str, &[&str])])] = &[
    (
        Field::Subsystem,
        &[
            ("raptor_engine", &["raptor", "engine"]),
            ("propulsion", &["propellant", "methane", "oxygen", "thrust"]),
            ("avionics", &["avionics", "computer", "telemetry"]),
            ("gnc", &["guidance", "navigation", "control", "attitude", "tumble"]),
            ("stage_separation", &["separation", "hot-staging", "staging"]),
            ("structures", &["structural", "airframe", "buckling"]),
            (
                "heat_shield",
                &["heat shield", "tiles", "thermal protection", "reentry heating"],
            ),
            ("flaps", &["flap", "aero surface"]),
            ("tanks", &["tank", "header tank", "pressurization"]),
            (
                "ground_systems",
                &["ground system", "ground equipment", "tower", "deluge"],
            ),
            ("launch_pad", &["pad", "launch mount", "flame trench"]),
            ("range_safety", &["flight termination", "FTS", "range safety"]),
            (
                "communications",
                &["comms", "communications", "signal", "telemetry dropped"],
            ),
            ("software", &["software", "bug", "update", "algorithm"]),
        ],
    ),
    (
        Field::FailureMode,
        &[
            ("engine_shutdown", &["engine shutdown", "failed to ignite", "shutdown"]),
            ("explosion", &["explosion", "detonation", "blew up"]),
            ("leak", &["leak", "leaking"]),
            ("fire", &["fire", "flames", "burning"]),
            (
                "loss_of_control",
                &["loss of control", "tumble", "uncontrolled", "lost attitude"],
            ),
            (
                "structural_failure",
                &["structural failure", "broke apart", "disintegrated"],
            ),
            (
                "fts_triggered",
                &["flight termination", "FTS activated", "FTS was activated"],
            ),
            ("pad_damage", &["pad damage", "launch pad damage", "crater"]),
            (
                "comms_loss",
                &["lost telemetry", "communications dropped", "signal lost"],
            ),
            ("debris", &["debris", "fragments"]),
            ("reentry_breakup", &["reentry breakup", "broke up during reentry"]),
        ],
    ),
    (
        Field::Impact,
        &[
            (
                "vehicle_loss",
                &["was lost", "vehicle was lost", "destroyed", "broke apart"],
            ),
            ("pad_damage", &["pad damage", "launch pad damage"]),
            ("delay", &["delay", "delayed", "postponed"]),
            ("minor_anomaly", &["minor anomaly", "small issue"]),
            (
                "mission_success_with_anomaly",
                &["mission success with anomaly", "completed but"],
            ),
        ],
    ),
    (
        Field::Cause,
        &[
            ("propellant_leak", &["propellant leak", "leak"]),
            ("engine_rich_shutdown", &["rich shutdown"]),
            ("control_authority_loss", &["lost control authority"]),
            ("software_fault", &["software fault", "bug"]),
            ("debris_strike", &["debris strike", "hit by debris"]),
            (
                "thermal_protection_failure",
                &["thermal protection", "tiles", "heat shield"],
            ),
            ("unknown", &["unknown", "unclear"]),
        ],
    ),
];

/// Trigger phrases for one label, lower-cased
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelTriggers {
    pub label: String,
    pub phrases: Vec<String>,
}

impl LabelTriggers {
    pub fn new<S: AsRef<str>>(label: impl Into<String>, phrases: impl IntoIterator<Item = S>) -> Self {
        Self {
            label: label.into(),
            phrases: phrases
                .into_iter()
                .map(|p| p.as_ref().to_lowercase())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }
}

/// Immutable keyword table injected into the keyword scorer.
///
/// Field, label and phrase order are preserved as given.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct KeywordTable {
    fields: FieldMap<Vec<LabelTriggers>>,
}

impl KeywordTable {
    pub fn new(fields: FieldMap<Vec<LabelTriggers>>) -> Self {
        Self { fields }
    }

    /// The table shipped with the crate
    pub fn builtin() -> Self {
        let fields = BUILTIN
            .iter()
            .map(|(field, labels)| {
                let triggers = labels
                    .iter()
                    .map(|(label, phrases)| LabelTriggers::new(*label, phrases.iter()))
                    .collect();
                (*field, triggers)
            })
            .collect();
        Self { fields }
    }

    /// Parse a YAML document `{field: {label: [phrase, ...]}}`.
    ///
    /// Parsed through `serde_yaml::Mapping` so that label order survives.
    pub fn from_yaml_str(source: &str) -> Result<Self> {
        let document: serde_yaml::Mapping = serde_yaml::from_str(source)?;
        let mut fields = FieldMap::new();

        for (key, labels) in document {
            let Some(name) = key.as_str() else {
                return Err(AppError::Validation(format!(
                    "keyword table field name must be a string, got {:?}",
                    key
                )));
            };
            let Ok(field) = name.parse::<Field>() else {
                warn!(field = name, "Ignoring unknown field in keyword table");
                continue;
            };
            let labels: serde_yaml::Mapping = serde_yaml::from_value(labels)?;

            let mut triggers = Vec::with_capacity(labels.len());
            for (label, phrases) in labels {
                let Some(label) = label.as_str() else {
                    return Err(AppError::Validation(format!(
                        "keyword table label under '{}' must be a string",
                        field
                    )));
                };
                let phrases: Vec<String> = serde_yaml::from_value(phrases)?;
                triggers.push(LabelTriggers::new(label, phrases));
            }
            fields.insert(field, triggers);
        }

        Ok(Self { fields })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&source).map_err(|e| {
            AppError::Configuration(format!("Invalid keyword table {}: {}", path.display(), e))
        })
    }

    /// Triggers for a field, in table order
    pub fn triggers(&self, field: Field) -> &[LabelTriggers] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Schema whose label space is exactly the labels in this table
    pub fn label_schema(&self) -> LabelSchema {
        LabelSchema::from_fields(
            self.fields
                .iter()
                .map(|(field, triggers)| (field, triggers.iter().map(|t| t.label.clone()))),
        )
    }
}
