//! Shared fixtures for integration tests

#![allow(dead_code)]

use incident_tagger::models::{Field, IncidentRecord};

/// A labeled incident with text and optional date
pub fn incident(id: &str, text: &str, date: Option<&str>) -> IncidentRecord {
    let record = IncidentRecord::new(id, text);
    match date {
        Some(date) => record.with_date(date),
        None => record,
    }
}

/// Small flight-test corpus: every incident carries subsystem and impact
/// labels, some carry gold evidence
pub fn flight_corpus() -> Vec<IncidentRecord> {
    vec![
        incident(
            "ift-1",
            "The raptor engine shutdown happened at T+40. A fire started in the engine bay. The vehicle was lost.",
            Some("2023-04-20"),
        )
        .with_labels(Field::Subsystem, ["raptor_engine"])
        .with_labels(Field::FailureMode, ["engine_shutdown", "fire"])
        .with_labels(Field::Impact, ["vehicle_loss"])
        .with_evidence(Field::FailureMode, "fire", [1])
        .with_evidence(Field::Subsystem, "raptor_engine", [0, 1]),
        incident(
            "ift-2",
            "Hot-staging separation completed. A propellant leak caused a fire. The vehicle was lost.",
            Some("2023-11-18"),
        )
        .with_labels(Field::Subsystem, ["stage_separation", "tanks"])
        .with_labels(Field::FailureMode, ["leak", "fire"])
        .with_labels(Field::Impact, ["vehicle_loss"])
        .with_labels(Field::Cause, ["propellant_leak"])
        .with_evidence(Field::Cause, "propellant_leak", [1]),
        incident(
            "ift-3",
            "Header tank pressurization was lost during the coast. The vehicle was lost on reentry.",
            Some("2024-03-14"),
        )
        .with_labels(Field::Subsystem, ["tanks"])
        .with_labels(Field::Impact, ["vehicle_loss"])
        .with_evidence(Field::Subsystem, "tanks", [0]),
        incident(
            "ift-4",
            "Tiles were lost from the heat shield. The flap burned through but landing completed. Mission success with anomaly.",
            Some("2024-06-06"),
        )
        .with_labels(Field::Subsystem, ["heat_shield", "flaps"])
        .with_labels(Field::Impact, ["mission_success_with_anomaly"])
        .with_evidence(Field::Subsystem, "heat_shield", [0]),
        incident(
            "ift-5",
            "A software bug in the guidance algorithm caused a tumble. The vehicle was lost.",
            None,
        )
        .with_labels(Field::Subsystem, ["software", "gnc"])
        .with_labels(Field::Impact, ["vehicle_loss"])
        .with_labels(Field::Cause, ["software_fault"]),
        incident("draft-1", "Unlabeled narrative awaiting review.", Some("2024-09-01")),
    ]
}

/// Undated labeled incidents, for the random split strategy
pub fn undated_corpus(n: usize) -> Vec<IncidentRecord> {
    (0..n)
        .map(|i| {
            incident(&format!("inc-{:02}", i), &format!("Incident number {} had a leak.", i), None)
                .with_labels(Field::FailureMode, ["leak"])
        })
        .collect()
}
