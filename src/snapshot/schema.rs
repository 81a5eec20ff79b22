//! Boundary validation for snapshot records
//!
//! Anything that crosses into the core (generator replies, cache entries) is
//! checked here before it becomes a [`Snapshot`]. Violations are rejected,
//! never patched up.

use ahash::AHashSet;
use serde_json::Value;
use thiserror::Error;

use crate::core::calendar::Year;
use crate::snapshot::model::Snapshot;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaViolation {
    #[error("Missing required field `{0}`")]
    MissingField(String),

    #[error("Field `{0}` must be an array")]
    NotAnArray(String),

    #[error("Field `{field}` is not a finite number")]
    NotFinite { field: String },

    #[error("Field `{field}` out of range: {value}")]
    OutOfRange { field: String, value: f64 },

    #[error("Snapshot is for year {found}, expected {expected}")]
    YearMismatch { expected: Year, found: Year },

    #[error("Duplicate {kind} `{name}`")]
    Duplicate { kind: &'static str, name: String },

    #[error("Could not decode snapshot: {0}")]
    Decode(String),
}

/// Arrays every snapshot record must carry, as JSON pointer paths
const REQUIRED_ARRAYS: [&str; 4] = [
    "/civilizations",
    "/interactions",
    "/relationships/nodes",
    "/relationships/links",
];

/// Parse and validate a raw JSON record
pub fn parse_snapshot(raw: &str, expected_year: Year) -> Result<Snapshot, SchemaViolation> {
    let value: Value =
        serde_json::from_str(raw).map_err(|e| SchemaViolation::Decode(e.to_string()))?;
    snapshot_from_value(value, expected_year)
}

/// Validate the shape of a loosely typed record and convert it
pub fn snapshot_from_value(value: Value, expected_year: Year) -> Result<Snapshot, SchemaViolation> {
    check_shape(&value)?;
    let snapshot: Snapshot =
        serde_json::from_value(value).map_err(|e| SchemaViolation::Decode(e.to_string()))?;
    validate_snapshot(&snapshot, expected_year)?;
    Ok(snapshot)
}

/// Structural checks that serde alone would report less precisely
fn check_shape(value: &Value) -> Result<(), SchemaViolation> {
    if !value.is_object() {
        return Err(SchemaViolation::Decode("top level is not an object".into()));
    }

    for field in ["/year", "/summary", "/relationships"] {
        if value.pointer(field).map_or(true, Value::is_null) {
            return Err(SchemaViolation::MissingField(field[1..].replace('/', ".")));
        }
    }

    for path in REQUIRED_ARRAYS {
        let name = path[1..].replace('/', ".");
        match value.pointer(path) {
            None | Some(Value::Null) => return Err(SchemaViolation::MissingField(name)),
            Some(Value::Array(_)) => {}
            Some(_) => return Err(SchemaViolation::NotAnArray(name)),
        }
    }

    Ok(())
}

fn check_finite(field: &str, value: f64) -> Result<(), SchemaViolation> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SchemaViolation::NotFinite { field: field.into() })
    }
}

fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), SchemaViolation> {
    check_finite(field, value)?;
    if value < min || value > max {
        return Err(SchemaViolation::OutOfRange { field: field.into(), value });
    }
    Ok(())
}

/// Invariants of a typed snapshot
pub fn validate_snapshot(snapshot: &Snapshot, expected_year: Year) -> Result<(), SchemaViolation> {
    if snapshot.year != expected_year {
        return Err(SchemaViolation::YearMismatch {
            expected: expected_year,
            found: snapshot.year,
        });
    }

    let mut names = AHashSet::new();
    for (i, civ) in snapshot.civilizations.iter().enumerate() {
        check_range(&format!("civilizations[{i}].lat"), civ.lat, -90.0, 90.0)?;
        check_range(&format!("civilizations[{i}].lng"), civ.lng, -180.0, 180.0)?;
        check_range(&format!("civilizations[{i}].radiusKm"), civ.radius_km, 0.0, f64::MAX)?;
        if !names.insert(civ.name.as_str()) {
            return Err(SchemaViolation::Duplicate {
                kind: "civilization",
                name: civ.name.clone(),
            });
        }
    }

    for (i, interaction) in snapshot.interactions.iter().enumerate() {
        check_range(&format!("interactions[{i}].fromLat"), interaction.from_lat, -90.0, 90.0)?;
        check_range(&format!("interactions[{i}].fromLng"), interaction.from_lng, -180.0, 180.0)?;
        check_range(&format!("interactions[{i}].toLat"), interaction.to_lat, -90.0, 90.0)?;
        check_range(&format!("interactions[{i}].toLng"), interaction.to_lng, -180.0, 180.0)?;
    }

    let mut ids = AHashSet::new();
    for (i, node) in snapshot.relationships.nodes.iter().enumerate() {
        if let Some(radius) = node.radius {
            check_range(&format!("relationships.nodes[{i}].radius"), radius, 0.0, f64::MAX)?;
        }
        if !ids.insert(node.id.as_str()) {
            return Err(SchemaViolation::Duplicate {
                kind: "node",
                name: node.id.clone(),
            });
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fallback::seed_snapshot;
    use serde_json::json;

    fn seed_value() -> Value {
        serde_json::to_value(seed_snapshot()).unwrap()
    }

    #[test]
    fn test_seed_round_trips_through_schema() {
        let raw = serde_json::to_string(&seed_snapshot()).unwrap();
        let parsed = parse_snapshot(&raw, 0).unwrap();
        assert_eq!(parsed, seed_snapshot());
    }

    #[test]
    fn test_missing_civilizations_rejected() {
        let mut value = seed_value();
        value.as_object_mut().unwrap().remove("civilizations");
        assert_eq!(
            snapshot_from_value(value, 0),
            Err(SchemaViolation::MissingField("civilizations".into()))
        );
    }

    #[test]
    fn test_links_must_be_array() {
        let mut value = seed_value();
        value["relationships"]["links"] = json!({"source": "a"});
        assert_eq!(
            snapshot_from_value(value, 0),
            Err(SchemaViolation::NotAnArray("relationships.links".into()))
        );
    }

    #[test]
    fn test_latitude_out_of_range() {
        let mut value = seed_value();
        value["civilizations"][0]["lat"] = json!(120.0);
        assert!(matches!(
            snapshot_from_value(value, 0),
            Err(SchemaViolation::OutOfRange { .. })
        ));
    }

    #[test]
    fn test_string_where_number_expected_is_decode_error() {
        let mut value = seed_value();
        value["interactions"][0]["toLng"] = json!("twelve");
        assert!(matches!(
            snapshot_from_value(value, 0),
            Err(SchemaViolation::Decode(_))
        ));
    }

    #[test]
    fn test_unknown_interaction_type_rejected() {
        let mut value = seed_value();
        value["interactions"][0]["type"] = json!("alliance");
        assert!(matches!(
            snapshot_from_value(value, 0),
            Err(SchemaViolation::Decode(_))
        ));
    }

    #[test]
    fn test_year_mismatch_rejected() {
        assert_eq!(
            snapshot_from_value(seed_value(), 500),
            Err(SchemaViolation::YearMismatch { expected: 500, found: 0 })
        );
    }

    #[test]
    fn test_non_finite_radius_rejected() {
        let mut snapshot = seed_snapshot();
        snapshot.civilizations[1].radius_km = f64::NAN;
        assert!(matches!(
            validate_snapshot(&snapshot, 0),
            Err(SchemaViolation::NotFinite { .. })
        ));
    }

    #[test]
    fn test_duplicate_civilization_rejected() {
        let mut snapshot = seed_snapshot();
        let copy = snapshot.civilizations[0].clone();
        snapshot.civilizations.push(copy);
        assert!(matches!(
            validate_snapshot(&snapshot, 0),
            Err(SchemaViolation::Duplicate { kind: "civilization", .. })
        ));
    }

    #[test]
    fn test_dangling_link_is_not_a_schema_error() {
        let mut value = seed_value();
        value["relationships"]["links"]
            .as_array_mut()
            .unwrap()
            .push(json!({"source": "Augustus", "target": "Cleopatra"}));
        assert!(snapshot_from_value(value, 0).is_ok());
    }
}
