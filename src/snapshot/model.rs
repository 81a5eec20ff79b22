//! Strongly typed historical snapshot
//!
//! Field names follow the JSON wire format (camelCase), which is shared by
//! the cache and the generator.

use ahash::AHashSet;
use serde::{Deserialize, Serialize};

use crate::core::calendar::Year;

/// The complete historical record for one year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub year: Year,
    pub summary: String,
    pub civilizations: Vec<Civilization>,
    pub interactions: Vec<Interaction>,
    pub relationships: RelationshipGraph,
}

/// A major power present in the snapshot year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Civilization {
    pub name: String,
    /// Latitude of the capital or center of power (degrees)
    pub lat: f64,
    /// Longitude of the capital or center of power (degrees)
    pub lng: f64,
    /// Effective radius of control/influence (km)
    pub radius_km: f64,
    /// Display color token, usually `#rrggbb`
    pub color: String,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub government: Government,
    #[serde(default)]
    pub society: Society,
    #[serde(default)]
    pub figures: Vec<Person>,
    #[serde(default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Government {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub leaders: Vec<String>,
    #[serde(default)]
    pub structure: String,
    #[serde(default)]
    pub parties: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Society {
    #[serde(default)]
    pub population: String,
    #[serde(default)]
    pub economy: String,
    #[serde(default)]
    pub military: String,
    #[serde(default)]
    pub culture: String,
}

/// A key historical figure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub name: String,
    pub role: String,
    /// e.g. "100 BC - 44 BC"
    pub lifespan: String,
    pub impact: String,
    pub works: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Conflict,
    Trade,
    Culture,
    Diplomacy,
}

impl InteractionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionKind::Conflict => "conflict",
            InteractionKind::Trade => "trade",
            InteractionKind::Culture => "culture",
            InteractionKind::Diplomacy => "diplomacy",
        }
    }
}

/// A geopolitical interaction between two locations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    #[serde(rename = "type")]
    pub kind: InteractionKind,
    pub from_lat: f64,
    pub from_lng: f64,
    pub to_lat: f64,
    pub to_lng: f64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub impact: String,
    /// Civilization names; not guaranteed to match `Snapshot::civilizations`
    #[serde(default)]
    pub participants: Vec<String>,
}

/// Node-link graph of people, nations and organizations
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RelationshipGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphNode {
    pub id: String,
    /// "person", "nation", "organization" or free text
    pub group: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// A link references its endpoints by id only
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphLink {
    pub source: String,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl Snapshot {
    pub fn civilization(&self, name: &str) -> Option<&Civilization> {
        self.civilizations.iter().find(|c| c.name == name)
    }

    /// Participant names that do not match any civilization in this snapshot
    ///
    /// Mismatches are reported, never corrected.
    pub fn unknown_participants(&self) -> Vec<&str> {
        let known: AHashSet<&str> = self.civilizations.iter().map(|c| c.name.as_str()).collect();
        let mut unknown: Vec<&str> = Vec::new();
        for name in self
            .interactions
            .iter()
            .flat_map(|i| i.participants.iter())
            .map(String::as_str)
        {
            if !known.contains(name) && !unknown.contains(&name) {
                unknown.push(name);
            }
        }
        unknown
    }
}

impl RelationshipGraph {
    pub fn has_node(&self, id: &str) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    /// Links with at least one endpoint missing from `nodes`
    pub fn dangling_links(&self) -> impl Iterator<Item = &GraphLink> + '_ {
        let ids: AHashSet<&str> = self.nodes.iter().map(|n| n.id.as_str()).collect();
        self.links.iter().filter(move |l| {
            !ids.contains(l.source.as_str()) || !ids.contains(l.target.as_str())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::fallback::seed_snapshot;

    #[test]
    fn test_wire_names_are_camel_case() {
        let snapshot = seed_snapshot();
        let json = serde_json::to_value(&snapshot).unwrap();
        let civ = &json["civilizations"][0];
        assert!(civ.get("radiusKm").is_some());
        assert!(civ["government"].get("type").is_some());
        let interaction = &json["interactions"][0];
        assert_eq!(interaction["type"], "trade");
        assert!(interaction.get("fromLat").is_some());
    }

    #[test]
    fn test_unknown_participants_reported_once() {
        let snapshot = seed_snapshot();
        // The seed's Silk Road lists "Han Empire" and "Parthian Empire",
        // neither of which is a civilization in the year-0 record.
        let unknown = snapshot.unknown_participants();
        assert_eq!(unknown, vec!["Han Empire", "Parthian Empire"]);
    }

    #[test]
    fn test_dangling_links() {
        let mut graph = seed_snapshot().relationships;
        assert_eq!(graph.dangling_links().count(), 0);
        graph.links.push(GraphLink {
            source: "Augustus".into(),
            target: "Nobody".into(),
            label: None,
            kind: None,
        });
        assert_eq!(graph.dangling_links().count(), 1);
        assert!(graph.has_node("Augustus"));
        assert!(!graph.has_node("Nobody"));
    }
}
