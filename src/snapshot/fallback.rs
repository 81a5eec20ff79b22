//! Bundled offline record for year 0
//!
//! This is the only snapshot available without a cache entry or a generator.

use crate::core::calendar::Year;
use crate::snapshot::model::{
    Civilization, Government, GraphLink, GraphNode, Interaction, InteractionKind, Person,
    RelationshipGraph, Snapshot, Society,
};

/// Year served by [`seed_snapshot`]
pub const FALLBACK_YEAR: Year = 0;

/// The offline snapshot for `year`, if one is bundled
pub fn fallback_for(year: Year) -> Option<Snapshot> {
    (year == FALLBACK_YEAR).then(seed_snapshot)
}

fn person(name: &str, role: &str, lifespan: &str, impact: &str, works: &str) -> Person {
    Person {
        name: name.into(),
        role: role.into(),
        lifespan: lifespan.into(),
        impact: impact.into(),
        works: works.into(),
    }
}

fn node(id: &str, group: &str) -> GraphNode {
    GraphNode {
        id: id.into(),
        group: group.into(),
        radius: None,
        details: None,
    }
}

fn link(source: &str, target: &str, label: &str) -> GraphLink {
    GraphLink {
        source: source.into(),
        target: target.into(),
        label: Some(label.into()),
        kind: None,
    }
}

/// Year 0: Pax Romana in the west, Han dynasty in the east
pub fn seed_snapshot() -> Snapshot {
    let rome = Civilization {
        name: "Roman Empire".into(),
        lat: 41.9,
        lng: 12.5,
        radius_km: 2500.0,
        color: "#ef4444".into(),
        overview: "A vast empire controlling the Mediterranean, known for law, engineering, and military prowess.".into(),
        government: Government {
            kind: "Principate".into(),
            leaders: vec!["Augustus".into()],
            structure: "Centralized authority under the Emperor with a symbolic Senate.".into(),
            parties: "Optimates vs Populares remnants".into(),
        },
        society: Society {
            population: "~45 Million".into(),
            economy: "Agrarian, extensive trade networks.".into(),
            military: "Professional Legions.".into(),
            culture: "Greco-Roman polytheism, rise of stoicism.".into(),
        },
        figures: vec![
            person("Augustus", "Emperor", "63 BC - 14 AD", "Founded the Principate.", "Res Gestae"),
            person("Ovid", "Poet", "43 BC - 17 AD", "Influential Latin literature.", "Metamorphoses"),
        ],
        sources: vec![
            "Cambridge Ancient History Vol. X".into(),
            "The Roman Empire: Economy, Society and Culture (Garnsey & Saller)".into(),
        ],
    };

    let han = Civilization {
        name: "Han Dynasty".into(),
        lat: 34.3,
        lng: 108.9,
        radius_km: 2200.0,
        color: "#eab308".into(),
        overview: "The golden age of Chinese history, characterized by economic prosperity and Confucian governance.".into(),
        government: Government {
            kind: "Imperial Monarchy".into(),
            leaders: vec!["Emperor Ping".into()],
            structure: "Centralized bureaucracy.".into(),
            parties: "Consort kin factions".into(),
        },
        society: Society {
            population: "~58 Million".into(),
            economy: "Silk production, iron monopoly.".into(),
            military: "Conscript army.".into(),
            culture: "Confucianism as state orthodoxy.".into(),
        },
        figures: vec![person(
            "Wang Mang",
            "Official",
            "45 BC - 23 AD",
            "Usurper, reforms.",
            "New policies",
        )],
        sources: vec![
            "The Cambridge History of China, Vol. 1".into(),
            "Records of the Grand Historian (Shiji)".into(),
        ],
    };

    let silk_road = Interaction {
        kind: InteractionKind::Trade,
        from_lat: 34.3,
        from_lng: 108.9,
        to_lat: 41.9,
        to_lng: 12.5,
        title: "Silk Road".into(),
        description: "Indirect trade network connecting Han China and Rome.".into(),
        impact: "Exchange of silk, gold, glassware, and culture.".into(),
        participants: vec![
            "Han Empire".into(),
            "Parthian Empire".into(),
            "Roman Empire".into(),
        ],
    };

    Snapshot {
        year: FALLBACK_YEAR,
        summary: "The world is dominated by the Pax Romana in the West and the Han Dynasty in the East. It is a period of relative stability, flourishing trade via the Silk Road, and significant cultural consolidation.".into(),
        civilizations: vec![rome, han],
        interactions: vec![silk_road],
        relationships: RelationshipGraph {
            description: "Key geopolitical balance.".into(),
            nodes: vec![
                node("Augustus", "person"),
                node("Roman Empire", "nation"),
                node("Han Dynasty", "nation"),
                node("Silk Road", "organization"),
            ],
            links: vec![
                link("Augustus", "Roman Empire", "Ruler"),
                link("Han Dynasty", "Roman Empire", "Trade"),
            ],
        },
    }
}
