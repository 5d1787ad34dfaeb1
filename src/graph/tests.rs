//! Deserialization tests against the graph file format

use serde_json::{json, Value};

/// Fixture: a physics graph as produced by the graph-building collaborator
fn physics_graph_fixture() -> Value {
    json!({
        "nodes": [
            {
                "id": "kinematics_velocity",
                "label": "velocity",
                "properties": {
                    "description": "Rate of change of position with respect to time.",
                    "category": "kinematics",
                    "theme": "motion",
                    "cultivated_abilities": ["modelling", "quantitative reasoning"],
                    "difficulty": 2
                }
            },
            {
                "id": "kinematics_acceleration",
                "label": "acceleration",
                "properties": {
                    "description": "Rate of change of velocity."
                }
            },
            {
                "id": "bare",
                "label": "bare node"
            }
        ],
        "edges": [
            {
                "source": "kinematics_velocity",
                "target": "kinematics_acceleration",
                "label": "derivative_of"
            }
        ]
    })
}

#[cfg(test)]
mod format_tests {
    use super::*;
    use crate::graph::{GraphFile, KnowledgeGraph, NodeId, PropertyValue};

    #[test]
    fn node_id_serializes_as_string() {
        let id = NodeId::from_string("kinematics_velocity");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"kinematics_velocity\"");
    }

    #[test]
    fn graph_file_deserializes() {
        let file: GraphFile = serde_json::from_value(physics_graph_fixture()).unwrap();
        assert_eq!(file.nodes.len(), 3);
        assert_eq!(file.edges.len(), 1);
        assert_eq!(file.edges[0].label.as_deref(), Some("derivative_of"));
        assert!(file.edges[0].properties.is_none());
    }

    #[test]
    fn property_values_keep_their_shape() {
        let file: GraphFile = serde_json::from_value(physics_graph_fixture()).unwrap();
        let velocity = &file.nodes[0];
        assert_eq!(
            velocity.properties["cultivated_abilities"],
            PropertyValue::Array(vec![
                PropertyValue::String("modelling".into()),
                PropertyValue::String("quantitative reasoning".into()),
            ])
        );
        assert_eq!(velocity.properties["difficulty"], PropertyValue::Int(2));
        assert_eq!(velocity.text_property("theme"), "motion");
    }

    #[test]
    fn properties_default_to_empty() {
        let file: GraphFile = serde_json::from_value(physics_graph_fixture()).unwrap();
        let bare = &file.nodes[2];
        assert!(bare.properties.is_empty());
        assert_eq!(bare.description(), "");
    }

    #[test]
    fn graph_from_json_text() {
        let text = physics_graph_fixture().to_string();
        let graph = KnowledgeGraph::from_json_str("physics", &text).unwrap();
        assert_eq!(graph.name(), "physics");
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(
            graph.neighbors_within("kinematics_acceleration", 1),
            vec!["kinematics_velocity"]
        );
        // file order is kept
        let ids: Vec<&str> = graph.nodes().iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["kinematics_velocity", "kinematics_acceleration", "bare"]);
    }

    #[test]
    fn graph_loads_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("physics.json");
        std::fs::write(&path, physics_graph_fixture().to_string()).unwrap();
        let graph = KnowledgeGraph::load("physics", &path).unwrap();
        assert!(graph.contains("bare"));
    }

    #[test]
    fn malformed_file_is_a_serialization_error() {
        let err = KnowledgeGraph::from_json_str("physics", "{\"nodes\": 3}").unwrap_err();
        assert!(matches!(err, crate::graph::GraphError::Serialization(_)));
    }
}
