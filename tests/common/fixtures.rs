//! Small physics and math graphs shared across tests

use graphbridge::store::EdgeStore;
use graphbridge::{KnowledgeGraph, NodePairChatroom, Personas, ScriptedGenerator, TextGenerator};
use serde_json::{json, Value};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

/// Physics: v1 velocity - v2 acceleration - v3 force
pub fn physics_json() -> Value {
    json!({
        "nodes": [
            {
                "id": "v1",
                "label": "velocity",
                "properties": {
                    "description": "Rate of change of position with respect to time.",
                    "category": "kinematics",
                    "theme": "motion"
                }
            },
            {
                "id": "v2",
                "label": "acceleration",
                "properties": {
                    "description": "Rate of change of velocity with respect to time.",
                    "category": "kinematics",
                    "theme": "motion"
                }
            },
            {
                "id": "v3",
                "label": "force",
                "properties": {
                    "description": "Interaction that changes the motion of a body.",
                    "category": "dynamics",
                    "theme": "newton"
                }
            }
        ],
        "edges": [
            {"source": "v1", "target": "v2", "label": "derivative_of"},
            {"source": "v2", "target": "v3", "label": "caused_by"}
        ]
    })
}

/// Math: f1 function - f2 derivative - f3 integral
pub fn math_json() -> Value {
    json!({
        "nodes": [
            {
                "id": "f1",
                "label": "function",
                "properties": {
                    "description": "A mapping that assigns each input exactly one output.",
                    "category": "analysis",
                    "theme": "calculus"
                }
            },
            {
                "id": "f2",
                "label": "derivative",
                "properties": {
                    "description": "Instantaneous rate of change of a function.",
                    "category": "analysis",
                    "theme": "calculus"
                }
            },
            {
                "id": "f3",
                "label": "integral",
                "properties": {
                    "description": "Accumulated area under the graph of a function.",
                    "category": "analysis",
                    "theme": "calculus"
                }
            }
        ],
        "edges": [
            {"source": "f1", "target": "f2", "label": "differentiated_into"},
            {"source": "f2", "target": "f3", "label": "inverse_of"}
        ]
    })
}

pub fn physics_graph() -> Arc<KnowledgeGraph> {
    Arc::new(KnowledgeGraph::from_json_str("physics", &physics_json().to_string()).unwrap())
}

pub fn math_graph() -> Arc<KnowledgeGraph> {
    Arc::new(KnowledgeGraph::from_json_str("math", &math_json().to_string()).unwrap())
}

/// Write both graphs into `dir`, returning (physics path, math path).
pub fn write_graph_files(dir: &Path) -> (PathBuf, PathBuf) {
    let physics = dir.join("physics.json");
    let math = dir.join("math.json");
    std::fs::write(&physics, physics_json().to_string()).unwrap();
    std::fs::write(&math, math_json().to_string()).unwrap();
    (physics, math)
}

/// A chatroom over the fixture graphs with its edge file in a temp dir
pub struct Fixture {
    pub dir: TempDir,
    pub generator: Arc<ScriptedGenerator>,
    pub chatroom: NodePairChatroom,
}

impl Fixture {
    pub fn new(generator: ScriptedGenerator) -> Self {
        let generator = Arc::new(generator);
        let (dir, chatroom) = open_chatroom(generator.clone());
        Self {
            dir,
            generator,
            chatroom,
        }
    }

    /// A fixture over another generator; `generator` is left unscripted.
    pub fn with_generator(generator: Arc<dyn TextGenerator>) -> Self {
        let (dir, chatroom) = open_chatroom(generator);
        Self {
            dir,
            generator: Arc::new(ScriptedGenerator::new()),
            chatroom,
        }
    }

    pub fn progress_path(&self) -> PathBuf {
        self.dir.path().join("output").join("progress.json")
    }
}

fn open_chatroom(generator: Arc<dyn TextGenerator>) -> (TempDir, NodePairChatroom) {
    let dir = tempfile::tempdir().unwrap();
    let (physics_path, math_path) = write_graph_files(dir.path());
    let chatroom = NodePairChatroom::new(
        generator,
        Arc::new(KnowledgeGraph::load("physics", &physics_path).unwrap()),
        Arc::new(KnowledgeGraph::load("math", &math_path).unwrap()),
        EdgeStore::new(dir.path().join("output").join("cross_domain_edges.json")),
        Personas::default(),
    );
    chatroom
        .initialize_store(
            &physics_path.display().to_string(),
            &math_path.display().to_string(),
        )
        .unwrap();
    (dir, chatroom)
}
