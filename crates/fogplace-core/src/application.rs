//! Application graphs: modules, tuple-carrying edges, selectivity
//! mappings, and QoS loops.

use serde::{Deserialize, Serialize};

use crate::id::AppId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// `source` is a sensor tuple type, `destination` a module.
    Sensor,
    /// `source` is a module, `destination` an actuator type.
    Actuator,
    Module,
}

/// Emission of `output` tuples by a module for each received `input`
/// tuple, at the given fractional selectivity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TupleMapping {
    pub input: String,
    pub output: String,
    pub fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppModule {
    pub name: String,
    pub ram: f64,
    pub storage: f64,
    /// Must run on the application's own client device.
    #[serde(default)]
    pub is_client: bool,
    /// Shared by every application declaring a global module of this name.
    #[serde(default)]
    pub is_global: bool,
    /// Overrides `OptimizerConfig::default_migration_deadline`.
    #[serde(default)]
    pub migration_deadline: Option<f64>,
    #[serde(default)]
    pub selectivity: Vec<TupleMapping>,
}

impl AppModule {
    pub fn new(name: impl Into<String>, ram: f64, storage: f64) -> Self {
        Self {
            name: name.into(),
            ram,
            storage,
            is_client: false,
            is_global: false,
            migration_deadline: None,
            selectivity: Vec::new(),
        }
    }

    pub fn client(mut self) -> Self {
        self.is_client = true;
        self
    }

    pub fn global(mut self) -> Self {
        self.is_global = true;
        self
    }

    pub fn with_migration_deadline(mut self, seconds: f64) -> Self {
        self.migration_deadline = Some(seconds);
        self
    }

    pub fn map(mut self, input: &str, output: &str, fraction: f64) -> Self {
        self.selectivity.push(TupleMapping {
            input: input.to_string(),
            output: output.to_string(),
            fraction,
        });
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppEdge {
    pub source: String,
    pub destination: String,
    pub tuple_type: String,
    pub tuple_cpu_length: f64,
    pub tuple_nw_length: f64,
    /// Emission period for edges fired on a timer rather than by an input.
    #[serde(default)]
    pub periodicity: Option<f64>,
    pub kind: EdgeKind,
}

impl AppEdge {
    pub fn new(
        kind: EdgeKind,
        source: &str,
        destination: &str,
        tuple_type: &str,
        tuple_cpu_length: f64,
        tuple_nw_length: f64,
    ) -> Self {
        Self {
            source: source.to_string(),
            destination: destination.to_string(),
            tuple_type: tuple_type.to_string(),
            tuple_cpu_length,
            tuple_nw_length,
            periodicity: None,
            kind,
        }
    }

    pub fn periodic(mut self, seconds: f64) -> Self {
        self.periodicity = Some(seconds);
        self
    }
}

/// End-to-end chain of modules with a latency deadline. Entries name a
/// module, a sensor or actuator, or a sensor tuple type / actuator type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppLoop {
    pub modules: Vec<String>,
    pub deadline: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Application {
    pub id: AppId,
    pub modules: Vec<AppModule>,
    pub edges: Vec<AppEdge>,
    #[serde(default)]
    pub loops: Vec<AppLoop>,
}

impl Application {
    pub fn new(id: u64) -> Self {
        Self {
            id: AppId::new(id),
            modules: Vec::new(),
            edges: Vec::new(),
            loops: Vec::new(),
        }
    }

    pub fn with_module(mut self, module: AppModule) -> Self {
        self.modules.push(module);
        self
    }

    pub fn with_edge(mut self, edge: AppEdge) -> Self {
        self.edges.push(edge);
        self
    }

    pub fn with_loop(mut self, modules: &[&str], deadline: f64) -> Self {
        self.loops.push(AppLoop {
            modules: modules.iter().map(|s| s.to_string()).collect(),
            deadline,
        });
        self
    }

    pub fn module(&self, name: &str) -> Option<&AppModule> {
        self.modules.iter().find(|m| m.name == name)
    }

    /// Sensor tuple types consumed by this application.
    pub fn sensor_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Sensor)
            .map(|e| e.source.as_str())
    }

    /// Actuator types fed by this application.
    pub fn actuator_types(&self) -> impl Iterator<Item = &str> + '_ {
        self.edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Actuator)
            .map(|e| e.destination.as_str())
    }
}
