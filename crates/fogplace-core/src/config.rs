//! Optimizer configuration that downstream crates can serialize/deserialize.
//!
//! Ceilings, tolerance and objective ordering are policy: they are inputs
//! to the constraint checker, cost evaluator and comparator, never
//! constants baked into them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Components of the cost vector, in storage order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Objective {
    Qos,
    Power,
    Processing,
    Bandwidth,
    Migration,
}

impl Objective {
    pub const COUNT: usize = 5;

    pub const ALL: [Objective; Objective::COUNT] = [
        Objective::Qos,
        Objective::Power,
        Objective::Processing,
        Objective::Bandwidth,
        Objective::Migration,
    ];

    pub const fn index(self) -> usize {
        self as usize
    }

    fn env_key(self) -> &'static str {
        match self {
            Objective::Qos => "QOS",
            Objective::Power => "POWER",
            Objective::Processing => "PROCESSING",
            Objective::Bandwidth => "BANDWIDTH",
            Objective::Migration => "MIGRATION",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Objective::ALL
            .into_iter()
            .find(|o| o.env_key().eq_ignore_ascii_case(s.trim()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ObjectiveWeights {
    pub qos: f64,
    pub power: f64,
    pub processing: f64,
    pub bandwidth: f64,
    pub migration: f64,
}

impl Default for ObjectiveWeights {
    fn default() -> Self {
        Self {
            qos: 1.0,
            power: 1.0,
            processing: 1.0,
            bandwidth: 1.0,
            migration: 1.0,
        }
    }
}

impl ObjectiveWeights {
    pub fn get(&self, objective: Objective) -> f64 {
        match objective {
            Objective::Qos => self.qos,
            Objective::Power => self.power,
            Objective::Processing => self.processing,
            Objective::Bandwidth => self.bandwidth,
            Objective::Migration => self.migration,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizerConfig {
    /// Fraction of node MIPS usable by placed modules.
    pub mips_ceiling: f64,
    pub ram_ceiling: f64,
    pub storage_ceiling: f64,
    /// Fraction of link bandwidth usable by tuple traffic.
    pub bandwidth_ceiling: f64,

    /// Fraction of link bandwidth available to module migration.
    pub migration_bandwidth_share: f64,

    /// Fixed VM setup time added to any migration that moves (seconds).
    pub vm_setup_time: f64,

    /// Used for modules without their own migration deadline (seconds).
    pub default_migration_deadline: f64,

    /// Relative tolerance within which two objective values tie.
    pub tolerance: f64,

    /// Objective comparison order, highest priority first.
    pub priorities: Vec<Objective>,

    pub weights: ObjectiveWeights,

    /// Optional seed for the random candidate generator.
    pub seed: Option<u64>,

    /// Caller-imposed cap on evaluated leaves; `None` searches exhaustively.
    pub max_iterations: Option<u64>,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            mips_ceiling: 0.9,
            ram_ceiling: 0.9,
            storage_ceiling: 0.9,
            bandwidth_ceiling: 0.9,
            migration_bandwidth_share: 0.2,
            vm_setup_time: 0.5,
            default_migration_deadline: 10.0,
            tolerance: 0.05,
            priorities: Objective::ALL.to_vec(),
            weights: ObjectiveWeights::default(),
            seed: None,
            max_iterations: None,
        }
    }
}

impl OptimizerConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `FOGPLACE_MIPS_CEILING`, `FOGPLACE_RAM_CEILING`,
    ///   `FOGPLACE_STORAGE_CEILING`, `FOGPLACE_BW_CEILING`: utilization ceilings
    /// - `FOGPLACE_MIGRATION_BW_SHARE`: migration bandwidth share
    /// - `FOGPLACE_VM_SETUP_TIME`: VM setup seconds
    /// - `FOGPLACE_MIGRATION_DEADLINE`: default migration deadline
    /// - `FOGPLACE_TOLERANCE`: comparator tolerance
    /// - `FOGPLACE_PRIORITIES`: comma-separated objectives, e.g. `qos,power`
    /// - `FOGPLACE_SEED`: generator seed
    /// - `FOGPLACE_MAX_ITERATIONS`: search leaf cap
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        fn f64_var(key: &str, slot: &mut f64) {
            if let Ok(s) = std::env::var(key) {
                if let Ok(v) = s.parse::<f64>() {
                    *slot = v;
                }
            }
        }

        f64_var("FOGPLACE_MIPS_CEILING", &mut cfg.mips_ceiling);
        f64_var("FOGPLACE_RAM_CEILING", &mut cfg.ram_ceiling);
        f64_var("FOGPLACE_STORAGE_CEILING", &mut cfg.storage_ceiling);
        f64_var("FOGPLACE_BW_CEILING", &mut cfg.bandwidth_ceiling);
        f64_var("FOGPLACE_MIGRATION_BW_SHARE", &mut cfg.migration_bandwidth_share);
        f64_var("FOGPLACE_VM_SETUP_TIME", &mut cfg.vm_setup_time);
        f64_var("FOGPLACE_MIGRATION_DEADLINE", &mut cfg.default_migration_deadline);
        f64_var("FOGPLACE_TOLERANCE", &mut cfg.tolerance);

        if let Ok(s) = std::env::var("FOGPLACE_PRIORITIES") {
            let parsed: Option<Vec<Objective>> = s.split(',').map(Objective::parse).collect();
            if let Some(p) = parsed {
                cfg.priorities = p;
            }
        }

        if let Ok(s) = std::env::var("FOGPLACE_SEED") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.seed = Some(v);
            }
        }

        if let Ok(s) = std::env::var("FOGPLACE_MAX_ITERATIONS") {
            if let Ok(v) = s.parse::<u64>() {
                cfg.max_iterations = Some(v);
            }
        }

        cfg
    }

    /// Parse a YAML policy document; missing keys keep their defaults.
    ///
    /// ```yaml
    /// mips_ceiling: 0.7
    /// tolerance: 0.1
    /// priorities: [qos, bandwidth, power]
    /// ```
    pub fn from_yaml_str(doc: &str) -> Result<Self> {
        let cfg: Self = serde_yaml::from_str(doc)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        let ceilings = [
            ("mips_ceiling", self.mips_ceiling),
            ("ram_ceiling", self.ram_ceiling),
            ("storage_ceiling", self.storage_ceiling),
            ("bandwidth_ceiling", self.bandwidth_ceiling),
            ("migration_bandwidth_share", self.migration_bandwidth_share),
        ];
        for (name, v) in ceilings {
            if !(v > 0.0 && v <= 1.0) {
                return Err(Error::Config(format!("{name} must be in (0, 1], got {v}")));
            }
        }
        if !(self.tolerance >= 0.0 && self.tolerance.is_finite()) {
            return Err(Error::Config(format!(
                "tolerance must be finite and non-negative, got {}",
                self.tolerance
            )));
        }
        if self.vm_setup_time < 0.0 || self.default_migration_deadline < 0.0 {
            return Err(Error::Config("migration timings must be non-negative".into()));
        }
        for o in Objective::ALL {
            let w = self.weights.get(o);
            if !(w > 0.0 && w.is_finite()) {
                return Err(Error::Config(format!("weight for {o:?} must be positive, got {w}")));
            }
        }
        let mut seen = [false; Objective::COUNT];
        for o in &self.priorities {
            if std::mem::replace(&mut seen[o.index()], true) {
                return Err(Error::Config(format!("objective {o:?} listed twice in priorities")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        OptimizerConfig::default().validate().unwrap();
    }

    #[test]
    fn yaml_overrides_keep_defaults() {
        let cfg = OptimizerConfig::from_yaml_str(
            "mips_ceiling: 0.7\npriorities: [qos, bandwidth]\nseed: 7\n",
        )
        .unwrap();
        assert_eq!(cfg.mips_ceiling, 0.7);
        assert_eq!(cfg.ram_ceiling, 0.9);
        assert_eq!(cfg.priorities, vec![Objective::Qos, Objective::Bandwidth]);
        assert_eq!(cfg.seed, Some(7));
    }

    #[test]
    fn invalid_documents_are_rejected() {
        assert!(OptimizerConfig::from_yaml_str("mips_ceiling: 1.5\n").is_err());
        assert!(OptimizerConfig::from_yaml_str("priorities: [qos, qos]\n").is_err());
        assert!(OptimizerConfig::from_yaml_str("tolerance: -0.1\n").is_err());
        assert!(OptimizerConfig::from_yaml_str("mips_ceiling: [1\n").is_err());
    }

    #[test]
    fn objective_names_parse_case_insensitively() {
        assert_eq!(Objective::parse(" Bandwidth"), Some(Objective::Bandwidth));
        assert_eq!(Objective::parse("latency"), None);
    }
}
