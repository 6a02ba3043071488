//! YAML case files.

use pd_chem::{ChemError, CompositionMap, Element};
use pd_core::units::{gpa, kelvin};
use pd_core::{PdError, ensure_finite, ensure_positive};
use pd_partition::{
    ElementPartitionModel, PartitionCoefficients, PartitionConditions, PartitionError,
    PartitionTables,
};
use pd_solver::{SolveRequest, SolverConfig, SolverError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid case: {0}")]
    Invalid(#[from] PdError),

    #[error("Composition error: {0}")]
    Chem(#[from] ChemError),

    #[error("Partition tables: {0}")]
    Partition(#[from] PartitionError),

    #[error("Solver error: {0}")]
    Solver(#[from] SolverError),
}

pub type CliResult<T> = Result<T, CliError>;

/// One planetary body to equilibrate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Case {
    #[serde(default)]
    pub name: String,
    pub pressure_gpa: f64,
    pub fo2: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature_k: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbot: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_core_fraction: Option<f64>,
    /// Number abundances; normalised on load.
    pub bulk: BTreeMap<Element, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed_coefficients: Option<PartitionCoefficients>,
    #[serde(default)]
    pub solver: SolverConfig,
    /// Partition tables, relative to the case file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tables: Option<PathBuf>,
    #[serde(default)]
    pub alternative_interactions: bool,
}

impl Case {
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut case = Self::from_yaml_str(&content)?;
        if let (Some(tables), Some(dir)) = (&case.tables, path.parent()) {
            if tables.is_relative() {
                case.tables = Some(dir.join(tables));
            }
        }
        Ok(case)
    }

    pub fn from_yaml_str(content: &str) -> CliResult<Self> {
        let case: Case = serde_yaml::from_str(content)?;
        case.validate()?;
        Ok(case)
    }

    /// Checks the solver core leaves to its caller.
    pub fn validate(&self) -> CliResult<()> {
        ensure_positive(self.pressure_gpa, "pressure_gpa")?;
        ensure_finite(self.fo2, "fo2")?;
        if let Some(t) = self.temperature_k {
            ensure_positive(t, "temperature_k")?;
        }
        if let Some(nbot) = self.nbot {
            ensure_finite(nbot, "nbot")?;
        }
        self.solver.validate()?;
        Ok(())
    }

    pub fn bulk_composition(&self) -> CliResult<CompositionMap> {
        Ok(CompositionMap::from_bulk(
            self.bulk.iter().map(|(e, x)| (*e, *x)),
        )?)
    }

    pub fn conditions(&self) -> PartitionConditions {
        let mut conditions = PartitionConditions::new(gpa(self.pressure_gpa), self.fo2);
        if let Some(t) = self.temperature_k {
            conditions = conditions.with_temperature(kelvin(t));
        }
        if let Some(nbot) = self.nbot {
            conditions = conditions.with_nbot(nbot);
        }
        conditions
    }

    pub fn model(&self) -> CliResult<ElementPartitionModel> {
        let tables = match &self.tables {
            Some(path) => PartitionTables::load_yaml(path)?,
            None => PartitionTables::builtin()?,
        };
        Ok(ElementPartitionModel::new(tables)?
            .with_alternative_interactions(self.alternative_interactions))
    }

    pub fn request<'a>(&self, bulk: &'a CompositionMap, keep_history: bool) -> SolveRequest<'a> {
        let mut request = SolveRequest::new(bulk, gpa(self.pressure_gpa), self.fo2);
        request.conditions = self.conditions();
        request.initial_core_fraction = self.initial_core_fraction;
        request.seed_coefficients = self.seed_coefficients.clone();
        request.keep_history = keep_history;
        request
    }
}
