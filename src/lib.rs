//! camml_node — node-local CPT and logit learners with MML costing.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers and, behind the `python-bindings`
//! feature, as the PyO3 bridge that exposes the learners to Python via the
//! `_camml_node` extension module.
//!
//! Given a discrete child variable and a candidate set of discrete parents,
//! a learner summarizes the rows into sufficient statistics, estimates
//! parameters, and returns a message length in nits that an outer
//! Bayesian-network structure search compares across parent sets.
//!
//! Key behaviors
//! -------------
//! - `data`: domains, validated node data, and the parent-state indexer.
//! - `leaf`: cell learners a CPT delegates to.
//! - `cpt`: exact conditional probability tables.
//! - `logit`: multinomial logistic regression with a Newton-Raphson fit.
//! - `learner`: the shared contract, errors, and the configuration factory.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every learner operation is a pure function of its inputs; learners hold
//!   only immutable options and can be shared across threads.
//! - Failures are values (`DataError`, `LearnerError`), never panics on
//!   well-formed calls.
//!
//! Conventions
//! -----------
//! - Costs and log-probabilities use natural logarithms (nits).
//! - Python-exposed classes live under `_camml_node.learners`; errors are
//!   raised as `ValueError`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; end-to-end scenarios are in
//!   `tests/integration_node_learners.rs`.

pub mod cpt;
pub mod data;
pub mod leaf;
pub mod learner;
pub mod logit;
pub mod utils;

#[cfg(feature = "python-bindings")]
use pyo3::{prelude::*, types::PyAny};

#[cfg(feature = "python-bindings")]
use crate::{
    cpt::CptOptions,
    learner::{
        factory::{LearnerConfig, build_learner},
        traits::NodeCoster,
    },
    logit::{DEFAULT_LOGIT_MAX_CELLS, LogitOptions},
    utils::{build_node_data, parse_leaf_config},
};

/// NodeLearner — Python-facing wrapper for a configured node learner.
///
/// Purpose
/// -------
/// Build a CPT or logit learner from Python arguments and score child data
/// against a parent set.
///
/// Parameters
/// ----------
/// Constructed from Python via factory-style constructors:
/// - `NodeLearner.cpt(leaf="mml_adaptive", max_cells=64000, normal=None)`
///   CPT over the named leaf learner; `max_cells=None` disables the cap and
///   `normal=(precision, mu_range, sigma_range)` configures the normal leaf.
/// - `NodeLearner.logit(prior_sd=3.0, param_cap=15.0, max_arity=20,
///   max_cells=65000)`
///   Logit learner.
///
/// Notes
/// -----
/// - `cost` releases the GIL while the fit runs.
#[cfg(feature = "python-bindings")]
#[pyclass(module = "camml_node.learners", frozen)]
pub struct NodeLearner {
    inner: Box<dyn NodeCoster>,
    config: LearnerConfig,
}

#[cfg(feature = "python-bindings")]
#[pymethods]
impl NodeLearner {
    #[staticmethod]
    #[pyo3(signature = (leaf = "mml_adaptive", max_cells = Some(cpt::DEFAULT_MAX_CELLS), normal = None))]
    pub fn cpt(
        leaf: &str, max_cells: Option<u64>, normal: Option<(f64, f64, f64)>,
    ) -> PyResult<NodeLearner> {
        let config = LearnerConfig::Cpt {
            options: CptOptions::new(max_cells)?,
            leaf: parse_leaf_config(leaf, normal)?,
        };
        Ok(NodeLearner { inner: build_learner(&config)?, config })
    }

    #[staticmethod]
    #[pyo3(signature = (prior_sd = 3.0, param_cap = 15.0, max_arity = 20, max_cells = DEFAULT_LOGIT_MAX_CELLS))]
    pub fn logit(
        prior_sd: f64, param_cap: f64, max_arity: usize, max_cells: u64,
    ) -> PyResult<NodeLearner> {
        let config =
            LearnerConfig::Logit(LogitOptions::new(prior_sd, param_cap, max_arity, max_cells)?);
        Ok(NodeLearner { inner: build_learner(&config)?, config })
    }

    /// Message length in nits of `child` given `parents`.
    ///
    /// `parents` is a `[rows, parents]` integer matrix (or `None`), and the
    /// bounds are inclusive `(lwb, upb)` pairs.
    #[pyo3(signature = (child, child_bounds, parents = None, parent_bounds = Vec::new()))]
    pub fn cost<'py>(
        &self, py: Python<'py>, child: &Bound<'py, PyAny>, child_bounds: (i32, i32),
        parents: Option<&Bound<'py, PyAny>>, parent_bounds: Vec<(i32, i32)>,
    ) -> PyResult<f64> {
        let data = build_node_data(child, parents, child_bounds, parent_bounds)?;
        let inner = &self.inner;
        let cost = py.allow_threads(|| inner.node_cost(&data))?;
        Ok(cost)
    }

    #[getter]
    pub fn name(&self) -> &'static str {
        self.inner.name()
    }

    fn __repr__(&self) -> String {
        format!("NodeLearner({:?})", self.config)
    }
}

#[cfg(feature = "python-bindings")]
#[pymodule]
fn _camml_node<'py>(py: Python<'py>, m: &Bound<'py, PyModule>) -> PyResult<()> {
    let learners_mod = PyModule::new(py, "learners")?;
    learners(py, m, &learners_mod)?;

    // Manually add submodules into sys.modules to allow for dot notation.
    py.import("sys")?.getattr("modules")?.set_item("camml_node.learners", learners_mod)?;
    Ok(())
}

#[cfg(feature = "python-bindings")]
fn learners<'py>(
    _py: Python, camml_node: &Bound<'py, PyModule>, m: &Bound<'py, PyModule>,
) -> PyResult<()> {
    m.add_class::<NodeLearner>()?;
    camml_node.add_submodule(m)?;
    Ok(())
}
