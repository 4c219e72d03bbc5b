//! MILP backends.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread;
use std::time::Duration;

use good_lp::{
    variable, Expression, ProblemVariables, ResolutionError, Solution as _, SolverModel, Variable,
};
use tracing::{debug, warn};

use super::model::{MilpModel, Sense, VarId, VarKind};
use crate::error::GvrpError;

/// Resource limits for one solve.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SolveBudget {
    /// Wall-clock limit. `None` waits for the backend to finish.
    pub time_limit: Option<Duration>,
}

/// Termination status reported by a backend.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MilpStatus {
    /// Proven optimal.
    Optimal,
    /// Incumbent found, optimality not proven.
    Feasible { best_bound: f64 },
    Infeasible,
    Unbounded,
    /// Time limit hit without an incumbent.
    TimedOut,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MilpResult {
    pub status: MilpStatus,
    /// Variable values indexed by [`VarId::index`], when an incumbent exists.
    pub values: Option<Vec<f64>>,
}

impl MilpResult {
    fn without_values(status: MilpStatus) -> Self {
        Self {
            status,
            values: None,
        }
    }
}

/// Solves a [`MilpModel`].
pub trait MilpBackend: Send + Sync {
    fn solve(&self, model: &MilpModel, budget: &SolveBudget) -> Result<MilpResult, GvrpError>;
}

/// Pure-Rust branch and bound through `good_lp`'s microlp solver.
///
/// microlp has no native time limit, so a bounded solve runs on a worker
/// thread. On timeout the worker is left to finish in the background and
/// its result is discarded; it keeps one core busy until microlp returns,
/// with no upper bound. An unbounded budget solves on the calling thread
/// and never leaves a worker behind.
///
/// # Examples
///
/// ```
/// use u_gvrp::exact::{MicroLpBackend, MilpBackend, MilpModel, MilpStatus, Sense, SolveBudget};
///
/// let mut model = MilpModel::new();
/// let x = model.add_binary("x");
/// let y = model.add_binary("y");
/// model.add_constraint(vec![(x, 1.0), (y, 1.0)], Sense::Ge, 1.0);
/// model.add_objective_term(x, 2.0);
/// model.add_objective_term(y, 3.0);
///
/// let result = MicroLpBackend
///     .solve(&model, &SolveBudget { time_limit: None })
///     .unwrap();
/// assert_eq!(result.status, MilpStatus::Optimal);
/// let values = result.values.unwrap();
/// assert!((model.objective_value(&values) - 2.0).abs() < 1e-6);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct MicroLpBackend;

impl MilpBackend for MicroLpBackend {
    fn solve(&self, model: &MilpModel, budget: &SolveBudget) -> Result<MilpResult, GvrpError> {
        debug!(
            vars = model.num_vars(),
            binaries = model.num_binaries(),
            constraints = model.constraints().len(),
            "Solving MILP with microlp"
        );
        let Some(limit) = budget.time_limit else {
            return solve_microlp(model);
        };

        let (tx, rx) = mpsc::channel();
        let owned = model.clone();
        thread::Builder::new()
            .name("u-gvrp-microlp".into())
            .spawn(move || {
                // The receiver is gone after a timeout.
                let _ = tx.send(solve_microlp(&owned));
            })
            .map_err(|e| GvrpError::Backend(format!("failed to spawn solver thread: {e}")))?;

        match rx.recv_timeout(limit) {
            Ok(result) => result,
            Err(RecvTimeoutError::Timeout) => {
                warn!(?limit, "MILP time limit reached");
                Ok(MilpResult::without_values(MilpStatus::TimedOut))
            }
            Err(RecvTimeoutError::Disconnected) => {
                Err(GvrpError::Backend("solver thread terminated without a result".into()))
            }
        }
    }
}

fn solve_microlp(model: &MilpModel) -> Result<MilpResult, GvrpError> {
    let mut vars = ProblemVariables::new();
    let handles: Vec<Variable> = model
        .vars()
        .iter()
        .map(|def| match def.kind {
            VarKind::Binary => vars.add(variable().binary()),
            VarKind::Continuous { lower, upper } => vars.add(variable().min(lower).max(upper)),
        })
        .collect();

    let mut problem = vars
        .minimise(expression(&handles, model.objective()))
        .using(good_lp::microlp);
    for c in model.constraints() {
        let lhs = expression(&handles, &c.terms);
        let constraint = match c.sense {
            Sense::Le => lhs.leq(c.rhs),
            Sense::Ge => lhs.geq(c.rhs),
            Sense::Eq => lhs.eq(c.rhs),
        };
        problem = problem.with(constraint);
    }

    match problem.solve() {
        Ok(solution) => Ok(MilpResult {
            status: MilpStatus::Optimal,
            values: Some(handles.iter().map(|&v| solution.value(v)).collect()),
        }),
        Err(ResolutionError::Infeasible) => Ok(MilpResult::without_values(MilpStatus::Infeasible)),
        Err(ResolutionError::Unbounded) => Ok(MilpResult::without_values(MilpStatus::Unbounded)),
        Err(e) => Err(GvrpError::Backend(e.to_string())),
    }
}

fn expression(handles: &[Variable], terms: &[(VarId, f64)]) -> Expression {
    let mut expr = Expression::with_capacity(terms.len());
    for &(var, coef) in terms {
        expr.add_mul(coef, handles[var.index()]);
    }
    expr
}
