//! Backend-neutral mixed-integer linear model.

use serde::Serialize;

/// Handle of a model variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct VarId(usize);

impl VarId {
    /// Column index of the variable.
    pub fn index(self) -> usize {
        self.0
    }
}

/// Domain of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum VarKind {
    Binary,
    Continuous { lower: f64, upper: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VarDef {
    pub name: String,
    pub kind: VarKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sense {
    Le,
    Ge,
    Eq,
}

/// `Σ coef·var (sense) rhs`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LinearConstraint {
    pub terms: Vec<(VarId, f64)>,
    pub sense: Sense,
    pub rhs: f64,
}

impl LinearConstraint {
    /// Left-hand side at the given assignment.
    pub fn lhs(&self, values: &[f64]) -> f64 {
        self.terms.iter().map(|&(v, c)| c * values[v.0]).sum()
    }

    /// Whether `values` satisfy the constraint within `tol`.
    pub fn is_satisfied(&self, values: &[f64], tol: f64) -> bool {
        let lhs = self.lhs(values);
        match self.sense {
            Sense::Le => lhs <= self.rhs + tol,
            Sense::Ge => lhs >= self.rhs - tol,
            Sense::Eq => (lhs - self.rhs).abs() <= tol,
        }
    }
}

/// Minimisation model: variables, linear constraints, linear objective.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MilpModel {
    vars: Vec<VarDef>,
    constraints: Vec<LinearConstraint>,
    objective: Vec<(VarId, f64)>,
}

impl MilpModel {
    /// Creates an empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a 0/1 variable.
    pub fn add_binary(&mut self, name: impl Into<String>) -> VarId {
        self.push_var(name.into(), VarKind::Binary)
    }

    /// Adds a continuous variable bounded by `[lower, upper]`.
    pub fn add_continuous(&mut self, name: impl Into<String>, lower: f64, upper: f64) -> VarId {
        self.push_var(name.into(), VarKind::Continuous { lower, upper })
    }

    fn push_var(&mut self, name: String, kind: VarKind) -> VarId {
        self.vars.push(VarDef { name, kind });
        VarId(self.vars.len() - 1)
    }

    /// Adds a constraint. Zero coefficients are dropped.
    pub fn add_constraint(&mut self, terms: Vec<(VarId, f64)>, sense: Sense, rhs: f64) {
        let terms = terms.into_iter().filter(|&(_, c)| c != 0.0).collect();
        self.constraints.push(LinearConstraint { terms, sense, rhs });
    }

    /// Adds `coef·var` to the objective.
    pub fn add_objective_term(&mut self, var: VarId, coef: f64) {
        if coef != 0.0 {
            self.objective.push((var, coef));
        }
    }

    /// Variables in column order.
    pub fn vars(&self) -> &[VarDef] {
        &self.vars
    }

    /// Constraints in insertion order.
    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    /// Objective terms to minimise.
    pub fn objective(&self) -> &[(VarId, f64)] {
        &self.objective
    }

    /// Number of variables.
    pub fn num_vars(&self) -> usize {
        self.vars.len()
    }

    /// Number of binary variables.
    pub fn num_binaries(&self) -> usize {
        self.vars
            .iter()
            .filter(|v| v.kind == VarKind::Binary)
            .count()
    }

    /// Objective at `values`.
    pub fn objective_value(&self, values: &[f64]) -> f64 {
        self.objective.iter().map(|&(v, c)| c * values[v.0]).sum()
    }

    /// Returns `true` if `values` respects every bound and constraint
    /// within `tol`.
    pub fn is_feasible(&self, values: &[f64], tol: f64) -> bool {
        values.len() == self.vars.len()
            && self.vars.iter().zip(values).all(|(def, &x)| match def.kind {
                VarKind::Binary => x.abs() <= tol || (x - 1.0).abs() <= tol,
                VarKind::Continuous { lower, upper } => x >= lower - tol && x <= upper + tol,
            })
            && self.constraints.iter().all(|c| c.is_satisfied(values, tol))
    }

    /// LP relaxation: every binary becomes continuous on `[0, 1]`.
    pub fn relaxed(&self) -> Self {
        let vars = self
            .vars
            .iter()
            .map(|v| VarDef {
                name: v.name.clone(),
                kind: match v.kind {
                    VarKind::Binary => VarKind::Continuous {
                        lower: 0.0,
                        upper: 1.0,
                    },
                    other => other,
                },
            })
            .collect();
        Self {
            vars,
            constraints: self.constraints.clone(),
            objective: self.objective.clone(),
        }
    }
}
