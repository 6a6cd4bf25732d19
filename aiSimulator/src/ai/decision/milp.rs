//! Mixed-integer linear programming behind a single-capability trait.
//!
//! Decision models describe their problem as a solver-independent
//! [`MilpModel`]; any [`MilpSolver`] turns it into variable values. The
//! default backend is `good_lp` driving the pure-Rust `microlp`
//! branch-and-bound solver.

use good_lp::{constraint, variable, Expression, ProblemVariables, ResolutionError, Solution, SolverModel, Variable};
use thiserror::Error;

pub type VarId = usize;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VariableKind {
    Binary,
    Continuous { lower: f64, upper: Option<f64> },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintSense {
    LessEqual,
    GreaterEqual,
    Equal,
}

/// `constant + Σ coefficient · variable`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinearExpr {
    pub terms: Vec<(VarId, f64)>,
    pub constant: f64,
}

impl LinearExpr {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn constant(value: f64) -> Self {
        Self { terms: Vec::new(), constant: value }
    }

    pub fn add_term(&mut self, var: VarId, coefficient: f64) -> &mut Self {
        if coefficient != 0.0 {
            self.terms.push((var, coefficient));
        }
        self
    }

    pub fn add_constant(&mut self, value: f64) -> &mut Self {
        self.constant += value;
        self
    }

    pub fn evaluate(&self, values: &[f64]) -> f64 {
        self.terms
            .iter()
            .map(|&(var, coefficient)| coefficient * values.get(var).copied().unwrap_or(0.0))
            .sum::<f64>()
            + self.constant
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LinearConstraint {
    pub expr: LinearExpr,
    pub sense: ConstraintSense,
    pub rhs: f64,
}

/// A minimisation problem over binary and continuous variables.
#[derive(Debug, Clone, Default)]
pub struct MilpModel {
    variables: Vec<VariableKind>,
    constraints: Vec<LinearConstraint>,
    objective: LinearExpr,
}

impl MilpModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_binary(&mut self) -> VarId {
        self.variables.push(VariableKind::Binary);
        self.variables.len() - 1
    }

    pub fn add_continuous(&mut self, lower: f64, upper: Option<f64>) -> VarId {
        self.variables.push(VariableKind::Continuous { lower, upper });
        self.variables.len() - 1
    }

    pub fn add_constraint(&mut self, expr: LinearExpr, sense: ConstraintSense, rhs: f64) {
        self.constraints.push(LinearConstraint { expr, sense, rhs });
    }

    pub fn set_objective(&mut self, objective: LinearExpr) {
        self.objective = objective;
    }

    pub fn variables(&self) -> &[VariableKind] {
        &self.variables
    }

    pub fn constraints(&self) -> &[LinearConstraint] {
        &self.constraints
    }

    pub fn objective(&self) -> &LinearExpr {
        &self.objective
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SolverError {
    #[error("model is infeasible")]
    Infeasible,
    #[error("model is unbounded")]
    Unbounded,
    #[error("solver backend failed: {0}")]
    Backend(String),
}

impl From<ResolutionError> for SolverError {
    fn from(error: ResolutionError) -> Self {
        match error {
            ResolutionError::Infeasible => SolverError::Infeasible,
            ResolutionError::Unbounded => SolverError::Unbounded,
            other => SolverError::Backend(other.to_string()),
        }
    }
}

pub trait MilpSolver {
    /// Returns one value per model variable, in declaration order.
    fn solve(&self, model: &MilpModel) -> Result<Vec<f64>, SolverError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct GoodLpSolver;

fn to_expression(expr: &LinearExpr, handles: &[Variable]) -> Expression {
    let mut expression = Expression::from(expr.constant);
    for &(var, coefficient) in &expr.terms {
        expression += coefficient * handles[var];
    }
    expression
}

impl MilpSolver for GoodLpSolver {
    fn solve(&self, model: &MilpModel) -> Result<Vec<f64>, SolverError> {
        let mut vars = ProblemVariables::new();
        let handles: Vec<Variable> = model
            .variables()
            .iter()
            .map(|kind| match *kind {
                VariableKind::Binary => vars.add(variable().binary()),
                VariableKind::Continuous { lower, upper } => {
                    let definition = variable().min(lower);
                    match upper {
                        Some(upper) => vars.add(definition.max(upper)),
                        None => vars.add(definition),
                    }
                }
            })
            .collect();

        let referenced = model
            .constraints()
            .iter()
            .flat_map(|c| c.expr.terms.iter())
            .chain(model.objective().terms.iter());
        for &(var, _) in referenced {
            if var >= handles.len() {
                return Err(SolverError::Backend(format!("unknown variable index {}", var)));
            }
        }

        let objective = to_expression(model.objective(), &handles);
        let mut problem = vars.minimise(objective).using(good_lp::microlp);

        for c in model.constraints() {
            let lhs = to_expression(&c.expr, &handles);
            let rhs = c.rhs;
            problem = match c.sense {
                ConstraintSense::LessEqual => problem.with(constraint!(lhs <= rhs)),
                ConstraintSense::GreaterEqual => problem.with(constraint!(lhs >= rhs)),
                ConstraintSense::Equal => problem.with(constraint!(lhs == rhs)),
            };
        }

        let solution = problem.solve()?;
        Ok(handles.iter().map(|&handle| solution.value(handle)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_the_cheaper_binary() {
        // minimise 3a + 2b subject to a + b >= 1
        let mut model = MilpModel::new();
        let a = model.add_binary();
        let b = model.add_binary();
        let mut cover = LinearExpr::new();
        cover.add_term(a, 1.0).add_term(b, 1.0);
        model.add_constraint(cover, ConstraintSense::GreaterEqual, 1.0);
        let mut objective = LinearExpr::new();
        objective.add_term(a, 3.0).add_term(b, 2.0);
        model.set_objective(objective);

        let values = GoodLpSolver.solve(&model).unwrap();
        assert!(values[a] < 0.5);
        assert!(values[b] > 0.5);
        assert!((model.objective().evaluate(&values) - 2.0).abs() < 1e-6);
    }

    #[test]
    fn continuous_upper_bound_is_respected() {
        // maximise q (minimise -q) with q <= 5.5
        let mut model = MilpModel::new();
        let q = model.add_continuous(0.0, Some(5.5));
        let mut objective = LinearExpr::constant(1.0);
        objective.add_term(q, -1.0);
        model.set_objective(objective);

        let values = GoodLpSolver.solve(&model).unwrap();
        assert!((values[q] - 5.5).abs() < 1e-6);
        assert!((model.objective().evaluate(&values) + 4.5).abs() < 1e-6);
    }

    #[test]
    fn infeasible_model_is_reported() {
        let mut model = MilpModel::new();
        let x = model.add_binary();
        let mut expr = LinearExpr::new();
        expr.add_term(x, 1.0);
        model.add_constraint(expr, ConstraintSense::GreaterEqual, 2.0);
        let mut objective = LinearExpr::new();
        objective.add_term(x, 1.0);
        model.set_objective(objective);

        assert!(GoodLpSolver.solve(&model).is_err());
    }

    #[test]
    fn zero_coefficients_are_dropped() {
        let mut expr = LinearExpr::new();
        expr.add_term(0, 0.0).add_term(1, 2.0).add_constant(1.0);
        assert_eq!(expr.terms, vec![(1, 2.0)]);
        assert_eq!(expr.evaluate(&[9.0, 3.0]), 7.0);
    }
}
