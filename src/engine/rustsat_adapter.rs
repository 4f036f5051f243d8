//! Adapters for rustsat solver backends
//!
//! Wraps any rustsat-compatible solver behind [`SolverBackend`]. The
//! bundled default is `rustsat-batsat`.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use log::debug;

use super::{Assignment, Outcome, SolverBackend};
use crate::error::{ModelError, Result};

/// Adapter exposing a rustsat solver as a [`SolverBackend`]
pub struct RustSatAdapter<S> {
    solver: S,
    num_vars: u32,
    num_clauses: u32,
}

impl<S> RustSatAdapter<S> {
    /// Creates a new adapter wrapping the given solver
    pub fn new(solver: S) -> Self {
        Self {
            solver,
            num_vars: 0,
            num_clauses: 0,
        }
    }
}

/// The bundled batsat solver, wired for asynchronous interruption
///
/// `rustsat-batsat` does not expose batsat's interrupt callbacks through
/// [`rustsat::solvers::Interrupt`], so this wrapper runs the solver with
/// [`batsat::callbacks::AsyncInterrupt`] and hands out the handle itself.
#[derive(Default)]
pub struct BatsatSolver {
    inner: rustsat_batsat::Solver<batsat::callbacks::AsyncInterrupt>,
}

/// Thread safe handle that stops an in-flight [`BatsatSolver`] run
pub struct BatsatInterrupter {
    handle: batsat::callbacks::AsyncInterruptHandle,
}

impl rustsat::solvers::InterruptSolver for BatsatInterrupter {
    fn interrupt(&self) {
        self.handle.interrupt_async();
    }
}

impl rustsat::solvers::Interrupt for BatsatSolver {
    type Interrupter = BatsatInterrupter;

    fn interrupter(&mut self) -> BatsatInterrupter {
        BatsatInterrupter {
            handle: self.inner.batsat_ref().cb().get_handle(),
        }
    }
}

impl Extend<rustsat::types::Clause> for BatsatSolver {
    fn extend<T: IntoIterator<Item = rustsat::types::Clause>>(&mut self, iter: T) {
        self.inner.extend(iter);
    }
}

impl<'a> Extend<&'a rustsat::types::Clause> for BatsatSolver {
    fn extend<T: IntoIterator<Item = &'a rustsat::types::Clause>>(&mut self, iter: T) {
        self.inner.extend(iter);
    }
}

impl rustsat::solvers::Solve for BatsatSolver {
    fn signature(&self) -> &'static str {
        self.inner.signature()
    }

    fn solve(&mut self) -> anyhow::Result<rustsat::solvers::SolverResult> {
        self.inner.solve()
    }

    fn lit_val(&self, lit: rustsat::types::Lit) -> anyhow::Result<rustsat::types::TernaryVal> {
        self.inner.lit_val(lit)
    }

    fn add_clause_ref<C>(&mut self, clause: &C) -> anyhow::Result<()>
    where
        C: AsRef<rustsat::types::Cl> + ?Sized,
    {
        self.inner.add_clause_ref(clause)
    }

    fn reserve(&mut self, max_var: rustsat::types::Var) -> anyhow::Result<()> {
        self.inner.reserve(max_var)
    }
}

/// Returns the bundled default backend
pub fn default_backend() -> RustSatAdapter<BatsatSolver> {
    RustSatAdapter::new(BatsatSolver::default())
}

impl<S> SolverBackend for RustSatAdapter<S>
where
    S: rustsat::solvers::Solve + rustsat::solvers::Interrupt,
{
    fn add_variables(&mut self, num_vars: u32) {
        // rustsat creates variables lazily as clauses arrive; only the
        // count is tracked here
        self.num_vars += num_vars;
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        use rustsat::types::{Clause, Lit, Var};

        let lits_vec: Vec<Lit> = lits
            .iter()
            .map(|&lit| {
                let var = Var::new((lit.unsigned_abs() - 1) as u32);
                if lit > 0 {
                    var.pos_lit()
                } else {
                    var.neg_lit()
                }
            })
            .collect();

        let clause = Clause::from(&lits_vec[..]);
        self.num_clauses += 1;
        self.solver.add_clause(clause).is_ok()
    }

    fn propose(&mut self, timeout: Option<Duration>) -> Result<Outcome> {
        use rustsat::solvers::{Interrupt, InterruptSolver, SolverResult};
        use rustsat::types::{TernaryVal, Var};

        let result = match timeout {
            Some(limit) if limit.is_zero() => {
                // Budget already spent before the call started
                debug!("propose with exhausted budget, aborting");
                return Ok(Outcome::Aborted);
            }
            Some(limit) => {
                debug!("propose with timeout {:?}", limit);
                let interrupter = self.solver.interrupter();
                let (done_tx, done_rx) = mpsc::channel::<()>();
                let timer = thread::spawn(move || {
                    // Fires the interrupter unless solve() finishes first
                    if done_rx.recv_timeout(limit).is_err() {
                        interrupter.interrupt();
                    }
                });
                let result = self.solver.solve();
                let _ = done_tx.send(());
                let _ = timer.join();
                result
            }
            None => self.solver.solve(),
        };

        match result {
            Ok(SolverResult::Sat) => {
                let mut values = Vec::with_capacity(self.num_vars as usize);
                for var in 1..=self.num_vars {
                    let v = Var::new(var - 1);
                    let value = match self.solver.solution(v) {
                        Ok(assignment) => matches!(assignment.var_value(v), TernaryVal::True),
                        Err(_) => false,
                    };
                    values.push(value);
                }
                Ok(Outcome::Sat(Assignment::new(values)))
            }
            Ok(SolverResult::Unsat) => Ok(Outcome::Unsat),
            Ok(SolverResult::Interrupted) => Ok(Outcome::Aborted),
            Err(e) => Err(ModelError::SolverFailure(e.to_string())),
        }
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.num_clauses
    }
}
