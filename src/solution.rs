//! Solution state machine: solving, decoding, and instance enumeration
//!
//! A [`Solution`] owns one universe and the tuple-set valuation of every
//! declared relation, decoded from a backend assignment. Enumerating
//! further instances shares the backend session along the successor chain;
//! a blocking clause over the relation variables excludes each instance
//! already returned.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use log::{debug, trace};

use crate::engine::{rustsat_adapter, Assignment, Outcome, SolverBackend};
use crate::error::{ModelError, Result};
use crate::instance::{TupleSet, Universe};
use crate::problem::CompiledProblem;
use crate::schema::{RelationRef, SigGraph};

/// Settings consumed by the solution manager
///
/// `backend_opts` is passed through to the backend adapter opaquely; the
/// core never interprets it.
#[derive(Clone, Debug)]
pub struct Options {
    /// Log each decoded relation at trace level
    pub trace: bool,
    /// Wall-clock budget for each `solve`/`next` call
    pub timeout: Option<Duration>,
    /// Bit width the translation stage used for integer atoms
    pub bit_width: u32,
    /// Backend-specific options, passed through uninterpreted
    pub backend_opts: Vec<(String, String)>,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            trace: false,
            timeout: None,
            bit_width: 4,
            backend_opts: Vec::new(),
        }
    }
}

/// Where a solution is in its life cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    /// Created, not yet solved
    Unsolved,
    /// A satisfying instance has been decoded
    Solved,
    /// No (further) satisfying instance exists
    Exhausted,
    /// The backend reported an internal failure
    Failed,
}

/// Outcome of [`Solution::solve`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SolveStatus {
    /// An instance was found and decoded
    Sat,
    /// The formula is unsatisfiable; a valid outcome, not an error
    Unsat,
    /// The backend stopped before reaching an answer; the solution state is
    /// unchanged and the call may be retried
    Aborted,
}

/// Outcome of [`Solution::next`]
#[derive(Debug)]
pub enum NextOutcome {
    /// A further distinct instance, as a successor solution
    Sat(Solution),
    /// All distinct instances have been enumerated
    Exhausted,
    /// The backend stopped before reaching an answer
    Aborted,
}

type Session = Arc<Mutex<Box<dyn SolverBackend>>>;

/// One concrete satisfying instance of a compiled problem
///
/// Immutable once solved, apart from the state transition `next` performs.
/// Holding several solutions for read-only algebra queries is fine; the
/// enumeration itself is sequential through the shared session.
pub struct Solution {
    problem: Arc<CompiledProblem>,
    session: Session,
    options: Options,
    state: State,
    universe: Option<Universe>,
    relations: FxHashMap<RelationRef, TupleSet>,
    model: Option<Assignment>,
}

impl Solution {
    /// Creates an unsolved solution and loads the problem into the backend
    pub fn new(
        problem: Arc<CompiledProblem>,
        mut backend: Box<dyn SolverBackend>,
        options: Options,
    ) -> Self {
        for (key, value) in &options.backend_opts {
            backend.set_option(key, value);
        }
        backend.add_variables(problem.num_vars());
        for clause in problem.clauses() {
            backend.add_clause(clause);
        }
        debug!(
            "loaded problem: {} vars, {} clauses, {} atoms",
            problem.num_vars(),
            problem.clauses().len(),
            problem.atoms().len()
        );

        Self {
            problem,
            session: Arc::new(Mutex::new(backend)),
            options,
            state: State::Unsolved,
            universe: None,
            relations: FxHashMap::default(),
            model: None,
        }
    }

    /// Creates an unsolved solution over the bundled batsat backend
    pub fn with_default_backend(problem: Arc<CompiledProblem>, options: Options) -> Self {
        Self::new(
            problem,
            Box::new(rustsat_adapter::default_backend()),
            options,
        )
    }

    /// Returns the current life-cycle state
    pub fn state(&self) -> State {
        self.state
    }

    /// Returns the options this solution was created with
    pub fn options(&self) -> &Options {
        &self.options
    }

    /// Returns the signature graph the problem was compiled against
    pub fn sig_graph(&self) -> &Arc<SigGraph> {
        self.problem.graph()
    }

    /// Asks the backend for a first satisfying instance
    ///
    /// `Sat` transitions to `Solved` and decodes a fresh universe plus a
    /// tuple set for every declared relation. `Unsat` transitions to
    /// `Exhausted`. `Aborted` leaves the state unchanged.
    ///
    /// # Errors
    /// [`ModelError::InvalidState`] unless the solution is `Unsolved`;
    /// [`ModelError::SolverFailure`] if the backend fails, after which the
    /// solution is `Failed`.
    pub fn solve(&mut self) -> Result<SolveStatus> {
        if self.state != State::Unsolved {
            return Err(ModelError::InvalidState(format!(
                "solve called in state {:?}",
                self.state
            )));
        }

        match self.propose()? {
            Outcome::Sat(model) => {
                self.decode(model)?;
                self.state = State::Solved;
                Ok(SolveStatus::Sat)
            }
            Outcome::Unsat => {
                self.state = State::Exhausted;
                Ok(SolveStatus::Unsat)
            }
            Outcome::Aborted => Ok(SolveStatus::Aborted),
        }
    }

    /// Asks the backend for another instance distinct from all instances
    /// this solution chain has returned
    ///
    /// On `Sat` the result is a successor solution sharing this problem and
    /// backend session but carrying its own universe and valuation. On
    /// `Exhausted` this solution transitions to `Exhausted`.
    ///
    /// # Errors
    /// [`ModelError::InvalidState`] unless the solution is `Solved`;
    /// [`ModelError::SolverFailure`] if the backend fails.
    pub fn next(&mut self) -> Result<NextOutcome> {
        if self.state != State::Solved {
            return Err(ModelError::InvalidState(format!(
                "next called in state {:?}",
                self.state
            )));
        }
        let model = self
            .model
            .as_ref()
            .ok_or_else(|| ModelError::InvalidState("solved without a model".to_string()))?;

        // Block the current instance: some relation variable must differ
        let blocking: Vec<i32> = self
            .problem
            .relation_vars()
            .map(|var| {
                if model.value(var) {
                    -(var as i32)
                } else {
                    var as i32
                }
            })
            .collect();
        if blocking.is_empty() {
            // Every relation is fixed; the single instance is already out
            debug!("no relation variables; enumeration exhausted");
            self.state = State::Exhausted;
            return Ok(NextOutcome::Exhausted);
        }

        let outcome = {
            let mut backend = self
                .session
                .lock()
                .map_err(|_| ModelError::SolverFailure("backend mutex poisoned".to_string()))?;
            backend.add_clause(&blocking);
            backend.propose(self.options.timeout)
        };

        match outcome {
            Ok(Outcome::Sat(model)) => {
                let mut successor = Solution {
                    problem: Arc::clone(&self.problem),
                    session: Arc::clone(&self.session),
                    options: self.options.clone(),
                    state: State::Solved,
                    universe: None,
                    relations: FxHashMap::default(),
                    model: None,
                };
                successor.decode(model)?;
                Ok(NextOutcome::Sat(successor))
            }
            Ok(Outcome::Unsat) => {
                self.state = State::Exhausted;
                Ok(NextOutcome::Exhausted)
            }
            Ok(Outcome::Aborted) => Ok(NextOutcome::Aborted),
            Err(e) => {
                self.state = State::Failed;
                Err(e)
            }
        }
    }

    fn propose(&mut self) -> Result<Outcome> {
        let result = {
            let mut backend = self
                .session
                .lock()
                .map_err(|_| ModelError::SolverFailure("backend mutex poisoned".to_string()))?;
            backend.propose(self.options.timeout)
        };
        if let Err(e) = &result {
            debug!("backend failure: {}", e);
            self.state = State::Failed;
        }
        result
    }

    /// Decodes a backend assignment into a universe and per-relation values
    fn decode(&mut self, model: Assignment) -> Result<()> {
        let graph = Arc::clone(self.problem.graph());
        let universe = Universe::new(Arc::clone(&graph), self.problem.atoms())?;

        let mut relations = FxHashMap::default();
        for rel in graph.relations() {
            let arity = graph.relation_arity(rel);
            let mut rows: BTreeSet<Vec<u32>> = BTreeSet::new();
            if let Some(binding) = self.problem.binding(rel) {
                for row in binding.fixed() {
                    rows.insert(row.clone());
                }
                for (row, var) in binding.variable() {
                    if model.value(*var) {
                        rows.insert(row.clone());
                    }
                }
            }
            let types = graph.relation_column_types(rel);
            let value = TupleSet::from_rows(&universe, arity, rows, Some(types));
            if self.options.trace {
                trace!("{} = {}", graph.relation_name(rel), value);
            }
            relations.insert(rel, value);
        }

        self.universe = Some(universe);
        self.relations = relations;
        self.model = Some(model);
        Ok(())
    }

    /// Returns the universe of this solution
    ///
    /// # Errors
    /// [`ModelError::InvalidState`] before an instance has been decoded.
    pub fn universe(&self) -> Result<&Universe> {
        self.universe
            .as_ref()
            .ok_or_else(|| ModelError::InvalidState("no instance decoded".to_string()))
    }

    /// Returns the value of a declared relation in this instance
    ///
    /// # Errors
    /// [`ModelError::InvalidState`] before an instance has been decoded;
    /// [`ModelError::InvalidArgument`] for a relation outside the graph.
    pub fn tuples(&self, rel: RelationRef) -> Result<&TupleSet> {
        if self.universe.is_none() {
            return Err(ModelError::InvalidState("no instance decoded".to_string()));
        }
        self.relations
            .get(&rel)
            .ok_or_else(|| ModelError::InvalidArgument("relation not declared".to_string()))
    }

    /// Returns the canonical empty tuple set of this solution
    pub fn none(&self) -> Result<TupleSet> {
        Ok(self.universe()?.none())
    }

    /// Returns the universal unary tuple set of this solution
    pub fn univ(&self) -> Result<TupleSet> {
        Ok(self.universe()?.all_atoms())
    }
}

impl std::fmt::Debug for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Solution")
            .field("state", &self.state)
            .field("universe", &self.universe)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MockBackend;
    use crate::instance::AtomDecl;
    use crate::problem::ProblemBuilder;
    use crate::schema::{ColumnType, Multiplicity, SigGraphBuilder};

    fn node_problem() -> (Arc<CompiledProblem>, crate::schema::SigId, crate::schema::FieldId)
    {
        let mut b = SigGraphBuilder::new();
        let node = b.sig("Node", None, false, Multiplicity::Any);
        let next = b.field(node, "next", vec![ColumnType::of(node)]);
        let graph = b.build().unwrap();
        let problem = ProblemBuilder::new(graph)
            .atom(AtomDecl::new("N0", node))
            .atom(AtomDecl::new("N1", node))
            .variables(2)
            .clause(&[1, 2])
            .fixed(node, &[0])
            .fixed(node, &[1])
            .tuple_var(next, &[0, 1], 1)
            .tuple_var(next, &[1, 0], 2)
            .build()
            .unwrap();
        (problem, node, next)
    }

    #[test]
    fn solve_decodes_fixed_and_variable_tuples() {
        let (problem, node, next) = node_problem();
        let backend = MockBackend::scripted(vec![Outcome::Sat(Assignment::new(vec![
            true, false,
        ]))]);
        let mut solution = Solution::new(problem, Box::new(backend), Options::default());

        assert_eq!(solution.state(), State::Unsolved);
        assert_eq!(solution.solve().unwrap(), SolveStatus::Sat);
        assert_eq!(solution.state(), State::Solved);

        let nodes = solution.tuples(node.into()).unwrap();
        assert_eq!(nodes.size(), 2);
        let edges = solution.tuples(next.into()).unwrap();
        assert_eq!(edges.size(), 1);
        let universe = solution.universe().unwrap();
        let n0 = universe.atom(0).unwrap();
        let n1 = universe.atom(1).unwrap();
        assert_eq!(n0.join(edges).unwrap(), n1.as_tuple_set());
    }

    #[test]
    fn decoded_relations_carry_declared_types() {
        let (problem, _, next) = node_problem();
        let backend = MockBackend::scripted(vec![Outcome::Sat(Assignment::new(vec![
            true, true,
        ]))]);
        let mut solution = Solution::new(problem, Box::new(backend), Options::default());
        solution.solve().unwrap();

        let edges = solution.tuples(next.into()).unwrap();
        assert_eq!(edges.column_types().map(|t| t.len()), Some(2));
    }

    #[test]
    fn unsat_is_an_outcome_not_an_error() {
        let (problem, _, _) = node_problem();
        let backend = MockBackend::scripted(vec![Outcome::Unsat]);
        let mut solution = Solution::new(problem, Box::new(backend), Options::default());

        assert_eq!(solution.solve().unwrap(), SolveStatus::Unsat);
        assert_eq!(solution.state(), State::Exhausted);
        // next() is a state-machine precondition violation here
        assert!(matches!(
            solution.next().unwrap_err(),
            ModelError::InvalidState(_)
        ));
    }

    #[test]
    fn aborted_leaves_state_unchanged() {
        let (problem, _, _) = node_problem();
        let backend = MockBackend::scripted(vec![
            Outcome::Aborted,
            Outcome::Sat(Assignment::new(vec![true, false])),
        ]);
        let mut solution = Solution::new(problem, Box::new(backend), Options::default());

        assert_eq!(solution.solve().unwrap(), SolveStatus::Aborted);
        assert_eq!(solution.state(), State::Unsolved);
        // Retry succeeds
        assert_eq!(solution.solve().unwrap(), SolveStatus::Sat);
    }

    #[test]
    fn backend_failure_is_terminal() {
        let (problem, _, _) = node_problem();
        let backend = MockBackend::scripted(vec![]);
        let mut solution = Solution::new(problem, Box::new(backend), Options::default());

        assert!(matches!(
            solution.solve().unwrap_err(),
            ModelError::SolverFailure(_)
        ));
        assert_eq!(solution.state(), State::Failed);
        assert!(solution.solve().is_err());
    }

    #[test]
    fn next_blocks_the_current_model() {
        let (problem, _, next) = node_problem();
        let backend = MockBackend::scripted(vec![
            Outcome::Sat(Assignment::new(vec![true, false])),
            Outcome::Sat(Assignment::new(vec![false, true])),
            Outcome::Unsat,
        ]);
        let mut solution = Solution::new(problem, Box::new(backend), Options::default());
        solution.solve().unwrap();
        let first_edges = solution.tuples(next.into()).unwrap().clone();

        let mut successor = match solution.next().unwrap() {
            NextOutcome::Sat(s) => s,
            other => panic!("expected Sat, got {:?}", other),
        };
        assert_eq!(successor.state(), State::Solved);

        // The successor has its own universe; its values never compare
        // equal to the predecessor's
        let second_edges = successor.tuples(next.into()).unwrap();
        assert_ne!(
            first_edges.universe().solution_id(),
            second_edges.universe().solution_id()
        );

        assert!(matches!(
            successor.next().unwrap(),
            NextOutcome::Exhausted
        ));
        assert_eq!(successor.state(), State::Exhausted);
    }

    #[test]
    fn next_without_relation_vars_exhausts() {
        let mut b = SigGraphBuilder::new();
        let node = b.sig("Node", None, false, Multiplicity::One);
        let graph = b.build().unwrap();
        let problem = ProblemBuilder::new(graph)
            .atom(AtomDecl::new("N0", node))
            .fixed(node, &[0])
            .build()
            .unwrap();

        let backend = MockBackend::scripted(vec![Outcome::Sat(Assignment::new(vec![]))]);
        let mut solution = Solution::new(problem, Box::new(backend), Options::default());
        solution.solve().unwrap();
        assert!(matches!(solution.next().unwrap(), NextOutcome::Exhausted));
    }

    #[test]
    fn decoding_is_deterministic() {
        let (problem, _, next) = node_problem();
        let model = vec![true, true];
        let decode = |problem: &Arc<CompiledProblem>| {
            let backend =
                MockBackend::scripted(vec![Outcome::Sat(Assignment::new(model.clone()))]);
            let mut solution =
                Solution::new(Arc::clone(problem), Box::new(backend), Options::default());
            solution.solve().unwrap();
            solution
        };
        let s1 = decode(&problem);
        let s2 = decode(&problem);
        // Different solutions, but structurally identical valuations
        let e1 = s1.tuples(next.into()).unwrap();
        let e2 = s2.tuples(next.into()).unwrap();
        assert_eq!(e1.size(), e2.size());
        let rows1: Vec<String> = e1.iter().map(|t| t.to_string()).collect();
        let rows2: Vec<String> = e2.iter().map(|t| t.to_string()).collect();
        assert_eq!(rows1, rows2);
    }
}
