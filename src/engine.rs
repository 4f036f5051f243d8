//! Solver backend trait and implementations
//!
//! The core never depends on a specific SAT engine's representation: it
//! talks to a narrow capability interface that loads clauses and proposes
//! assignments. Blocking of previously seen instances is done by the
//! solution manager through ordinary clauses, so backends need no
//! enumeration support of their own.

pub mod rustsat_adapter;

use std::time::Duration;

use crate::error::Result;

/// A satisfying assignment over 1-indexed boolean variables
#[derive(Clone, Debug)]
pub struct Assignment {
    values: Vec<bool>,
}

impl Assignment {
    /// Wraps a value vector; `values[i]` holds the value of variable `i + 1`
    pub fn new(values: Vec<bool>) -> Self {
        Self { values }
    }

    /// Returns the value of a variable; unknown variables read as false
    pub fn value(&self, var: u32) -> bool {
        var != 0 && self.values.get((var - 1) as usize).copied().unwrap_or(false)
    }

    /// Returns the number of assigned variables
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no variables are assigned
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// One answer from the external solving engine
#[derive(Debug)]
pub enum Outcome {
    /// A satisfying assignment was found
    Sat(Assignment),
    /// No satisfying assignment exists for the loaded clauses
    Unsat,
    /// The engine stopped before reaching an answer (timeout or interrupt)
    Aborted,
}

/// Capability interface over an external SAT engine
///
/// Variables are 1-indexed; literals are signed integers, negative for a
/// negated variable. `propose` is the only call that may block.
pub trait SolverBackend {
    /// Adds the given number of variables to the engine
    fn add_variables(&mut self, num_vars: u32);

    /// Adds a clause; returns false if the clause is trivially unsatisfiable
    fn add_clause(&mut self, lits: &[i32]) -> bool;

    /// Asks the engine for a satisfying assignment
    ///
    /// A timeout or interrupt surfaces as [`Outcome::Aborted`]; an internal
    /// engine failure is an error.
    fn propose(&mut self, timeout: Option<Duration>) -> Result<Outcome>;

    /// Passes a backend-specific option through without interpretation
    ///
    /// Unrecognized options are ignored.
    fn set_option(&mut self, _key: &str, _value: &str) {}

    /// Returns the number of variables added
    fn num_variables(&self) -> u32;

    /// Returns the number of clauses added
    fn num_clauses(&self) -> u32;
}

/// A scriptable backend for testing the solution pipeline
///
/// Plays back a fixed sequence of outcomes and records every clause it was
/// given; it never inspects the clauses.
pub struct MockBackend {
    script: Vec<Outcome>,
    num_vars: u32,
    clauses: Vec<Vec<i32>>,
}

impl MockBackend {
    /// Creates a backend that replays the given outcomes in order
    pub fn scripted(script: Vec<Outcome>) -> Self {
        Self {
            script,
            num_vars: 0,
            clauses: Vec::new(),
        }
    }

    /// Returns the clauses this backend has received
    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }
}

impl SolverBackend for MockBackend {
    fn add_variables(&mut self, num_vars: u32) {
        self.num_vars += num_vars;
    }

    fn add_clause(&mut self, lits: &[i32]) -> bool {
        self.clauses.push(lits.to_vec());
        !lits.is_empty()
    }

    fn propose(&mut self, _timeout: Option<Duration>) -> Result<Outcome> {
        if self.script.is_empty() {
            return Err(crate::ModelError::SolverFailure(
                "mock script exhausted".to_string(),
            ));
        }
        Ok(self.script.remove(0))
    }

    fn num_variables(&self) -> u32 {
        self.num_vars
    }

    fn num_clauses(&self) -> u32 {
        self.clauses.len() as u32
    }
}
