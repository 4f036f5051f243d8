//! # relfinder
//!
//! A bounded relational model finder.
//!
//! relfinder represents typed relational specifications (signatures, fields,
//! relations over a finite universe of atoms), evaluates relational algebra
//! over concrete instances, and coordinates with a pluggable SAT backend to
//! enumerate the instances that satisfy a compiled formula.
//!
//! The crate deliberately does *not* parse a specification language or
//! translate relational logic to CNF. Its inbound interface is a
//! [`problem::CompiledProblem`]: the signature graph, the atom layout, the
//! CNF clauses, and the tuple-to-variable map that an external translation
//! stage produced. Its outbound interface is a [`solution::Solution`]: a
//! decoded universe plus a [`instance::TupleSet`] valuation for every
//! declared relation, queryable through the algebra engine.
//!
//! ## Example
//!
//! ```rust,ignore
//! use relfinder::problem::ProblemBuilder;
//! use relfinder::schema::{Multiplicity, SigGraphBuilder};
//! use relfinder::solution::{Options, Solution, SolveStatus};
//!
//! let mut sigs = SigGraphBuilder::new();
//! let person = sigs.sig("Person", None, false, Multiplicity::Any);
//! let graph = sigs.build()?;
//!
//! let problem = ProblemBuilder::new(graph)
//!     .atom("P0", person)
//!     .atom("P1", person)
//!     // ... bindings and clauses from the translation stage ...
//!     .build()?;
//!
//! let mut solution = Solution::with_default_backend(problem, Options::default());
//! if solution.solve()? == SolveStatus::Sat {
//!     let people = solution.tuples(person.into())?;
//!     println!("{people}");
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]

/// Signature graph: sigs, fields, column types
pub mod schema;

/// Universe, atoms, tuples, and the tuple-set algebra
pub mod instance;

/// The compiled-problem hand-off structure from the translation stage
pub mod problem;

/// SAT backend trait and adapters
pub mod engine;

/// Solution state machine and instance decoding
pub mod solution;

/// Error types
pub mod error {
    //! Error types for relfinder

    use thiserror::Error;

    /// Errors reported by the relational model and the solve pipeline
    ///
    /// Unsatisfiability and solver timeouts during enumeration are *not*
    /// errors; they are ordinary outcomes of
    /// [`solve`](crate::solution::Solution::solve) and
    /// [`next`](crate::solution::Solution::next).
    #[derive(Error, Debug)]
    pub enum ModelError {
        /// An operator was applied to tuple sets of incompatible arity
        #[error("arity mismatch: {left} vs {right}")]
        ArityMismatch {
            /// Arity of the left operand
            left: usize,
            /// Arity of the right operand
            right: usize,
        },

        /// An operator was applied to tuple sets whose column types share no sig
        #[error("type incompatible: {0}")]
        TypeIncompatible(String),

        /// An operation mixed atoms or tuple sets from different solutions
        #[error("atoms from different solutions cannot be combined")]
        CrossSolutionAtom,

        /// Universe lookup with an invalid atom index
        #[error("atom index {index} out of range for universe of size {size}")]
        IndexOutOfRange {
            /// The offending index
            index: usize,
            /// The universe size
            size: usize,
        },

        /// `to_int` was called on an atom without an integer facet
        #[error("atom {0} is not an integer")]
        NotAnInteger(String),

        /// The external solving engine reported an internal failure
        #[error("solver failure: {0}")]
        SolverFailure(String),

        /// Invalid argument
        #[error("invalid argument: {0}")]
        InvalidArgument(String),

        /// An operation was invoked in the wrong solution state
        #[error("invalid state: {0}")]
        InvalidState(String),
    }

    /// Result type for relfinder operations
    pub type Result<T> = std::result::Result<T, ModelError>;
}

pub use error::{ModelError, Result};
