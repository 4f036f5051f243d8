//! The compiled problem: the hand-off structure from the translation stage
//!
//! The relational-to-CNF translation is outside this crate; what it produces
//! is a [`CompiledProblem`]: the signature graph, the atom layout of the
//! bounded universe, the CNF clauses over boolean variables, and, for every
//! declared relation, the map from candidate tuples to those variables. The
//! solution manager consumes this structure verbatim to drive the backend
//! and to decode assignments into typed tuple sets.

use rustc_hash::FxHashMap;
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::instance::AtomDecl;
use crate::schema::{RelationRef, SigGraph};

/// Tuple-to-variable map for one declared relation
///
/// Fixed tuples are present in every instance (the relation's lower bound);
/// variable tuples are present iff their boolean variable is assigned true.
#[derive(Debug, Default)]
pub struct RelationBinding {
    fixed: Vec<Vec<u32>>,
    variable: Vec<(Vec<u32>, u32)>,
}

impl RelationBinding {
    /// Tuples present in every instance, as atom-index rows
    pub fn fixed(&self) -> &[Vec<u32>] {
        &self.fixed
    }

    /// Undetermined tuples and their boolean variables
    pub fn variable(&self) -> &[(Vec<u32>, u32)] {
        &self.variable
    }
}

/// A compiled formula plus everything needed to decode its models
#[derive(Debug)]
pub struct CompiledProblem {
    graph: Arc<SigGraph>,
    atoms: Vec<AtomDecl>,
    num_vars: u32,
    clauses: Vec<Vec<i32>>,
    bindings: FxHashMap<RelationRef, RelationBinding>,
}

impl CompiledProblem {
    /// Returns the signature graph this problem was compiled against
    pub fn graph(&self) -> &Arc<SigGraph> {
        &self.graph
    }

    /// Returns the atom declarations of the bounded universe, in index order
    pub fn atoms(&self) -> &[AtomDecl] {
        &self.atoms
    }

    /// Returns the number of boolean variables in the formula
    pub fn num_vars(&self) -> u32 {
        self.num_vars
    }

    /// Returns the CNF clauses, as DIMACS-style signed literals
    pub fn clauses(&self) -> &[Vec<i32>] {
        &self.clauses
    }

    /// Returns the binding for a relation, if the translation produced one
    ///
    /// Relations without a binding decode to the empty tuple set.
    pub fn binding(&self, rel: RelationRef) -> Option<&RelationBinding> {
        self.bindings.get(&rel)
    }

    /// Returns every boolean variable attached to a relation tuple
    ///
    /// These are the variables a blocking clause ranges over when asking the
    /// backend for the next distinct instance.
    pub fn relation_vars(&self) -> impl Iterator<Item = u32> + '_ {
        self.bindings
            .values()
            .flat_map(|b| b.variable.iter().map(|(_, var)| *var))
    }
}

/// Builder for [`CompiledProblem`]
///
/// Used by the translation stage, and by tests that script small problems
/// by hand.
pub struct ProblemBuilder {
    graph: Arc<SigGraph>,
    atoms: Vec<AtomDecl>,
    num_vars: u32,
    clauses: Vec<Vec<i32>>,
    bindings: FxHashMap<RelationRef, RelationBinding>,
}

impl ProblemBuilder {
    /// Starts a problem over the given signature graph
    pub fn new(graph: Arc<SigGraph>) -> Self {
        Self {
            graph,
            atoms: Vec::new(),
            num_vars: 0,
            clauses: Vec::new(),
            bindings: FxHashMap::default(),
        }
    }

    /// Declares the next atom of the universe
    pub fn atom(mut self, decl: AtomDecl) -> Self {
        self.atoms.push(decl);
        self
    }

    /// Declares the number of boolean variables
    pub fn variables(mut self, num_vars: u32) -> Self {
        self.num_vars = num_vars;
        self
    }

    /// Adds a CNF clause
    pub fn clause(mut self, lits: &[i32]) -> Self {
        self.clauses.push(lits.to_vec());
        self
    }

    /// Records a tuple that is present in every instance of `rel`
    pub fn fixed(mut self, rel: impl Into<RelationRef>, row: &[u32]) -> Self {
        self.bindings
            .entry(rel.into())
            .or_default()
            .fixed
            .push(row.to_vec());
        self
    }

    /// Records an undetermined tuple of `rel` controlled by `var`
    pub fn tuple_var(mut self, rel: impl Into<RelationRef>, row: &[u32], var: u32) -> Self {
        self.bindings
            .entry(rel.into())
            .or_default()
            .variable
            .push((row.to_vec(), var));
        self
    }

    /// Validates and freezes the problem
    ///
    /// # Errors
    /// Returns an error if the universe is empty, a binding's arity does not
    /// match its relation's declared arity, a tuple references an atom index
    /// outside the universe, a variable id is outside `1..=num_vars`, or a
    /// clause literal references an undeclared variable.
    pub fn build(self) -> Result<Arc<CompiledProblem>> {
        if self.atoms.is_empty() {
            return Err(ModelError::InvalidArgument(
                "compiled problem has no atoms".to_string(),
            ));
        }
        let atom_count = self.atoms.len() as u32;

        for clause in &self.clauses {
            for &lit in clause {
                let var = lit.unsigned_abs();
                if var == 0 || var > self.num_vars {
                    return Err(ModelError::InvalidArgument(format!(
                        "clause literal {} references an undeclared variable",
                        lit
                    )));
                }
            }
        }

        for (&rel, binding) in &self.bindings {
            let arity = self.graph.relation_arity(rel);
            let name = self.graph.relation_name(rel);
            let rows = binding
                .fixed
                .iter()
                .chain(binding.variable.iter().map(|(row, _)| row));
            for row in rows {
                if row.len() != arity {
                    return Err(ModelError::ArityMismatch {
                        left: row.len(),
                        right: arity,
                    });
                }
                if let Some(&bad) = row.iter().find(|&&i| i >= atom_count) {
                    return Err(ModelError::IndexOutOfRange {
                        index: bad as usize,
                        size: atom_count as usize,
                    });
                }
            }
            for &(_, var) in &binding.variable {
                if var == 0 || var > self.num_vars {
                    return Err(ModelError::InvalidArgument(format!(
                        "binding for {} references undeclared variable {}",
                        name, var
                    )));
                }
            }
        }

        Ok(Arc::new(CompiledProblem {
            graph: self.graph,
            atoms: self.atoms,
            num_vars: self.num_vars,
            clauses: self.clauses,
            bindings: self.bindings,
        }))
    }
}
