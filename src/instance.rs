//! Instance model: Universe, Atom, Tuple, and TupleSet
//!
//! These types carry the concrete content of one solution. A universe is
//! materialized once per solution from a solver assignment and is immutable
//! thereafter; atoms, tuples, and tuple sets all hold a handle to it and are
//! tagged with its solution id, so mixing values from different solutions is
//! caught by construction.

use rustc_hash::FxHashMap;
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;

use crate::error::{ModelError, Result};
use crate::schema::{ColumnType, SigGraph, SigId};

mod algebra;

static NEXT_SOLUTION_ID: AtomicU64 = AtomicU64::new(1);

/// Declaration of a single atom, as reported by the translation stage
#[derive(Clone, Debug)]
pub struct AtomDecl {
    /// Unique display name
    pub name: String,
    /// Most-specific sig of the atom
    pub sig: SigId,
    /// Integer facet, for integer-backed atoms
    pub int_value: Option<i32>,
}

impl AtomDecl {
    /// An uninterpreted atom of the given sig
    pub fn new(name: impl Into<String>, sig: SigId) -> Self {
        Self {
            name: name.into(),
            sig,
            int_value: None,
        }
    }

    /// An integer-backed atom of the given sig
    pub fn int(value: i32, sig: SigId) -> Self {
        Self {
            name: value.to_string(),
            sig,
            int_value: Some(value),
        }
    }
}

struct AtomInfo {
    name: String,
    sig: SigId,
    int_value: Option<i32>,
}

/// An ordered, immutable collection of atoms for one solution
///
/// Atom indices are stable for the life of the solution and define the
/// canonical ordering of tuples and tuple sets.
#[derive(Clone)]
pub struct Universe {
    inner: Arc<UniverseInner>,
}

struct UniverseInner {
    solution_id: u64,
    graph: Arc<SigGraph>,
    atoms: Vec<AtomInfo>,
    by_name: FxHashMap<String, u32>,
}

impl Universe {
    /// Materializes a universe from the given atom declarations
    ///
    /// A fresh solution id is drawn; atoms of this universe never compare
    /// equal to atoms of any other universe.
    ///
    /// # Errors
    /// Returns an error if the declaration list is empty, contains duplicate
    /// names, or references a sig outside the graph.
    pub fn new(graph: Arc<SigGraph>, decls: &[AtomDecl]) -> Result<Self> {
        if decls.is_empty() {
            return Err(ModelError::InvalidArgument(
                "cannot create an empty universe".to_string(),
            ));
        }

        let mut atoms = Vec::with_capacity(decls.len());
        let mut by_name = FxHashMap::default();

        for (i, decl) in decls.iter().enumerate() {
            if decl.sig.index() >= graph.sig_count() {
                return Err(ModelError::InvalidArgument(format!(
                    "atom {} references a sig outside the graph",
                    decl.name
                )));
            }
            if by_name.insert(decl.name.clone(), i as u32).is_some() {
                return Err(ModelError::InvalidArgument(format!(
                    "{} appears multiple times",
                    decl.name
                )));
            }
            atoms.push(AtomInfo {
                name: decl.name.clone(),
                sig: decl.sig,
                int_value: decl.int_value,
            });
        }

        Ok(Self {
            inner: Arc::new(UniverseInner {
                solution_id: NEXT_SOLUTION_ID.fetch_add(1, AtomicOrdering::Relaxed),
                graph,
                atoms,
                by_name,
            }),
        })
    }

    /// Returns the id of the solution this universe belongs to
    pub fn solution_id(&self) -> u64 {
        self.inner.solution_id
    }

    /// Returns the signature graph this universe was materialized against
    pub fn graph(&self) -> &Arc<SigGraph> {
        &self.inner.graph
    }

    /// Returns the number of atoms in this universe
    pub fn size(&self) -> usize {
        self.inner.atoms.len()
    }

    /// Returns the atom at the given index
    ///
    /// # Errors
    /// Returns [`ModelError::IndexOutOfRange`] if `index >= size()`.
    pub fn atom(&self, index: usize) -> Result<Atom> {
        if index >= self.size() {
            return Err(ModelError::IndexOutOfRange {
                index,
                size: self.size(),
            });
        }
        Ok(Atom {
            universe: self.clone(),
            index: index as u32,
        })
    }

    /// Looks up an atom by name
    pub fn atom_named(&self, name: &str) -> Option<Atom> {
        self.inner.by_name.get(name).map(|&index| Atom {
            universe: self.clone(),
            index,
        })
    }

    /// Returns all atoms in index order
    pub fn atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        (0..self.size() as u32).map(move |index| Atom {
            universe: self.clone(),
            index,
        })
    }

    /// Returns the canonical empty tuple set
    ///
    /// The result is arity-agnostic: it unifies with any operand arity in
    /// the algebra and compares equal to any empty tuple set of this
    /// solution.
    pub fn none(&self) -> TupleSet {
        TupleSet {
            universe: self.clone(),
            arity: 0,
            rows: BTreeSet::new(),
            types: None,
        }
    }

    /// Returns the universal unary tuple set, containing every atom
    pub fn all_atoms(&self) -> TupleSet {
        let rows = (0..self.size() as u32).map(|i| vec![i]).collect();
        TupleSet {
            universe: self.clone(),
            arity: 1,
            rows,
            types: Some(vec![ColumnType::from_sigs(self.inner.graph.top_level())]),
        }
    }
}

impl PartialEq for Universe {
    fn eq(&self, other: &Self) -> bool {
        self.inner.solution_id == other.inner.solution_id
    }
}

impl Eq for Universe {}

impl fmt::Debug for Universe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = self.inner.atoms.iter().map(|a| a.name.as_str()).collect();
        write!(f, "Universe#{}({:?})", self.inner.solution_id, names)
    }
}

/// A single uninterpreted (or integer-backed) value in a universe
///
/// Atoms are identity values: equality, hashing, and ordering derive from
/// the `(solution id, index)` pair. Two atoms with the same name in
/// different solutions are never equal.
#[derive(Clone)]
pub struct Atom {
    universe: Universe,
    index: u32,
}

impl Atom {
    /// Returns the index of this atom in its universe
    pub fn index(&self) -> usize {
        self.index as usize
    }

    /// Returns the unique display name of this atom
    pub fn name(&self) -> &str {
        &self.universe.inner.atoms[self.index as usize].name
    }

    /// Returns the most-specific sig of this atom
    pub fn sig(&self) -> SigId {
        self.universe.inner.atoms[self.index as usize].sig
    }

    /// Returns the id of the solution this atom belongs to
    pub fn solution_id(&self) -> u64 {
        self.universe.solution_id()
    }

    /// Returns the universe this atom belongs to
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the integer value of this atom
    ///
    /// # Errors
    /// Returns [`ModelError::NotAnInteger`] if the atom has no integer facet.
    pub fn to_int(&self) -> Result<i32> {
        self.universe.inner.atoms[self.index as usize]
            .int_value
            .ok_or_else(|| ModelError::NotAnInteger(self.name().to_string()))
    }

    /// Returns the arity-1 tuple set containing only this atom
    pub fn as_tuple_set(&self) -> TupleSet {
        let mut rows = BTreeSet::new();
        rows.insert(vec![self.index]);
        TupleSet {
            universe: self.universe.clone(),
            arity: 1,
            rows,
            types: Some(vec![ColumnType::of(self.sig())]),
        }
    }

    /// Joins this atom with a tuple set
    ///
    /// Equivalent to `self.as_tuple_set().join(right)`.
    pub fn join(&self, right: &TupleSet) -> Result<TupleSet> {
        self.as_tuple_set().join(right)
    }

    /// Takes the product of this atom with a tuple set
    ///
    /// Equivalent to `self.as_tuple_set().product(right)`.
    pub fn product(&self, right: &TupleSet) -> Result<TupleSet> {
        self.as_tuple_set().product(right)
    }

    /// The head of this atom viewed as a length-1 sequence: itself
    pub fn head(&self) -> TupleSet {
        self.as_tuple_set()
    }

    /// The tail of this atom viewed as a length-1 sequence: the empty set
    pub fn tail(&self) -> TupleSet {
        self.universe.none()
    }
}

impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.solution_id() == other.solution_id() && self.index == other.index
    }
}

impl Eq for Atom {}

impl Hash for Atom {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.solution_id().hash(state);
        self.index.hash(state);
    }
}

impl PartialOrd for Atom {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Atom {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.solution_id(), self.index).cmp(&(other.solution_id(), other.index))
    }
}

impl fmt::Debug for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Atom({}#{})", self.name(), self.index)
    }
}

impl fmt::Display for Atom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// An ordered sequence of atoms from one universe
#[derive(Clone)]
pub struct Tuple {
    universe: Universe,
    indices: Vec<u32>,
}

impl Tuple {
    /// Creates a tuple from the given atoms
    ///
    /// # Errors
    /// Returns an error if the atom list is empty or the atoms come from
    /// different solutions.
    pub fn new(atoms: &[Atom]) -> Result<Self> {
        let first = atoms.first().ok_or_else(|| {
            ModelError::InvalidArgument("cannot create an empty tuple".to_string())
        })?;
        let universe = first.universe.clone();
        let mut indices = Vec::with_capacity(atoms.len());
        for atom in atoms {
            if atom.universe != universe {
                return Err(ModelError::CrossSolutionAtom);
            }
            indices.push(atom.index);
        }
        Ok(Self { universe, indices })
    }

    /// Returns the universe this tuple belongs to
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the arity of this tuple
    pub fn arity(&self) -> usize {
        self.indices.len()
    }

    /// Returns the atom at the given position
    ///
    /// # Errors
    /// Returns [`ModelError::IndexOutOfRange`] if `i >= arity()`.
    pub fn atom(&self, i: usize) -> Result<Atom> {
        let &index = self.indices.get(i).ok_or(ModelError::IndexOutOfRange {
            index: i,
            size: self.indices.len(),
        })?;
        Ok(Atom {
            universe: self.universe.clone(),
            index,
        })
    }

    /// Returns the atoms of this tuple in column order
    pub fn atoms(&self) -> impl Iterator<Item = Atom> + '_ {
        self.indices.iter().map(move |&index| Atom {
            universe: self.universe.clone(),
            index,
        })
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.universe == other.universe && self.indices == other.indices
    }
}

impl Eq for Tuple {}

impl Hash for Tuple {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.universe.solution_id().hash(state);
        self.indices.hash(state);
    }
}

impl PartialOrd for Tuple {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Tuple {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.universe.solution_id(), &self.indices)
            .cmp(&(other.universe.solution_id(), &other.indices))
    }
}

impl fmt::Debug for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tuple{}", self)
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, atom) in self.atoms().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", atom)?;
        }
        write!(f, ")")
    }
}

/// An immutable set of fixed-arity tuples over one universe
///
/// Tuples are kept in canonical order: lexicographically by their atoms'
/// indices. The arity-agnostic empty set produced by [`Universe::none`]
/// reports arity 0 and unifies with any operand arity in the algebra.
///
/// When a tuple set originates from a declared relation it carries a
/// column-type descriptor, which the algebra propagates and checks; sets
/// built ad hoc without a descriptor are checked for arity only.
#[derive(Clone)]
pub struct TupleSet {
    universe: Universe,
    arity: usize,
    rows: BTreeSet<Vec<u32>>,
    types: Option<Vec<ColumnType>>,
}

impl TupleSet {
    /// Creates an empty tuple set of the given arity
    ///
    /// # Errors
    /// Returns an error if `arity` is 0; use [`Universe::none`] for the
    /// arity-agnostic empty set.
    pub fn empty(universe: &Universe, arity: usize) -> Result<Self> {
        if arity == 0 {
            return Err(ModelError::InvalidArgument(
                "tuple set arity must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            universe: universe.clone(),
            arity,
            rows: BTreeSet::new(),
            types: None,
        })
    }

    /// Creates a tuple set from rows of atoms
    ///
    /// # Errors
    /// Returns [`ModelError::CrossSolutionAtom`] if any atom belongs to a
    /// different solution than `universe`, and [`ModelError::ArityMismatch`]
    /// if the rows are ragged.
    pub fn of(universe: &Universe, rows: &[&[Atom]]) -> Result<Self> {
        let arity = match rows.first() {
            Some(row) if !row.is_empty() => row.len(),
            _ => {
                return Err(ModelError::InvalidArgument(
                    "cannot infer arity from an empty row set; use Universe::none".to_string(),
                ))
            }
        };

        let mut set_rows = BTreeSet::new();
        for row in rows {
            if row.len() != arity {
                return Err(ModelError::ArityMismatch {
                    left: arity,
                    right: row.len(),
                });
            }
            let mut indices = Vec::with_capacity(arity);
            for atom in *row {
                if atom.universe != *universe {
                    return Err(ModelError::CrossSolutionAtom);
                }
                indices.push(atom.index);
            }
            set_rows.insert(indices);
        }

        Ok(Self {
            universe: universe.clone(),
            arity,
            rows: set_rows,
            types: None,
        })
    }

    /// Creates a tuple set from existing tuples
    ///
    /// # Errors
    /// Same conditions as [`TupleSet::of`].
    pub fn from_tuples(universe: &Universe, tuples: &[Tuple]) -> Result<Self> {
        let arity = match tuples.first() {
            Some(t) => t.arity(),
            None => {
                return Err(ModelError::InvalidArgument(
                    "cannot infer arity from an empty tuple list; use Universe::none".to_string(),
                ))
            }
        };

        let mut rows = BTreeSet::new();
        for tuple in tuples {
            if tuple.universe != *universe {
                return Err(ModelError::CrossSolutionAtom);
            }
            if tuple.arity() != arity {
                return Err(ModelError::ArityMismatch {
                    left: arity,
                    right: tuple.arity(),
                });
            }
            rows.insert(tuple.indices.clone());
        }

        Ok(Self {
            universe: universe.clone(),
            arity,
            rows,
            types: None,
        })
    }

    /// Internal constructor for decoded relations; rows must be validated
    pub(crate) fn from_rows(
        universe: &Universe,
        arity: usize,
        rows: BTreeSet<Vec<u32>>,
        types: Option<Vec<ColumnType>>,
    ) -> Self {
        Self {
            universe: universe.clone(),
            arity,
            rows,
            types,
        }
    }

    /// Attaches a column-type descriptor to this set
    ///
    /// # Errors
    /// Returns an error if the descriptor length does not match the arity.
    pub fn with_types(mut self, types: Vec<ColumnType>) -> Result<Self> {
        if types.len() != self.arity {
            return Err(ModelError::InvalidArgument(format!(
                "descriptor of {} columns on a tuple set of arity {}",
                types.len(),
                self.arity
            )));
        }
        self.types = Some(types);
        Ok(self)
    }

    /// Returns the universe this set belongs to
    pub fn universe(&self) -> &Universe {
        &self.universe
    }

    /// Returns the arity of this set, or 0 for the arity-agnostic empty set
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Returns the column-type descriptor, if this set carries one
    pub fn column_types(&self) -> Option<&[ColumnType]> {
        self.types.as_deref()
    }

    /// Returns the number of tuples in this set
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// Returns true if this set has no tuples
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns true if this set contains the given tuple
    pub fn contains(&self, tuple: &Tuple) -> bool {
        tuple.universe == self.universe && self.rows.contains(&tuple.indices)
    }

    /// Returns the tuples of this set in canonical order
    pub fn iter(&self) -> impl Iterator<Item = Tuple> + '_ {
        self.rows.iter().map(move |indices| Tuple {
            universe: self.universe.clone(),
            indices: indices.clone(),
        })
    }

    pub(crate) fn rows(&self) -> &BTreeSet<Vec<u32>> {
        &self.rows
    }
}

impl PartialEq for TupleSet {
    fn eq(&self, other: &Self) -> bool {
        if self.universe != other.universe {
            return false;
        }
        // All empty sets of one solution are equal, whatever their arity;
        // this makes `a.difference(&a)? == universe.none()` hold.
        if self.rows.is_empty() && other.rows.is_empty() {
            return true;
        }
        self.arity == other.arity && self.rows == other.rows
    }
}

impl Eq for TupleSet {}

impl Hash for TupleSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.universe.solution_id().hash(state);
        if self.rows.is_empty() {
            // Consistent with equality: empty sets of any arity are equal
            0usize.hash(state);
        } else {
            self.arity.hash(state);
            self.rows.hash(state);
        }
    }
}

impl fmt::Debug for TupleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TupleSet/{} {}", self.arity, self)
    }
}

impl fmt::Display for TupleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, tuple) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", tuple)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Multiplicity, SigGraphBuilder};

    fn universe_of(names: &[&str]) -> Universe {
        let mut b = SigGraphBuilder::new();
        let sig = b.sig("S", None, false, Multiplicity::Any);
        let graph = b.build().unwrap();
        let decls: Vec<AtomDecl> = names.iter().map(|n| AtomDecl::new(*n, sig)).collect();
        Universe::new(graph, &decls).unwrap()
    }

    #[test]
    fn create_universe() {
        let universe = universe_of(&["A", "B", "C"]);
        assert_eq!(universe.size(), 3);
        assert_eq!(universe.atom(0).unwrap().name(), "A");
        assert_eq!(universe.atom(2).unwrap().name(), "C");
        assert_eq!(universe.atom_named("B").unwrap().index(), 1);
        assert!(universe.atom_named("D").is_none());
    }

    #[test]
    fn universe_rejects_duplicates() {
        let mut b = SigGraphBuilder::new();
        let sig = b.sig("S", None, false, Multiplicity::Any);
        let graph = b.build().unwrap();
        let decls = vec![
            AtomDecl::new("A", sig),
            AtomDecl::new("B", sig),
            AtomDecl::new("A", sig),
        ];
        assert!(Universe::new(graph, &decls).is_err());
    }

    #[test]
    fn universe_rejects_empty() {
        let mut b = SigGraphBuilder::new();
        b.sig("S", None, false, Multiplicity::Any);
        let graph = b.build().unwrap();
        assert!(Universe::new(graph, &[]).is_err());
    }

    #[test]
    fn atom_lookup_out_of_range() {
        let universe = universe_of(&["A"]);
        let err = universe.atom(5).unwrap_err();
        assert!(matches!(
            err,
            ModelError::IndexOutOfRange { index: 5, size: 1 }
        ));
    }

    #[test]
    fn atom_identity_within_solution() {
        let universe = universe_of(&["A", "B"]);
        let a1 = universe.atom(0).unwrap();
        let a2 = universe.atom(0).unwrap();
        let b = universe.atom(1).unwrap();
        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        assert!(a1 < b);
    }

    #[test]
    fn atom_identity_across_solutions() {
        let u1 = universe_of(&["A"]);
        let u2 = universe_of(&["A"]);
        let a1 = u1.atom(0).unwrap();
        let a2 = u2.atom(0).unwrap();
        // Same name and index, but different solutions
        assert_eq!(a1.name(), a2.name());
        assert_ne!(a1, a2);
    }

    #[test]
    fn atom_to_int() {
        let mut b = SigGraphBuilder::new();
        let s = b.sig("S", None, false, Multiplicity::Any);
        let int_sig = b.sig("Int", None, false, Multiplicity::Any);
        let graph = b.build().unwrap();
        let decls = vec![AtomDecl::new("A", s), AtomDecl::int(7, int_sig)];
        let universe = Universe::new(graph, &decls).unwrap();

        assert_eq!(universe.atom(1).unwrap().to_int().unwrap(), 7);
        let err = universe.atom(0).unwrap().to_int().unwrap_err();
        assert!(matches!(err, ModelError::NotAnInteger(_)));
    }

    #[test]
    fn atom_as_tuple_set() {
        let universe = universe_of(&["A", "B"]);
        let a = universe.atom(0).unwrap();
        let set = a.as_tuple_set();
        assert_eq!(set.arity(), 1);
        assert_eq!(set.size(), 1);
        assert!(set.contains(&Tuple::new(&[a.clone()]).unwrap()));
        assert_eq!(a.head(), set);
        assert!(a.tail().is_empty());
    }

    #[test]
    fn tuple_rejects_cross_solution_atoms() {
        let u1 = universe_of(&["A"]);
        let u2 = universe_of(&["B"]);
        let err = Tuple::new(&[u1.atom(0).unwrap(), u2.atom(0).unwrap()]).unwrap_err();
        assert!(matches!(err, ModelError::CrossSolutionAtom));
    }

    #[test]
    fn tuple_set_of_rows() {
        let universe = universe_of(&["A", "B", "C"]);
        let a = universe.atom(0).unwrap();
        let b = universe.atom(1).unwrap();
        let set = TupleSet::of(&universe, &[&[a.clone()], &[b.clone()]]).unwrap();
        assert_eq!(set.arity(), 1);
        assert_eq!(set.size(), 2);
    }

    #[test]
    fn tuple_set_rejects_ragged_rows() {
        let universe = universe_of(&["A", "B"]);
        let a = universe.atom(0).unwrap();
        let b = universe.atom(1).unwrap();
        let err = TupleSet::of(&universe, &[&[a.clone()], &[a, b]]).unwrap_err();
        assert!(matches!(err, ModelError::ArityMismatch { .. }));
    }

    #[test]
    fn tuple_set_rejects_cross_solution() {
        let u1 = universe_of(&["A"]);
        let u2 = universe_of(&["B"]);
        let foreign = u2.atom(0).unwrap();
        let err = TupleSet::of(&u1, &[&[foreign]]).unwrap_err();
        assert!(matches!(err, ModelError::CrossSolutionAtom));
    }

    #[test]
    fn canonical_iteration_order() {
        let universe = universe_of(&["A", "B", "C"]);
        let a = universe.atom(0).unwrap();
        let b = universe.atom(1).unwrap();
        let c = universe.atom(2).unwrap();
        // Insert out of order; iteration is lexicographic by atom index
        let set = TupleSet::of(
            &universe,
            &[&[c.clone(), a.clone()], &[a.clone(), b.clone()], &[a.clone(), a.clone()]],
        )
        .unwrap();
        let rendered = format!("{}", set);
        assert_eq!(rendered, "{(A, A), (A, B), (C, A)}");
    }

    #[test]
    fn equal_sets_ignore_insertion_order() {
        let universe = universe_of(&["A", "B"]);
        let a = universe.atom(0).unwrap();
        let b = universe.atom(1).unwrap();
        let s1 = TupleSet::of(&universe, &[&[a.clone()], &[b.clone()]]).unwrap();
        let s2 = TupleSet::of(&universe, &[&[b], &[a]]).unwrap();
        assert_eq!(s1, s2);

        use std::collections::hash_map::DefaultHasher;
        let hash = |s: &TupleSet| {
            let mut h = DefaultHasher::new();
            s.hash(&mut h);
            h.finish()
        };
        assert_eq!(hash(&s1), hash(&s2));
    }

    #[test]
    fn empty_sets_compare_equal_regardless_of_arity() {
        let universe = universe_of(&["A"]);
        let none = universe.none();
        let empty1 = TupleSet::empty(&universe, 1).unwrap();
        let empty3 = TupleSet::empty(&universe, 3).unwrap();
        assert_eq!(none, empty1);
        assert_eq!(empty1, empty3);
    }

    #[test]
    fn all_atoms_is_universal() {
        let universe = universe_of(&["A", "B", "C"]);
        let all = universe.all_atoms();
        assert_eq!(all.arity(), 1);
        assert_eq!(all.size(), 3);
        assert!(all.column_types().is_some());
    }
}
