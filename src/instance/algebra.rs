//! Relational algebra over tuple sets
//!
//! Every operator is a pure function: operands are borrowed, results are
//! new immutable sets. Checks run before any tuple work, in a fixed order:
//! same solution, arity, column types. Column-type checks apply only when
//! both operands carry a descriptor; sets built without one are checked
//! for arity alone.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;

use crate::error::{ModelError, Result};
use crate::schema::ColumnType;

use super::TupleSet;

impl TupleSet {
    fn check_same_solution(&self, other: &TupleSet) -> Result<()> {
        if self.universe != other.universe {
            return Err(ModelError::CrossSolutionAtom);
        }
        Ok(())
    }

    /// Unifies the arities of two operands for a set operation
    ///
    /// The arity-agnostic empty set (arity 0) unifies with anything.
    fn unified_arity(&self, other: &TupleSet) -> Result<usize> {
        match (self.arity, other.arity) {
            (0, a) | (a, 0) => Ok(a),
            (a, b) if a == b => Ok(a),
            (a, b) => Err(ModelError::ArityMismatch { left: a, right: b }),
        }
    }

    fn render_type(&self, ty: &ColumnType) -> String {
        let graph = self.universe.graph();
        ty.sigs()
            .map(|s| graph.sig(s).name().to_string())
            .collect::<Vec<_>>()
            .join("+")
    }

    /// Checks column-wise compatibility for union/intersection/difference
    fn check_setop_types(&self, other: &TupleSet) -> Result<()> {
        let (Some(left), Some(right)) = (&self.types, &other.types) else {
            return Ok(());
        };
        let graph = self.universe.graph();
        for (i, (a, b)) in left.iter().zip(right.iter()).enumerate() {
            if !graph.compatible(a, b) {
                return Err(ModelError::TypeIncompatible(format!(
                    "column {}: {} vs {}",
                    i,
                    self.render_type(a),
                    other.render_type(b)
                )));
            }
        }
        Ok(())
    }

    /// Returns the set union of two equal-arity tuple sets
    ///
    /// # Errors
    /// [`ModelError::CrossSolutionAtom`], [`ModelError::ArityMismatch`], or
    /// [`ModelError::TypeIncompatible`] when both operands carry descriptors
    /// whose columns share no sig.
    pub fn union(&self, other: &TupleSet) -> Result<TupleSet> {
        self.check_same_solution(other)?;
        let arity = self.unified_arity(other)?;
        self.check_setop_types(other)?;

        let rows: BTreeSet<Vec<u32>> = self.rows.union(&other.rows).cloned().collect();
        let types = match (&self.types, &other.types) {
            (Some(a), Some(b)) if a.len() == b.len() => {
                Some(a.iter().zip(b.iter()).map(|(x, y)| x.merged(y)).collect())
            }
            // An empty operand does not constrain the result's columns
            (Some(a), _) if other.arity == 0 => Some(a.clone()),
            (_, Some(b)) if self.arity == 0 => Some(b.clone()),
            _ => None,
        };
        Ok(TupleSet::from_rows(&self.universe, arity, rows, types))
    }

    /// Returns the set intersection of two equal-arity tuple sets
    pub fn intersection(&self, other: &TupleSet) -> Result<TupleSet> {
        self.check_same_solution(other)?;
        let arity = self.unified_arity(other)?;
        self.check_setop_types(other)?;

        let rows: BTreeSet<Vec<u32>> = self.rows.intersection(&other.rows).cloned().collect();
        let graph = self.universe.graph();
        let types = match (&self.types, &other.types) {
            (Some(a), Some(b)) if a.len() == b.len() => Some(
                a.iter()
                    .zip(b.iter())
                    .map(|(x, y)| graph.refine(x, y))
                    .collect(),
            ),
            (Some(a), _) => Some(a.clone()),
            (_, Some(b)) => Some(b.clone()),
            _ => None,
        };
        Ok(TupleSet::from_rows(&self.universe, arity, rows, types))
    }

    /// Returns the tuples of this set not present in `other`
    pub fn difference(&self, other: &TupleSet) -> Result<TupleSet> {
        self.check_same_solution(other)?;
        let arity = self.unified_arity(other)?;
        self.check_setop_types(other)?;

        let rows: BTreeSet<Vec<u32>> = self.rows.difference(&other.rows).cloned().collect();
        Ok(TupleSet::from_rows(
            &self.universe,
            arity,
            rows,
            self.types.clone(),
        ))
    }

    /// Returns the Cartesian product of two tuple sets
    ///
    /// The result has arity `self.arity() + other.arity()` and contains
    /// every concatenation of a tuple from `self` with a tuple from `other`.
    pub fn product(&self, other: &TupleSet) -> Result<TupleSet> {
        self.check_same_solution(other)?;
        if self.arity == 0 || other.arity == 0 {
            return Ok(self.universe.none());
        }

        let arity = self.arity + other.arity;
        let mut rows = BTreeSet::new();
        for left in &self.rows {
            for right in &other.rows {
                let mut row = Vec::with_capacity(arity);
                row.extend_from_slice(left);
                row.extend_from_slice(right);
                rows.insert(row);
            }
        }

        let types = match (&self.types, &other.types) {
            (Some(a), Some(b)) => {
                let mut t = a.clone();
                t.extend(b.iter().cloned());
                Some(t)
            }
            _ => None,
        };
        Ok(TupleSet::from_rows(&self.universe, arity, rows, types))
    }

    /// Returns the relational join of two tuple sets
    ///
    /// A tuple `(a1..am)` combines with `(b1..bn)` into
    /// `(a1..a(m-1), b2..bn)` iff `am == b1`. The result has arity
    /// `m + n - 2`, which must be at least 1. Empty operands yield an empty
    /// result, never an error.
    pub fn join(&self, other: &TupleSet) -> Result<TupleSet> {
        self.check_same_solution(other)?;
        if self.arity == 0 || other.arity == 0 {
            return Ok(self.universe.none());
        }
        let m = self.arity;
        let n = other.arity;
        if m + n < 3 {
            return Err(ModelError::ArityMismatch { left: m, right: n });
        }
        let arity = m + n - 2;

        // Type check on the matched columns, independent of tuple content
        let types = match (&self.types, &other.types) {
            (Some(a), Some(b)) => {
                let graph = self.universe.graph();
                if !graph.compatible(&a[m - 1], &b[0]) {
                    return Err(ModelError::TypeIncompatible(format!(
                        "join columns share no sig: {} vs {}",
                        self.render_type(&a[m - 1]),
                        other.render_type(&b[0])
                    )));
                }
                let mut t: Vec<ColumnType> = a[..m - 1].to_vec();
                t.extend_from_slice(&b[1..]);
                Some(t)
            }
            _ => None,
        };

        let mut by_first: FxHashMap<u32, Vec<&Vec<u32>>> = FxHashMap::default();
        for row in &other.rows {
            by_first.entry(row[0]).or_default().push(row);
        }

        let mut rows = BTreeSet::new();
        for left in &self.rows {
            let Some(matches) = by_first.get(&left[m - 1]) else {
                continue;
            };
            for right in matches {
                let mut row = Vec::with_capacity(arity);
                row.extend_from_slice(&left[..m - 1]);
                row.extend_from_slice(&right[1..]);
                rows.insert(row);
            }
        }
        Ok(TupleSet::from_rows(&self.universe, arity, rows, types))
    }

    /// Returns the transpose of a binary tuple set
    ///
    /// # Errors
    /// [`ModelError::ArityMismatch`] unless this set has arity 2 (the
    /// arity-agnostic empty set transposes to itself).
    pub fn transpose(&self) -> Result<TupleSet> {
        if self.arity == 0 {
            return Ok(self.universe.none());
        }
        if self.arity != 2 {
            return Err(ModelError::ArityMismatch {
                left: self.arity,
                right: 2,
            });
        }
        let rows = self.rows.iter().map(|r| vec![r[1], r[0]]).collect();
        let types = self.types.as_ref().map(|t| vec![t[1].clone(), t[0].clone()]);
        Ok(TupleSet::from_rows(&self.universe, 2, rows, types))
    }

    /// Returns the transitive closure of a binary tuple set
    ///
    /// The least relation containing this set and closed under composition.
    /// Terminates because the universe is finite.
    ///
    /// # Errors
    /// [`ModelError::ArityMismatch`] unless arity is 2;
    /// [`ModelError::TypeIncompatible`] when a descriptor is present and the
    /// two columns are not homogeneous.
    pub fn closure(&self) -> Result<TupleSet> {
        if self.arity == 0 {
            return Ok(self.universe.none());
        }
        if self.arity != 2 {
            return Err(ModelError::ArityMismatch {
                left: self.arity,
                right: 2,
            });
        }
        if let Some(types) = &self.types {
            let graph = self.universe.graph();
            if !graph.compatible(&types[0], &types[1]) {
                return Err(ModelError::TypeIncompatible(format!(
                    "closure over heterogeneous columns: {} vs {}",
                    self.render_type(&types[0]),
                    self.render_type(&types[1])
                )));
            }
        }

        let mut rows = self.rows.clone();
        loop {
            let mut by_first: FxHashMap<u32, Vec<u32>> = FxHashMap::default();
            for row in &rows {
                by_first.entry(row[0]).or_default().push(row[1]);
            }
            let mut added = Vec::new();
            for row in &rows {
                if let Some(tails) = by_first.get(&row[1]) {
                    for &tail in tails {
                        let candidate = vec![row[0], tail];
                        if !rows.contains(&candidate) {
                            added.push(candidate);
                        }
                    }
                }
            }
            if added.is_empty() {
                break;
            }
            rows.extend(added);
        }

        let types = self
            .types
            .as_ref()
            .map(|t| vec![t[0].merged(&t[1]), t[0].merged(&t[1])]);
        Ok(TupleSet::from_rows(&self.universe, 2, rows, types))
    }

    /// Returns the reflexive transitive closure: `closure() ∪ iden(univ)`
    pub fn reflexive_closure(&self) -> Result<TupleSet> {
        let closed = self.closure()?;
        let diagonal = self.universe.all_atoms().iden()?;
        closed.union(&diagonal)
    }

    /// Returns the identity restriction of a unary tuple set
    ///
    /// The arity-2 diagonal `{(x, x) | x ∈ self}`.
    pub fn iden(&self) -> Result<TupleSet> {
        if self.arity == 0 {
            return Ok(self.universe.none());
        }
        if self.arity != 1 {
            return Err(ModelError::ArityMismatch {
                left: self.arity,
                right: 1,
            });
        }
        let rows = self.rows.iter().map(|r| vec![r[0], r[0]]).collect();
        let types = self.types.as_ref().map(|t| vec![t[0].clone(), t[0].clone()]);
        Ok(TupleSet::from_rows(&self.universe, 2, rows, types))
    }

    /// Returns the relational override `self ++ other`
    ///
    /// Every tuple of `other`, plus the tuples of `self` whose first atom is
    /// not the first atom of any tuple in `other`.
    pub fn override_with(&self, other: &TupleSet) -> Result<TupleSet> {
        self.check_same_solution(other)?;
        let arity = self.unified_arity(other)?;
        self.check_setop_types(other)?;

        let overridden: BTreeSet<u32> = other.rows.iter().map(|r| r[0]).collect();
        let mut rows = other.rows.clone();
        for row in &self.rows {
            if !overridden.contains(&row[0]) {
                rows.insert(row.clone());
            }
        }

        let types = match (&self.types, &other.types) {
            (Some(a), Some(b)) if a.len() == b.len() => {
                Some(a.iter().zip(b.iter()).map(|(x, y)| x.merged(y)).collect())
            }
            _ => None,
        };
        Ok(TupleSet::from_rows(&self.universe, arity, rows, types))
    }
}
