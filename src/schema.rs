//! Signature graph: the static type metadata of a specification
//!
//! Sigs, fields, and column types are produced by the specification
//! compiler (outside this crate) and are immutable while solving. The
//! instance model uses them to assign each atom its most-specific sig,
//! to type-check algebra operators, and to look up the declared arity of
//! a relation before decoding it from a solver assignment.

use rustc_hash::FxHashMap;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use crate::error::{ModelError, Result};

/// Identifier of a sig within one [`SigGraph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SigId(u32);

impl SigId {
    /// Returns the position of this sig in its graph
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Identifier of a field within one [`SigGraph`]
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FieldId(u32);

impl FieldId {
    /// Returns the position of this field in its graph
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Multiplicity constraint on a sig's extent
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Multiplicity {
    /// Exactly one atom
    One,
    /// At most one atom
    Lone,
    /// At least one atom
    Some,
    /// Any number of atoms
    Any,
}

/// A declared signature: a type in the specification's hierarchy
#[derive(Debug)]
pub struct Sig {
    name: String,
    parent: Option<SigId>,
    is_abstract: bool,
    multiplicity: Multiplicity,
    fields: Vec<FieldId>,
}

impl Sig {
    /// Returns the name of this sig
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sig this sig extends, if any
    pub fn parent(&self) -> Option<SigId> {
        self.parent
    }

    /// Returns true if this sig is abstract
    pub fn is_abstract(&self) -> bool {
        self.is_abstract
    }

    /// Returns the multiplicity constraint on this sig
    pub fn multiplicity(&self) -> Multiplicity {
        self.multiplicity
    }

    /// Returns the fields declared by this sig, in declaration order
    pub fn fields(&self) -> &[FieldId] {
        &self.fields
    }
}

/// A typed relation declared inside a sig
///
/// The declared relation has arity `column_types.len() + 1`: the implicit
/// first column is the owning sig itself.
#[derive(Debug)]
pub struct Field {
    name: String,
    parent: SigId,
    column_types: Vec<ColumnType>,
}

impl Field {
    /// Returns the name of this field
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the sig that declares this field
    pub fn parent(&self) -> SigId {
        self.parent
    }

    /// Returns the declared column types beyond the implicit first column
    pub fn column_types(&self) -> &[ColumnType] {
        &self.column_types
    }

    /// Returns the arity of any tuple set bound to this field
    pub fn arity(&self) -> usize {
        self.column_types.len() + 1
    }
}

/// The set of sigs whose atoms may legally appear in one tuple column
///
/// Column types are plain sig-id sets; compatibility is a set-intersection
/// test modulo the extension hierarchy, so no dispatch is involved.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ColumnType {
    sigs: BTreeSet<SigId>,
}

impl ColumnType {
    /// A column type admitting atoms of a single sig (and its subsigs)
    pub fn of(sig: SigId) -> Self {
        let mut sigs = BTreeSet::new();
        sigs.insert(sig);
        Self { sigs }
    }

    /// A column type admitting atoms of any of the given sigs
    pub fn from_sigs(sigs: impl IntoIterator<Item = SigId>) -> Self {
        Self {
            sigs: sigs.into_iter().collect(),
        }
    }

    /// Returns the sigs in this column type
    pub fn sigs(&self) -> impl Iterator<Item = SigId> + '_ {
        self.sigs.iter().copied()
    }

    /// Returns the union of two column types
    pub fn merged(&self, other: &ColumnType) -> ColumnType {
        ColumnType {
            sigs: self.sigs.union(&other.sigs).copied().collect(),
        }
    }
}

/// A declared relation: a sig's extent or one of its fields
///
/// This is the key under which the instance manager stores valuations and
/// the translation stage registers variable bindings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RelationRef {
    /// The unary extent of a sig
    Sig(SigId),
    /// A declared field
    Field(FieldId),
}

impl From<SigId> for RelationRef {
    fn from(s: SigId) -> Self {
        RelationRef::Sig(s)
    }
}

impl From<FieldId> for RelationRef {
    fn from(f: FieldId) -> Self {
        RelationRef::Field(f)
    }
}

/// An immutable forest of sigs and their fields
///
/// Built once per specification compilation via [`SigGraphBuilder`].
pub struct SigGraph {
    sigs: Vec<Sig>,
    fields: Vec<Field>,
    by_name: FxHashMap<String, SigId>,
}

impl SigGraph {
    /// Returns the number of sigs in this graph
    pub fn sig_count(&self) -> usize {
        self.sigs.len()
    }

    /// Returns the sig with the given id
    pub fn sig(&self, id: SigId) -> &Sig {
        &self.sigs[id.index()]
    }

    /// Returns the field with the given id
    pub fn field(&self, id: FieldId) -> &Field {
        &self.fields[id.index()]
    }

    /// Looks up a sig by name
    pub fn sig_named(&self, name: &str) -> Option<SigId> {
        self.by_name.get(name).copied()
    }

    /// Returns all sigs with no parent
    pub fn top_level(&self) -> impl Iterator<Item = SigId> + '_ {
        self.sigs
            .iter()
            .enumerate()
            .filter(|(_, s)| s.parent.is_none())
            .map(|(i, _)| SigId(i as u32))
    }

    /// Returns true if `sub` is `sup` or a descendant of `sup`
    pub fn is_subsig(&self, sub: SigId, sup: SigId) -> bool {
        let mut cur = Some(sub);
        while let Some(id) = cur {
            if id == sup {
                return true;
            }
            cur = self.sig(id).parent;
        }
        false
    }

    /// Returns true if some sig of `a` is a subsig of some sig of `b`, or
    /// vice versa
    ///
    /// This is the compatibility test the algebra engine applies to matched
    /// or merged columns.
    pub fn compatible(&self, a: &ColumnType, b: &ColumnType) -> bool {
        a.sigs().any(|s| {
            b.sigs()
                .any(|t| self.is_subsig(s, t) || self.is_subsig(t, s))
        })
    }

    /// Refines `a` by `b`: the sigs of each side compatible with the other
    ///
    /// Falls back to `a`'s sigs when the refinement would be empty; runtime
    /// emptiness of an intersection is not a type error.
    pub fn refine(&self, a: &ColumnType, b: &ColumnType) -> ColumnType {
        let kept: BTreeSet<SigId> = a
            .sigs()
            .filter(|&s| {
                b.sigs()
                    .any(|t| self.is_subsig(s, t) || self.is_subsig(t, s))
            })
            .chain(b.sigs().filter(|&t| {
                a.sigs()
                    .any(|s| self.is_subsig(s, t) || self.is_subsig(t, s))
            }))
            .collect();
        if kept.is_empty() {
            a.clone()
        } else {
            ColumnType { sigs: kept }
        }
    }

    /// Returns the declared arity of a relation
    pub fn relation_arity(&self, rel: RelationRef) -> usize {
        match rel {
            RelationRef::Sig(_) => 1,
            RelationRef::Field(f) => self.field(f).arity(),
        }
    }

    /// Returns the declared column types of a relation
    ///
    /// For a field the implicit first column is the declaring sig.
    pub fn relation_column_types(&self, rel: RelationRef) -> Vec<ColumnType> {
        match rel {
            RelationRef::Sig(s) => vec![ColumnType::of(s)],
            RelationRef::Field(f) => {
                let field = self.field(f);
                let mut types = Vec::with_capacity(field.arity());
                types.push(ColumnType::of(field.parent));
                types.extend(field.column_types.iter().cloned());
                types
            }
        }
    }

    /// Returns a display name for a relation, e.g. `Person` or `Person.friends`
    pub fn relation_name(&self, rel: RelationRef) -> String {
        match rel {
            RelationRef::Sig(s) => self.sig(s).name.clone(),
            RelationRef::Field(f) => {
                let field = self.field(f);
                format!("{}.{}", self.sig(field.parent).name, field.name)
            }
        }
    }

    /// Returns every declared relation: all sig extents, then all fields
    pub fn relations(&self) -> impl Iterator<Item = RelationRef> + '_ {
        (0..self.sigs.len())
            .map(|i| RelationRef::Sig(SigId(i as u32)))
            .chain((0..self.fields.len()).map(|i| RelationRef::Field(FieldId(i as u32))))
    }
}

impl fmt::Debug for SigGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SigGraph")
            .field("sigs", &self.sigs.len())
            .field("fields", &self.fields.len())
            .finish()
    }
}

/// Builder for [`SigGraph`]
///
/// Sigs must be declared before they are referenced as parents or column
/// types, so the extension relation is a forest by construction.
pub struct SigGraphBuilder {
    sigs: Vec<Sig>,
    fields: Vec<Field>,
}

impl SigGraphBuilder {
    /// Creates an empty builder
    pub fn new() -> Self {
        Self {
            sigs: Vec::new(),
            fields: Vec::new(),
        }
    }

    /// Declares a sig and returns its id
    pub fn sig(
        &mut self,
        name: impl Into<String>,
        parent: Option<SigId>,
        is_abstract: bool,
        multiplicity: Multiplicity,
    ) -> SigId {
        let id = SigId(self.sigs.len() as u32);
        self.sigs.push(Sig {
            name: name.into(),
            parent,
            is_abstract,
            multiplicity,
            fields: Vec::new(),
        });
        id
    }

    /// Declares a field on `parent` and returns its id
    pub fn field(
        &mut self,
        parent: SigId,
        name: impl Into<String>,
        column_types: Vec<ColumnType>,
    ) -> FieldId {
        let id = FieldId(self.fields.len() as u32);
        self.fields.push(Field {
            name: name.into(),
            parent,
            column_types,
        });
        self.sigs[parent.index()].fields.push(id);
        id
    }

    /// Validates and freezes the graph
    ///
    /// # Errors
    /// Returns an error on duplicate sig names, dangling sig references, or
    /// an extension edge that does not point at an earlier declaration
    /// (which would make the extension relation cyclic).
    pub fn build(self) -> Result<Arc<SigGraph>> {
        let mut by_name = FxHashMap::default();
        for (i, sig) in self.sigs.iter().enumerate() {
            if by_name.insert(sig.name.clone(), SigId(i as u32)).is_some() {
                return Err(ModelError::InvalidArgument(format!(
                    "duplicate sig name: {}",
                    sig.name
                )));
            }
            if let Some(parent) = sig.parent {
                if parent.index() >= i {
                    return Err(ModelError::InvalidArgument(format!(
                        "sig {} extends a sig declared after it",
                        sig.name
                    )));
                }
            }
        }
        for field in &self.fields {
            if field.parent.index() >= self.sigs.len() {
                return Err(ModelError::InvalidArgument(format!(
                    "field {} declared on unknown sig",
                    field.name
                )));
            }
            for ty in &field.column_types {
                for sig in ty.sigs() {
                    if sig.index() >= self.sigs.len() {
                        return Err(ModelError::InvalidArgument(format!(
                            "field {} references unknown sig in column type",
                            field.name
                        )));
                    }
                }
            }
        }
        Ok(Arc::new(SigGraph {
            sigs: self.sigs,
            fields: self.fields,
            by_name,
        }))
    }
}

impl Default for SigGraphBuilder {
    fn default() -> Self {
        Self::new()
    }
}
