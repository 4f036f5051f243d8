//! The ordering scenario: a three-atom chain and its derived relations

use relfinder::instance::{AtomDecl, TupleSet, Universe};
use relfinder::schema::{Multiplicity, SigGraphBuilder};

fn chain_universe() -> Universe {
    let mut b = SigGraphBuilder::new();
    let sig = b.sig("A", None, false, Multiplicity::Any);
    let graph = b.build().unwrap();
    let decls = vec![
        AtomDecl::new("A0", sig),
        AtomDecl::new("A1", sig),
        AtomDecl::new("A2", sig),
    ];
    Universe::new(graph, &decls).unwrap()
}

fn pairs(universe: &Universe, rows: &[(usize, usize)]) -> TupleSet {
    let atom_rows: Vec<Vec<_>> = rows
        .iter()
        .map(|&(a, b)| vec![universe.atom(a).unwrap(), universe.atom(b).unwrap()])
        .collect();
    let refs: Vec<&[_]> = atom_rows.iter().map(|r| r.as_slice()).collect();
    TupleSet::of(universe, &refs).unwrap()
}

#[test]
fn closure_join_and_transpose_of_a_chain() {
    let universe = chain_universe();
    let next = pairs(&universe, &[(0, 1), (1, 2)]);

    assert_eq!(
        next.closure().unwrap(),
        pairs(&universe, &[(0, 1), (1, 2), (0, 2)])
    );
    assert_eq!(next.join(&next).unwrap(), pairs(&universe, &[(0, 2)]));
    assert_eq!(
        next.transpose().unwrap(),
        pairs(&universe, &[(1, 0), (2, 1)])
    );
}

#[test]
fn first_and_last_of_the_chain() {
    let universe = chain_universe();
    let next = pairs(&universe, &[(0, 1), (1, 2)]);
    let all = universe.all_atoms();

    // Atoms with a successor, and atoms that are successors
    let has_next = next.join(&all).unwrap();
    let is_next = all.join(&next).unwrap();

    let first = all.difference(&is_next).unwrap();
    let last = all.difference(&has_next).unwrap();

    let a0 = universe.atom(0).unwrap().as_tuple_set();
    let a2 = universe.atom(2).unwrap().as_tuple_set();
    assert_eq!(first, a0);
    assert_eq!(last, a2);
}

#[test]
fn reachability_through_closure() {
    let universe = chain_universe();
    let next = pairs(&universe, &[(0, 1), (1, 2)]);
    let a0 = universe.atom(0).unwrap();

    let reachable = a0.join(&next.closure().unwrap()).unwrap();
    let a1 = universe.atom(1).unwrap();
    let a2 = universe.atom(2).unwrap();
    let expected = a1.as_tuple_set().union(&a2.as_tuple_set()).unwrap();
    assert_eq!(reachable, expected);

    // Reflexive closure also reaches the atom itself
    let reachable_star = a0.join(&next.reflexive_closure().unwrap()).unwrap();
    assert_eq!(reachable_star.size(), 3);
}
