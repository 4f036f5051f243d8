use criterion::{black_box, criterion_group, criterion_main, Criterion};
use relfinder::instance::{AtomDecl, TupleSet, Universe};
use relfinder::schema::{Multiplicity, SigGraphBuilder};

/// A universe of n atoms with a dense random-ish binary relation
fn edge_relation(n: usize) -> (Universe, TupleSet) {
    let mut b = SigGraphBuilder::new();
    let sig = b.sig("Node", None, false, Multiplicity::Any);
    let graph = b.build().unwrap();

    let decls: Vec<AtomDecl> = (0..n)
        .map(|i| AtomDecl::new(format!("N{}", i), sig))
        .collect();
    let universe = Universe::new(graph, &decls).unwrap();

    // Edges i -> (i*7 + 3) mod n, plus a chain, for a connected graph
    let mut rows: Vec<Vec<_>> = Vec::new();
    for i in 0..n {
        let j = (i * 7 + 3) % n;
        rows.push(vec![
            universe.atom(i).unwrap(),
            universe.atom(j).unwrap(),
        ]);
        rows.push(vec![
            universe.atom(i).unwrap(),
            universe.atom((i + 1) % n).unwrap(),
        ]);
    }
    let refs: Vec<&[_]> = rows.iter().map(|r| r.as_slice()).collect();
    let edges = TupleSet::of(&universe, &refs).unwrap();
    (universe, edges)
}

fn algebra_benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("algebra");

    let (_, edges_small) = edge_relation(20);
    group.bench_function("closure_20", |b| {
        b.iter(|| black_box(&edges_small).closure().unwrap());
    });

    let (_, edges_large) = edge_relation(100);
    group.bench_function("closure_100", |b| {
        b.iter(|| black_box(&edges_large).closure().unwrap());
    });

    group.bench_function("self_join_100", |b| {
        b.iter(|| black_box(&edges_large).join(&edges_large).unwrap());
    });

    let (universe, edges) = edge_relation(50);
    let all = universe.all_atoms();
    group.bench_function("product_then_difference_50", |b| {
        b.iter(|| {
            let square = black_box(&all).product(&all).unwrap();
            square.difference(&edges).unwrap()
        });
    });

    group.finish();
}

criterion_group!(benches, algebra_benchmarks);
criterion_main!(benches);
