//! # Graph Benchmarks
//!
//! Performance benchmarks for layerconf-core closure, selection and merge.
//!
//! Run with: `cargo bench -p layerconf-core`

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use layerconf_core::{ConfigNode, Document, GraphStore, MergeEngine, NodeName, SelectionEngine};
use std::collections::BTreeMap;
use std::hint::black_box;

const LAYERS: usize = 4;

fn node_name(layer: usize, index: usize) -> String {
    format!("l{}_n{}", layer, index)
}

/// `LAYERS` layers of `width` nodes. Node i links to nodes i and i + 1 of
/// the next layer.
fn create_layered_graph(width: usize) -> GraphStore {
    let mut nodes = Vec::with_capacity(LAYERS * width);

    for layer in 0..LAYERS {
        for i in 0..width {
            let mut node = ConfigNode::new(node_name(layer, i), layer as u32)
                .with_parameters(Document::Mapping(BTreeMap::from([(
                    format!("layer{}", layer),
                    Document::Integer(i as i64),
                )])));
            if layer + 1 < LAYERS {
                node = node.with_children([node_name(layer + 1, i), node_name(layer + 1, (i + 1) % width)]);
            }
            if layer > 0 {
                let prev = (i + width - 1) % width;
                node = node.with_parents([node_name(layer - 1, i), node_name(layer - 1, prev)]);
            }
            nodes.push(node);
        }
    }

    GraphStore::build(nodes).expect("build")
}

/// Nested document with `keys` entries, each holding a small mapping.
fn create_document(keys: usize, value: i64) -> Document {
    Document::Mapping(
        (0..keys)
            .map(|k| {
                let inner = BTreeMap::from([
                    ("value".to_string(), Document::Integer(value)),
                    ("unset".to_string(), Document::Null),
                ]);
                (format!("key{}", k), Document::Mapping(inner))
            })
            .collect(),
    )
}

// =============================================================================
// BENCHMARKS
// =============================================================================

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_build");

    for width in [10, 100, 500].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, &width| {
            b.iter(|| black_box(create_layered_graph(width)));
        });
    }

    group.finish();
}

fn bench_set_selection(c: &mut Criterion) {
    let mut group = c.benchmark_group("set_selection");

    for width in [10, 100, 500].iter() {
        let graph = create_layered_graph(*width);
        let names = vec![NodeName::new(node_name(0, 0)), NodeName::new(node_name(1, 0))];

        group.bench_with_input(BenchmarkId::from_parameter(width), width, |b, _| {
            b.iter(|| {
                let mut engine = SelectionEngine::new(&graph);
                let _ = black_box(engine.set_selection(&graph, black_box(&names)));
            });
        });
    }

    group.finish();
}

fn bench_reset(c: &mut Criterion) {
    let graph = create_layered_graph(100);
    let mut engine = SelectionEngine::new(&graph);

    c.bench_function("reset", |b| {
        b.iter(|| {
            black_box(engine.reset(&graph));
        });
    });
}

fn bench_merge_layers(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_layers");

    for keys in [10, 100, 1000].iter() {
        let docs: Vec<Document> = (0..LAYERS as i64).map(|v| create_document(*keys, v)).collect();

        group.bench_with_input(BenchmarkId::from_parameter(keys), keys, |b, _| {
            b.iter(|| black_box(MergeEngine::merge_layers(docs.clone())));
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_build,
    bench_set_selection,
    bench_reset,
    bench_merge_layers,
);

criterion_main!(benches);
