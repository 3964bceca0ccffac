// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
#![allow(missing_docs)]
//! Benchmark: serialize and deserialize a cyclic fan mesh
//!
//! Throughput "elements" are vertices; each vertex carries up to three edges, so the
//! identity registry sees roughly 3n lookups per serialize pass.
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use graphwire_benches::fan_mesh;
use graphwire_core::{CborCodec, Deserializer, JsonCodec, Serializer, WireContainer};
use graphwire_dry_tests::mesh::dismantle;
use graphwire_dry_tests::Vertex;
use std::time::Duration;

const SIZES: [usize; 4] = [10, 100, 1_000, 10_000];

fn serialize_mesh(n: usize) -> WireContainer {
    let mesh = fan_mesh(n);
    let mut session = Serializer::new(CborCodec);
    let container = session
        .serialize(&mesh[0])
        .and_then(|_| session.into_container(false));
    dismantle(&mesh);
    match container {
        Ok(container) => container,
        Err(err) => unreachable!("fan mesh failed to serialize: {err}"),
    }
}

fn bench_serialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_serialize");
    group
        .warm_up_time(Duration::from_secs(2))
        .measurement_time(Duration::from_secs(6));
    for &n in &SIZES {
        group.throughput(Throughput::Elements(n as u64));
        group.bench_with_input(BenchmarkId::new("cbor", n), &n, |b, &n| {
            b.iter_batched(
                || fan_mesh(n),
                |mesh| {
                    let mut session = Serializer::new(CborCodec);
                    let root = session.serialize(&mesh[0]);
                    let container = session.into_container(false);
                    criterion::black_box((root.is_ok(), container.map(|c| c.len())));
                    dismantle(&mesh);
                },
                BatchSize::PerIteration,
            );
        });
        group.bench_with_input(BenchmarkId::new("json", n), &n, |b, &n| {
            b.iter_batched(
                || fan_mesh(n),
                |mesh| {
                    let mut session = Serializer::new(JsonCodec);
                    let root = session.serialize(&mesh[0]);
                    let container = session.into_container(false);
                    criterion::black_box((root.is_ok(), container.map(|c| c.len())));
                    dismantle(&mesh);
                },
                BatchSize::PerIteration,
            );
        });
    }
    group.finish();
}

fn bench_deserialize(c: &mut Criterion) {
    let mut group = c.benchmark_group("graph_deserialize");
    group
        .warm_up_time(Duration::from_secs(2))
        .measurement_time(Duration::from_secs(6));
    for &n in &SIZES {
        group.throughput(Throughput::Elements(n as u64));
        let container = serialize_mesh(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &container, |b, container| {
            b.iter_batched(
                || container.clone(),
                |container| {
                    let root = Deserializer::new(container, CborCodec)
                        .and_then(|mut session| session.deserialize_root(Vertex::default()));
                    if let Ok(root) = root {
                        criterion::black_box(root.borrow().edges.len());
                        dismantle(&[root]);
                    }
                },
                BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_serialize, bench_deserialize);
criterion_main!(benches);
