//! Benchmarks for snapshot hydration and directory renames.
//!
//! # Run Benchmarks
//!
//! ```bash
//! cargo bench --bench vfs_benchmarks
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use uigen_vfs::{FileSystem, FilesBuilder};

fn project(file_count: usize) -> FileSystem {
    let mut builder = FilesBuilder::new().add_file(
        "/App.jsx",
        "import Card from './components/Card0';\nexport default function App() { return <Card />; }\n",
    );
    for i in 0..file_count {
        builder = builder.add_file(
            format!("/components/Card{i}.jsx"),
            format!("export default function Card{i}() {{\n  return <div className=\"p-4\">Card {i}</div>;\n}}\n"),
        );
    }
    builder.build().unwrap()
}

fn bench_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("snapshot");

    for file_count in [1, 10, 50, 200] {
        let fs = project(file_count);
        let snapshot = fs.serialize().unwrap();

        group.bench_with_input(BenchmarkId::new("serialize", file_count), &fs, |b, fs| {
            b.iter(|| black_box(fs.serialize().unwrap()));
        });
        group.bench_with_input(
            BenchmarkId::new("deserialize", file_count),
            &snapshot,
            |b, snapshot| {
                b.iter(|| black_box(FileSystem::deserialize(snapshot).unwrap()));
            },
        );
    }

    group.finish();
}

fn bench_directory_rename(c: &mut Criterion) {
    let mut group = c.benchmark_group("rename_directory");

    for file_count in [10, 50, 200] {
        let fs = project(file_count);
        group.bench_with_input(BenchmarkId::from_parameter(file_count), &fs, |b, fs| {
            b.iter_batched(
                || fs.clone(),
                |mut fs| {
                    fs.rename("/components", "/src/components").unwrap();
                    fs
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

criterion_group!(benches, bench_snapshot, bench_directory_rename);
criterion_main!(benches);
