//! Benchmarks for single-file transpilation and whole-project bundling.
//!
//! # Run Benchmarks
//!
//! ```bash
//! cargo bench --bench compile
//! ```

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;
use std::sync::Arc;
use uigen_bundler::{Bundler, TranspileCache, transpile};
use uigen_core::ExternalModules;
use uigen_vfs::{FileSystem, FilesBuilder, VfsPath};

const CARD: &str = r#"import { useState } from 'react';
import { Heart } from 'lucide-react';

interface CardProps {
  title: string;
  likes?: number;
}

export default function Card({ title, likes = 0 }: CardProps) {
  const [count, setCount] = useState<number>(likes);
  return (
    <div className="rounded-lg p-4 shadow">
      <h2 className="text-xl">{title}</h2>
      <button onClick={() => setCount(count + 1)} aria-label="like">
        <Heart size={16} /> {count}
      </button>
    </div>
  );
}
"#;

fn project(card_count: usize) -> FileSystem {
    let imports: String = (0..card_count)
        .map(|i| format!("import Card{i} from './components/Card{i}';\n"))
        .collect();
    let uses: String = (0..card_count)
        .map(|i| format!("      <Card{i} title=\"Card {i}\" />\n"))
        .collect();
    let mut builder = FilesBuilder::new().add_file(
        "/App.jsx",
        format!("{imports}\nexport default function App() {{\n  return (\n    <main>\n{uses}    </main>\n  );\n}}\n"),
    );
    for i in 0..card_count {
        builder = builder.add_file(format!("/components/Card{i}.tsx"), CARD);
    }
    builder.build().unwrap()
}

fn bench_transpile(c: &mut Criterion) {
    let path = VfsPath::new("/components/Card.tsx").unwrap();
    c.bench_function("transpile_tsx_component", |b| {
        b.iter(|| black_box(transpile(&path, black_box(CARD)).unwrap()));
    });
}

fn bench_bundle(c: &mut Criterion) {
    let mut group = c.benchmark_group("bundle");

    for card_count in [1, 10, 50] {
        let fs = project(card_count);
        let cold = Bundler::new(ExternalModules::default());
        let warm = Bundler::new(ExternalModules::default())
            .with_cache(Arc::new(TranspileCache::new(card_count + 1)));

        group.bench_with_input(BenchmarkId::new("uncached", card_count), &fs, |b, fs| {
            b.iter(|| black_box(cold.bundle(fs).unwrap()));
        });
        group.bench_with_input(BenchmarkId::new("cached", card_count), &fs, |b, fs| {
            b.iter(|| black_box(warm.bundle(fs).unwrap()));
        });
    }

    group.finish();
}

criterion_group!(benches, bench_transpile, bench_bundle);
criterion_main!(benches);
