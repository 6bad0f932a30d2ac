use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sheet_preview::ingestion::{ingest_from_bytes, IngestionOptions};
use sheet_preview::processing::{run_pipeline, ColumnMapping};

fn synthetic_csv(rows: usize) -> Vec<u8> {
    let mut out = String::from("Sample ID,Mass (g),Batch,Checked\n");
    for i in 0..rows {
        if i % 50 == 0 {
            out.push_str(",,,\n");
            continue;
        }
        out.push_str(&format!("S-{i},{}.{},{},{}\n", i % 97, i % 10, i % 7, i % 2 == 0));
    }
    out.into_bytes()
}

fn bench_csv_preview(c: &mut Criterion) {
    let mapping = ColumnMapping::from_json_str(r#"{"sample_id":"id"}"#).unwrap_or_default();
    let opts = IngestionOptions::default();

    let mut group = c.benchmark_group("csv_preview");
    for rows in [1_000usize, 10_000, 100_000] {
        let bytes = synthetic_csv(rows);
        group.throughput(Throughput::Bytes(bytes.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(rows), &bytes, |b, bytes| {
            b.iter(|| {
                let df = ingest_from_bytes("bench.csv", black_box(bytes), &opts).unwrap();
                black_box(run_pipeline(df, &mapping).unwrap())
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_csv_preview);
criterion_main!(benches);
