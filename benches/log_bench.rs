use std::io::Read;

use criterion::{Criterion, criterion_group, criterion_main};
use seglog::{Config, Log, Record, SegmentConfig};
use tempfile::tempdir;

fn bench_config() -> Config {
    Config {
        segment: SegmentConfig {
            max_store_bytes: 4 * 1024 * 1024,
            max_index_bytes: 1024 * 1024,
            initial_offset: 0,
        },
    }
}

fn bench_append(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let dir = tempdir().unwrap();
    let log = Log::open(dir.path(), bench_config()).unwrap();

    let record = Record::new(b"Hello World!".to_vec());

    c.bench_function("append_record", |b| {
        b.to_async(&rt).iter(|| async {
            log.append(record.clone()).await.unwrap();
        });
    });
}

fn bench_append_1000(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let dir = tempdir().unwrap();
    let log = Log::open(dir.path(), bench_config()).unwrap();

    let value = r#"{"user": "123456", "name": "bob", "number": "123456789"}"#.to_string();
    let record = Record::new(value.into_bytes());

    c.bench_function("append_1000_records", |b| {
        b.to_async(&rt).iter(|| async {
            for _i in 0..1000 {
                log.append(record.clone()).await.unwrap();
            }
        });
    });
}

fn bench_read_1000(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let dir = tempdir().unwrap();
    let log = Log::open(dir.path(), bench_config()).unwrap();

    let value = r#"{"user": "123456", "name": "bob", "number": "123456789"}"#.to_string();
    let record = Record::new(value.into_bytes());

    // Pre-fill the log with 1000 records
    for _i in 0..1000 {
        rt.block_on(log.append(record.clone())).unwrap();
    }

    c.bench_function("read_1000_linear", |b| {
        b.to_async(&rt).iter(|| async {
            for off in 0..1000 {
                log.read(off).await.unwrap();
            }
        });
    });
}

fn bench_whole_log_reader(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .unwrap();
    let dir = tempdir().unwrap();
    let log = Log::open(dir.path(), bench_config()).unwrap();

    let value = r#"{"user": "123456", "name": "bob", "number": "123456789"}"#.to_string();
    let record = Record::new(value.into_bytes());

    for _i in 0..1000 {
        rt.block_on(log.append(record.clone())).unwrap();
    }

    c.bench_function("drain_whole_log", |b| {
        b.to_async(&rt).iter(|| async {
            let mut reader = log.reader().await;
            let mut bytes = Vec::new();
            reader.read_to_end(&mut bytes).unwrap();
            assert!(!bytes.is_empty());
        });
    });
}

criterion_group!(
    benches,
    bench_append,
    bench_append_1000,
    bench_read_1000,
    bench_whole_log_reader
);
criterion_main!(benches);
