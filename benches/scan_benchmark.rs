use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use serde_json::{Value, json};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use appmap_scanner::{AppMap, AppMapContext, Configuration, RuleChecker, load_config, scan_appmaps};

/// `requests` GET requests, each a controller call issuing `queries` similar
/// SQL queries.
fn appmap_json(requests: usize, queries: usize) -> String {
    let mut events: Vec<Value> = Vec::new();
    let mut id = 0u64;
    let mut next = || {
        id += 1;
        id
    };
    for r in 0..requests {
        let request = next();
        events.push(json!({
            "id": request, "event": "call", "thread_id": 1,
            "http_server_request": {"request_method": "GET", "path_info": format!("/orders/{r}"),
                "normalized_path_info": "/orders/:id"}
        }));
        let controller = next();
        events.push(json!({
            "id": controller, "event": "call", "thread_id": 1,
            "defined_class": "OrdersController", "method_id": "show",
            "path": "app/controllers/orders_controller.rb", "lineno": 12, "static": false
        }));
        for q in 0..queries {
            let query = next();
            events.push(json!({
                "id": query, "event": "call", "thread_id": 1,
                "sql_query": {"sql": format!("SELECT * FROM line_items WHERE order_id = {q}"),
                    "database_type": "postgres"}
            }));
            events.push(json!({"id": next(), "event": "return", "thread_id": 1,
                "parent_id": query, "elapsed": 0.001}));
        }
        events.push(json!({"id": next(), "event": "return", "thread_id": 1,
            "parent_id": controller, "elapsed": 0.01}));
        let status = if r % 10 == 0 { 500 } else { 200 };
        events.push(json!({
            "id": next(), "event": "return", "thread_id": 1, "parent_id": request, "elapsed": 0.02,
            "http_server_response": {"status": status,
                "headers": {"Content-Type": "application/json"}}
        }));
    }
    json!({"metadata": {"name": "benchmark", "app": "storefront"}, "classMap": [], "events": events})
        .to_string()
}

fn setup_appmap_files(count: usize) -> (TempDir, Vec<PathBuf>) {
    let temp_dir = TempDir::new().unwrap();
    let content = appmap_json(20, 8);
    let files = (0..count)
        .map(|i| {
            let path = temp_dir.path().join(format!("test_{i}.appmap.json"));
            fs::write(&path, &content).unwrap();
            path
        })
        .collect();
    (temp_dir, files)
}

fn benchmark_directory_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("directory_scan");

    for count in [1, 10, 50].iter() {
        let (_temp_dir, files) = setup_appmap_files(*count);

        group.bench_with_input(BenchmarkId::new("files", count), count, |b, _| {
            b.iter(|| {
                let config = load_config(Configuration::default(), true).unwrap();
                let result = scan_appmaps(black_box(&files), config);
                black_box(result)
            });
        });
    }

    group.finish();
}

fn benchmark_parse_and_label(c: &mut Criterion) {
    let content = appmap_json(200, 10);

    c.bench_function("parse_and_label", |b| {
        b.iter(|| {
            let appmap = AppMap::from_json(black_box(&content)).unwrap();
            black_box(AppMapContext::new(appmap))
        });
    });
}

fn benchmark_default_checks(c: &mut Criterion) {
    let context = AppMapContext::new(AppMap::from_json(&appmap_json(200, 10)).unwrap());
    let config = load_config(Configuration::default(), true).unwrap();
    let checker = RuleChecker::new();

    c.bench_function("default_checks", |b| {
        b.iter(|| {
            let mut findings = Vec::new();
            for check in &config.checks {
                let mut instance = check.instantiate().unwrap();
                checker
                    .check("bench.appmap.json", black_box(&context), &mut instance, &mut findings)
                    .unwrap();
            }
            black_box(findings)
        });
    });
}

criterion_group!(
    benches,
    benchmark_directory_scan,
    benchmark_parse_and_label,
    benchmark_default_checks
);
criterion_main!(benches);
