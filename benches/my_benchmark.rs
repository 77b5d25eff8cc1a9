use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use minidb::{Database, Value};
use std::hint::black_box;
use std::sync::Arc;

fn setup_populated_db(n: usize) -> Database {
    let mut db = Database::new();

    db.parse("CREATE TABLE users (id INT PRIMARY KEY, name VARCHAR(32), age INT, active BOOL);")
        .unwrap();
    db.parse("CREATE TABLE orders (user_id INT, total DOUBLE);")
        .unwrap();

    let users = db.get_table_mut("users").unwrap();
    for i in 0..n {
        let row = vec![
            Value::Int(i as i32),
            Value::Text(Arc::from(format!("user{}", i).as_str())),
            Value::Int((i % 100) as i32),
            Value::Bool(i % 2 == 0),
        ];
        users.insert(row).unwrap();
    }

    let orders = db.get_table_mut("orders").unwrap();
    for i in 0..n / 10 {
        let row = vec![Value::Int((i * 7 % n) as i32), Value::Double(i as f64 * 1.5)];
        orders.insert(row).unwrap();
    }
    db
}

fn bench_insert_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("Insert_SQL_Pipeline");
    group.bench_function("insert_single_row_sql", |b| {
        let mut db = Database::new();
        db.parse("CREATE TABLE tests (id INT, val INT);").unwrap();
        b.iter(|| {
            // `id` is the primary key, NULL keys never collide.
            db.parse(black_box("INSERT INTO tests VALUES (NULL, 42);"))
                .unwrap();
        });
    });
    group.finish();
}

fn bench_select_scaling(c: &mut Criterion) {
    let mut group = c.benchmark_group("Select_Where_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let db = setup_populated_db(n);
            b.iter(|| {
                let res = db
                    .query("SELECT * FROM users WHERE age = 42 OR NOT active AND age < 3;")
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

fn bench_update_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Update_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |mut db| {
                    db.parse("UPDATE users SET age = 99 WHERE active = TRUE;")
                        .unwrap();
                    black_box(db);
                },
            );
        });
    }
    group.finish();
}

fn bench_delete_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Delete_Performance");

    for n in [1000, 10000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            b.iter_with_setup(
                || setup_populated_db(n),
                |mut db| {
                    db.parse("DELETE FROM users WHERE age > 90;").unwrap();
                    black_box(db);
                },
            );
        });
    }
    group.finish();
}

fn bench_join_performance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Join_Performance");

    for n in [1000, 5000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(n), n, |b, &n| {
            let db = setup_populated_db(n);
            b.iter(|| {
                let res = db
                    .query("SELECT name, total FROM users LEFT JOIN orders ON users.id = orders.user_id;")
                    .unwrap();
                black_box(res);
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_insert_sql,
    bench_select_scaling,
    bench_update_performance,
    bench_delete_performance,
    bench_join_performance
);
criterion_main!(benches);
