// Allow our dollar.cents digit grouping convention (e.g., 100_00 = $100.00)
#![allow(clippy::inconsistent_digit_grouping)]

//! Throughput benchmarks for the matching engine and book registry.
//!
//! Measures performance of core operations:
//! - Order submission (with and without matching)
//! - Order cancellation
//! - Market order execution
//! - Book queries (BBO, depth)
//! - Multi-symbol routing

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use simulator_core::{
    Book, BookRegistry, Ledger, OrderId, OrderType, ParticipantId, Price, RiskLimits, Side, Symbol,
};

const HUGE_CASH: i64 = 1_000_000_000_000;

fn participant() -> ParticipantId {
    ParticipantId::new("bench")
}

fn ledger_with_huge_cash() -> Ledger {
    let ledger = Ledger::new();
    ledger.add_participant(participant(), HUGE_CASH).unwrap();
    ledger
}

fn symbol() -> Symbol {
    Symbol::new("AAPL")
}

/// Build a book with N price levels on each side.
fn build_book(levels: usize, orders_per_level: usize) -> Book {
    let ledger = ledger_with_huge_cash();
    let mut book = Book::new(symbol(), ledger, RiskLimits::unlimited(), None);

    for i in 0..levels {
        let price = Price(99_00 - (i as i64) * 100);
        for _ in 0..orders_per_level {
            book.submit_order(participant(), Side::Buy, OrderType::Limit, price, 100).unwrap();
        }
    }
    for i in 0..levels {
        let price = Price(101_00 + (i as i64) * 100);
        for _ in 0..orders_per_level {
            book.submit_order(participant(), Side::Sell, OrderType::Limit, price, 100).unwrap();
        }
    }

    book
}

fn bench_submit_no_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_no_match");

    for levels in [10, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            let mut book = build_book(levels, 1);
            let mut price_offset = 0i64;

            b.iter(|| {
                // Submit at a price that won't match (bid below best bid).
                let price = Price(50_00 - price_offset);
                price_offset = (price_offset + 1) % 1000;
                black_box(book.submit_order(participant(), Side::Buy, OrderType::Limit, price, 100).unwrap())
            });
        });
    }

    group.finish();
}

fn bench_submit_with_match(c: &mut Criterion) {
    let mut group = c.benchmark_group("submit_with_match");
    group.throughput(Throughput::Elements(1));

    group.bench_function("single_fill", |b| {
        b.iter_batched(
            || {
                let ledger = ledger_with_huge_cash();
                let mut book = Book::new(symbol(), ledger, RiskLimits::unlimited(), None);
                book.submit_order(participant(), Side::Sell, OrderType::Limit, Price(100_00), 100)
                    .unwrap();
                book
            },
            |mut book| {
                black_box(
                    book.submit_order(participant(), Side::Buy, OrderType::Limit, Price(100_00), 100)
                        .unwrap(),
                )
            },
            criterion::BatchSize::SmallInput,
        );
    });

    group.finish();
}

fn bench_cancel(c: &mut Criterion) {
    let mut group = c.benchmark_group("cancel");

    for num_orders in [10, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(num_orders), &num_orders, |b, &num_orders| {
            b.iter_batched(
                || {
                    let ledger = ledger_with_huge_cash();
                    let mut book = Book::new(symbol(), ledger, RiskLimits::unlimited(), None);
                    let mut last = OrderId(0);
                    for _ in 0..num_orders {
                        last = book
                            .submit_order(participant(), Side::Buy, OrderType::Limit, Price(100_00), 100)
                            .unwrap()
                            .order_id;
                    }
                    (book, last)
                },
                |(mut book, order_id)| black_box(book.cancel_order(order_id)),
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_market_sweep(c: &mut Criterion) {
    let mut group = c.benchmark_group("market_sweep");

    for levels_to_sweep in [1, 5, 10] {
        group.throughput(Throughput::Elements(levels_to_sweep as u64));
        group.bench_with_input(BenchmarkId::from_parameter(levels_to_sweep), &levels_to_sweep, |b, &levels| {
            b.iter_batched(
                || build_book(20, 1),
                |mut book| {
                    let qty = levels as u64 * 100;
                    black_box(book.submit_order(participant(), Side::Buy, OrderType::Market, Price::ZERO, qty).unwrap())
                },
                criterion::BatchSize::SmallInput,
            );
        });
    }

    group.finish();
}

fn bench_bbo_query(c: &mut Criterion) {
    let mut group = c.benchmark_group("bbo_query");

    for levels in [10, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(levels), &levels, |b, &levels| {
            let book = build_book(levels, 10);
            b.iter(|| black_box((book.best_bid(), book.best_ask())));
        });
    }

    group.finish();
}

fn bench_depth_snapshot(c: &mut Criterion) {
    let mut group = c.benchmark_group("depth_snapshot");

    let book = build_book(100, 10);

    for depth in [5, 10, 20] {
        group.throughput(Throughput::Elements(depth as u64 * 2)); // Both sides
        group.bench_with_input(BenchmarkId::from_parameter(depth), &depth, |b, &depth| {
            b.iter(|| black_box(book.book_depth(depth)));
        });
    }

    group.finish();
}

fn bench_multi_symbol(c: &mut Criterion) {
    let mut group = c.benchmark_group("multi_symbol");

    for num_symbols in [10, 100, 1000] {
        group.throughput(Throughput::Elements(1));
        group.bench_with_input(BenchmarkId::from_parameter(num_symbols), &num_symbols, |b, &num_symbols| {
            let registry = BookRegistry::new(ledger_with_huge_cash());
            let symbols: Vec<Symbol> = (0..num_symbols).map(|i| Symbol::new(&format!("S{:05}", i))).collect();
            for sym in &symbols {
                registry.get_or_create(*sym);
            }

            let mut i = 0;
            b.iter(|| {
                let sym = symbols[i % num_symbols];
                i += 1;
                black_box(
                    registry
                        .submit_order(sym, participant(), Side::Buy, OrderType::Limit, Price(100_00), 100)
                        .unwrap(),
                )
            });
        });
    }
    group.finish();
}

criterion_group!(
    benches,
    bench_submit_no_match,
    bench_submit_with_match,
    bench_cancel,
    bench_market_sweep,
    bench_bbo_query,
    bench_depth_snapshot,
    bench_multi_symbol,
);

criterion_main!(benches);
