//! Benchmark comparing InlineQueue (no allocation) vs HeapQueue
//!
//! Measures single-threaded push/pop cost and two-thread SPSC throughput
//! for both storages, to quantify what the pointer indirection of the heap
//! buffer costs.
//!
//! Run with: cargo bench --bench spsc_throughput

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use crossbeam_utils::Backoff;
use ringspsc_rs::{HeapQueue, InlineQueue, SpscQueue, Storage};
use std::thread;

const MSG_COUNT: u64 = 1_000_000;
const CAPACITY: usize = 4095;

// =============================================================================
// SINGLE-THREADED BENCHMARKS (no threading overhead)
// =============================================================================

/// Push a burst, pop it back, repeat until `MSG_COUNT` values have cycled.
fn cycle<S: Storage<u64>>(queue: &mut SpscQueue<u64, S>) -> u64 {
    let (mut producer, mut consumer) = queue.split();
    let mut sent = 0u64;
    let mut received = 0u64;

    while received < MSG_COUNT {
        while sent < MSG_COUNT && producer.push(black_box(sent)) {
            sent += 1;
        }
        while let Some(v) = consumer.pop() {
            black_box(v);
            received += 1;
        }
    }
    received
}

fn bench_single_thread(c: &mut Criterion) {
    let mut group = c.benchmark_group("single_thread");
    group.throughput(Throughput::Elements(MSG_COUNT));

    group.bench_function("heap_queue", |b| {
        let mut queue = HeapQueue::<u64>::with_capacity(CAPACITY).unwrap();
        b.iter(|| cycle(&mut queue));
    });

    group.bench_function("inline_queue", |b| {
        let mut queue: Box<InlineQueue<u64, CAPACITY>> = Box::default();
        b.iter(|| cycle(&mut *queue));
    });

    group.finish();
}

// =============================================================================
// MULTI-THREADED SPSC BENCHMARKS
// =============================================================================

/// One producer thread, one consumer thread, both backing off on failure.
fn transfer<S: Storage<u64> + Send>(queue: &mut SpscQueue<u64, S>) -> u64 {
    let (mut producer, mut consumer) = queue.split();

    thread::scope(|s| {
        s.spawn(move || {
            for i in 0..MSG_COUNT {
                let backoff = Backoff::new();
                while !producer.push(i) {
                    backoff.snooze();
                }
            }
        });

        let mut sum = 0u64;
        let mut received = 0u64;
        let backoff = Backoff::new();
        while received < MSG_COUNT {
            match consumer.pop() {
                Some(v) => {
                    sum = sum.wrapping_add(v);
                    received += 1;
                    backoff.reset();
                }
                None => backoff.snooze(),
            }
        }
        sum
    })
}

fn bench_spsc(c: &mut Criterion) {
    let mut group = c.benchmark_group("spsc_throughput");
    group.throughput(Throughput::Elements(MSG_COUNT));
    group.sample_size(20);

    group.bench_function("heap_queue", |b| {
        let mut queue = HeapQueue::<u64>::with_capacity(CAPACITY).unwrap();
        b.iter(|| black_box(transfer(&mut queue)));
    });

    group.bench_function("inline_queue", |b| {
        let mut queue: Box<InlineQueue<u64, CAPACITY>> = Box::default();
        b.iter(|| black_box(transfer(&mut *queue)));
    });

    group.finish();
}

// =============================================================================
// ZERO-SIZED SIGNALS
// =============================================================================

fn bench_unit_signals(c: &mut Criterion) {
    let mut group = c.benchmark_group("unit_signals");
    group.throughput(Throughput::Elements(MSG_COUNT));

    group.bench_function("heap_queue_unit", |b| {
        let mut queue = HeapQueue::<()>::with_capacity(CAPACITY).unwrap();
        b.iter(|| {
            let (mut producer, mut consumer) = queue.split();
            let mut received = 0u64;
            while received < MSG_COUNT {
                while producer.push(()) {}
                while consumer.pop().is_some() {
                    received += 1;
                }
            }
            received
        });
    });

    group.finish();
}

criterion_group!(benches, bench_single_thread, bench_spsc, bench_unit_signals);
criterion_main!(benches);
