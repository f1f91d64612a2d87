//! Two-stage pipeline over an SPSC queue.
//!
//! A producer thread emits sensor readings; the consumer thread keeps a
//! running summary. Shows both storages and the caller-side waiting policy
//! (the queue itself never blocks).
//!
//! Run with: cargo run --release --example pipeline --features tracing

use crossbeam_utils::Backoff;
use ringspsc_rs::{init_tracing, HeapQueue, InlineQueue, SpscQueue, Storage, LOW_LATENCY_CONFIG};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Instant;

const READINGS: u64 = 2_000_000;

#[derive(Debug, Clone, Copy)]
struct Reading {
    sensor: u16,
    value: f32,
}

#[derive(Debug, Default)]
struct Summary {
    count: u64,
    sum: f64,
    max: f32,
    full_rejections: u64,
}

fn run<S: Storage<Reading> + Send>(label: &str, queue: &mut SpscQueue<Reading, S>) {
    let done = AtomicBool::new(false);
    let start = Instant::now();
    let (mut producer, mut consumer) = queue.split();

    let summary = thread::scope(|s| {
        let done = &done;
        let rejections = s.spawn(move || {
            let mut rejections = 0u64;
            for i in 0..READINGS {
                let reading = Reading {
                    sensor: (i % 16) as u16,
                    value: (i % 1000) as f32 * 0.1,
                };
                let backoff = Backoff::new();
                while !producer.push(reading) {
                    rejections += 1;
                    backoff.snooze();
                }
            }
            done.store(true, Ordering::Release);
            rejections
        });

        let mut summary = Summary::default();
        let mut record = |r: Reading| {
            summary.count += 1;
            summary.sum += f64::from(r.value);
            summary.max = summary.max.max(r.value);
            debug_assert!(r.sensor < 16);
        };

        let backoff = Backoff::new();
        while !done.load(Ordering::Acquire) {
            match consumer.pop() {
                Some(r) => {
                    record(r);
                    backoff.reset();
                }
                None => backoff.snooze(),
            }
        }
        consumer.drain().for_each(&mut record);

        summary.full_rejections = rejections.join().unwrap_or_default();
        summary
    });

    let elapsed = start.elapsed();
    println!(
        "{:<8} {:>9} readings in {:>8.2?} ({:>6.1} M/s), mean {:.2}, max {:.1}, producer saw full {} times",
        label,
        summary.count,
        elapsed,
        summary.count as f64 / elapsed.as_secs_f64() / 1e6,
        summary.sum / summary.count as f64,
        summary.max,
        summary.full_rejections,
    );
}

fn main() {
    init_tracing();

    match HeapQueue::<Reading>::with_config(LOW_LATENCY_CONFIG) {
        Ok(mut queue) => run("heap", &mut queue),
        Err(e) => eprintln!("heap queue unavailable: {}", e),
    }

    let mut queue: Box<InlineQueue<Reading, 4095>> = Box::default();
    run("inline", &mut *queue);
}
