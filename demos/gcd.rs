//! Greatest Common Divisor
//!
//! This example demonstrates a non-blocking repetitive command:
//!
//! ```text
//! *[x > y -> x := x - y | y > x -> y := y - x]
//! ```
//!
//! Key concepts:
//! - Guards without input
//! - Fresh guard sets per attempt so preconditions see current state
//! - Exhaustion as the loop's only exit
//! - Seeded engines for reproducible runs
//!
//! Run with: cargo run --example gcd

use guarded::builder::GuardBuilder;
use guarded::config::AlternationConfig;
use guarded::engine::Alternation;
use guarded::guard_set;
use std::sync::atomic::{AtomicU64, Ordering::SeqCst};

fn main() {
    println!("=== Greatest Common Divisor ===\n");

    let config = AlternationConfig::builder().seed(42).build().unwrap();
    let mut engine = Alternation::with_config(config).unwrap();

    for (a, b) in [(12, 18), (1071, 462), (17, 5)] {
        let x = AtomicU64::new(a);
        let y = AtomicU64::new(b);
        let (x, y) = (&x, &y);

        let report = engine
            .repeat(move || {
                let (xv, yv) = (x.load(SeqCst), y.load(SeqCst));
                guard_set![
                    GuardBuilder::when(move || xv > yv)
                        .label("x := x - y")
                        .then(move || x.store(xv - yv, SeqCst))
                        .build()
                        .unwrap(),
                    GuardBuilder::when(move || yv > xv)
                        .label("y := y - x")
                        .then(move || y.store(yv - xv, SeqCst))
                        .build()
                        .unwrap(),
                ]
            })
            .unwrap_or_else(|never| match never {});

        println!(
            "gcd({a}, {b}) = {} after {} selections ({} attempts)",
            x.load(SeqCst),
            report.selections,
            report.attempts
        );
    }

    println!("\n=== Example Complete ===");
}
