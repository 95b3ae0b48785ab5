//! Console Multiplexer
//!
//! This example demonstrates a blocking repetitive command that merges
//! several consoles into one stream until each has signed off:
//!
//! ```text
//! *[(i:1..3) continue(i); console(i)?c -> X!(i, c); continue(i) := (c != "q")]
//! ```
//!
//! Key concepts:
//! - Input guards over rendezvous channels
//! - Preconditions that retire a console after it signs off
//! - Repetition ending once no guard can ever fire again
//!
//! Run with: cargo run --example consoles

use guarded::builder::input_guard;
use guarded::core::{Channel, GuardSet};
use guarded::engine::Alternation;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const SIGN_OFF: &str = "q";

#[tokio::main]
async fn main() {
    println!("=== Console Multiplexer ===\n");

    let consoles: Vec<Channel<String>> = (0..3).map(|_| Channel::new()).collect();
    let active: Vec<AtomicBool> = (0..3).map(|_| AtomicBool::new(true)).collect();

    for (i, console) in consoles.iter().enumerate() {
        let console = console.clone();
        tokio::spawn(async move {
            let lines = [format!("ls -l /home/{i}"), format!("cat notes{i}.txt")];
            for line in lines {
                tokio::time::sleep(Duration::from_millis(5 * (i as u64 + 1))).await;
                if console.send(line).await.is_err() {
                    return;
                }
            }
            let _ = console.send(SIGN_OFF.to_string()).await;
        });
    }

    let (consoles, active) = (&consoles, &active);
    let mut engine = Alternation::new();
    let report = engine
        .repeat_blocking(
            move || {
                (0..consoles.len())
                    .map(move |i| {
                        input_guard(
                            move || active[i].load(Ordering::SeqCst),
                            &consoles[i],
                            move |line: String| {
                                if line == SIGN_OFF {
                                    println!("  console {i} signed off");
                                    active[i].store(false, Ordering::SeqCst);
                                } else {
                                    println!("  console {i}: {line}");
                                }
                            },
                        )
                    })
                    .collect::<GuardSet<'_, ()>>()
            },
            &CancellationToken::new(),
        )
        .await
        .unwrap_or_else(|never| match never {});

    println!("\nRepetition ended: {:?}", report.termination);
    println!("  attempts:   {}", report.attempts);
    println!("  selections: {}", report.selections);

    if let Some(history) = report.history {
        println!("\nSelections per console:");
        for (index, count) in history.selection_counts() {
            println!("  console {index}: {count}");
        }
    }

    println!("\n=== Example Complete ===");
}
