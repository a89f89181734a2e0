//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `chronoboard_core` linkage.
//! - Keep output deterministic for quick local sanity checks.

fn main() {
    println!("chronoboard_core ping={}", chronoboard_core::ping());
    println!(
        "chronoboard_core version={}",
        chronoboard_core::core_version()
    );
}
