//! Integration Test: Sleep Prohibition
//!
//! Socket code waits on I/O with a deadline (`tokio::time::timeout`), never
//! by sleeping. Any sleep in production code is a violation; test modules
//! are exempt.

use architectural_enforcement::{report, rust_sources, socket_core_src};

#[test]
fn test_no_sleep_in_production_code() {
    let mut violations = Vec::new();

    for file in rust_sources(&socket_core_src()) {
        for (idx, code) in file.code_lines() {
            if ["::sleep(", ".sleep(", "sleep_until("]
                .iter()
                .any(|call| code.contains(call))
            {
                violations.push(file.violation(idx, "Sleep call"));
            }
        }
    }

    report(
        "CRITICAL: Sleep calls found in socket code!",
        &violations,
        &[
            "✅ Use tokio::time::timeout around the I/O future instead",
            "✅ Sleeping is fine inside #[cfg(test)] modules",
        ],
    );
}

#[test]
fn test_scanner_finds_the_sources() {
    let files = rust_sources(&socket_core_src());
    assert!(
        files.iter().any(|f| f.path.ends_with("handle.rs")),
        "expected socket/core/src to contain handle.rs"
    );
}
