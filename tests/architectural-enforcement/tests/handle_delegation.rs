//! Integration Test: Handle Delegation
//!
//! `SocketHandle` forwards every call to its transport and hands the result
//! back unchanged. Logging, retries and timers belong in the transports.

use architectural_enforcement::{report, rust_sources, socket_core_src};

const FORBIDDEN_IN_HANDLE: &[(&str, &str)] = &[
    ("tracing::", "Logging in the handle"),
    ("tokio::time::", "Timer in the handle"),
    ("tokio::spawn", "Task spawned by the handle"),
    ("map_err(", "Handle rewrites transport errors"),
    ("loop {", "Retry loop in the handle"),
];

#[test]
fn test_handle_is_pure_delegation() {
    let handle_file = rust_sources(&socket_core_src())
        .into_iter()
        .find(|f| f.path.ends_with("handle.rs"))
        .expect("socket/core/src/handle.rs should exist");

    let mut violations = Vec::new();
    for (idx, code) in handle_file.code_lines() {
        for (pattern, reason) in FORBIDDEN_IN_HANDLE {
            if code.contains(pattern) {
                violations.push(handle_file.violation(idx, reason));
            }
        }
    }

    report(
        "CRITICAL: SocketHandle does more than delegate!",
        &violations,
        &["✅ Move the behaviour into a Transport implementation"],
    );
}
