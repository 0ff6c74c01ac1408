//! Integration Test: Blocking I/O Prohibition
//!
//! **Policy**: async functions in the socket crate MUST NOT touch blocking
//! std I/O. Use `tokio::fs` and `tokio::net` instead.
//!
//! Synchronous helpers may use std types that do no I/O of their own
//! (`std::net::SocketAddr`, `std::net::Shutdown`), and loading configuration
//! before the runtime serves connections may read files synchronously.

use architectural_enforcement::{report, rust_sources, socket_core_src};

const BLOCKING_PATTERNS: &[(&str, &str)] = &[
    ("std::fs::", "Blocking file I/O"),
    ("std::net::TcpStream", "Blocking network I/O"),
    ("std::net::TcpListener", "Blocking network I/O"),
    ("std::net::UdpSocket", "Blocking network I/O"),
    ("std::io::stdin()", "Blocking stdin"),
    ("std::io::stdout()", "Blocking stdout"),
    ("std::io::Read", "Blocking read trait"),
    ("std::io::Write", "Blocking write trait"),
];

#[test]
fn test_no_blocking_io_in_async_functions() {
    let mut violations = Vec::new();

    for file in rust_sources(&socket_core_src()) {
        for (idx, code) in file.code_lines() {
            if !file.in_async_fn(idx) {
                continue;
            }
            for (pattern, reason) in BLOCKING_PATTERNS {
                if code.contains(pattern) {
                    violations.push(file.violation(idx, reason));
                }
            }
        }
    }

    report(
        "CRITICAL: Blocking I/O calls found in async socket code!",
        &violations,
        &[
            "✅ tokio::fs::File, tokio::io::copy",
            "✅ tokio::net::TcpStream, tokio::io::AsyncRead / AsyncWrite",
        ],
    );
}

#[test]
fn test_no_std_network_imports() {
    let mut violations = Vec::new();

    for file in rust_sources(&socket_core_src()) {
        for (idx, code) in file.code_lines() {
            let code = code.trim();
            let blocking_type = ["TcpStream", "TcpListener", "UdpSocket"]
                .iter()
                .any(|ty| code.contains(ty));
            if code.starts_with("use std::net::") && blocking_type {
                violations.push(file.violation(idx, "Blocking socket import"));
            }
        }
    }

    report(
        "CRITICAL: std socket types imported into socket code!",
        &violations,
        &["✅ Import tokio::net::TcpStream instead"],
    );
}
