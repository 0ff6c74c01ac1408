//! Architectural Enforcement
//!
//! Source scanners used by the integration tests in `tests/` to keep the
//! socket crate honest:
//! - no sleeping anywhere in production code (timeouts only)
//! - no blocking std I/O inside async functions
//! - the socket handle stays a pure delegation layer that never logs
//!
//! The scanners are line based. They understand enough Rust layout to skip
//! comments and `#[cfg(test)]` modules and to find the function enclosing
//! a line; they are not parsers.

use std::fs;
use std::path::{Path, PathBuf};

/// Production sources of the socket crate
pub fn socket_core_src() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../socket/core/src")
}

/// One offending line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub path: PathBuf,
    pub line: usize,
    pub reason: &'static str,
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}:{} - {}: {}",
            self.path.display(),
            self.line,
            self.reason,
            self.text
        )
    }
}

/// A loaded source file, split into lines
pub struct SourceFile {
    pub path: PathBuf,
    lines: Vec<String>,
    test_start: Option<usize>,
}

impl SourceFile {
    /// Read a file from disk; `None` if it cannot be read
    pub fn load(path: &Path) -> Option<Self> {
        let content = fs::read_to_string(path).ok()?;
        Some(Self::from_source(path, &content))
    }

    /// Build from in-memory source text
    pub fn from_source(path: &Path, content: &str) -> Self {
        let lines: Vec<String> = content.lines().map(String::from).collect();
        let test_start = lines
            .iter()
            .position(|l| l.trim_start().starts_with("#[cfg(test)]"));
        Self {
            path: path.to_path_buf(),
            lines,
            test_start,
        }
    }

    /// Production lines with comments stripped, as (index, code) pairs
    ///
    /// Everything from the first `#[cfg(test)]` onwards counts as test code;
    /// test modules live at the bottom of each file.
    pub fn code_lines(&self) -> impl Iterator<Item = (usize, &str)> {
        let end = self.test_start.unwrap_or(self.lines.len());
        self.lines[..end]
            .iter()
            .enumerate()
            .filter(|(_, l)| !l.trim_start().starts_with("//"))
            .map(|(idx, l)| (idx, strip_comment(l)))
    }

    /// Whether the function enclosing `idx` is declared `async`
    ///
    /// Returns `false` for lines outside any function.
    pub fn in_async_fn(&self, idx: usize) -> bool {
        self.enclosing_fn(idx)
            .is_some_and(|decl| decl.contains("async fn "))
    }

    fn enclosing_fn(&self, idx: usize) -> Option<&str> {
        for line in self.lines[..=idx].iter().rev() {
            let trimmed = line.trim_start();
            if is_fn_declaration(trimmed) {
                return Some(trimmed);
            }
            // Item boundaries at column zero end the search
            if line.starts_with("impl")
                || line.starts_with("mod ")
                || line.starts_with("pub mod ")
                || line.starts_with('}')
            {
                return None;
            }
        }
        None
    }

    pub fn violation(&self, idx: usize, reason: &'static str) -> Violation {
        Violation {
            path: self.path.clone(),
            line: idx + 1,
            reason,
            text: self.lines[idx].trim().to_string(),
        }
    }
}

fn strip_comment(line: &str) -> &str {
    line.split("//").next().unwrap_or(line)
}

fn is_fn_declaration(trimmed: &str) -> bool {
    let rest = trimmed
        .trim_start_matches("pub(crate) ")
        .trim_start_matches("pub(super) ")
        .trim_start_matches("pub ");
    rest.starts_with("fn ") || rest.starts_with("async fn ") || rest.starts_with("unsafe fn ")
}

/// Every `.rs` file under `dir`
pub fn rust_sources(dir: &Path) -> Vec<SourceFile> {
    walkdir::WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().and_then(|s| s.to_str()) == Some("rs"))
        .filter_map(|e| SourceFile::load(e.path()))
        .collect()
}

/// Print violations and fail the calling test if there are any
pub fn report(title: &str, violations: &[Violation], advice: &[&str]) {
    if violations.is_empty() {
        return;
    }

    eprintln!("\n❌ {title}\n");
    for violation in violations {
        eprintln!("  ❌ {violation}");
    }
    if !advice.is_empty() {
        eprintln!();
        for line in advice {
            eprintln!("  {line}");
        }
    }

    panic!(
        "\nFound {} violation(s) in production code.\nFix these before merging!",
        violations.len()
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(code: &str) -> SourceFile {
        SourceFile::from_source(Path::new("sample.rs"), code)
    }

    #[test]
    fn test_async_detection() {
        let file = source(concat!(
            "impl Transport for X {\n",
            "    async fn recv(\n",
            "        &self,\n",
            "    ) {\n",
            "        body();\n",
            "    }\n",
            "}\n",
        ));
        assert!(file.in_async_fn(4));
    }

    #[test]
    fn test_sync_detection() {
        let file = source("pub(crate) fn shutdown_socket() {\n    body();\n}\n");
        assert!(!file.in_async_fn(1));
    }

    #[test]
    fn test_top_level_line_has_no_function() {
        let file = source("fn a() {\n}\nuse std::fs;\n");
        assert!(!file.in_async_fn(2));
    }

    #[test]
    fn test_cfg_test_module_is_skipped() {
        let file = source("fn a() {}\n#[cfg(test)]\nmod tests {\n    fn b() {}\n}\n");
        let indices: Vec<usize> = file.code_lines().map(|(i, _)| i).collect();
        assert_eq!(indices, vec![0]);
    }

    #[test]
    fn test_comments_are_stripped() {
        let file = source("// std::thread::sleep\nlet x = 1; // tokio::time::sleep(d)\n");
        let code: Vec<&str> = file.code_lines().map(|(_, c)| c).collect();
        assert_eq!(code, vec!["let x = 1; "]);
    }
}
