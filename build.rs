//! Build script for prstats - embeds version information.
//!
//! `BUILD_INFO_HUMAN` is the crate version, followed by the output of
//! `git describe --tags --always --dirty` in parentheses when git is
//! available, followed by the rustc version. It feeds `--version`.

use std::{env, process::Command};

fn main() {
    ["src", "build.rs", "Cargo.toml"]
        .iter()
        .for_each(|path| println!("cargo:rerun-if-changed={path}"));

    println!("cargo:rustc-env=BUILD_INFO_HUMAN={}", build_info());
}

/// Runs `program` and returns its trimmed stdout, if it succeeded and
/// printed anything.
fn command_stdout(program: &str, args: &[&str]) -> Option<String> {
    Command::new(program)
        .args(args)
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn build_info() -> String {
    let rustc = env::var("RUSTC").unwrap_or_else(|_| "rustc".to_string());

    [
        Some(env!("CARGO_PKG_VERSION").to_string()),
        command_stdout("git", &["describe", "--tags", "--always", "--dirty"])
            .map(|v| format!("({v})")),
        command_stdout(&rustc, &["--version"]),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" ")
}
