//! Stamps the shelf-catalog binary with its build identity
//!
//! `GIT_HASH`, `BUILD_TIMESTAMP` and `BUILD_PROFILE` are logged at startup
//! and reported by `GET /health`. Builds outside a git checkout (crate
//! tarballs, vendored sources) report `unknown` for the hash.

use std::process::Command;

const UNKNOWN: &str = "unknown";

fn git_short_hash() -> Option<String> {
    let output = Command::new("git")
        .args(["rev-parse", "--short=8", "HEAD"])
        .output()
        .ok()?;
    if !output.status.success() {
        return None;
    }
    let hash = String::from_utf8(output.stdout).ok()?;
    let hash = hash.trim();
    (!hash.is_empty()).then(|| hash.to_string())
}

fn main() {
    let stamps = [
        ("GIT_HASH", git_short_hash().unwrap_or_else(|| UNKNOWN.to_string())),
        (
            "BUILD_TIMESTAMP",
            chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
        ),
        (
            "BUILD_PROFILE",
            std::env::var("PROFILE").unwrap_or_else(|_| UNKNOWN.to_string()),
        ),
    ];
    for (key, value) in stamps {
        println!("cargo:rustc-env={}={}", key, value);
    }

    // Re-stamp when HEAD moves
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=build.rs");
}
