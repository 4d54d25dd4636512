//! Layering guardrails to keep the host independent of the guest runtime.
//!
//! The host (`probe` crate) may only use `probe_guest` as a **dev-dependency** (for end-to-end tests and demos).
//! This test scans the root `Cargo.toml` and fails if `probe_guest` appears in `[dependencies]`.

#[test]
fn host_does_not_depend_on_guest_runtime_in_main_dependencies() {
    let manifest = include_str!("../Cargo.toml");
    let mut in_dependencies = false;

    for raw_line in manifest.lines() {
        let line = raw_line.trim();
        // Track when we enter/exit the `[dependencies]` table.
        if line.starts_with('[') {
            if line == "[dependencies]" {
                in_dependencies = true;
                continue;
            }
            if in_dependencies {
                break;
            }
        }

        if !in_dependencies || line.is_empty() || line.starts_with('#') {
            continue;
        }

        let line_no_comment = line.split('#').next().unwrap_or("").trim();
        if line_no_comment.starts_with("probe_guest") {
            panic!("`probe_guest` must not appear in [dependencies]; use [dev-dependencies] instead");
        }
    }
}

#[test]
fn guest_runtime_only_depends_on_core() {
    let manifest = include_str!("../crates/probe_guest/Cargo.toml");
    assert!(manifest.contains("probe_core"));
    assert!(
        !manifest.lines().any(|line| line.trim_start().starts_with("probe =")),
        "`probe_guest` must not depend on the host crate"
    );
}
