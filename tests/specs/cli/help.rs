//! CLI help specs
//!
//! Verify the command surface is discoverable.

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    let temp = Project::empty();
    let out = temp.lk().args(&["--help"]).passes();
    for command in [
        "run-now",
        "extend",
        "terminate",
        "provision",
        "status",
        "settings",
        "shutdown",
    ] {
        assert!(out.stdout().contains(command), "help lacks {}", command);
    }
}

#[test]
fn version_flag_prints_version() {
    let temp = Project::empty();
    temp.lk()
        .args(&["--version"])
        .passes()
        .stdout_has(env!("CARGO_PKG_VERSION"));
}

#[test]
fn terminate_help_mentions_reason() {
    let temp = Project::empty();
    temp.lk()
        .args(&["terminate", "--help"])
        .passes()
        .stdout_has("--reason");
}

#[test]
fn both_binaries_resolve_from_the_spec_package() {
    for name in ["lk", "lkd"] {
        let path = bin_path(name);
        assert!(path.is_file(), "{} missing", path.display());
    }
}
