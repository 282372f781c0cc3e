use std::process::Command;

/// Run a git command in the workspace, returning trimmed stdout or an empty string.
fn git_output(args: &[&str]) -> String {
    Command::new("git")
        .args(args)
        .output()
        .ok()
        .filter(|o| o.status.success())
        .map(|o| String::from_utf8_lossy(&o.stdout).trim().to_string())
        .unwrap_or_default()
}

/// Export `GIT_COMMIT` and `RELEASE_VERSION` for the `--version` banner of the CLI tools.
///
/// Both are empty when building outside a git checkout.
pub fn emit_git_metadata() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=../build/shared_git_metadata.rs");
    println!("cargo:rerun-if-changed=../.git/HEAD");
    println!("cargo:rerun-if-changed=../.git/refs");
    println!("cargo:rerun-if-changed=../.git/packed-refs");

    let commit = git_output(&["rev-list", "-1", "HEAD"]);
    println!("cargo:rustc-env=GIT_COMMIT={commit}");

    // Only set when HEAD is exactly a tag
    let release = git_output(&["tag", "--points-at", "HEAD"]);
    println!("cargo:rustc-env=RELEASE_VERSION={release}");
}
