use std::process::Command;

fn main() {
    // This runs only during build
    let git_hash = Command::new("git")
        .args(["rev-parse", "--short", "HEAD"])
        .output()
        .ok()
        .filter(|output| output.status.success())
        .and_then(|output| String::from_utf8(output.stdout).ok())
        .map(|hash| hash.trim().to_string())
        .unwrap_or_default();

    let version = if git_hash.is_empty() {
        env!("CARGO_PKG_VERSION").to_string()
    } else {
        format!("{} {}", env!("CARGO_PKG_VERSION"), git_hash)
    };
    println!("cargo:rustc-env=VCD_EXTRACONFIG_VERSION={version}");
    println!("cargo:rerun-if-changed=.git/HEAD");
}
