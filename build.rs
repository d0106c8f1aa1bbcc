// build.rs

use vergen::{vergen, Config};

fn main() {
    // Outside a git checkout the git-derived vars are simply absent and
    // crate_version() falls back to CARGO_PKG_VERSION.
    let _ = vergen(Config::default());
}
