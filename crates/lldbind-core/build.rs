//! Build script for lldbind-core
//!
//! Checks the toolchain and platform before compilation:
//! - Minimum Rust version (the crate uses `let ... else` and `Option::is_none_or`)
//! - Whether the native engine is available on this platform
//!
//! The wrapper library itself is loaded at runtime, so nothing is linked here.

const MIN_RUST_VERSION: &str = "1.82.0";

fn main()
{
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=LLDBIND_WRAPPER_LIB");

    check_rust_version();

    if std::env::var("CARGO_CFG_UNIX").is_err() {
        println!("cargo:warning=lldbind-core: the native engine is only built for unix targets; only the simulated engine is available");
    }
}

fn check_rust_version()
{
    let (Ok(found), Ok(minimum)) = (rustc_version::version(), rustc_version::Version::parse(MIN_RUST_VERSION)) else {
        // Some build environments hide the compiler version
        println!("cargo:warning=could not verify Rust version");
        return;
    };

    if found < minimum {
        panic!("lldbind-core requires Rust {minimum} or newer, found {found}");
    }
}
