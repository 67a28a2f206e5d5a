use std::env;

/// Emits link directives for the Basalt native library.
///
/// Basalt is an independently-built C++ engine. It is only required when the
/// `external-engine` feature of `stratadb-core` is active, so the directives
/// are emitted only when `BASALT_LIB_DIR` points at an install prefix. This
/// keeps plain `cargo build` / `cargo test` working on machines without the
/// engine toolchain.
fn main() {
    println!("cargo:rerun-if-env-changed=BASALT_LIB_DIR");

    if let Ok(lib_dir) = env::var("BASALT_LIB_DIR") {
        println!("cargo:rustc-link-search=native={lib_dir}");
        println!("cargo:rustc-link-lib=dylib=basalt");
        // Basalt is C++; its own build links the ANN backend statically.
        println!("cargo:rustc-link-lib=dylib=stdc++");
    } else {
        println!(
            "cargo:warning=BASALT_LIB_DIR not set; basalt-sys declarations \
             compile but nothing links against the engine"
        );
    }
}
