use std::env;

fn main() {
    println!("cargo:rerun-if-env-changed=WAVEWATCH_NATIVE_LIB_DIR");

    // Only the `native` feature links the capture library
    if env::var_os("CARGO_FEATURE_NATIVE").is_none() {
        return;
    }

    if let Ok(dir) = env::var("WAVEWATCH_NATIVE_LIB_DIR") {
        println!("cargo:rustc-link-search=native={}", dir);
    }
    println!("cargo:rustc-link-lib=netcapture");
    println!("cargo:rustc-link-lib=pcap");
}
