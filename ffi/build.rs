//! Generates `admin_ffi.h` into `OUT_DIR` with cbindgen. A failed
//! generation only warns; the library itself does not depend on it.

use std::env;
use std::path::PathBuf;

fn main() {
    println!("cargo:rerun-if-changed=src/lib.rs");
    println!("cargo:rerun-if-changed=src/types.rs");

    let crate_dir = env::var("CARGO_MANIFEST_DIR").unwrap_or_else(|_| ".".to_string());
    let Ok(out_dir) = env::var("OUT_DIR") else {
        return;
    };
    let header = PathBuf::from(out_dir).join("admin_ffi.h");

    match cbindgen::Builder::new()
        .with_crate(crate_dir)
        .with_language(cbindgen::Language::C)
        .with_include_guard("ADMIN_FFI_H")
        .generate()
    {
        Ok(bindings) => {
            bindings.write_to_file(&header);
        }
        Err(e) => println!("cargo:warning=header not generated: {e}"),
    }
}
