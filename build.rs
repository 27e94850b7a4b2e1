//! Build script — links `libespeak-ng` when the `espeak` feature is on.
//!
//! Without the feature nothing is linked, so the engine-agnostic pipeline and
//! the HTTP server build on machines without espeak-ng.
//!
//! ## Resolution order
//!
//! 1. **`ESPEAK_LIB_DIR`** — explicit directory containing
//!    `libespeak-ng.{a,so,dylib}`.
//! 2. **pkg-config** — on macOS augmented with Homebrew's pkgconfig
//!    directories.
//! 3. **Directory probe** — Homebrew prefixes on macOS; the multi-arch
//!    directory, `/usr/lib64`, `/usr/lib`, `/usr/local/lib` on Linux.
//!
//! A static archive wins over the shared library in the same directory; the
//! C++ runtime is linked explicitly with a static archive.

use std::path::Path;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-env-changed=ESPEAK_LIB_DIR");
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");

    if std::env::var_os("CARGO_FEATURE_ESPEAK").is_none() {
        return;
    }

    let target_os = std::env::var("CARGO_CFG_TARGET_OS").unwrap_or_default();
    let target_arch = std::env::var("CARGO_CFG_TARGET_ARCH").unwrap_or_default();

    if let Ok(dir) = std::env::var("ESPEAK_LIB_DIR") {
        if !link_dir(&dir, &target_os) {
            panic!("ESPEAK_LIB_DIR={dir} does not contain libespeak-ng");
        }
        return;
    }

    if pkg_config(&target_os) {
        return;
    }

    for dir in search_dirs(&target_os, &target_arch) {
        if link_dir(&dir, &target_os) {
            return;
        }
    }

    panic!(
        "\n\n\
         kokorotts: the `espeak` feature needs libespeak-ng.\n\
         \n\
         \t  macOS   :  brew install espeak-ng\n\
         \t  Ubuntu  :  sudo apt install libespeak-ng-dev\n\
         \t  Fedora  :  sudo dnf install espeak-ng-devel\n\
         \t  Alpine  :  apk add espeak-ng-dev\n\
         \n\
         or set ESPEAK_LIB_DIR=/your/path/lib\n\n"
    );
}

/// Emit link directives if `dir` holds the library.  Returns `false` if not.
fn link_dir(dir: &str, target_os: &str) -> bool {
    let dir_path = Path::new(dir);
    let shared = if target_os == "macos" { "libespeak-ng.dylib" } else { "libespeak-ng.so" };

    if dir_path.join("libespeak-ng.a").exists() {
        println!("cargo:rustc-link-search=native={dir}");
        println!("cargo:rustc-link-lib=static=espeak-ng");
        let cxx = if target_os == "macos" { "c++" } else { "stdc++" };
        println!("cargo:rustc-link-lib=dylib={cxx}");
        true
    } else if dir_path.join(shared).exists() {
        println!("cargo:rustc-link-search=native={dir}");
        println!("cargo:rustc-link-lib=dylib=espeak-ng");
        true
    } else {
        false
    }
}

/// Ask pkg-config for the link flags.  Returns `true` on success.
fn pkg_config(target_os: &str) -> bool {
    let mut paths: Vec<String> = Vec::new();
    if target_os == "macos" {
        for prefix in ["/opt/homebrew", "/usr/local"] {
            paths.push(format!("{prefix}/lib/pkgconfig"));
            paths.push(format!("{prefix}/opt/espeak-ng/lib/pkgconfig"));
        }
    }
    if let Ok(existing) = std::env::var("PKG_CONFIG_PATH") {
        paths.push(existing);
    }

    let Ok(out) = Command::new("pkg-config")
        .args(["--libs", "espeak-ng"])
        .env("PKG_CONFIG_PATH", paths.join(":"))
        .output()
    else {
        return false;
    };
    if !out.status.success() {
        return false;
    }

    let flags = String::from_utf8_lossy(&out.stdout);
    for token in flags.split_whitespace() {
        if let Some(path) = token.strip_prefix("-L") {
            println!("cargo:rustc-link-search=native={path}");
        } else if let Some(lib) = token.strip_prefix("-l") {
            println!("cargo:rustc-link-lib=dylib={lib}");
        }
    }
    true
}

fn search_dirs(target_os: &str, target_arch: &str) -> Vec<String> {
    let mut dirs = Vec::new();
    if target_os == "macos" {
        for prefix in ["/opt/homebrew", "/usr/local"] {
            dirs.push(format!("{prefix}/opt/espeak-ng/lib"));
            dirs.push(format!("{prefix}/lib"));
        }
    } else {
        let multiarch = match target_arch {
            "x86_64" => Some("x86_64-linux-gnu"),
            "aarch64" => Some("aarch64-linux-gnu"),
            "arm" => Some("arm-linux-gnueabihf"),
            _ => None,
        };
        if let Some(triple) = multiarch {
            dirs.push(format!("/usr/lib/{triple}"));
        }
        dirs.extend(["/usr/lib64", "/usr/lib", "/usr/local/lib"].map(String::from));
    }
    dirs.retain(|d| Path::new(d).is_dir());
    dirs
}
