//! Build script for detecting system dependencies and providing installation guidance.
//!
//! With the `midi-io` feature enabled, `midir` links against ALSA on Linux.
//! This script checks for it (and for pkg-config) and prints installation
//! hints when they are missing.

use std::env;
use std::process::Command;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-env-changed=CARGO_FEATURE_MIDI_IO");

    if env::var_os("CARGO_FEATURE_MIDI_IO").is_some() {
        if check_pkg_config() {
            check_alsa();
        }
    }

    println!(
        "cargo:rustc-env=BUILD_TARGET={}",
        env::var("TARGET").unwrap_or_default()
    );
}

fn check_alsa() {
    println!("cargo:rerun-if-env-changed=PKG_CONFIG_PATH");

    // Only Linux uses ALSA; CoreMIDI and WinMM ship with the OS
    if !env::var("TARGET").unwrap_or_default().contains("linux") {
        return;
    }

    let output = Command::new("pkg-config").args(["--modversion", "alsa"]).output();

    match output {
        Ok(output) if output.status.success() => {
            let version = String::from_utf8_lossy(&output.stdout);
            println!("cargo:warning=Found ALSA version: {}", version.trim());
        }
        _ => {
            println!("cargo:warning=ALSA not found via pkg-config. MIDI output needs the ALSA development files.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install libasound2-dev");
            println!("cargo:warning=On Fedora: sudo dnf install alsa-lib-devel");
        }
    }
}

fn check_pkg_config() -> bool {
    let output = Command::new("pkg-config").arg("--version").output();

    match output {
        Ok(output) if output.status.success() => true,
        _ => {
            println!("cargo:warning=pkg-config not found. This is required to find system libraries.");
            println!("cargo:warning=On Ubuntu: sudo apt-get install pkg-config");
            println!("cargo:warning=On macOS: brew install pkg-config");
            false
        }
    }
}
