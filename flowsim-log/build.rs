#![allow(missing_docs)]

use std::env;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

/// Lists all workspace crates as tracing targets.
fn list_crates() -> Vec<String> {
    let mut crates = Vec::new();

    for result in fs::read_dir("../").unwrap() {
        let entry = result.unwrap();

        if !entry.file_type().unwrap().is_dir() {
            continue;
        }

        if let Some(s) = entry.file_name().to_str() {
            if s.starts_with("flowsim") {
                crates.push(s.replace('-', "_"));
            }
        }
    }

    crates.sort();
    crates
}

fn emit_crate_list() -> Result<(), io::Error> {
    let crates = list_crates();

    let out_dir = env::var("OUT_DIR").unwrap();
    let dest_path = Path::new(&out_dir).join("constants.gen.rs");
    let mut f = File::create(dest_path)?;

    write!(f, "const CRATE_NAMES: &[&str] = &[")?;
    for name in &crates {
        write!(f, "\"{name}\",")?;
    }
    writeln!(f, "];")?;

    Ok(())
}

fn main() {
    println!("cargo:rerun-if-changed=../");
    emit_crate_list().unwrap();
}
