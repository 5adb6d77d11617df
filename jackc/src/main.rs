use std::path::{Path, PathBuf};
use std::{fs, process};

use anyhow::{Context, Result};
use clap::{App, Arg};

fn jack_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }
    let mut files: Vec<PathBuf> = fs::read_dir(path)
        .with_context(|| format!("Failed to read directory {}", path.display()))?
        .filter_map(|dir_entry| dir_entry.ok())
        .map(|dir_entry| dir_entry.path())
        .filter(|p| p.extension().map(|ext| ext == "jack").unwrap_or(false))
        .collect();
    files.sort();
    Ok(files)
}

fn compile_file(path: &Path) -> Result<PathBuf> {
    let source = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let vm_text =
        jackc::compile(&source).with_context(|| format!("Failed to compile {}", path.display()))?;
    let out_path = path.with_extension("vm");
    fs::write(&out_path, vm_text)
        .with_context(|| format!("Failed to write {}", out_path.display()))?;
    Ok(out_path)
}

fn main() {
    let matches = App::new("jackc")
        .about("Compiles Jack source files to Hack VM code")
        .arg(
            Arg::with_name("input")
                .help("A .jack file, or a directory of .jack files")
                .required(true)
                .index(1),
        )
        .get_matches();
    let input = Path::new(matches.value_of("input").unwrap());

    let files = match jack_files(input) {
        Ok(files) => files,
        Err(e) => {
            println!("{:#}", e);
            process::exit(1);
        }
    };
    if files.is_empty() {
        println!("No .jack files found in {}", input.display());
        process::exit(1);
    }

    for file in files {
        match compile_file(&file) {
            Ok(out_path) => println!("{} -> {}", file.display(), out_path.display()),
            Err(e) => {
                println!("{:#}", e);
                process::exit(1);
            }
        }
    }
}
