use anyhow::Result;

pub mod engine;
pub mod lexer;
pub mod symbol;
pub mod token;
pub mod vmwriter;

use engine::CompilationEngine;

/// Compiles one Jack compilation unit and returns its VM program as text.
pub fn compile(source: &str) -> Result<String> {
    let mut out: Vec<u8> = Vec::new();
    CompilationEngine::new(source, &mut out)?.compile()?;
    Ok(String::from_utf8(out)?)
}
