//! The Hack virtual machine's instruction vocabulary: the command and
//! segment types, their one-line textual forms, and a parser from VM
//! text back into commands.

mod command;
mod parser;

pub use command::{Command, Operation, Segment};
pub use parser::parse_lines;
