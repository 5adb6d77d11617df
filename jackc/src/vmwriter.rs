use std::io::Write;

use anyhow::Result;
use jackvm::{Command, Operation, Segment};

/// Serializes already-decided VM commands, one line per command. The
/// compilation engine is the only producer; commands are never revisited
/// after being written.
pub struct VMWriter<W: Write> {
    out: W,
}

impl<W: Write> VMWriter<W> {
    pub fn new(out: W) -> VMWriter<W> {
        VMWriter { out }
    }

    fn emit(&mut self, command: Command) -> Result<()> {
        writeln!(self.out, "{}", command)?;
        Ok(())
    }

    pub fn write_push(&mut self, segment: Segment, index: u16) -> Result<()> {
        self.emit(Command::Push(segment, index))
    }

    pub fn write_pop(&mut self, segment: Segment, index: u16) -> Result<()> {
        self.emit(Command::Pop(segment, index))
    }

    pub fn write_arithmetic(&mut self, op: Operation) -> Result<()> {
        self.emit(Command::Arithmetic(op))
    }

    pub fn write_label(&mut self, label: &str) -> Result<()> {
        self.emit(Command::Label(label.to_string()))
    }

    pub fn write_goto(&mut self, label: &str) -> Result<()> {
        self.emit(Command::Goto(label.to_string()))
    }

    pub fn write_if(&mut self, label: &str) -> Result<()> {
        self.emit(Command::If(label.to_string()))
    }

    pub fn write_call(&mut self, name: &str, num_args: u16) -> Result<()> {
        self.emit(Command::Call(name.to_string(), num_args))
    }

    pub fn write_function(&mut self, name: &str, num_locals: u16) -> Result<()> {
        self.emit(Command::Function(name.to_string(), num_locals))
    }

    pub fn write_return(&mut self) -> Result<()> {
        self.emit(Command::Return)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_line_per_command() {
        let mut out: Vec<u8> = Vec::new();
        let mut writer = VMWriter::new(&mut out);
        writer.write_function("Main.main", 2).unwrap();
        writer.write_push(Segment::Constant, 7).unwrap();
        writer.write_arithmetic(Operation::Neg).unwrap();
        writer.write_label("loop.0").unwrap();
        writer.write_if("end.1").unwrap();
        writer.write_goto("loop.0").unwrap();
        writer.write_call("Output.printInt", 1).unwrap();
        writer.write_pop(Segment::Temp, 0).unwrap();
        writer.write_return().unwrap();
        drop(writer);

        assert_eq!(
            String::from_utf8(out).unwrap(),
            "function Main.main 2\n\
             push constant 7\n\
             neg\n\
             label loop.0\n\
             if-goto end.1\n\
             goto loop.0\n\
             call Output.printInt 1\n\
             pop temp 0\n\
             return\n"
        );
    }
}
