use std::fmt;

#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub enum Segment {
    Constant,
    Argument,
    Local,
    Static,
    This,
    That,
    Pointer,
    Temp,
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format!("{:?}", self).to_lowercase())
    }
}

#[derive(Eq, Hash, PartialEq, Copy, Clone, Debug)]
pub enum Operation {
    Add,
    Sub,
    Neg,
    Eq,
    Gt,
    Lt,
    And,
    Or,
    Not,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&format!("{:?}", self).to_lowercase())
    }
}

/// One instruction of the stack machine. Commands carry function and label
/// names as plain strings; linking is the downstream translator's problem.
#[derive(PartialEq, Clone, Debug)]
pub enum Command {
    // arithmetic commands
    Arithmetic(Operation),

    // stack commands
    Push(Segment, u16),
    Pop(Segment, u16),

    // goto commands
    Label(String),
    If(String),
    Goto(String),

    // function commands
    Function(String, u16),
    Return,
    Call(String, u16),
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Command::Arithmetic(op) => op.to_string(),

            // stack commands
            Command::Push(segment, index) => format!("push {} {}", segment, index),
            Command::Pop(segment, index) => format!("pop {} {}", segment, index),

            // goto commands
            Command::Label(label) => format!("label {}", label),
            Command::If(label) => format!("if-goto {}", label),
            Command::Goto(label) => format!("goto {}", label),

            // function commands
            Command::Function(func_name, num_locals) => {
                format!("function {} {}", func_name, num_locals)
            }
            Command::Return => "return".to_string(),
            Command::Call(func_name, num_args) => format!("call {} {}", func_name, num_args),
        };
        f.write_str(&s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_segment_display() {
        assert_eq!(Segment::Constant.to_string(), "constant");
        assert_eq!(Segment::Pointer.to_string(), "pointer");
        assert_eq!(Segment::That.to_string(), "that");
    }

    #[test]
    fn test_command_display() {
        assert_eq!(
            Command::Push(Segment::Local, 3).to_string(),
            "push local 3"
        );
        assert_eq!(Command::Pop(Segment::Temp, 0).to_string(), "pop temp 0");
        assert_eq!(Command::Arithmetic(Operation::Not).to_string(), "not");
        assert_eq!(Command::Label("end.4".to_string()).to_string(), "label end.4");
        assert_eq!(Command::If("end.4".to_string()).to_string(), "if-goto end.4");
        assert_eq!(Command::Goto("loop.3".to_string()).to_string(), "goto loop.3");
        assert_eq!(
            Command::Function("Main.main".to_string(), 2).to_string(),
            "function Main.main 2"
        );
        assert_eq!(
            Command::Call("Memory.alloc".to_string(), 1).to_string(),
            "call Memory.alloc 1"
        );
        assert_eq!(Command::Return.to_string(), "return");
    }
}
