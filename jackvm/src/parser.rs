use super::command::{Command, Operation, Segment};

fn parse_segment(s: &str) -> Result<Segment, String> {
    match s {
        "constant" => Ok(Segment::Constant),
        "argument" => Ok(Segment::Argument),
        "local" => Ok(Segment::Local),
        "static" => Ok(Segment::Static),
        "this" => Ok(Segment::This),
        "that" => Ok(Segment::That),
        "pointer" => Ok(Segment::Pointer),
        "temp" => Ok(Segment::Temp),
        _ => Err(format!("Invalid segment {:?}", s)),
    }
}

/// Parses one line of VM text. Blank lines and `//` comment lines parse to
/// `None`.
fn parse_line(line: &str) -> Result<Option<Command>, String> {
    let parts: Vec<&str> = line.trim().split_whitespace().collect();
    match parts.get(0) {
        None => Ok(None),
        Some(command) => match *command {
            // comment
            "//" => Ok(None),

            // arithmetic commands
            "add" => Ok(Some(Command::Arithmetic(Operation::Add))),
            "sub" => Ok(Some(Command::Arithmetic(Operation::Sub))),
            "neg" => Ok(Some(Command::Arithmetic(Operation::Neg))),
            "eq" => Ok(Some(Command::Arithmetic(Operation::Eq))),
            "gt" => Ok(Some(Command::Arithmetic(Operation::Gt))),
            "lt" => Ok(Some(Command::Arithmetic(Operation::Lt))),
            "and" => Ok(Some(Command::Arithmetic(Operation::And))),
            "or" => Ok(Some(Command::Arithmetic(Operation::Or))),
            "not" => Ok(Some(Command::Arithmetic(Operation::Not))),

            // goto commands
            "label" | "if-goto" | "goto" => {
                let arg1 = parts
                    .get(1)
                    .ok_or(format!("Missing label in {:?} command", command))?
                    .to_string();
                Ok(Some(match *command {
                    "label" => Command::Label(arg1),
                    "if-goto" => Command::If(arg1),
                    _ => Command::Goto(arg1),
                }))
            }

            // stack commands
            "push" | "pop" => {
                let arg1 = parts
                    .get(1)
                    .ok_or(format!("Missing segment in {:?} command", command))?;
                let arg2 = parts
                    .get(2)
                    .ok_or(format!("Missing index in {:?} command", command))?;
                let segment = parse_segment(arg1)?;
                let index = arg2
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid index {:?} in {:?} command", arg2, command))?;
                Ok(Some(match *command {
                    "push" => Command::Push(segment, index),
                    _ => Command::Pop(segment, index),
                }))
            }

            // function calling commands
            "return" => Ok(Some(Command::Return)),
            "function" | "call" => {
                let arg1 = parts
                    .get(1)
                    .ok_or(format!("Missing function name in {:?} command", command))?
                    .to_string();
                let arg2 = parts
                    .get(2)
                    .ok_or(format!("Missing count in {:?} command", command))?;
                let num = arg2
                    .parse::<u16>()
                    .map_err(|_| format!("Invalid count {:?} in {:?} command", arg2, command))?;
                Ok(Some(match *command {
                    "function" => Command::Function(arg1, num),
                    _ => Command::Call(arg1, num),
                }))
            }

            _ => Err(format!("Could not parse line {}", line)),
        },
    }
}

pub fn parse_lines(lines: &str) -> Result<Vec<Command>, String> {
    let mut commands: Vec<Command> = Vec::new();
    for line in lines.lines() {
        if let Some(command) = parse_line(line)? {
            commands.push(command);
        }
    }
    Ok(commands)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("add"),
            Ok(Some(Command::Arithmetic(Operation::Add)))
        );
        assert_eq!(
            parse_line("push constant 10"),
            Ok(Some(Command::Push(Segment::Constant, 10)))
        );
        assert_eq!(
            parse_line("if-goto end.0"),
            Ok(Some(Command::If("end.0".to_string())))
        );
        assert_eq!(parse_line(""), Ok(None));
        assert_eq!(
            parse_line("push foo 10"),
            Err("Invalid segment \"foo\"".to_string())
        );
        assert_eq!(
            parse_line("pop local"),
            Err("Missing index in \"pop\" command".to_string())
        );
    }

    #[test]
    fn test_parse_lines() {
        assert_eq!(
            parse_lines(
                "
// a tiny function
function foo 2

    push constant 3
    not

return"
            ),
            Ok(vec![
                Command::Function("foo".to_string(), 2),
                Command::Push(Segment::Constant, 3),
                Command::Arithmetic(Operation::Not),
                Command::Return,
            ])
        );
    }

    #[test]
    fn test_display_round_trip() {
        let commands = vec![
            Command::Function("Main.main".to_string(), 1),
            Command::Push(Segment::Argument, 0),
            Command::Pop(Segment::Static, 4),
            Command::Arithmetic(Operation::Sub),
            Command::Label("loop.0".to_string()),
            Command::Goto("loop.0".to_string()),
            Command::Call("Math.multiply".to_string(), 2),
            Command::Return,
        ];
        let text: String = commands
            .iter()
            .map(|c| format!("{}\n", c))
            .collect();
        assert_eq!(parse_lines(&text), Ok(commands));
    }
}
