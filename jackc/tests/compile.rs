use jackvm::{Command, Segment};

const SOURCE: &str = "
// Keeps a running total, scaled by a per-instance step.
class Accumulator {
    static int count;
    field int total, step;

    constructor Accumulator new(int start) {
        let total = start;
        let step = 1;
        let count = count + 1;
        return this;
    }

    method int add(int x) {
        let total = total + (x * step);
        return total;
    }

    function void report(Accumulator acc) {
        var int value;
        let value = acc.add(7);
        if (value < 0) {
            do Output.printString(\"negative\");
        } else {
            do Output.printInt(value);
        }
        return;
    }
}
";

const EXPECTED: &str = "\
function Accumulator.new 0
push constant 2
call Memory.alloc 1
pop pointer 0
push argument 0
pop this 0
push constant 1
pop this 1
push static 0
push constant 1
add
pop static 0
push pointer 0
return
function Accumulator.add 0
push this 0
push argument 0
push this 1
call Math.multiply 2
add
pop this 0
push this 0
return
function Accumulator.report 1
push argument 0
push constant 7
call Accumulator.add 2
pop local 0
push local 0
push constant 0
lt
not
if-goto else.0
push constant 8
call String.new 1
push constant 110
call String.appendChar 2
push constant 101
call String.appendChar 2
push constant 103
call String.appendChar 2
push constant 97
call String.appendChar 2
push constant 116
call String.appendChar 2
push constant 105
call String.appendChar 2
push constant 118
call String.appendChar 2
push constant 101
call String.appendChar 2
call Output.printString 1
pop temp 0
goto end.1
label else.0
push local 0
call Output.printInt 1
pop temp 0
label end.1
push constant 0
return
";

#[test]
fn compiles_a_whole_class() {
    let vm = jackc::compile(SOURCE).unwrap();
    assert_eq!(vm, EXPECTED);
}

#[test]
fn emitted_text_is_well_formed_vm_code() {
    let vm = jackc::compile(SOURCE).unwrap();
    let commands = jackvm::parse_lines(&vm).expect("emitted text should parse");
    assert_eq!(
        commands[0],
        Command::Function("Accumulator.new".to_string(), 0)
    );
    assert_eq!(commands[1], Command::Push(Segment::Constant, 2));
    assert_eq!(*commands.last().unwrap(), Command::Return);
}

#[test]
fn output_is_deterministic_across_runs() {
    let first = jackc::compile(SOURCE).unwrap();
    let second = jackc::compile(SOURCE).unwrap();
    assert_eq!(first, second);
}

#[test]
fn syntax_errors_name_the_line() {
    let err = jackc::compile("class Main {\n    function void main() }\n}").unwrap_err();
    assert!(err.to_string().contains("Line 2"), "got: {}", err);
}
