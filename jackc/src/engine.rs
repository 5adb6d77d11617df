use std::io::Write;
use std::mem;

use anyhow::{anyhow, bail, Result};
use jackvm::{Operation, Segment};

use crate::lexer::Lexer;
use crate::symbol::{ScopeKind, SymbolTable};
use crate::token::{Token, TokenKind};
use crate::vmwriter::VMWriter;

/// Draws control-flow labels from one counter shared by the whole
/// compilation run, so label text stays unique across nested statements
/// and across subroutines.
pub struct LabelAllocator {
    sequence: usize,
}

impl LabelAllocator {
    pub fn new() -> LabelAllocator {
        LabelAllocator { sequence: 0 }
    }

    pub fn gen(&mut self, prefix: &str) -> String {
        let label = format!("{}.{}", prefix, self.sequence);
        self.sequence += 1;
        label
    }
}

/// What an expression compiled down to. `do` statements insist on a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExprKind {
    Call,
    Value,
}

/// Single-pass recursive-descent compiler for one Jack compilation unit.
/// Each grammar production both checks syntax and emits the corresponding
/// VM commands; nothing is buffered or patched after emission.
pub struct CompilationEngine<W: Write> {
    lexer: Lexer,
    writer: VMWriter<W>,
    symtable: SymbolTable,
    labels: LabelAllocator,
    current: Token,
    peek: Token,
}

impl<W: Write> CompilationEngine<W> {
    pub fn new(source: &str, out: W) -> Result<CompilationEngine<W>> {
        let mut engine = CompilationEngine {
            lexer: Lexer::new(source),
            writer: VMWriter::new(out),
            symtable: SymbolTable::new(),
            labels: LabelAllocator::new(),
            current: Token::default(),
            peek: Token::default(),
        };
        engine.next_token()?;
        Ok(engine)
    }

    fn next_token(&mut self) -> Result<()> {
        let token = self.lexer.next_token()?;
        self.current = mem::replace(&mut self.peek, token);
        Ok(())
    }

    fn expect_peek(&mut self, kinds: &[TokenKind]) -> Result<()> {
        if kinds.contains(&self.peek.kind) {
            return self.next_token();
        }
        bail!(
            "Line {}: unexpected token: expected one of {:?}, got {:?}({:?})",
            self.lexer.line(),
            kinds,
            self.peek.kind,
            self.peek.literal
        )
    }

    /// Consumes the whole token stream and emits the unit's VM program.
    pub fn compile(&mut self) -> Result<()> {
        self.compile_class()?;
        self.expect_peek(&[TokenKind::Eof])
    }

    fn compile_class(&mut self) -> Result<()> {
        self.expect_peek(&[TokenKind::Class])?;
        self.expect_peek(&[TokenKind::Identifier])?;
        let class_name = self.current.literal.clone();
        self.expect_peek(&[TokenKind::LBrace])?;

        let mut num_fields = 0;
        while self.peek.kind == TokenKind::Static || self.peek.kind == TokenKind::Field {
            num_fields += self.compile_class_var_dec()?;
        }

        while matches!(
            self.peek.kind,
            TokenKind::Constructor | TokenKind::Function | TokenKind::Method
        ) {
            self.compile_subroutine(&class_name, num_fields)?;
        }
        self.expect_peek(&[TokenKind::RBrace])
    }

    /// Compiles one `static`/`field` declaration line and returns how many
    /// field slots it declared.
    fn compile_class_var_dec(&mut self) -> Result<u16> {
        self.expect_peek(&[TokenKind::Field, TokenKind::Static])?;
        let scope = match self.current.kind {
            TokenKind::Field => ScopeKind::Field,
            _ => ScopeKind::Static,
        };

        self.expect_peek(&[
            TokenKind::Identifier,
            TokenKind::Int,
            TokenKind::Char,
            TokenKind::Boolean,
        ])?;
        let typ = self.current.literal.clone();

        self.expect_peek(&[TokenKind::Identifier])?;
        self.symtable.define(&self.current.literal, &typ, scope);
        let mut num_fields = if scope == ScopeKind::Field { 1 } else { 0 };

        while self.peek.kind == TokenKind::Comma {
            self.expect_peek(&[TokenKind::Comma])?;
            self.expect_peek(&[TokenKind::Identifier])?;
            self.symtable.define(&self.current.literal, &typ, scope);
            if scope == ScopeKind::Field {
                num_fields += 1;
            }
        }

        self.expect_peek(&[TokenKind::Semicolon])?;
        Ok(num_fields)
    }

    fn compile_subroutine(&mut self, class_name: &str, num_fields: u16) -> Result<()> {
        self.symtable.reset_local_scope();

        self.expect_peek(&[
            TokenKind::Constructor,
            TokenKind::Function,
            TokenKind::Method,
        ])?;
        let kind = self.current.kind;

        self.expect_peek(&[
            TokenKind::Void,
            TokenKind::Identifier,
            TokenKind::Int,
            TokenKind::Char,
            TokenKind::Boolean,
        ])?;

        self.expect_peek(&[TokenKind::Identifier])?;
        let name = format!("{}.{}", class_name, self.current.literal);

        self.compile_parameter_list()?;

        self.expect_peek(&[TokenKind::LBrace])?;

        let mut num_locals = 0;
        while self.peek.kind == TokenKind::Var {
            num_locals += self.compile_local_var_dec()?;
        }
        self.writer.write_function(&name, num_locals)?;

        if kind == TokenKind::Constructor {
            // this = Memory.alloc(numFields)
            self.writer.write_push(Segment::Constant, num_fields)?;
            self.writer.write_call("Memory.alloc", 1)?;
            self.writer.write_pop(Segment::Pointer, 0)?;
        }

        while self.peek.kind != TokenKind::RBrace {
            self.compile_statement()?;
        }

        self.expect_peek(&[TokenKind::RBrace])
    }

    fn compile_parameter_list(&mut self) -> Result<()> {
        self.expect_peek(&[TokenKind::LParen])?;
        while self.peek.kind != TokenKind::RParen {
            self.expect_peek(&[
                TokenKind::Identifier,
                TokenKind::Int,
                TokenKind::Char,
                TokenKind::Boolean,
            ])?;
            let typ = self.current.literal.clone();

            self.expect_peek(&[TokenKind::Identifier])?;
            self.symtable
                .define(&self.current.literal, &typ, ScopeKind::Argument);

            if self.peek.kind == TokenKind::Comma {
                self.expect_peek(&[TokenKind::Comma])?;
            } else {
                break;
            }
        }
        self.expect_peek(&[TokenKind::RParen])
    }

    fn compile_local_var_dec(&mut self) -> Result<u16> {
        self.expect_peek(&[TokenKind::Var])?;

        self.expect_peek(&[
            TokenKind::Identifier,
            TokenKind::Int,
            TokenKind::Char,
            TokenKind::Boolean,
        ])?;
        let typ = self.current.literal.clone();

        self.expect_peek(&[TokenKind::Identifier])?;
        self.symtable
            .define(&self.current.literal, &typ, ScopeKind::Local);
        let mut num_locals = 1;

        while self.peek.kind != TokenKind::Semicolon {
            self.expect_peek(&[TokenKind::Comma])?;
            self.expect_peek(&[TokenKind::Identifier])?;
            self.symtable
                .define(&self.current.literal, &typ, ScopeKind::Local);
            num_locals += 1;
        }
        self.expect_peek(&[TokenKind::Semicolon])?;

        Ok(num_locals)
    }

    fn compile_statement(&mut self) -> Result<()> {
        match self.peek.kind {
            TokenKind::Do => self.compile_do(),
            TokenKind::Let => self.compile_let(),
            TokenKind::While => self.compile_while(),
            TokenKind::Return => self.compile_return(),
            TokenKind::If => self.compile_if(),
            _ => bail!(
                "Line {}: expected a statement, got {:?}({:?})",
                self.lexer.line(),
                self.peek.kind,
                self.peek.literal
            ),
        }
    }

    fn compile_do(&mut self) -> Result<()> {
        self.expect_peek(&[TokenKind::Do])?;
        if self.compile_expression()? != ExprKind::Call {
            bail!(
                "Line {}: expected a subroutine call after do",
                self.lexer.line()
            );
        }
        self.expect_peek(&[TokenKind::Semicolon])?;
        // every call leaves one value on the stack; a do statement drops it
        self.writer.write_pop(Segment::Temp, 0)
    }

    fn compile_let(&mut self) -> Result<()> {
        self.expect_peek(&[TokenKind::Let])?;
        self.expect_peek(&[TokenKind::Identifier])?;
        let entry = self
            .symtable
            .find(&self.current.literal)
            .cloned()
            .ok_or_else(|| {
                anyhow!(
                    "Line {}: variable {:?} has not been declared",
                    self.lexer.line(),
                    self.current.literal
                )
            })?;
        let segment = entry.scope().segment();
        let index = entry.index();

        let mut left_is_array = false;
        if self.peek.kind == TokenKind::LBracket {
            left_is_array = true;
            self.expect_peek(&[TokenKind::LBracket])?;

            // the target address must sit in pointer 1 before the value
            // expression runs
            self.writer.write_push(segment, index)?;
            self.compile_expression()?;
            self.writer.write_arithmetic(Operation::Add)?;
            self.writer.write_pop(Segment::Pointer, 1)?;

            self.expect_peek(&[TokenKind::RBracket])?;
        }

        self.expect_peek(&[TokenKind::Equal])?;
        self.compile_expression()?;
        self.expect_peek(&[TokenKind::Semicolon])?;

        if left_is_array {
            self.writer.write_pop(Segment::That, 0)
        } else {
            self.writer.write_pop(segment, index)
        }
    }

    fn compile_while(&mut self) -> Result<()> {
        self.expect_peek(&[TokenKind::While])?;

        let loop_label = self.labels.gen("loop");
        let end_label = self.labels.gen("end");

        self.writer.write_label(&loop_label)?;
        self.expect_peek(&[TokenKind::LParen])?;
        self.compile_expression()?;
        self.writer.write_arithmetic(Operation::Not)?;
        self.writer.write_if(&end_label)?;
        self.expect_peek(&[TokenKind::RParen])?;

        self.expect_peek(&[TokenKind::LBrace])?;
        while self.peek.kind != TokenKind::RBrace {
            self.compile_statement()?;
        }
        self.expect_peek(&[TokenKind::RBrace])?;
        self.writer.write_goto(&loop_label)?;
        self.writer.write_label(&end_label)
    }

    fn compile_return(&mut self) -> Result<()> {
        self.expect_peek(&[TokenKind::Return])?;
        if self.peek.kind != TokenKind::Semicolon {
            self.compile_expression()?;
        } else {
            // void subroutines still leave a value for the caller to drop
            self.writer.write_push(Segment::Constant, 0)?;
        }
        self.writer.write_return()?;
        self.expect_peek(&[TokenKind::Semicolon])
    }

    fn compile_if(&mut self) -> Result<()> {
        self.expect_peek(&[TokenKind::If])?;

        self.expect_peek(&[TokenKind::LParen])?;
        self.compile_expression()?;
        self.expect_peek(&[TokenKind::RParen])?;

        let else_label = self.labels.gen("else");
        let end_label = self.labels.gen("end");
        self.writer.write_arithmetic(Operation::Not)?;
        self.writer.write_if(&else_label)?;

        self.expect_peek(&[TokenKind::LBrace])?;
        while self.peek.kind != TokenKind::RBrace {
            self.compile_statement()?;
        }
        self.expect_peek(&[TokenKind::RBrace])?;

        self.writer.write_goto(&end_label)?;
        self.writer.write_label(&else_label)?;
        if self.peek.kind == TokenKind::Else {
            self.expect_peek(&[TokenKind::Else])?;
            self.expect_peek(&[TokenKind::LBrace])?;
            while self.peek.kind != TokenKind::RBrace {
                self.compile_statement()?;
            }
            self.expect_peek(&[TokenKind::RBrace])?;
        }
        // both arms converge here even when there is no else branch
        self.writer.write_label(&end_label)
    }

    /// Compiles one expression. Binary operators have no precedence table:
    /// after a term, an operator hands the whole remaining expression to a
    /// recursive call as its right operand, so chains group to the right.
    fn compile_expression(&mut self) -> Result<ExprKind> {
        let mut callee = String::new();
        let mut entry = None;

        match self.peek.kind {
            TokenKind::Null => {
                self.next_token()?;
                self.writer.write_push(Segment::Constant, 0)?;
            }
            TokenKind::This => {
                self.next_token()?;
                self.writer.write_push(Segment::Pointer, 0)?;
            }
            TokenKind::True => {
                // all-ones word, not literal 1
                self.next_token()?;
                self.writer.write_push(Segment::Constant, 1)?;
                self.writer.write_arithmetic(Operation::Neg)?;
            }
            TokenKind::False => {
                self.next_token()?;
                self.writer.write_push(Segment::Constant, 0)?;
            }
            TokenKind::Identifier => {
                self.next_token()?;
                match self.symtable.find(&self.current.literal).cloned() {
                    Some(found) => {
                        self.writer
                            .write_push(found.scope().segment(), found.index())?;
                        entry = Some(found);
                    }
                    // not a variable: the name denotes a subroutine or class
                    None => callee = self.current.literal.clone(),
                }
            }
            TokenKind::StringConst => {
                self.next_token()?;
                let text = self.current.literal.clone();
                self.writer
                    .write_push(Segment::Constant, text.chars().count() as u16)?;
                self.writer.write_call("String.new", 1)?;
                for ch in text.chars() {
                    self.writer.write_push(Segment::Constant, ch as u16)?;
                    self.writer.write_call("String.appendChar", 2)?;
                }
            }
            TokenKind::IntConst => {
                self.next_token()?;
                let value = self.current.literal.parse::<u16>().map_err(|_| {
                    anyhow!(
                        "Line {}: integer constant {:?} is out of range",
                        self.lexer.line(),
                        self.current.literal
                    )
                })?;
                self.writer.write_push(Segment::Constant, value)?;
            }
            TokenKind::LParen => {
                self.expect_peek(&[TokenKind::LParen])?;
                self.compile_expression()?;
                self.expect_peek(&[TokenKind::RParen])?;
            }
            TokenKind::Tilde => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::Not)?;
            }
            TokenKind::Minus => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::Neg)?;
            }
            _ => bail!(
                "Line {}: invalid expression: got {:?}({:?})",
                self.lexer.line(),
                self.peek.kind,
                self.peek.literal
            ),
        }

        if self.peek.kind == TokenKind::Dot {
            self.expect_peek(&[TokenKind::Dot])?;
            self.expect_peek(&[TokenKind::Identifier])?;
            callee.push('.');
            callee.push_str(&self.current.literal);
        }
        if self.peek.kind == TokenKind::LBracket {
            self.next_token()?;
            self.compile_expression()?;
            self.writer.write_arithmetic(Operation::Add)?;
            self.writer.write_pop(Segment::Pointer, 1)?;
            self.writer.write_push(Segment::That, 0)?;
            self.expect_peek(&[TokenKind::RBracket])?;
        }

        match self.peek.kind {
            TokenKind::Plus => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::Add)?;
            }
            TokenKind::Minus => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::Sub)?;
            }
            TokenKind::Asterisk => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_call("Math.multiply", 2)?;
            }
            TokenKind::Slash => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_call("Math.divide", 2)?;
            }
            TokenKind::Ampersand => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::And)?;
            }
            TokenKind::Pipe => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::Or)?;
            }
            TokenKind::Lt => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::Lt)?;
            }
            TokenKind::Gt => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::Gt)?;
            }
            TokenKind::Equal => {
                self.next_token()?;
                self.compile_expression()?;
                self.writer.write_arithmetic(Operation::Eq)?;
            }
            TokenKind::LParen => {
                self.expect_peek(&[TokenKind::LParen])?;
                let mut num_args: u16 = 0;
                if callee.starts_with('.') {
                    // bound method call: the receiver is already on the
                    // stack and its declared type qualifies the callee
                    match entry.as_ref() {
                        Some(receiver) => {
                            callee = format!("{}{}", receiver.typ(), callee);
                            num_args += 1;
                        }
                        None => bail!(
                            "Line {}: method call {:?} has no resolvable receiver",
                            self.lexer.line(),
                            callee
                        ),
                    }
                } else if callee.is_empty() {
                    bail!(
                        "Line {}: call target is not a subroutine name",
                        self.lexer.line()
                    );
                }
                while self.peek.kind != TokenKind::RParen {
                    self.compile_expression()?;
                    num_args += 1;
                    if self.peek.kind == TokenKind::Comma {
                        self.next_token()?;
                    } else {
                        break;
                    }
                }
                self.expect_peek(&[TokenKind::RParen])?;
                self.writer.write_call(&callee, num_args)?;
                return Ok(ExprKind::Call);
            }
            _ => {}
        }
        Ok(ExprKind::Value)
    }
}
