//! Parser: turns tokenized lines into a statement tree.
//!
//! Each line parses independently into one [`Statement`]; colon-separated
//! statements become a [`Statement::Set`]. Expressions are parsed by
//! recursive descent with one function per precedence level, lowest first:
//! OR, AND, relational, additive, multiplicative, power (right-associative),
//! unary, primary.

use crate::error::ParseError;
use crate::functions;
use crate::lexer::{CodeLine, Token};
use crate::value::Value;
use std::collections::HashSet;

/// Prefix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    Negate,
    Not,
}

/// Infix operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Power,
    Equal,
    NotEqual,
    Less,
    LessEqual,
    Greater,
    GreaterEqual,
    And,
    Or,
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    Literal(Value),
    /// A scalar variable read.
    Symbol(String),
    /// `name(args)`: a built-in function call or an array element read;
    /// which one is decided at run time against the symbol table.
    Call { name: String, args: Vec<Expression> },
    /// `FN name(arg)`: user-defined function application.
    UserFn { name: String, arg: Box<Expression> },
    Unary {
        op: UnaryOp,
        operand: Box<Expression>,
    },
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
}

impl Expression {
    fn binary(op: BinaryOp, left: Expression, right: Expression) -> Expression {
        Expression::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }
}

/// One element of a PRINT statement, separators included.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintElement {
    Expr(Expression),
    /// `,`: advance the display to the next line.
    Comma,
    /// `;`: run items together, suppressing the trailing newline.
    Semicolon,
}

/// An executable statement.
#[derive(Debug, Clone, PartialEq)]
pub enum Statement {
    /// Colon-separated statements sharing one source line.
    Set(Vec<Statement>),
    Print(Vec<PrintElement>),
    /// Scalar assignment when `indices` is empty, array element otherwise.
    Assign {
        target: String,
        indices: Vec<Expression>,
        expr: Expression,
    },
    If {
        cond: Expression,
        then_branch: Box<Statement>,
        else_branch: Option<Box<Statement>>,
    },
    ForBegin {
        var: String,
        start: Expression,
        end: Expression,
        step: Expression,
    },
    /// NEXT, optionally naming its loop variable.
    ForEnd { var: Option<String> },
    WhileBegin { cond: Expression },
    WhileEnd,
    Goto(u16),
    Gosub(u16),
    Return,
    OnGoto {
        selector: Expression,
        targets: Vec<u16>,
    },
    OnGosub {
        selector: Expression,
        targets: Vec<u16>,
    },
    Pop,
    Data(Vec<Value>),
    Read(Vec<String>),
    Restore,
    Dim(Vec<(String, Vec<Expression>)>),
    DefFn {
        name: String,
        param: String,
        body: Expression,
    },
    Swap { left: String, right: String },
    End,
    Rem,
    /// A registered command with no argument (CLS, BEEP, ...).
    SimpleCmd(String),
    /// A registered command with one argument (SLEEP, CURSOR).
    ParamCmd { name: String, arg: Expression },
}

/// A parsed top-level statement tagged with its source line number.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgramLine {
    pub number: u16,
    pub statement: Statement,
}

/// Parse a full program. Lines keep their source order; a repeated line
/// number is rejected.
pub fn parse(lines: &[CodeLine]) -> Result<Vec<ProgramLine>, ParseError> {
    let mut program = Vec::with_capacity(lines.len());
    let mut seen = HashSet::new();
    for line in lines {
        if !seen.insert(line.number) {
            return Err(ParseError::at(line.number, "duplicate line number"));
        }
        let statement = LineParser::new(line).parse_line()?;
        program.push(ProgramLine {
            number: line.number,
            statement,
        });
    }
    Ok(program)
}

struct LineParser<'a> {
    line: u16,
    tokens: &'a [Token],
    pos: usize,
}

impl<'a> LineParser<'a> {
    fn new(line: &'a CodeLine) -> Self {
        Self {
            line: line.number,
            tokens: &line.tokens,
            pos: 0,
        }
    }

    fn peek(&self) -> Option<&Token> {
        self.tokens.get(self.pos)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn err(&self, reason: impl Into<String>) -> ParseError {
        ParseError::at(self.line, reason)
    }

    fn expect(&mut self, expected: Token) -> Result<(), ParseError> {
        if self.peek() == Some(&expected) {
            self.advance();
            Ok(())
        } else {
            Err(self.err(format!("expected {:?}", expected)))
        }
    }

    fn expect_symbol(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(Token::Symbol(name)) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.err("expected a name")),
        }
    }

    fn to_line_number(&self, n: i32) -> Result<u16, ParseError> {
        if n > 0 && n <= u16::MAX as i32 {
            Ok(n as u16)
        } else {
            Err(self.err(format!("{} is not a valid line number", n)))
        }
    }

    fn expect_line_number(&mut self) -> Result<u16, ParseError> {
        match self.peek() {
            Some(&Token::Int(n)) => {
                let number = self.to_line_number(n)?;
                self.advance();
                Ok(number)
            }
            _ => Err(self.err("expected a line number")),
        }
    }

    /// Parse the whole line body; leftover tokens are an error.
    fn parse_line(&mut self) -> Result<Statement, ParseError> {
        let statement = self.parse_sequence()?;
        match self.peek() {
            None => Ok(statement),
            Some(token) => Err(self.err(format!("unexpected token {:?}", token))),
        }
    }

    /// One statement, or a colon-separated set. Stops before ELSE so IF
    /// branches can share this path.
    fn parse_sequence(&mut self) -> Result<Statement, ParseError> {
        let mut statements = vec![self.parse_statement()?];
        while matches!(self.peek(), Some(Token::Colon)) {
            self.advance();
            statements.push(self.parse_statement()?);
        }
        if statements.len() == 1 {
            Ok(statements.remove(0))
        } else {
            Ok(Statement::Set(statements))
        }
    }

    fn parse_statement(&mut self) -> Result<Statement, ParseError> {
        match self.peek() {
            Some(Token::Let) => {
                self.advance();
                let name = self.expect_symbol()?;
                self.parse_assignment_to(name)
            }
            Some(Token::Symbol(_)) => self.parse_symbol_statement(),
            Some(Token::Print) | Some(Token::Question) => {
                self.advance();
                self.parse_print()
            }
            Some(Token::If) => {
                self.advance();
                self.parse_if()
            }
            Some(Token::For) => {
                self.advance();
                self.parse_for()
            }
            Some(Token::Next) => {
                self.advance();
                let var = match self.peek() {
                    Some(Token::Symbol(_)) => Some(self.expect_symbol()?),
                    _ => None,
                };
                Ok(Statement::ForEnd { var })
            }
            Some(Token::While) => {
                self.advance();
                Ok(Statement::WhileBegin {
                    cond: self.parse_expression()?,
                })
            }
            Some(Token::Wend) => {
                self.advance();
                Ok(Statement::WhileEnd)
            }
            Some(Token::Goto) => {
                self.advance();
                Ok(Statement::Goto(self.expect_line_number()?))
            }
            Some(Token::Gosub) => {
                self.advance();
                Ok(Statement::Gosub(self.expect_line_number()?))
            }
            Some(Token::Return) => {
                self.advance();
                Ok(Statement::Return)
            }
            Some(Token::On) => {
                self.advance();
                self.parse_on()
            }
            Some(Token::Pop) => {
                self.advance();
                Ok(Statement::Pop)
            }
            Some(Token::Data) => {
                self.advance();
                self.parse_data()
            }
            Some(Token::Read) => {
                self.advance();
                self.parse_read()
            }
            Some(Token::Restore) => {
                self.advance();
                Ok(Statement::Restore)
            }
            Some(Token::Dim) => {
                self.advance();
                self.parse_dim()
            }
            Some(Token::Def) => {
                self.advance();
                self.parse_def()
            }
            Some(Token::Swap) => {
                self.advance();
                let left = self.expect_symbol()?;
                self.expect(Token::Comma)?;
                let right = self.expect_symbol()?;
                Ok(Statement::Swap { left, right })
            }
            Some(Token::End) => {
                self.advance();
                Ok(Statement::End)
            }
            Some(Token::Rem(_)) => {
                self.advance();
                Ok(Statement::Rem)
            }
            Some(Token::Pound) => Err(self.err("`#` is reserved and has no statement form")),
            Some(token) => {
                let reason = format!("unexpected token {:?}", token);
                Err(self.err(reason))
            }
            None => Err(self.err("expected a statement")),
        }
    }

    /// A statement that begins with a bare name: an assignment when `=` or
    /// `(` follows, a registered command otherwise.
    fn parse_symbol_statement(&mut self) -> Result<Statement, ParseError> {
        let name = self.expect_symbol()?;
        match self.peek() {
            Some(Token::Equal) | Some(Token::LParen) => self.parse_assignment_to(name),
            _ if functions::is_simple_command(&name) => Ok(Statement::SimpleCmd(name)),
            _ if functions::is_param_command(&name) => Ok(Statement::ParamCmd {
                name,
                arg: self.parse_expression()?,
            }),
            _ => Err(self.err(format!("`{}` does not start a statement", name))),
        }
    }

    fn parse_assignment_to(&mut self, target: String) -> Result<Statement, ParseError> {
        let mut indices = Vec::new();
        if matches!(self.peek(), Some(Token::LParen)) {
            self.advance();
            indices = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
        }
        self.expect(Token::Equal)?;
        let expr = self.parse_expression()?;
        Ok(Statement::Assign {
            target,
            indices,
            expr,
        })
    }

    fn parse_print(&mut self) -> Result<Statement, ParseError> {
        let mut items = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::Colon) | Some(Token::Else) => break,
                Some(Token::Semicolon) => {
                    self.advance();
                    items.push(PrintElement::Semicolon);
                }
                Some(Token::Comma) => {
                    self.advance();
                    items.push(PrintElement::Comma);
                }
                _ => items.push(PrintElement::Expr(self.parse_expression()?)),
            }
        }
        Ok(Statement::Print(items))
    }

    fn parse_if(&mut self) -> Result<Statement, ParseError> {
        let cond = self.parse_expression()?;
        let then_branch = match self.peek() {
            Some(Token::Then) => {
                self.advance();
                self.parse_branch()?
            }
            // `IF cond GOTO n` is the classic shorthand
            Some(Token::Goto) => {
                self.advance();
                Statement::Goto(self.expect_line_number()?)
            }
            _ => return Err(self.err("expected THEN or GOTO after IF condition")),
        };
        let else_branch = if matches!(self.peek(), Some(Token::Else)) {
            self.advance();
            Some(Box::new(self.parse_branch()?))
        } else {
            None
        };
        Ok(Statement::If {
            cond,
            then_branch: Box::new(then_branch),
            else_branch,
        })
    }

    /// A THEN/ELSE branch: a bare line number means GOTO, anything else is
    /// a statement or colon-separated set.
    fn parse_branch(&mut self) -> Result<Statement, ParseError> {
        if let Some(&Token::Int(n)) = self.peek() {
            let target = self.to_line_number(n)?;
            self.advance();
            return Ok(Statement::Goto(target));
        }
        self.parse_sequence()
    }

    fn parse_for(&mut self) -> Result<Statement, ParseError> {
        let var = self.expect_symbol()?;
        self.expect(Token::Equal)?;
        let start = self.parse_expression()?;
        self.expect(Token::To)?;
        let end = self.parse_expression()?;
        let step = if matches!(self.peek(), Some(Token::Step)) {
            self.advance();
            self.parse_expression()?
        } else {
            Expression::Literal(Value::Integer(1))
        };
        Ok(Statement::ForBegin {
            var,
            start,
            end,
            step,
        })
    }

    fn parse_on(&mut self) -> Result<Statement, ParseError> {
        let selector = self.parse_expression()?;
        let gosub = match self.peek() {
            Some(Token::Goto) => false,
            Some(Token::Gosub) => true,
            _ => return Err(self.err("expected GOTO or GOSUB after ON selector")),
        };
        self.advance();
        let mut targets = vec![self.expect_line_number()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            targets.push(self.expect_line_number()?);
        }
        if gosub {
            Ok(Statement::OnGosub { selector, targets })
        } else {
            Ok(Statement::OnGoto { selector, targets })
        }
    }

    fn parse_data(&mut self) -> Result<Statement, ParseError> {
        let mut values = vec![self.parse_data_literal()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            values.push(self.parse_data_literal()?);
        }
        Ok(Statement::Data(values))
    }

    /// A DATA literal: a possibly signed number, a quoted string, or a
    /// bare word (stored as a string). No expressions.
    fn parse_data_literal(&mut self) -> Result<Value, ParseError> {
        let negative = match self.peek() {
            Some(Token::Minus) => {
                self.advance();
                true
            }
            Some(Token::Plus) => {
                self.advance();
                false
            }
            _ => {
                if let Some(value) = self.peek_unsigned_data_literal() {
                    self.advance();
                    return Ok(value);
                }
                return Err(self.err("expected a DATA literal"));
            }
        };
        match self.peek() {
            Some(&Token::Int(n)) => {
                self.advance();
                Ok(Value::Integer(if negative { -n } else { n }))
            }
            Some(&Token::Real(f)) => {
                self.advance();
                Ok(Value::Float(if negative { -f } else { f }))
            }
            _ => Err(self.err("expected a number after the sign in DATA")),
        }
    }

    fn peek_unsigned_data_literal(&self) -> Option<Value> {
        match self.peek() {
            Some(&Token::Int(n)) => Some(Value::Integer(n)),
            Some(&Token::Real(f)) => Some(Value::Float(f)),
            Some(Token::Str(s)) => Some(Value::Str(s.clone())),
            Some(Token::Symbol(s)) => Some(Value::Str(s.clone())),
            _ => None,
        }
    }

    fn parse_read(&mut self) -> Result<Statement, ParseError> {
        let mut names = vec![self.expect_symbol()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            names.push(self.expect_symbol()?);
        }
        Ok(Statement::Read(names))
    }

    fn parse_dim(&mut self) -> Result<Statement, ParseError> {
        let mut arrays = Vec::new();
        loop {
            let name = self.expect_symbol()?;
            self.expect(Token::LParen)?;
            let dims = self.parse_expression_list()?;
            self.expect(Token::RParen)?;
            arrays.push((name, dims));
            if matches!(self.peek(), Some(Token::Comma)) {
                self.advance();
            } else {
                break;
            }
        }
        Ok(Statement::Dim(arrays))
    }

    fn parse_def(&mut self) -> Result<Statement, ParseError> {
        self.expect(Token::Fn)?;
        let name = self.expect_symbol()?;
        self.expect(Token::LParen)?;
        let param = self.expect_symbol()?;
        self.expect(Token::RParen)?;
        self.expect(Token::Equal)?;
        let body = self.parse_expression()?;
        Ok(Statement::DefFn { name, param, body })
    }

    // --- expressions, one function per precedence level ---

    fn parse_expression(&mut self) -> Result<Expression, ParseError> {
        self.parse_or()
    }

    fn parse_or(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_and()?;
        while matches!(self.peek(), Some(Token::Or)) {
            self.advance();
            let right = self.parse_and()?;
            left = Expression::binary(BinaryOp::Or, left, right);
        }
        Ok(left)
    }

    fn parse_and(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_relational()?;
        while matches!(self.peek(), Some(Token::And)) {
            self.advance();
            let right = self.parse_relational()?;
            left = Expression::binary(BinaryOp::And, left, right);
        }
        Ok(left)
    }

    fn parse_relational(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_additive()?;
        while let Some(op) = self.peek().and_then(relational_op) {
            self.advance();
            let right = self.parse_additive()?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Subtract,
                _ => break,
            };
            self.advance();
            let right = self.parse_multiplicative()?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Expression, ParseError> {
        let mut left = self.parse_power()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Multiply,
                Some(Token::Slash) => BinaryOp::Divide,
                _ => break,
            };
            self.advance();
            let right = self.parse_power()?;
            left = Expression::binary(op, left, right);
        }
        Ok(left)
    }

    /// `^` is right-associative: `2^3^2` is `2^(3^2)`.
    fn parse_power(&mut self) -> Result<Expression, ParseError> {
        let left = self.parse_unary()?;
        if matches!(self.peek(), Some(Token::Caret)) {
            self.advance();
            let right = self.parse_power()?;
            return Ok(Expression::binary(BinaryOp::Power, left, right));
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Expression, ParseError> {
        let op = match self.peek() {
            Some(Token::Minus) => UnaryOp::Negate,
            Some(Token::Not) => UnaryOp::Not,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expression::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expression, ParseError> {
        match self.peek().cloned() {
            Some(Token::Int(n)) => {
                self.advance();
                Ok(Expression::Literal(Value::Integer(n)))
            }
            Some(Token::Real(f)) => {
                self.advance();
                Ok(Expression::Literal(Value::Float(f)))
            }
            Some(Token::Str(s)) => {
                self.advance();
                Ok(Expression::Literal(Value::Str(s)))
            }
            Some(Token::Symbol(name)) => {
                self.advance();
                if matches!(self.peek(), Some(Token::LParen)) {
                    self.advance();
                    let args = self.parse_expression_list()?;
                    self.expect(Token::RParen)?;
                    Ok(Expression::Call { name, args })
                } else {
                    Ok(Expression::Symbol(name))
                }
            }
            Some(Token::Fn) => {
                self.advance();
                let name = self.expect_symbol()?;
                self.expect(Token::LParen)?;
                let arg = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(Expression::UserFn {
                    name,
                    arg: Box::new(arg),
                })
            }
            Some(Token::LParen) => {
                self.advance();
                let inner = self.parse_expression()?;
                self.expect(Token::RParen)?;
                Ok(inner)
            }
            _ => Err(self.err("expected an expression")),
        }
    }

    /// One or more comma-separated expressions.
    fn parse_expression_list(&mut self) -> Result<Vec<Expression>, ParseError> {
        let mut items = vec![self.parse_expression()?];
        while matches!(self.peek(), Some(Token::Comma)) {
            self.advance();
            items.push(self.parse_expression()?);
        }
        Ok(items)
    }
}

fn relational_op(token: &Token) -> Option<BinaryOp> {
    let op = match token {
        Token::Equal => BinaryOp::Equal,
        Token::NotEqual => BinaryOp::NotEqual,
        Token::Less => BinaryOp::Less,
        Token::LessEqual => BinaryOp::LessEqual,
        Token::Greater => BinaryOp::Greater,
        Token::GreaterEqual => BinaryOp::GreaterEqual,
        _ => return None,
    };
    Some(op)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::tokenize;

    fn parse_one(source: &str) -> Statement {
        let line = CodeLine::new(tokenize(source).unwrap()).unwrap();
        parse(&[line]).unwrap().remove(0).statement
    }

    fn parse_err(source: &str) -> ParseError {
        let line = CodeLine::new(tokenize(source).unwrap()).unwrap();
        parse(&[line]).unwrap_err()
    }

    #[test]
    fn test_parse_scalar_assignment() {
        let statement = parse_one("10 A% = 42");
        assert_eq!(
            statement,
            Statement::Assign {
                target: "A%".into(),
                indices: vec![],
                expr: Expression::Literal(Value::Integer(42)),
            }
        );
        // LET is optional sugar for the same statement
        assert_eq!(parse_one("10 LET A% = 42"), statement);
    }

    #[test]
    fn test_parse_array_assignment() {
        let statement = parse_one("10 A(1,2) = 3");
        assert_eq!(
            statement,
            Statement::Assign {
                target: "A".into(),
                indices: vec![
                    Expression::Literal(Value::Integer(1)),
                    Expression::Literal(Value::Integer(2)),
                ],
                expr: Expression::Literal(Value::Integer(3)),
            }
        );
    }

    #[test]
    fn test_parse_print_with_separators() {
        let statement = parse_one("10 PRINT A, B; \"X\";");
        assert_eq!(
            statement,
            Statement::Print(vec![
                PrintElement::Expr(Expression::Symbol("A".into())),
                PrintElement::Comma,
                PrintElement::Expr(Expression::Symbol("B".into())),
                PrintElement::Semicolon,
                PrintElement::Expr(Expression::Literal(Value::Str("X".into()))),
                PrintElement::Semicolon,
            ])
        );
    }

    #[test]
    fn test_question_mark_is_print() {
        assert_eq!(parse_one("10 ? 1"), parse_one("10 PRINT 1"));
    }

    #[test]
    fn test_parse_colon_set() {
        let statement = parse_one("10 A = 1: PRINT A: END");
        let Statement::Set(statements) = statement else {
            panic!("expected a statement set");
        };
        assert_eq!(statements.len(), 3);
        assert_eq!(statements[2], Statement::End);
    }

    #[test]
    fn test_parse_if_then_else() {
        let statement = parse_one("10 IF A > 0 THEN PRINT \"P\" ELSE A = 1: B = 2");
        let Statement::If {
            then_branch,
            else_branch,
            ..
        } = statement
        else {
            panic!("expected IF");
        };
        assert!(matches!(*then_branch, Statement::Print(_)));
        assert!(matches!(else_branch.as_deref(), Some(Statement::Set(_))));
    }

    #[test]
    fn test_parse_if_with_numeric_branches() {
        let statement = parse_one("10 IF A THEN 70 ELSE 90");
        let Statement::If {
            then_branch,
            else_branch,
            ..
        } = statement
        else {
            panic!("expected IF");
        };
        assert_eq!(*then_branch, Statement::Goto(70));
        assert_eq!(else_branch.as_deref(), Some(&Statement::Goto(90)));
    }

    #[test]
    fn test_parse_if_goto_shorthand() {
        let statement = parse_one("10 IF C < 20 GOTO 70 ELSE PRINT \"CCC\"");
        let Statement::If { then_branch, .. } = statement else {
            panic!("expected IF");
        };
        assert_eq!(*then_branch, Statement::Goto(70));
    }

    #[test]
    fn test_if_requires_then_or_goto() {
        let error = parse_err("10 IF A PRINT 1");
        assert!(error.reason.contains("THEN or GOTO"));
    }

    #[test]
    fn test_parse_for_with_default_step() {
        let statement = parse_one("10 FOR I = 1 TO 5");
        assert_eq!(
            statement,
            Statement::ForBegin {
                var: "I".into(),
                start: Expression::Literal(Value::Integer(1)),
                end: Expression::Literal(Value::Integer(5)),
                step: Expression::Literal(Value::Integer(1)),
            }
        );
    }

    #[test]
    fn test_parse_next_variants() {
        assert_eq!(parse_one("10 NEXT"), Statement::ForEnd { var: None });
        assert_eq!(
            parse_one("10 NEXT I"),
            Statement::ForEnd {
                var: Some("I".into())
            }
        );
    }

    #[test]
    fn test_parse_on_goto_and_gosub() {
        assert_eq!(
            parse_one("10 ON X GOTO 100, 200, 300"),
            Statement::OnGoto {
                selector: Expression::Symbol("X".into()),
                targets: vec![100, 200, 300],
            }
        );
        assert!(matches!(
            parse_one("10 ON X GOSUB 100"),
            Statement::OnGosub { .. }
        ));
    }

    #[test]
    fn test_parse_data_literals() {
        let statement = parse_one("10 DATA 1, -2.5, \"QUOTED\", BARE");
        assert_eq!(
            statement,
            Statement::Data(vec![
                Value::Integer(1),
                Value::Float(-2.5),
                Value::Str("QUOTED".into()),
                Value::Str("BARE".into()),
            ])
        );
    }

    #[test]
    fn test_data_rejects_expressions() {
        let error = parse_err("10 DATA 1 + 2");
        assert!(error.reason.contains("unexpected token"));
    }

    #[test]
    fn test_parse_dim_list() {
        let statement = parse_one("10 DIM A(10), B(2,3)");
        let Statement::Dim(arrays) = statement else {
            panic!("expected DIM");
        };
        assert_eq!(arrays.len(), 2);
        assert_eq!(arrays[0].0, "A");
        assert_eq!(arrays[1].1.len(), 2);
    }

    #[test]
    fn test_parse_def_fn() {
        let statement = parse_one("10 DEF FN F(X) = X * X");
        let Statement::DefFn { name, param, .. } = statement else {
            panic!("expected DEF FN");
        };
        assert_eq!(name, "F");
        assert_eq!(param, "X");
    }

    #[test]
    fn test_parse_fn_application() {
        let statement = parse_one("10 PRINT FN F(3)");
        let Statement::Print(items) = statement else {
            panic!("expected PRINT");
        };
        assert!(matches!(
            &items[0],
            PrintElement::Expr(Expression::UserFn { name, .. }) if name == "F"
        ));
    }

    #[test]
    fn test_multiplication_binds_tighter_than_addition() {
        let statement = parse_one("10 X = 1 + 2 * 3");
        let Statement::Assign { expr, .. } = statement else {
            panic!("expected assignment");
        };
        let Expression::Binary { op, right, .. } = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Add);
        assert!(matches!(
            *right,
            Expression::Binary {
                op: BinaryOp::Multiply,
                ..
            }
        ));
    }

    #[test]
    fn test_power_is_right_associative() {
        let statement = parse_one("10 X = 2 ^ 3 ^ 2");
        let Statement::Assign { expr, .. } = statement else {
            panic!("expected assignment");
        };
        let Expression::Binary { op, right, .. } = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Power);
        assert!(matches!(
            *right,
            Expression::Binary {
                op: BinaryOp::Power,
                ..
            }
        ));
    }

    #[test]
    fn test_unary_minus_binds_tighter_than_power() {
        let statement = parse_one("10 X = -2 ^ 2");
        let Statement::Assign { expr, .. } = statement else {
            panic!("expected assignment");
        };
        let Expression::Binary { op, left, .. } = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Power);
        assert!(matches!(
            *left,
            Expression::Unary {
                op: UnaryOp::Negate,
                ..
            }
        ));
    }

    #[test]
    fn test_and_binds_tighter_than_or() {
        let statement = parse_one("10 X = A OR B AND C");
        let Statement::Assign { expr, .. } = statement else {
            panic!("expected assignment");
        };
        let Expression::Binary { op, right, .. } = expr else {
            panic!("expected binary expression");
        };
        assert_eq!(op, BinaryOp::Or);
        assert!(matches!(
            *right,
            Expression::Binary {
                op: BinaryOp::And,
                ..
            }
        ));
    }

    #[test]
    fn test_call_or_array_read_parses_uniformly() {
        let statement = parse_one("10 X = LEN(A$) + B(1)");
        let Statement::Assign { expr, .. } = statement else {
            panic!("expected assignment");
        };
        let Expression::Binary { left, right, .. } = expr else {
            panic!("expected binary expression");
        };
        assert!(matches!(*left, Expression::Call { .. }));
        assert!(matches!(*right, Expression::Call { .. }));
    }

    #[test]
    fn test_simple_and_param_commands() {
        assert_eq!(parse_one("10 CLS"), Statement::SimpleCmd("CLS".into()));
        assert_eq!(
            parse_one("10 SLEEP 100"),
            Statement::ParamCmd {
                name: "SLEEP".into(),
                arg: Expression::Literal(Value::Integer(100)),
            }
        );
    }

    #[test]
    fn test_unknown_leading_symbol_is_an_error() {
        let error = parse_err("10 FROB 1");
        assert!(error.reason.contains("FROB"));
    }

    #[test]
    fn test_rem_parses_to_placeholder() {
        assert_eq!(
            parse_one("10 REM this line intentionally blank"),
            Statement::Rem
        );
    }

    #[test]
    fn test_duplicate_line_numbers_rejected() {
        let lines = vec![
            CodeLine::new(tokenize("10 A = 1").unwrap()).unwrap(),
            CodeLine::new(tokenize("10 A = 2").unwrap()).unwrap(),
        ];
        let error = parse(&lines).unwrap_err();
        assert_eq!(error.line, Some(10));
        assert!(error.reason.contains("duplicate"));
    }

    #[test]
    fn test_pound_gets_a_targeted_error() {
        let error = parse_err("10 # 1");
        assert!(error.reason.contains("reserved"));
    }

    #[test]
    fn test_trailing_tokens_rejected() {
        let error = parse_err("10 GOTO 20 30");
        assert!(error.reason.contains("unexpected token"));
    }
}
