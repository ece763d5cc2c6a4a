//! An interpreter for a line-numbered, 8-bit-style BASIC dialect.
//!
//! Source text is tokenized line by line, parsed into a statement tree
//! keyed by line number, and executed by a runtime that owns the symbol
//! table, the DATA pool, and the loop and call stacks. Every observable
//! effect of a running program flows through the [`runtime::Host`] trait,
//! so the core stays free of any display or terminal concern.
//!
//! ```no_run
//! use basic_interpreter::{load_program, Interpreter};
//! # struct MyHost;
//! # impl basic_interpreter::Host for MyHost {
//! #     fn print(&mut self, _: &[basic_interpreter::PrintItem]) {}
//! #     fn report_error(&mut self, _: &str) {}
//! #     fn program_done(&mut self) {}
//! # }
//! let program = load_program("10 PRINT \"HELLO\"").unwrap();
//! let mut host = MyHost;
//! Interpreter::new(program).run(&mut host);
//! ```

pub mod data;
pub mod error;
pub mod functions;
pub mod lexer;
pub mod parser;
pub mod runtime;
pub mod symbols;
pub mod value;

pub use error::{Error, LexError, ParseError, RuntimeError};
pub use parser::{Expression, ProgramLine, Statement};
pub use runtime::{Host, Interpreter, PrintItem, State};
pub use value::Value;

/// Tokenize and parse full program source into executable form.
///
/// Blank lines are skipped; every remaining line must begin with a
/// positive line number. Lex and parse failures are returned here, before
/// any execution.
pub fn load_program(source: &str) -> Result<Vec<ProgramLine>, Error> {
    let mut lines = Vec::new();
    for raw in source.lines() {
        if raw.trim().is_empty() {
            continue;
        }
        let tokens = lexer::tokenize(raw)?;
        lines.push(lexer::CodeLine::new(tokens)?);
    }
    Ok(parser::parse(&lines)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_program_skips_blank_lines() {
        let program = load_program("10 A = 1\n\n   \n20 END\n").unwrap();
        assert_eq!(program.len(), 2);
        assert_eq!(program[0].number, 10);
        assert_eq!(program[1].number, 20);
    }

    #[test]
    fn test_load_program_surfaces_lex_errors() {
        assert!(matches!(
            load_program("10 PRINT \"OOPS"),
            Err(Error::Lex(LexError::UnterminatedString))
        ));
    }

    #[test]
    fn test_load_program_surfaces_parse_errors() {
        assert!(matches!(
            load_program("10 GOTO GOTO"),
            Err(Error::Parse(_))
        ));
        assert!(matches!(load_program("PRINT 1"), Err(Error::Parse(_))));
    }
}
