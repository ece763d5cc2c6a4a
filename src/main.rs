//! Command-line driver: run a BASIC program file against a console host.

use basic_interpreter::{load_program, Host, Interpreter, PrintItem};
use std::io::{self, Write};
use std::{env, fs, process};

/// Renders PRINT traffic to stdout: comma separators break the line,
/// a trailing semicolon suppresses the statement's newline.
#[derive(Default)]
struct Console;

impl Host for Console {
    fn print(&mut self, items: &[PrintItem]) {
        let mut line = String::new();
        for item in items {
            match item {
                PrintItem::Value(value) => line.push_str(&value.to_string()),
                PrintItem::LineBreak => line.push('\n'),
                PrintItem::Join => {}
            }
        }
        if !matches!(items.last(), Some(PrintItem::Join)) {
            line.push('\n');
        }
        print!("{}", line);
        let _ = io::stdout().flush();
    }

    fn report_error(&mut self, message: &str) {
        println!("{}", message);
    }

    fn program_done(&mut self) {}
}

fn main() {
    let path = match env::args().nth(1) {
        Some(path) => path,
        None => {
            eprintln!("usage: basic-interpreter <program.bas>");
            process::exit(2);
        }
    };
    let source = match fs::read_to_string(&path) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("{}: {}", path, error);
            process::exit(1);
        }
    };
    let program = match load_program(&source) {
        Ok(program) => program,
        Err(error) => {
            eprintln!("{}", error);
            process::exit(1);
        }
    };
    let mut console = Console;
    let mut interpreter = Interpreter::new(program);
    interpreter.run(&mut console);
}
