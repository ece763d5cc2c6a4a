//! Execution engine: drives parsed statements with jump-based control flow.
//!
//! The interpreter executes top-level statements by index. The program
//! counter advances before a statement runs, so jump handlers simply
//! overwrite it. Each statement reports what should happen next through a
//! [`Flow`] value instead of mutating shared flags; `LoopBack` arms a
//! one-shot resume state so a re-executed FOR or WHILE opener skips its
//! initialization.

use crate::data::DataPool;
use crate::error::{Result, RuntimeError};
use crate::functions::Builtins;
use crate::parser::{BinaryOp, Expression, PrintElement, ProgramLine, Statement, UnaryOp};
use crate::symbols::{coerce_to, var_type, SymbolTable, VarType};
use crate::value::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// What a PRINT statement hands to the host, in evaluation order.
#[derive(Debug, Clone, PartialEq)]
pub enum PrintItem {
    Value(Value),
    /// `,` separator: move to the next output line.
    LineBreak,
    /// `;` separator: run items together; trailing, it suppresses the
    /// statement's newline.
    Join,
}

/// The narrow boundary the interpreter emits side effects through.
pub trait Host {
    /// Called once per PRINT statement.
    fn print(&mut self, items: &[PrintItem]);
    /// Called with a formatted message, at most once per run.
    fn report_error(&mut self, message: &str);
    /// Called exactly once, after normal completion or an error report.
    fn program_done(&mut self);
}

/// Control transfer decided by one statement's execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    /// Redirect the program counter (GOTO, GOSUB, RETURN, ON...).
    Jump(usize),
    /// Jump back to an open FOR/WHILE opener and arm the resume state.
    /// Re-entry is line-granular: the whole opening line re-executes with
    /// the opener itself a no-op, so statements before a mid-set opener
    /// run again on every iteration.
    LoopBack(usize),
    /// END reached.
    Halt,
}

/// One open loop. `begin` is the statement index of the opening line.
#[derive(Debug, Clone, PartialEq)]
enum LoopRecord {
    For {
        var: String,
        end: Value,
        step: Value,
        begin: usize,
    },
    While {
        begin: usize,
    },
}

/// Interpreter lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Idle,
    Running,
    Done,
}

/// A single-shot interpreter for one loaded program.
pub struct Interpreter {
    statements: Vec<ProgramLine>,
    line_index: HashMap<u16, usize>,
    symbols: SymbolTable,
    data: DataPool,
    loop_stack: Vec<LoopRecord>,
    call_stack: Vec<usize>,
    functions: HashMap<String, (String, Expression)>,
    builtins: Builtins,
    pc: usize,
    resuming: bool,
    state: State,
}

impl Interpreter {
    /// Prepare a parsed program for execution. All DATA literals are
    /// pooled up front; lines that were nothing but DATA leave the
    /// executable stream, so jumping to one is an undefined-line error.
    pub fn new(program: Vec<ProgramLine>) -> Self {
        let mut data = DataPool::new();
        let mut statements = Vec::with_capacity(program.len());
        for line in program {
            collect_data(&line.statement, &mut data);
            if !matches!(line.statement, Statement::Data(_)) {
                statements.push(line);
            }
        }
        let line_index = statements
            .iter()
            .enumerate()
            .map(|(index, line)| (line.number, index))
            .collect();
        Self {
            statements,
            line_index,
            symbols: SymbolTable::new(),
            data,
            loop_stack: Vec::new(),
            call_stack: Vec::new(),
            functions: HashMap::new(),
            builtins: Builtins::new(),
            pc: 0,
            resuming: false,
            state: State::Idle,
        }
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Run the program to completion. A runtime error is formatted as
    /// `?<MESSAGE> ERROR IN LINE <n>` and reported once; `program_done`
    /// fires exactly once either way.
    pub fn run(&mut self, host: &mut dyn Host) {
        if self.state != State::Idle {
            return;
        }
        self.state = State::Running;
        while self.state == State::Running && self.pc < self.statements.len() {
            let current = self.pc;
            // advance first so jump handlers can overwrite
            self.pc += 1;
            let statement = self.statements[current].statement.clone();
            match self.execute(&statement, host) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Jump(target)) => self.pc = target,
                Ok(Flow::LoopBack(target)) => {
                    self.pc = target;
                    self.resuming = true;
                }
                Ok(Flow::Halt) => break,
                Err(error) => {
                    let line = self.statements[current].number;
                    host.report_error(&format!("?{} ERROR IN LINE {}", error, line));
                    break;
                }
            }
        }
        self.state = State::Done;
        host.program_done();
    }

    fn execute(&mut self, statement: &Statement, host: &mut dyn Host) -> Result<Flow> {
        match statement {
            Statement::Set(children) => {
                for child in children {
                    let flow = self.execute(child, host)?;
                    // a jump abandons the rest of the set
                    if flow != Flow::Continue {
                        return Ok(flow);
                    }
                }
                Ok(Flow::Continue)
            }
            Statement::Print(items) => self.exec_print(items, host),
            Statement::Assign {
                target,
                indices,
                expr,
            } => {
                let value = self.eval(expr)?;
                if indices.is_empty() {
                    self.symbols.set(target, value)?;
                } else {
                    let indices = self.eval_indices(indices)?;
                    self.symbols.array_set(target, &indices, value)?;
                }
                Ok(Flow::Continue)
            }
            Statement::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval(cond)?.truthy() {
                    self.execute(then_branch, host)
                } else if let Some(branch) = else_branch {
                    self.execute(branch, host)
                } else {
                    Ok(Flow::Continue)
                }
            }
            Statement::ForBegin {
                var,
                start,
                end,
                step,
            } => self.exec_for_begin(var, start, end, step),
            Statement::ForEnd { var } => self.exec_for_end(var.as_deref()),
            Statement::WhileBegin { cond } => self.exec_while_begin(cond),
            Statement::WhileEnd => self.exec_while_end(),
            Statement::Goto(number) => Ok(Flow::Jump(self.line_target(*number)?)),
            Statement::Gosub(number) => {
                let target = self.line_target(*number)?;
                self.call_stack.push(self.pc);
                Ok(Flow::Jump(target))
            }
            Statement::Return => {
                let target = self
                    .call_stack
                    .pop()
                    .ok_or(RuntimeError::ReturnWithoutGosub)?;
                Ok(Flow::Jump(target))
            }
            Statement::OnGoto { selector, targets } => self.exec_on(selector, targets, false),
            Statement::OnGosub { selector, targets } => self.exec_on(selector, targets, true),
            Statement::Pop => {
                self.call_stack
                    .pop()
                    .ok_or(RuntimeError::ReturnWithoutGosub)?;
                Ok(Flow::Continue)
            }
            // pooled before the run started
            Statement::Data(_) => Ok(Flow::Continue),
            Statement::Read(names) => {
                for name in names {
                    let value = self.data.next_value()?;
                    self.symbols.set(name, value)?;
                }
                Ok(Flow::Continue)
            }
            Statement::Restore => {
                self.data.restore();
                Ok(Flow::Continue)
            }
            Statement::Dim(arrays) => {
                for (name, dims) in arrays {
                    let mut sizes = Vec::with_capacity(dims.len());
                    for dim in dims {
                        let bound = self.eval(dim)?.as_number()? as i64;
                        if bound < 0 {
                            return Err(RuntimeError::IllegalQuantity);
                        }
                        // DIM A(10) allocates indices 0..=10
                        sizes.push(bound as usize + 1);
                    }
                    self.symbols.declare_array(name, sizes)?;
                }
                Ok(Flow::Continue)
            }
            Statement::DefFn { name, param, body } => {
                self.functions
                    .insert(name.clone(), (param.clone(), body.clone()));
                Ok(Flow::Continue)
            }
            Statement::Swap { left, right } => self.exec_swap(left, right),
            Statement::End => Ok(Flow::Halt),
            Statement::Rem => Ok(Flow::Continue),
            Statement::SimpleCmd(name) => {
                self.builtins.command(name, None)?;
                Ok(Flow::Continue)
            }
            Statement::ParamCmd { name, arg } => {
                let value = self.eval(arg)?;
                self.builtins.command(name, Some(&value))?;
                Ok(Flow::Continue)
            }
        }
    }

    fn exec_print(&mut self, items: &[PrintElement], host: &mut dyn Host) -> Result<Flow> {
        let mut out = Vec::with_capacity(items.len());
        for item in items {
            out.push(match item {
                PrintElement::Expr(expr) => PrintItem::Value(self.eval(expr)?),
                PrintElement::Comma => PrintItem::LineBreak,
                PrintElement::Semicolon => PrintItem::Join,
            });
        }
        host.print(&out);
        Ok(Flow::Continue)
    }

    fn exec_for_begin(
        &mut self,
        var: &str,
        start: &Expression,
        end: &Expression,
        step: &Expression,
    ) -> Result<Flow> {
        if self.resuming {
            // jumped back from NEXT: the live record already describes
            // this loop, so the opener is a no-op
            self.resuming = false;
            return Ok(Flow::Continue);
        }
        let start = self.eval(start)?;
        let end = self.eval(end)?;
        let step = self.eval(step)?;
        start.as_number()?;
        end.as_number()?;
        step.as_number()?;
        let record = LoopRecord::For {
            var: var.to_string(),
            end,
            step,
            begin: self.pc - 1,
        };
        // re-entering the same variable's FOR by GOTO reuses the open record
        let reuse = matches!(
            self.loop_stack.last(),
            Some(LoopRecord::For { var: top, .. }) if top == var
        );
        if reuse {
            if let Some(top) = self.loop_stack.last_mut() {
                *top = record;
            }
        } else {
            self.loop_stack.push(record);
        }
        self.symbols.set(var, start)?;
        Ok(Flow::Continue)
    }

    fn exec_for_end(&mut self, var: Option<&str>) -> Result<Flow> {
        let (loop_var, end, step, begin) = match self.loop_stack.last() {
            Some(LoopRecord::For {
                var: loop_var,
                end,
                step,
                begin,
            }) => {
                if let Some(name) = var {
                    if name != loop_var {
                        return Err(RuntimeError::NextWithoutFor);
                    }
                }
                (loop_var.clone(), end.clone(), step.clone(), *begin)
            }
            _ => return Err(RuntimeError::NextWithoutFor),
        };
        let current = self.symbols.get(&loop_var)?;
        let advanced = current.add(step.clone())?;
        self.symbols.set(&loop_var, advanced)?;
        let stored = self.symbols.get(&loop_var)?.as_number()?;
        let finished = if step.as_number()? >= 0.0 {
            stored > end.as_number()?
        } else {
            stored < end.as_number()?
        };
        if finished {
            self.loop_stack.pop();
            Ok(Flow::Continue)
        } else {
            Ok(Flow::LoopBack(begin))
        }
    }

    fn exec_while_begin(&mut self, cond: &Expression) -> Result<Flow> {
        let begin = self.pc - 1;
        if self.resuming {
            self.resuming = false;
        } else {
            self.loop_stack.push(LoopRecord::While { begin });
        }
        if self.eval(cond)?.truthy() {
            Ok(Flow::Continue)
        } else {
            self.loop_stack.pop();
            let after = self.find_wend(begin)?;
            Ok(Flow::Jump(after))
        }
    }

    fn exec_while_end(&mut self) -> Result<Flow> {
        match self.loop_stack.last() {
            Some(LoopRecord::While { begin }) => Ok(Flow::LoopBack(*begin)),
            _ => Err(RuntimeError::WendWithoutWhile),
        }
    }

    /// Forward scan for the WEND matching the WHILE at `begin`, nesting
    /// aware. Returns the index just past the WEND's line; jumps are
    /// line-granular, so statements after the WEND in the same colon set
    /// are skipped along with the loop body.
    fn find_wend(&self, begin: usize) -> Result<usize> {
        let mut depth = 1i32;
        for (index, line) in self.statements.iter().enumerate().skip(begin + 1) {
            scan_whiles(&line.statement, &mut depth);
            if depth == 0 {
                return Ok(index + 1);
            }
        }
        Err(RuntimeError::WhileWithoutWend)
    }

    fn exec_on(&mut self, selector: &Expression, targets: &[u16], gosub: bool) -> Result<Flow> {
        let chosen = self.eval(selector)?.as_number()? as i64;
        // anything outside 1..=len falls through
        if chosen < 1 || chosen as usize > targets.len() {
            return Ok(Flow::Continue);
        }
        let target = self.line_target(targets[chosen as usize - 1])?;
        if gosub {
            self.call_stack.push(self.pc);
        }
        Ok(Flow::Jump(target))
    }

    fn exec_swap(&mut self, left: &str, right: &str) -> Result<Flow> {
        // reject string/number swaps before either side mutates
        if (var_type(left) == VarType::Str) != (var_type(right) == VarType::Str) {
            return Err(RuntimeError::TypeMismatch);
        }
        let a = self.symbols.get(left)?;
        let b = self.symbols.get(right)?;
        self.symbols.set(left, b)?;
        self.symbols.set(right, a)?;
        Ok(Flow::Continue)
    }

    fn line_target(&self, number: u16) -> Result<usize> {
        self.line_index
            .get(&number)
            .copied()
            .ok_or(RuntimeError::UndefinedLine(number))
    }

    fn eval_indices(&mut self, exprs: &[Expression]) -> Result<Vec<i32>> {
        let mut indices = Vec::with_capacity(exprs.len());
        for expr in exprs {
            indices.push(self.eval(expr)?.as_number()? as i32);
        }
        Ok(indices)
    }

    fn eval(&mut self, expr: &Expression) -> Result<Value> {
        match expr {
            Expression::Literal(value) => Ok(value.clone()),
            Expression::Symbol(name) => self.symbols.get(name),
            Expression::Call { name, args } => {
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                if Builtins::is_function(name) {
                    self.builtins.call(name, &values)
                } else if self.symbols.has_array(name) {
                    let indices: Vec<i32> = {
                        let mut out = Vec::with_capacity(values.len());
                        for value in &values {
                            out.push(value.as_number()? as i32);
                        }
                        out
                    };
                    self.symbols.array_get(name, &indices)
                } else {
                    // neither an intrinsic nor a declared array
                    Err(RuntimeError::Subscript)
                }
            }
            Expression::UserFn { name, arg } => {
                let (param, body) = self
                    .functions
                    .get(name)
                    .cloned()
                    .ok_or_else(|| RuntimeError::UnknownFunction(name.clone()))?;
                let value = self.eval(arg)?;
                // bind the parameter, evaluate, then restore the outer binding
                let saved = self.symbols.take(&param);
                let result = self
                    .symbols
                    .set(&param, value)
                    .and_then(|_| self.eval(&body));
                self.symbols.restore(&param, saved);
                // the function name's suffix types its result
                coerce_to(name, result?)
            }
            Expression::Unary { op, operand } => {
                let value = self.eval(operand)?;
                match op {
                    UnaryOp::Negate => value.neg(),
                    UnaryOp::Not => Ok(Value::Integer(if value.truthy() { 0 } else { 1 })),
                }
            }
            Expression::Binary { op, left, right } => {
                // both sides always evaluate: AND/OR do not short-circuit
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                apply_binary(*op, left, right)
            }
        }
    }
}

fn apply_binary(op: BinaryOp, left: Value, right: Value) -> Result<Value> {
    match op {
        BinaryOp::Add => left.add(right),
        BinaryOp::Subtract => left.sub(right),
        BinaryOp::Multiply => left.mul(right),
        BinaryOp::Divide => left.div(right),
        BinaryOp::Power => left.pow(right),
        BinaryOp::And => Ok(Value::Integer((left.truthy() && right.truthy()) as i32)),
        BinaryOp::Or => Ok(Value::Integer((left.truthy() || right.truthy()) as i32)),
        BinaryOp::Equal
        | BinaryOp::NotEqual
        | BinaryOp::Less
        | BinaryOp::LessEqual
        | BinaryOp::Greater
        | BinaryOp::GreaterEqual => {
            let ordering = left.compare(&right)?;
            let truth = match op {
                BinaryOp::Equal => ordering == Ordering::Equal,
                BinaryOp::NotEqual => ordering != Ordering::Equal,
                BinaryOp::Less => ordering == Ordering::Less,
                BinaryOp::LessEqual => ordering != Ordering::Greater,
                BinaryOp::Greater => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            };
            Ok(Value::Integer(truth as i32))
        }
    }
}

/// Pool DATA literals from a statement, looking inside sets and branches.
fn collect_data(statement: &Statement, pool: &mut DataPool) {
    match statement {
        Statement::Data(values) => pool.add(values),
        Statement::Set(children) => {
            for child in children {
                collect_data(child, pool);
            }
        }
        Statement::If {
            then_branch,
            else_branch,
            ..
        } => {
            collect_data(then_branch, pool);
            if let Some(branch) = else_branch {
                collect_data(branch, pool);
            }
        }
        _ => {}
    }
}

/// Track WHILE/WEND nesting across one top-level statement.
fn scan_whiles(statement: &Statement, depth: &mut i32) {
    match statement {
        Statement::WhileBegin { .. } => *depth += 1,
        Statement::WhileEnd => *depth -= 1,
        Statement::Set(children) => {
            for child in children {
                if *depth == 0 {
                    break;
                }
                scan_whiles(child, depth);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_program;

    #[derive(Default)]
    struct RecordingHost {
        prints: Vec<Vec<PrintItem>>,
        errors: Vec<String>,
        done: u32,
    }

    impl Host for RecordingHost {
        fn print(&mut self, items: &[PrintItem]) {
            self.prints.push(items.to_vec());
        }
        fn report_error(&mut self, message: &str) {
            self.errors.push(message.to_string());
        }
        fn program_done(&mut self) {
            self.done += 1;
        }
    }

    fn run(source: &str) -> RecordingHost {
        let program = load_program(source).expect("program should load");
        let mut host = RecordingHost::default();
        Interpreter::new(program).run(&mut host);
        host
    }

    #[test]
    fn test_print_forwards_values_and_separators() {
        let host = run("10 PRINT 1, 2; 3;");
        assert_eq!(
            host.prints,
            vec![vec![
                PrintItem::Value(Value::Integer(1)),
                PrintItem::LineBreak,
                PrintItem::Value(Value::Integer(2)),
                PrintItem::Join,
                PrintItem::Value(Value::Integer(3)),
                PrintItem::Join,
            ]]
        );
        assert_eq!(host.done, 1);
        assert!(host.errors.is_empty());
    }

    #[test]
    fn test_program_done_fires_once_on_error_too() {
        let host = run("10 NEXT");
        assert_eq!(host.errors, vec!["?NEXT WITHOUT FOR ERROR IN LINE 10"]);
        assert_eq!(host.done, 1);
        assert_eq!(host.prints.len(), 0);
    }

    #[test]
    fn test_error_stops_the_run() {
        let host = run("10 PRINT 1\n20 A = 1 / 0\n30 PRINT 3");
        assert_eq!(host.prints.len(), 1);
        assert_eq!(host.errors, vec!["?DIVISION BY ZERO ERROR IN LINE 20"]);
    }

    #[test]
    fn test_jump_abandons_rest_of_set() {
        let host = run("10 A = 1: GOTO 30: PRINT \"SKIPPED\"\n20 PRINT \"ALSO SKIPPED\"\n30 PRINT A");
        assert_eq!(
            host.prints,
            vec![vec![PrintItem::Value(Value::Float(1.0))]]
        );
    }

    #[test]
    fn test_goto_undefined_line() {
        let host = run("10 GOTO 99");
        assert_eq!(host.errors, vec!["?UNDEFINED LINE 99 ERROR IN LINE 10"]);
    }

    #[test]
    fn test_data_only_lines_leave_the_jump_table() {
        let host = run("10 DATA 1\n20 GOTO 10");
        assert_eq!(host.errors, vec!["?UNDEFINED LINE 10 ERROR IN LINE 20"]);
    }

    #[test]
    fn test_on_goto_fallthrough_out_of_range() {
        let host = run("10 X = 5\n20 ON X GOTO 40, 50\n30 PRINT \"FELL\"\n40 END\n50 END");
        assert_eq!(
            host.prints,
            vec![vec![PrintItem::Value(Value::Str("FELL".into()))]]
        );
    }

    #[test]
    fn test_while_with_false_condition_skips_past_nested_wend() {
        let source = "\
10 WHILE 0
20 WHILE 1
30 WEND
40 WEND
50 PRINT \"AFTER\"";
        let host = run(source);
        assert!(host.errors.is_empty());
        assert_eq!(
            host.prints,
            vec![vec![PrintItem::Value(Value::Str("AFTER".into()))]]
        );
    }

    #[test]
    fn test_while_without_wend() {
        let host = run("10 WHILE 0\n20 PRINT 1");
        assert_eq!(host.errors, vec!["?WHILE WITHOUT WEND ERROR IN LINE 10"]);
    }

    #[test]
    fn test_wend_with_for_on_top_is_an_error() {
        let host = run("10 FOR I = 1 TO 2\n20 WEND");
        assert_eq!(host.errors, vec!["?WEND WITHOUT WHILE ERROR IN LINE 20"]);
    }

    #[test]
    fn test_mismatched_next_variable() {
        let host = run("10 FOR I = 1 TO 2\n20 NEXT J");
        assert_eq!(host.errors, vec!["?NEXT WITHOUT FOR ERROR IN LINE 20"]);
    }

    #[test]
    fn test_interpreter_is_single_shot() {
        let program = load_program("10 PRINT 1").unwrap();
        let mut interpreter = Interpreter::new(program);
        let mut host = RecordingHost::default();
        interpreter.run(&mut host);
        interpreter.run(&mut host);
        assert_eq!(host.done, 1);
        assert_eq!(host.prints.len(), 1);
        assert_eq!(interpreter.state(), State::Done);
    }
}
