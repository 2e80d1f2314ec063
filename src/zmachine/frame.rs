//! Routine call frames.
//!
//! A frame holds what a routine owns while it runs: its local variables, its
//! private operand stack and the argument count.  It also remembers where the
//! caller resumes and which variable receives the return value.
use crate::instruction::StoreResult;
use crate::{error::*, fatal_error};

/// Initial operand stack allocation
const STACK_CAPACITY: usize = 32;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    locals: Vec<u16>,
    arguments: u8,
    stack: Vec<u16>,
    store: Option<StoreResult>,
    return_address: usize,
}

impl Frame {
    /// Rebuild a frame from its parts
    ///
    /// # Arguments
    /// * `locals` - Local variable values
    /// * `arguments` - Number of arguments the routine was called with
    /// * `stack` - Operand stack, bottom first
    /// * `store` - Variable that receives the return value, if any
    /// * `return_address` - Caller's resume address
    pub fn new(
        locals: &[u16],
        arguments: u8,
        stack: &[u16],
        store: Option<StoreResult>,
        return_address: usize,
    ) -> Frame {
        let mut s = Vec::with_capacity(STACK_CAPACITY.max(stack.len()));
        s.extend_from_slice(stack);
        Frame {
            locals: locals.to_vec(),
            arguments,
            stack: s,
            store,
            return_address,
        }
    }

    /// The program's outermost context
    pub fn main() -> Frame {
        Frame::new(&[], 0, &[], None, 0)
    }

    /// Enter a routine.
    ///
    /// Arguments overwrite the leading locals.  Arguments past the last local
    /// are dropped, but still count toward `check_arg_count`.
    ///
    /// # Arguments
    /// * `arguments` - Call arguments
    /// * `locals` - Initial local values from the routine header (or zeros)
    /// * `store` - Variable that receives the return value, if any
    /// * `return_address` - Caller's resume address
    pub fn call_routine(
        arguments: &[u16],
        mut locals: Vec<u16>,
        store: Option<StoreResult>,
        return_address: usize,
    ) -> Frame {
        let n = arguments.len().min(locals.len());
        locals[..n].copy_from_slice(&arguments[..n]);
        let mut frame = Frame::new(&[], arguments.len() as u8, &[], store, return_address);
        frame.locals = locals;
        frame
    }

    pub fn local_variables(&self) -> &[u16] {
        &self.locals
    }

    pub fn argument_count(&self) -> u8 {
        self.arguments
    }

    pub fn stack(&self) -> &[u16] {
        &self.stack
    }

    pub fn result(&self) -> Option<&StoreResult> {
        self.store.as_ref()
    }

    pub fn return_address(&self) -> usize {
        self.return_address
    }

    pub fn push(&mut self, value: u16) {
        self.stack.push(value);
        debug!(target: "app::state", "Stack push {:04x}, depth {}", value, self.stack.len());
    }

    fn pop(&mut self) -> Result<u16, RuntimeError> {
        match self.stack.pop() {
            Some(v) => {
                debug!(target: "app::state", "Stack pop {:04x}, depth {}", v, self.stack.len());
                Ok(v)
            }
            None => fatal_error!(ErrorCode::StackUnderflow, "Pop from an empty routine stack"),
        }
    }

    fn top(&self) -> Result<u16, RuntimeError> {
        match self.stack.last() {
            Some(v) => Ok(*v),
            None => fatal_error!(ErrorCode::StackUnderflow, "Read from an empty routine stack"),
        }
    }

    /// Index into `locals` for variable 1..=15
    fn slot(&self, variable: u8) -> Result<usize, RuntimeError> {
        match variable as usize {
            v if v >= 1 && v <= self.locals.len() => Ok(v - 1),
            v => fatal_error!(
                ErrorCode::VariableAccessViolation,
                "Local variable L{:02x} but the routine has {} locals",
                v.wrapping_sub(1),
                self.locals.len()
            ),
        }
    }

    /// Read a local variable; variable 0 pops the stack
    pub fn local_variable(&mut self, variable: u8) -> Result<u16, RuntimeError> {
        match variable {
            0 => self.pop(),
            v => Ok(self.locals[self.slot(v)?]),
        }
    }

    /// Read a local variable; variable 0 reads the top of the stack in place
    pub fn peek_local_variable(&self, variable: u8) -> Result<u16, RuntimeError> {
        match variable {
            0 => self.top(),
            v => Ok(self.locals[self.slot(v)?]),
        }
    }

    /// Write a local variable; variable 0 pushes to the stack
    pub fn set_local_variable(&mut self, variable: u8, value: u16) -> Result<(), RuntimeError> {
        match variable {
            0 => self.push(value),
            v => {
                let i = self.slot(v)?;
                self.locals[i] = value;
            }
        }
        Ok(())
    }

    /// Write a local variable by reference; variable 0 replaces the top of the stack
    pub fn set_local_variable_indirect(
        &mut self,
        variable: u8,
        value: u16,
    ) -> Result<(), RuntimeError> {
        if variable == 0 {
            self.pop()?;
        }
        self.set_local_variable(variable, value)
    }
}
