use crate::error::RuntimeError;
use crate::instruction::{Instruction, NextAddress};
use crate::text;
use crate::zmachine::ZMachine;

use super::{branch, next, store_result};

pub fn rtrue(zmachine: &mut ZMachine, _instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    zmachine.return_routine(1)
}

pub fn rfalse(zmachine: &mut ZMachine, _instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    zmachine.return_routine(0)
}

fn print_literal(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<(), RuntimeError> {
    let ztext = instruction.text().unwrap_or_default();
    let text = text::from_vec(zmachine, ztext, false)?;
    zmachine.print(&text)
}

pub fn print(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    print_literal(zmachine, instruction)?;
    next(instruction)
}

pub fn print_ret(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    print_literal(zmachine, instruction)?;
    zmachine.new_line()?;
    zmachine.return_routine(1)
}

pub fn nop(_zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    next(instruction)
}

/// Report the outcome of an in-game save or restore: a branch in versions 1-3, a store after.
pub(super) fn save_result(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
    success: bool,
) -> Result<NextAddress, RuntimeError> {
    if zmachine.version() < 4 {
        branch(zmachine, instruction, success)
    } else {
        store_result(zmachine, instruction, if success { 1 } else { 0 })?;
        next(instruction)
    }
}

// Player state is persisted at the turn boundary by the caller, so in-game SAVE and
// RESTORE succeed without doing anything.
pub fn save(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    info!(target: "app::state", "SAVE requested at ${:05x}", instruction.address());
    save_result(zmachine, instruction, true)
}

pub fn restore(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    info!(target: "app::state", "RESTORE requested at ${:05x}", instruction.address());
    save_result(zmachine, instruction, true)
}

pub fn restart(zmachine: &mut ZMachine, _instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    Ok(NextAddress::Address(zmachine.restart()?))
}

pub fn ret_popped(
    zmachine: &mut ZMachine,
    _instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let value = zmachine.variable(0)?;
    zmachine.return_routine(value)
}

pub fn pop(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    zmachine.variable(0)?;
    next(instruction)
}

pub fn catch(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let depth = zmachine.frame_count();
    store_result(zmachine, instruction, depth as u16)?;
    next(instruction)
}

pub fn quit(_zmachine: &mut ZMachine, _instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    Ok(NextAddress::Quit)
}

pub fn new_line(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    zmachine.new_line()?;
    next(instruction)
}

// No status line
pub fn show_status(
    _zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    next(instruction)
}

pub fn verify(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let expected = zmachine.header().checksum();
    let checksum = zmachine.checksum();
    debug!(target: "app::state", "VERIFY: expected {:04x}, computed {:04x}", expected, checksum);
    branch(zmachine, instruction, expected == checksum)
}

pub fn piracy(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    branch(zmachine, instruction, true)
}
