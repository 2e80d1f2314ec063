use super::*;
use crate::text::alphabet;

use super::processor_0op::save_result;

pub fn save(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    info!(target: "app::state", "SAVE {:04x?} requested at ${:05x}", operands, instruction.address());
    save_result(zmachine, instruction, true)
}

pub fn restore(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    info!(target: "app::state", "RESTORE {:04x?} requested at ${:05x}", operands, instruction.address());
    save_result(zmachine, instruction, true)
}

pub fn log_shift(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let places = operands[1] as i16;
    let value = match places {
        0 => operands[0],
        1..=15 => operands[0] << places,
        -15..=-1 => operands[0] >> -places,
        _ => 0,
    };
    store_result(zmachine, instruction, value)?;
    next(instruction)
}

pub fn art_shift(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let places = operands[1] as i16;
    let number = operands[0] as i16;
    let value = match places {
        0 => number,
        1..=15 => number << places,
        -15..=-1 => number >> -places,
        // Sign fill
        p if p < 0 => number >> 15,
        _ => 0,
    };
    store_result(zmachine, instruction, value as u16)?;
    next(instruction)
}

pub fn set_font(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    debug!(target: "app::stream", "SET_FONT {} unavailable", operands[0]);
    store_result(zmachine, instruction, 0)?;
    next(instruction)
}

pub fn save_undo(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    info!(target: "app::state", "SAVE_UNDO unavailable");
    store_result(zmachine, instruction, 0xFFFF)?;
    next(instruction)
}

pub fn restore_undo(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    info!(target: "app::state", "RESTORE_UNDO unavailable");
    store_result(zmachine, instruction, 0)?;
    next(instruction)
}

pub fn print_unicode(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    match char::from_u32(operands[0] as u32).and_then(alphabet::char_to_zscii) {
        Some(c) => zmachine.print(&[c])?,
        None => zmachine.print_str("?")?,
    }
    next(instruction)
}

pub fn check_unicode(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    // Bit 0: can print, bit 1: can be input
    let result = match char::from_u32(operands[0] as u32).and_then(alphabet::char_to_zscii) {
        Some(_) => 3,
        None => 0,
    };
    store_result(zmachine, instruction, result)?;
    next(instruction)
}

pub fn set_true_colour(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    debug!(target: "app::stream", "SET_TRUE_COLOUR {:04x?} ignored", operands);
    next(instruction)
}
