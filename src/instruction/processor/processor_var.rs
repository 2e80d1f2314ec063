use super::*;
use crate::fatal_error;
use crate::object::property;
use crate::text::{self, alphabet, dictionary};

pub fn call_vs(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    call_fn(zmachine, instruction, &operands, instruction.store().copied())
}

pub fn call_vn(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    call_fn(zmachine, instruction, &operands, None)
}

pub fn storew(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let address = offset_address(operands[0] as usize, operands[1] as i16 as isize * 2)?;
    zmachine.write_word(address, operands[2])?;
    next(instruction)
}

pub fn storeb(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let address = offset_address(operands[0] as usize, operands[1] as i16 as isize)?;
    zmachine.write_byte(address, operands[2] as u8)?;
    next(instruction)
}

pub fn put_prop(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    property::set_property(
        zmachine,
        operands[0] as usize,
        property_number(operands[1])?,
        operands[2],
    )?;
    next(instruction)
}

fn pending_input(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<String, RuntimeError> {
    match zmachine.take_input() {
        Some(input) => Ok(input),
        None => fatal_error!(
            ErrorCode::InvalidState,
            "{} without pending input",
            instruction.opcode()
        ),
    }
}

/// Line input (SREAD and AREAD).
///
/// The line comes from the input the turn was resumed with.  Version 5 stores the
/// terminating character and may skip parsing with a parse buffer address of 0.
pub fn read(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let input = pending_input(zmachine, instruction)?;
    let text_buffer = operands[0] as usize;
    let parse_buffer = operands.get(1).copied().unwrap_or(0) as usize;

    debug!(target: "app::stream", "READ: {:?}", input);
    dictionary::store_input(zmachine, text_buffer, &input)?;
    if parse_buffer > 0 {
        let dictionary = zmachine.header().dictionary();
        dictionary::parse_text(zmachine, text_buffer, parse_buffer, dictionary, false)?;
    }

    if zmachine.version() > 4 {
        store_result(zmachine, instruction, 13)?;
    }
    next(instruction)
}

pub fn print_char(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    zmachine.print(&[operands[0]])?;
    next(instruction)
}

pub fn print_num(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    zmachine.print_str(&format!("{}", operands[0] as i16))?;
    next(instruction)
}

pub fn random(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let range = operands[0] as i16;
    let value = if range > 0 {
        zmachine.random(range as u16)
    } else {
        // 0 re-seeds from entropy
        zmachine.seed(range.unsigned_abs());
        0
    };
    store_result(zmachine, instruction, value)?;
    next(instruction)
}

pub fn push(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    zmachine.push(operands[0])?;
    next(instruction)
}

pub fn pull(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let value = zmachine.variable(0)?;
    zmachine.set_variable_indirect(variable_number(operands[0])?, value)?;
    next(instruction)
}

/// Window, cursor, style, buffering, input stream and sound opcodes have no effect
pub fn screen(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    debug!(target: "app::stream", "{} {:04x?} ignored", instruction.opcode(), operands);
    next(instruction)
}

pub fn get_cursor(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let table = operands[0] as usize;
    zmachine.write_word(table, 1)?;
    zmachine.write_word(table + 2, 1)?;
    next(instruction)
}

pub fn output_stream(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let stream = operands[0] as i16;
    let table = if stream == 3 {
        operands.get(1).map(|t| *t as usize)
    } else {
        None
    };
    zmachine.output_stream(stream, table)?;
    next(instruction)
}

pub fn read_char(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    operand_values(zmachine, instruction)?;
    let input = pending_input(zmachine, instruction)?;
    let key = input
        .chars()
        .next()
        .and_then(alphabet::char_to_zscii)
        .unwrap_or(13);
    debug!(target: "app::stream", "READ_CHAR: {:?} => {}", input, key);
    store_result(zmachine, instruction, key)?;
    next(instruction)
}

pub fn scan_table(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let form = operands.get(3).copied().unwrap_or(0x82);
    let entry_size = (form & 0x7F) as usize;
    let table = operands[1] as usize;

    for i in 0..operands[2] as usize {
        let address = table + (i * entry_size);
        let value = if form & 0x80 == 0x80 {
            zmachine.read_word(address)?
        } else {
            zmachine.read_byte(address)? as u16
        };

        if value == operands[0] {
            store_result(zmachine, instruction, address as u16)?;
            return branch(zmachine, instruction, true);
        }
    }

    store_result(zmachine, instruction, 0)?;
    branch(zmachine, instruction, false)
}

pub fn tokenise(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let dictionary = match operands.get(2) {
        Some(d) if *d > 0 => *d as usize,
        _ => zmachine.header().dictionary(),
    };
    let flag = operands.get(3).map(|f| *f != 0).unwrap_or(false);
    dictionary::parse_text(
        zmachine,
        operands[0] as usize,
        operands[1] as usize,
        dictionary,
        flag,
    )?;
    next(instruction)
}

pub fn encode_text(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let start = operands[0] as usize + operands[2] as usize;
    let mut zscii = Vec::new();
    for i in 0..operands[1] as usize {
        zscii.push(zmachine.read_byte(start + i)? as u16);
    }

    let encoded = text::encode_text(zmachine, &zscii);
    let coded_text = operands[3] as usize;
    for (i, w) in encoded.iter().enumerate() {
        zmachine.write_word(coded_text + (i * 2), *w)?;
    }
    next(instruction)
}

/// Copy, or zero, a table.
///
/// A positive size copies as if through a temporary buffer.  A negative size always copies
/// forwards, so an overlapping destination may be overwritten as the copy proceeds.
pub fn copy_table(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let first = operands[0] as usize;
    let second = operands[1] as usize;
    let size = operands[2] as i16;
    let length = size.unsigned_abs() as usize;

    if second == 0 {
        for i in 0..length {
            zmachine.write_byte(first + i, 0)?;
        }
    } else if size > 0 && second > first && second < first + length {
        for i in (0..length).rev() {
            let b = zmachine.read_byte(first + i)?;
            zmachine.write_byte(second + i, b)?;
        }
    } else {
        for i in 0..length {
            let b = zmachine.read_byte(first + i)?;
            zmachine.write_byte(second + i, b)?;
        }
    }
    next(instruction)
}

pub fn print_table(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let table = operands[0] as usize;
    let width = operands[1] as usize;
    let height = operands.get(2).copied().unwrap_or(1) as usize;
    let skip = operands.get(3).copied().unwrap_or(0) as usize;

    for row in 0..height {
        if row > 0 {
            zmachine.new_line()?;
        }
        let start = table + (row * (width + skip));
        let mut text = Vec::new();
        for column in 0..width {
            text.push(zmachine.read_byte(start + column)? as u16);
        }
        zmachine.print(&text)?;
    }
    next(instruction)
}

pub fn check_arg_count(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let condition = zmachine.argument_count()? as u16 >= operands[0];
    branch(zmachine, instruction, condition)
}
