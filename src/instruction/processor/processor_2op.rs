use super::*;
use crate::fatal_error;
use crate::object::{self, attribute, property};

pub fn je(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let condition = operands[1..].iter().any(|w| *w == operands[0]);
    branch(zmachine, instruction, condition)
}

pub fn jl(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    branch(
        zmachine,
        instruction,
        (operands[0] as i16) < (operands[1] as i16),
    )
}

pub fn jg(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    branch(
        zmachine,
        instruction,
        (operands[0] as i16) > (operands[1] as i16),
    )
}

pub fn dec_chk(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let val = zmachine.peek_variable(variable_number(operands[0])?)? as i16;
    let new_val = val.wrapping_sub(1);
    zmachine.set_variable_indirect(variable_number(operands[0])?, new_val as u16)?;
    branch(zmachine, instruction, new_val < operands[1] as i16)
}

pub fn inc_chk(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let val = zmachine.peek_variable(variable_number(operands[0])?)? as i16;
    let new_val = val.wrapping_add(1);
    zmachine.set_variable_indirect(variable_number(operands[0])?, new_val as u16)?;
    branch(zmachine, instruction, new_val > operands[1] as i16)
}

pub fn jin(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let parent = if operands[0] == 0 {
        0
    } else {
        object::parent(zmachine, operands[0] as usize)?
    };
    branch(zmachine, instruction, parent == operands[1] as usize)
}

pub fn test(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    branch(
        zmachine,
        instruction,
        operands[0] & operands[1] == operands[1],
    )
}

pub fn or(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let result = operands.iter().fold(0, |acc, w| acc | w);
    store_result(zmachine, instruction, result)?;
    next(instruction)
}

pub fn and(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let result = operands[1..].iter().fold(operands[0], |acc, w| acc & w);
    store_result(zmachine, instruction, result)?;
    next(instruction)
}

pub fn test_attr(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let condition = attribute::value(zmachine, operands[0] as usize, attribute_number(operands[1])?)?;
    branch(zmachine, instruction, condition)
}

pub fn set_attr(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    attribute::set(zmachine, operands[0] as usize, attribute_number(operands[1])?)?;
    next(instruction)
}

pub fn clear_attr(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    attribute::clear(zmachine, operands[0] as usize, attribute_number(operands[1])?)?;
    next(instruction)
}

pub fn store(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    zmachine.set_variable_indirect(variable_number(operands[0])?, operands[1])?;
    next(instruction)
}

pub fn insert_obj(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let object = operands[0] as usize;
    if object == 0 {
        warn!(target: "app::object", "INSERT_OBJ of object 0");
    } else {
        object::insert(zmachine, object, operands[1] as usize)?;
    }
    next(instruction)
}

pub fn loadw(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let address = offset_address(operands[0] as usize, operands[1] as i16 as isize * 2)?;
    let value = zmachine.read_word(address)?;
    store_result(zmachine, instruction, value)?;
    next(instruction)
}

pub fn loadb(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let address = offset_address(operands[0] as usize, operands[1] as i16 as isize)?;
    let value = zmachine.read_byte(address)?;
    store_result(zmachine, instruction, value as u16)?;
    next(instruction)
}

pub fn get_prop(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let value = if operands[0] == 0 {
        warn!(target: "app::object", "GET_PROP of object 0");
        0
    } else {
        property::property(zmachine, operands[0] as usize, property_number(operands[1])?)?
    };
    store_result(zmachine, instruction, value)?;
    next(instruction)
}

pub fn get_prop_addr(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let value = if operands[0] == 0 {
        warn!(target: "app::object", "GET_PROP_ADDR of object 0");
        0
    } else {
        property::property_data_address(zmachine, operands[0] as usize, property_number(operands[1])?)?
    };
    store_result(zmachine, instruction, value as u16)?;
    next(instruction)
}

pub fn get_next_prop(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let value = if operands[0] == 0 {
        warn!(target: "app::object", "GET_NEXT_PROP of object 0");
        0
    } else {
        property::next_property(zmachine, operands[0] as usize, property_number(operands[1])?)?
    };
    store_result(zmachine, instruction, value as u16)?;
    next(instruction)
}

/// Fold signed arithmetic over the operands and store the result
fn arithmetic(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
    f: fn(i16, i16) -> i16,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let value = operands[1..]
        .iter()
        .fold(operands[0] as i16, |acc, w| f(acc, *w as i16));
    store_result(zmachine, instruction, value as u16)?;
    next(instruction)
}

pub fn add(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    arithmetic(zmachine, instruction, i16::wrapping_add)
}

pub fn sub(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    arithmetic(zmachine, instruction, i16::wrapping_sub)
}

pub fn mul(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    arithmetic(zmachine, instruction, i16::wrapping_mul)
}

fn check_divisor(instruction: &Instruction, operands: &[u16]) -> Result<(), RuntimeError> {
    if operands[1..].contains(&0) {
        fatal_error!(
            ErrorCode::DivideByZero,
            "Divide by zero: {}, {:?}",
            instruction,
            operands
        )
    } else {
        Ok(())
    }
}

// Division truncates toward zero and the remainder takes the sign of the dividend
pub fn div(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    check_divisor(instruction, &operands)?;
    let value = operands[1..]
        .iter()
        .fold(operands[0] as i16, |acc, w| acc.wrapping_div(*w as i16));
    store_result(zmachine, instruction, value as u16)?;
    next(instruction)
}

pub fn modulus(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    check_divisor(instruction, &operands)?;
    let value = operands[1..]
        .iter()
        .fold(operands[0] as i16, |acc, w| acc.wrapping_rem(*w as i16));
    store_result(zmachine, instruction, value as u16)?;
    next(instruction)
}

pub fn call_2s(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    call_fn(zmachine, instruction, &operands, instruction.store().copied())
}

pub fn call_2n(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    call_fn(zmachine, instruction, &operands, None)
}

pub fn set_colour(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    debug!(target: "app::stream", "SET_COLOUR {} {} ignored", operands[0], operands[1]);
    next(instruction)
}

pub fn throw(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    zmachine.throw(operands[1], operands[0])
}
