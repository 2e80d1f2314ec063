//! Instruction decoding
use super::*;
use crate::{
    error::*,
    zmachine::{memory, ZMachine},
};

fn operand_type(type_byte: u8, operand_index: u8) -> Option<OperandType> {
    // Types are packed in the byte: 00112233
    // ... to get type n, shift right 6 - (n * 2) bits
    let t = (type_byte >> (6 - (operand_index * 2))) & 3;
    match t {
        0 => Some(OperandType::LargeConstant),
        1 => Some(OperandType::SmallConstant),
        2 => Some(OperandType::Variable),
        _ => None,
    }
}

fn long_operand_type(opcode: u8, index: u8) -> OperandType {
    if opcode >> (6 - index) & 1 == 1 {
        OperandType::Variable
    } else {
        OperandType::SmallConstant
    }
}

/// Append the types in `b` up to the first omitted one.  Returns `true` if none were omitted.
fn type_byte(types: &mut Vec<OperandType>, b: u8) -> bool {
    for i in 0..4 {
        match operand_type(b, i) {
            Some(t) => types.push(t),
            None => return false,
        }
    }
    true
}

fn operand_types(
    zmachine: &ZMachine,
    opcode_byte: u8,
    form: OpcodeForm,
    mut address: usize,
) -> Result<(usize, Vec<OperandType>), RuntimeError> {
    let mut types = Vec::new();
    match form {
        OpcodeForm::Short => {
            if let Some(t) = operand_type(opcode_byte, 1) {
                types.push(t);
            }
        }
        OpcodeForm::Long => {
            types.push(long_operand_type(opcode_byte, 0));
            types.push(long_operand_type(opcode_byte, 1));
        }
        OpcodeForm::Var | OpcodeForm::Ext => {
            let complete = type_byte(&mut types, zmachine.force_read_byte(address)?);
            address += 1;
            // call_vs2 and call_vn2 always carry a second type byte.  It is skipped
            // even when the first byte already omits an operand, and its types only
            // count when all four in the first byte are present.
            if form == OpcodeForm::Var && (opcode_byte == 0xEC || opcode_byte == 0xFA) {
                let b = zmachine.force_read_byte(address)?;
                if complete {
                    type_byte(&mut types, b);
                }
                address += 1;
            }
        }
    }

    Ok((address, types))
}

fn operands(
    zmachine: &ZMachine,
    operand_types: &[OperandType],
    mut address: usize,
) -> Result<(usize, Vec<Operand>), RuntimeError> {
    let mut operands = Vec::new();

    for optype in operand_types {
        match optype {
            OperandType::LargeConstant => {
                operands.push(Operand::new(*optype, zmachine.force_read_word(address)?));
                address += 2;
            }
            OperandType::SmallConstant | OperandType::Variable => {
                operands.push(Operand::new(
                    *optype,
                    zmachine.force_read_byte(address)? as u16,
                ));
                address += 1;
            }
        }
    }

    Ok((address, operands))
}

fn result_variable(
    zmachine: &ZMachine,
    opcode: Opcode,
    address: usize,
) -> Result<(usize, Option<StoreResult>), RuntimeError> {
    if opcode.stores(zmachine.version()) {
        Ok((
            address + 1,
            Some(StoreResult::new(address, zmachine.force_read_byte(address)?)),
        ))
    } else {
        Ok((address, None))
    }
}

fn branch_address(address: usize, offset: i16) -> usize {
    match offset {
        0 => 0,
        1 => 1,
        _ => ((address as isize) + offset as isize) as usize,
    }
}

fn branch_condition(
    zmachine: &ZMachine,
    address: usize,
) -> Result<(usize, Option<Branch>), RuntimeError> {
    let b = zmachine.force_read_byte(address)?;
    let condition = b & 0x80 == 0x80;
    match b & 0x40 {
        0x40 => {
            let b_offset = b & 0x3f;
            Ok((
                address + 1,
                Some(Branch::new(
                    address,
                    condition,
                    branch_address(address - 1, b_offset as i16),
                )),
            ))
        }
        _ => {
            let mut b_offset = memory::word_value(b & 0x3f, zmachine.force_read_byte(address + 1)?);
            if b_offset & 0x2000 == 0x2000 {
                b_offset |= 0xC000;
            }
            Ok((
                address + 2,
                Some(Branch::new(
                    address,
                    condition,
                    branch_address(address, b_offset as i16),
                )),
            ))
        }
    }
}

fn branch(
    zmachine: &ZMachine,
    opcode: Opcode,
    address: usize,
) -> Result<(usize, Option<Branch>), RuntimeError> {
    if opcode.branches(zmachine.version()) {
        branch_condition(zmachine, address)
    } else {
        Ok((address, None))
    }
}

fn text(
    zmachine: &ZMachine,
    opcode: Opcode,
    mut address: usize,
) -> Result<(usize, Option<Vec<u16>>), RuntimeError> {
    if !opcode.has_text() {
        return Ok((address, None));
    }

    let mut words = Vec::new();
    loop {
        let w = zmachine.force_read_word(address)?;
        words.push(w);
        address += 2;
        if w & 0x8000 == 0x8000 {
            break;
        }
    }

    Ok((address, Some(words)))
}

fn opcode(
    zmachine: &ZMachine,
    address: usize,
) -> Result<(usize, u8, OpcodeForm, Opcode), RuntimeError> {
    let version = zmachine.version();
    let opcode_byte = zmachine.force_read_byte(address)?;
    let (next, form, number) = match opcode_byte {
        0xBE if version >= 5 => (
            address + 2,
            OpcodeForm::Ext,
            zmachine.force_read_byte(address + 1)?,
        ),
        _ => match (opcode_byte >> 6) & 0x3 {
            3 => (address + 1, OpcodeForm::Var, opcode_byte & 0x1F),
            2 => (address + 1, OpcodeForm::Short, opcode_byte & 0xF),
            _ => (address + 1, OpcodeForm::Long, opcode_byte & 0x1F),
        },
    };

    let operand_count = match form {
        OpcodeForm::Short => {
            if opcode_byte & 0x30 == 0x30 {
                OperandCount::_0OP
            } else {
                OperandCount::_1OP
            }
        }
        OpcodeForm::Long => OperandCount::_2OP,
        OpcodeForm::Var => {
            if opcode_byte & 0x20 == 0x20 {
                OperandCount::_VAR
            } else {
                OperandCount::_2OP
            }
        }
        OpcodeForm::Ext => OperandCount::_EXT,
    };

    let opcode = Opcode::decode(version, operand_count, number)?;
    Ok((next, opcode_byte, form, opcode))
}

/// Decode the instruction at an address without changing any state.
///
/// # Arguments
/// * `zmachine` - Reference to the machine
/// * `address` - Address of the instruction
///
/// # Returns
/// [Result] with the decoded [Instruction] or a [RuntimeError]
pub fn decode_instruction(
    zmachine: &ZMachine,
    address: usize,
) -> Result<Instruction, RuntimeError> {
    let (offset, opcode_byte, form, opcode) = opcode(zmachine, address)?;
    let (offset, operand_types) = operand_types(zmachine, opcode_byte, form, offset)?;
    let (offset, operands) = operands(zmachine, &operand_types, offset)?;
    let (offset, store) = result_variable(zmachine, opcode, offset)?;
    let (offset, branch) = branch(zmachine, opcode, offset)?;
    let bytes = zmachine.slice(address, offset - address);
    let (offset, text) = text(zmachine, opcode, offset)?;

    Ok(Instruction::new(
        &bytes, address, opcode, form, operands, store, branch, text, offset,
    ))
}
