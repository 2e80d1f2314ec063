use crate::{
    error::{ErrorCode, RuntimeError},
    fatal_error,
    instruction::{Instruction, NextAddress},
    object::{self, property},
    text,
    zmachine::ZMachine,
};

use super::{branch, call_fn, next, operand_values, store_result, variable_number};

pub fn jz(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    branch(zmachine, instruction, operands[0] == 0)
}

/// Read a tree link.  Object 0 has no links.
fn relative(
    zmachine: &ZMachine,
    object: usize,
    read: fn(&ZMachine, usize) -> Result<usize, RuntimeError>,
) -> Result<usize, RuntimeError> {
    if object == 0 {
        warn!(target: "app::object", "Tree read of object 0");
        Ok(0)
    } else {
        read(zmachine, object)
    }
}

pub fn get_sibling(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let sibling = relative(zmachine, operands[0] as usize, object::sibling)?;
    store_result(zmachine, instruction, sibling as u16)?;
    branch(zmachine, instruction, sibling != 0)
}

pub fn get_child(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let child = relative(zmachine, operands[0] as usize, object::child)?;
    store_result(zmachine, instruction, child as u16)?;
    branch(zmachine, instruction, child != 0)
}

pub fn get_parent(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let parent = relative(zmachine, operands[0] as usize, object::parent)?;
    store_result(zmachine, instruction, parent as u16)?;
    next(instruction)
}

pub fn get_prop_len(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let len = property::property_length(zmachine, operands[0] as usize)?;
    store_result(zmachine, instruction, len as u16)?;
    next(instruction)
}

pub fn inc(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let val = zmachine.peek_variable(variable_number(operands[0])?)?;
    zmachine.set_variable_indirect(variable_number(operands[0])?, (val as i16).wrapping_add(1) as u16)?;
    next(instruction)
}

pub fn dec(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let val = zmachine.peek_variable(variable_number(operands[0])?)?;
    zmachine.set_variable_indirect(variable_number(operands[0])?, (val as i16).wrapping_sub(1) as u16)?;
    next(instruction)
}

pub fn print_addr(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let text = text::as_text(zmachine, operands[0] as usize)?;
    zmachine.print(&text)?;
    next(instruction)
}

pub fn call_1s(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    call_fn(zmachine, instruction, &operands, instruction.store().copied())
}

pub fn remove_obj(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let object = operands[0] as usize;
    if object == 0 {
        warn!(target: "app::object", "REMOVE_OBJ of object 0");
    } else {
        object::remove(zmachine, object)?;
    }
    next(instruction)
}

pub fn print_obj(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let text = property::short_name(zmachine, operands[0] as usize)?;
    zmachine.print(&text)?;
    next(instruction)
}

pub fn ret(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    zmachine.return_routine(operands[0])
}

pub fn jump(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let offset = operands[0] as i16 as isize - 2;
    match instruction.next_address().checked_add_signed(offset) {
        Some(address) => Ok(NextAddress::Address(address)),
        None => fatal_error!(
            ErrorCode::AccessViolation,
            "JUMP {:+} from ${:05x} is before the start of memory",
            offset,
            instruction.next_address()
        ),
    }
}

pub fn print_paddr(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let address = zmachine.packed_string_address(operands[0])?;
    let text = text::as_text(zmachine, address)?;
    zmachine.print(&text)?;
    next(instruction)
}

pub fn load(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    let value = zmachine.peek_variable(variable_number(operands[0])?)?;
    store_result(zmachine, instruction, value)?;
    next(instruction)
}

pub fn not(zmachine: &mut ZMachine, instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    store_result(zmachine, instruction, !operands[0])?;
    next(instruction)
}

pub fn call_1n(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    let operands = operand_values(zmachine, instruction)?;
    call_fn(zmachine, instruction, &operands, None)
}

#[cfg(test)]
mod tests {
    use crate::{
        assert_ok, assert_ok_eq,
        error::ErrorCode,
        instruction::{processor::dispatch, NextAddress, Opcode, OperandType},
        object,
        test_util::*,
    };

    #[test]
    fn test_jz() {
        let mut zmachine = mock_zmachine(test_map(3));
        let i = mock_branch_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 0)],
            Opcode::Jz,
            0x403,
            branch(0x402, true, 0x40a),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x40a));

        let i = mock_branch_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 1)],
            Opcode::Jz,
            0x403,
            branch(0x402, true, 0x40a),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x403));
    }

    fn tree(version: u8) -> Vec<u8> {
        let mut map = test_map(version);
        mock_object(&mut map, 1, vec![], (0, 0, 2));
        mock_object(&mut map, 2, vec![], (1, 3, 0));
        mock_object(&mut map, 3, vec![], (1, 0, 0));
        map
    }

    #[test]
    fn test_get_sibling() {
        for version in [3, 5] {
            let mut zmachine = mock_zmachine(tree(version));
            let i = mock_branch_store_instruction(
                0x400,
                vec![operand(OperandType::SmallConstant, 2)],
                Opcode::GetSibling,
                0x404,
                branch(0x403, true, 0x40a),
                store(0x402, 0x80),
            );
            assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x40a));
            assert_ok_eq!(zmachine.variable(0x80), 3);

            let i = mock_branch_store_instruction(
                0x400,
                vec![operand(OperandType::SmallConstant, 3)],
                Opcode::GetSibling,
                0x404,
                branch(0x403, true, 0x40a),
                store(0x402, 0x80),
            );
            assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x404));
            assert_ok_eq!(zmachine.variable(0x80), 0);
        }
    }

    #[test]
    fn test_get_child() {
        let mut zmachine = mock_zmachine(tree(3));
        let i = mock_branch_store_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 1)],
            Opcode::GetChild,
            0x404,
            branch(0x403, false, 0x40a),
            store(0x402, 0x80),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x404));
        assert_ok_eq!(zmachine.variable(0x80), 2);
    }

    #[test]
    fn test_get_parent() {
        let mut zmachine = mock_zmachine(tree(4));
        let i = mock_store_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 3)],
            Opcode::GetParent,
            0x403,
            store(0x402, 0x80),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x403));
        assert_ok_eq!(zmachine.variable(0x80), 1);
    }

    #[test]
    fn test_get_parent_object_0() {
        let mut map = tree(3);
        set_variable(&mut map, 0x80, 0xFFFF);
        let mut zmachine = mock_zmachine(map);
        let i = mock_store_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 0)],
            Opcode::GetParent,
            0x403,
            store(0x402, 0x80),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x403));
        assert_ok_eq!(zmachine.variable(0x80), 0);
    }

    #[test]
    fn test_get_parent_invalid_object() {
        let mut zmachine = mock_zmachine(tree(3));
        let i = mock_store_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 200)],
            Opcode::GetParent,
            0x403,
            store(0x402, 0x80),
        );
        assert_eq!(
            dispatch(&mut zmachine, &i).unwrap_err().code(),
            ErrorCode::InvalidObject
        );
    }

    #[test]
    fn test_get_prop_len() {
        let mut map = test_map(3);
        mock_object(&mut map, 1, vec![], (0, 0, 0));
        mock_properties(&mut map, 1, &[(10, &vec![1, 2, 3])]);
        let mut zmachine = mock_zmachine(map);
        // Property table at 0x300: name length 0, size byte at 0x301
        let i = mock_store_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0x302)],
            Opcode::GetPropLen,
            0x404,
            store(0x403, 0x80),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x404));
        assert_ok_eq!(zmachine.variable(0x80), 3);

        let i = mock_store_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0)],
            Opcode::GetPropLen,
            0x404,
            store(0x403, 0x80),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x404));
        assert_ok_eq!(zmachine.variable(0x80), 0);
    }

    #[test]
    fn test_inc_dec() {
        let mut map = test_map(3);
        set_variable(&mut map, 0x80, 0x7FFF);
        set_variable(&mut map, 0x81, 0x0000);
        let mut zmachine = mock_zmachine(map);
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 0x80)],
            Opcode::Inc,
            0x402,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x402));
        assert_ok_eq!(zmachine.variable(0x80), 0x8000);

        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 0x81)],
            Opcode::Dec,
            0x402,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x402));
        assert_ok_eq!(zmachine.variable(0x81), 0xFFFF);
    }

    #[test]
    fn test_inc_stack_in_place() {
        let mut zmachine = mock_zmachine(test_map(3));
        assert_ok!(zmachine.push(1));
        assert_ok!(zmachine.push(5));
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 0)],
            Opcode::Inc,
            0x402,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x402));
        assert_eq!(assert_ok!(zmachine.current_frame()).stack(), &[1, 6]);
    }

    #[test]
    fn test_inc_variable_operand_is_a_reference() {
        let mut map = test_map(3);
        set_variable(&mut map, 0x80, 0x0010);
        let mut zmachine = mock_zmachine(map);
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::Variable, 0x80)],
            Opcode::Inc,
            0x402,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x402));
        assert_ok_eq!(zmachine.variable(0x80), 0x0011);
    }

    #[test]
    fn test_print_addr() {
        let mut map = test_map(3);
        // H e l l o
        map[0x600] = 0x11;
        map[0x601] = 0xAA;
        map[0x602] = 0xC6;
        map[0x603] = 0x34;
        let mut zmachine = mock_zmachine(map);
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0x600)],
            Opcode::PrintAddr,
            0x403,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x403));
        assert_eq!(zmachine.take_output(), "Hello");
    }

    #[test]
    fn test_print_paddr() {
        let mut map = test_map(5);
        map[0x600] = 0x11;
        map[0x601] = 0xAA;
        map[0x602] = 0xC6;
        map[0x603] = 0x34;
        let mut zmachine = mock_zmachine(map);
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0x180)],
            Opcode::PrintPaddr,
            0x403,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x403));
        assert_eq!(zmachine.take_output(), "Hello");
    }

    #[test]
    fn test_call_1s() {
        let mut map = test_map(4);
        mock_routine(&mut map, 0x600, &[0x1234, 0x5678]);
        let mut zmachine = mock_zmachine(map);
        let i = mock_store_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0x180)],
            Opcode::Call1s,
            0x404,
            store(0x403, 0x80),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x605));
        assert_eq!(zmachine.frame_count(), 2);
        assert_ok_eq!(zmachine.variable(1), 0x1234);
        assert_ok_eq!(zmachine.variable(2), 0x5678);
        assert_ok_eq!(zmachine.return_routine(9), NextAddress::Address(0x404));
        assert_ok_eq!(zmachine.variable(0x80), 9);
    }

    #[test]
    fn test_remove_obj() {
        let mut zmachine = mock_zmachine(tree(3));
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 2)],
            Opcode::RemoveObj,
            0x402,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x402));
        assert_ok_eq!(object::parent(&zmachine, 2), 0);
        assert_ok_eq!(object::sibling(&zmachine, 2), 0);
        assert_ok_eq!(object::child(&zmachine, 1), 3);
    }

    #[test]
    fn test_print_obj() {
        let mut map = test_map(3);
        // "hello"
        mock_object(&mut map, 1, vec![0x3551, 0xC685], (0, 0, 0));
        let mut zmachine = mock_zmachine(map);
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 1)],
            Opcode::PrintObj,
            0x402,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x402));
        assert_eq!(zmachine.take_output(), "hello");
    }

    #[test]
    fn test_ret() {
        let mut zmachine = mock_zmachine(test_map(3));
        mock_frame(&mut zmachine, 0x500, Some(0x80), 0x482);
        let i = mock_instruction(
            0x501,
            vec![operand(OperandType::LargeConstant, 0x1234)],
            Opcode::Ret,
            0x504,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x482));
        assert_ok_eq!(zmachine.variable(0x80), 0x1234);
    }

    #[test]
    fn test_jump() {
        let mut zmachine = mock_zmachine(test_map(3));
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0x0010)],
            Opcode::Jump,
            0x403,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x411));
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0xFFF0)],
            Opcode::Jump,
            0x403,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x3F1));
        let i = mock_instruction(
            0x04,
            vec![operand(OperandType::LargeConstant, 0x8000)],
            Opcode::Jump,
            0x07,
        );
        assert_eq!(
            dispatch(&mut zmachine, &i).unwrap_err().code(),
            ErrorCode::AccessViolation
        );
    }

    #[test]
    fn test_load() {
        let mut zmachine = mock_zmachine(test_map(3));
        assert_ok!(zmachine.push(0x1111));
        assert_ok!(zmachine.push(0x2222));
        let i = mock_store_instruction(
            0x400,
            vec![operand(OperandType::SmallConstant, 0)],
            Opcode::Load,
            0x403,
            store(0x402, 0x80),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x403));
        assert_ok_eq!(zmachine.variable(0x80), 0x2222);
        assert_eq!(assert_ok!(zmachine.current_frame()).stack(), &[0x1111, 0x2222]);
    }

    #[test]
    fn test_not() {
        let mut zmachine = mock_zmachine(test_map(3));
        let i = mock_store_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0x1234)],
            Opcode::Not,
            0x404,
            store(0x403, 0x80),
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x404));
        assert_ok_eq!(zmachine.variable(0x80), 0xEDCB);
    }

    #[test]
    fn test_call_1n() {
        let mut map = test_map(5);
        map[0x600] = 2;
        let mut zmachine = mock_zmachine(map);
        let i = mock_instruction(
            0x400,
            vec![operand(OperandType::LargeConstant, 0x180)],
            Opcode::Call1n,
            0x403,
        );
        assert_ok_eq!(dispatch(&mut zmachine, &i), NextAddress::Address(0x601));
        assert_ok_eq!(zmachine.variable(1), 0);
        assert_ok_eq!(zmachine.return_routine(9), NextAddress::Address(0x403));
        assert_ok_eq!(zmachine.variable(0x10), 0);
    }
}
