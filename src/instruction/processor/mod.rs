//! Instruction execution
use crate::error::*;
use crate::fatal_error;
use crate::zmachine::ZMachine;

use super::*;

mod processor_0op;
mod processor_1op;
mod processor_2op;
mod processor_ext;
mod processor_var;

fn operand_value(zmachine: &mut ZMachine, operand: &Operand) -> Result<u16, RuntimeError> {
    match operand.operand_type() {
        OperandType::SmallConstant | OperandType::LargeConstant => Ok(operand.value()),
        OperandType::Variable => zmachine.variable(operand.value() as u8),
    }
}

/// Resolve the operands of an instruction.
///
/// Variable operands are read (popping the stack for variable 0), except the first operand
/// of an opcode that takes a variable by reference, which is passed through as the variable number.
///
/// # Arguments
/// * `zmachine` - Mutable reference to the Z-Machine
/// * `instruction` - Instruction
///
/// # Returns
/// [Result] with the operand values or a [RuntimeError]
pub fn operand_values(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<Vec<u16>, RuntimeError> {
    let by_reference = instruction.opcode().by_reference();
    let mut v = Vec::new();
    let mut l = "Operand values:".to_string();
    for (i, o) in instruction.operands().iter().enumerate() {
        let value = if i == 0 && by_reference {
            o.value()
        } else {
            operand_value(zmachine, o)?
        };
        match o.operand_type() {
            OperandType::SmallConstant => l.push_str(&format!(" #{:02x}", value as u8)),
            _ => l.push_str(&format!(" #{:04x}", value)),
        }
        v.push(value)
    }
    if !v.is_empty() {
        debug!(target: "app::instruction", "{}", l);
    }
    Ok(v)
}

/// Take a branch if `condition` matches the branch-on condition of the instruction.
///
/// Branch addresses 0 and 1 return false and true from the current routine.
pub fn branch(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
    condition: bool,
) -> Result<NextAddress, RuntimeError> {
    match instruction.branch() {
        Some(b) => {
            if condition == b.condition() {
                match b.branch_address() {
                    0 => zmachine.return_routine(0),
                    1 => zmachine.return_routine(1),
                    _ => Ok(NextAddress::Address(b.branch_address())),
                }
            } else {
                Ok(NextAddress::Address(instruction.next_address()))
            }
        }
        None => Ok(NextAddress::Address(instruction.next_address())),
    }
}

/// Byte address `base + offset`, which must fall inside the 16-bit address space.
///
/// # Arguments
/// * `base` - Base address
/// * `offset` - Signed offset in bytes
///
/// # Returns
/// [Result] with the address or a [RuntimeError]
fn offset_address(base: usize, offset: isize) -> Result<usize, RuntimeError> {
    match base.checked_add_signed(offset) {
        Some(a) if a <= 0xFFFF => Ok(a),
        _ => fatal_error!(
            ErrorCode::AccessViolation,
            "Address ${:05x} {:+} is outside of the address space",
            base,
            offset
        ),
    }
}

/// Variable reference operand
fn variable_number(value: u16) -> Result<u8, RuntimeError> {
    match u8::try_from(value) {
        Ok(v) => Ok(v),
        Err(_) => fatal_error!(ErrorCode::VariableAccessViolation, "Invalid variable {:04x}", value),
    }
}

/// Attribute number operand.  The object layer checks it against the version's attribute count.
fn attribute_number(value: u16) -> Result<u8, RuntimeError> {
    match u8::try_from(value) {
        Ok(a) => Ok(a),
        Err(_) => fatal_error!(ErrorCode::InvalidObjectAttribute, "Invalid attribute {}", value),
    }
}

/// Property number operand.  The object layer checks it against the version's property count.
fn property_number(value: u16) -> Result<u8, RuntimeError> {
    match u8::try_from(value) {
        Ok(p) => Ok(p),
        Err(_) => fatal_error!(ErrorCode::InvalidObjectProperty, "Invalid property {}", value),
    }
}

fn store_result(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
    value: u16,
) -> Result<(), RuntimeError> {
    match instruction.store() {
        Some(s) => zmachine.set_variable(s.variable(), value),
        None => Ok(()),
    }
}

fn next(instruction: &Instruction) -> Result<NextAddress, RuntimeError> {
    Ok(NextAddress::Address(instruction.next_address()))
}

/// Call the routine at packed address `operands[0]` with the remaining operands as arguments.
fn call_fn(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
    operands: &[u16],
    result: Option<StoreResult>,
) -> Result<NextAddress, RuntimeError> {
    let address = zmachine.packed_routine_address(operands[0])?;
    zmachine.call_routine(
        address,
        &operands[1..],
        result,
        instruction.next_address(),
    )
}

/// Execute an instruction
///
/// # Arguments
/// * `zmachine` - Mutable reference to the Z-Machine
/// * `instruction` - Decoded instruction
///
/// # Returns
/// [Result] with the [NextAddress] to execute or a [RuntimeError]
pub fn dispatch(
    zmachine: &mut ZMachine,
    instruction: &Instruction,
) -> Result<NextAddress, RuntimeError> {
    debug!(target: "app::instruction", "dispatch: {}", instruction);
    match instruction.opcode() {
        // 0OP
        Opcode::Rtrue => processor_0op::rtrue(zmachine, instruction),
        Opcode::Rfalse => processor_0op::rfalse(zmachine, instruction),
        Opcode::Print => processor_0op::print(zmachine, instruction),
        Opcode::PrintRet => processor_0op::print_ret(zmachine, instruction),
        Opcode::Nop => processor_0op::nop(zmachine, instruction),
        Opcode::Save => processor_0op::save(zmachine, instruction),
        Opcode::Restore => processor_0op::restore(zmachine, instruction),
        Opcode::Restart => processor_0op::restart(zmachine, instruction),
        Opcode::RetPopped => processor_0op::ret_popped(zmachine, instruction),
        Opcode::Pop => processor_0op::pop(zmachine, instruction),
        Opcode::Catch => processor_0op::catch(zmachine, instruction),
        Opcode::Quit => processor_0op::quit(zmachine, instruction),
        Opcode::NewLine => processor_0op::new_line(zmachine, instruction),
        Opcode::ShowStatus => processor_0op::show_status(zmachine, instruction),
        Opcode::Verify => processor_0op::verify(zmachine, instruction),
        Opcode::Piracy => processor_0op::piracy(zmachine, instruction),
        // 1OP
        Opcode::Jz => processor_1op::jz(zmachine, instruction),
        Opcode::GetSibling => processor_1op::get_sibling(zmachine, instruction),
        Opcode::GetChild => processor_1op::get_child(zmachine, instruction),
        Opcode::GetParent => processor_1op::get_parent(zmachine, instruction),
        Opcode::GetPropLen => processor_1op::get_prop_len(zmachine, instruction),
        Opcode::Inc => processor_1op::inc(zmachine, instruction),
        Opcode::Dec => processor_1op::dec(zmachine, instruction),
        Opcode::PrintAddr => processor_1op::print_addr(zmachine, instruction),
        Opcode::Call1s => processor_1op::call_1s(zmachine, instruction),
        Opcode::RemoveObj => processor_1op::remove_obj(zmachine, instruction),
        Opcode::PrintObj => processor_1op::print_obj(zmachine, instruction),
        Opcode::Ret => processor_1op::ret(zmachine, instruction),
        Opcode::Jump => processor_1op::jump(zmachine, instruction),
        Opcode::PrintPaddr => processor_1op::print_paddr(zmachine, instruction),
        Opcode::Load => processor_1op::load(zmachine, instruction),
        Opcode::Not | Opcode::NotVar => processor_1op::not(zmachine, instruction),
        Opcode::Call1n => processor_1op::call_1n(zmachine, instruction),
        // 2OP
        Opcode::Je => processor_2op::je(zmachine, instruction),
        Opcode::Jl => processor_2op::jl(zmachine, instruction),
        Opcode::Jg => processor_2op::jg(zmachine, instruction),
        Opcode::DecChk => processor_2op::dec_chk(zmachine, instruction),
        Opcode::IncChk => processor_2op::inc_chk(zmachine, instruction),
        Opcode::Jin => processor_2op::jin(zmachine, instruction),
        Opcode::Test => processor_2op::test(zmachine, instruction),
        Opcode::Or => processor_2op::or(zmachine, instruction),
        Opcode::And => processor_2op::and(zmachine, instruction),
        Opcode::TestAttr => processor_2op::test_attr(zmachine, instruction),
        Opcode::SetAttr => processor_2op::set_attr(zmachine, instruction),
        Opcode::ClearAttr => processor_2op::clear_attr(zmachine, instruction),
        Opcode::Store => processor_2op::store(zmachine, instruction),
        Opcode::InsertObj => processor_2op::insert_obj(zmachine, instruction),
        Opcode::Loadw => processor_2op::loadw(zmachine, instruction),
        Opcode::Loadb => processor_2op::loadb(zmachine, instruction),
        Opcode::GetProp => processor_2op::get_prop(zmachine, instruction),
        Opcode::GetPropAddr => processor_2op::get_prop_addr(zmachine, instruction),
        Opcode::GetNextProp => processor_2op::get_next_prop(zmachine, instruction),
        Opcode::Add => processor_2op::add(zmachine, instruction),
        Opcode::Sub => processor_2op::sub(zmachine, instruction),
        Opcode::Mul => processor_2op::mul(zmachine, instruction),
        Opcode::Div => processor_2op::div(zmachine, instruction),
        Opcode::Mod => processor_2op::modulus(zmachine, instruction),
        Opcode::Call2s => processor_2op::call_2s(zmachine, instruction),
        Opcode::Call2n => processor_2op::call_2n(zmachine, instruction),
        Opcode::SetColour => processor_2op::set_colour(zmachine, instruction),
        Opcode::Throw => processor_2op::throw(zmachine, instruction),
        // VAR
        Opcode::Call | Opcode::CallVs | Opcode::CallVs2 => {
            processor_var::call_vs(zmachine, instruction)
        }
        Opcode::CallVn | Opcode::CallVn2 => processor_var::call_vn(zmachine, instruction),
        Opcode::Storew => processor_var::storew(zmachine, instruction),
        Opcode::Storeb => processor_var::storeb(zmachine, instruction),
        Opcode::PutProp => processor_var::put_prop(zmachine, instruction),
        Opcode::Sread | Opcode::Aread => processor_var::read(zmachine, instruction),
        Opcode::PrintChar => processor_var::print_char(zmachine, instruction),
        Opcode::PrintNum => processor_var::print_num(zmachine, instruction),
        Opcode::Random => processor_var::random(zmachine, instruction),
        Opcode::Push => processor_var::push(zmachine, instruction),
        Opcode::Pull => processor_var::pull(zmachine, instruction),
        Opcode::SplitWindow
        | Opcode::SetWindow
        | Opcode::EraseWindow
        | Opcode::EraseLine
        | Opcode::SetCursor
        | Opcode::SetTextStyle
        | Opcode::BufferMode
        | Opcode::InputStream
        | Opcode::SoundEffect => processor_var::screen(zmachine, instruction),
        Opcode::GetCursor => processor_var::get_cursor(zmachine, instruction),
        Opcode::OutputStream => processor_var::output_stream(zmachine, instruction),
        Opcode::ReadChar => processor_var::read_char(zmachine, instruction),
        Opcode::ScanTable => processor_var::scan_table(zmachine, instruction),
        Opcode::Tokenise => processor_var::tokenise(zmachine, instruction),
        Opcode::EncodeText => processor_var::encode_text(zmachine, instruction),
        Opcode::CopyTable => processor_var::copy_table(zmachine, instruction),
        Opcode::PrintTable => processor_var::print_table(zmachine, instruction),
        Opcode::CheckArgCount => processor_var::check_arg_count(zmachine, instruction),
        // EXT
        Opcode::SaveExt => processor_ext::save(zmachine, instruction),
        Opcode::RestoreExt => processor_ext::restore(zmachine, instruction),
        Opcode::LogShift => processor_ext::log_shift(zmachine, instruction),
        Opcode::ArtShift => processor_ext::art_shift(zmachine, instruction),
        Opcode::SetFont => processor_ext::set_font(zmachine, instruction),
        Opcode::SaveUndo => processor_ext::save_undo(zmachine, instruction),
        Opcode::RestoreUndo => processor_ext::restore_undo(zmachine, instruction),
        Opcode::PrintUnicode => processor_ext::print_unicode(zmachine, instruction),
        Opcode::CheckUnicode => processor_ext::check_unicode(zmachine, instruction),
        Opcode::SetTrueColour => processor_ext::set_true_colour(zmachine, instruction),
    }
}

#[cfg(test)]
mod tests {
    use crate::{assert_ok, assert_ok_eq, test_util::*};

    use super::*;

    #[test]
    fn test_operand_values() {
        let mut zmachine = mock_zmachine(test_map(3));
        assert_ok!(zmachine.set_variable(0x10, 0x1234));
        assert_ok!(zmachine.push(0x5678));
        let i = mock_instruction(
            0x400,
            vec![
                operand(OperandType::SmallConstant, 0x12),
                operand(OperandType::LargeConstant, 0x3456),
                operand(OperandType::Variable, 0x10),
                operand(OperandType::Variable, 0x00),
            ],
            Opcode::Je,
            0x407,
        );
        assert_ok_eq!(
            operand_values(&mut zmachine, &i),
            vec![0x12, 0x3456, 0x1234, 0x5678]
        );
        assert_eq!(zmachine.current_frame().unwrap().stack().len(), 0);
    }

    #[test]
    fn test_operand_values_by_reference() {
        let mut zmachine = mock_zmachine(test_map(3));
        assert_ok!(zmachine.push(0x5678));
        let i = mock_instruction(
            0x400,
            vec![
                operand(OperandType::Variable, 0x00),
                operand(OperandType::SmallConstant, 0x12),
            ],
            Opcode::Store,
            0x403,
        );
        assert_ok_eq!(operand_values(&mut zmachine, &i), vec![0x00, 0x12]);
        assert_eq!(zmachine.current_frame().unwrap().stack(), &[0x5678]);
    }

    #[test]
    fn test_branch() {
        let mut zmachine = mock_zmachine(test_map(3));
        let i = mock_branch_instruction(
            0x400,
            vec![],
            Opcode::Verify,
            0x402,
            crate::test_util::branch(0x401, true, 0x420),
        );
        assert_ok_eq!(super::branch(&mut zmachine, &i, true), NextAddress::Address(0x420));
        assert_ok_eq!(super::branch(&mut zmachine, &i, false), NextAddress::Address(0x402));

        let i = mock_branch_instruction(
            0x400,
            vec![],
            Opcode::Verify,
            0x402,
            crate::test_util::branch(0x401, false, 0x420),
        );
        assert_ok_eq!(super::branch(&mut zmachine, &i, false), NextAddress::Address(0x420));
        assert_ok_eq!(super::branch(&mut zmachine, &i, true), NextAddress::Address(0x402));
    }

    #[test]
    fn test_branch_return() {
        let mut map = test_map(3);
        mock_routine(&mut map, 0x500, &[]);
        let mut zmachine = mock_zmachine(map);
        assert!(zmachine
            .call_routine(0x500, &[], Some(store(0x403, 0x80)), 0x404)
            .is_ok());
        let i = mock_branch_instruction(
            0x501,
            vec![],
            Opcode::Verify,
            0x503,
            crate::test_util::branch(0x502, true, 1),
        );
        assert_ok_eq!(super::branch(&mut zmachine, &i, true), NextAddress::Address(0x404));
        assert_ok_eq!(zmachine.variable(0x80), 1);
    }
}
