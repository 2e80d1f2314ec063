use crate::{
    instruction::{Branch, Instruction, Opcode, OpcodeForm, Operand, OperandType, StoreResult},
    zmachine::{header::Header, memory::Memory, rng::chacha_rng::ChaChaRng, ZMachine},
};

#[macro_export]
macro_rules! assert_ok {
    ($e:expr) => {
        match $e {
            Ok(v) => v,
            Err(e) => panic!("Expected Ok, got Err({:?})", e),
        }
    };
}

#[macro_export]
macro_rules! assert_ok_eq {
    ($e:expr, $v:expr) => {
        assert_eq!($crate::assert_ok!($e), $v)
    };
}

#[macro_export]
macro_rules! assert_some {
    ($e:expr) => {
        match $e {
            Some(v) => v,
            None => panic!("Expected Some, got None"),
        }
    };
}

#[macro_export]
macro_rules! assert_some_eq {
    ($e:expr, $v:expr) => {
        assert_eq!($crate::assert_some!($e), $v)
    };
}

/// A 2K memory map:
///
/// * $0040 abbreviations
/// * $0100 global variables
/// * $0200 object table
/// * $0300 dictionary
/// * $0400 static memory and initial PC
/// * $0600 high memory
pub fn test_map(version: u8) -> Vec<u8> {
    let mut v = vec![0; 0x800];
    v[0] = version;
    v[0x04] = 0x06;
    v[0x06] = 0x04;
    v[0x08] = 0x03;
    v[0x0A] = 0x02;
    v[0x0C] = 0x01;
    v[0x0E] = 0x04;
    v[0x18] = 0x00;
    v[0x19] = 0x40;
    // File length
    if version < 4 {
        v[0x1A] = 0x04;
    } else {
        v[0x1A] = 0x02;
    }

    v
}

pub fn set_variable(map: &mut [u8], variable: u8, value: u16) {
    let address = 0x100 + ((variable as usize - 16) * 2);
    map[address] = (value >> 8) as u8;
    map[address + 1] = value as u8;
}

pub fn mock_memory(map: Vec<u8>) -> Memory {
    let header = crate::assert_ok!(Header::try_from(map.as_slice()));
    Memory::new(map, &header)
}

pub fn mock_zmachine(map: Vec<u8>) -> ZMachine {
    crate::assert_ok!(ZMachine::new(map, Box::new(ChaChaRng::seeded(0))))
}

pub fn mock_frame(
    zmachine: &mut ZMachine,
    address: usize,
    result: Option<u8>,
    return_address: usize,
) {
    let r = result.map(|x| StoreResult::new(0, x));
    crate::assert_ok!(zmachine.call_routine(address, &[], r, return_address));
}

pub fn mock_routine(map: &mut [u8], address: usize, local_variables: &[u16]) {
    map[address] = local_variables.len() as u8;
    if map[0] < 5 {
        for (i, w) in local_variables.iter().enumerate() {
            map[address + 1 + (i * 2)] = (*w >> 8) as u8;
            map[address + 2 + (i * 2)] = *w as u8;
        }
    }
}

/// Dictionary at $0300 with 5 sorted 9 byte entries:
///
/// * $0307 ","
/// * $0310 hello
/// * $0319 inventory
/// * $0322 look
/// * $032B sailor
///
/// The text buffer is at $0380 (10 characters) and the parse buffer at $03A0 (2 words).
pub fn mock_dictionary(map: &mut [u8]) {
    let entries: [&[u16]; 5] = if map[0] < 4 {
        [
            &[0x1665, 0x94A5],
            &[0x3551, 0xC685],
            &[0x3A7B, 0xAA79],
            &[0x4694, 0xC0A5],
            &[0x60CE, 0xC697],
        ]
    } else {
        [
            &[0x1665, 0x14A5, 0x94A5],
            &[0x3551, 0x4685, 0x94A5],
            &[0x3A7B, 0x2A79, 0xD2FE],
            &[0x4694, 0x40A5, 0x94A5],
            &[0x60CE, 0x4697, 0x94A5],
        ]
    };

    map[0x300] = 3;
    map[0x301] = b'.';
    map[0x302] = b',';
    map[0x303] = b'"';
    map[0x304] = 9;
    map[0x305] = 0;
    map[0x306] = entries.len() as u8;

    for (i, entry) in entries.iter().enumerate() {
        let address = 0x307 + (i * 9);
        for (j, w) in entry.iter().enumerate() {
            map[address + (j * 2)] = (*w >> 8) as u8;
            map[address + (j * 2) + 1] = *w as u8;
        }
        // Entry data
        map[address + 8] = i as u8 + 1;
    }

    map[0x380] = if map[0] < 5 { 11 } else { 10 };
    map[0x3A0] = 2;
}

fn object_address(map: &[u8], object: usize) -> usize {
    let object_table = ((map[0x0A] as usize) << 8) + map[0x0B] as usize;
    if map[0] < 4 {
        object_table + 62 + ((object - 1) * 9)
    } else {
        object_table + 126 + ((object - 1) * 14)
    }
}

fn property_table_address(object: usize) -> usize {
    0x300 + ((object - 1) * 20)
}

/// Object with a property table at $0300 + 20 bytes per object and no properties
pub fn mock_object(
    map: &mut [u8],
    object: usize,
    short_name: Vec<u16>,
    (parent, sibling, child): (u16, u16, u16),
) {
    let address = object_address(map, object);
    let property_table = property_table_address(object);

    if map[0] < 4 {
        map[address + 4] = parent as u8;
        map[address + 5] = sibling as u8;
        map[address + 6] = child as u8;
        map[address + 7] = (property_table >> 8) as u8;
        map[address + 8] = property_table as u8;
    } else {
        map[address + 6] = (parent >> 8) as u8;
        map[address + 7] = parent as u8;
        map[address + 8] = (sibling >> 8) as u8;
        map[address + 9] = sibling as u8;
        map[address + 10] = (child >> 8) as u8;
        map[address + 11] = child as u8;
        map[address + 12] = (property_table >> 8) as u8;
        map[address + 13] = property_table as u8;
    }

    map[property_table] = short_name.len() as u8;
    for (i, w) in short_name.iter().enumerate() {
        let a = property_table + 1 + (i * 2);
        map[a] = (*w >> 8) as u8;
        map[a + 1] = *w as u8;
    }
    map[property_table + 1 + (short_name.len() * 2)] = 0;
}

pub fn mock_attributes(map: &mut [u8], object: usize, attributes: &[u8]) {
    let address = object_address(map, object);
    for (i, b) in attributes.iter().enumerate() {
        map[address + i] = *b;
    }
}

pub fn mock_default_properties(map: &mut [u8]) {
    let words = if map[0] < 4 { 31 } else { 63 };
    let object_table = ((map[0x0A] as usize) << 8) + map[0x0B] as usize;
    for i in 0..words {
        let address = object_table + (i * 2);
        map[address] = (i as u8) % 0x10;
        map[address + 1] = i as u8;
    }
}

/// Properties, in descending order, following the object's short name
pub fn mock_properties(map: &mut [u8], object: usize, properties: &[(u8, &Vec<u8>)]) {
    let property_table = property_table_address(object);
    let name_length = map[property_table] as usize;

    let mut address = property_table + 1 + (name_length * 2);
    for (number, data) in properties {
        match (map[0], data.len()) {
            (1..=3, _) => {
                map[address] = ((data.len() - 1) * 32) as u8 + *number;
                for (i, b) in data.iter().enumerate() {
                    map[address + 1 + i] = *b;
                }
                address += 1 + data.len();
            }
            (_, 1) => {
                map[address] = *number;
                map[address + 1] = data[0];
                address += 2;
            }
            (_, 2) => {
                map[address] = 0x40 | *number;
                map[address + 1] = data[0];
                map[address + 2] = data[1];
                address += 3;
            }
            (_, _) => {
                map[address] = 0x80 | *number;
                map[address + 1] = 0x80 | (data.len() as u8 & 0x3F);
                for (i, b) in data.iter().enumerate() {
                    map[address + 2 + i] = *b;
                }
                address += 2 + data.len();
            }
        }
    }
    map[address] = 0;
}

pub fn operand(operand_type: OperandType, value: u16) -> Operand {
    Operand::new(operand_type, value)
}

pub fn branch(byte_address: usize, condition: bool, branch_address: usize) -> Branch {
    Branch::new(byte_address, condition, branch_address)
}

pub fn store(byte_address: usize, variable: u8) -> StoreResult {
    StoreResult::new(byte_address, variable)
}

pub fn mock_instruction(
    address: usize,
    operands: Vec<Operand>,
    opcode: Opcode,
    next_address: usize,
) -> Instruction {
    Instruction::new(
        &[],
        address,
        opcode,
        OpcodeForm::Var,
        operands,
        None,
        None,
        None,
        next_address,
    )
}

pub fn mock_branch_instruction(
    address: usize,
    operands: Vec<Operand>,
    opcode: Opcode,
    next_address: usize,
    branch: Branch,
) -> Instruction {
    Instruction::new(
        &[],
        address,
        opcode,
        OpcodeForm::Var,
        operands,
        None,
        Some(branch),
        None,
        next_address,
    )
}

pub fn mock_store_instruction(
    address: usize,
    operands: Vec<Operand>,
    opcode: Opcode,
    next_address: usize,
    result: StoreResult,
) -> Instruction {
    Instruction::new(
        &[],
        address,
        opcode,
        OpcodeForm::Var,
        operands,
        Some(result),
        None,
        None,
        next_address,
    )
}

pub fn mock_branch_store_instruction(
    address: usize,
    operands: Vec<Operand>,
    opcode: Opcode,
    next_address: usize,
    branch: Branch,
    result: StoreResult,
) -> Instruction {
    Instruction::new(
        &[],
        address,
        opcode,
        OpcodeForm::Var,
        operands,
        Some(result),
        Some(branch),
        None,
        next_address,
    )
}

pub fn mock_text_instruction(
    address: usize,
    opcode: Opcode,
    text: Vec<u16>,
    next_address: usize,
) -> Instruction {
    Instruction::new(
        &[],
        address,
        opcode,
        OpcodeForm::Short,
        vec![],
        None,
        None,
        Some(text),
        next_address,
    )
}
