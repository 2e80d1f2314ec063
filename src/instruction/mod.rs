//! Decoded [instructions](https://inform-fiction.org/zmachine/standards/z1point1/sect04.html)
use std::fmt;

pub mod decoder;
pub mod opcode;
pub mod processor;

pub use opcode::{Opcode, OperandCount};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// [Opcode forms](https://inform-fiction.org/zmachine/standards/z1point1/sect04.html#three)
pub enum OpcodeForm {
    Short,
    Long,
    Var,
    Ext,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// [Operand types](https://inform-fiction.org/zmachine/standards/z1point1/sect04.html#two)
pub enum OperandType {
    LargeConstant,
    SmallConstant,
    Variable,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// [Operands](https://inform-fiction.org/zmachine/standards/z1point1/sect04.html#five)
pub struct Operand {
    /// The [OperandType]
    operand_type: OperandType,
    /// Operand value
    value: u16,
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.operand_type {
            OperandType::LargeConstant => write!(f, "#{:04x}", self.value),
            OperandType::SmallConstant => write!(f, "#{:02x}", self.value as u8),
            OperandType::Variable => {
                if self.value == 0 {
                    write!(f, "(SP)+")
                } else if self.value < 16 {
                    write!(f, "L{:02x}", self.value - 1)
                } else {
                    write!(f, "G{:02x}", self.value - 16)
                }
            }
        }
    }
}

impl Operand {
    /// Constructor
    ///
    /// # Arguments
    /// * `operand_type` - [OperandType]
    /// * `value` - Operand value
    pub fn new(operand_type: OperandType, value: u16) -> Operand {
        Operand {
            operand_type,
            value,
        }
    }

    pub fn operand_type(&self) -> OperandType {
        self.operand_type
    }

    pub fn value(&self) -> u16 {
        self.value
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// Branching information
pub struct Branch {
    /// Address of the (first) branch descriptor byte
    address: usize,
    /// Branch-on condition
    condition: bool,
    /// Address of the branch destination, 0 to return false or 1 to return true
    branch_address: usize,
}

impl fmt::Display for Branch {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "[{}] ", self.condition)?;
        match self.branch_address {
            0 => write!(f, "RFALSE"),
            1 => write!(f, "RTRUE"),
            _ => write!(f, "${:05x}", self.branch_address),
        }
    }
}

impl Branch {
    /// Constructor
    ///
    /// # Arguments
    /// * `address` - address of the (first) branch descriptor byte
    /// * `condition` - branch-on condition
    /// * `branch_address` - branch destination address
    pub fn new(address: usize, condition: bool, branch_address: usize) -> Branch {
        Branch {
            address,
            condition,
            branch_address,
        }
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub fn condition(&self) -> bool {
        self.condition
    }

    pub fn branch_address(&self) -> usize {
        self.branch_address
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// Where the result of an instruction will be stored
pub struct StoreResult {
    /// Address of the store result descriptor byte
    address: usize,
    /// Variable to store to
    variable: u8,
}

impl fmt::Display for StoreResult {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        if self.variable == 0 {
            write!(f, "-(SP)")
        } else if self.variable < 16 {
            write!(f, "L{:02x}", self.variable - 1)
        } else {
            write!(f, "G{:02x}", self.variable - 16)
        }
    }
}

impl StoreResult {
    /// Constructor
    ///
    /// # Arguments
    /// * `address` - Address of the store descriptor byte
    /// * `variable` - Variable to store to
    pub fn new(address: usize, variable: u8) -> StoreResult {
        StoreResult { address, variable }
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub fn variable(&self) -> u8 {
        self.variable
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// [Instruction](https://inform-fiction.org/zmachine/standards/z1point1/sect04.html#one)
pub struct Instruction {
    /// Encoded instruction bytes, excluding any inline text
    bytes: Vec<u8>,
    /// Address of the instruction in memory
    address: usize,
    /// Instruction [Opcode]
    opcode: Opcode,
    /// Operand form the opcode was encoded in
    form: OpcodeForm,
    /// Vector of [Operand] values
    operands: Vec<Operand>,
    /// [Option] containing the [StoreResult] if the instruction stores a result
    store: Option<StoreResult>,
    /// [Option] containing the [Branch] information if the instruction branches
    branch: Option<Branch>,
    /// Encoded inline text for PRINT and PRINT_RET
    text: Option<Vec<u16>>,
    /// Address of the instruction immediately following this one in memory
    next_address: usize,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "${:05x}: ", self.address)?;
        for b in &self.bytes {
            write!(f, "{:02x} ", b)?;
        }

        write!(f, " {}", self.opcode)?;

        for o in &self.operands {
            write!(f, " {}", o)?;
        }

        if let Some(s) = self.store {
            write!(f, " -> {}", s)?
        }

        if let Some(b) = &self.branch {
            write!(f, " {}", b)?
        }

        if let Some(t) = &self.text {
            write!(f, " [{} words]", t.len())?
        }

        Ok(())
    }
}

impl Instruction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        bytes: &[u8],
        address: usize,
        opcode: Opcode,
        form: OpcodeForm,
        operands: Vec<Operand>,
        store: Option<StoreResult>,
        branch: Option<Branch>,
        text: Option<Vec<u16>>,
        next_address: usize,
    ) -> Instruction {
        Instruction {
            bytes: bytes.to_vec(),
            address,
            opcode,
            form,
            operands,
            store,
            branch,
            text,
            next_address,
        }
    }

    pub fn address(&self) -> usize {
        self.address
    }

    pub fn opcode(&self) -> Opcode {
        self.opcode
    }

    pub fn form(&self) -> OpcodeForm {
        self.form
    }

    pub fn operands(&self) -> &[Operand] {
        &self.operands
    }

    pub fn store(&self) -> Option<&StoreResult> {
        self.store.as_ref()
    }

    pub fn branch(&self) -> Option<&Branch> {
        self.branch.as_ref()
    }

    pub fn text(&self) -> Option<&[u16]> {
        self.text.as_deref()
    }

    /// Address of the byte following this instruction
    pub fn next_address(&self) -> usize {
        self.next_address
    }

    /// Encoded length in bytes, including inline text
    pub fn len(&self) -> usize {
        self.next_address - self.address
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Address of the next instruction to execute
pub enum NextAddress {
    /// Simple address
    Address(usize),
    /// QUITting
    Quit,
}
