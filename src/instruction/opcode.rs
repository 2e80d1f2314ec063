//! The closed set of [opcodes](https://inform-fiction.org/zmachine/standards/z1point1/sect14.html) for versions 1-5
use std::fmt;

use crate::{error::*, fatal_error};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
/// [Operand count](https://inform-fiction.org/zmachine/standards/z1point1/sect04.html#five)
pub enum OperandCount {
    _0OP,
    _1OP,
    _2OP,
    _VAR,
    _EXT,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum Opcode {
    // 0OP
    Rtrue,
    Rfalse,
    Print,
    PrintRet,
    Nop,
    Save,
    Restore,
    Restart,
    RetPopped,
    Pop,
    Catch,
    Quit,
    NewLine,
    ShowStatus,
    Verify,
    Piracy,
    // 1OP
    Jz,
    GetSibling,
    GetChild,
    GetParent,
    GetPropLen,
    Inc,
    Dec,
    PrintAddr,
    Call1s,
    RemoveObj,
    PrintObj,
    Ret,
    Jump,
    PrintPaddr,
    Load,
    Not,
    Call1n,
    // 2OP
    Je,
    Jl,
    Jg,
    DecChk,
    IncChk,
    Jin,
    Test,
    Or,
    And,
    TestAttr,
    SetAttr,
    ClearAttr,
    Store,
    InsertObj,
    Loadw,
    Loadb,
    GetProp,
    GetPropAddr,
    GetNextProp,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Call2s,
    Call2n,
    SetColour,
    Throw,
    // VAR
    Call,
    CallVs,
    Storew,
    Storeb,
    PutProp,
    Sread,
    Aread,
    PrintChar,
    PrintNum,
    Random,
    Push,
    Pull,
    SplitWindow,
    SetWindow,
    CallVs2,
    EraseWindow,
    EraseLine,
    SetCursor,
    GetCursor,
    SetTextStyle,
    BufferMode,
    OutputStream,
    InputStream,
    SoundEffect,
    ReadChar,
    ScanTable,
    NotVar,
    CallVn,
    CallVn2,
    Tokenise,
    EncodeText,
    CopyTable,
    PrintTable,
    CheckArgCount,
    // EXT
    SaveExt,
    RestoreExt,
    LogShift,
    ArtShift,
    SetFont,
    SaveUndo,
    RestoreUndo,
    PrintUnicode,
    CheckUnicode,
    SetTrueColour,
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

fn unimplemented(
    version: u8,
    operand_count: OperandCount,
    number: u8,
) -> Result<Opcode, RuntimeError> {
    fatal_error!(
        ErrorCode::UnimplementedOpcode,
        "Unimplemented {:?} opcode {:#04x} for version {}",
        operand_count,
        number,
        version
    )
}

impl Opcode {
    /// Identify an opcode from its operand count and opcode number.
    ///
    /// # Arguments
    /// * `version` - Story version
    /// * `operand_count` - [OperandCount] of the instruction form
    /// * `number` - Opcode number within the operand count
    ///
    /// # Returns
    /// [Result] with the [Opcode] or a [RuntimeError] if the opcode doesn't exist in `version`
    pub fn decode(
        version: u8,
        operand_count: OperandCount,
        number: u8,
    ) -> Result<Opcode, RuntimeError> {
        let opcode = match operand_count {
            OperandCount::_0OP => match (number, version) {
                (0x0, _) => Opcode::Rtrue,
                (0x1, _) => Opcode::Rfalse,
                (0x2, _) => Opcode::Print,
                (0x3, _) => Opcode::PrintRet,
                (0x4, _) => Opcode::Nop,
                (0x5, 1..=4) => Opcode::Save,
                (0x6, 1..=4) => Opcode::Restore,
                (0x7, _) => Opcode::Restart,
                (0x8, _) => Opcode::RetPopped,
                (0x9, 1..=4) => Opcode::Pop,
                (0x9, _) => Opcode::Catch,
                (0xA, _) => Opcode::Quit,
                (0xB, _) => Opcode::NewLine,
                (0xC, 3..) => Opcode::ShowStatus,
                (0xD, 3..) => Opcode::Verify,
                (0xF, 5..) => Opcode::Piracy,
                _ => return unimplemented(version, operand_count, number),
            },
            OperandCount::_1OP => match (number, version) {
                (0x0, _) => Opcode::Jz,
                (0x1, _) => Opcode::GetSibling,
                (0x2, _) => Opcode::GetChild,
                (0x3, _) => Opcode::GetParent,
                (0x4, _) => Opcode::GetPropLen,
                (0x5, _) => Opcode::Inc,
                (0x6, _) => Opcode::Dec,
                (0x7, _) => Opcode::PrintAddr,
                (0x8, 4..) => Opcode::Call1s,
                (0x9, _) => Opcode::RemoveObj,
                (0xA, _) => Opcode::PrintObj,
                (0xB, _) => Opcode::Ret,
                (0xC, _) => Opcode::Jump,
                (0xD, _) => Opcode::PrintPaddr,
                (0xE, _) => Opcode::Load,
                (0xF, 1..=4) => Opcode::Not,
                (0xF, _) => Opcode::Call1n,
                _ => return unimplemented(version, operand_count, number),
            },
            OperandCount::_2OP => match (number, version) {
                (0x01, _) => Opcode::Je,
                (0x02, _) => Opcode::Jl,
                (0x03, _) => Opcode::Jg,
                (0x04, _) => Opcode::DecChk,
                (0x05, _) => Opcode::IncChk,
                (0x06, _) => Opcode::Jin,
                (0x07, _) => Opcode::Test,
                (0x08, _) => Opcode::Or,
                (0x09, _) => Opcode::And,
                (0x0A, _) => Opcode::TestAttr,
                (0x0B, _) => Opcode::SetAttr,
                (0x0C, _) => Opcode::ClearAttr,
                (0x0D, _) => Opcode::Store,
                (0x0E, _) => Opcode::InsertObj,
                (0x0F, _) => Opcode::Loadw,
                (0x10, _) => Opcode::Loadb,
                (0x11, _) => Opcode::GetProp,
                (0x12, _) => Opcode::GetPropAddr,
                (0x13, _) => Opcode::GetNextProp,
                (0x14, _) => Opcode::Add,
                (0x15, _) => Opcode::Sub,
                (0x16, _) => Opcode::Mul,
                (0x17, _) => Opcode::Div,
                (0x18, _) => Opcode::Mod,
                (0x19, 4..) => Opcode::Call2s,
                (0x1A, 5..) => Opcode::Call2n,
                (0x1B, 5..) => Opcode::SetColour,
                (0x1C, 5..) => Opcode::Throw,
                _ => return unimplemented(version, operand_count, number),
            },
            OperandCount::_VAR => match (number, version) {
                (0x00, 1..=3) => Opcode::Call,
                (0x00, _) => Opcode::CallVs,
                (0x01, _) => Opcode::Storew,
                (0x02, _) => Opcode::Storeb,
                (0x03, _) => Opcode::PutProp,
                (0x04, 1..=4) => Opcode::Sread,
                (0x04, _) => Opcode::Aread,
                (0x05, _) => Opcode::PrintChar,
                (0x06, _) => Opcode::PrintNum,
                (0x07, _) => Opcode::Random,
                (0x08, _) => Opcode::Push,
                (0x09, _) => Opcode::Pull,
                (0x0A, 3..) => Opcode::SplitWindow,
                (0x0B, 3..) => Opcode::SetWindow,
                (0x0C, 4..) => Opcode::CallVs2,
                (0x0D, 4..) => Opcode::EraseWindow,
                (0x0E, 4..) => Opcode::EraseLine,
                (0x0F, 4..) => Opcode::SetCursor,
                (0x10, 4..) => Opcode::GetCursor,
                (0x11, 4..) => Opcode::SetTextStyle,
                (0x12, 4..) => Opcode::BufferMode,
                (0x13, 3..) => Opcode::OutputStream,
                (0x14, 3..) => Opcode::InputStream,
                (0x15, 3..) => Opcode::SoundEffect,
                (0x16, 4..) => Opcode::ReadChar,
                (0x17, 4..) => Opcode::ScanTable,
                (0x18, 5..) => Opcode::NotVar,
                (0x19, 5..) => Opcode::CallVn,
                (0x1A, 5..) => Opcode::CallVn2,
                (0x1B, 5..) => Opcode::Tokenise,
                (0x1C, 5..) => Opcode::EncodeText,
                (0x1D, 5..) => Opcode::CopyTable,
                (0x1E, 5..) => Opcode::PrintTable,
                (0x1F, 5..) => Opcode::CheckArgCount,
                _ => return unimplemented(version, operand_count, number),
            },
            OperandCount::_EXT => match (number, version) {
                (0x00, 5..) => Opcode::SaveExt,
                (0x01, 5..) => Opcode::RestoreExt,
                (0x02, 5..) => Opcode::LogShift,
                (0x03, 5..) => Opcode::ArtShift,
                (0x04, 5..) => Opcode::SetFont,
                (0x09, 5..) => Opcode::SaveUndo,
                (0x0A, 5..) => Opcode::RestoreUndo,
                (0x0B, 5..) => Opcode::PrintUnicode,
                (0x0C, 5..) => Opcode::CheckUnicode,
                (0x0D, 5..) => Opcode::SetTrueColour,
                _ => return unimplemented(version, operand_count, number),
            },
        };

        Ok(opcode)
    }

    /// Mnemonic
    pub fn name(&self) -> &'static str {
        match self {
            Opcode::Rtrue => "RTRUE",
            Opcode::Rfalse => "RFALSE",
            Opcode::Print => "PRINT",
            Opcode::PrintRet => "PRINT_RET",
            Opcode::Nop => "NOP",
            Opcode::Save | Opcode::SaveExt => "SAVE",
            Opcode::Restore | Opcode::RestoreExt => "RESTORE",
            Opcode::Restart => "RESTART",
            Opcode::RetPopped => "RET_POPPED",
            Opcode::Pop => "POP",
            Opcode::Catch => "CATCH",
            Opcode::Quit => "QUIT",
            Opcode::NewLine => "NEW_LINE",
            Opcode::ShowStatus => "SHOW_STATUS",
            Opcode::Verify => "VERIFY",
            Opcode::Piracy => "PIRACY",
            Opcode::Jz => "JZ",
            Opcode::GetSibling => "GET_SIBLING",
            Opcode::GetChild => "GET_CHILD",
            Opcode::GetParent => "GET_PARENT",
            Opcode::GetPropLen => "GET_PROP_LEN",
            Opcode::Inc => "INC",
            Opcode::Dec => "DEC",
            Opcode::PrintAddr => "PRINT_ADDR",
            Opcode::Call1s => "CALL_1S",
            Opcode::RemoveObj => "REMOVE_OBJ",
            Opcode::PrintObj => "PRINT_OBJ",
            Opcode::Ret => "RET",
            Opcode::Jump => "JUMP",
            Opcode::PrintPaddr => "PRINT_PADDR",
            Opcode::Load => "LOAD",
            Opcode::Not | Opcode::NotVar => "NOT",
            Opcode::Call1n => "CALL_1N",
            Opcode::Je => "JE",
            Opcode::Jl => "JL",
            Opcode::Jg => "JG",
            Opcode::DecChk => "DEC_CHK",
            Opcode::IncChk => "INC_CHK",
            Opcode::Jin => "JIN",
            Opcode::Test => "TEST",
            Opcode::Or => "OR",
            Opcode::And => "AND",
            Opcode::TestAttr => "TEST_ATTR",
            Opcode::SetAttr => "SET_ATTR",
            Opcode::ClearAttr => "CLEAR_ATTR",
            Opcode::Store => "STORE",
            Opcode::InsertObj => "INSERT_OBJ",
            Opcode::Loadw => "LOADW",
            Opcode::Loadb => "LOADB",
            Opcode::GetProp => "GET_PROP",
            Opcode::GetPropAddr => "GET_PROP_ADDR",
            Opcode::GetNextProp => "GET_NEXT_PROP",
            Opcode::Add => "ADD",
            Opcode::Sub => "SUB",
            Opcode::Mul => "MUL",
            Opcode::Div => "DIV",
            Opcode::Mod => "MOD",
            Opcode::Call2s => "CALL_2S",
            Opcode::Call2n => "CALL_2N",
            Opcode::SetColour => "SET_COLOUR",
            Opcode::Throw => "THROW",
            Opcode::Call => "CALL",
            Opcode::CallVs => "CALL_VS",
            Opcode::Storew => "STOREW",
            Opcode::Storeb => "STOREB",
            Opcode::PutProp => "PUT_PROP",
            Opcode::Sread => "SREAD",
            Opcode::Aread => "AREAD",
            Opcode::PrintChar => "PRINT_CHAR",
            Opcode::PrintNum => "PRINT_NUM",
            Opcode::Random => "RANDOM",
            Opcode::Push => "PUSH",
            Opcode::Pull => "PULL",
            Opcode::SplitWindow => "SPLIT_WINDOW",
            Opcode::SetWindow => "SET_WINDOW",
            Opcode::CallVs2 => "CALL_VS2",
            Opcode::EraseWindow => "ERASE_WINDOW",
            Opcode::EraseLine => "ERASE_LINE",
            Opcode::SetCursor => "SET_CURSOR",
            Opcode::GetCursor => "GET_CURSOR",
            Opcode::SetTextStyle => "SET_TEXT_STYLE",
            Opcode::BufferMode => "BUFFER_MODE",
            Opcode::OutputStream => "OUTPUT_STREAM",
            Opcode::InputStream => "INPUT_STREAM",
            Opcode::SoundEffect => "SOUND_EFFECT",
            Opcode::ReadChar => "READ_CHAR",
            Opcode::ScanTable => "SCAN_TABLE",
            Opcode::CallVn => "CALL_VN",
            Opcode::CallVn2 => "CALL_VN2",
            Opcode::Tokenise => "TOKENISE",
            Opcode::EncodeText => "ENCODE_TEXT",
            Opcode::CopyTable => "COPY_TABLE",
            Opcode::PrintTable => "PRINT_TABLE",
            Opcode::CheckArgCount => "CHECK_ARG_COUNT",
            Opcode::LogShift => "LOG_SHIFT",
            Opcode::ArtShift => "ART_SHIFT",
            Opcode::SetFont => "SET_FONT",
            Opcode::SaveUndo => "SAVE_UNDO",
            Opcode::RestoreUndo => "RESTORE_UNDO",
            Opcode::PrintUnicode => "PRINT_UNICODE",
            Opcode::CheckUnicode => "CHECK_UNICODE",
            Opcode::SetTrueColour => "SET_TRUE_COLOUR",
        }
    }

    /// Does the instruction carry a store variable byte?
    ///
    /// # Arguments
    /// * `version` - Story version
    pub fn stores(&self, version: u8) -> bool {
        match self {
            Opcode::Save | Opcode::Restore => version == 4,
            Opcode::Catch
            | Opcode::GetSibling
            | Opcode::GetChild
            | Opcode::GetParent
            | Opcode::GetPropLen
            | Opcode::Call1s
            | Opcode::Load
            | Opcode::Not
            | Opcode::Or
            | Opcode::And
            | Opcode::Loadw
            | Opcode::Loadb
            | Opcode::GetProp
            | Opcode::GetPropAddr
            | Opcode::GetNextProp
            | Opcode::Add
            | Opcode::Sub
            | Opcode::Mul
            | Opcode::Div
            | Opcode::Mod
            | Opcode::Call2s
            | Opcode::Call
            | Opcode::CallVs
            | Opcode::Aread
            | Opcode::Random
            | Opcode::CallVs2
            | Opcode::ReadChar
            | Opcode::ScanTable
            | Opcode::NotVar
            | Opcode::SaveExt
            | Opcode::RestoreExt
            | Opcode::LogShift
            | Opcode::ArtShift
            | Opcode::SetFont
            | Opcode::SaveUndo
            | Opcode::RestoreUndo
            | Opcode::CheckUnicode => true,
            _ => false,
        }
    }

    /// Does the instruction carry branch data?
    ///
    /// # Arguments
    /// * `version` - Story version
    pub fn branches(&self, version: u8) -> bool {
        match self {
            Opcode::Save | Opcode::Restore => version < 4,
            Opcode::Verify
            | Opcode::Piracy
            | Opcode::Jz
            | Opcode::GetSibling
            | Opcode::GetChild
            | Opcode::Je
            | Opcode::Jl
            | Opcode::Jg
            | Opcode::DecChk
            | Opcode::IncChk
            | Opcode::Jin
            | Opcode::Test
            | Opcode::TestAttr
            | Opcode::ScanTable
            | Opcode::CheckArgCount => true,
            _ => false,
        }
    }

    /// Is the first operand a variable reference rather than a value?
    pub fn by_reference(&self) -> bool {
        matches!(
            self,
            Opcode::Inc
                | Opcode::Dec
                | Opcode::IncChk
                | Opcode::DecChk
                | Opcode::Store
                | Opcode::Pull
                | Opcode::Load
        )
    }

    /// Does the instruction block waiting for player input?
    pub fn is_read(&self) -> bool {
        matches!(self, Opcode::Sread | Opcode::Aread | Opcode::ReadChar)
    }

    /// Is the instruction followed by inline text?
    pub fn has_text(&self) -> bool {
        matches!(self, Opcode::Print | Opcode::PrintRet)
    }
}
