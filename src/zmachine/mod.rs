//! Z-Machine state: memory, call frames, variables and output streams
use crate::{
    error::*,
    fatal_error,
    instruction::{NextAddress, StoreResult},
    text::{self, alphabet::Alphabet},
};

use self::{
    frame::Frame,
    header::{Header, HeaderField},
    memory::Memory,
    rng::ZRng,
};

pub mod frame;
pub mod header;
pub mod memory;
pub mod rng;
mod save_restore;

/// Output stream 3 redirection to a table in memory
#[derive(Debug)]
struct Stream3 {
    address: usize,
    buffer: Vec<u16>,
}

impl Stream3 {
    fn new(address: usize) -> Stream3 {
        Stream3 {
            address,
            buffer: Vec::new(),
        }
    }
}

#[derive(Debug)]
pub struct ZMachine {
    header: Header,
    memory: Memory,
    rng: Box<dyn ZRng>,
    frames: Vec<Frame>,
    pc: usize,
    alphabet: Alphabet,
    output_streams: u8,
    stream_3: Vec<Stream3>,
    output: String,
    input: Option<String>,
}

impl ZMachine {
    /// Load a story.
    ///
    /// The header is validated before anything else is built from the story.
    ///
    /// # Arguments
    /// * `story` - Story file bytes
    /// * `rng` - Random number generator
    ///
    /// # Returns
    /// [Result] with the [ZMachine] or a [RuntimeError]
    pub fn new(story: Vec<u8>, rng: Box<dyn ZRng>) -> Result<ZMachine, RuntimeError> {
        let header = Header::try_from(story.as_slice())?;
        let memory = Memory::new(story, &header);
        let alphabet = Alphabet::new(header.version(), header.alphabet_table(), &memory)?;
        let pc = header.initial_pc();
        info!(target: "app::state", "Loaded {:?}", header);

        Ok(ZMachine {
            header,
            memory,
            rng,
            frames: vec![Frame::main()],
            pc,
            alphabet,
            output_streams: 0x1,
            stream_3: Vec::new(),
            output: String::new(),
            input: None,
        })
    }

    /// Advertise the interpreter's (lack of) capabilities in the header
    pub fn initialize(&mut self) -> Result<(), RuntimeError> {
        header::advertise_minimal_interpreter(&mut self.memory, self.header.version())
    }

    pub fn version(&self) -> u8 {
        self.header.version()
    }

    pub fn header(&self) -> &Header {
        &self.header
    }

    pub fn alphabet(&self) -> &Alphabet {
        &self.alphabet
    }

    pub fn pc(&self) -> usize {
        self.pc
    }

    pub fn set_pc(&mut self, pc: usize) {
        self.pc = pc
    }

    // Managed memory access (read/write dynamic, read static, no access to high)
    pub fn read_byte(&self, address: usize) -> Result<u8, RuntimeError> {
        self.memory.read_byte(address)
    }

    pub fn read_word(&self, address: usize) -> Result<u16, RuntimeError> {
        self.memory.read_word(address)
    }

    pub fn write_byte(&mut self, address: usize, value: u8) -> Result<(), RuntimeError> {
        self.memory.write_byte(address, value)
    }

    pub fn write_word(&mut self, address: usize, value: u16) -> Result<(), RuntimeError> {
        self.memory.write_word(address, value)
    }

    // Unmanaged memory access: instructions, text, object and dictionary tables
    pub fn force_read_byte(&self, address: usize) -> Result<u8, RuntimeError> {
        self.memory.force_read_byte(address)
    }

    pub fn force_read_word(&self, address: usize) -> Result<u16, RuntimeError> {
        self.memory.force_read_word(address)
    }

    pub fn slice(&self, start: usize, length: usize) -> Vec<u8> {
        self.memory.slice(start, length)
    }

    pub fn dynamic_memory(&self) -> &[u8] {
        self.memory.dynamic()
    }

    pub fn checksum(&self) -> u16 {
        self.memory.checksum(self.header.file_length())
    }

    /// Restart the story.
    ///
    /// Dynamic memory is reset, the call stack emptied and the header re-advertised.  The
    /// transcripting and fixed-pitch bits of Flags2 survive.
    ///
    /// # Returns
    /// [Result] with the address to continue execution at or a [RuntimeError]
    pub fn restart(&mut self) -> Result<usize, RuntimeError> {
        let flags2 = self.memory.read_word(HeaderField::Flags2 as usize)? & 0x3;
        self.rng.seed(0);
        self.memory.reset();
        self.frames = vec![Frame::main()];
        self.stream_3.clear();
        self.output_streams = 0x1;
        self.initialize()?;

        let f2 = self.memory.read_word(HeaderField::Flags2 as usize)?;
        self.memory
            .write_word(HeaderField::Flags2 as usize, (f2 & !0x3) | flags2)?;
        self.pc = self.header.initial_pc();
        debug!(target: "app::state", "Restart at ${:05x}", self.pc);
        Ok(self.pc)
    }

    /// Read encoded text from `address` until a word with bit 15 set
    pub fn string_literal(&self, address: usize) -> Result<Vec<u16>, RuntimeError> {
        let mut d = Vec::new();
        loop {
            let w = self.memory.force_read_word(address + (d.len() * 2))?;
            d.push(w);
            if w & 0x8000 == 0x8000 {
                return Ok(d);
            }
        }
    }

    /// Read a routine header.
    ///
    /// # Returns
    /// [Result] with (first instruction address, initial local variables) or a [RuntimeError]
    fn routine_header(&self, address: usize) -> Result<(usize, Vec<u16>), RuntimeError> {
        let variable_count = self.memory.force_read_byte(address)? as usize;
        if variable_count > 15 {
            return fatal_error!(
                ErrorCode::InvalidRoutine,
                "Routines can have at most 15 local variables: {}",
                variable_count
            );
        }

        if self.version() < 5 {
            let mut l = Vec::new();
            for i in 0..variable_count {
                l.push(self.memory.force_read_word(address + 1 + (i * 2))?);
            }
            Ok((address + 1 + (variable_count * 2), l))
        } else {
            Ok((address + 1, vec![0; variable_count]))
        }
    }

    // Packed addresses
    pub fn packed_routine_address(&self, address: u16) -> Result<usize, RuntimeError> {
        match self.version() {
            1..=3 => Ok(address as usize * 2),
            4 | 5 => Ok(address as usize * 4),
            _ => fatal_error!(
                ErrorCode::UnsupportedVersion,
                "Unsupported version: {}",
                self.version()
            ),
        }
    }

    pub fn packed_string_address(&self, address: u16) -> Result<usize, RuntimeError> {
        self.packed_routine_address(address)
    }

    // Frame stack
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn current_frame(&self) -> Result<&Frame, RuntimeError> {
        if let Some(frame) = self.frames.last() {
            Ok(frame)
        } else {
            fatal_error!(ErrorCode::NoFrame, "No runtime frame")
        }
    }

    fn current_frame_mut(&mut self) -> Result<&mut Frame, RuntimeError> {
        if let Some(frame) = self.frames.last_mut() {
            Ok(frame)
        } else {
            fatal_error!(ErrorCode::NoFrame, "No runtime frame")
        }
    }

    // Routines

    /// Call a routine.
    ///
    /// A call to address 0 stores 0 (false) without entering a routine.
    ///
    /// # Arguments
    /// * `address` - Unpacked routine address
    /// * `arguments` - Arguments
    /// * `result` - [Option] with the variable to store the return value in
    /// * `return_address` - Address to resume at when the routine returns
    ///
    /// # Returns
    /// [Result] with the [NextAddress] to execute or a [RuntimeError]
    pub fn call_routine(
        &mut self,
        address: usize,
        arguments: &[u16],
        result: Option<StoreResult>,
        return_address: usize,
    ) -> Result<NextAddress, RuntimeError> {
        if address == 0 {
            if let Some(r) = result {
                self.set_variable(r.variable(), 0)?;
            }
            return Ok(NextAddress::Address(return_address));
        }

        let (initial_pc, local_variables) = self.routine_header(address)?;
        debug!(target: "app::state", "Call ${:05x} with {:04x?} => {:?}, return to ${:05x}", address, arguments, result, return_address);
        let frame = Frame::call_routine(arguments, local_variables, result, return_address);
        self.frames.push(frame);
        Ok(NextAddress::Address(initial_pc))
    }

    /// Return from the current routine, storing `value` in the caller's result variable.
    pub fn return_routine(&mut self, value: u16) -> Result<NextAddress, RuntimeError> {
        if self.frames.len() < 2 {
            return fatal_error!(
                ErrorCode::ReturnNoCaller,
                "Return from routine with nowhere to return to"
            );
        }

        match self.frames.pop() {
            Some(f) => {
                debug!(target: "app::state", "Return {:04x} => {:?} to ${:05x}", value, f.result(), f.return_address());
                if let Some(r) = f.result() {
                    self.set_variable(r.variable(), value)?;
                }
                Ok(NextAddress::Address(f.return_address()))
            }
            None => fatal_error!(ErrorCode::NoFrame, "No runtime frame"),
        }
    }

    pub fn argument_count(&self) -> Result<u8, RuntimeError> {
        Ok(self.current_frame()?.argument_count())
    }

    /// Unwind to the frame identified by a `catch` and return from it.
    pub fn throw(&mut self, depth: u16, result: u16) -> Result<NextAddress, RuntimeError> {
        let depth = depth as usize;
        if depth < 2 || depth > self.frames.len() {
            return fatal_error!(
                ErrorCode::InvalidState,
                "Throw to frame {} with {} frames",
                depth,
                self.frames.len()
            );
        }
        self.frames.truncate(depth);
        self.return_routine(result)
    }

    // Variables
    fn global_variable_address(&self, variable: u8) -> usize {
        self.header.global_table() + ((variable as usize - 16) * 2)
    }

    pub fn variable(&mut self, variable: u8) -> Result<u16, RuntimeError> {
        let value = if variable < 16 {
            self.current_frame_mut()?.local_variable(variable)?
        } else {
            let address = self.global_variable_address(variable);
            self.memory.read_word(address)?
        };
        debug!(target: "app::state", "Read variable {:02x} => {:04x}", variable, value);
        Ok(value)
    }

    pub fn peek_variable(&self, variable: u8) -> Result<u16, RuntimeError> {
        if variable < 16 {
            self.current_frame()?.peek_local_variable(variable)
        } else {
            let address = self.global_variable_address(variable);
            self.memory.read_word(address)
        }
    }

    pub fn set_variable(&mut self, variable: u8, value: u16) -> Result<(), RuntimeError> {
        debug!(target: "app::state", "Set variable {:02x} to {:04x}", variable, value);
        if variable < 16 {
            self.current_frame_mut()?
                .set_local_variable(variable, value)
        } else {
            let address = self.global_variable_address(variable);
            self.memory.write_word(address, value)
        }
    }

    /// Set a variable in place.  Variable 0 replaces the top of the stack rather than pushing.
    pub fn set_variable_indirect(&mut self, variable: u8, value: u16) -> Result<(), RuntimeError> {
        debug!(target: "app::state", "Set variable indirect {:02x} to {:04x}", variable, value);
        if variable < 16 {
            self.current_frame_mut()?
                .set_local_variable_indirect(variable, value)
        } else {
            let address = self.global_variable_address(variable);
            self.memory.write_word(address, value)
        }
    }

    pub fn push(&mut self, value: u16) -> Result<(), RuntimeError> {
        self.current_frame_mut()?.set_local_variable(0, value)
    }

    // RNG
    pub fn random(&mut self, range: u16) -> u16 {
        self.rng.random(range)
    }

    pub fn seed(&mut self, seed: u16) {
        self.rng.seed(seed)
    }

    // Streams
    fn is_stream_enabled(&self, stream: u8) -> bool {
        let mask = 1 << (stream - 1);
        self.output_streams & mask == mask
    }

    /// Select or deselect an output stream.
    ///
    /// Streams 2 (transcript) and 4 (command script) are accepted and ignored.
    ///
    /// # Arguments
    /// * `stream` - Stream number, negative to deselect
    /// * `table` - Table address for stream 3
    ///
    /// # Returns
    /// Empty [Result] or a [RuntimeError]
    pub fn output_stream(&mut self, stream: i16, table: Option<usize>) -> Result<(), RuntimeError> {
        debug!(target: "app::stream", "Output stream {} {:?}", stream, table);
        match stream {
            1 => {
                self.output_streams |= 0x1;
                Ok(())
            }
            -1 => {
                self.output_streams &= !0x1;
                Ok(())
            }
            2 | -2 | 4 | -4 => Ok(()),
            3 => match table {
                Some(address) => {
                    self.stream_3.push(Stream3::new(address));
                    self.output_streams |= 0x4;
                    Ok(())
                }
                None => fatal_error!(
                    ErrorCode::InvalidOutputStream,
                    "Stream 3 enabled without a table to write to"
                ),
            },
            -3 => {
                if let Some(s) = self.stream_3.pop() {
                    let len = s.buffer.len();
                    self.memory.write_word(s.address, len as u16)?;
                    for (i, c) in s.buffer.iter().enumerate() {
                        self.memory.write_byte(s.address + 2 + i, *c as u8)?;
                    }
                    if self.stream_3.is_empty() {
                        self.output_streams &= !0x4;
                    }
                }
                Ok(())
            }
            _ => fatal_error!(
                ErrorCode::InvalidOutputStream,
                "Output stream {} is not valid: [-4..4]",
                stream
            ),
        }
    }

    /// Stream selection does not survive a turn boundary.  A read may only suspend
    /// the turn with stream 1 selected and no stream 3 table open.
    pub fn check_suspend_streams(&self) -> Result<(), RuntimeError> {
        if let Some(s) = self.stream_3.last() {
            fatal_error!(
                ErrorCode::InvalidState,
                "Read with output stream 3 open to ${:04x}",
                s.address
            )
        } else if !self.is_stream_enabled(1) {
            fatal_error!(ErrorCode::InvalidState, "Read with output stream 1 deselected")
        } else {
            Ok(())
        }
    }

    /// Print ZSCII text to the selected output stream
    pub fn print(&mut self, text: &[u16]) -> Result<(), RuntimeError> {
        if self.is_stream_enabled(3) {
            if let Some(s) = self.stream_3.last_mut() {
                s.buffer.extend(text.iter().filter(|c| **c != 0));
                Ok(())
            } else {
                fatal_error!(
                    ErrorCode::InvalidOutputStream,
                    "Stream 3 enabled, but no table to write to"
                )
            }
        } else {
            if self.is_stream_enabled(1) {
                self.output.push_str(&text::to_string(text));
            }
            Ok(())
        }
    }

    /// Print a string, typically a number
    pub fn print_str(&mut self, s: &str) -> Result<(), RuntimeError> {
        let zscii: Vec<u16> = s
            .chars()
            .filter_map(text::alphabet::char_to_zscii)
            .collect();
        self.print(&zscii)
    }

    pub fn new_line(&mut self) -> Result<(), RuntimeError> {
        self.print(&[13])
    }

    /// Take the text printed to stream 1 since the last call
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    // Input
    pub fn set_input(&mut self, input: &str) {
        self.input = Some(input.to_string())
    }

    pub fn take_input(&mut self) -> Option<String> {
        self.input.take()
    }
}
