//! Turn-to-turn save state.
//!
//! The state is a series of decimal lines followed by a raw dump of dynamic memory:
//!
//! ```text
//! pc
//! suspended frame count (N)
//! N x { locals, arguments, result variable (-1 for none), word count, words... }
//! current locals
//! current arguments
//! current word count, words...
//! <dynamic memory>
//! ```
//!
//! The words of a suspended frame are the return address of the frame it called,
//! then its own local variables and stack.  The current frame's words are its
//! local variables and stack.
use std::io::{BufRead, Read};

use crate::{error::*, fatal_error, instruction::StoreResult};

use super::{frame::Frame, ZMachine};

/// A frame as read from a save state, before the frame stack is rebuilt
struct SavedFrame {
    locals: usize,
    argument_count: u8,
    words: Vec<u16>,
}

/// Link from a suspended frame to the frame it called
struct SavedCall {
    result: Option<u8>,
    return_address: usize,
}

fn push_line(data: &mut Vec<u8>, value: impl std::fmt::Display) {
    data.extend_from_slice(format!("{}\n", value).as_bytes());
}

fn read_number(reader: &mut impl BufRead, field: &str) -> Result<i64, RuntimeError> {
    let mut line = String::new();
    match reader.read_line(&mut line) {
        Ok(0) => fatal_error!(
            ErrorCode::MalformedSaveState,
            "Save state ended before {}",
            field
        ),
        Ok(_) => match line.trim_end_matches('\n').parse::<i64>() {
            Ok(n) => Ok(n),
            Err(e) => fatal_error!(
                ErrorCode::MalformedSaveState,
                "Invalid {} {:?}: {}",
                field,
                line,
                e
            ),
        },
        Err(e) => fatal_error!(
            ErrorCode::MalformedSaveState,
            "Error reading {}: {}",
            field,
            e
        ),
    }
}

fn read_bounded(
    reader: &mut impl BufRead,
    field: &str,
    min: i64,
    max: i64,
) -> Result<i64, RuntimeError> {
    let n = read_number(reader, field)?;
    if n < min || n > max {
        fatal_error!(
            ErrorCode::MalformedSaveState,
            "{} {} is outside {}..={}",
            field,
            n,
            min,
            max
        )
    } else {
        Ok(n)
    }
}

/// Read a frame's word count and words.  When `max_return` is set, the first
/// word is a return address that may be as large as the memory map.
fn read_words(
    reader: &mut impl BufRead,
    locals: usize,
    max_return: Option<i64>,
) -> Result<(usize, Vec<u16>), RuntimeError> {
    let reserved = if max_return.is_some() { 1 } else { 0 };
    let count = read_bounded(reader, "word count", 0, i64::from(u16::MAX))? as usize;
    if count < locals + reserved {
        return fatal_error!(
            ErrorCode::MalformedSaveState,
            "Frame with {} local variables has only {} words",
            locals,
            count
        );
    }

    let return_address = match max_return {
        Some(max) => read_bounded(reader, "return address", 0, max)? as usize,
        None => 0,
    };

    let mut words = Vec::with_capacity(count);
    for _ in reserved..count {
        words.push(read_bounded(reader, "word", 0, i64::from(u16::MAX))? as u16);
    }
    Ok((return_address, words))
}

/// Read the local variable and argument counts that begin each frame
fn read_frame(reader: &mut impl BufRead) -> Result<SavedFrame, RuntimeError> {
    let locals = read_bounded(reader, "local variable count", 0, 15)? as usize;
    let argument_count = read_bounded(reader, "argument count", 0, 255)? as u8;
    Ok(SavedFrame {
        locals,
        argument_count,
        words: Vec::new(),
    })
}

impl ZMachine {
    /// Encode the state for the next turn
    pub fn save(&self) -> Vec<u8> {
        let mut data = Vec::new();
        let suspended = self.frames.len().saturating_sub(1);
        push_line(&mut data, self.pc);
        push_line(&mut data, suspended);

        for (i, frame) in self.frames.iter().enumerate() {
            push_line(&mut data, frame.local_variables().len());
            push_line(&mut data, frame.argument_count());

            let mut words: Vec<usize> = Vec::new();
            if i < suspended {
                let called = &self.frames[i + 1];
                match called.result() {
                    Some(r) => push_line(&mut data, r.variable()),
                    None => push_line(&mut data, -1),
                }
                words.push(called.return_address());
            }
            words.extend(frame.local_variables().iter().map(|w| *w as usize));
            words.extend(frame.stack().iter().map(|w| *w as usize));

            push_line(&mut data, words.len());
            for w in words {
                push_line(&mut data, w);
            }
        }

        data.extend_from_slice(self.memory.dynamic());
        debug!(target: "app::state", "Saved state: pc ${:05x}, {} frames, {} bytes", self.pc, self.frames.len(), data.len());
        data
    }

    /// Restore the state saved at the end of the previous turn.
    ///
    /// The state is fully parsed and checked before the machine is changed.
    ///
    /// # Arguments
    /// * `data` - Save state from [ZMachine::save]
    ///
    /// # Returns
    /// Empty [Result] or a [RuntimeError] if the state is malformed
    pub fn restore(&mut self, data: &[u8]) -> Result<(), RuntimeError> {
        let mut reader = data;
        let max_address = self.memory.len() as i64 - 1;
        let pc = read_bounded(&mut reader, "pc", 0, max_address)? as usize;
        let suspended = read_bounded(&mut reader, "frame count", 0, i64::from(u16::MAX))? as usize;

        let mut saved = Vec::new();
        let mut calls = Vec::new();
        for _ in 0..suspended {
            let mut frame = read_frame(&mut reader)?;
            let result = match read_bounded(&mut reader, "result variable", -1, 255)? {
                -1 => None,
                v => Some(v as u8),
            };
            let (return_address, words) =
                read_words(&mut reader, frame.locals, Some(max_address))?;
            frame.words = words;
            saved.push(frame);
            calls.push(SavedCall {
                result,
                return_address,
            });
        }
        let mut current = read_frame(&mut reader)?;
        current.words = read_words(&mut reader, current.locals, None)?.1;
        saved.push(current);

        let mut dump = Vec::new();
        if let Err(e) = reader.read_to_end(&mut dump) {
            return fatal_error!(
                ErrorCode::MalformedSaveState,
                "Error reading dynamic memory: {}",
                e
            );
        }
        if dump.len() != self.memory.static_mark() {
            return fatal_error!(
                ErrorCode::MalformedSaveState,
                "Dynamic memory is {} bytes, expected {}",
                dump.len(),
                self.memory.static_mark()
            );
        }

        let mut frames = Vec::with_capacity(saved.len());
        for (i, frame) in saved.iter().enumerate() {
            let (locals, stack) = frame.words.split_at(frame.locals);
            let (result, return_address) = if i == 0 {
                (None, 0)
            } else {
                let call = &calls[i - 1];
                (
                    call.result.map(|v| StoreResult::new(0, v)),
                    call.return_address,
                )
            };
            frames.push(Frame::new(
                locals,
                frame.argument_count,
                stack,
                result,
                return_address,
            ));
        }

        self.memory.restore(&dump)?;
        self.frames = frames;
        self.pc = pc;
        debug!(target: "app::state", "Restored state: pc ${:05x}, {} frames", self.pc, self.frames.len());
        Ok(())
    }
}
