//! [Dictionary](https://inform-fiction.org/zmachine/standards/z1point1/sect13.html) lookup and lexical analysis
use std::cmp::Ordering;

use crate::{
    error::*,
    text::{self, alphabet},
    zmachine::ZMachine,
};

/// Dictionary header fields
struct Layout {
    separators: Vec<u16>,
    entry_size: usize,
    entry_count: i16,
    entries: usize,
}

impl Layout {
    fn read(zmachine: &ZMachine, dictionary: usize) -> Result<Layout, RuntimeError> {
        let separator_count = zmachine.force_read_byte(dictionary)? as usize;
        let mut separators = Vec::new();
        for i in 1..=separator_count {
            separators.push(zmachine.force_read_byte(dictionary + i)? as u16);
        }

        let entry_size = zmachine.force_read_byte(dictionary + separator_count + 1)? as usize;
        let entry_count = zmachine.force_read_word(dictionary + separator_count + 2)? as i16;
        Ok(Layout {
            separators,
            entry_size,
            entry_count,
            entries: dictionary + separator_count + 4,
        })
    }
}

/// Get the set of word separators from a dictionary
///
/// # Arguments
/// * `zmachine` - Reference to the Z-Machine
/// * `dictionary` - Address of the dictionary
///
/// # Returns
/// [Result] containing a vector of ZSCII separator characters or a [RuntimeError]
pub fn separators(zmachine: &ZMachine, dictionary: usize) -> Result<Vec<u16>, RuntimeError> {
    Ok(Layout::read(zmachine, dictionary)?.separators)
}

fn entry_words(
    zmachine: &ZMachine,
    address: usize,
    count: usize,
) -> Result<Vec<u16>, RuntimeError> {
    let mut words = Vec::with_capacity(count);
    for i in 0..count {
        words.push(zmachine.force_read_word(address + (i * 2))?);
    }
    Ok(words)
}

/// Binary search of a sorted dictionary
fn search_entry(
    zmachine: &ZMachine,
    layout: &Layout,
    word: &[u16],
) -> Result<usize, RuntimeError> {
    let mut min = 0;
    let mut max = layout.entry_count as usize;

    while min < max {
        let pivot = min + (max - min) / 2;
        let address = layout.entries + (pivot * layout.entry_size);
        let entry = entry_words(zmachine, address, word.len())?;
        match entry.as_slice().cmp(word) {
            Ordering::Less => min = pivot + 1,
            Ordering::Greater => max = pivot,
            Ordering::Equal => return Ok(address),
        }
    }

    Ok(0)
}

/// Linear scan of an unsorted dictionary
fn scan_entry(zmachine: &ZMachine, layout: &Layout, word: &[u16]) -> Result<usize, RuntimeError> {
    let count = layout.entry_count.unsigned_abs() as usize;
    for i in 0..count {
        let address = layout.entries + (i * layout.entry_size);
        if entry_words(zmachine, address, word.len())? == word {
            return Ok(address);
        }
    }

    Ok(0)
}

/// Look a word up in a dictionary.
///
/// # Arguments
/// * `zmachine` - Reference to the Z-Machine
/// * `dictionary` - Address of the dictionary
/// * `word` - ZSCII characters of the word
///
/// # Returns
/// [Result] containing the address of the matching entry, 0 if the word isn't found, or a [RuntimeError]
pub fn lookup(zmachine: &ZMachine, dictionary: usize, word: &[u16]) -> Result<usize, RuntimeError> {
    let layout = Layout::read(zmachine, dictionary)?;
    let encoded = text::encode_text(zmachine, word);
    debug!(target: "app::state", "LEXICAL ANALYSIS: dictionary @ ${:04x}, {} entries of size {}", dictionary, layout.entry_count, layout.entry_size);

    if layout.entry_count > 0 {
        search_entry(zmachine, &layout, &encoded)
    } else {
        scan_entry(zmachine, &layout, &encoded)
    }
}

fn to_lower(zscii: u16) -> u16 {
    match zscii {
        0x41..=0x5A => zscii + 0x20,
        _ => zscii,
    }
}

/// Store a line of player input in a text buffer.
///
/// Input is lowered and converted to ZSCII.  Characters without a ZSCII form and
/// the terminating newline are dropped. Input longer than the buffer is truncated.
///
/// # Arguments
/// * `zmachine` - Mutable reference to the Z-Machine
/// * `text_buffer` - Address of the text buffer
/// * `input` - Input line
///
/// # Returns
/// [Result] with the number of characters stored or a [RuntimeError]
pub fn store_input(
    zmachine: &mut ZMachine,
    text_buffer: usize,
    input: &str,
) -> Result<usize, RuntimeError> {
    let version = zmachine.version();
    let size = zmachine.force_read_byte(text_buffer)? as usize;
    let max = if version < 5 {
        size.saturating_sub(1)
    } else {
        size
    };

    let data: Vec<u8> = input
        .chars()
        .flat_map(|c| c.to_lowercase())
        .filter_map(alphabet::char_to_zscii)
        .filter(|z| *z != 13 && *z < 0x100)
        .map(|z| z as u8)
        .take(max)
        .collect();

    debug!(target: "app::state", "READ: {:?} => text buffer @ ${:04x}", input, text_buffer);
    if version < 5 {
        for (i, b) in data.iter().enumerate() {
            zmachine.write_byte(text_buffer + 1 + i, *b)?;
        }
        zmachine.write_byte(text_buffer + 1 + data.len(), 0)?;
    } else {
        zmachine.write_byte(text_buffer + 1, data.len() as u8)?;
        for (i, b) in data.iter().enumerate() {
            zmachine.write_byte(text_buffer + 2 + i, *b)?;
        }
    }

    Ok(data.len())
}

/// Read the characters from a text buffer
fn input_data(zmachine: &ZMachine, text_buffer: usize) -> Result<Vec<u16>, RuntimeError> {
    let mut data = Vec::new();
    if zmachine.version() < 5 {
        // Buffer is 0 terminated
        let max = zmachine.force_read_byte(text_buffer)? as usize;
        for i in 1..max.max(1) {
            let b = zmachine.force_read_byte(text_buffer + i)?;
            if b == 0 {
                break;
            }
            data.push(to_lower(b as u16));
        }
    } else {
        // Character count is stored in the second byte
        let n = zmachine.force_read_byte(text_buffer + 1)? as usize;
        for i in 0..n {
            data.push(to_lower(zmachine.force_read_byte(text_buffer + 2 + i)? as u16));
        }
    }

    Ok(data)
}

/// Split input into (position, word) tokens.  Separators are words of their own; spaces only split.
fn tokens(data: &[u16], separators: &[u16]) -> Vec<(usize, Vec<u16>)> {
    let mut tokens = Vec::new();
    let mut word = Vec::new();
    let mut word_start = 0;

    for (i, c) in data.iter().enumerate() {
        if *c == 0x20 || separators.contains(c) {
            if !word.is_empty() {
                tokens.push((word_start, word.clone()));
                word.clear();
            }
            if *c != 0x20 {
                tokens.push((i, vec![*c]));
            }
            word_start = i + 1;
        } else {
            word.push(*c);
        }
    }

    if !word.is_empty() {
        tokens.push((word_start, word));
    }

    tokens
}

/// Parse a text buffer into a parse buffer.
///
/// # Arguments
/// * `zmachine` - Mutable reference to the Z-Machine
/// * `text_buffer` - Input text buffer address
/// * `parse_buffer` - Parse buffer address
/// * `dictionary` - Dictionary address
/// * `flag` - If `true`, parse buffer entries for words that aren't in the dictionary are left untouched
///
/// # Returns
/// Empty [Result] or a [RuntimeError]
pub fn parse_text(
    zmachine: &mut ZMachine,
    text_buffer: usize,
    parse_buffer: usize,
    dictionary: usize,
    flag: bool,
) -> Result<(), RuntimeError> {
    debug!(target: "app::state", "LEXICAL ANALYSIS: text @ ${:04x}, parse @ ${:04x}, dictionary @ ${:04x}, skip {}", text_buffer, parse_buffer, dictionary, flag);
    let separators = separators(zmachine, dictionary)?;
    let data = input_data(zmachine, text_buffer)?;
    let offset = if zmachine.version() < 5 { 1 } else { 2 };
    let max_words = zmachine.force_read_byte(parse_buffer)? as usize;

    let tokens = tokens(&data, &separators);
    let count = tokens.len().min(max_words);
    for (i, (position, word)) in tokens.iter().take(count).enumerate() {
        let entry = lookup(zmachine, dictionary, word)?;
        debug!(target: "app::state", "LEXICAL ANALYSIS: {:?} => ${:04x}", text::to_string(word), entry);
        if flag && entry == 0 {
            continue;
        }

        let address = parse_buffer + 2 + (4 * i);
        zmachine.write_word(address, entry as u16)?;
        zmachine.write_byte(address + 2, word.len() as u8)?;
        zmachine.write_byte(address + 3, (position + offset) as u8)?;
    }

    zmachine.write_byte(parse_buffer + 1, count as u8)
}
