//! [Abbreviation](https://inform-fiction.org/zmachine/standards/z1point1/sect03.html#three) table lookup
use crate::{error::*, zmachine::ZMachine};

/// Find the byte address of an abbreviation string.
///
/// # Arguments
/// * `zmachine` - Reference to the Z-machine
/// * `table` - Abbreviation bank, the Z-character (1-3) that introduced the reference
/// * `index` - Z-character selecting the entry within the bank
///
/// # Returns
/// [Result] with the byte address of the abbreviation text or a [RuntimeError]
pub fn address(zmachine: &ZMachine, table: u8, index: u8) -> Result<usize, RuntimeError> {
    let abbreviations = zmachine.header().abbreviations_table();
    let entry = (32 * (table as usize - 1)) + index as usize;
    let word_address = zmachine.force_read_word(abbreviations + (entry * 2))? as usize;
    debug!(target: "app::state", "Abbreviation {}/{} => ${:05x}", table, index, word_address * 2);
    Ok(word_address * 2)
}

#[cfg(test)]
mod tests {
    use crate::{
        assert_ok_eq,
        test_util::{mock_zmachine, test_map},
    };

    use super::*;

    #[test]
    fn test_address() {
        let mut map = test_map(3);
        // Abbreviation table is at 0x40; entry 32 * 1 + 2 = 34
        map[0x40 + 68] = 0x03;
        map[0x40 + 69] = 0x10;
        // Entry 0
        map[0x40] = 0x02;
        map[0x41] = 0x80;
        let zmachine = mock_zmachine(map);
        assert_ok_eq!(address(&zmachine, 2, 2), 0x620);
        assert_ok_eq!(address(&zmachine, 1, 0), 0x500);
    }
}
