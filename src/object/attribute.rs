//! Object [attributes](https://inform-fiction.org/zmachine/standards/z1point1/sect12.html#three)
use crate::{error::*, fatal_error, zmachine::ZMachine};

use super::object_address;

/// Byte address and bit mask of an attribute.  Attribute 0 is the high bit of the first byte.
fn location(
    zmachine: &ZMachine,
    object: usize,
    attribute: u8,
    operation: &str,
) -> Result<(usize, u8), RuntimeError> {
    let max = match zmachine.version() {
        1..=3 => 32,
        _ => 48,
    };

    if attribute >= max {
        return fatal_error!(
            ErrorCode::InvalidObjectAttribute,
            "{} of invalid attribute {} on object {}",
            operation,
            attribute,
            object
        );
    }

    let address = object_address(zmachine, object)? + attribute as usize / 8;
    Ok((address, 1 << (7 - (attribute % 8))))
}

pub fn value(zmachine: &ZMachine, object: usize, attribute: u8) -> Result<bool, RuntimeError> {
    let (address, mask) = location(zmachine, object, attribute, "Test")?;
    Ok(zmachine.force_read_byte(address)? & mask == mask)
}

pub fn set(zmachine: &mut ZMachine, object: usize, attribute: u8) -> Result<(), RuntimeError> {
    let (address, mask) = location(zmachine, object, attribute, "Set")?;
    let attribute_byte = zmachine.force_read_byte(address)?;
    zmachine.write_byte(address, attribute_byte | mask)
}

pub fn clear(zmachine: &mut ZMachine, object: usize, attribute: u8) -> Result<(), RuntimeError> {
    let (address, mask) = location(zmachine, object, attribute, "Clear")?;
    let attribute_byte = zmachine.force_read_byte(address)?;
    zmachine.write_byte(address, attribute_byte & !mask)
}

#[cfg(test)]
mod tests {
    use crate::{
        assert_ok, assert_ok_eq,
        test_util::{mock_attributes, mock_object, mock_zmachine, test_map},
    };

    use super::*;

    #[test]
    fn test_value_v3() {
        let mut map = test_map(3);
        mock_object(&mut map, 1, vec![], (0, 0, 0));
        mock_attributes(&mut map, 1, &[0x80, 0x01, 0x00, 0x10]);
        let zmachine = mock_zmachine(map);
        assert_ok_eq!(value(&zmachine, 1, 0), true);
        assert_ok_eq!(value(&zmachine, 1, 1), false);
        assert_ok_eq!(value(&zmachine, 1, 15), true);
        assert_ok_eq!(value(&zmachine, 1, 27), true);
        assert_ok_eq!(value(&zmachine, 1, 31), false);
        assert_eq!(
            value(&zmachine, 1, 32).unwrap_err().code(),
            ErrorCode::InvalidObjectAttribute
        );
    }

    #[test]
    fn test_value_v4() {
        let mut map = test_map(4);
        mock_object(&mut map, 1, vec![], (0, 0, 0));
        mock_attributes(&mut map, 1, &[0, 0, 0, 0, 0, 0x01]);
        let zmachine = mock_zmachine(map);
        assert_ok_eq!(value(&zmachine, 1, 47), true);
        assert_ok_eq!(value(&zmachine, 1, 46), false);
        assert!(value(&zmachine, 1, 48).is_err());
    }

    #[test]
    fn test_set_and_clear() {
        let mut map = test_map(3);
        mock_object(&mut map, 1, vec![], (0, 0, 0));
        mock_object(&mut map, 2, vec![], (0, 0, 0));
        mock_attributes(&mut map, 2, &[0xFF, 0xFF, 0xFF, 0xFF]);
        let mut zmachine = mock_zmachine(map);
        assert_ok!(set(&mut zmachine, 1, 9));
        assert_ok_eq!(zmachine.force_read_byte(0x23F), 0x40);
        assert_ok_eq!(value(&zmachine, 1, 9), true);
        assert_ok!(clear(&mut zmachine, 2, 31));
        assert_ok_eq!(zmachine.force_read_byte(0x24A), 0xFE);
        assert_ok_eq!(value(&zmachine, 2, 31), false);
        assert_ok_eq!(value(&zmachine, 2, 30), true);
    }

    #[test]
    fn test_object_zero() {
        let zmachine = mock_zmachine(test_map(3));
        assert_eq!(
            value(&zmachine, 0, 1).unwrap_err().code(),
            ErrorCode::InvalidObject
        );
    }
}
