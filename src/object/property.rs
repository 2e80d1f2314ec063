//! Object [property](https://inform-fiction.org/zmachine/standards/z1point1/sect12.html#four) tables
use std::cmp::Ordering;

use crate::{error::*, fatal_error, text, zmachine::ZMachine};

use super::object_address;

/// Gets the property table byte address for an object
fn property_table_address(zmachine: &ZMachine, object: usize) -> Result<usize, RuntimeError> {
    let offset = match zmachine.version() {
        1..=3 => 7,
        _ => 12,
    };

    Ok(zmachine.force_read_word(object_address(zmachine, object)? + offset)? as usize)
}

/// Gets the address of the first property entry, just past the short name
fn first_property(zmachine: &ZMachine, object: usize) -> Result<usize, RuntimeError> {
    let table = property_table_address(zmachine, object)?;
    let header_size = zmachine.force_read_byte(table)? as usize;
    Ok(table + 1 + (header_size * 2))
}

/// Property number from the first size byte of a property entry
fn number(zmachine: &ZMachine, size_byte: u8) -> u8 {
    match zmachine.version() {
        1..=3 => size_byte & 0x1F,
        _ => size_byte & 0x3F,
    }
}

/// Gets the size of a property
///
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `property_address` - Byte address of the the property entry
///
/// # Returns
/// [Result] property size in bytes or a [RuntimeError]
fn size(zmachine: &ZMachine, property_address: usize) -> Result<usize, RuntimeError> {
    let size_byte = zmachine.force_read_byte(property_address)?;
    match zmachine.version() {
        1..=3 => Ok((size_byte as usize / 32) + 1),
        _ => match size_byte & 0xC0 {
            0x40 => Ok(2),
            0x00 => Ok(1),
            _ => {
                let size = zmachine.force_read_byte(property_address + 1)? as usize & 0x3F;
                if size == 0 {
                    Ok(64)
                } else {
                    Ok(size)
                }
            }
        },
    }
}

/// Gets the bytes address of a property's data
fn data_address(zmachine: &ZMachine, property_address: usize) -> Result<usize, RuntimeError> {
    match zmachine.version() {
        1..=3 => Ok(property_address + 1),
        _ => {
            if zmachine.force_read_byte(property_address)? & 0x80 == 0x80 {
                Ok(property_address + 2)
            } else {
                Ok(property_address + 1)
            }
        }
    }
}

/// Gets the byte address for a specific property entry for an object.
///
/// Properties are stored in descending numerical order, so the scan stops at
/// the first lower-numbered property.
///
/// # Returns
/// [Result] with the byte address of the object's property entry, 0 if the object doesn't have it, or a [RuntimeError]
fn address(zmachine: &ZMachine, object: usize, property: u8) -> Result<usize, RuntimeError> {
    let mut property_address = first_property(zmachine, object)?;
    let mut size_byte = zmachine.force_read_byte(property_address)?;
    while size_byte != 0 {
        match number(zmachine, size_byte).cmp(&property) {
            Ordering::Equal => return Ok(property_address),
            Ordering::Less => return Ok(0),
            Ordering::Greater => {
                property_address =
                    data_address(zmachine, property_address)? + size(zmachine, property_address)?;
                size_byte = zmachine.force_read_byte(property_address)?;
            }
        }
    }

    Ok(0)
}

/// Gets the byte address of an object's property data
///
/// If the property does not exist for the object, 0 is returned.
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `object` - Object number
/// * `property` - Property number
///
/// # Returns
/// [Result] with the byte address of the property data, 0, or a [RuntimeError]
pub fn property_data_address(
    zmachine: &ZMachine,
    object: usize,
    property: u8,
) -> Result<usize, RuntimeError> {
    let property_address = address(zmachine, object, property)?;
    if property_address == 0 {
        Ok(0)
    } else {
        data_address(zmachine, property_address)
    }
}

/// Gets the length of a property's data from its data address
///
/// If the `property_data_address` is 0, 0 is returned.
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `property_data_address` - Byte address of the property's data
///
/// # Returns
/// [Result] the length of a property's data, 0, or a [RuntimeError]
pub fn property_length(
    zmachine: &ZMachine,
    property_data_address: usize,
) -> Result<usize, RuntimeError> {
    if property_data_address == 0 {
        return Ok(0);
    }

    let size_byte = zmachine.force_read_byte(property_data_address - 1)?;
    match zmachine.version() {
        1..=3 => Ok((size_byte as usize / 32) + 1),
        _ => {
            if size_byte & 0x80 == 0x80 {
                // Second byte of a two-byte size
                match size_byte as usize & 0x3F {
                    0 => Ok(64),
                    size => Ok(size),
                }
            } else if size_byte & 0x40 == 0x40 {
                Ok(2)
            } else {
                Ok(1)
            }
        }
    }
}

/// Gets the decoded short name of an object
///
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `object` - Object number
///
/// # Returns
/// [Result] with the ZSCII short name or a [RuntimeError]
pub fn short_name(zmachine: &ZMachine, object: usize) -> Result<Vec<u16>, RuntimeError> {
    let table = property_table_address(zmachine, object)?;
    let header_count = zmachine.force_read_byte(table)? as usize;
    let mut ztext = Vec::new();
    for i in 0..header_count {
        ztext.push(zmachine.force_read_word(table + 1 + (i * 2))?);
    }

    text::from_vec(zmachine, &ztext, false)
}

/// Gets the default value of a property
fn default_property(zmachine: &ZMachine, property: u8) -> Result<u16, RuntimeError> {
    let max = match zmachine.version() {
        1..=3 => 31,
        _ => 63,
    };
    if property == 0 || property > max {
        return fatal_error!(
            ErrorCode::InvalidObjectProperty,
            "No default for property {}",
            property
        );
    }

    let object_table = zmachine.header().object_table();
    zmachine.force_read_word(object_table + ((property as usize - 1) * 2))
}

/// Gets the value of a property for an object
///
/// The property value must be either a byte or a word value. If the property does not exist
/// for the object, the default property word value is returned.
///
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `object` - Object number
/// * `property` - Property number
///
/// # Returns
/// [Result] with the property value or a [RuntimeError]
pub fn property(zmachine: &ZMachine, object: usize, property: u8) -> Result<u16, RuntimeError> {
    let property_address = address(zmachine, object, property)?;
    if property_address == 0 {
        return default_property(zmachine, property);
    }

    let property_size = size(zmachine, property_address)?;
    let property_data_address = data_address(zmachine, property_address)?;
    match property_size {
        1 => Ok(zmachine.force_read_byte(property_data_address)? as u16),
        2 => zmachine.force_read_word(property_data_address),
        _ => fatal_error!(
            ErrorCode::InvalidObjectPropertySize,
            "Read of property {} on object {} should have size 1 or 2, was {}",
            property,
            object,
            property_size
        ),
    }
}

/// Gets the next property set on an object.
///
/// If `property` is 0, the first property number on the object is returned.
/// If there is no next property, 0 is returned.
///
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `object` - Object number
/// * `property` - Property number
///
/// # Returns
/// [Result] with the next property number set for the object, 0, or a [RuntimeError]
pub fn next_property(zmachine: &ZMachine, object: usize, property: u8) -> Result<u8, RuntimeError> {
    let next_address = if property == 0 {
        first_property(zmachine, object)?
    } else {
        let property_address = address(zmachine, object, property)?;
        if property_address == 0 {
            return fatal_error!(
                ErrorCode::InvalidObjectProperty,
                "Object {} does not have property {}",
                object,
                property
            );
        }
        data_address(zmachine, property_address)? + size(zmachine, property_address)?
    };

    let size_byte = zmachine.force_read_byte(next_address)?;
    Ok(number(zmachine, size_byte))
}

/// Sets the value of a property for an object.
///
/// The property must exist on the object.  A 1-byte property stores the low byte of `value`.
///
/// # Arguments
/// * `zmachine` - Mutable reference to the zmachine
/// * `object` - Object number
/// * `property` - Property number
/// * `value` - Byte or word value to set
///
/// # Returns
/// Empty [Result] or a [RuntimeError]
pub fn set_property(
    zmachine: &mut ZMachine,
    object: usize,
    property: u8,
    value: u16,
) -> Result<(), RuntimeError> {
    let property_address = address(zmachine, object, property)?;
    if property_address == 0 {
        return fatal_error!(
            ErrorCode::InvalidObjectProperty,
            "Object {} does not have property {}",
            object,
            property
        );
    }

    let property_size = size(zmachine, property_address)?;
    let property_data = data_address(zmachine, property_address)?;
    match property_size {
        1 => zmachine.write_byte(property_data, value as u8),
        2 => zmachine.write_word(property_data, value),
        _ => fatal_error!(
            ErrorCode::InvalidObjectPropertySize,
            "Object {} property {} size ({}) is not a byte or a word",
            object,
            property,
            property_size
        ),
    }
}
