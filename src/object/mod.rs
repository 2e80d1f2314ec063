//! [Object](https://inform-fiction.org/zmachine/standards/z1point1/sect12.html) tree
use crate::{error::*, fatal_error, zmachine::ZMachine};

pub mod attribute;
pub mod property;

/// Byte offsets within v1-3 and v4+ object entries
struct Layout {
    defaults: usize,
    entry_size: usize,
    parent: usize,
    sibling: usize,
    child: usize,
    properties: usize,
}

const LAYOUT_V3: Layout = Layout {
    defaults: 62,
    entry_size: 9,
    parent: 4,
    sibling: 5,
    child: 6,
    properties: 7,
};

const LAYOUT_V4: Layout = Layout {
    defaults: 126,
    entry_size: 14,
    parent: 6,
    sibling: 8,
    child: 10,
    properties: 12,
};

fn layout(version: u8) -> &'static Layout {
    match version {
        1..=3 => &LAYOUT_V3,
        _ => &LAYOUT_V4,
    }
}

/// Gets the highest object number the table can hold.
///
/// Object entries end where the first property table begins.  If object 1 has
/// no property table yet, there is no limit.
fn max_object(zmachine: &ZMachine) -> Result<Option<usize>, RuntimeError> {
    let layout = layout(zmachine.version());
    let tree = zmachine.header().object_table() + layout.defaults;
    let first_properties = zmachine.force_read_word(tree + layout.properties)? as usize;
    if first_properties > tree {
        Ok(Some((first_properties - tree) / layout.entry_size))
    } else {
        Ok(None)
    }
}

/// Gets the byte address of an object's table entry
///
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `object` - Object number
///
/// # Returns
/// [Result] with the byte address of the object table entry or a [RuntimeError]
pub(crate) fn object_address(zmachine: &ZMachine, object: usize) -> Result<usize, RuntimeError> {
    if object == 0 {
        return fatal_error!(ErrorCode::InvalidObject, "Object 0 has no table entry");
    }

    if let Some(max) = max_object(zmachine)? {
        if object > max {
            return fatal_error!(
                ErrorCode::InvalidObject,
                "Object {} is beyond the last object {}",
                object,
                max
            );
        }
    }

    let layout = layout(zmachine.version());
    Ok(zmachine.header().object_table() + layout.defaults + (layout.entry_size * (object - 1)))
}

fn relative(zmachine: &ZMachine, object: usize, offset: usize) -> Result<usize, RuntimeError> {
    let object_address = object_address(zmachine, object)?;
    match zmachine.version() {
        1..=3 => Ok(zmachine.force_read_byte(object_address + offset)? as usize),
        _ => Ok(zmachine.force_read_word(object_address + offset)? as usize),
    }
}

fn set_relative(
    zmachine: &mut ZMachine,
    offset: usize,
    object: usize,
    relative: usize,
) -> Result<(), RuntimeError> {
    let object_address = object_address(zmachine, object)?;
    match zmachine.version() {
        1..=3 => zmachine.write_byte(object_address + offset, relative as u8),
        _ => zmachine.write_word(object_address + offset, relative as u16),
    }
}

/// Gets the parent of an object
///
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `object` - Object number
///
/// # Returns
/// [Result] with the parent object number, 0 if none, or a [RuntimeError]
pub fn parent(zmachine: &ZMachine, object: usize) -> Result<usize, RuntimeError> {
    relative(zmachine, object, layout(zmachine.version()).parent)
}

/// Gets the first child of an object
///
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `object` - Object number
///
/// # Returns
/// [Result] with the child object number, 0 if none, or a [RuntimeError]
pub fn child(zmachine: &ZMachine, object: usize) -> Result<usize, RuntimeError> {
    relative(zmachine, object, layout(zmachine.version()).child)
}

/// Gets the next sibling of an object
///
/// # Arguments
/// * `zmachine` - Reference to the zmachine
/// * `object` - Object number
///
/// # Returns
/// [Result] with the sibling object number, 0 if none, or a [RuntimeError]
pub fn sibling(zmachine: &ZMachine, object: usize) -> Result<usize, RuntimeError> {
    relative(zmachine, object, layout(zmachine.version()).sibling)
}

/// Sets the parent of an object.
///
/// Only the `object` table entry is updated.
pub fn set_parent(
    zmachine: &mut ZMachine,
    object: usize,
    parent: usize,
) -> Result<(), RuntimeError> {
    let offset = layout(zmachine.version()).parent;
    set_relative(zmachine, offset, object, parent)
}

/// Sets the child of an object.
///
/// Only the `object` table entry is updated.
pub fn set_child(zmachine: &mut ZMachine, object: usize, child: usize) -> Result<(), RuntimeError> {
    let offset = layout(zmachine.version()).child;
    set_relative(zmachine, offset, object, child)
}

/// Sets the sibling of an object.
///
/// Only the `object` table entry is updated.
pub fn set_sibling(
    zmachine: &mut ZMachine,
    object: usize,
    sibling: usize,
) -> Result<(), RuntimeError> {
    let offset = layout(zmachine.version()).sibling;
    set_relative(zmachine, offset, object, sibling)
}

/// Detach an object from its parent and sibling chain.
///
/// The object keeps its children.  Removing an object without a parent does nothing.
///
/// # Arguments
/// * `zmachine` - Mutable reference to the zmachine
/// * `object` - Object number
///
/// # Returns
/// Empty [Result] or a [RuntimeError]
pub fn remove(zmachine: &mut ZMachine, object: usize) -> Result<(), RuntimeError> {
    let parent = parent(zmachine, object)?;
    if parent == 0 {
        return Ok(());
    }

    let next = sibling(zmachine, object)?;
    let first = child(zmachine, parent)?;
    if first == object {
        set_child(zmachine, parent, next)?;
    } else {
        let mut current = first;
        loop {
            if current == 0 {
                return fatal_error!(
                    ErrorCode::InvalidObjectTree,
                    "Object {} is not in the child list of its parent {}",
                    object,
                    parent
                );
            }
            let s = sibling(zmachine, current)?;
            if s == object {
                set_sibling(zmachine, current, next)?;
                break;
            }
            current = s;
        }
    }

    set_parent(zmachine, object, 0)?;
    set_sibling(zmachine, object, 0)
}

/// Move an object to be the first child of a new parent.
///
/// # Arguments
/// * `zmachine` - Mutable reference to the zmachine
/// * `object` - Object number
/// * `destination` - New parent object number
///
/// # Returns
/// Empty [Result] or a [RuntimeError] if the move would create a cycle
pub fn insert(
    zmachine: &mut ZMachine,
    object: usize,
    destination: usize,
) -> Result<(), RuntimeError> {
    // The destination may not be the object or one of its descendants
    let mut ancestor = destination;
    while ancestor != 0 {
        if ancestor == object {
            return fatal_error!(
                ErrorCode::InvalidObjectTree,
                "Inserting object {} into {} would create a cycle",
                object,
                destination
            );
        }
        ancestor = parent(zmachine, ancestor)?;
    }

    remove(zmachine, object)?;
    let first = child(zmachine, destination)?;
    set_sibling(zmachine, object, first)?;
    set_child(zmachine, destination, object)?;
    set_parent(zmachine, object, destination)
}

#[cfg(test)]
mod tests {
    use crate::{
        assert_ok, assert_ok_eq,
        test_util::{mock_object, mock_zmachine, test_map},
    };

    use super::*;

    /// 1 is the parent of 2, 3 and 4 in that order; 4 holds 5
    fn tree(version: u8) -> ZMachine {
        let mut map = test_map(version);
        mock_object(&mut map, 1, vec![], (0, 0, 2));
        mock_object(&mut map, 2, vec![], (1, 3, 0));
        mock_object(&mut map, 3, vec![], (1, 4, 0));
        mock_object(&mut map, 4, vec![], (1, 0, 5));
        mock_object(&mut map, 5, vec![], (4, 0, 0));
        mock_object(&mut map, 6, vec![], (0, 0, 0));
        mock_zmachine(map)
    }

    #[test]
    fn test_object_address() {
        let zmachine = tree(3);
        assert_ok_eq!(object_address(&zmachine, 1), 0x23E);
        assert_ok_eq!(object_address(&zmachine, 3), 0x250);
        let zmachine = tree(5);
        assert_ok_eq!(object_address(&zmachine, 1), 0x27E);
        assert_ok_eq!(object_address(&zmachine, 2), 0x28C);
    }

    #[test]
    fn test_object_address_invalid() {
        let zmachine = tree(3);
        assert_eq!(
            object_address(&zmachine, 0).unwrap_err().code(),
            ErrorCode::InvalidObject
        );
        // Property tables begin at 0x300: (0x300 - 0x23E) / 9 objects
        assert!(object_address(&zmachine, 21).is_ok());
        assert_eq!(
            object_address(&zmachine, 22).unwrap_err().code(),
            ErrorCode::InvalidObject
        );
        let zmachine = tree(4);
        assert!(object_address(&zmachine, 9).is_ok());
        assert!(object_address(&zmachine, 10).is_err());
    }

    #[test]
    fn test_relatives_v3() {
        let zmachine = tree(3);
        assert_ok_eq!(parent(&zmachine, 2), 1);
        assert_ok_eq!(sibling(&zmachine, 2), 3);
        assert_ok_eq!(child(&zmachine, 1), 2);
        assert_ok_eq!(child(&zmachine, 4), 5);
        assert_ok_eq!(parent(&zmachine, 1), 0);
    }

    #[test]
    fn test_relatives_v5() {
        let zmachine = tree(5);
        assert_ok_eq!(parent(&zmachine, 5), 4);
        assert_ok_eq!(sibling(&zmachine, 3), 4);
        assert_ok_eq!(child(&zmachine, 1), 2);
    }

    #[test]
    fn test_set_relatives() {
        let mut zmachine = tree(4);
        assert_ok!(set_parent(&mut zmachine, 6, 0x1234));
        assert_ok!(set_sibling(&mut zmachine, 6, 0x2345));
        assert_ok!(set_child(&mut zmachine, 6, 0x3456));
        assert_ok_eq!(parent(&zmachine, 6), 0x1234);
        assert_ok_eq!(sibling(&zmachine, 6), 0x2345);
        assert_ok_eq!(child(&zmachine, 6), 0x3456);
    }

    #[test]
    fn test_remove_first_child() {
        let mut zmachine = tree(3);
        assert_ok!(remove(&mut zmachine, 2));
        assert_ok_eq!(child(&zmachine, 1), 3);
        assert_ok_eq!(parent(&zmachine, 2), 0);
        assert_ok_eq!(sibling(&zmachine, 2), 0);
    }

    #[test]
    fn test_remove_middle_child() {
        let mut zmachine = tree(3);
        assert_ok!(remove(&mut zmachine, 3));
        assert_ok_eq!(child(&zmachine, 1), 2);
        assert_ok_eq!(sibling(&zmachine, 2), 4);
        assert_ok_eq!(parent(&zmachine, 3), 0);
    }

    #[test]
    fn test_remove_keeps_children() {
        let mut zmachine = tree(5);
        assert_ok!(remove(&mut zmachine, 4));
        assert_ok_eq!(sibling(&zmachine, 3), 0);
        assert_ok_eq!(child(&zmachine, 4), 5);
        assert_ok_eq!(parent(&zmachine, 5), 4);
    }

    #[test]
    fn test_remove_orphan() {
        let mut zmachine = tree(3);
        assert_ok!(remove(&mut zmachine, 6));
        assert_ok_eq!(parent(&zmachine, 6), 0);
    }

    #[test]
    fn test_insert() {
        let mut zmachine = tree(3);
        assert_ok!(insert(&mut zmachine, 3, 6));
        assert_ok_eq!(child(&zmachine, 6), 3);
        assert_ok_eq!(parent(&zmachine, 3), 6);
        assert_ok_eq!(sibling(&zmachine, 3), 0);
        assert_ok_eq!(sibling(&zmachine, 2), 4);

        assert_ok!(insert(&mut zmachine, 2, 6));
        assert_ok_eq!(child(&zmachine, 6), 2);
        assert_ok_eq!(sibling(&zmachine, 2), 3);
        assert_ok_eq!(child(&zmachine, 1), 4);
    }

    #[test]
    fn test_insert_cycle() {
        let mut zmachine = tree(3);
        assert_eq!(
            insert(&mut zmachine, 1, 5).unwrap_err().code(),
            ErrorCode::InvalidObjectTree
        );
        assert_eq!(
            insert(&mut zmachine, 4, 4).unwrap_err().code(),
            ErrorCode::InvalidObjectTree
        );
        // Tree is unchanged
        assert_ok_eq!(parent(&zmachine, 4), 1);
    }
}
