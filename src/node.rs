//! Directory tree node (`spec.md` §3): the in-memory result of walking
//! a disc's catalogue, independent of which catalogue dialect produced
//! it.
#![warn(missing_docs)]
#![warn(unsafe_code)]

/// RISC OS object attributes carried by both files and directories.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Attributes {
    /// Raw attribute byte/word as stored in the catalogue entry.
    pub raw: u32,
    /// Locked bit.
    pub locked: bool,
}

impl Attributes {
    /// Decode attributes from a raw catalogue attribute byte.
    pub fn from_raw(raw: u32) -> Attributes {
        Attributes {
            raw,
            locked: raw & 0x01 != 0,
        }
    }
}

/// A single entry in the directory tree: either a leaf file with its
/// resolved content, or a directory with its own children.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    /// A file object.
    File {
        /// Name as stored in the catalogue (safe-string converted).
        name: String,
        /// RISC OS load address.
        load: u32,
        /// RISC OS exec address.
        exec: u32,
        /// Length in bytes, as declared by the catalogue (authoritative
        /// over the sum of resolved extent lengths).
        length: u32,
        /// File contents, concatenated in extent order.
        data: Vec<u8>,
        /// Object attributes.
        attributes: Attributes,
    },
    /// A directory object.
    Dir {
        /// Name as stored in the catalogue (safe-string converted).
        name: String,
        /// Child entries, in catalogue order.
        entries: Vec<Node>,
        /// Object attributes.
        attributes: Attributes,
    },
}

impl Node {
    /// File load address bits used to derive a RISC OS filetype, or
    /// `None` for directories or untyped load addresses (`spec.md` §6).
    pub fn filetype(&self) -> Option<u16> {
        match self {
            Node::File { load, .. } if load & 0xfff0_0000 == 0xfff0_0000 => {
                Some(((load >> 8) & 0xfff) as u16)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filetype_extracted_from_typed_load_address() {
        let node = Node::File {
            name: "prog".into(),
            load: 0xfff7_1234,
            exec: 0,
            length: 0,
            data: Vec::new(),
            attributes: Attributes::default(),
        };
        assert_eq!(node.filetype(), Some(0x712));
    }

    #[test]
    fn filetype_absent_for_untyped_load_address() {
        let node = Node::File {
            name: "prog".into(),
            load: 0x1234,
            exec: 0,
            length: 0,
            data: Vec::new(),
            attributes: Attributes::default(),
        };
        assert_eq!(node.filetype(), None);
    }

    #[test]
    fn attributes_decode_locked_bit() {
        let attrs = Attributes::from_raw(0x01);
        assert!(attrs.locked);
    }
}
