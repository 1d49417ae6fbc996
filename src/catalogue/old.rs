//! Old-catalogue Walker (`spec.md` §4.6): D and pre-D ("Hugo"-framed)
//! directories, grounded on `ADFSlib.py`'s `read_old_catalogue`.
use crate::bytes::{parse_catalogue_entry, read_u24_le, safe_string, top_bit_set_index};
use crate::diagnostics::{DiagnosticLog, Severity};
use crate::error::ErrorKind;
use crate::node::{Attributes, Node};

const ENTRY_SIZE: usize = 26;

/// Result of walking one old-catalogue directory frame.
pub struct CatalogueResult {
    /// The directory's own name, from the frame tail.
    pub name: String,
    /// Children, in catalogue order.
    pub entries: Vec<Node>,
    /// The disc title, present only when this directory is the root
    /// (its tail's `parent` back-pointer equals its own head).
    pub disc_title: Option<String>,
}

fn empty_result() -> CatalogueResult {
    CatalogueResult {
        name: String::new(),
        entries: Vec::new(),
        disc_title: None,
    }
}

/// Walk the old-catalogue directory frame at `head`.
///
/// `is_add` selects the AdD byte-scaling and tail-offset rules;
/// otherwise the pre-D/D-successor ("others") rules apply.
pub fn read_old_catalogue(
    data: &[u8],
    head: usize,
    sector_size: usize,
    is_add: bool,
    log: &mut DiagnosticLog,
) -> CatalogueResult {
    if head + 5 > data.len() || &data[head + 1..head + 5] != b"Hugo" {
        log.push(
            Severity::Warning,
            ErrorKind::BrokenStructure(format!("Not a directory: {:#x}", head)).to_string(),
        );
        return empty_result();
    }

    let dir_seq = data[head];
    let mut entries = Vec::new();
    let mut p = 5;

    while data[head + p] != 0 {
        let entry_start = head + p;
        let (_, fields) = parse_catalogue_entry(&data[entry_start..])
            .expect("catalogue entry fits within the sector buffer");
        let top_set = top_bit_set_index(fields.name);
        let name = safe_string(fields.name);

        let load = fields.load;
        let exec = fields.exec;
        let length = fields.length;
        let raw_addr = fields.addr as usize;
        let olddirobseq = fields.atts;

        let scale = if is_add { 256 } else { sector_size };
        let inddiscadd = raw_addr * scale;

        let is_directory = if is_add {
            olddirobseq & 0x8 != 0
        } else {
            (load == 0 && exec == 0 && top_set > 2) || (top_set > 0 && length == (sector_size as u32) * 5)
        };

        if is_directory {
            let sub = read_old_catalogue(data, inddiscadd, sector_size, is_add, log);
            entries.push(Node::Dir {
                name,
                entries: sub.entries,
                attributes: Attributes::from_raw(olddirobseq as u32),
            });
        } else {
            let end = (inddiscadd + length as usize).min(data.len());
            let file_data = if inddiscadd < data.len() {
                data[inddiscadd..end].to_vec()
            } else {
                Vec::new()
            };
            entries.push(Node::File {
                name,
                load,
                exec,
                length,
                data: file_data,
                attributes: Attributes::from_raw(olddirobseq as u32),
            });
        }

        p += ENTRY_SIZE;
    }

    let tail = if is_add {
        head + sector_size
    } else {
        head + 4 * sector_size
    };

    if tail + sector_size > data.len() {
        log.push(
            Severity::Warning,
            ErrorKind::BrokenStructure(format!(
                "Discrepancy in directory structure: [{:#x}, {:#x}]",
                head, tail
            ))
            .to_string(),
        );
        return CatalogueResult {
            name: String::new(),
            entries,
            disc_title: None,
        };
    }

    let end = tail + sector_size;
    if &data[end - 5..end - 1] != b"Hugo" {
        log.push(
            Severity::Warning,
            ErrorKind::BrokenStructure(format!(
                "Discrepancy in directory structure: [{:#x}, {:#x}]",
                head, tail
            ))
            .to_string(),
        );
        return CatalogueResult {
            name: String::new(),
            entries,
            disc_title: None,
        };
    }

    let (name, parent, title) = if is_add {
        let name = safe_string(&data[end - 16..end - 6]);
        let parent = 256 * read_u24_le(data, end - 38) as usize;
        let title = safe_string(&data[end - 35..end - 16]);
        (name, parent, title)
    } else {
        let name = safe_string(&data[end - 52..end - 42]);
        let parent = sector_size * read_u24_le(data, end - 42) as usize;
        let title = safe_string(&data[end - 39..end - 20]);
        (name, parent, title)
    };

    let disc_title = if parent == head { Some(title) } else { None };

    let endseq = data[end - 6];
    if endseq != dir_seq {
        log.push(
            Severity::Warning,
            ErrorKind::BrokenStructure(format!("Broken directory: {} at [{:#x}, {:#x}]", name, head, tail))
                .to_string(),
        );
        return CatalogueResult {
            name: String::new(),
            entries,
            disc_title,
        };
    }

    CatalogueResult {
        name,
        entries,
        disc_title,
    }
}
