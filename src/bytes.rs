//! Little-endian integer extraction and "safe string" conversion for
//! ADFS names (`spec.md` §2.1, the Byte Reader component).
//!
//! Fixed-width fields are read with `nom`'s number/byte combinators,
//! the same way the teacher reads the Apple VTOC's flat fields in
//! `disk_format/apple/disk.rs`'s `parse_volume_table_of_contents`.
#![warn(missing_docs)]
#![warn(unsafe_code)]

use nom::bytes::complete::take;
use nom::number::complete::{le_u16, le_u24, le_u32, le_u8};
use nom::IResult;

/// Read a little-endian 16-bit integer starting at `offset`.
///
/// # Panics
///
/// Panics if fewer than two bytes remain at `offset`. Callers at the
/// component boundaries are expected to have already checked the
/// buffer length (see [`crate::track::assemble`]).
pub fn read_u16_le(data: &[u8], offset: usize) -> u16 {
    let result: IResult<&[u8], u16> = le_u16(&data[offset..]);
    result.expect("not enough bytes for a 16-bit field").1
}

/// Read a little-endian 24-bit integer starting at `offset`, returned
/// widened to `u32`.
pub fn read_u24_le(data: &[u8], offset: usize) -> u32 {
    let result: IResult<&[u8], u32> = le_u24(&data[offset..]);
    result.expect("not enough bytes for a 24-bit field").1
}

/// Raw fields of one 26-byte ADFS catalogue entry (`spec.md`
/// §4.6/§4.7), shared by both catalogue dialects ahead of the
/// dialect-specific interpretation of `addr`/`atts`. The direct
/// analogue of the teacher's `parse_file_entry`
/// (`disk_format/apple/catalog.rs`), which reads Apple DOS 3.3's
/// 35-byte entries the same way.
#[derive(Clone, Debug)]
pub struct CatalogueEntryFields<'a> {
    /// Raw 10-byte name field, not yet safe-string converted.
    pub name: &'a [u8],
    /// RISC OS load address.
    pub load: u32,
    /// RISC OS exec address.
    pub exec: u32,
    /// Object length in bytes.
    pub length: u32,
    /// 24-bit address/SIN field; meaning depends on catalogue dialect.
    pub addr: u32,
    /// Attribute/sequence byte; meaning depends on catalogue dialect.
    pub atts: u8,
}

/// Parse one 26-byte catalogue entry starting at `i`.
pub fn parse_catalogue_entry(i: &[u8]) -> IResult<&[u8], CatalogueEntryFields> {
    let (i, name) = take(10_usize)(i)?;
    let (i, load) = le_u32(i)?;
    let (i, exec) = le_u32(i)?;
    let (i, length) = le_u32(i)?;
    let (i, addr) = le_u24(i)?;
    let (i, atts) = le_u8(i)?;

    Ok((
        i,
        CatalogueEntryFields {
            name,
            load,
            exec,
            length,
            addr,
            atts,
        },
    ))
}

/// Convert a raw ADFS name field into a sign-clean "safe string": high
/// bits are stripped and the string is terminated at the first control
/// byte (`<= 0x20`), matching `ADFSlib.py`'s `safe()`.
pub fn safe_string(raw: &[u8]) -> String {
    let mut out = String::with_capacity(raw.len());
    for &byte in raw {
        if byte <= 0x20 {
            break;
        }

        let clean = if byte >= 0x80 { byte ^ 0x80 } else { byte };
        if clean > 0x20 {
            out.push(clean as char);
        }
    }
    out
}

/// Return the largest 1-based index among `raw` at which bit 7 was
/// set, or 0 if no byte had its top bit set. Used by the old-catalogue
/// directory heuristic in `spec.md` §4.6.
pub fn top_bit_set_index(raw: &[u8]) -> usize {
    let mut top_set = 0;
    for (i, &byte) in raw.iter().enumerate() {
        if byte & 0x80 != 0 {
            top_set = i + 1;
        }
    }
    top_set
}
