//! Disc Record Reader (`spec.md` §4.3): parses the 32-byte disc
//! record structure present in E-format discs.
#![warn(missing_docs)]
#![warn(unsafe_code)]

use std::fmt::{Display, Formatter, Result as FmtResult};

use nom::bytes::complete::take;
use nom::number::complete::{le_u16, le_u24, le_u32, le_u8};
use nom::IResult;

use crate::bytes::safe_string;

/// Recording density of a disc, decoded from the disc record's
/// density byte.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Density {
    /// Single density
    Single,
    /// Double density
    Double,
    /// Quad density
    Quad,
    /// An unrecognised density code
    Unknown,
}

impl Density {
    fn from_code(code: u8) -> Density {
        match code {
            1 => Density::Single,
            2 => Density::Double,
            3 => Density::Quad,
            _ => Density::Unknown,
        }
    }
}

impl Display for Density {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        write!(f, "{:?}", self)
    }
}

/// The ADFS disc record, present at a fixed offset in E-format discs.
#[derive(Clone, Debug, PartialEq)]
pub struct DiscRecord {
    /// log2 of the sector size
    pub log2_sector_size: u8,
    /// Sector size in bytes, `2^log2_sector_size`
    pub sector_size: u32,
    /// Sectors per track
    pub nsectors: u8,
    /// Heads per track
    pub heads: u8,
    /// Recording density
    pub density: Density,
    /// Length of the sector ID field
    pub idlen: u8,
    /// log2 of the number of bytes represented by one bit of the
    /// fragment map
    pub log2_bytes_per_bit: u8,
    /// Number of zones in the fragment map
    pub zones: u8,
    /// SIN of the root directory
    pub root_dir: u32,
    /// Total size of the disc in bytes
    pub disc_size: u32,
    /// Disc identifier
    pub disc_id: u16,
    /// Disc name, space-trimmed and high-bit stripped
    pub disc_name: String,
}

/// Parse the disc record's 32 fields in sequence, the same way the
/// teacher's `parse_volume_table_of_contents`
/// (`disk_format/apple/disk.rs`) reads the Apple VTOC's flat fields
/// with `nom`'s `le_u8`/`le_u16`/`le_u32`/`take`.
fn disc_record_fields(i: &[u8]) -> IResult<&[u8], DiscRecord> {
    let (i, log2_sector_size) = le_u8(i)?;
    let sector_size = 1u32 << log2_sector_size;
    let (i, nsectors) = le_u8(i)?;
    let (i, heads) = le_u8(i)?;
    let (i, density_code) = le_u8(i)?;
    let density = Density::from_code(density_code);
    let (i, idlen) = le_u8(i)?;
    let (i, log2_bytes_per_bit) = le_u8(i)?;
    let (i, _reserved) = take(3_usize)(i)?;
    let (i, zones) = le_u8(i)?;
    let (i, _reserved2) = take(3_usize)(i)?;
    let (i, root_dir) = le_u24(i)?;
    let (i, disc_size) = le_u32(i)?;
    let (i, disc_id) = le_u16(i)?;
    let (i, disc_name_raw) = take(10_usize)(i)?;
    let disc_name = safe_string(disc_name_raw);

    Ok((
        i,
        DiscRecord {
            log2_sector_size,
            sector_size,
            nsectors,
            heads,
            density,
            idlen,
            log2_bytes_per_bit,
            zones,
            root_dir,
            disc_size,
            disc_id,
            disc_name,
        },
    ))
}

/// Parse a disc record from `data` at `offset`.
///
/// # Panics
///
/// Panics if fewer than 32 bytes remain at `offset`; callers must
/// check the buffer length first (the Track Assembler guarantees this
/// for every offset the Format Identifier and Disc Facade use).
pub fn parse_disc_record(data: &[u8], offset: usize) -> DiscRecord {
    disc_record_fields(&data[offset..])
        .expect("disc record fields")
        .1
}

impl Display for DiscRecord {
    fn fmt(&self, f: &mut Formatter) -> FmtResult {
        writeln!(f, "sector size: {}", self.sector_size)?;
        writeln!(f, "sectors per track: {}", self.nsectors)?;
        writeln!(f, "heads: {}", self.heads)?;
        writeln!(f, "density: {}", self.density)?;
        writeln!(f, "zones: {}", self.zones)?;
        writeln!(f, "root dir: {:#x}", self.root_dir)?;
        writeln!(f, "disc size: {}", self.disc_size)?;
        writeln!(f, "disc id: {:#x}", self.disc_id)?;
        write!(f, "disc name: {}", self.disc_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record_bytes() -> Vec<u8> {
        let mut data = vec![0u8; 32];
        data[0] = 10; // log2(1024)
        data[1] = 10; // nsectors
        data[2] = 1; // heads
        data[3] = 2; // density = double
        data[4] = 3; // idlen
        data[5] = 8; // log2_bytes_per_bit
        data[9] = 4; // zones
        data[13..16].copy_from_slice(&[0x02, 0x00, 0x00]); // root_dir = 2
        data[16..20].copy_from_slice(&819200u32.to_le_bytes());
        data[20..22].copy_from_slice(&0x1234u16.to_le_bytes());
        data[22..32].copy_from_slice(b"MyDisc\0\0\0\0");
        data
    }

    #[test]
    fn parses_fields() {
        let data = record_bytes();
        let record = parse_disc_record(&data, 0);

        assert_eq!(record.sector_size, 1024);
        assert_eq!(record.nsectors, 10);
        assert_eq!(record.heads, 1);
        assert_eq!(record.density, Density::Double);
        assert_eq!(record.zones, 4);
        assert_eq!(record.root_dir, 2);
        assert_eq!(record.disc_size, 819200);
        assert_eq!(record.disc_id, 0x1234);
        assert_eq!(record.disc_name, "MyDisc");
    }

    #[test]
    fn parses_at_nonzero_offset() {
        let mut data = vec![0u8; 36];
        data[4..].copy_from_slice(&record_bytes());
        let record = parse_disc_record(&data, 4);
        assert_eq!(record.sector_size, 1024);
        assert_eq!(record.disc_name, "MyDisc");
    }
}
