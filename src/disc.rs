//! Disc Facade (`spec.md` §4.8): opens an image and exposes the
//! reconstructed tree, disc/root names, diagnostic log, listing, and
//! extraction, grounded on `ADFSlib.py`'s `ADFSdisc.__init__`.
#![warn(missing_docs)]
#![warn(unsafe_code)]
use std::collections::HashMap;
use std::path::Path;

use log::info;

use crate::catalogue::{new as new_catalogue, old as old_catalogue};
use crate::diagnostics::{DiagnosticLog, LogEntry};
use crate::disc_record::parse_disc_record;
use crate::error::{Error, ErrorKind};
use crate::extract;
use crate::format::{self, Catalogue, ImageVariant};
use crate::map;
use crate::node::{Attributes, Node};
use crate::track;

/// A parsed ADFS disc image: geometry, catalogue, and fragment map
/// resolved into a single immutable value.
///
/// Once built, a `Disc` is read-only and therefore safe to share
/// across threads (`spec.md` §5).
pub struct Disc {
    variant: ImageVariant,
    disc_name: String,
    root_name: String,
    root: Node,
    log: DiagnosticLog,
}

impl Disc {
    /// Open an ADFS disc image from its raw bytes.
    ///
    /// Only [`ErrorKind::UnsupportedImage`] and
    /// [`ErrorKind::TruncatedImage`] terminate this call; every other
    /// structural problem is recorded in the diagnostic log and the
    /// parser produces its best-effort tree regardless.
    pub fn open(image_bytes: &[u8], verify: bool) -> Result<Disc, Error> {
        let variant = format::identify(image_bytes)?;
        let sector_buffer = track::assemble(variant, image_bytes)?;
        let mut log = DiagnosticLog::new(verify);

        let (disc_name, root_name, entries) = match variant.catalogue() {
            Catalogue::Old => Self::open_old(&sector_buffer, variant, &mut log),
            Catalogue::New => Self::open_new(&sector_buffer, variant, &mut log)?,
        };

        info!("Opened {:?} disc \"{}\"", variant, disc_name);

        let root = Node::Dir {
            name: root_name.clone(),
            entries,
            attributes: Attributes::default(),
        };

        Ok(Disc {
            variant,
            disc_name,
            root_name,
            root,
            log,
        })
    }

    fn open_old(
        sector_buffer: &[u8],
        variant: ImageVariant,
        log: &mut DiagnosticLog,
    ) -> (String, String, Vec<Node>) {
        let is_add = matches!(variant, ImageVariant::AdD);
        let result = old_catalogue::read_old_catalogue(
            sector_buffer,
            variant.root_dir_offset(),
            variant.sector_size(),
            is_add,
            log,
        );
        let disc_name = result.disc_title.unwrap_or_else(|| "Untitled".to_string());
        (disc_name, result.name, result.entries)
    }

    fn open_new(
        sector_buffer: &[u8],
        variant: ImageVariant,
        log: &mut DiagnosticLog,
    ) -> Result<(String, String, Vec<Node>), Error> {
        let (record_offset, map_start, map_end) = match variant {
            ImageVariant::AdE => (4usize, 0x40usize, 0x400usize),
            ImageVariant::AdEBig => (0xc6804, 0xc6840, 0xc7800),
            other => unreachable!("{:?} does not use the new catalogue", other),
        };

        if sector_buffer.len() < record_offset + 32 || sector_buffer.len() < map_end {
            return Err(Error::new(ErrorKind::TruncatedImage(
                "disc record or fragment map region out of range".to_string(),
            )));
        }

        let record = parse_disc_record(sector_buffer, record_offset);
        let disc_map = map::decode(sector_buffer, map_start, map_end, variant, log);
        let defects = disc_map.get(&map::DEFECT_FILE_NO).map_or(0, Vec::len);
        log.set_mapped_defects(defects);

        let root_address = variant.root_dir_offset();
        let result = new_catalogue::read_new_catalogue(
            sector_buffer,
            root_address,
            variant.sector_size(),
            &disc_map,
            root_address,
            log,
        );

        Ok((record.disc_name, result.name, result.entries))
    }

    /// The disc's name: the disc record's name for E-format discs, or
    /// the root directory's title for old-catalogue discs.
    pub fn disc_name(&self) -> &str {
        &self.disc_name
    }

    /// The root directory's own catalogue name (typically `"$"`).
    pub fn root_name(&self) -> &str {
        &self.root_name
    }

    /// The reconstructed file tree, rooted at the root directory.
    pub fn files(&self) -> &Node {
        &self.root
    }

    /// The disc's variant, as determined by the Format Identifier.
    pub fn variant(&self) -> ImageVariant {
        self.variant
    }

    /// The diagnostic log accumulated while parsing. Empty unless the
    /// disc was opened with `verify` set.
    pub fn log(&self, verbose: bool) -> Vec<&LogEntry> {
        self.log.filtered(verbose)
    }

    /// Render the diagnostic log the way the `verify` subcommand does:
    /// filtered entries plus a mapped-defect summary line.
    pub fn pretty_log(&self, verbose: bool) -> String {
        self.log.pretty(verbose)
    }

    /// Render a preorder listing of every file in the tree
    /// (`spec.md` §4.8): one `<path>.<name>\t...` line per file.
    pub fn print_catalogue(&self, filetypes: bool) -> String {
        let mut out = String::new();
        if let Node::Dir { entries, .. } = &self.root {
            for entry in entries {
                Self::print_catalogue_node(entry, "$", filetypes, &mut out);
            }
        }
        out
    }

    fn print_catalogue_node(node: &Node, path: &str, filetypes: bool, out: &mut String) {
        match node {
            Node::File {
                name,
                load,
                exec,
                length,
                ..
            } => {
                if filetypes {
                    out.push_str(&format!(
                        "{}.{}\t{:X}\t{:X}\n",
                        path,
                        name,
                        node.filetype().unwrap_or(0),
                        length
                    ));
                } else {
                    out.push_str(&format!("{}.{}\t{:X}\t{:X}\t{:X}\n", path, name, load, exec, length));
                }
            }
            Node::Dir { name, entries, .. } => {
                let child_path = format!("{}.{}", path, name);
                for entry in entries {
                    Self::print_catalogue_node(entry, &child_path, filetypes, out);
                }
            }
        }
    }

    /// Extract the whole tree to `out_path` (`spec.md` §6).
    pub fn extract_files(
        &self,
        out_path: &Path,
        filetypes: bool,
        separator: char,
        convert_dict: &HashMap<char, char>,
    ) -> Vec<LogEntry> {
        let mut extraction_log = DiagnosticLog::new(true);
        extract::extract_files(&self.root, out_path, filetypes, separator, convert_dict, &mut extraction_log);
        extraction_log.entries().to_vec()
    }
}
