#![warn(missing_docs)]
#![warn(unsafe_code)]
//! Command-line front end for reading and extracting ADFS disc images.
//! Usage: `adfsdisc list --input FILENAME` or
//! `adfsdisc extract --input FILENAME --output DIR`.
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::exit;

use clap::{Parser, Subcommand};
use config::Config as Settings;
use log::{error, info};

use adfsdisc::config::{default_convert_dict, Config, Configuration};
use adfsdisc::disc::Disc;

/// Command line arguments for the ADFS disc reader.
#[derive(Parser, Debug)]
#[clap(about, version, author)]
struct Args {
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List every file in the disc image.
    List {
        /// Path to the disc image.
        #[clap(short, long)]
        input: String,
        /// Interpret load addresses as RISC OS filetypes when printing.
        #[clap(short = 't', long)]
        filetypes: bool,
        /// Report the diagnostic log as each entry is discovered.
        #[clap(short, long)]
        verify: bool,
    },
    /// Extract every file in the disc image to a host directory.
    Extract {
        /// Path to the disc image.
        #[clap(short, long)]
        input: String,
        /// Destination directory.
        #[clap(short, long)]
        output: String,
        /// Write filetyped names instead of raw bytes + INF side-cars.
        #[clap(short = 't', long)]
        filetypes: bool,
        /// Separator character placed before `inf`/the filetype suffix.
        #[clap(short, long, default_value = ".")]
        separator: char,
        /// Extract into a subdirectory named after the disc.
        #[clap(short, long)]
        directory: bool,
        /// Filename-character conversions, `<src><dst>[,<src><dst>]...`.
        #[clap(short, long)]
        convert: Option<String>,
        /// Report the diagnostic log produced while parsing.
        #[clap(short, long)]
        verify: bool,
    },
    /// Parse the disc image and print its diagnostic log.
    Verify {
        /// Path to the disc image.
        #[clap(short, long)]
        input: String,
        /// Include informational entries, not just warnings and errors.
        #[clap(long)]
        verbose: bool,
    },
}

fn open_file(filename: &str) -> Vec<u8> {
    let path = Path::new(filename);

    let mut file = match File::open(path) {
        Err(why) => {
            error!("Couldn't open {}: {}", path.display(), why);
            exit(1);
        }
        Ok(file) => file,
    };

    let mut data = Vec::new();
    match file.read_to_end(&mut data) {
        Err(why) => {
            error!("Error reading file: {}", why);
            exit(1);
        }
        Ok(n) => info!("Read {}: {} bytes", path.display(), n),
    }

    data
}

fn load_settings(config_name: &str) -> Result<Settings, config::ConfigError> {
    Settings::builder()
        .add_source(config::File::with_name(config_name).required(false))
        .add_source(config::Environment::with_prefix("ADFSDISC"))
        .build()
}

/// Parse a conversion-list flag of the form `<src><dst>[,<src><dst>]...`
/// into a character-to-character map, merged over the default table.
fn parse_convert_dict(spec: &str) -> HashMap<char, char> {
    let mut dict = default_convert_dict();
    for pair in spec.split(',') {
        let mut chars = pair.chars();
        match (chars.next(), chars.next(), chars.next()) {
            (Some(src), Some(dst), None) => {
                dict.insert(src, dst);
            }
            _ => {
                error!("Ignoring malformed conversion entry: {:?}", pair);
            }
        }
    }
    dict
}

fn main() {
    if let Err(e) = env_logger::try_init() {
        panic!("couldn't initialize logger: {:?}", e);
    }

    adfsdisc::init();

    let settings = match load_settings("config/adfsdisc.toml") {
        Ok(settings) => settings,
        Err(e) => {
            error!("error loading config: {:?}", e);
            Settings::default()
        }
    };
    let _config = Config::load(settings).unwrap_or_else(|e| {
        error!("error building configuration: {}", e);
        exit(1);
    });

    let args = Args::parse();

    match args.command {
        Command::List {
            input,
            filetypes,
            verify,
        } => {
            let data = open_file(&input);
            let disc = open_disc(&data, verify);
            print!("{}", disc.print_catalogue(filetypes));
        }
        Command::Extract {
            input,
            output,
            filetypes,
            separator,
            directory,
            convert,
            verify,
        } => {
            let data = open_file(&input);
            let disc = open_disc(&data, verify);

            let mut out_path = PathBuf::from(&output);
            if directory {
                out_path.push(disc.disc_name());
            }

            let convert_dict = convert
                .as_deref()
                .map(parse_convert_dict)
                .unwrap_or_else(default_convert_dict);

            let extraction_log = disc.extract_files(&out_path, filetypes, separator, &convert_dict);
            for entry in &extraction_log {
                error!("{}", entry);
            }
        }
        Command::Verify { input, verbose } => {
            let data = open_file(&input);
            let disc = open_disc(&data, true);
            print!("{}", disc.pretty_log(verbose));
        }
    }
}

fn open_disc(data: &[u8], verify: bool) -> Disc {
    match Disc::open(data, verify) {
        Ok(disc) => disc,
        Err(e) => {
            error!("{}", e);
            exit(1);
        }
    }
}
