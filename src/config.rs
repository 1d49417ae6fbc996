//! Configuration for the adfsdisc crate
#![warn(missing_docs)]
#![warn(unsafe_code)]

use std::collections::HashMap;

use crate::error;

/// Configuration format
pub struct Config {
    /// Version of the configuration root
    pub version: String,

    /// The general settings
    pub settings: config::Config,

    /// Per-character filename conversion applied during extraction
    /// (`spec.md` §6). Defaults to mapping `/` to `.`, since `/` is
    /// a valid ADFS name character but a path separator on the host.
    pub convert_dict: HashMap<char, char>,
}

/// Trait that defines a set of methods that allow loading and
/// unloading configuration data
pub trait Configuration {
    /// Load the configuration data from the default configuration
    /// string
    fn load(settings: config::Config) -> std::result::Result<Config, error::Error>;
}

impl Configuration for Config {
    fn load(settings: config::Config) -> std::result::Result<Config, error::Error> {
        let config = Config {
            version: String::from("0.1.0"),
            settings,
            convert_dict: default_convert_dict(),
        };

        Ok(config)
    }
}

/// The default filename conversion table: `/` (a legal ADFS name
/// character) becomes `.` on extraction, since `/` is reserved for
/// directory separation on POSIX and Windows hosts.
pub fn default_convert_dict() -> HashMap<char, char> {
    let mut map = HashMap::new();
    map.insert('/', '.');
    map
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_maps_slash_to_dot() {
        let config = Config::load(config::Config::default()).unwrap();
        assert_eq!(config.convert_dict.get(&'/'), Some(&'.'));
    }
}
