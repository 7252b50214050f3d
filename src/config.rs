//! Host-facing configuration (spec.md §6): `search_paths`, `profile_level`
//! and `profile_output_prefix`. Reading and writing the TOML round trip is
//! grounded in the teacher's own `Config::read`/`Config::write` (this
//! crate's equivalent of its engine settings file), adapted to resolve the
//! platform config directory through `directories::ProjectDirs` rather than
//! the teacher's unmaintained `app_dirs` lookup.

use {
    directories::ProjectDirs,
    serde::{Deserialize, Serialize},
    std::{
        fs::{create_dir_all, read_to_string, File},
        io::{Error as IoError, ErrorKind, Write},
        path::PathBuf,
    },
};

/// Profiling verbosity. Named sinks that actually consume this level are
/// out of scope for the core (spec.md §1); the verbosity knob itself is an
/// ambient concern the executor always honors (spec.md §4.6 [ADDED]).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProfileLevel {
    #[default]
    None,
    Minimal,
    Full,
}

fn get_config_root() -> Result<PathBuf, IoError> {
    ProjectDirs::from("core", "dflow", "dflow")
        .map(|dirs| dirs.config_dir().to_path_buf())
        .ok_or_else(|| IoError::new(ErrorKind::NotFound, "no valid config directory for this platform"))
}

fn get_config_path() -> Result<PathBuf, IoError> {
    Ok(get_config_root()?.join("dflow-core.toml"))
}

/// The three documented options (spec.md §6), plus their TOML round trip.
/// The core does not dictate *where* a host program stores this file, only
/// *how* the three fields serialize.
pub struct Config {
    data: Data,
}

#[derive(Default, Deserialize, Serialize)]
struct Data {
    search_paths: Option<Vec<String>>,
    profile_level: Option<ProfileLevel>,
    profile_output_prefix: Option<String>,
}

impl Config {
    /// Reads the config file from the platform config directory, creating
    /// one with defaults if it does not exist yet — mirroring the teacher's
    /// `Config::read`.
    pub fn read() -> Result<Self, IoError> {
        let config_path = get_config_path()?;

        Ok(if config_path.exists() {
            let config_file = read_to_string(&config_path).unwrap_or_else(|_| {
                log::warn!("config file read error, falling back to defaults");
                String::new()
            });
            Self {
                data: toml::from_str(&config_file).unwrap_or_default(),
            }
        } else {
            log::info!("config file not found, creating one with defaults");
            let res = Self {
                data: Data::default(),
            };
            res.write()?;
            res
        })
    }

    /// Where the plugin loader should look for task plugins by name. The
    /// core does not interpret this; it is consumed entirely by the
    /// (out-of-scope) plugin loader.
    pub fn search_paths(&self) -> &[String] {
        self.data.search_paths.as_deref().unwrap_or(&[])
    }

    pub fn set_search_paths(&mut self, paths: Vec<String>) {
        self.data.search_paths = Some(paths);
    }

    /// Defaults to [`ProfileLevel::None`].
    pub fn profile_level(&self) -> ProfileLevel {
        self.data.profile_level.unwrap_or_default()
    }

    pub fn set_profile_level(&mut self, level: ProfileLevel) {
        self.data.profile_level = Some(level);
    }

    /// File prefix profiling output should be written under; `None` means
    /// stdout.
    pub fn profile_output_prefix(&self) -> Option<&str> {
        self.data.profile_output_prefix.as_deref()
    }

    pub fn set_profile_output_prefix(&mut self, prefix: Option<String>) {
        self.data.profile_output_prefix = prefix;
    }

    pub fn write(&self) -> Result<(), IoError> {
        let config_root = get_config_root()?;

        if !config_root.exists() {
            create_dir_all(&config_root)?;
        }

        let config_path = get_config_path()?;
        let mut config_file = File::create(&config_path)?;

        let toml = toml::to_string_pretty(&self.data)
            .map_err(|_| IoError::from(ErrorKind::Other))?;

        config_file.write_all(toml.as_bytes())?;

        Ok(())
    }
}
