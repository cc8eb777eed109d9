use crate::errors::Error;
use config::builder::{ConfigBuilder, DefaultState};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use tracing::debug;

const CONFIG_FILE: &str = "tilelog";

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub log_file: PathBuf,
    /// Extension of rendered tile requests
    pub tile_type: String,
    pub ascii_zoom: u32,
    /// Side of the heatmap basemap in pixels
    pub heatmap_size: u32,
    /// Layergroup to report on; a random one when unset
    pub layergroup: Option<String>,
    /// Source to trace; a random one when unset
    pub ip_address: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_file: "tiles.log".into(),
            tile_type: "png".to_owned(),
            ascii_zoom: 3,
            heatmap_size: 1024,
            layergroup: None,
            ip_address: None,
        }
    }
}

impl Settings {
    /// Reads `tilelog.toml` (if present) and `TILELOG_*` environment
    /// variables, the latter taking precedence.
    #[tracing::instrument]
    pub fn load() -> Result<Settings, Error> {
        Settings::from_builder(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix("tilelog")),
        )
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Settings, Error> {
        let settings: Settings = builder.build()?.try_deserialize()?;
        debug!(?settings, "Loaded settings");
        Ok(settings)
    }
}

#[cfg(test)]
mod tests {
    use super::Settings;
    use crate::Error;
    use config::{Config, File, FileFormat};
    use pretty_assertions::assert_eq;

    fn from_toml(toml: &str) -> Result<Settings, Error> {
        Settings::from_builder(Config::builder().add_source(File::from_str(toml, FileFormat::Toml)))
    }

    #[test]
    fn empty_source_gives_defaults() {
        let settings = Settings::from_builder(Config::builder()).unwrap();
        assert_eq!(Settings::default(), settings);
    }

    #[test]
    fn overrides_from_toml() {
        let settings = from_toml(
            "log_file = \"/var/log/tiles.log\"\nascii_zoom = 2\nlayergroup = \"0123abcd\"",
        )
        .unwrap();
        assert_eq!(
            Settings {
                log_file: "/var/log/tiles.log".into(),
                ascii_zoom: 2,
                layergroup: Some("0123abcd".to_owned()),
                ..Settings::default()
            },
            settings
        );
    }

    #[test]
    fn mistyped_value_is_config_error() {
        let result = from_toml("ascii_zoom = \"many\"");
        assert!(matches!(result, Err(Error::ConfigError(_))));
    }
}
