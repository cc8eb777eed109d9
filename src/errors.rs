use crate::parser::ParseError;
use crate::render::RenderError;
use crate::stats::StatsError;
use derive_more::{Display, From};

#[derive(Debug, Display, From)]
pub enum Error {
    #[display(fmt = "Unable to read log: {}", _0)]
    IoError(std::io::Error),
    #[display(fmt = "{}", _0)]
    ParseError(ParseError),
    #[display(fmt = "{}", _0)]
    StatsError(StatsError),
    #[display(fmt = "{}", _0)]
    RenderError(RenderError),
    #[display(fmt = "Invalid configuration: {}", _0)]
    ConfigError(config::ConfigError),
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::IoError(err) => Some(err),
            Error::ParseError(err) => Some(err),
            Error::StatsError(err) => Some(err),
            Error::RenderError(err) => Some(err),
            Error::ConfigError(err) => Some(err),
        }
    }
}
