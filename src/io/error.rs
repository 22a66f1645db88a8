use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O operation failed: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("failed to parse {what} TOML: {source}")]
    Parse {
        what: &'static str,
        #[source]
        source: toml::de::Error,
    },

    #[error("unknown force field '{name}' (available: {})", .available.join(", "))]
    UnknownForcefield {
        name: String,
        available: Vec<String>,
    },

    #[error("invalid force field definition: {0}")]
    Forcefield(#[from] crate::forcefield::Error),

    #[error("invalid force field definition: {0}")]
    InvalidDefinition(String),

    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}

impl Error {
    pub fn parse(what: &'static str, source: toml::de::Error) -> Self {
        Self::Parse { what, source }
    }

    pub fn invalid_definition(details: impl Into<String>) -> Self {
        Self::InvalidDefinition(details.into())
    }
}
