use thiserror::Error;

/// Errors raised while configuring or running the drought model.
#[derive(Error, Debug)]
pub enum DroughtError {
    #[error("field capacity {field_capacity} must exceed wilting point {wilting_point} (site row {row}, column {column})")]
    InvalidSoil {
        row: u32,
        column: u32,
        field_capacity: f64,
        wilting_point: f64,
    },
    #[error("unknown species '{0}'")]
    UnknownSpecies(String),
    #[error("unknown ecoregion '{0}'")]
    UnknownEcoregion(String),
    #[error("no climate record for ecoregion {ecoregion} in year {year}")]
    MissingClimate { ecoregion: usize, year: i32 },
    #[error("spin-up climate table is empty")]
    EmptySpinupClimate,
    #[error("unknown template variable '{{{variable}}}' in '{template}'; expected {{species}} or {{timestep}}")]
    UnknownTemplateVariable { template: String, variable: String },
    #[error("unterminated template variable in '{0}'")]
    UnterminatedTemplateVariable(String),
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience type for `Result<T, DroughtError>`.
pub type DroughtResult<T> = Result<T, DroughtError>;

impl From<toml::de::Error> for DroughtError {
    fn from(value: toml::de::Error) -> Self {
        DroughtError::Config(value.to_string())
    }
}
