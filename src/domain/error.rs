// Error types shared across layers

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AlertError {
    #[error("Alert id already present in store: {0}")]
    DuplicateId(String),

    #[error("Alert for plant {actual} cannot be stored for plant {expected}")]
    PlantMismatch { expected: String, actual: String },
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error for key {key}: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Storage backend unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {quantity} band for plant {plant_id}: min {min} must be below max {max}")]
    InvalidBand {
        plant_id: String,
        quantity: String,
        min: f64,
        max: f64,
    },

    #[error("Duplicate plant id: {0}")]
    DuplicatePlant(String),

    #[error("No plants configured")]
    NoPlants,

    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),

    #[error("Critical delta for {0} must be a non-negative number")]
    InvalidCriticalDelta(&'static str),

    #[error("Unknown alert type in message overrides: {0}")]
    UnknownAlertType(String),
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum MonitorError {
    #[error("Unknown plant: {0}")]
    UnknownPlant(String),

    #[error("Alert monitor is not running")]
    Unavailable,

    #[error(transparent)]
    Alert(#[from] AlertError),
}
