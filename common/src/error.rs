use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("report body too short ({len} bytes, need at least {min})")]
    TooShort { len: usize, min: usize },
    #[error("report body is not valid percent-encoded utf-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("malformed report xml: {0}")]
    Xml(#[from] roxmltree::Error),
    #[error("command payload too large ({len} bytes, limit {max})")]
    OversizedPayload { len: usize, max: usize },
    #[error("command payload is not utf-8: {0}")]
    PayloadEncoding(#[from] std::str::Utf8Error),
    #[error("failed to render document: {0}")]
    Render(#[from] std::io::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    /// Config was requested before the field was seeded by a status report
    /// or set by a command.
    #[error("desired configuration has no value for `{0}` yet")]
    MissingDesiredField(&'static str),
    #[error("setpoint payload `{0}` is not a number")]
    InvalidSetpoint(String),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("required environment variable {0} is not set")]
    Missing(&'static str),
    #[error("environment variable {key} has invalid value `{value}`")]
    Invalid { key: &'static str, value: String },
}
