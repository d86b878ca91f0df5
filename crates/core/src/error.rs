use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("missing configuration: {0} is not set")]
    Missing(&'static str),

    #[error("invalid configuration: {key}={value}")]
    Invalid { key: &'static str, value: String },
}
