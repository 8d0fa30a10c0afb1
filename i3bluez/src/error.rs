use thiserror::Error;

/// Everything that can stop the bar stream.
///
/// Bad lines from the status command never show up here: they are replaced
/// by an error segment in the feed and the stream keeps going.
#[derive(Debug, Error)]
pub enum BarError {
    #[error("failed to start status command {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },

    #[error("status command {0} has no stdout pipe")]
    NoStdout(String),

    #[error("status command closed its output")]
    FeedClosed,

    #[error("status feed task failed: {0}")]
    FeedTask(String),

    #[error("bus call {method} on {path} failed: {source}")]
    Bus {
        method: &'static str,
        path: String,
        #[source]
        source: dbus::Error,
    },

    #[error("invalid bus name {0:?}")]
    BusName(String),

    #[error("bus connection lost: {0}")]
    BusLost(String),

    #[error("device {device} has no {key} property")]
    MissingProperty { device: String, key: &'static str },

    #[error("device {device} property {key} is not a {expected}")]
    PropertyType {
        device: String,
        key: &'static str,
        expected: &'static str,
    },

    #[error("failed to encode frame: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("failed to write to stdout: {0}")]
    Output(#[from] std::io::Error),

    #[error("invalid settings file {path}: {source}")]
    Settings {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

pub type Result<T> = std::result::Result<T, BarError>;
