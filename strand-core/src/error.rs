//! Schema-level error taxonomy.
//!
//! Every variant that reports a malformed specification carries the track
//! index and channel name, so callers can point at the offending part of
//! the document. Validation is all-or-nothing: a `SchemaError` means no
//! compiled state was touched.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("specification is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("track {track}: unknown channel `{channel}`")]
    UnknownChannel { track: usize, channel: String },

    #[error("track {track}: channel `{channel}` must set exactly one of `value` or `attribute`")]
    ValueXorAttribute { track: usize, channel: &'static str },

    #[error("track {track}: position channel `{channel}` must be data-bound, not a constant")]
    ConstantPosition { track: usize, channel: &'static str },

    #[error("track {track}: channel `{channel}` has no default and was not given")]
    MissingChannel { track: usize, channel: &'static str },

    #[error("track {track}: channel `{channel}` is data-bound but has no domain")]
    MissingDomain { track: usize, channel: &'static str },

    #[error("track {track}: channel `{channel}` domain does not fit its scale type")]
    DomainMismatch { track: usize, channel: &'static str },

    #[error("track {track}: no `data` source and the document has no `defaultData`")]
    MissingData { track: usize },

    #[error("track {track}: channel `{channel}`: unrecognized color `{value}`")]
    BadColor {
        track: usize,
        channel: &'static str,
        value: String,
    },

    #[error("track {track}: channel `{channel}`: `value` must be a number or a color string")]
    BadValue { track: usize, channel: &'static str },
}
