//! Value converters for stowage.
//!
//! A store never interprets the bytes it persists. It hands typed values to a
//! [`Converter`] together with a [`TypeTag`] and writes whatever bytes come
//! back. The tag tells the converter whether it is handling a single value or
//! a list of values, so a one-element list is never confused with a scalar.
//!
//! # Converters
//!
//! - [`JsonConverter`]: human-readable JSON via `serde_json`
//! - [`BincodeConverter`]: compact binary via `bincode`
//!
//! Neither ever produces an empty buffer, so a zero-length store file
//! always means "no value".

pub mod binary;
pub mod error;
pub mod json;
pub mod tag;
pub mod traits;

pub use binary::BincodeConverter;
pub use error::{BoxError, ConvertError, ConvertResult};
pub use json::JsonConverter;
pub use tag::TypeTag;
pub use traits::Converter;
