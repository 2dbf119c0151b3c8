use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::ConvertResult;
use crate::tag::TypeTag;

/// Converts typed values to bytes and back.
///
/// Implementations must satisfy these rules:
/// - `serialize` never returns an empty buffer. Zero bytes on disk mean
///   "no value" and are handled by the store before a converter is asked.
/// - `deserialize` returns exactly what was serialized, including values
///   such as `None`, `()` or JSON `null`, and `Err` for malformed bytes.
/// - When `tag` is [`TypeTag::ListOf`], the data is encoded as a list even
///   if it holds a single element.
pub trait Converter: Send + Sync + 'static {
    /// Encode `value`, described by `tag`.
    fn serialize<T>(&self, value: &T, tag: &TypeTag) -> ConvertResult<Vec<u8>>
    where
        T: Serialize + ?Sized;

    /// Decode bytes previously produced by [`Converter::serialize`].
    fn deserialize<T>(&self, bytes: &[u8], tag: &TypeTag) -> ConvertResult<T>
    where
        T: DeserializeOwned;
}
