use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{ConvertError, ConvertResult};
use crate::tag::TypeTag;
use crate::traits::Converter;

/// Leading byte of every bincode blob. Zero-sized values such as `()`
/// encode to no bytes at all, and the marker keeps them distinct from an
/// empty file.
const FORMAT_MARKER: u8 = 0xB1;

/// Compact binary converter backed by `bincode`.
///
/// Output is a one-byte format marker followed by the bincode encoding,
/// so it is never empty.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeConverter;

impl Converter for BincodeConverter {
    fn serialize<T>(&self, value: &T, tag: &TypeTag) -> ConvertResult<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        let size = bincode::serialized_size(value).map_err(|e| ConvertError::serialize(tag, e))?;
        let mut out = Vec::with_capacity(1 + size as usize);
        out.push(FORMAT_MARKER);
        bincode::serialize_into(&mut out, value).map_err(|e| ConvertError::serialize(tag, e))?;
        Ok(out)
    }

    fn deserialize<T>(&self, bytes: &[u8], tag: &TypeTag) -> ConvertResult<T>
    where
        T: DeserializeOwned,
    {
        match bytes.split_first() {
            Some((&FORMAT_MARKER, body)) => {
                bincode::deserialize(body).map_err(|e| ConvertError::deserialize(tag, e))
            }
            Some((&other, _)) => Err(ConvertError::deserialize(
                tag,
                format!("unknown format marker {other:#04x}"),
            )),
            None => Err(ConvertError::deserialize(tag, "empty input")),
        }
    }
}
