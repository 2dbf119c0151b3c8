use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::error::{ConvertError, ConvertResult};
use crate::tag::TypeTag;
use crate::traits::Converter;

/// JSON converter backed by `serde_json`.
///
/// Every document round-trips, `null` included. List tags require a
/// top-level JSON array.
#[derive(Clone, Debug, Default)]
pub struct JsonConverter {
    pretty: bool,
}

impl JsonConverter {
    /// Compact single-line output.
    pub fn new() -> Self {
        Self { pretty: false }
    }

    /// Indented, human-friendly output.
    pub fn pretty() -> Self {
        Self { pretty: true }
    }

    pub fn is_pretty(&self) -> bool {
        self.pretty
    }
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Converter for JsonConverter {
    fn serialize<T>(&self, value: &T, tag: &TypeTag) -> ConvertResult<Vec<u8>>
    where
        T: Serialize + ?Sized,
    {
        let encoded = if self.pretty {
            serde_json::to_vec_pretty(value)
        } else {
            serde_json::to_vec(value)
        };
        encoded.map_err(|e| ConvertError::serialize(tag, e))
    }

    fn deserialize<T>(&self, bytes: &[u8], tag: &TypeTag) -> ConvertResult<T>
    where
        T: DeserializeOwned,
    {
        let value: Value =
            serde_json::from_slice(bytes).map_err(|e| ConvertError::deserialize(tag, e))?;

        if tag.is_list() && !value.is_array() {
            return Err(ConvertError::ShapeMismatch {
                tag: tag.clone(),
                found: describe(&value).to_string(),
            });
        }

        serde_json::from_value(value).map_err(|e| ConvertError::deserialize(tag, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Dino {
        name: String,
        arm_length: u32,
    }

    fn rex() -> Dino {
        Dino {
            name: "Rex".into(),
            arm_length: 4,
        }
    }

    #[test]
    fn value_roundtrip() {
        let conv = JsonConverter::new();
        let tag = TypeTag::value::<Dino>();
        let bytes = conv.serialize(&rex(), &tag).unwrap();
        let back: Dino = conv.deserialize(&bytes, &tag).unwrap();
        assert_eq!(back, rex());
    }

    #[test]
    fn pretty_output_is_multiline() {
        let conv = JsonConverter::pretty();
        let bytes = conv.serialize(&rex(), &TypeTag::value::<Dino>()).unwrap();
        assert!(bytes.contains(&b'\n'));
        assert!(conv.is_pretty());
    }

    #[test]
    fn none_and_unit_roundtrip() {
        let conv = JsonConverter::new();

        let tag = TypeTag::value::<Option<u32>>();
        let bytes = conv.serialize(&None::<u32>, &tag).unwrap();
        assert_eq!(bytes, b"null");
        assert_eq!(conv.deserialize::<Option<u32>>(&bytes, &tag).unwrap(), None);

        let tag = TypeTag::value::<()>();
        let bytes = conv.serialize(&(), &tag).unwrap();
        assert!(!bytes.is_empty());
        conv.deserialize::<()>(&bytes, &tag).unwrap();
    }

    #[test]
    fn null_is_a_value() {
        let conv = JsonConverter::new();
        let tag = TypeTag::value::<Value>();
        assert_eq!(conv.deserialize::<Value>(b"null", &tag).unwrap(), Value::Null);
    }

    #[test]
    fn blank_input_is_malformed() {
        let conv = JsonConverter::new();
        let err = conv
            .deserialize::<Dino>(b"  \n", &TypeTag::value::<Dino>())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Deserialize { .. }));
    }

    #[test]
    fn malformed_bytes_fail() {
        let conv = JsonConverter::new();
        let err = conv
            .deserialize::<Dino>(b"{not json", &TypeTag::value::<Dino>())
            .unwrap_err();
        match err {
            ConvertError::Deserialize { source, .. } => {
                assert!(source.downcast_ref::<serde_json::Error>().is_some());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn wrong_fields_fail() {
        let conv = JsonConverter::new();
        let err = conv
            .deserialize::<Dino>(br#"{"name": 3}"#, &TypeTag::value::<Dino>())
            .unwrap_err();
        assert!(matches!(err, ConvertError::Deserialize { .. }));
    }

    #[test]
    fn list_tag_rejects_scalar_blob() {
        let conv = JsonConverter::new();
        let bytes = conv.serialize(&rex(), &TypeTag::value::<Dino>()).unwrap();
        let err = conv
            .deserialize::<Vec<Dino>>(&bytes, &TypeTag::list_of::<Dino>())
            .unwrap_err();
        match err {
            ConvertError::ShapeMismatch { found, .. } => assert_eq!(found, "object"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn single_element_list_stays_a_list() {
        let conv = JsonConverter::new();
        let tag = TypeTag::list_of::<Dino>();
        let bytes = conv.serialize(&vec![rex()], &tag).unwrap();
        assert_eq!(bytes.first(), Some(&b'['));
        let back: Vec<Dino> = conv.deserialize(&bytes, &tag).unwrap();
        assert_eq!(back, vec![rex()]);
    }
}
