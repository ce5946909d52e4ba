//! Zarr V2 metadata documents.
//!
//! The metadata of an array is stored in a `.zarray` JSON document with exactly the keys
//! `chunks`, `compression`, `compression_opts`, `dtype`, `fill_value`, `order`, `shape`, and
//! `zarr_format`. A group is marked by a `.zgroup` document containing exactly
//! `{"zarr_format": 2}`. User attributes live in a sibling `.zattrs` document holding an
//! arbitrary JSON object.
//!
//! An example `.zarray` document:
//! ```json
//! {
//!   "chunks": [1000, 1000],
//!   "compression": "blosc",
//!   "compression_opts": {"clevel": 5, "cname": "lz4", "shuffle": 1},
//!   "dtype": "<f8",
//!   "fill_value": "NaN",
//!   "order": "C",
//!   "shape": [10000, 10000],
//!   "zarr_format": 2
//! }
//! ```
//!
//! Documents are serialised with sorted keys, two space indentation, and `\n` line endings so
//! that stored metadata is reproducible. Any valid JSON layout is accepted when reading.

use derive_more::{derive::From, Display};
use serde::{Deserialize, Serialize};

/// Zarr V2 array metadata (the `.zarray` document).
///
/// All eight keys are required; unknown keys are rejected. The fields are declared in
/// alphabetical order so that serialisation emits sorted keys.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadata {
    /// A list of integers defining the length of each dimension of a chunk of the array.
    pub chunks: Vec<u64>,
    /// The name of the primary compression codec, or null for no compression.
    #[serde(deserialize_with = "deserialize_compression")]
    pub compression: Option<String>,
    /// Configuration of the compression codec, opaque to this crate and interpreted by the codec.
    pub compression_opts: serde_json::Value,
    /// The data type of the array.
    pub dtype: DataTypeMetadata,
    /// A scalar value providing the default value to use for uninitialised portions of the
    /// array, or null if undefined.
    pub fill_value: FillValueMetadata,
    /// Either `C` or `F`, defining the layout of elements within each chunk of the array.
    pub order: ArrayOrder,
    /// An array of integers providing the length of each dimension of the array.
    pub shape: Vec<u64>,
    /// An integer defining the version of the storage specification to which the array adheres.
    /// Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
}

// An `Option` field is implicitly defaulted by serde; routing through an explicit deserialiser
// makes a missing `compression` key an error while still accepting JSON null.
fn deserialize_compression<'de, D: serde::Deserializer<'de>>(
    d: D,
) -> Result<Option<String>, D::Error> {
    Option::<String>::deserialize(d)
}

impl ArrayMetadata {
    /// Create Zarr V2 array metadata.
    ///
    /// Defaults to C order, no compression, and an undefined fill value.
    #[must_use]
    pub fn new(shape: Vec<u64>, chunks: Vec<u64>, dtype: DataTypeMetadata) -> Self {
        Self {
            chunks,
            compression: None,
            compression_opts: serde_json::Value::Null,
            dtype,
            fill_value: FillValueMetadata::Null,
            order: ArrayOrder::C,
            shape,
            zarr_format: monostate::MustBe!(2u64),
        }
    }

    /// Set the compression codec name and configuration.
    #[must_use]
    pub fn with_compression(
        mut self,
        compression: Option<String>,
        compression_opts: serde_json::Value,
    ) -> Self {
        self.compression = compression;
        self.compression_opts = compression_opts;
        self
    }

    /// Set the fill value.
    #[must_use]
    pub fn with_fill_value(mut self, fill_value: FillValueMetadata) -> Self {
        self.fill_value = fill_value;
        self
    }

    /// Set the order.
    #[must_use]
    pub fn with_order(mut self, order: ArrayOrder) -> Self {
        self.order = order;
        self
    }
}

/// Zarr V2 group metadata (the `.zgroup` document).
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug, Default, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct GroupMetadata {
    /// An integer defining the version of the storage specification to which the group adheres.
    /// Must be `2`.
    pub zarr_format: monostate::MustBe!(2u64),
}

/// Zarr V2 data type metadata.
///
/// Either a simple type string such as `<f8`, or a structured record: a list of
/// `[field_name, dtype]` pairs.
#[derive(Serialize, Deserialize, Clone, PartialEq, Eq, Debug, From)]
#[serde(untagged)]
pub enum DataTypeMetadata {
    /// A simple data type string.
    #[from(String, &str)]
    Simple(String),
    /// A structured data type.
    Structured(Vec<(String, String)>),
}

/// Zarr V2 array element order metadata. Indicates the layout of elements within a chunk.
#[derive(Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Debug)]
pub enum ArrayOrder {
    /// Row-major order. The last dimension varies fastest.
    C,
    /// Column-major order. The first dimension varies fastest.
    F,
}

/// Zarr V2 fill value metadata.
///
/// Provides the default value to use for uninitialised portions of the array, or null if
/// undefined. The IEEE-754 specials of floating point data types are represented by the exact
/// strings `"NaN"`, `"Infinity"`, and `"-Infinity"`; these sentinels are only interpreted in
/// fill value position, not in attributes or codec configuration.
#[derive(Clone, PartialEq, Debug)]
pub enum FillValueMetadata {
    /// No fill value.
    Null,
    /// A boolean.
    Bool(bool),
    /// A number.
    Number(serde_json::Number),
    /// NaN (not-a-number).
    NaN,
    /// Positive infinity.
    Infinity,
    /// Negative infinity.
    NegInfinity,
    /// A string (a base64 payload for byte string data types).
    String(String),
    /// A structured record fill value, keyed by field name.
    Object(serde_json::Map<String, serde_json::Value>),
}

impl<'de> serde::Deserialize<'de> for FillValueMetadata {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum FillValueMetadataType {
            Bool(bool),
            Number(serde_json::Number),
            String(String),
            Object(serde_json::Map<String, serde_json::Value>),
            Null,
        }
        let fill_value = FillValueMetadataType::deserialize(d)?;
        match fill_value {
            FillValueMetadataType::Bool(bool) => Ok(Self::Bool(bool)),
            FillValueMetadataType::Number(number) => Ok(Self::Number(number)),
            FillValueMetadataType::String(string) => match string.as_str() {
                "NaN" => Ok(Self::NaN),
                "Infinity" => Ok(Self::Infinity),
                "-Infinity" => Ok(Self::NegInfinity),
                _ => Ok(Self::String(string)),
            },
            FillValueMetadataType::Object(object) => Ok(Self::Object(object)),
            FillValueMetadataType::Null => Ok(Self::Null),
        }
    }
}

impl Serialize for FillValueMetadata {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(bool) => serializer.serialize_bool(*bool),
            Self::Number(number) => number.serialize(serializer),
            Self::NaN => serializer.serialize_str("NaN"),
            Self::Infinity => serializer.serialize_str("Infinity"),
            Self::NegInfinity => serializer.serialize_str("-Infinity"),
            Self::String(string) => string.serialize(serializer),
            Self::Object(object) => object.serialize(serializer),
        }
    }
}

/// Serialise a metadata document in the stable on-disk form.
///
/// Two space indentation, `\n` line endings, and a trailing newline. Key order follows the
/// document structure declarations, which are sorted.
///
/// # Errors
/// Returns a [`serde_json::Error`] if the document cannot be serialised.
pub fn to_document_bytes<T: Serialize>(document: &T) -> Result<Vec<u8>, serde_json::Error> {
    let mut bytes = serde_json::to_vec_pretty(document)?;
    bytes.push(b'\n');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn array_metadata_round_trip() {
        let json = r#"{
            "chunks": [1000, 1000],
            "compression": "blosc",
            "compression_opts": {"clevel": 5, "cname": "lz4", "shuffle": 1},
            "dtype": "<f8",
            "fill_value": "NaN",
            "order": "C",
            "shape": [10000, 10000],
            "zarr_format": 2
        }"#;
        let metadata: ArrayMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.shape, vec![10000, 10000]);
        assert_eq!(metadata.chunks, vec![1000, 1000]);
        assert_eq!(metadata.compression.as_deref(), Some("blosc"));
        assert_eq!(metadata.fill_value, FillValueMetadata::NaN);
        assert_eq!(metadata.order, ArrayOrder::C);

        let serialized = serde_json::to_string(&metadata).unwrap();
        let reparsed: ArrayMetadata = serde_json::from_str(&serialized).unwrap();
        assert_eq!(reparsed, metadata);
        assert!(serialized.contains("\"NaN\""));
    }

    #[test]
    fn array_metadata_strict_keys() {
        // Missing compression.
        let json = r#"{
            "chunks": [2],
            "compression_opts": null,
            "dtype": "<i4",
            "fill_value": 0,
            "order": "C",
            "shape": [4],
            "zarr_format": 2
        }"#;
        assert!(serde_json::from_str::<ArrayMetadata>(json).is_err());

        // Extraneous key.
        let json = r#"{
            "chunks": [2],
            "compression": null,
            "compression_opts": null,
            "dtype": "<i4",
            "fill_value": 0,
            "filters": null,
            "order": "C",
            "shape": [4],
            "zarr_format": 2
        }"#;
        assert!(serde_json::from_str::<ArrayMetadata>(json).is_err());

        // Bad zarr_format.
        let json = r#"{
            "chunks": [2],
            "compression": null,
            "compression_opts": null,
            "dtype": "<i4",
            "fill_value": 0,
            "order": "C",
            "shape": [4],
            "zarr_format": 3
        }"#;
        assert!(serde_json::from_str::<ArrayMetadata>(json).is_err());

        // Bad order.
        let json = r#"{
            "chunks": [2],
            "compression": null,
            "compression_opts": null,
            "dtype": "<i4",
            "fill_value": 0,
            "order": "K",
            "shape": [4],
            "zarr_format": 2
        }"#;
        assert!(serde_json::from_str::<ArrayMetadata>(json).is_err());
    }

    #[test]
    fn group_metadata() {
        let metadata: GroupMetadata = serde_json::from_str(r#"{"zarr_format": 2}"#).unwrap();
        assert_eq!(metadata, GroupMetadata::default());
        assert!(serde_json::from_str::<GroupMetadata>(r#"{"zarr_format": 3}"#).is_err());
        assert!(
            serde_json::from_str::<GroupMetadata>(r#"{"zarr_format": 2, "extra": 1}"#).is_err()
        );
        assert_eq!(
            serde_json::to_string(&GroupMetadata::default()).unwrap(),
            r#"{"zarr_format":2}"#
        );
    }

    #[test]
    fn dtype_metadata() {
        let simple: DataTypeMetadata = serde_json::from_str(r#""<f8""#).unwrap();
        assert_eq!(simple, DataTypeMetadata::Simple("<f8".to_string()));

        let structured: DataTypeMetadata =
            serde_json::from_str(r#"[["a", "<i4"], ["b", "<f8"]]"#).unwrap();
        assert_eq!(
            structured,
            DataTypeMetadata::Structured(vec![
                ("a".to_string(), "<i4".to_string()),
                ("b".to_string(), "<f8".to_string())
            ])
        );
        assert_eq!(
            serde_json::to_string(&structured).unwrap(),
            r#"[["a","<i4"],["b","<f8"]]"#
        );
    }

    #[test]
    fn fill_value_metadata_specials() {
        for (json, expected) in [
            (r#""NaN""#, FillValueMetadata::NaN),
            (r#""Infinity""#, FillValueMetadata::Infinity),
            (r#""-Infinity""#, FillValueMetadata::NegInfinity),
            (r"null", FillValueMetadata::Null),
            (r"true", FillValueMetadata::Bool(true)),
        ] {
            let fill_value: FillValueMetadata = serde_json::from_str(json).unwrap();
            assert_eq!(fill_value, expected);
            assert_eq!(serde_json::to_string(&fill_value).unwrap(), json);
        }
    }

    #[test]
    fn document_bytes_stable() {
        let bytes = to_document_bytes(&GroupMetadata::default()).unwrap();
        assert_eq!(
            String::from_utf8(bytes).unwrap(),
            "{\n  \"zarr_format\": 2\n}\n"
        );
    }
}
