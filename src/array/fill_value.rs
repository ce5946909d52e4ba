//! Zarr fill values.
//!
//! A [`FillValue`] holds the binary encoding of one array element in the array's byte order.
//! It is substituted for uninitialised portions of an array, and a chunk that is entirely the
//! fill value need not be stored.
//!
//! [`fill_value_from_metadata`] and [`fill_value_to_metadata`] convert between the JSON
//! representation in `.zarray` documents and the binary encoding, driven by the array's
//! [`DataType`]. The IEEE-754 specials of floating point types map to the exact JSON strings
//! `"NaN"`, `"Infinity"`, and `"-Infinity"`.

use base64::prelude::{Engine, BASE64_STANDARD};
use thiserror::Error;

use crate::metadata::FillValueMetadata;

use super::{
    data_type::{ScalarKind, ScalarType},
    DataType, Endianness,
};

/// The fill value of an array.
///
/// Provides the binary encoding of an element value to use for uninitialised portions of an
/// array.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct FillValue(Vec<u8>);

impl core::fmt::Display for FillValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl From<Vec<u8>> for FillValue {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl From<&[u8]> for FillValue {
    fn from(value: &[u8]) -> Self {
        Self(value.to_vec())
    }
}

impl FillValue {
    /// Create a new fill value from its binary encoding.
    #[must_use]
    pub fn new(fill_value: Vec<u8>) -> Self {
        Self(fill_value)
    }

    /// Return the size in bytes of the fill value.
    #[must_use]
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Return the binary encoding of the fill value.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Check if `bytes` is entirely composed of the fill value.
    #[must_use]
    pub fn equals_all(&self, bytes: &[u8]) -> bool {
        !self.0.is_empty()
            && bytes.len() % self.0.len() == 0
            && bytes.chunks_exact(self.0.len()).all(|element| element == self.0)
    }
}

/// An incompatible fill value metadata error.
#[derive(Clone, Debug, Error)]
#[error("incompatible fill value metadata {1} for data type {0}")]
pub struct IncompatibleFillValueMetadataError(String, String);

impl IncompatibleFillValueMetadataError {
    fn new(data_type: &impl ToString, metadata: &FillValueMetadata) -> Self {
        Self(
            data_type.to_string(),
            serde_json::to_string(metadata).unwrap_or_default(),
        )
    }
}

/// An incompatible fill value error.
#[derive(Clone, Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(String, String);

impl IncompatibleFillValueError {
    fn new(data_type: &impl ToString, fill_value: &FillValue) -> Self {
        Self(data_type.to_string(), fill_value.to_string())
    }
}

/// Create a fill value from metadata.
///
/// Returns [`None`] if the fill value is undefined (JSON null).
///
/// # Errors
/// Returns [`IncompatibleFillValueMetadataError`] if the shape of the metadata does not match
/// the data type, e.g. a string where a number is expected, an out of range integer, or a
/// structured record with missing or extraneous fields.
pub fn fill_value_from_metadata(
    data_type: &DataType,
    metadata: &FillValueMetadata,
) -> Result<Option<FillValue>, IncompatibleFillValueMetadataError> {
    if matches!(metadata, FillValueMetadata::Null) {
        return Ok(None);
    }
    match data_type {
        DataType::Scalar(scalar) => Ok(Some(FillValue::new(scalar_fill_value_bytes(
            scalar, metadata,
        )?))),
        DataType::Structured(fields) => {
            let err = || IncompatibleFillValueMetadataError::new(data_type, metadata);
            let FillValueMetadata::Object(object) = metadata else {
                return Err(err());
            };
            if object.len() != fields.len() {
                return Err(err());
            }
            let mut bytes = Vec::with_capacity(data_type.item_size());
            for field in fields {
                let value = object.get(field.name()).ok_or_else(err)?;
                let field_metadata: FillValueMetadata =
                    serde_json::from_value(value.clone()).map_err(|_| err())?;
                if matches!(field_metadata, FillValueMetadata::Null) {
                    return Err(err());
                }
                bytes.extend(scalar_fill_value_bytes(field.scalar(), &field_metadata)?);
            }
            Ok(Some(FillValue::new(bytes)))
        }
    }
}

/// Convert a fill value to its metadata.
///
/// # Errors
/// Returns [`IncompatibleFillValueError`] if the size of the fill value does not match the
/// data type or its bytes do not decode as an element of the data type.
pub fn fill_value_to_metadata(
    data_type: &DataType,
    fill_value: &FillValue,
) -> Result<FillValueMetadata, IncompatibleFillValueError> {
    if fill_value.size() != data_type.item_size() {
        return Err(IncompatibleFillValueError::new(data_type, fill_value));
    }
    match data_type {
        DataType::Scalar(scalar) => scalar_fill_value_to_metadata(scalar, fill_value.as_bytes())
            .ok_or_else(|| IncompatibleFillValueError::new(data_type, fill_value)),
        DataType::Structured(fields) => {
            let mut object = serde_json::Map::new();
            let mut offset = 0;
            for field in fields {
                let size = field.scalar().size();
                let field_metadata = scalar_fill_value_to_metadata(
                    field.scalar(),
                    &fill_value.as_bytes()[offset..offset + size],
                )
                .ok_or_else(|| IncompatibleFillValueError::new(data_type, fill_value))?;
                let value = serde_json::to_value(&field_metadata)
                    .map_err(|_| IncompatibleFillValueError::new(data_type, fill_value))?;
                object.insert(field.name().to_string(), value);
                offset += size;
            }
            Ok(FillValueMetadata::Object(object))
        }
    }
}

/// Map the string forms of fill value metadata to a literal string.
///
/// The IEEE special sentinels deserialise to dedicated variants, but for string-like data
/// types they are just the literal strings `NaN`, `Infinity`, and `-Infinity`.
fn literal_string(metadata: &FillValueMetadata) -> Option<&str> {
    match metadata {
        FillValueMetadata::String(string) => Some(string),
        FillValueMetadata::NaN => Some("NaN"),
        FillValueMetadata::Infinity => Some("Infinity"),
        FillValueMetadata::NegInfinity => Some("-Infinity"),
        _ => None,
    }
}

fn int_to_bytes(value: i64, size: usize, endianness: Option<Endianness>) -> Option<Vec<u8>> {
    let big = matches!(endianness, Some(Endianness::Big));
    match size {
        1 => i8::try_from(value).ok().map(|v| v.to_le_bytes().to_vec()),
        2 => i16::try_from(value).ok().map(|v| {
            if big {
                v.to_be_bytes().to_vec()
            } else {
                v.to_le_bytes().to_vec()
            }
        }),
        4 => i32::try_from(value).ok().map(|v| {
            if big {
                v.to_be_bytes().to_vec()
            } else {
                v.to_le_bytes().to_vec()
            }
        }),
        8 => Some(if big {
            value.to_be_bytes().to_vec()
        } else {
            value.to_le_bytes().to_vec()
        }),
        _ => None,
    }
}

fn uint_to_bytes(value: u64, size: usize, endianness: Option<Endianness>) -> Option<Vec<u8>> {
    let big = matches!(endianness, Some(Endianness::Big));
    match size {
        1 => u8::try_from(value).ok().map(|v| v.to_le_bytes().to_vec()),
        2 => u16::try_from(value).ok().map(|v| {
            if big {
                v.to_be_bytes().to_vec()
            } else {
                v.to_le_bytes().to_vec()
            }
        }),
        4 => u32::try_from(value).ok().map(|v| {
            if big {
                v.to_be_bytes().to_vec()
            } else {
                v.to_le_bytes().to_vec()
            }
        }),
        8 => Some(if big {
            value.to_be_bytes().to_vec()
        } else {
            value.to_le_bytes().to_vec()
        }),
        _ => None,
    }
}

fn float_to_bytes(value: f64, size: usize, endianness: Option<Endianness>) -> Option<Vec<u8>> {
    let big = matches!(endianness, Some(Endianness::Big));
    match size {
        4 => {
            let v = value as f32;
            Some(if big {
                v.to_be_bytes().to_vec()
            } else {
                v.to_le_bytes().to_vec()
            })
        }
        8 => Some(if big {
            value.to_be_bytes().to_vec()
        } else {
            value.to_le_bytes().to_vec()
        }),
        _ => None,
    }
}

fn scalar_fill_value_bytes(
    scalar: &ScalarType,
    metadata: &FillValueMetadata,
) -> Result<Vec<u8>, IncompatibleFillValueMetadataError> {
    let err = || IncompatibleFillValueMetadataError::new(scalar, metadata);
    let endianness = scalar.endianness();
    let size = scalar.size();
    match scalar.kind() {
        ScalarKind::Bool => match metadata {
            FillValueMetadata::Bool(bool) => Ok(vec![u8::from(*bool)]),
            _ => Err(err()),
        },
        ScalarKind::Int => match metadata {
            FillValueMetadata::Number(number) => number
                .as_i64()
                .and_then(|value| int_to_bytes(value, size, endianness))
                .ok_or_else(err),
            _ => Err(err()),
        },
        ScalarKind::TimeDelta | ScalarKind::DateTime => match metadata {
            FillValueMetadata::Number(number) if size == 8 => number
                .as_i64()
                .and_then(|value| int_to_bytes(value, size, endianness))
                .ok_or_else(err),
            _ => Err(err()),
        },
        ScalarKind::UInt => match metadata {
            FillValueMetadata::Number(number) => number
                .as_u64()
                .and_then(|value| uint_to_bytes(value, size, endianness))
                .ok_or_else(err),
            _ => Err(err()),
        },
        ScalarKind::Float => {
            let value = match metadata {
                FillValueMetadata::NaN => f64::NAN,
                FillValueMetadata::Infinity => f64::INFINITY,
                FillValueMetadata::NegInfinity => f64::NEG_INFINITY,
                FillValueMetadata::Number(number) => number.as_f64().ok_or_else(err)?,
                _ => return Err(err()),
            };
            float_to_bytes(value, size, endianness).ok_or_else(err)
        }
        ScalarKind::Complex => match metadata {
            FillValueMetadata::Number(number) => {
                let re = number.as_f64().ok_or_else(err)?;
                let mut bytes = float_to_bytes(re, size / 2, endianness).ok_or_else(err)?;
                bytes.extend(float_to_bytes(0.0, size / 2, endianness).ok_or_else(err)?);
                Ok(bytes)
            }
            _ => Err(err()),
        },
        ScalarKind::RawBytes | ScalarKind::Void => {
            let string = literal_string(metadata).ok_or_else(err)?;
            let mut bytes = BASE64_STANDARD.decode(string).map_err(|_| err())?;
            if bytes.len() > size {
                return Err(err());
            }
            bytes.resize(size, 0);
            Ok(bytes)
        }
        ScalarKind::Unicode => {
            let string = literal_string(metadata).ok_or_else(err)?;
            let mut bytes = Vec::with_capacity(size);
            for char in string.chars() {
                let code = u32::from(char);
                bytes.extend(match endianness {
                    Some(Endianness::Big) => code.to_be_bytes(),
                    _ => code.to_le_bytes(),
                });
            }
            if bytes.len() > size {
                return Err(err());
            }
            bytes.resize(size, 0);
            Ok(bytes)
        }
    }
}

fn scalar_fill_value_to_metadata(scalar: &ScalarType, bytes: &[u8]) -> Option<FillValueMetadata> {
    if bytes.len() != scalar.size() {
        return None;
    }
    let big = matches!(scalar.endianness(), Some(Endianness::Big));
    let int_from_bytes = |bytes: &[u8]| -> Option<i64> {
        match bytes.len() {
            1 => Some(i64::from(i8::from_le_bytes([bytes[0]]))),
            2 => bytes.try_into().ok().map(|b| {
                i64::from(if big {
                    i16::from_be_bytes(b)
                } else {
                    i16::from_le_bytes(b)
                })
            }),
            4 => bytes.try_into().ok().map(|b| {
                i64::from(if big {
                    i32::from_be_bytes(b)
                } else {
                    i32::from_le_bytes(b)
                })
            }),
            8 => bytes.try_into().ok().map(|b| {
                if big {
                    i64::from_be_bytes(b)
                } else {
                    i64::from_le_bytes(b)
                }
            }),
            _ => None,
        }
    };
    let uint_from_bytes = |bytes: &[u8]| -> Option<u64> {
        match bytes.len() {
            1 => Some(u64::from(bytes[0])),
            2 => bytes.try_into().ok().map(|b| {
                u64::from(if big {
                    u16::from_be_bytes(b)
                } else {
                    u16::from_le_bytes(b)
                })
            }),
            4 => bytes.try_into().ok().map(|b| {
                u64::from(if big {
                    u32::from_be_bytes(b)
                } else {
                    u32::from_le_bytes(b)
                })
            }),
            8 => bytes.try_into().ok().map(|b| {
                if big {
                    u64::from_be_bytes(b)
                } else {
                    u64::from_le_bytes(b)
                }
            }),
            _ => None,
        }
    };
    let float_from_bytes = |bytes: &[u8]| -> Option<f64> {
        match bytes.len() {
            4 => bytes.try_into().ok().map(|b| {
                f64::from(if big {
                    f32::from_be_bytes(b)
                } else {
                    f32::from_le_bytes(b)
                })
            }),
            8 => bytes.try_into().ok().map(|b| {
                if big {
                    f64::from_be_bytes(b)
                } else {
                    f64::from_le_bytes(b)
                }
            }),
            _ => None,
        }
    };
    let float_metadata = |value: f64| -> Option<FillValueMetadata> {
        if value.is_nan() {
            Some(FillValueMetadata::NaN)
        } else if value == f64::INFINITY {
            Some(FillValueMetadata::Infinity)
        } else if value == f64::NEG_INFINITY {
            Some(FillValueMetadata::NegInfinity)
        } else {
            serde_json::Number::from_f64(value).map(FillValueMetadata::Number)
        }
    };
    match scalar.kind() {
        ScalarKind::Bool => match bytes[0] {
            0 => Some(FillValueMetadata::Bool(false)),
            1 => Some(FillValueMetadata::Bool(true)),
            _ => None,
        },
        ScalarKind::Int | ScalarKind::TimeDelta | ScalarKind::DateTime => int_from_bytes(bytes)
            .map(|value| FillValueMetadata::Number(serde_json::Number::from(value))),
        ScalarKind::UInt => uint_from_bytes(bytes)
            .map(|value| FillValueMetadata::Number(serde_json::Number::from(value))),
        ScalarKind::Float => float_from_bytes(bytes).and_then(float_metadata),
        ScalarKind::Complex => {
            let half = bytes.len() / 2;
            let re = float_from_bytes(&bytes[..half])?;
            let im = float_from_bytes(&bytes[half..])?;
            if im == 0.0 {
                serde_json::Number::from_f64(re).map(FillValueMetadata::Number)
            } else {
                None
            }
        }
        ScalarKind::RawBytes | ScalarKind::Void => {
            Some(FillValueMetadata::String(BASE64_STANDARD.encode(bytes)))
        }
        ScalarKind::Unicode => {
            let mut string = String::new();
            for code_bytes in bytes.chunks_exact(4) {
                let code_bytes: [u8; 4] = code_bytes.try_into().ok()?;
                let code = if big {
                    u32::from_be_bytes(code_bytes)
                } else {
                    u32::from_le_bytes(code_bytes)
                };
                if code == 0 {
                    break;
                }
                string.push(char::from_u32(code)?);
            }
            Some(FillValueMetadata::String(string))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::DataTypeMetadata;

    fn data_type(type_str: &str) -> DataType {
        DataType::from_metadata(&DataTypeMetadata::Simple(type_str.to_string())).unwrap()
    }

    #[test]
    fn fill_value_equals_all() {
        let fill_value = FillValue::new(vec![1, 2]);
        assert!(fill_value.equals_all(&[1, 2, 1, 2]));
        assert!(!fill_value.equals_all(&[1, 2, 2, 1]));
        assert!(!fill_value.equals_all(&[1, 2, 1]));
        assert!(fill_value.equals_all(&[]));
    }

    #[test]
    fn fill_value_int() {
        let dtype = data_type("<i4");
        let fill_value = fill_value_from_metadata(
            &dtype,
            &FillValueMetadata::Number(serde_json::Number::from(42)),
        )
        .unwrap()
        .unwrap();
        assert_eq!(fill_value.as_bytes(), 42i32.to_le_bytes());
        assert_eq!(
            fill_value_to_metadata(&dtype, &fill_value).unwrap(),
            FillValueMetadata::Number(serde_json::Number::from(42))
        );

        let dtype_be = data_type(">i4");
        let fill_value = fill_value_from_metadata(
            &dtype_be,
            &FillValueMetadata::Number(serde_json::Number::from(-1)),
        )
        .unwrap()
        .unwrap();
        assert_eq!(fill_value.as_bytes(), (-1i32).to_be_bytes());

        // Out of range.
        assert!(fill_value_from_metadata(
            &data_type("<i1"),
            &FillValueMetadata::Number(serde_json::Number::from(128))
        )
        .is_err());
        // Wrong shape.
        assert!(fill_value_from_metadata(
            &dtype,
            &FillValueMetadata::String("42".to_string())
        )
        .is_err());
    }

    #[test]
    fn fill_value_float_specials() {
        let dtype = data_type("<f8");
        let nan = fill_value_from_metadata(&dtype, &FillValueMetadata::NaN)
            .unwrap()
            .unwrap();
        assert!(f64::from_le_bytes(nan.as_bytes().try_into().unwrap()).is_nan());
        assert_eq!(
            fill_value_to_metadata(&dtype, &nan).unwrap(),
            FillValueMetadata::NaN
        );

        let inf = fill_value_from_metadata(&dtype, &FillValueMetadata::Infinity)
            .unwrap()
            .unwrap();
        assert_eq!(
            f64::from_le_bytes(inf.as_bytes().try_into().unwrap()),
            f64::INFINITY
        );
        assert_eq!(
            fill_value_to_metadata(&dtype, &inf).unwrap(),
            FillValueMetadata::Infinity
        );

        let neg_inf = fill_value_from_metadata(&dtype, &FillValueMetadata::NegInfinity)
            .unwrap()
            .unwrap();
        assert_eq!(
            fill_value_to_metadata(&dtype, &neg_inf).unwrap(),
            FillValueMetadata::NegInfinity
        );
    }

    #[test]
    fn fill_value_undefined() {
        let dtype = data_type("<f8");
        assert!(fill_value_from_metadata(&dtype, &FillValueMetadata::Null)
            .unwrap()
            .is_none());
    }

    #[test]
    fn fill_value_bool() {
        let dtype = data_type("|b1");
        let fill_value = fill_value_from_metadata(&dtype, &FillValueMetadata::Bool(true))
            .unwrap()
            .unwrap();
        assert_eq!(fill_value.as_bytes(), &[1]);
        assert!(
            fill_value_from_metadata(&dtype, &FillValueMetadata::Number(1.into())).is_err()
        );
    }

    #[test]
    fn fill_value_raw_bytes() {
        let dtype = data_type("|S4");
        let fill_value = fill_value_from_metadata(
            &dtype,
            &FillValueMetadata::String(BASE64_STANDARD.encode([1, 2, 3, 4])),
        )
        .unwrap()
        .unwrap();
        assert_eq!(fill_value.as_bytes(), &[1, 2, 3, 4]);

        // Shorter payloads are padded with zeros.
        let fill_value = fill_value_from_metadata(
            &dtype,
            &FillValueMetadata::String(BASE64_STANDARD.encode([9])),
        )
        .unwrap()
        .unwrap();
        assert_eq!(fill_value.as_bytes(), &[9, 0, 0, 0]);

        // Not base64.
        assert!(fill_value_from_metadata(
            &dtype,
            &FillValueMetadata::String("!!!".to_string())
        )
        .is_err());
    }

    #[test]
    fn fill_value_unicode() {
        let dtype = data_type("<U4");
        let fill_value =
            fill_value_from_metadata(&dtype, &FillValueMetadata::String("a".to_string()))
                .unwrap()
                .unwrap();
        assert_eq!(fill_value.as_bytes(), &[97, 0, 0, 0]);
        assert_eq!(
            fill_value_to_metadata(&dtype, &fill_value).unwrap(),
            FillValueMetadata::String("a".to_string())
        );
        // Too long.
        assert!(fill_value_from_metadata(
            &dtype,
            &FillValueMetadata::String("ab".to_string())
        )
        .is_err());
    }

    #[test]
    fn fill_value_structured() {
        let dtype = DataType::from_metadata(&DataTypeMetadata::Structured(vec![
            ("a".to_string(), "<i4".to_string()),
            ("b".to_string(), "<f8".to_string()),
        ]))
        .unwrap();
        let mut object = serde_json::Map::new();
        object.insert("a".to_string(), serde_json::json!(7));
        object.insert("b".to_string(), serde_json::json!("NaN"));
        let metadata = FillValueMetadata::Object(object);
        let fill_value = fill_value_from_metadata(&dtype, &metadata)
            .unwrap()
            .unwrap();
        assert_eq!(fill_value.size(), 12);
        assert_eq!(&fill_value.as_bytes()[..4], 7i32.to_le_bytes());
        assert!(
            f64::from_le_bytes(fill_value.as_bytes()[4..].try_into().unwrap()).is_nan()
        );
        assert_eq!(fill_value_to_metadata(&dtype, &fill_value).unwrap(), metadata);

        // A missing field is an error.
        let mut missing = serde_json::Map::new();
        missing.insert("a".to_string(), serde_json::json!(7));
        assert!(
            fill_value_from_metadata(&dtype, &FillValueMetadata::Object(missing)).is_err()
        );
    }
}
