//! Zarr V2 data types.
//!
//! A data type is described by a NumPy-style type string with three parts: a byte order
//! character (`<` little endian, `>` big endian, `|` not relevant), a kind character, and the
//! item size in bytes, e.g. `<f8` for a little-endian 64-bit float. A structured data type is
//! an ordered list of named fields whose types are themselves simple type strings.
//!
//! The data type drives the byte-level operations of the array: it fixes the item size, the
//! binary layout of fill values, and nothing else. Elements are otherwise opaque bytes.

use derive_more::Display;
use thiserror::Error;

use crate::metadata::DataTypeMetadata;

use super::Endianness;

/// A data type kind character.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum ScalarKind {
    /// `b`: boolean.
    Bool,
    /// `i`: signed integer.
    Int,
    /// `u`: unsigned integer.
    UInt,
    /// `f`: IEEE-754 floating point.
    Float,
    /// `c`: complex floating point (real then imaginary).
    Complex,
    /// `m`: timedelta (64-bit signed integer interpretation).
    TimeDelta,
    /// `M`: datetime (64-bit signed integer interpretation).
    DateTime,
    /// `S`: fixed-length byte string.
    RawBytes,
    /// `U`: fixed-length Unicode string (UTF-32 code units).
    Unicode,
    /// `V`: void (opaque bytes).
    Void,
}

impl ScalarKind {
    /// Return the kind character.
    #[must_use]
    pub const fn as_char(self) -> char {
        match self {
            Self::Bool => 'b',
            Self::Int => 'i',
            Self::UInt => 'u',
            Self::Float => 'f',
            Self::Complex => 'c',
            Self::TimeDelta => 'm',
            Self::DateTime => 'M',
            Self::RawBytes => 'S',
            Self::Unicode => 'U',
            Self::Void => 'V',
        }
    }

    const fn from_char(c: char) -> Option<Self> {
        match c {
            'b' => Some(Self::Bool),
            'i' => Some(Self::Int),
            'u' => Some(Self::UInt),
            'f' => Some(Self::Float),
            'c' => Some(Self::Complex),
            'm' => Some(Self::TimeDelta),
            'M' => Some(Self::DateTime),
            'S' => Some(Self::RawBytes),
            'U' => Some(Self::Unicode),
            'V' => Some(Self::Void),
            _ => None,
        }
    }

    /// Return whether a data type of this kind may use the `|` byte order.
    ///
    /// Only single-byte and opaque kinds are byte order agnostic.
    const fn allows_no_byte_order(self) -> bool {
        matches!(self, Self::Bool | Self::RawBytes | Self::Void)
    }
}

/// A simple (scalar) data type: byte order, kind, and item size in bytes.
#[derive(Clone, PartialEq, Eq, Debug, Display)]
#[display("{}", self.to_type_str())]
pub struct ScalarType {
    endianness: Option<Endianness>,
    kind: ScalarKind,
    size: usize,
}

/// An unsupported data type error.
#[derive(Clone, Debug, Error)]
#[error("unsupported data type {0}")]
pub struct UnsupportedDataTypeError(String);

impl ScalarType {
    /// Parse a type string such as `<f8`, `>u2`, or `|b1`.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if:
    ///  - the byte order character is missing or unknown,
    ///  - the kind character is unknown,
    ///  - the size is zero or not a decimal integer, or
    ///  - `|` is used with a kind that is byte order sensitive.
    pub fn from_type_str(type_str: &str) -> Result<Self, UnsupportedDataTypeError> {
        let err = || UnsupportedDataTypeError(type_str.to_string());
        let mut chars = type_str.chars();
        let endianness = match chars.next().ok_or_else(err)? {
            '<' => Some(Endianness::Little),
            '>' => Some(Endianness::Big),
            '|' => None,
            _ => return Err(err()),
        };
        let kind = ScalarKind::from_char(chars.next().ok_or_else(err)?).ok_or_else(err)?;
        let size_str = chars.as_str();
        if size_str.is_empty() || !size_str.bytes().all(|b| b.is_ascii_digit()) {
            return Err(err());
        }
        let size: usize = size_str.parse().map_err(|_| err())?;
        if size == 0 {
            return Err(err());
        }
        if endianness.is_none() && !kind.allows_no_byte_order() {
            return Err(err());
        }
        if kind == ScalarKind::Bool && size != 1 {
            return Err(err());
        }
        Ok(Self {
            endianness,
            kind,
            size,
        })
    }

    /// Return the type string, e.g. `<f8`.
    #[must_use]
    pub fn to_type_str(&self) -> String {
        let order = match self.endianness {
            Some(Endianness::Little) => '<',
            Some(Endianness::Big) => '>',
            None => '|',
        };
        format!("{order}{}{}", self.kind.as_char(), self.size)
    }

    /// Return the endianness, or [`None`] if the byte order is not relevant.
    #[must_use]
    pub const fn endianness(&self) -> Option<Endianness> {
        self.endianness
    }

    /// Return the kind.
    #[must_use]
    pub const fn kind(&self) -> ScalarKind {
        self.kind
    }

    /// Return the item size in bytes.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }
}

/// A field of a structured data type.
#[derive(Clone, PartialEq, Eq, Debug, Display)]
#[display("({name}, {scalar})")]
pub struct StructuredField {
    name: String,
    scalar: ScalarType,
}

impl StructuredField {
    /// Return the field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Return the field data type.
    #[must_use]
    pub const fn scalar(&self) -> &ScalarType {
        &self.scalar
    }
}

/// A Zarr V2 data type: a scalar, or an ordered record of uniquely named scalar fields.
///
/// The item size of a structured data type is the sum of its field sizes; there is no padding.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum DataType {
    /// A simple data type.
    Scalar(ScalarType),
    /// A structured data type.
    Structured(Vec<StructuredField>),
}

impl DataType {
    /// Create a data type from metadata.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if the type string is invalid, a structured data
    /// type has no fields, or field names are not unique.
    pub fn from_metadata(metadata: &DataTypeMetadata) -> Result<Self, UnsupportedDataTypeError> {
        match metadata {
            DataTypeMetadata::Simple(type_str) => {
                Ok(Self::Scalar(ScalarType::from_type_str(type_str)?))
            }
            DataTypeMetadata::Structured(fields_metadata) => {
                if fields_metadata.is_empty() {
                    return Err(UnsupportedDataTypeError("[]".to_string()));
                }
                let mut fields = Vec::with_capacity(fields_metadata.len());
                for (name, type_str) in fields_metadata {
                    if fields
                        .iter()
                        .any(|field: &StructuredField| field.name == *name)
                    {
                        return Err(UnsupportedDataTypeError(format!(
                            "duplicate field {name}"
                        )));
                    }
                    fields.push(StructuredField {
                        name: name.clone(),
                        scalar: ScalarType::from_type_str(type_str)?,
                    });
                }
                Ok(Self::Structured(fields))
            }
        }
    }

    /// Convert the data type to metadata.
    #[must_use]
    pub fn to_metadata(&self) -> DataTypeMetadata {
        match self {
            Self::Scalar(scalar) => DataTypeMetadata::Simple(scalar.to_type_str()),
            Self::Structured(fields) => DataTypeMetadata::Structured(
                fields
                    .iter()
                    .map(|field| (field.name.clone(), field.scalar.to_type_str()))
                    .collect(),
            ),
        }
    }

    /// Return the item size in bytes.
    #[must_use]
    pub fn item_size(&self) -> usize {
        match self {
            Self::Scalar(scalar) => scalar.size(),
            Self::Structured(fields) => fields.iter().map(|field| field.scalar.size()).sum(),
        }
    }

    /// Return the endianness of a scalar data type, or [`None`] if the data type is structured
    /// or byte order agnostic.
    #[must_use]
    pub const fn endianness(&self) -> Option<Endianness> {
        match self {
            Self::Scalar(scalar) => scalar.endianness(),
            Self::Structured(_) => None,
        }
    }

    /// Returns true if the data type is structured.
    #[must_use]
    pub const fn is_structured(&self) -> bool {
        matches!(self, Self::Structured(_))
    }

    /// Return the fields of a structured data type, or [`None`] for a scalar.
    #[must_use]
    pub fn fields(&self) -> Option<&[StructuredField]> {
        match self {
            Self::Scalar(_) => None,
            Self::Structured(fields) => Some(fields),
        }
    }

    /// Returns true if the data type is a scalar floating point type.
    #[must_use]
    pub const fn is_floating(&self) -> bool {
        matches!(
            self,
            Self::Scalar(ScalarType {
                kind: ScalarKind::Float,
                ..
            })
        )
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Scalar(scalar) => write!(f, "{scalar}"),
            Self::Structured(fields) => {
                write!(f, "[")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{field}")?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scalar_type_valid() {
        let dtype = ScalarType::from_type_str("<f8").unwrap();
        assert_eq!(dtype.endianness(), Some(Endianness::Little));
        assert_eq!(dtype.kind(), ScalarKind::Float);
        assert_eq!(dtype.size(), 8);
        assert_eq!(dtype.to_type_str(), "<f8");

        assert!(ScalarType::from_type_str(">u2").is_ok());
        assert!(ScalarType::from_type_str("|b1").is_ok());
        assert!(ScalarType::from_type_str("|S10").is_ok());
        assert!(ScalarType::from_type_str("|V16").is_ok());
        assert!(ScalarType::from_type_str("<U4").is_ok());
        assert!(ScalarType::from_type_str("<m8").is_ok());
        assert!(ScalarType::from_type_str(">M8").is_ok());
    }

    #[test]
    fn scalar_type_invalid() {
        // Missing or unknown byte order.
        assert!(ScalarType::from_type_str("f8").is_err());
        assert!(ScalarType::from_type_str("=f8").is_err());
        // Unknown kind.
        assert!(ScalarType::from_type_str("<x8").is_err());
        // Bad size.
        assert!(ScalarType::from_type_str("<f0").is_err());
        assert!(ScalarType::from_type_str("<f").is_err());
        assert!(ScalarType::from_type_str("<f-8").is_err());
        // Byte order agnostic marker on multi-byte kinds.
        assert!(ScalarType::from_type_str("|i4").is_err());
        assert!(ScalarType::from_type_str("|f8").is_err());
        assert!(ScalarType::from_type_str("|u1").is_err());
        assert!(ScalarType::from_type_str("|U4").is_err());
        // Bool must be one byte.
        assert!(ScalarType::from_type_str("|b2").is_err());
    }

    #[test]
    fn data_type_structured() {
        let metadata = DataTypeMetadata::Structured(vec![
            ("a".to_string(), "<i4".to_string()),
            ("b".to_string(), "<f8".to_string()),
        ]);
        let dtype = DataType::from_metadata(&metadata).unwrap();
        assert!(dtype.is_structured());
        assert_eq!(dtype.item_size(), 12);
        assert_eq!(dtype.fields().unwrap().len(), 2);
        assert_eq!(dtype.to_metadata(), metadata);

        let duplicate = DataTypeMetadata::Structured(vec![
            ("a".to_string(), "<i4".to_string()),
            ("a".to_string(), "<f8".to_string()),
        ]);
        assert!(DataType::from_metadata(&duplicate).is_err());
        assert!(DataType::from_metadata(&DataTypeMetadata::Structured(vec![])).is_err());
    }

    #[test]
    fn data_type_predicates() {
        let float = DataType::from_metadata(&"<f4".into()).unwrap();
        assert!(float.is_floating());
        assert_eq!(float.item_size(), 4);
        let int = DataType::from_metadata(&">i8".into()).unwrap();
        assert!(!int.is_floating());
        assert_eq!(int.endianness(), Some(Endianness::Big));
    }
}
