use derive_more::Display;

/// The endianness of a data type.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Display)]
pub enum Endianness {
    /// Least significant byte first.
    #[display("little")]
    Little,
    /// Most significant byte first.
    #[display("big")]
    Big,
}

impl Endianness {
    /// Return true if the endianness matches the endianness of the CPU.
    #[must_use]
    pub fn is_native(self) -> bool {
        self == NATIVE_ENDIAN
    }
}

/// The endianness of the CPU.
#[cfg(target_endian = "big")]
pub const NATIVE_ENDIAN: Endianness = Endianness::Big;

/// The endianness of the CPU.
#[cfg(target_endian = "little")]
pub const NATIVE_ENDIAN: Endianness = Endianness::Little;
