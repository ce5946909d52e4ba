//! `zarr2` version information.

/// A string representation of the `zarr2` version.
///
/// Matches the `CARGO_PKG_VERSION`.
#[must_use]
pub const fn version_str() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

/// The `zarr2` major version.
#[must_use]
pub fn version_major() -> u32 {
    env!("CARGO_PKG_VERSION_MAJOR").parse().unwrap_or(0)
}

/// The `zarr2` minor version.
#[must_use]
pub fn version_minor() -> u32 {
    env!("CARGO_PKG_VERSION_MINOR").parse().unwrap_or(0)
}

/// The `zarr2` patch version.
#[must_use]
pub fn version_patch() -> u32 {
    env!("CARGO_PKG_VERSION_PATCH").parse().unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version() {
        assert_eq!(
            version_str(),
            format!(
                "{}.{}.{}",
                version_major(),
                version_minor(),
                version_patch()
            )
        );
    }
}
