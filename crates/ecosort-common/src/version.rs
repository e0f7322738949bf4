//! Version types for data file compatibility.

use serde::{Deserialize, Serialize};

use crate::error::{EcosortError, EcosortResult};

/// Schema version using semantic versioning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SchemaVersion {
    /// Major version (breaking changes)
    pub major: u16,
    /// Minor version (backwards-compatible additions)
    pub minor: u16,
    /// Patch version (bug fixes)
    pub patch: u16,
}

impl SchemaVersion {
    /// Creates a new schema version.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch: u16) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }

    /// Current asset manifest version.
    pub const ASSET_MANIFEST: Self = Self::new(1, 0, 0);

    /// Current input script version.
    pub const INPUT_SCRIPT: Self = Self::new(1, 0, 0);

    /// Checks if this version is compatible with another version.
    /// Compatible means same major version and this minor >= other minor.
    #[must_use]
    pub const fn is_compatible_with(&self, other: &Self) -> bool {
        self.major == other.major && self.minor >= other.minor
    }

    /// Checks if this version can read data from another version.
    #[must_use]
    pub const fn can_read(&self, data_version: &Self) -> bool {
        self.major == data_version.major
    }

    /// Fails with [`EcosortError::VersionMismatch`] unless `data_version`
    /// can be read.
    pub fn require_readable(&self, data_version: &Self) -> EcosortResult<()> {
        if self.can_read(data_version) {
            Ok(())
        } else {
            Err(EcosortError::VersionMismatch {
                expected: self.to_string(),
                actual: data_version.to_string(),
            })
        }
    }
}

impl Default for SchemaVersion {
    fn default() -> Self {
        Self::new(1, 0, 0)
    }
}

impl std::fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}
