use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Source of fresh identifiers for persisted records.
///
/// Implementations must be safe to share between threads that insert
/// concurrently. A nil UUID is never accepted as a reference.
pub trait ReferenceAllocator: fmt::Debug + Send + Sync {
    fn allocate(&self) -> Uuid;
}

/// Allocates random (v4) UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReferences;

impl ReferenceAllocator for RandomReferences {
    fn allocate(&self) -> Uuid {
        Uuid::new_v4()
    }
}

/// Allocates UUIDs from a monotonically increasing counter, starting at 1.
#[derive(Debug, Default)]
pub struct SequentialReferences {
    next: AtomicU64,
}

impl SequentialReferences {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            next: AtomicU64::new(0),
        }
    }
}

impl ReferenceAllocator for SequentialReferences {
    fn allocate(&self) -> Uuid {
        let value = self.next.fetch_add(1, Ordering::Relaxed) + 1;
        Uuid::from_u64_pair(0, value)
    }
}

macro_rules! define_ref {
    ($name:ident, $entity:expr, $doc:expr) => {
        #[doc = $doc]
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(Uuid);

        impl $name {
            pub const ENTITY: &'static str = $entity;

            /// Draw a fresh reference from `allocator`.
            pub fn allocate(allocator: &dyn ReferenceAllocator) -> Result<Self> {
                Self::from_uuid(allocator.allocate())
            }

            /// Wrap a stored UUID, rejecting the nil value.
            pub fn from_uuid(uuid: Uuid) -> Result<Self> {
                if uuid.is_nil() {
                    return Err(Error::InvalidReference(format!(
                        "{} reference must not be nil",
                        Self::ENTITY
                    )));
                }
                Ok(Self(uuid))
            }

            #[must_use]
            pub const fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl AsRef<Uuid> for $name {
            fn as_ref(&self) -> &Uuid {
                &self.0
            }
        }

        impl std::str::FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                let uuid = Uuid::parse_str(s).map_err(|e| {
                    Error::InvalidReference(format!("{} reference {s:?}: {e}", Self::ENTITY))
                })?;
                Self::from_uuid(uuid)
            }
        }
    };
}

define_ref!(TrackRef, "track", "Reference to a persisted track.");
define_ref!(
    SubFingerprintRef,
    "sub-fingerprint",
    "Reference to a persisted sub-fingerprint."
);
define_ref!(
    FingerprintRef,
    "fingerprint",
    "Reference to a persisted coarse fingerprint."
);
define_ref!(
    SpectralImageRef,
    "spectral image",
    "Reference to a persisted spectral image."
);
