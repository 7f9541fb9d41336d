use std::fmt;

use crate::error::BadResourceId;

/// The largest resource ID a table hands out by default.
///
/// This is 2^53 - 1, the largest integer a double can represent exactly, so every
/// ID survives a round trip through a guest that only speaks in numbers.
pub const MAX_ID: u64 = (1 << 53) - 1;

/// A validated resource ID.
///
/// Resource IDs are only unique while the resource they refer to is alive. Once a
/// resource is removed, its ID may be handed out again by the next
/// [`ResourceTable::add`](crate::ResourceTable::add).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResourceId(u64);

impl ResourceId {
    /// Creates a resource ID without checking it against [`MAX_ID`].
    #[inline]
    pub(crate) const fn new_unchecked(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw integer value of the ID.
    #[inline]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<ResourceId> for u64 {
    #[inline]
    fn from(id: ResourceId) -> Self {
        id.0
    }
}

impl TryFrom<u64> for ResourceId {
    type Error = BadResourceId;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        RawResourceId::Unsigned(value).validate(MAX_ID)
    }
}

/// An unvalidated resource ID, as received from the other side of a boundary.
///
/// Guests may hand over negative numbers, fractions or values beyond the ID space.
/// Those are all representable here so they can be rejected with a
/// [`BadResourceId`] that names the offending value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RawResourceId {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
}

impl RawResourceId {
    /// Checks the ID against an upper bound of `max_id` (inclusive).
    pub fn is_valid_within(self, max_id: u64) -> bool {
        match self {
            Self::Unsigned(value) => value <= max_id,
            Self::Signed(value) => value > -1 && (value as u64) <= max_id,
            // `u64::MAX as f64` rounds up to 2^64, which is already out of range.
            Self::Float(value) => {
                value.is_finite()
                    && value.trunc() == value
                    && value > -1.0
                    && value < u64::MAX as f64
                    && (value as u64) <= max_id
            }
        }
    }

    /// Validates the ID against an upper bound of `max_id` (inclusive).
    pub fn validate(self, max_id: u64) -> Result<ResourceId, BadResourceId> {
        if !self.is_valid_within(max_id) {
            return Err(BadResourceId::new(self));
        }

        let id = match self {
            Self::Unsigned(value) => value,
            Self::Signed(value) => value as u64,
            Self::Float(value) => value as u64,
        };

        Ok(ResourceId::new_unchecked(id))
    }
}

impl fmt::Display for RawResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsigned(value) => write!(f, "{value}"),
            Self::Signed(value) => write!(f, "{value}"),
            Self::Float(value) => write!(f, "{value}"),
        }
    }
}

impl From<ResourceId> for RawResourceId {
    #[inline]
    fn from(id: ResourceId) -> Self {
        Self::Unsigned(id.0)
    }
}

/// Anything that can be passed where a resource ID is expected.
pub trait IntoRawResourceId {
    fn into_raw_resource_id(self) -> RawResourceId;
}

impl IntoRawResourceId for RawResourceId {
    #[inline]
    fn into_raw_resource_id(self) -> RawResourceId {
        self
    }
}

impl IntoRawResourceId for ResourceId {
    #[inline]
    fn into_raw_resource_id(self) -> RawResourceId {
        RawResourceId::Unsigned(self.0)
    }
}

impl IntoRawResourceId for &'_ ResourceId {
    #[inline]
    fn into_raw_resource_id(self) -> RawResourceId {
        RawResourceId::Unsigned(self.0)
    }
}

macro_rules! impl_into_raw_resource_id {
    ($variant:ident => $cast:ty: $($ty:ty),*) => {
        $(
            impl IntoRawResourceId for $ty {
                #[inline]
                fn into_raw_resource_id(self) -> RawResourceId {
                    RawResourceId::$variant(self as $cast)
                }
            }
        )*
    };
}

impl_into_raw_resource_id!(Unsigned => u64: u8, u16, u32, u64, usize);
impl_into_raw_resource_id!(Signed => i64: i8, i16, i32, i64, isize);
impl_into_raw_resource_id!(Float => f64: f32, f64);

/// Checks whether or not a resource ID is valid.
///
/// An ID is valid when it has no fractional part, is greater than -1 and does not
/// exceed [`MAX_ID`].
pub fn is_valid_resource_id(id: impl IntoRawResourceId) -> bool {
    id.into_raw_resource_id().is_valid_within(MAX_ID)
}
