use core::fmt;
use core::num::NonZeroU32;

use crate::error::{CoreError, CoreResult};

/// Compact identifier for mesh entities.
///
/// Mesh files number entities from 1, so the stored value is the external id
/// itself and `Option<Id>` stays the size of `Id`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Id(NonZeroU32);

impl Id {
    /// Build an id from its external (1-based) number.
    pub fn new(value: u64) -> CoreResult<Self> {
        u32::try_from(value)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Self)
            .ok_or(CoreError::InvalidId {
                what: "mesh ids must be in 1..=u32::MAX",
                value,
            })
    }

    /// The external (1-based) number.
    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self.get())
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.get())
    }
}

pub type NodeId = Id;
pub type ElementId = Id;
pub type ConditionId = Id;
pub type PropertiesId = u32;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_keeps_external_number() {
        for i in [1_u64, 2, 42, 10_000] {
            let id = Id::new(i).unwrap();
            assert_eq!(u64::from(id.get()), i);
        }
    }

    #[test]
    fn id_rejects_zero_and_overflow() {
        assert!(Id::new(0).is_err());
        assert!(Id::new(u64::from(u32::MAX) + 1).is_err());
    }

    #[test]
    fn option_id_is_small() {
        assert_eq!(
            core::mem::size_of::<Id>(),
            core::mem::size_of::<Option<Id>>()
        );
    }
}
