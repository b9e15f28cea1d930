use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;

/// Why a rank history record was written.
#[derive(Deserialize_repr, Serialize_repr, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RankChangeReason {
    Placement = 0,
    Match = 1,
    EliteSweep = 2,
    Manual = 3
}

impl TryFrom<i32> for RankChangeReason {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(RankChangeReason::Placement),
            1 => Ok(RankChangeReason::Match),
            2 => Ok(RankChangeReason::EliteSweep),
            3 => Ok(RankChangeReason::Manual),
            _ => Err(())
        }
    }
}
