use serde_repr::{Deserialize_repr, Serialize_repr};
use std::convert::TryFrom;
use strum_macros::{Display, EnumIter, EnumString};

/// The games a custom ladder is kept for. Each player has one rating
/// profile per game.
#[derive(
    Deserialize_repr,
    Serialize_repr,
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    EnumIter,
    EnumString,
    Display,
    clap::ValueEnum
)]
#[repr(u8)]
#[strum(serialize_all = "kebab-case")]
#[strum(ascii_case_insensitive)]
pub enum Game {
    Valorant = 0,
    MarvelRivals = 1
}

impl TryFrom<i32> for Game {
    type Error = ();

    fn try_from(v: i32) -> Result<Self, Self::Error> {
        match v {
            0 => Ok(Game::Valorant),
            1 => Ok(Game::MarvelRivals),
            _ => Err(())
        }
    }
}
