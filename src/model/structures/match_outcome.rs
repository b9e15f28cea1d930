use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::model::constants::DEFAULT_EXPECTED_SCORE;

/// One player's result in a completed match, as consumed by the rating engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchOutcomeInput {
    pub won: bool,
    pub kills: u32,
    pub deaths: u32,
    pub assists: u32,
    pub is_mvp: bool,
    pub is_team_mvp: bool,
    /// Win probability supplied by matchmaking. `None` means an even match.
    pub expected_score: Option<f64>
}

/// A value built from loosely typed input, along with the names of the
/// fields that had to be replaced by their defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct Coerced<T> {
    pub value: T,
    pub defaulted: Vec<&'static str>
}

impl<T> Coerced<T> {
    pub fn is_clean(&self) -> bool {
        self.defaulted.is_empty()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum InputError {
    #[error("stat line is not a JSON object")]
    NotAnObject,
    #[error("match outcome is missing or unreadable: {0}")]
    InvalidOutcome(String)
}

impl MatchOutcomeInput {
    /// The expected score, defaulted to an even match and clamped to [0, 1].
    pub fn expected_score(&self) -> f64 {
        match self.expected_score {
            Some(e) if e.is_finite() => e.clamp(0.0, 1.0),
            _ => DEFAULT_EXPECTED_SCORE
        }
    }

    /// Kills per death. A deathless game counts the raw kill total.
    pub fn kill_death_ratio(&self) -> f64 {
        if self.deaths == 0 {
            self.kills as f64
        } else {
            self.kills as f64 / self.deaths as f64
        }
    }

    /// Builds an input from nullable database columns. Missing or negative
    /// counters become zero.
    pub fn from_columns(
        won: bool,
        kills: Option<i32>,
        deaths: Option<i32>,
        assists: Option<i32>,
        is_mvp: Option<bool>,
        is_team_mvp: Option<bool>,
        expected_score: Option<f64>
    ) -> Coerced<Self> {
        let mut defaulted = Vec::new();
        let mut count = |name: &'static str, v: Option<i32>| match v {
            Some(n) if n >= 0 => n as u32,
            _ => {
                defaulted.push(name);
                0
            }
        };

        let kills = count("kills", kills);
        let deaths = count("deaths", deaths);
        let assists = count("assists", assists);

        let expected_score = match expected_score {
            Some(e) if !e.is_finite() => {
                defaulted.push("expected_score");
                None
            }
            other => other
        };

        Coerced {
            value: MatchOutcomeInput {
                won,
                kills,
                deaths,
                assists,
                is_mvp: is_mvp.unwrap_or(false),
                is_team_mvp: is_team_mvp.unwrap_or(false),
                expected_score
            },
            defaulted
        }
    }

    /// Parses a stat line reported by a game-stat collaborator.
    ///
    /// Counters accept numbers or numeric strings; anything else becomes zero.
    /// The outcome itself cannot be defaulted, so an unreadable `won` is an error.
    pub fn from_json(value: &Value) -> Result<Coerced<Self>, InputError> {
        let obj = value.as_object().ok_or(InputError::NotAnObject)?;
        let mut defaulted = Vec::new();

        let won = match field(obj, &["won", "win", "isWin"]) {
            Some(v) => flag(v).ok_or_else(|| InputError::InvalidOutcome(v.to_string()))?,
            None => return Err(InputError::InvalidOutcome("missing".to_string()))
        };

        let mut count = |name: &'static str, keys: &[&str]| match field(obj, keys).and_then(number) {
            Some(n) if n >= 0.0 => n.min(u32::MAX as f64) as u32,
            _ => {
                defaulted.push(name);
                0
            }
        };

        let kills = count("kills", &["kills"]);
        let deaths = count("deaths", &["deaths"]);
        let assists = count("assists", &["assists"]);

        let mut optional_flag = |name: &'static str, keys: &[&str]| match field(obj, keys) {
            None => false,
            Some(v) => flag(v).unwrap_or_else(|| {
                defaulted.push(name);
                false
            })
        };

        let is_mvp = optional_flag("is_mvp", &["is_mvp", "isMVP", "mvp"]);
        let is_team_mvp = optional_flag("is_team_mvp", &["is_team_mvp", "isTeamMVP", "teamMvp"]);

        let expected_score = match field(obj, &["expected_score", "expectedScore"]) {
            None => None,
            Some(v) => match number(v) {
                Some(e) => Some(e.clamp(0.0, 1.0)),
                None => {
                    defaulted.push("expected_score");
                    None
                }
            }
        };

        Ok(Coerced {
            value: MatchOutcomeInput {
                won,
                kills,
                deaths,
                assists,
                is_mvp,
                is_team_mvp,
                expected_score
            },
            defaulted
        })
    }
}

fn field<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| obj.get(*k)).filter(|v| !v.is_null())
}

fn number(v: &Value) -> Option<f64> {
    let n = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None
    }?;

    n.is_finite().then_some(n)
}

fn flag(v: &Value) -> Option<bool> {
    match v {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(0) => Some(false),
            Some(1) => Some(true),
            _ => None
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" => Some(true),
            "false" | "0" => Some(false),
            _ => None
        },
        _ => None
    }
}
