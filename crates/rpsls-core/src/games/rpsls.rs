//! Rock-Paper-Scissors-Spock-Lizard rules.

use crate::error::GameError;
use crate::protocol::GameResult;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A move as encoded on chain (`uint8`).
///
/// `Null` means "not chosen yet" and is never a valid play.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Move {
    #[default]
    Null = 0,
    Rock = 1,
    Paper = 2,
    Scissors = 3,
    Spock = 4,
    Lizard = 5,
}

impl Move {
    /// The five playable moves in code order.
    pub const PLAYABLE: [Move; 5] = [
        Move::Rock,
        Move::Paper,
        Move::Scissors,
        Move::Spock,
        Move::Lizard,
    ];

    /// On-chain code
    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn is_null(self) -> bool {
        self == Move::Null
    }

    pub fn name(self) -> &'static str {
        match self {
            Move::Null => "Null",
            Move::Rock => "Rock",
            Move::Paper => "Paper",
            Move::Scissors => "Scissors",
            Move::Spock => "Spock",
            Move::Lizard => "Lizard",
        }
    }

    /// Check if this move beats the other.
    ///
    /// Same rule as the contract's `win`: moves of equal parity are won by
    /// the lower code, moves of different parity by the higher code.
    pub fn beats(self, other: Move) -> bool {
        if self.is_null() || other.is_null() || self == other {
            return false;
        }
        let (a, b) = (self.code(), other.code());
        if a % 2 == b % 2 {
            a < b
        } else {
            a > b
        }
    }
}

impl TryFrom<u8> for Move {
    type Error = GameError;

    fn try_from(code: u8) -> Result<Self, Self::Error> {
        match code {
            0 => Ok(Move::Null),
            1 => Ok(Move::Rock),
            2 => Ok(Move::Paper),
            3 => Ok(Move::Scissors),
            4 => Ok(Move::Spock),
            5 => Ok(Move::Lizard),
            other => Err(GameError::InvalidMove(format!("unknown move code {other}"))),
        }
    }
}

impl FromStr for Move {
    type Err = GameError;

    /// Accepts a name (any case) or a numeric code.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(code) = s.parse::<u8>() {
            return Move::try_from(code);
        }
        match s.to_ascii_lowercase().as_str() {
            "null" => Ok(Move::Null),
            "rock" => Ok(Move::Rock),
            "paper" => Ok(Move::Paper),
            "scissors" => Ok(Move::Scissors),
            "spock" => Ok(Move::Spock),
            "lizard" => Ok(Move::Lizard),
            _ => Err(GameError::InvalidMove(s.to_string())),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Resolve the first party's move `a` against the second party's move `b`.
pub fn resolve(a: Move, b: Move) -> Result<GameResult, GameError> {
    if a.is_null() || b.is_null() {
        return Err(GameError::InvalidMove(
            "both moves must be played before resolving".to_string(),
        ));
    }

    Ok(if a == b {
        GameResult::Draw
    } else if a.beats(b) {
        GameResult::AWins
    } else {
        GameResult::BWins
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn judge(a: Move, b: Move) -> GameResult {
        resolve(a, b).unwrap()
    }

    #[test]
    fn test_each_move_beats_exactly_two() {
        let table = [
            (Move::Rock, [Move::Scissors, Move::Lizard]),
            (Move::Paper, [Move::Rock, Move::Spock]),
            (Move::Scissors, [Move::Paper, Move::Lizard]),
            (Move::Spock, [Move::Rock, Move::Scissors]),
            (Move::Lizard, [Move::Paper, Move::Spock]),
        ];

        for (mv, victims) in table {
            for other in Move::PLAYABLE {
                let expected = if other == mv {
                    GameResult::Draw
                } else if victims.contains(&other) {
                    GameResult::AWins
                } else {
                    GameResult::BWins
                };
                assert_eq!(judge(mv, other), expected, "{mv} vs {other}");
            }
        }
    }

    #[test]
    fn test_draws() {
        for mv in Move::PLAYABLE {
            assert_eq!(judge(mv, mv), GameResult::Draw);
        }
    }

    #[test]
    fn test_resolution_is_antisymmetric() {
        for a in Move::PLAYABLE {
            for b in Move::PLAYABLE {
                if a == b {
                    continue;
                }
                let forward = judge(a, b);
                let backward = judge(b, a);
                assert_ne!(forward, GameResult::Draw);
                assert_eq!(forward.swapped(), backward, "{a} vs {b}");
            }
        }
    }

    #[test]
    fn test_all_outcomes() {
        let mut a_wins = 0;
        let mut b_wins = 0;
        let mut draws = 0;

        for a in Move::PLAYABLE {
            for b in Move::PLAYABLE {
                match judge(a, b) {
                    GameResult::AWins => a_wins += 1,
                    GameResult::BWins => b_wins += 1,
                    GameResult::Draw => draws += 1,
                }
            }
        }

        assert_eq!(a_wins, 10);
        assert_eq!(b_wins, 10);
        assert_eq!(draws, 5);
    }

    #[test]
    fn test_null_is_rejected() {
        assert!(matches!(
            resolve(Move::Null, Move::Rock),
            Err(GameError::InvalidMove(_))
        ));
        assert!(matches!(
            resolve(Move::Rock, Move::Null),
            Err(GameError::InvalidMove(_))
        ));
        assert!(!Move::Null.beats(Move::Rock));
    }

    #[test]
    fn test_codes_round_trip() {
        for code in 0..=5u8 {
            assert_eq!(Move::try_from(code).unwrap().code(), code);
        }
        assert!(Move::try_from(6).is_err());
    }

    #[test]
    fn test_parse_names_and_codes() {
        assert_eq!("spock".parse::<Move>().unwrap(), Move::Spock);
        assert_eq!("LIZARD".parse::<Move>().unwrap(), Move::Lizard);
        assert_eq!("3".parse::<Move>().unwrap(), Move::Scissors);
        assert!("dynamite".parse::<Move>().is_err());
    }
}
