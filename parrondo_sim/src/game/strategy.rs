//! Strategy tables deciding how the player plays each hand.

use lazy_static::lazy_static;
use parrondo_lib::{BlackjackGameError, Card, Hand, Rank};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fmt::Display;
use std::str::FromStr;

lazy_static! {
    /// Multi-deck basic strategy: dealer stands on all 17s, double after split and late surrender allowed.
    pub static ref BASIC_STRATEGY: StrategyTable = StrategyTable::basic();
}

/// The moves available to the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Hit,
    Stand,
    Double,
    Split,
    Surrender,
}

impl Action {
    pub fn code(self) -> &'static str {
        match self {
            Action::Hit => "H",
            Action::Stand => "S",
            Action::Double => "D",
            Action::Split => "P",
            Action::Surrender => "Sr",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl FromStr for Action {
    type Err = BlackjackGameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "H" => Ok(Action::Hit),
            "S" => Ok(Action::Stand),
            "D" => Ok(Action::Double),
            "P" => Ok(Action::Split),
            "SR" => Ok(Action::Surrender),
            _ => Err(BlackjackGameError::InvalidStrategy(format!(
                "unknown action code '{}'",
                s
            ))),
        }
    }
}

/// Which of the three tables a hand is looked up in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandClass {
    Hard,
    Soft,
    Pair,
}

impl HandClass {
    /// Soft hands take priority, a pair of Aces is looked up as a soft total.
    pub fn of(hand: &Hand) -> HandClass {
        if hand.is_soft() {
            HandClass::Soft
        } else if hand.is_splittable() {
            HandClass::Pair
        } else {
            HandClass::Hard
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            HandClass::Hard => "hard",
            HandClass::Soft => "soft",
            HandClass::Pair => "pair",
        }
    }

    /// Totals a complete table must cover for this class.
    fn required_totals(self) -> Vec<usize> {
        match self {
            HandClass::Hard => (5..=21).collect(),
            HandClass::Soft => (12..=21).collect(),
            HandClass::Pair => (4..=20).step_by(2).collect(),
        }
    }
}

/// Number of distinct dealer up-card columns: 2 through 9, any ten-valued card, and the Ace.
pub const DEALER_COLUMNS: usize = 10;
const MAX_TOTAL: usize = 21;

type Grid = [[Option<Action>; DEALER_COLUMNS]; MAX_TOTAL + 1];

/// Column of the strategy tables a dealer up-card falls into.
pub fn dealer_column(rank: Rank) -> usize {
    match rank {
        Rank::Ace => 9,
        other => other.base_value() as usize - 2,
    }
}

/// Trait for anything that decides how to play a hand given the dealer's face up card.
pub trait DecisionStrategy {
    /// Returns the action for `hand` against `dealers_up_card`. Eligibility rules (e.g. doubling only on two cards)
    /// are applied by the caller.
    fn decide(&self, hand: &Hand, dealers_up_card: &Card) -> Result<Action, BlackjackGameError>;
}

impl<D: DecisionStrategy + ?Sized> DecisionStrategy for &D {
    fn decide(&self, hand: &Hand, dealers_up_card: &Card) -> Result<Action, BlackjackGameError> {
        (**self).decide(hand, dealers_up_card)
    }
}

/// Hard, soft and pair tables indexed by hand total and dealer column.
#[derive(Debug, Clone, PartialEq)]
pub struct StrategyTable {
    hard: Grid,
    soft: Grid,
    pair: Grid,
}

impl StrategyTable {
    fn empty() -> StrategyTable {
        StrategyTable {
            hard: [[None; DEALER_COLUMNS]; MAX_TOTAL + 1],
            soft: [[None; DEALER_COLUMNS]; MAX_TOTAL + 1],
            pair: [[None; DEALER_COLUMNS]; MAX_TOTAL + 1],
        }
    }

    fn grid(&self, class: HandClass) -> &Grid {
        match class {
            HandClass::Hard => &self.hard,
            HandClass::Soft => &self.soft,
            HandClass::Pair => &self.pair,
        }
    }

    fn grid_mut(&mut self, class: HandClass) -> &mut Grid {
        match class {
            HandClass::Hard => &mut self.hard,
            HandClass::Soft => &mut self.soft,
            HandClass::Pair => &mut self.pair,
        }
    }

    /// Builds the standard basic strategy tables. Dealer values run 2 through 11, 11 being the Ace.
    pub fn basic() -> StrategyTable {
        use Action::*;
        let mut table = StrategyTable::empty();

        for d in 2usize..=11 {
            let col = d - 2;

            // Populate hard totals
            for total in 5..=21 {
                table.hard[total][col] = Some(match total {
                    5..=8 => Hit,
                    9 => match d {
                        3..=6 => Double,
                        _ => Hit,
                    },
                    10 => match d {
                        2..=9 => Double,
                        _ => Hit,
                    },
                    11 => match d {
                        11 => Hit,
                        _ => Double,
                    },
                    12 => match d {
                        4..=6 => Stand,
                        _ => Hit,
                    },
                    13 | 14 => match d {
                        2..=6 => Stand,
                        _ => Hit,
                    },
                    15 => match d {
                        2..=6 => Stand,
                        10 => Surrender,
                        _ => Hit,
                    },
                    16 => match d {
                        2..=6 => Stand,
                        9..=11 => Surrender,
                        _ => Hit,
                    },
                    _ => Stand,
                });
            }

            // Populate soft totals, soft 12 is a pair of aces
            for total in 12..=21 {
                table.soft[total][col] = Some(match total {
                    12 => Split,
                    13 | 14 => match d {
                        5 | 6 => Double,
                        _ => Hit,
                    },
                    15 | 16 => match d {
                        4..=6 => Double,
                        _ => Hit,
                    },
                    17 => match d {
                        3..=6 => Double,
                        _ => Hit,
                    },
                    18 => match d {
                        3..=6 => Double,
                        2 | 7 | 8 => Stand,
                        _ => Hit,
                    },
                    _ => Stand,
                });
            }

            // Populate pair totals
            for total in (4..=20).step_by(2) {
                table.pair[total][col] = Some(match total {
                    4 | 6 => match d {
                        2..=7 => Split,
                        _ => Hit,
                    },
                    8 => match d {
                        5 | 6 => Split,
                        _ => Hit,
                    },
                    10 => match d {
                        2..=9 => Double,
                        _ => Hit,
                    },
                    12 => match d {
                        2..=6 => Split,
                        _ => Hit,
                    },
                    14 => match d {
                        2..=7 => Split,
                        _ => Hit,
                    },
                    16 => Split,
                    18 => match d {
                        2..=6 | 8 | 9 => Split,
                        _ => Stand,
                    },
                    _ => Stand,
                });
            }
        }

        table
    }

    /// Parses tables from JSON of the form `{"hard": {"12": {"2": "H", ..., "A": "H"}}, "soft": {...}, "pair": {...}}`
    /// and checks that they are complete.
    pub fn from_json(json: &str) -> Result<StrategyTable, BlackjackGameError> {
        let file: StrategyFile = serde_json::from_str(json)
            .map_err(|e| BlackjackGameError::InvalidStrategy(e.to_string()))?;

        let mut table = StrategyTable::empty();
        for (class, rows) in [
            (HandClass::Hard, file.hard),
            (HandClass::Soft, file.soft),
            (HandClass::Pair, file.pair),
        ] {
            for (total, row) in rows {
                let total = total as usize;
                if total > MAX_TOTAL {
                    return Err(BlackjackGameError::InvalidStrategy(format!(
                        "{} total {} is out of range",
                        class.name(),
                        total
                    )));
                }
                for (up_card, code) in row {
                    let rank = up_card
                        .parse::<Rank>()
                        .map_err(BlackjackGameError::InvalidStrategy)?;
                    let action = code.parse::<Action>()?;
                    // Ten-valued ranks share a column
                    table.grid_mut(class)[total][dealer_column(rank)] = Some(action);
                }
            }
        }

        table.validate()?;
        Ok(table)
    }

    /// Checks every required row is complete and that splits only appear where the hand can be a pair.
    pub fn validate(&self) -> Result<(), BlackjackGameError> {
        for class in [HandClass::Hard, HandClass::Soft, HandClass::Pair] {
            let grid = self.grid(class);
            for total in class.required_totals() {
                if let Some(col) = grid[total].iter().position(Option::is_none) {
                    return Err(BlackjackGameError::InvalidStrategy(format!(
                        "{} total {} has no entry for dealer column {}",
                        class.name(),
                        total,
                        column_label(col)
                    )));
                }
            }
            for (total, row) in grid.iter().enumerate() {
                let split_allowed =
                    class == HandClass::Pair || (class == HandClass::Soft && total == 12);
                if !split_allowed && row.contains(&Some(Action::Split)) {
                    return Err(BlackjackGameError::InvalidStrategy(format!(
                        "{} total {} cannot be split",
                        class.name(),
                        total
                    )));
                }
            }
        }
        Ok(())
    }

    /// Looks up a single entry, a missing entry is an error rather than a default.
    pub fn lookup(
        &self,
        class: HandClass,
        total: u32,
        up_card: Rank,
    ) -> Result<Action, BlackjackGameError> {
        let missing = BlackjackGameError::MissingStrategyEntry {
            table: class.name(),
            total: u8::try_from(total).unwrap_or(u8::MAX),
            up_card,
        };
        self.grid(class)
            .get(total as usize)
            .and_then(|row| row[dealer_column(up_card)])
            .ok_or(missing)
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        StrategyTable::basic()
    }
}

impl DecisionStrategy for StrategyTable {
    fn decide(&self, hand: &Hand, dealers_up_card: &Card) -> Result<Action, BlackjackGameError> {
        self.lookup(HandClass::of(hand), hand.value(), dealers_up_card.rank())
    }
}

fn column_label(col: usize) -> &'static str {
    ["2", "3", "4", "5", "6", "7", "8", "9", "10", "A"][col]
}

/// Shape of a strategy file on disk.
#[derive(Deserialize)]
struct StrategyFile {
    hard: BTreeMap<u8, BTreeMap<String, String>>,
    soft: BTreeMap<u8, BTreeMap<String, String>>,
    pair: BTreeMap<u8, BTreeMap<String, String>>,
}

#[cfg(test)]
mod test {
    use super::*;
    use parrondo_lib::Rank::*;

    fn up(rank: Rank) -> Card {
        Card::new(rank)
    }

    /// Serializes a table back into the on-disk JSON shape.
    fn to_json(table: &StrategyTable) -> String {
        let mut out = serde_json::Map::new();
        for class in [HandClass::Hard, HandClass::Soft, HandClass::Pair] {
            let mut rows = serde_json::Map::new();
            for (total, row) in table.grid(class).iter().enumerate() {
                if row.iter().all(Option::is_none) {
                    continue;
                }
                let mut cols = serde_json::Map::new();
                for (col, action) in row.iter().enumerate() {
                    if let Some(action) = action {
                        cols.insert(column_label(col).to_string(), action.code().into());
                    }
                }
                rows.insert(total.to_string(), cols.into());
            }
            out.insert(class.name().to_string(), rows.into());
        }
        serde_json::Value::Object(out).to_string()
    }

    #[test]
    fn test_basic_strategy_is_complete() {
        assert!(BASIC_STRATEGY.validate().is_ok());
    }

    #[test]
    fn test_basic_strategy_decisions() {
        let s = &*BASIC_STRATEGY;
        let eights = Hand::from_ranks(&[Eight, Eight]);
        assert_eq!(s.decide(&eights, &up(Six)).unwrap(), Action::Split);

        let eleven = Hand::from_ranks(&[Five, Six]);
        assert_eq!(s.decide(&eleven, &up(Ten)).unwrap(), Action::Double);
        assert_eq!(s.decide(&eleven, &up(Ace)).unwrap(), Action::Hit);

        let sixteen = Hand::from_ranks(&[Ten, Six]);
        assert_eq!(s.decide(&sixteen, &up(King)).unwrap(), Action::Surrender);
        assert_eq!(s.decide(&sixteen, &up(Four)).unwrap(), Action::Stand);

        let soft_eighteen = Hand::from_ranks(&[Ace, Seven]);
        assert_eq!(s.decide(&soft_eighteen, &up(Nine)).unwrap(), Action::Hit);
        assert_eq!(s.decide(&soft_eighteen, &up(Two)).unwrap(), Action::Stand);

        let aces = Hand::from_ranks(&[Ace, Ace]);
        assert_eq!(HandClass::of(&aces), HandClass::Soft);
        assert_eq!(s.decide(&aces, &up(Seven)).unwrap(), Action::Split);
    }

    #[test]
    fn test_ten_valued_up_cards_share_a_column() {
        for rank in [Ten, Jack, Queen, King] {
            assert_eq!(dealer_column(rank), 8);
        }
        assert_eq!(dealer_column(Two), 0);
        assert_eq!(dealer_column(Ace), 9);
    }

    #[test]
    fn test_missing_entry_is_an_error() {
        let table = StrategyTable::empty();
        let hand = Hand::from_ranks(&[Ten, Six]);
        assert_eq!(
            table.decide(&hand, &up(Seven)),
            Err(BlackjackGameError::MissingStrategyEntry {
                table: "hard",
                total: 16,
                up_card: Seven,
            })
        );
        let busted = BASIC_STRATEGY.lookup(HandClass::Hard, 25, Seven);
        assert!(busted.is_err());
    }

    #[test]
    fn test_json_round_trip_of_basic_strategy() {
        let json = to_json(&BASIC_STRATEGY);
        let loaded = StrategyTable::from_json(&json).unwrap();
        assert_eq!(loaded, *BASIC_STRATEGY);
    }

    #[test]
    fn test_json_rejects_incomplete_tables() {
        let json = r#"{"hard": {"12": {"2": "H"}}, "soft": {}, "pair": {}}"#;
        match StrategyTable::from_json(json) {
            Err(BlackjackGameError::InvalidStrategy(msg)) => assert!(msg.contains("hard total")),
            other => panic!("unexpected result {:?}", other),
        }
    }

    #[test]
    fn test_json_rejects_bad_codes_and_splits() {
        let mut json: serde_json::Value = serde_json::from_str(&to_json(&BASIC_STRATEGY)).unwrap();
        json["hard"]["16"]["K"] = "X".into();
        assert!(StrategyTable::from_json(&json.to_string()).is_err());

        let mut json: serde_json::Value = serde_json::from_str(&to_json(&BASIC_STRATEGY)).unwrap();
        json["hard"]["16"]["10"] = "P".into();
        assert!(StrategyTable::from_json(&json.to_string()).is_err());
    }

    #[test]
    fn test_json_accepts_face_card_columns() {
        let mut json: serde_json::Value = serde_json::from_str(&to_json(&BASIC_STRATEGY)).unwrap();
        json["hard"]["16"]["Q"] = "S".into();
        let table = StrategyTable::from_json(&json.to_string()).unwrap();
        let sixteen = Hand::from_ranks(&[Ten, Six]);
        assert_eq!(table.decide(&sixteen, &up(King)).unwrap(), Action::Stand);
    }
}
