use std::fmt::Display;
use std::str::FromStr;

/// The thirteen ranks of a standard deck. Suits play no part in blackjack so they are not modelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Rank {
    Ace,
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
}

impl Rank {
    /// Every rank, in deck order. `Rank::ALL[r.index()] == r`.
    pub const ALL: [Rank; 13] = [
        Rank::Ace,
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
    ];

    /// Position of the rank inside `Rank::ALL`, used to index per-rank tables.
    pub fn index(self) -> usize {
        self as usize
    }

    /// The value a freshly dealt card of this rank is worth. Aces start out at 11.
    pub fn base_value(self) -> u8 {
        match self {
            Rank::Ace => 11,
            Rank::Two => 2,
            Rank::Three => 3,
            Rank::Four => 4,
            Rank::Five => 5,
            Rank::Six => 6,
            Rank::Seven => 7,
            Rank::Eight => 8,
            Rank::Nine => 9,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => 10,
        }
    }

    /// Weight this rank adds to the running count when it leaves the shoe.
    pub fn count_weight(self) -> i32 {
        match self {
            Rank::Ace | Rank::Eight => 0,
            Rank::Two | Rank::Three | Rank::Seven => 1,
            Rank::Four | Rank::Five | Rank::Six => 2,
            Rank::Nine => -1,
            Rank::Ten | Rank::Jack | Rank::Queen | Rank::King => -2,
        }
    }

    /// Short symbol used when printing hands.
    pub fn symbol(self) -> &'static str {
        match self {
            Rank::Ace => "A",
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Rank::Ace => "Ace",
            Rank::Two => "Two",
            Rank::Three => "Three",
            Rank::Four => "Four",
            Rank::Five => "Five",
            Rank::Six => "Six",
            Rank::Seven => "Seven",
            Rank::Eight => "Eight",
            Rank::Nine => "Nine",
            Rank::Ten => "Ten",
            Rank::Jack => "Jack",
            Rank::Queen => "Queen",
            Rank::King => "King",
        }
    }
}

impl Display for Rank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl FromStr for Rank {
    type Err = String;

    /// Accepts symbols (`A`, `2`..`10`, `T`, `J`, `Q`, `K`) and full names (`Ace`, `Two`, ...), case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Rank::ALL
            .iter()
            .copied()
            .find(|rank| {
                rank.symbol().eq_ignore_ascii_case(trimmed)
                    || rank.name().eq_ignore_ascii_case(trimmed)
            })
            .or_else(|| trimmed.eq_ignore_ascii_case("t").then_some(Rank::Ten))
            .ok_or_else(|| format!("unknown card rank '{}'", s))
    }
}

/// A single playing card. The value is fixed by the rank except for an Ace, which can be worth 11 or 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Card {
    rank: Rank,
    value: u8,
}

impl Card {
    /// Associated method for creating a card at its initial value.
    pub fn new(rank: Rank) -> Card {
        Card {
            rank,
            value: rank.base_value(),
        }
    }

    pub fn rank(&self) -> Rank {
        self.rank
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    pub fn is_ace(&self) -> bool {
        self.rank == Rank::Ace
    }

    /// Returns true if the card is an Ace currently counted as 11.
    pub fn is_soft_ace(&self) -> bool {
        self.is_ace() && self.value == 11
    }

    /// Counts an Ace as 11 again. Has no effect on any other rank.
    pub fn soften(&mut self) {
        if self.is_ace() {
            self.value = 11;
        }
    }

    /// Demotes a soft Ace to 1, returns whether anything changed.
    pub(crate) fn harden(&mut self) -> bool {
        if self.is_soft_ace() {
            self.value = 1;
            true
        } else {
            false
        }
    }
}

impl Display for Card {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.rank)
    }
}
