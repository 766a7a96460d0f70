use crate::card::Rank;
use thiserror::Error;

/// Errors raised while dealing, playing or configuring a game of blackjack.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BlackjackGameError {
    #[error("the shoe is empty, no card left to draw")]
    EmptyShoe,

    /// A card was drawn whose rank had no remaining count, the shoe state is corrupted.
    #[error("corrupted shoe: drew a {rank} but none were left to deal")]
    CorruptedShoe { rank: Rank },

    #[error("cannot stack a {rank}, every card of that rank is already placed")]
    StackedRankUnavailable { rank: Rank },

    #[error("a hand of {cards} card(s) holding {hand} cannot be split")]
    InvalidSplit { cards: usize, hand: String },

    #[error("no {table} strategy entry for a total of {total} against a dealer {up_card}")]
    MissingStrategyEntry {
        table: &'static str,
        total: u8,
        up_card: Rank,
    },

    #[error("invalid strategy table: {0}")]
    InvalidStrategy(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
