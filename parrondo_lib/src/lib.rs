//! Building blocks for a multi-deck blackjack simulation: cards, a counting shoe and hands.

pub mod card;
pub mod error;
pub mod hand;
pub mod shoe;

pub use card::{Card, Rank};
pub use error::BlackjackGameError;
pub use hand::Hand;
pub use shoe::{Shoe, DECK_SIZE};
