use crate::card::{Card, Rank};
use crate::error::BlackjackGameError;
use std::fmt::Display;

/// A hand of cards held by the player or the dealer.
///
/// Aces are demoted from 11 to 1 as cards arrive, in the order they appear in the hand and only while the
/// total is over 21, so the card values always describe the hand's current state. Every derived property is
/// recomputed from the cards on access.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hand {
    cards: Vec<Card>,
    split_result: bool,
    doubled: bool,
    surrendered: bool,
}

impl Hand {
    /// Associated method for an empty hand.
    pub fn new() -> Hand {
        Hand::default()
    }

    /// Builds a hand by adding each card of `cards` in order.
    pub fn from_cards<I: IntoIterator<Item = Card>>(cards: I) -> Hand {
        let mut hand = Hand::new();
        for card in cards {
            hand.add_card(card);
        }
        hand
    }

    /// Convenience for building a hand straight from ranks.
    pub fn from_ranks(ranks: &[Rank]) -> Hand {
        Hand::from_cards(ranks.iter().map(|&r| Card::new(r)))
    }

    /// Method for receiving a card, demotes soft Aces if the new card pushes the hand over 21.
    pub fn add_card(&mut self, card: Card) {
        self.cards.push(card);
        let mut total = self.raw_total();
        for card in self.cards.iter_mut() {
            if total <= 21 {
                break;
            }
            if card.harden() {
                total -= 10;
            }
        }
    }

    fn raw_total(&self) -> u32 {
        self.cards.iter().map(|c| c.value() as u32).sum()
    }

    /// The value of the hand with every Ace counted at its current value.
    pub fn value(&self) -> u32 {
        self.raw_total()
    }

    /// Returns true if at least one Ace is counted as 11.
    pub fn is_soft(&self) -> bool {
        self.cards.iter().any(Card::is_soft_ace)
    }

    /// Returns true if the hand is exactly two cards of the same rank.
    pub fn is_splittable(&self) -> bool {
        self.cards.len() == 2 && self.cards[0].rank() == self.cards[1].rank()
    }

    /// A hand that came from a split never counts as a blackjack. A three card hand of sevens counts only
    /// when `triple_seven` is enabled.
    pub fn is_blackjack(&self, triple_seven: bool) -> bool {
        if self.split_result || self.value() != 21 {
            return false;
        }
        match self.cards.len() {
            2 => true,
            3 => triple_seven && self.cards.iter().all(|c| c.rank() == Rank::Seven),
            _ => false,
        }
    }

    pub fn is_busted(&self) -> bool {
        self.value() > 21
    }

    /// Splits a pair, moving the second card into a new hand that is returned. Both hands are marked as split
    /// results and each needs another card before it can be played.
    pub fn split(&mut self) -> Result<Hand, BlackjackGameError> {
        if !self.is_splittable() {
            return Err(BlackjackGameError::InvalidSplit {
                cards: self.cards.len(),
                hand: self.to_string(),
            });
        }
        let card = self.cards.remove(1);
        self.split_result = true;
        Ok(Hand {
            cards: vec![card],
            split_result: true,
            doubled: false,
            surrendered: false,
        })
    }

    /// Counts the lone Ace of a one card hand as 11 again, used before a split hand receives its second card.
    pub fn soften_single_ace(&mut self) {
        if let [card] = self.cards.as_mut_slice() {
            card.soften();
        }
    }

    pub fn double(&mut self) {
        self.doubled = true;
    }

    pub fn surrender(&mut self) {
        self.surrendered = true;
    }

    pub fn is_split_result(&self) -> bool {
        self.split_result
    }

    pub fn is_doubled(&self) -> bool {
        self.doubled
    }

    pub fn is_surrendered(&self) -> bool {
        self.surrendered
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// The first card of the hand, i.e. the dealer's face up card.
    pub fn first(&self) -> Option<&Card> {
        self.cards.first()
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

impl Display for Hand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for card in self.cards.iter() {
            write!(f, "{} ", card)?;
        }
        write!(f, "({})", self.value())
    }
}
