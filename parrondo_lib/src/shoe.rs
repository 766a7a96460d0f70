use crate::card::{Card, Rank};
use crate::error::BlackjackGameError;
use rand::seq::SliceRandom;
use rand::Rng;

/// Number of cards in a single deck.
pub const DECK_SIZE: usize = 52;

/// A shoe made of several shuffled decks. Tracks which ranks are left, the running count of the dealt cards
/// and whether enough of the shoe has been dealt that it should be reshuffled.
#[derive(Debug, Clone)]
pub struct Shoe {
    decks: usize,
    cards: Vec<Card>,
    remaining_by_rank: [usize; 13],
    running_count: i32,
    penetration_threshold: f64,
    needs_reshuffle: bool,
    count_history: Vec<f64>,
}

impl Shoe {
    /// Associated method for building a freshly shuffled shoe of `decks` decks.
    /// `penetration_threshold` is the fraction of the shoe below which a reshuffle is signalled.
    pub fn new<R: Rng + ?Sized>(decks: usize, penetration_threshold: f64, rng: &mut R) -> Shoe {
        let mut cards = Vec::with_capacity(decks * DECK_SIZE);
        for _ in 0..decks {
            for rank in Rank::ALL {
                for _ in 0..4 {
                    cards.push(Card::new(rank));
                }
            }
        }
        cards.shuffle(rng);

        Shoe {
            decks,
            cards,
            remaining_by_rank: [4 * decks; 13],
            running_count: 0,
            penetration_threshold,
            needs_reshuffle: false,
            count_history: vec![0.0],
        }
    }

    /// Builds a shuffled shoe whose next draws are `next` in order. The composition of the shoe is unchanged,
    /// the requested cards are only moved to the top. Fails if more cards of a rank are requested than the shoe holds.
    pub fn stacked<R: Rng + ?Sized>(
        decks: usize,
        penetration_threshold: f64,
        rng: &mut R,
        next: &[Rank],
    ) -> Result<Shoe, BlackjackGameError> {
        let mut shoe = Shoe::new(decks, penetration_threshold, rng);
        let mut top = Vec::with_capacity(next.len());
        for &rank in next {
            let pos = shoe
                .cards
                .iter()
                .position(|c| c.rank() == rank)
                .ok_or(BlackjackGameError::StackedRankUnavailable { rank })?;
            top.push(shoe.cards.remove(pos));
        }
        // Cards are dealt from the back
        shoe.cards.extend(top.into_iter().rev());
        Ok(shoe)
    }

    /// Deals the next card off the shoe and updates the count.
    ///
    /// Returns `BlackjackGameError::CorruptedShoe` if the drawn rank was already exhausted, which can only
    /// happen if the shoe's bookkeeping is broken.
    pub fn draw(&mut self) -> Result<Card, BlackjackGameError> {
        let card = self.cards.pop().ok_or(BlackjackGameError::EmptyShoe)?;
        let rank = card.rank();

        let remaining = &mut self.remaining_by_rank[rank.index()];
        if *remaining == 0 {
            return Err(BlackjackGameError::CorruptedShoe { rank });
        }
        *remaining -= 1;

        self.running_count += rank.count_weight();
        let true_count = self.true_count();
        self.count_history.push(true_count);

        if self.penetration() < self.penetration_threshold {
            self.needs_reshuffle = true;
        }

        tracing::trace!(
            card = %card,
            running_count = self.running_count,
            true_count,
            remaining = self.cards.len(),
            "dealt card"
        );
        Ok(card)
    }

    /// Fraction of the initial cards still in the shoe.
    pub fn penetration(&self) -> f64 {
        self.cards.len() as f64 / (self.decks * DECK_SIZE) as f64
    }

    /// The running count divided by the number of decks left in the shoe.
    pub fn true_count(&self) -> f64 {
        // Never divide by less than one card's worth of a deck
        let decks_left = f64::max(
            self.decks as f64 * self.penetration(),
            1.0 / DECK_SIZE as f64,
        );
        self.running_count as f64 / decks_left
    }

    pub fn running_count(&self) -> i32 {
        self.running_count
    }

    /// Sticky flag, true once the shoe has been dealt past its penetration threshold.
    pub fn needs_reshuffle(&self) -> bool {
        self.needs_reshuffle
    }

    /// Number of cards of `rank` still in the shoe.
    pub fn remaining(&self, rank: Rank) -> usize {
        self.remaining_by_rank[rank.index()]
    }

    pub fn remaining_cards(&self) -> usize {
        self.cards.len()
    }

    /// True count recorded after every draw, starting with the count of the fresh shoe.
    pub fn count_history(&self) -> &[f64] {
        &self.count_history
    }

    /// Moves the recorded count history out of the shoe.
    pub fn take_count_history(&mut self) -> Vec<f64> {
        std::mem::take(&mut self.count_history)
    }
}
