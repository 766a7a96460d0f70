use crate::game::strategy::{Action, DecisionStrategy};
use parrondo_lib::{BlackjackGameError, Card, Hand, Shoe};
use std::fmt::Display;
use tracing::trace;

/// Struct for a simulated player. Holds every hand the player has in the current round, which grows as hands are
/// split. How each hand is played is entirely decided by the strategy passed to `play`.
#[derive(Debug, Default)]
pub struct Player {
    hands: Vec<Hand>,
    triple_seven: bool,
}

impl Player {
    /// Associated function to create a new `Player`, `triple_seven` decides whether three sevens count as a blackjack.
    pub fn new(triple_seven: bool) -> Player {
        Player {
            hands: vec![],
            triple_seven,
        }
    }

    /// Replaces the player's hands with the freshly dealt ones for a new round.
    pub fn set_hands(&mut self, hands: Vec<Hand>) {
        self.hands = hands;
    }

    /// Adds another freshly dealt hand to the current round.
    pub fn add_hand(&mut self, hand: Hand) {
        self.hands.push(hand);
    }

    pub fn hands(&self) -> &[Hand] {
        &self.hands
    }

    /// Plays every hand in order. Hands created by splitting are appended to the same list and get played once
    /// the hands before them are finished.
    pub fn play<D: DecisionStrategy>(
        &mut self,
        shoe: &mut Shoe,
        strategy: &D,
        dealers_up_card: &Card,
    ) -> Result<(), BlackjackGameError> {
        let mut idx = 0;
        while idx < self.hands.len() {
            self.play_hand(idx, shoe, strategy, dealers_up_card)?;
            idx += 1;
        }
        Ok(())
    }

    /// Plays the hand at `idx` until it stands, doubles, surrenders, busts or makes a blackjack.
    fn play_hand<D: DecisionStrategy>(
        &mut self,
        idx: usize,
        shoe: &mut Shoe,
        strategy: &D,
        dealers_up_card: &Card,
    ) -> Result<(), BlackjackGameError> {
        loop {
            let hand = &mut self.hands[idx];

            // A hand left with one card by a split draws its second card first
            if hand.len() < 2 {
                hand.soften_single_ace();
                hand.add_card(shoe.draw()?);
            }

            if hand.is_busted() || hand.is_blackjack(self.triple_seven) {
                return Ok(());
            }

            let decided = strategy.decide(hand, dealers_up_card)?;
            let action = permitted(decided, hand);
            trace!(hand = %hand, dealer = %dealers_up_card, %action, "player decision");

            match action {
                Action::Hit => hand.add_card(shoe.draw()?),
                Action::Stand => return Ok(()),
                Action::Double => {
                    hand.double();
                    hand.add_card(shoe.draw()?);
                    return Ok(());
                }
                Action::Surrender => {
                    hand.surrender();
                    return Ok(());
                }
                Action::Split => {
                    let new_hand = hand.split()?;
                    self.hands.push(new_hand);
                }
            }
        }
    }
}

/// Doubling and surrendering are only allowed on the first two cards of a hand, otherwise the player hits.
pub fn permitted(action: Action, hand: &Hand) -> Action {
    match action {
        Action::Double | Action::Surrender if hand.len() != 2 => Action::Hit,
        other => other,
    }
}

impl Display for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let hands = self
            .hands
            .iter()
            .map(|h| h.to_string())
            .collect::<Vec<String>>()
            .join(" | ");
        write!(f, "{}", hands)
    }
}
