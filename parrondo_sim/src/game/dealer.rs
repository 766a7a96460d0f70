use parrondo_lib::{BlackjackGameError, Hand, Shoe};

/// Value the dealer stands on.
pub const DEALER_STANDS_ON: u32 = 17;

/// The dealer's side of the table. Plays a fixed policy, there are no decisions to make.
#[derive(Debug, Default)]
pub struct Dealer {
    hand: Hand,
}

impl Dealer {
    pub fn new() -> Dealer {
        Dealer::default()
    }

    /// Starts a new round with the dealer's face up card.
    pub fn set_hand(&mut self, hand: Hand) {
        self.hand = hand;
    }

    pub fn hand(&self) -> &Hand {
        &self.hand
    }

    /// Draws until the hand is worth at least 17. Soft totals are not treated specially.
    pub fn play(&mut self, shoe: &mut Shoe) -> Result<(), BlackjackGameError> {
        while self.hand.value() < DEALER_STANDS_ON {
            self.hand.add_card(shoe.draw()?);
        }
        Ok(())
    }
}
