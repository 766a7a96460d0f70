//! Deciding the outcome of each player hand and what it pays under the different staking policies.

use parrondo_lib::Hand;
use serde::{Deserialize, Serialize};
use std::fmt::Display;

/// Fraction of the bankroll staked on each hand by the percentage policies.
pub const BANKROLL_FRACTION: f64 = 0.05;

/// Result of a single player hand against the dealer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    Lost,
    Won,
    WonBlackjack,
    Push,
    Surrender,
}

impl Outcome {
    /// Compares a finished player hand against the dealer's finished hand.
    pub fn of(hand: &Hand, dealers_hand: &Hand, triple_seven: bool) -> Outcome {
        if hand.is_surrendered() {
            return Outcome::Surrender;
        }
        if hand.is_busted() {
            return Outcome::Lost;
        }

        let dealer_blackjack = dealers_hand.is_blackjack(triple_seven);
        if hand.is_blackjack(triple_seven) {
            return if dealer_blackjack {
                Outcome::Push
            } else {
                Outcome::WonBlackjack
            };
        }
        if dealers_hand.is_busted() {
            return Outcome::Won;
        }

        let (player, dealer) = (hand.value(), dealers_hand.value());
        if player > dealer {
            Outcome::Won
        } else if player < dealer {
            Outcome::Lost
        } else if dealer_blackjack {
            // A player's 21 that is not a blackjack loses to the dealer's blackjack
            Outcome::Lost
        } else {
            Outcome::Push
        }
    }
}

impl Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Outcome::Lost => "LOST",
            Outcome::Won => "WON",
            Outcome::WonBlackjack => "WON 3:2",
            Outcome::Push => "PUSH",
            Outcome::Surrender => "SURRENDER",
        };
        write!(f, "{}", label)
    }
}

/// How much is staked on each hand and how the outcomes pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum StakingPolicy {
    /// A fixed stake unit per hand, blackjack pays 3:2 and surrender returns half the bet.
    #[default]
    Flat,
    /// 5% of the bankroll per hand, blackjack pays even money and surrender loses the whole bet.
    Strict,
    /// 5% of the bankroll per hand with the usual 3:2 blackjack and half-bet surrender.
    Lenient,
}

/// Winnings (negative for a loss) and the amount wagered on one hand.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Payout {
    pub win: f64,
    pub bet: f64,
}

impl StakingPolicy {
    /// The amount staked on each hand of a round. `stake` is the round's stake unit and `bankroll` the
    /// bankroll at the start of the round. A bankroll at or below zero stakes nothing.
    pub fn base_bet(self, stake: f64, bankroll: f64) -> f64 {
        match self {
            StakingPolicy::Flat => stake,
            StakingPolicy::Strict | StakingPolicy::Lenient => {
                stake * (BANKROLL_FRACTION * bankroll.max(0.0))
            }
        }
    }

    /// Pays out a single hand. A doubled hand wins or loses twice as much and counts twice the bet.
    pub fn payout(self, outcome: Outcome, doubled: bool, base_bet: f64) -> Payout {
        let multiplier = match (self, outcome) {
            (_, Outcome::Lost) => -1.0,
            (_, Outcome::Won) => 1.0,
            (_, Outcome::Push) => 0.0,
            (StakingPolicy::Strict, Outcome::WonBlackjack) => 1.0,
            (_, Outcome::WonBlackjack) => 1.5,
            (StakingPolicy::Strict, Outcome::Surrender) => -1.0,
            (_, Outcome::Surrender) => -0.5,
        };
        let factor = if doubled { 2.0 } else { 1.0 };
        Payout {
            win: multiplier * base_bet * factor,
            bet: base_bet * factor,
        }
    }
}

impl Display for StakingPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            StakingPolicy::Flat => "flat",
            StakingPolicy::Strict => "strict",
            StakingPolicy::Lenient => "lenient",
        };
        write!(f, "{}", label)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use parrondo_lib::Rank::*;

    #[test]
    fn test_flat_payouts() {
        let base = StakingPolicy::Flat.base_bet(1.0, 10_000.0);
        assert_eq!(base, 1.0);
        let p = StakingPolicy::Flat.payout(Outcome::WonBlackjack, false, base);
        assert_eq!(p, Payout { win: 1.5, bet: 1.0 });
        let p = StakingPolicy::Flat.payout(Outcome::Surrender, false, base);
        assert_eq!(p, Payout { win: -0.5, bet: 1.0 });
        let p = StakingPolicy::Flat.payout(Outcome::Won, true, 19.0);
        assert_eq!(p, Payout { win: 38.0, bet: 38.0 });
        let p = StakingPolicy::Flat.payout(Outcome::Push, true, 1.0);
        assert_eq!(p, Payout { win: 0.0, bet: 2.0 });
    }

    #[test]
    fn test_lenient_payouts() {
        let base = StakingPolicy::Lenient.base_bet(1.0, 10_000.0);
        assert_eq!(base, 500.0);
        let p = StakingPolicy::Lenient.payout(Outcome::Surrender, false, base);
        assert_eq!(p, Payout { win: -250.0, bet: 500.0 });
        let p = StakingPolicy::Lenient.payout(Outcome::WonBlackjack, false, base);
        assert_eq!(p, Payout { win: 750.0, bet: 500.0 });
    }

    #[test]
    fn test_strict_payouts() {
        let base = StakingPolicy::Strict.base_bet(1.0, 10_000.0);
        let p = StakingPolicy::Strict.payout(Outcome::WonBlackjack, false, base);
        assert_eq!(p, Payout { win: 500.0, bet: 500.0 });
        let p = StakingPolicy::Strict.payout(Outcome::Surrender, false, base);
        assert_eq!(p, Payout { win: -500.0, bet: 500.0 });
        let p = StakingPolicy::Strict.payout(Outcome::Lost, true, base);
        assert_eq!(p, Payout { win: -1000.0, bet: 1000.0 });
        // The stake unit scales the percentage bet as well
        assert_eq!(StakingPolicy::Strict.base_bet(19.0, 1_000.0), 950.0);
    }

    #[test]
    fn test_percentage_bet_never_negative() {
        assert_eq!(StakingPolicy::Strict.base_bet(19.0, -90.0), 0.0);
        assert_eq!(StakingPolicy::Lenient.base_bet(1.0, 0.0), 0.0);
        let p = StakingPolicy::Strict.payout(Outcome::Lost, true, 0.0);
        assert_eq!(p.bet, 0.0);
        assert!(p.win <= 0.0);
    }

    #[test]
    fn test_outcomes() {
        let dealer_20 = Hand::from_ranks(&[King, Queen]);
        let dealer_bj = Hand::from_ranks(&[Ace, King]);
        let dealer_bust = Hand::from_ranks(&[King, Six, Nine]);

        assert_eq!(
            Outcome::of(&Hand::from_ranks(&[Ace, Jack]), &dealer_20, false),
            Outcome::WonBlackjack
        );
        assert_eq!(
            Outcome::of(&Hand::from_ranks(&[Ace, Jack]), &dealer_bj, false),
            Outcome::Push
        );
        assert_eq!(
            Outcome::of(&Hand::from_ranks(&[Nine, Queen]), &dealer_20, false),
            Outcome::Lost
        );
        assert_eq!(
            Outcome::of(&Hand::from_ranks(&[Ten, Queen]), &dealer_20, false),
            Outcome::Push
        );
        assert_eq!(
            Outcome::of(&Hand::from_ranks(&[Two, Three]), &dealer_bust, false),
            Outcome::Won
        );
        // Both bust: the player loses
        assert_eq!(
            Outcome::of(&Hand::from_ranks(&[Ten, Five, King]), &dealer_bust, false),
            Outcome::Lost
        );
        // A three card 21 loses to a dealer blackjack
        assert_eq!(
            Outcome::of(&Hand::from_ranks(&[Seven, Seven, Seven]), &dealer_bj, false),
            Outcome::Lost
        );
        // unless three sevens are a blackjack themselves
        assert_eq!(
            Outcome::of(&Hand::from_ranks(&[Seven, Seven, Seven]), &dealer_bj, true),
            Outcome::Push
        );

        let mut surrendered = Hand::from_ranks(&[Ten, Six]);
        surrendered.surrender();
        assert_eq!(
            Outcome::of(&surrendered, &dealer_bust, false),
            Outcome::Surrender
        );
    }

    #[test]
    fn test_outcome_labels() {
        assert_eq!(Outcome::WonBlackjack.to_string(), "WON 3:2");
        assert_eq!(Outcome::Surrender.to_string(), "SURRENDER");
    }
}
