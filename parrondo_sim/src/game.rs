//! Module that focuses on the simulation of a single game of blackjack. A game deals rounds from one shoe until the
//! shoe needs reshuffling, keeping track of the player's bankroll and everything wagered along the way.

pub mod dealer;
pub mod player;
pub mod settlement;
pub mod strategy;

pub mod prelude {
    pub use super::dealer::Dealer;
    pub use super::player::Player;
    pub use super::settlement::{Outcome, Payout, StakingPolicy};
    pub use super::strategy::{Action, DecisionStrategy, HandClass, StrategyTable, BASIC_STRATEGY};
    pub use super::{BlackjackGameSim, GameRecord, OutcomeTally, RoundResult};
}

use crate::SimulationConfig;
use dealer::Dealer;
use parrondo_lib::{BlackjackGameError, Hand, Shoe};
use player::Player;
use rand::Rng;
use serde::Serialize;
use settlement::Outcome;
use strategy::DecisionStrategy;
use tracing::debug;

/// True count above which count based bet sizing raises the stake to the bet spread.
pub const COUNT_THRESHOLD: f64 = 6.0;

/// Number of hands won, pushed, lost and surrendered, plus the player blackjacks among them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OutcomeTally {
    pub wins: u64,
    pub pushes: u64,
    pub losses: u64,
    pub surrenders: u64,
    pub player_blackjacks: u64,
}

impl OutcomeTally {
    pub fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Won => self.wins += 1,
            Outcome::WonBlackjack => {
                self.wins += 1;
                self.player_blackjacks += 1;
            }
            Outcome::Push => self.pushes += 1,
            Outcome::Lost => self.losses += 1,
            Outcome::Surrender => self.surrenders += 1,
        }
    }

    pub fn merge(&mut self, other: &OutcomeTally) {
        self.wins += other.wins;
        self.pushes += other.pushes;
        self.losses += other.losses;
        self.surrenders += other.surrenders;
        self.player_blackjacks += other.player_blackjacks;
    }

    pub fn hands(&self) -> u64 {
        self.wins + self.pushes + self.losses + self.surrenders
    }
}

/// What a single round paid out.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoundResult {
    pub stake: f64,
    pub winnings: f64,
    pub wagered: f64,
    pub outcomes: Vec<Outcome>,
}

/// Everything recorded over one game, handed back to the simulation driver once the shoe is finished.
#[derive(Debug, Clone, PartialEq)]
pub struct GameRecord {
    pub index: u32,
    pub starting_bankroll: f64,
    pub final_bankroll: f64,
    pub wagered: f64,
    pub rounds: u64,
    pub tally: OutcomeTally,
    pub ruined: bool,
    pub count_history: Vec<f64>,
}

impl GameRecord {
    /// The bankroll won (or lost) over the game.
    pub fn net(&self) -> f64 {
        self.final_bankroll - self.starting_bankroll
    }
}

/// Struct that simulates a game of blackjack: successive rounds dealt from the same shoe until it needs reshuffling.
pub struct BlackjackGameSim {
    config: SimulationConfig,
    shoe: Shoe,
    player: Player,
    dealer: Dealer,
    money: f64,
    bet: f64,
    stake: f64,
    pub rounds: u64,
    pub tally: OutcomeTally,
}

impl BlackjackGameSim {
    /// Associated method for building a new game with a freshly shuffled shoe.
    pub fn new<R: Rng + ?Sized>(config: SimulationConfig, rng: &mut R) -> BlackjackGameSim {
        let shoe = Shoe::new(config.num_decks, config.penetration, rng);
        BlackjackGameSim::with_shoe(config, shoe)
    }

    /// Builds a game around an existing shoe, e.g. a stacked one.
    pub fn with_shoe(config: SimulationConfig, shoe: Shoe) -> BlackjackGameSim {
        BlackjackGameSim {
            player: Player::new(config.triple_seven),
            dealer: Dealer::new(),
            money: config.starting_bankroll,
            bet: 0.0,
            stake: 1.0,
            rounds: 0,
            tally: OutcomeTally::default(),
            config,
            shoe,
        }
    }

    /// Plays rounds until the shoe signals it needs a reshuffle or the player is ruined.
    ///
    /// A round that runs out of cards before it is settled is abandoned and ends the game. Nothing is paid out
    /// before settlement, so the bankroll and wagered total stay as they were after the last full round.
    pub fn play<D: DecisionStrategy>(&mut self, strategy: &D) -> Result<(), BlackjackGameError> {
        while !self.shoe.needs_reshuffle() && !self.is_ruined() {
            match self.play_round(strategy) {
                Ok(_) => {}
                Err(BlackjackGameError::EmptyShoe) => {
                    debug!(rounds = self.rounds, "shoe ran out mid round, game over");
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        if self.is_ruined() {
            debug!(rounds = self.rounds, bankroll = self.money, "player ruined");
        }
        Ok(())
    }

    /// True once the bankroll is used up.
    pub fn is_ruined(&self) -> bool {
        self.money <= 0.0
    }

    /// Plays a single round: sizes the stake, deals, lets the player and then the dealer play, and settles every
    /// player hand against the bankroll as it was at the start of the round.
    pub fn play_round<D: DecisionStrategy>(
        &mut self,
        strategy: &D,
    ) -> Result<RoundResult, BlackjackGameError> {
        // The count only ever influences the size of the stake
        self.stake = if self.config.count_sizing && self.shoe.true_count() > COUNT_THRESHOLD {
            self.config.bet_spread
        } else {
            1.0
        };
        let base_bet = self.config.staking.base_bet(self.stake, self.money);

        let first_hand = Hand::from_cards([self.shoe.draw()?, self.shoe.draw()?]);
        let up_card = self.shoe.draw()?;
        self.dealer.set_hand(Hand::from_cards([up_card]));
        self.player.set_hands(vec![first_hand]);

        if self.config.two_hands {
            let second_hand = Hand::from_cards([self.shoe.draw()?, self.shoe.draw()?]);
            self.player.add_hand(second_hand);
        }

        debug!(dealer = %self.dealer.hand(), player = %self.player, "dealt round");

        self.player.play(&mut self.shoe, strategy, &up_card)?;
        self.dealer.play(&mut self.shoe)?;

        // Bankroll changes only once every hand is settled
        let mut round = RoundResult {
            stake: self.stake,
            ..RoundResult::default()
        };
        for hand in self.player.hands() {
            let outcome = Outcome::of(hand, self.dealer.hand(), self.config.triple_seven);
            let payout = self
                .config
                .staking
                .payout(outcome, hand.is_doubled(), base_bet);
            debug!(
                hand = %hand,
                %outcome,
                doubled = hand.is_doubled(),
                win = payout.win,
                bet = payout.bet,
                "settled hand"
            );
            round.winnings += payout.win;
            round.wagered += payout.bet;
            round.outcomes.push(outcome);
            self.tally.record(outcome);
        }

        self.money += round.winnings;
        self.bet += round.wagered;
        self.rounds += 1;

        debug!(
            dealer = %self.dealer.hand(),
            winnings = round.winnings,
            wagered = round.wagered,
            bankroll = self.money,
            true_count = self.shoe.true_count(),
            "finished round"
        );
        Ok(round)
    }

    /// Getter method for the player's current bankroll.
    pub fn money(&self) -> f64 {
        self.money
    }

    /// Total amount wagered so far.
    pub fn bet(&self) -> f64 {
        self.bet
    }

    pub fn shoe(&self) -> &Shoe {
        &self.shoe
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn dealer(&self) -> &Dealer {
        &self.dealer
    }

    /// Consumes the finished game into the record the driver aggregates.
    pub fn into_record(mut self, index: u32) -> GameRecord {
        let count_history = if self.config.record_count_history {
            self.shoe.take_count_history()
        } else {
            Vec::new()
        };
        GameRecord {
            index,
            starting_bankroll: self.config.starting_bankroll,
            final_bankroll: self.money,
            wagered: self.bet,
            rounds: self.rounds,
            tally: self.tally,
            ruined: self.is_ruined(),
            count_history,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::game::settlement::StakingPolicy;
    use crate::game::strategy::BASIC_STRATEGY;
    use parrondo_lib::Rank::{self, *};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn game_with(config: SimulationConfig, decks: usize, next: &[Rank]) -> BlackjackGameSim {
        let mut rng = ChaCha8Rng::seed_from_u64(31);
        let shoe = Shoe::stacked(decks, config.penetration, &mut rng, next).unwrap();
        BlackjackGameSim::with_shoe(config, shoe)
    }

    #[test]
    fn test_split_eights_settled_independently() {
        let config = SimulationConfig::new().build();
        // Player 8 8, dealer 6. First hand draws a ten, second a three and doubles onto a ten.
        // Dealer draws ten, ten and busts.
        let mut game = game_with(
            config,
            6,
            &[Eight, Eight, Six, Ten, Three, Ten, Ten, Ten],
        );
        let round = game.play_round(&*BASIC_STRATEGY).unwrap();

        assert_eq!(game.player().hands().len(), 2);
        assert!(game.dealer().hand().is_busted());
        assert_eq!(round.outcomes, vec![Outcome::Won, Outcome::Won]);
        assert_eq!(round.winnings, 3.0);
        assert_eq!(round.wagered, 3.0);
        assert_eq!(game.money(), 10_003.0);
        assert_eq!(game.bet(), 3.0);
        assert_eq!(game.tally.wins, 2);
    }

    #[test]
    fn test_two_hands_share_dealer_and_round_bankroll() {
        let config = SimulationConfig::new()
            .staking(StakingPolicy::Lenient)
            .two_hands(true)
            .build();
        // First hand 10 9, dealer 7, second hand 10 8, dealer draws a ten for 17
        let mut game = game_with(config, 6, &[Ten, Nine, Seven, Ten, Eight, Ten]);
        let round = game.play_round(&*BASIC_STRATEGY).unwrap();

        assert_eq!(round.outcomes, vec![Outcome::Won, Outcome::Lost]);
        // Both hands stake 5% of the bankroll at the start of the round
        assert_eq!(round.wagered, 1_000.0);
        assert_eq!(round.winnings, 0.0);
        assert_eq!(game.money(), 10_000.0);
    }

    #[test]
    fn test_dealer_blackjack_beats_split_twenty_one() {
        let config = SimulationConfig::new().build();
        // Aces split vs a dealer ace, each ace draws a king, dealer completes a blackjack with a queen
        let mut game = game_with(config, 6, &[Ace, Ace, Ace, King, King, Queen]);
        let round = game.play_round(&*BASIC_STRATEGY).unwrap();
        assert!(game.dealer().hand().is_blackjack(false));
        assert_eq!(round.outcomes, vec![Outcome::Lost, Outcome::Lost]);
        assert_eq!(round.winnings, -2.0);
    }

    /// A single deck game whose first twelve cards (all fours, fives and sixes) are already dealt, leaving a
    /// true count above 30. `round` is dealt next.
    fn high_count_game(config: SimulationConfig, round: &[Rank]) -> BlackjackGameSim {
        let mut prefix = Vec::new();
        for _ in 0..4 {
            prefix.extend_from_slice(&[Four, Five, Six]);
        }
        let mut next = prefix.clone();
        next.extend_from_slice(round);
        let mut game = game_with(config, 1, &next);
        for _ in 0..prefix.len() {
            game.shoe.draw().unwrap();
        }
        game
    }

    #[test]
    fn test_count_sizing_raises_stake_on_high_count() {
        // Player 10 9 against a dealer 7 that draws a ten
        let cards = [Ten, Nine, Seven, Ten];
        let sized = SimulationConfig::new().count_sizing(true).build();
        let mut game = high_count_game(sized, &cards);
        assert!(game.shoe().true_count() > COUNT_THRESHOLD);
        let round = game.play_round(&*BASIC_STRATEGY).unwrap();
        assert_eq!(round.stake, 19.0);
        assert_eq!(round.winnings, 19.0);
        assert_eq!(round.wagered, 19.0);

        let mut game = high_count_game(SimulationConfig::default(), &cards);
        let round = game.play_round(&*BASIC_STRATEGY).unwrap();
        assert_eq!(round.stake, 1.0);
        assert_eq!(round.wagered, 1.0);
    }

    #[test]
    fn test_ruined_player_stops_playing() {
        let config = SimulationConfig::new()
            .staking(StakingPolicy::Strict)
            .count_sizing(true)
            .two_hands(true)
            .starting_bankroll(100.0)
            .build();
        // Hands of 19 and 18 both lose to the dealer's 20, each staking 95% of the bankroll
        let mut game = high_count_game(config, &[Ten, Nine, King, Queen, Eight, Jack]);
        game.play(&*BASIC_STRATEGY).unwrap();

        assert_eq!(game.rounds, 1);
        assert!(!game.shoe().needs_reshuffle());
        assert!(game.is_ruined());
        assert_eq!(game.money(), -90.0);
        assert_eq!(game.bet(), 190.0);

        let record = game.into_record(0);
        assert!(record.ruined);
        assert!(record.wagered > 0.0);
    }

    #[test]
    fn test_running_out_of_cards_ends_game() {
        // The reshuffle flag only flips on the last card, so the final round usually runs the shoe dry
        let config = SimulationConfig::new().num_decks(1).penetration(0.01).build();
        for seed in 0..20 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let mut game = BlackjackGameSim::new(config, &mut rng);
            game.play(&*BASIC_STRATEGY).unwrap();
            assert_eq!(game.shoe().remaining_cards(), 0);
            assert!(game.rounds > 0);
            // The abandoned round paid nothing and wagered nothing
            assert!(game.tally.hands() as f64 <= game.bet());
        }
    }

    #[test]
    fn test_game_ends_when_shoe_needs_reshuffle() {
        let config = SimulationConfig::new().build();
        let mut rng = ChaCha8Rng::seed_from_u64(32);
        let mut game = BlackjackGameSim::new(config, &mut rng);
        game.play(&*BASIC_STRATEGY).unwrap();
        assert!(game.shoe().needs_reshuffle());
        assert!(game.rounds > 0);
        // Every flat hand wagers at least one unit
        assert!(game.tally.hands() as f64 <= game.bet());

        let rounds = game.rounds;
        let record = game.into_record(0);
        assert_eq!(record.rounds, rounds);
        // Initial count plus one entry per card dealt
        let dealt = 312 - (record.count_history.len() - 1);
        assert!(dealt as f64 >= 312.0 * 0.75);
    }
}
