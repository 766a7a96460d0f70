pub mod game;
pub mod write;

pub use game::prelude::*;
use parrondo_lib::BlackjackGameError;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::path::PathBuf;
use std::sync::mpsc;
use std::thread;
use thiserror::Error;
use tracing::{debug, info};

pub mod prelude {
    pub use super::{
        game::prelude::*, parrondo_comparison, BlackjackSimulator, GameResult, SimulationConfig,
        SimulationConfigBuilder, SimulationConfigFile, SimulationError, SimulationSummary,
    };
}

/// Errors that can end a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error("game #{game} failed: {source}")]
    Game {
        game: u32,
        #[source]
        source: BlackjackGameError,
    },
    #[error(transparent)]
    Config(BlackjackGameError),
    #[error("failed to load strategy table: {0}")]
    Strategy(#[source] BlackjackGameError),
    #[error("a simulation worker thread panicked")]
    WorkerPanicked,
    #[error("result channel closed early: {0}")]
    Channel(String),
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Struct for configuring a simulation run. Immutable once built, every game of the run shares it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SimulationConfig {
    pub num_decks: usize,
    pub penetration: f64,
    pub bet_spread: f64,
    pub triple_seven: bool,
    pub staking: StakingPolicy,
    pub count_sizing: bool,
    pub two_hands: bool,
    pub num_games: u32,
    pub starting_bankroll: f64,
    pub seed: Option<u64>,
    pub threads: usize,
    pub record_count_history: bool,
}

impl SimulationConfig {
    /// Associated method for returning a new `SimulationConfigBuilder` object. Every option left unset takes the
    /// default documented on the builder method.
    pub fn new() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Checks the configuration before any game is played.
    pub fn validate(&self) -> Result<(), BlackjackGameError> {
        let invalid = |msg: &str| Err(BlackjackGameError::InvalidConfig(msg.to_string()));
        if self.num_decks == 0 {
            return invalid("the shoe needs at least one deck");
        }
        if !(self.penetration > 0.0 && self.penetration < 1.0) {
            return invalid("penetration threshold must lie strictly between 0 and 1");
        }
        if !(self.bet_spread > 0.0) {
            return invalid("bet spread must be positive");
        }
        if !(self.starting_bankroll > 0.0) {
            return invalid("starting bankroll must be positive");
        }
        if self.num_games == 0 {
            return invalid("at least one game must be played");
        }
        if self.threads == 0 {
            return invalid("at least one worker thread is required");
        }
        Ok(())
    }

    /// Short description of the betting policy, used to label summaries.
    pub fn label(&self) -> String {
        let mut label = self.staking.to_string();
        if self.count_sizing {
            label.push_str(", count sizing");
        }
        if self.two_hands {
            label.push_str(", two hands");
        }
        if self.triple_seven {
            label.push_str(", triple seven");
        }
        label
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig::new().build()
    }
}

/// Struct to implement builder pattern for `SimulationConfig`
#[derive(Debug, Clone, Copy, Default)]
pub struct SimulationConfigBuilder {
    num_decks: Option<usize>,
    penetration: Option<f64>,
    bet_spread: Option<f64>,
    triple_seven: Option<bool>,
    staking: Option<StakingPolicy>,
    count_sizing: Option<bool>,
    two_hands: Option<bool>,
    num_games: Option<u32>,
    starting_bankroll: Option<f64>,
    seed: Option<u64>,
    threads: Option<usize>,
    record_count_history: Option<bool>,
}

impl SimulationConfigBuilder {
    /// Number of decks in each shoe, default 6.
    pub fn num_decks(&mut self, decks: usize) -> &mut Self {
        self.num_decks = Some(decks);
        self
    }

    /// Fraction of the shoe left when a reshuffle is needed, default 0.25.
    pub fn penetration(&mut self, threshold: f64) -> &mut Self {
        self.penetration = Some(threshold);
        self
    }

    /// Stake unit used when count sizing triggers, default 19.
    pub fn bet_spread(&mut self, spread: f64) -> &mut Self {
        self.bet_spread = Some(spread);
        self
    }

    /// Whether three sevens count as a blackjack, default false.
    pub fn triple_seven(&mut self, triple_seven: bool) -> &mut Self {
        self.triple_seven = Some(triple_seven);
        self
    }

    /// Method for choosing how hands are staked and paid, default flat.
    pub fn staking(&mut self, staking: StakingPolicy) -> &mut Self {
        self.staking = Some(staking);
        self
    }

    /// Raise the stake to the bet spread when the true count is high, default false.
    pub fn count_sizing(&mut self, count_sizing: bool) -> &mut Self {
        self.count_sizing = Some(count_sizing);
        self
    }

    /// Deal the player a second hand every round, default false.
    pub fn two_hands(&mut self, two_hands: bool) -> &mut Self {
        self.two_hands = Some(two_hands);
        self
    }

    /// Number of games (one shoe each) to play, default 1000.
    pub fn num_games(&mut self, games: u32) -> &mut Self {
        self.num_games = Some(games);
        self
    }

    /// Bankroll at the start of every game, default 10 000.
    pub fn starting_bankroll(&mut self, bankroll: f64) -> &mut Self {
        self.starting_bankroll = Some(bankroll);
        self
    }

    /// Base seed of the run. When unset a fresh one is drawn at the start of the run.
    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = Some(seed);
        self
    }

    /// Number of worker threads, default 1.
    pub fn threads(&mut self, threads: usize) -> &mut Self {
        self.threads = Some(threads);
        self
    }

    /// Keep the true count history of every game, default true.
    pub fn record_count_history(&mut self, record: bool) -> &mut Self {
        self.record_count_history = Some(record);
        self
    }

    /// Method for building a `SimulationConfig` object from the given `SimulationConfigBuilder` object.
    pub fn build(&mut self) -> SimulationConfig {
        SimulationConfig {
            num_decks: self.num_decks.unwrap_or(6),
            penetration: self.penetration.unwrap_or(0.25),
            bet_spread: self.bet_spread.unwrap_or(19.0),
            triple_seven: self.triple_seven.unwrap_or(false),
            staking: self.staking.unwrap_or_default(),
            count_sizing: self.count_sizing.unwrap_or(false),
            two_hands: self.two_hands.unwrap_or(false),
            num_games: self.num_games.unwrap_or(1000),
            starting_bankroll: self.starting_bankroll.unwrap_or(10_000.0),
            seed: self.seed,
            threads: self.threads.unwrap_or(1),
            record_count_history: self.record_count_history.unwrap_or(true),
        }
    }
}

/// A configuration file, every field is optional and falls back to the builder's default.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SimulationConfigFile {
    pub decks: Option<usize>,
    pub penetration: Option<f64>,
    pub bet_spread: Option<f64>,
    pub triple_seven: Option<bool>,
    pub staking: Option<StakingPolicy>,
    pub count_sizing: Option<bool>,
    pub two_hands: Option<bool>,
    pub games: Option<u32>,
    pub bankroll: Option<f64>,
    pub seed: Option<u64>,
    pub threads: Option<usize>,
    pub record_count_history: Option<bool>,
}

impl SimulationConfigFile {
    pub fn from_json(json: &str) -> Result<SimulationConfigFile, SimulationError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Returns a builder preloaded with the values present in the file.
    pub fn into_builder(self) -> SimulationConfigBuilder {
        SimulationConfigBuilder {
            num_decks: self.decks,
            penetration: self.penetration,
            bet_spread: self.bet_spread,
            triple_seven: self.triple_seven,
            staking: self.staking,
            count_sizing: self.count_sizing,
            two_hands: self.two_hands,
            num_games: self.games,
            starting_bankroll: self.bankroll,
            seed: self.seed,
            threads: self.threads,
            record_count_history: self.record_count_history,
        }
    }
}

/// Final bankroll and amount wagered of one game.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GameResult {
    pub game: u32,
    pub final_bankroll: f64,
    pub wagered: f64,
}

/// Simple struct for recording all of the interesting data points accumulated during a simulation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub label: String,
    pub seed: u64,
    pub games: u32,
    pub rounds: u64,
    pub player_hands: u64,
    pub tally: OutcomeTally,
    pub total_wagered: f64,
    pub net_result: f64,
    pub total_final_bankroll: f64,
    pub ruined_games: u32,
    pub edge: f64,
    pub game_results: Vec<GameResult>,
    #[serde(skip)]
    pub count_history: Vec<f64>,
}

impl SimulationSummary {
    /// Aggregates game records, which must already be in game order.
    pub fn from_records(label: String, seed: u64, records: Vec<GameRecord>) -> SimulationSummary {
        let mut summary = SimulationSummary {
            label,
            seed,
            games: records.len() as u32,
            rounds: 0,
            player_hands: 0,
            tally: OutcomeTally::default(),
            total_wagered: 0.0,
            net_result: 0.0,
            total_final_bankroll: 0.0,
            ruined_games: 0,
            edge: 0.0,
            game_results: Vec::with_capacity(records.len()),
            count_history: Vec::new(),
        };

        for mut record in records {
            summary.rounds += record.rounds;
            summary.player_hands += record.tally.hands();
            summary.tally.merge(&record.tally);
            summary.total_wagered += record.wagered;
            summary.net_result += record.net();
            summary.total_final_bankroll += record.final_bankroll;
            summary.ruined_games += record.ruined as u32;
            summary.game_results.push(GameResult {
                game: record.index + 1,
                final_bankroll: record.final_bankroll,
                wagered: record.wagered,
            });
            summary.count_history.append(&mut record.count_history);
        }

        summary.edge = if summary.total_wagered != 0.0 {
            100.0 * summary.net_result / summary.total_wagered
        } else {
            0.0
        };
        summary
    }

    pub fn avg_rounds_per_game(&self) -> f64 {
        if self.games == 0 {
            0.0
        } else {
            self.rounds as f64 / self.games as f64
        }
    }
}

impl Display for SimulationSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        const WIDTH: usize = 80;
        const TEXT_WIDTH: usize = "number of player blackjacks".len() + 20;
        const NUM_WIDTH: usize = WIDTH - TEXT_WIDTH;
        let hands = self.player_hands.max(1) as f64;
        writeln!(f, "{}{}", "policy: ", self.label)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "base seed", self.seed)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "games played", self.games)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "rounds played", self.rounds)?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}",
            "average rounds per game",
            self.avg_rounds_per_game()
        )?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "player hands", self.player_hands)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "hands won", self.tally.wins)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "hands pushed", self.tally.pushes)?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "hands lost", self.tally.losses)?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
            "hands surrendered", self.tally.surrenders
        )?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}",
            "number of player blackjacks", self.tally.player_blackjacks
        )?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.4}",
            "win percentage",
            self.tally.wins as f64 / hands
        )?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}",
            "total wagered", self.total_wagered
        )?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}", "net result", self.net_result)?;
        writeln!(
            f,
            "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.2}",
            "total final bankroll", self.total_final_bankroll
        )?;
        writeln!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$}", "ruined games", self.ruined_games)?;
        write!(f, "{:<TEXT_WIDTH$}{:>NUM_WIDTH$.4}", "player edge (%)", self.edge)
    }
}

/// Struct for running a number of independent games of blackjack under one configuration and strategy table.
/// Each game gets a fresh shoe and plays until the shoe needs reshuffling. Games are spread over worker threads and
/// their records are aggregated in game order, so a seeded run produces the same summary for any thread count.
pub struct BlackjackSimulator<D: DecisionStrategy + Sync> {
    config: SimulationConfig,
    strategy: D,
}

impl<D: DecisionStrategy + Sync> BlackjackSimulator<D> {
    /// Associated method for creating a new simulator, the configuration is validated here.
    pub fn new(config: SimulationConfig, strategy: D) -> Result<Self, SimulationError> {
        config.validate().map_err(SimulationError::Config)?;
        Ok(BlackjackSimulator { config, strategy })
    }

    /// Runs every configured game and returns the aggregated summary.
    pub fn run(&self) -> Result<SimulationSummary, SimulationError> {
        let seed = self
            .config
            .seed
            .unwrap_or_else(|| rand::thread_rng().gen());
        let label = self.config.label();
        info!(
            %label,
            seed,
            games = self.config.num_games,
            decks = self.config.num_decks,
            threads = self.config.threads,
            "starting simulation"
        );

        let records = self.run_records(seed)?;
        let summary = SimulationSummary::from_records(label, seed, records);

        info!(
            label = %summary.label,
            rounds = summary.rounds,
            wagered = summary.total_wagered,
            net = summary.net_result,
            edge = summary.edge,
            "finished simulation"
        );
        Ok(summary)
    }

    /// Plays the game at `index` with its own RNG stream derived from `seed`.
    pub fn run_game(&self, index: u32, seed: u64) -> Result<GameRecord, BlackjackGameError> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(index as u64);
        let mut game = BlackjackGameSim::new(self.config, &mut rng);
        game.play(&self.strategy)?;
        debug!(
            game = index + 1,
            rounds = game.rounds,
            bankroll = game.money(),
            wagered = game.bet(),
            "finished game"
        );
        Ok(game.into_record(index))
    }

    fn run_records(&self, seed: u64) -> Result<Vec<GameRecord>, SimulationError> {
        let num_games = self.config.num_games;
        let threads = self.config.threads.clamp(1, num_games.max(1) as usize);
        let mut slots: Vec<Option<GameRecord>> = (0..num_games).map(|_| None).collect();

        thread::scope(|scope| -> Result<(), SimulationError> {
            let (sender, receiver) = mpsc::channel::<(u32, Result<GameRecord, BlackjackGameError>)>();

            let mut handles = vec![];
            for worker in 0..threads {
                let sender = sender.clone();
                handles.push(scope.spawn(move || {
                    for index in (worker as u32..num_games).step_by(threads) {
                        let result = self.run_game(index, seed);
                        let failed = result.is_err();
                        // Stop early once the receiver has hung up or this worker hit an error
                        if sender.send((index, result)).is_err() || failed {
                            break;
                        }
                    }
                }));
            }
            drop(sender);

            for (index, result) in receiver {
                let record = result.map_err(|source| SimulationError::Game {
                    game: index + 1,
                    source,
                })?;
                slots[index as usize] = Some(record);
            }

            for handle in handles {
                handle.join().map_err(|_| SimulationError::WorkerPanicked)?;
            }
            Ok(())
        })?;

        slots
            .into_iter()
            .enumerate()
            .map(|(index, slot)| {
                slot.ok_or_else(|| {
                    SimulationError::Channel(format!("game #{} never reported a result", index + 1))
                })
            })
            .collect()
    }
}

/// Runs the three games of the Parrondo demonstration with one shared base seed: flat betting with count sizing,
/// a strict 5% of bankroll staking with count sizing, and the same strict staking playing two hands at once.
pub fn parrondo_comparison<D: DecisionStrategy + Sync>(
    config: SimulationConfig,
    strategy: &D,
) -> Result<Vec<SimulationSummary>, SimulationError> {
    let seed = config.seed.unwrap_or_else(|| rand::thread_rng().gen());
    let games = [
        ("basic game", StakingPolicy::Flat, false),
        ("stutzer's game", StakingPolicy::Strict, false),
        ("parrondo game", StakingPolicy::Strict, true),
    ];

    let mut summaries = Vec::with_capacity(games.len());
    for (name, staking, two_hands) in games {
        let game_config = SimulationConfig {
            staking,
            two_hands,
            count_sizing: true,
            seed: Some(seed),
            ..config
        };
        let mut summary = BlackjackSimulator::new(game_config, strategy)?.run()?;
        summary.label = format!("{} ({})", name, summary.label);
        summaries.push(summary);
    }
    Ok(summaries)
}
