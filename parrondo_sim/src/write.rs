use crate::{GameResult, SimulationSummary};
use std::io::Write;

const WIDTH: usize = 80;

/// Writes the fixed-width report of a single summary, framed by a header line.
pub fn write_summary(summary: &SimulationSummary, mut writer: impl Write) -> std::io::Result<()> {
    let header = format!("{} games", summary.games);
    writeln!(writer, "{:-^WIDTH$}", header)?;
    writeln!(writer, "{}", summary)?;
    writeln!(writer, "{}", "-".repeat(WIDTH))
}

/// Writes one line per game with its final bankroll and amount wagered.
pub fn write_game_results(results: &[GameResult], mut writer: impl Write) -> std::io::Result<()> {
    for result in results {
        writeln!(
            writer,
            "game #{}: final bankroll {:.2} ({:.2} wagered)",
            result.game, result.final_bankroll, result.wagered
        )?;
    }
    Ok(())
}

/// Writes the true count history, one value per line.
pub fn write_count_history(history: &[f64], mut writer: impl Write) -> std::io::Result<()> {
    for count in history {
        writeln!(writer, "{}", count)?;
    }
    Ok(())
}

/// Writes the summaries of a Parrondo comparison followed by a short table of their edges.
pub fn write_comparison(
    summaries: &[SimulationSummary],
    mut writer: impl Write,
) -> std::io::Result<()> {
    for summary in summaries {
        write_summary(summary, &mut writer)?;
    }
    const LABEL_WIDTH: usize = 60;
    const EDGE_WIDTH: usize = WIDTH - LABEL_WIDTH;
    writeln!(writer, "{:-^WIDTH$}", "player edge (%)")?;
    for summary in summaries {
        writeln!(
            writer,
            "{:<LABEL_WIDTH$}{:>EDGE_WIDTH$.4}",
            summary.label, summary.edge
        )?;
    }
    writeln!(writer, "{}", "-".repeat(WIDTH))
}

/// Writes summaries as pretty printed JSON. The count history is left out.
pub fn write_json<T: serde::Serialize + ?Sized>(
    value: &T,
    mut writer: impl Write,
) -> Result<(), serde_json::Error> {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writeln!(writer).map_err(serde_json::Error::io)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::OutcomeTally;

    fn summary() -> SimulationSummary {
        SimulationSummary {
            label: "flat".to_string(),
            seed: 7,
            games: 2,
            rounds: 80,
            player_hands: 82,
            tally: OutcomeTally {
                wins: 40,
                pushes: 8,
                losses: 32,
                surrenders: 2,
                player_blackjacks: 4,
            },
            total_wagered: 90.0,
            net_result: 4.5,
            total_final_bankroll: 20_004.5,
            ruined_games: 0,
            edge: 5.0,
            game_results: vec![
                GameResult {
                    game: 1,
                    final_bankroll: 10_006.0,
                    wagered: 44.0,
                },
                GameResult {
                    game: 2,
                    final_bankroll: 9_998.5,
                    wagered: 46.0,
                },
            ],
            count_history: vec![0.0, 1.5, -2.0],
        }
    }

    #[test]
    fn test_write_summary() {
        let mut out = Vec::new();
        write_summary(&summary(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with(&"-".repeat(10)));
        assert!(text.contains("2 games"));
        assert!(text.contains("policy: flat"));
        let edge_line = text.lines().find(|l| l.starts_with("player edge")).unwrap();
        assert_eq!(edge_line.len(), WIDTH);
        assert!(edge_line.ends_with("5.0000"));
    }

    #[test]
    fn test_write_game_results() {
        let mut out = Vec::new();
        write_game_results(&summary().game_results, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(
            text,
            "game #1: final bankroll 10006.00 (44.00 wagered)\n\
             game #2: final bankroll 9998.50 (46.00 wagered)\n"
        );
    }

    #[test]
    fn test_write_count_history() {
        let mut out = Vec::new();
        write_count_history(&summary().count_history, &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "0\n1.5\n-2\n");
    }

    #[test]
    fn test_json_leaves_out_count_history() {
        let mut out = Vec::new();
        write_json(&summary(), &mut out).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(value["edge"], 5.0);
        assert_eq!(value["tally"]["wins"], 40);
        assert_eq!(value["game_results"][1]["game"], 2);
        assert!(value.get("count_history").is_none());
    }

    #[test]
    fn test_write_comparison_lists_edges() {
        let mut out = Vec::new();
        write_comparison(&[summary(), summary()], &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.matches("policy: flat").count(), 2);
        assert!(text.contains("player edge (%)"));
    }
}
