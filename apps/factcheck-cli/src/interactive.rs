//! Interactive checking session
//!
//! Reads claims from stdin until `quit`, keeping a per-session history.

use std::io::Write;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Local};
use factcheck_core::{Confidence, FactChecker, Verdict};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::report;

const HISTORY_SHOWN: usize = 10;
const CLAIM_PREVIEW_CHARS: usize = 50;

const HELP: &str = "\
Commands:
  <claim>   check a claim against the press-release index
  history   show the last 10 checks
  stats     show session statistics
  help      show this message
  quit      leave (also: exit, q)";

#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub claim: String,
    pub verdict: Verdict,
    pub confidence: Confidence,
    pub elapsed: Duration,
    pub at: DateTime<Local>,
}

/// Checks performed during one session
#[derive(Debug, Default)]
pub struct Session {
    history: Vec<HistoryEntry>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, entry: HistoryEntry) {
        self.history.push(entry);
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }

    /// Most recent checks, oldest first.
    pub fn recent(&self) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(HISTORY_SHOWN);
        &self.history[start..]
    }

    pub fn average_time(&self) -> Option<Duration> {
        if self.history.is_empty() {
            return None;
        }
        let total: Duration = self.history.iter().map(|e| e.elapsed).sum();
        Some(total / self.history.len() as u32)
    }

    /// Count and share (percent) of each verdict seen, in verdict order.
    pub fn verdict_distribution(&self) -> Vec<(Verdict, usize, f64)> {
        let total = self.history.len() as f64;
        Verdict::ALL
            .iter()
            .map(|verdict| {
                let count = self.history.iter().filter(|e| e.verdict == *verdict).count();
                (*verdict, count)
            })
            .filter(|(_, count)| *count > 0)
            .map(|(verdict, count)| (verdict, count, count as f64 * 100.0 / total))
            .collect()
    }

    pub fn render_history(&self) -> String {
        if self.history.is_empty() {
            return "No claims checked yet.".to_string();
        }

        let mut lines = vec![format!("Session history ({} checks)", self.history.len())];
        let offset = self.history.len() - self.recent().len();
        for (i, entry) in self.recent().iter().enumerate() {
            lines.push(format!(
                "{:2}. [{}] {} {}",
                offset + i + 1,
                entry.at.format("%H:%M:%S"),
                entry.verdict,
                report::preview(&entry.claim, CLAIM_PREVIEW_CHARS)
            ));
            lines.push(format!(
                "    {:.2}s | {}",
                entry.elapsed.as_secs_f64(),
                entry.confidence
            ));
        }
        lines.join("\n")
    }

    pub fn render_stats(&self) -> String {
        let Some(average) = self.average_time() else {
            return "No claims checked yet.".to_string();
        };

        let mut lines = vec![
            "Session statistics".to_string(),
            format!("Total checks: {}", self.history.len()),
            format!("Average time: {:.2}s", average.as_secs_f64()),
            "Verdict distribution:".to_string(),
        ];
        for (verdict, count, share) in self.verdict_distribution() {
            lines.push(format!("  {}: {} ({:.1}%)", verdict, count, share));
        }
        lines.join("\n")
    }
}

enum Command<'a> {
    Quit,
    History,
    Stats,
    Help,
    Check(&'a str),
    Empty,
}

fn parse_command(line: &str) -> Command<'_> {
    let line = line.trim();
    match line.to_lowercase().as_str() {
        "" => Command::Empty,
        "quit" | "exit" | "q" => Command::Quit,
        "history" => Command::History,
        "stats" => Command::Stats,
        "help" => Command::Help,
        _ => Command::Check(line),
    }
}

/// Run the session loop over stdin.
pub async fn run(checker: &FactChecker) -> Result<()> {
    let stats = checker.stats().await;
    println!("Fact check interactive session");
    println!(
        "Index: {} documents | model {} | threshold {}",
        stats.count,
        checker.config().llm.model,
        checker.config().retrieval.similarity_threshold
    );
    println!("{}", HELP);

    let mut session = Session::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("\nclaim> ");
        std::io::stdout().flush()?;

        // EOF ends the session like `quit`
        let Some(line) = lines.next_line().await? else {
            break;
        };

        match parse_command(&line) {
            Command::Empty => continue,
            Command::Quit => break,
            Command::History => println!("{}", session.render_history()),
            Command::Stats => println!("{}", session.render_stats()),
            Command::Help => println!("{}", HELP),
            Command::Check(claim) => {
                let started = Instant::now();
                match checker.check_claim(claim).await {
                    Ok(result) => {
                        let elapsed = started.elapsed();
                        print!("{}", report::render_result(&result, Some(elapsed)));
                        session.record(HistoryEntry {
                            claim: claim.to_string(),
                            verdict: result.verdict,
                            confidence: result.confidence,
                            elapsed,
                            at: Local::now(),
                        });
                    }
                    Err(e) => eprintln!("Check failed: {}", e),
                }
            }
        }
    }

    if !session.is_empty() {
        println!("\n{}", session.render_stats());
    }
    println!("Goodbye.");
    Ok(())
}
