use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::{Duration, Instant};

use anyhow::Context;
use thiserror::Error;

use super::bid::Bid;
use super::loader::load_bids_from_path;
use super::tree::{BinarySearchTree, TraversalOrder};

pub const DEFAULT_CSV_PATH: &str = "eBid_Monthly_Sales.csv";
pub const DEFAULT_BID_KEY: &str = "98223";

/// Settings collected from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// CSV file the Load Bids command reads
    pub csv_path: PathBuf,

    /// Bid id the Find Bid and Remove Bid commands act on
    pub bid_key: String,

    /// Print bids as JSON objects, one per line
    pub json: bool,

    /// Load the CSV file before showing the menu
    pub preload: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            csv_path: PathBuf::from(DEFAULT_CSV_PATH),
            bid_key: DEFAULT_BID_KEY.to_owned(),
            json: false,
            preload: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Choice {
    Load,
    Display(TraversalOrder),
    Find,
    Remove,
    Exit,
}

#[derive(Error, Debug)]
#[error("Invalid choice: {0}")]
struct InvalidChoice(String);

impl FromStr for Choice {
    type Err = InvalidChoice;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        use TraversalOrder::*;

        match s.trim() {
            "1" => Ok(Choice::Load),
            "2" => Ok(Choice::Display(InOrder)),
            "3" => Ok(Choice::Find),
            "4" => Ok(Choice::Remove),
            "5" => Ok(Choice::Display(PreOrder)),
            "6" => Ok(Choice::Display(PostOrder)),
            "9" => Ok(Choice::Exit),
            other => Err(InvalidChoice(other.to_owned())),
        }
    }
}

const MENU: &str = "\
Menu:
  1. Load Bids
  2. Display All Bids
  3. Find Bid
  4. Remove Bid
  5. Display All Bids (pre-order)
  6. Display All Bids (post-order)
  9. Exit
";

/// Menu driven loop over a bid tree.
///
/// Reads one choice per line from `input` and writes everything it shows to
/// `output`. Running out of input behaves like choosing Exit.
pub struct Shell<R, W> {
    config: Config,
    tree: BinarySearchTree,
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Shell<R, W> {
    pub fn new(config: Config, input: R, output: W) -> Self {
        Self {
            config,
            tree: BinarySearchTree::new(),
            input,
            output,
        }
    }

    /// Run until Exit or end of input and hand back the tree.
    pub fn run(mut self) -> anyhow::Result<BinarySearchTree> {
        if self.config.preload {
            self.load()?;
        }

        loop {
            write!(self.output, "{MENU}Enter choice: ")?;
            self.output.flush()?;

            let mut line = String::new();
            if self.input.read_line(&mut line).context("Unable to read choice")? == 0 {
                writeln!(self.output)?;
                break;
            }

            match line.parse::<Choice>() {
                Ok(Choice::Exit) => break,
                Ok(choice) => self.dispatch(choice)?,
                Err(e) => writeln!(self.output, "{e}")?,
            }
        }

        writeln!(self.output, "Good bye.")?;
        Ok(self.tree)
    }

    fn dispatch(&mut self, choice: Choice) -> anyhow::Result<()> {
        match choice {
            Choice::Load => self.load(),
            Choice::Display(order) => self.display(order),
            Choice::Find => self.find(),
            Choice::Remove => self.remove(),
            Choice::Exit => Ok(()),
        }
    }

    fn load(&mut self) -> anyhow::Result<()> {
        let started = Instant::now();
        let loaded = load_bids_from_path(&self.config.csv_path, &mut self.tree);
        let elapsed = started.elapsed();

        match loaded {
            Ok(summary) => {
                debug!(
                    "tree holds {} bids, height {}",
                    self.tree.len(),
                    self.tree.height()
                );
                writeln!(self.output, "{} bids read", summary.loaded)?;
            }
            Err(e) => {
                warn!("{e}");
                writeln!(self.output, "{e}")?;
            }
        }
        write_elapsed(&mut self.output, elapsed)
    }

    fn display(&mut self, order: TraversalOrder) -> anyhow::Result<()> {
        if self.tree.is_empty() {
            writeln!(self.output, "No bids loaded.")?;
        }
        for bid in self.tree.traverse(order) {
            write_bid(&mut self.output, bid, self.config.json)?;
        }
        Ok(())
    }

    fn find(&mut self) -> anyhow::Result<()> {
        let key = self.config.bid_key.as_str();

        let started = Instant::now();
        let found = self.tree.search(key);
        let elapsed = started.elapsed();

        match found {
            Some(bid) => write_bid(&mut self.output, bid, self.config.json)?,
            None => writeln!(self.output, "Bid Id {key} not found.")?,
        }
        write_elapsed(&mut self.output, elapsed)
    }

    fn remove(&mut self) -> anyhow::Result<()> {
        let key = self.config.bid_key.as_str();

        match self.tree.remove(key) {
            Some(_) => writeln!(self.output, "Bid Id {key} removed.")?,
            None => writeln!(self.output, "Bid Id {key} not found.")?,
        }
        Ok(())
    }
}

fn write_bid<W: Write>(output: &mut W, bid: &Bid, json: bool) -> anyhow::Result<()> {
    if json {
        serde_json::to_writer(&mut *output, bid)?;
        writeln!(output)?;
    } else {
        writeln!(output, "{bid}")?;
    }
    Ok(())
}

fn write_elapsed<W: Write>(output: &mut W, elapsed: Duration) -> anyhow::Result<()> {
    writeln!(output, "time: {} microseconds", elapsed.as_micros())?;
    writeln!(output, "time: {} seconds", elapsed.as_secs_f64())?;
    Ok(())
}
