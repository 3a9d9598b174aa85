use std::io;
use std::path::PathBuf;
use std::process;
#[macro_use]
extern crate log;

use clap::{Arg, Command};

mod features;
use features::{BinarySearchTree, Config, Shell, DEFAULT_BID_KEY, DEFAULT_CSV_PATH};

fn main() {
    env_logger::init();
    if let Err(e) = run() {
        error!("{e:#}");
        process::exit(1);
    }
}

fn run() -> anyhow::Result<BinarySearchTree> {
    let config = config();
    debug!("{config:?}");

    let stdin = io::stdin();
    Shell::new(config, stdin.lock(), io::stdout()).run()
}

fn config() -> Config {
    let matches = Command::new(env!("CARGO_PKG_NAME"))
        .version(env!("CARGO_PKG_VERSION"))
        .about("Load auction bids into a binary search tree and query them from a menu")
        .arg(
            Arg::new("csv_path")
                .value_name("CSV_PATH")
                .default_value(DEFAULT_CSV_PATH)
                .help("CSV file of bids to load"),
        )
        .arg(
            Arg::new("bid_key")
                .value_name("BID_KEY")
                .default_value(DEFAULT_BID_KEY)
                .help("Bid id to find and remove"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .help("Print bids as JSON, one object per line"),
        )
        .arg(
            Arg::new("load")
                .long("load")
                .help("Load the CSV file before showing the menu"),
        )
        .get_matches();

    Config {
        csv_path: PathBuf::from(matches.value_of("csv_path").unwrap_or(DEFAULT_CSV_PATH)),
        bid_key: matches
            .value_of("bid_key")
            .unwrap_or(DEFAULT_BID_KEY)
            .to_owned(),
        json: matches.is_present("json"),
        preload: matches.is_present("load"),
    }
}
