use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use thiserror::Error;

use super::bid::{parse_amount, Bid, BidId};
use super::tree::BinarySearchTree;

const TITLE_COLUMN: usize = 0;
const ID_COLUMN: usize = 1;
const AMOUNT_COLUMN: usize = 4;
const FUND_COLUMN: usize = 8;

#[derive(Error, Debug)]
pub(crate) enum LoadError {
    #[error("Unable to open {}", .path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed CSV - {0}")]
    Csv(#[from] csv::Error),
}

pub(crate) type LoadResult<T> = anyhow::Result<T, LoadError>;

/// A row that was skipped. These never abort a load.
#[derive(Error, Debug)]
enum RowError {
    #[error("Line {line}: missing {column} column")]
    MissingColumn { line: u64, column: &'static str },

    #[error("Line {line}: empty bid id")]
    EmptyId { line: u64 },

    #[error("Line {line}: invalid amount {raw:?} - {source}")]
    InvalidAmount {
        line: u64,
        raw: String,
        source: rust_decimal::Error,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct LoadSummary {
    pub loaded: usize,
    pub skipped: usize,
}

pub(crate) fn load_bids_from_path(
    path: &Path,
    tree: &mut BinarySearchTree,
) -> LoadResult<LoadSummary> {
    info!("Loading CSV file {}", path.display());
    let file = File::open(path).map_err(|source| LoadError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    load_bids(file, tree)
}

/// Read bids from CSV with a header row and insert every well formed one.
pub(crate) fn load_bids<R: io::Read>(
    reader: R,
    tree: &mut BinarySearchTree,
) -> LoadResult<LoadSummary> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .delimiter(b',')
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let header = rdr.headers()?.iter().collect::<Vec<_>>().join(" | ");
    debug!("columns: {header}");

    let mut summary = LoadSummary::default();
    for result in rdr.records() {
        match parse_row(&result?) {
            Ok(bid) => {
                tree.insert(bid);
                summary.loaded += 1;
            }
            Err(e) => {
                warn!("{e}");
                summary.skipped += 1;
            }
        }
    }

    info!(
        "{} bids loaded, {} rows skipped",
        summary.loaded, summary.skipped
    );
    Ok(summary)
}

fn parse_row(record: &StringRecord) -> Result<Bid, RowError> {
    let line = record.position().map_or(0, |p| p.line());
    let field = |index: usize, column: &'static str| {
        record
            .get(index)
            .ok_or(RowError::MissingColumn { line, column })
    };

    let id = BidId::from(field(ID_COLUMN, "id")?);
    if id.is_empty() {
        return Err(RowError::EmptyId { line });
    }

    let raw_amount = field(AMOUNT_COLUMN, "amount")?;
    let amount = parse_amount(raw_amount).map_err(|source| RowError::InvalidAmount {
        line,
        raw: raw_amount.to_owned(),
        source,
    })?;

    Ok(Bid::new(
        id,
        field(TITLE_COLUMN, "title")?,
        field(FUND_COLUMN, "fund")?,
        amount,
    ))
}
