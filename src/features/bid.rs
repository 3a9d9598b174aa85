use std::fmt;
use std::str::FromStr;

use rust_decimal::prelude::*;
use serde::{Serialize, Serializer};

/// Auction id. Bids are ordered by comparing these strings byte by byte.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(transparent)]
pub struct BidId(String);

impl BidId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<&str> for BidId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

impl From<String> for BidId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl fmt::Display for BidId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A closed auction bid
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
pub struct Bid {
    /// Unique key of the bid. Never changes once the bid is created
    id: BidId,

    title: String,

    /// The fund the winning bid was paid into
    fund: String,

    /// Winning bid amount
    #[serde(serialize_with = "round_serialize")]
    amount: Decimal,
}

fn round_serialize<S>(amount: &Decimal, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    // Serialize to 2 decimal
    let rounded_amount = amount.round_dp(2).to_string();
    s.serialize_str(rounded_amount.as_str())
}

impl Bid {
    pub fn new(
        id: impl Into<BidId>,
        title: impl Into<String>,
        fund: impl Into<String>,
        amount: Decimal,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            fund: fund.into(),
            amount,
        }
    }

    pub fn id(&self) -> &BidId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn fund(&self) -> &str {
        &self.fund
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: {} | {} | {}",
            self.id(),
            self.title(),
            self.amount(),
            self.fund()
        )
    }
}

/// Parse a monetary amount such as `$1,024.50`, ignoring currency symbols and
/// thousands separators.
pub(crate) fn parse_amount(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '$' | ','))
        .collect();
    Decimal::from_str(digits.trim())
}
