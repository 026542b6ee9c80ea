//! Usage accounting, model identity and pricing

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign};

/// One discrete pipeline step with its own usage and time accounting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Queries,
    Search,
    Score,
    Summarize,
    Annotate,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Queries => "queries",
            Stage::Search => "search",
            Stage::Score => "score",
            Stage::Summarize => "summarize",
            Stage::Annotate => "annotate",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counts for one direction of a call, in both billing units
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitCounts {
    pub tokens: u64,
    pub non_whitespace_characters: u64,
}

impl UnitCounts {
    pub fn get(&self, unit: PriceUnit) -> u64 {
        match unit {
            PriceUnit::Tokens => self.tokens,
            PriceUnit::NonWhitespaceCharacters => self.non_whitespace_characters,
        }
    }
}

impl Add for UnitCounts {
    type Output = UnitCounts;

    fn add(self, rhs: UnitCounts) -> UnitCounts {
        UnitCounts {
            tokens: self.tokens + rhs.tokens,
            non_whitespace_characters: self.non_whitespace_characters
                + rhs.non_whitespace_characters,
        }
    }
}

/// Input and output counts of one or more model calls
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input: UnitCounts,
    pub output: UnitCounts,
}

impl Add for Usage {
    type Output = Usage;

    fn add(self, rhs: Usage) -> Usage {
        Usage {
            input: self.input + rhs.input,
            output: self.output + rhs.output,
        }
    }
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Usage) {
        *self = *self + rhs;
    }
}

impl Sum for Usage {
    fn sum<I: Iterator<Item = Usage>>(iter: I) -> Usage {
        iter.fold(Usage::default(), Add::add)
    }
}

impl<'a> Sum<&'a Usage> for Usage {
    fn sum<I: Iterator<Item = &'a Usage>>(iter: I) -> Usage {
        iter.copied().sum()
    }
}

/// Usage keyed by stage
pub type StageUsage = BTreeMap<Stage, Usage>;

/// Elapsed seconds keyed by stage
pub type StageSeconds = BTreeMap<Stage, f64>;

/// Billing unit of a provider's price list
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceUnit {
    #[default]
    Tokens,
    NonWhitespaceCharacters,
}

impl std::str::FromStr for PriceUnit {
    type Err = crate::error::DietQaError;

    fn from_str(s: &str) -> crate::error::Result<Self> {
        match s.trim() {
            "" | "tokens" => Ok(PriceUnit::Tokens),
            "not_whitespace_characters" | "non_whitespace_characters" => {
                Ok(PriceUnit::NonWhitespaceCharacters)
            }
            other => Err(crate::error::DietQaError::Config(format!(
                "Unknown price unit: \"{}\"",
                other
            ))),
        }
    }
}

/// USD per unit for each direction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UnitPrice {
    pub input: f64,
    pub output: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Price {
    pub unit: PriceUnit,
    pub unit_usd: UnitPrice,
}

/// Identity of the configured chat model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    pub price: Option<Price>,
}

impl ModelInfo {
    pub fn new(name: impl Into<String>, price: Option<Price>) -> Self {
        Self {
            name: name.into(),
            price,
        }
    }
}

/// Estimated spend for a set of stages
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostEstimate {
    pub unit: PriceUnit,
    pub input_units: u64,
    pub output_units: u64,
    pub input_usd: f64,
    pub output_usd: f64,
    pub total_usd: f64,
}

impl CostEstimate {
    pub fn from_usage(price: &Price, usage: &StageUsage) -> Self {
        let total: Usage = usage.values().sum();
        let input_units = total.input.get(price.unit);
        let output_units = total.output.get(price.unit);
        let input_usd = input_units as f64 * price.unit_usd.input;
        let output_usd = output_units as f64 * price.unit_usd.output;

        Self {
            unit: price.unit,
            input_units,
            output_units,
            input_usd,
            output_usd,
            total_usd: input_usd + output_usd,
        }
    }
}

/// Parse a price such as `"3"`, `"0.15/1_000_000"` (USD per million units)
///
/// Blank input or more than one `/` yields `None`.
pub fn parse_price(raw: &str) -> Option<f64> {
    if raw.trim().is_empty() {
        return None;
    }

    let numbers = raw
        .split('/')
        .map(|part| part.trim().replace('_', "").parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()?;

    match numbers.as_slice() {
        [value] => Some(*value),
        [numerator, denominator] if *denominator != 0.0 => Some(numerator / denominator),
        _ => None,
    }
}
