//! Validity spans for time-scoped parent links.
//!
//! A span is written the way genealogy date phrases are: `before 1889-01-01`,
//! `from 1889-01-01 to 1974-01-01`, `after 1974-01-01`. Parsing and printing use
//! that form, and it is also the serialized representation.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// A calendar range during which a parent link is administratively accurate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum DateSpan {
    /// Valid strictly before the date.
    Before(NaiveDate),
    /// Valid from `from` (inclusive) up to `to` (exclusive).
    Between { from: NaiveDate, to: NaiveDate },
    /// Valid on and after the date.
    After(NaiveDate),
}

/// Errors from parsing a [`DateSpan`] phrase.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SpanParseError {
    #[error("unrecognised date span: '{0}'")]
    Unrecognised(String),
    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
    #[error("span starts at {from} but ends at {to}")]
    Reversed { from: NaiveDate, to: NaiveDate },
}

impl DateSpan {
    /// Whether `date` falls inside the span.
    pub fn contains(&self, date: NaiveDate) -> bool {
        match *self {
            Self::Before(end) => date < end,
            Self::Between { from, to } => from <= date && date < to,
            Self::After(start) => date >= start,
        }
    }
}

fn parse_date(text: &str) -> Result<NaiveDate, SpanParseError> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
        .map_err(|_| SpanParseError::InvalidDate(text.trim().to_string()))
}

impl FromStr for DateSpan {
    type Err = SpanParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let text = s.trim().to_ascii_lowercase();
        if let Some(rest) = text.strip_prefix("before ") {
            return Ok(Self::Before(parse_date(rest)?));
        }
        if let Some(rest) = text.strip_prefix("after ") {
            return Ok(Self::After(parse_date(rest)?));
        }
        if let Some(rest) = text.strip_prefix("from ")
            && let Some((from, to)) = rest.split_once(" to ")
        {
            let from = parse_date(from)?;
            let to = parse_date(to)?;
            if from >= to {
                return Err(SpanParseError::Reversed { from, to });
            }
            return Ok(Self::Between { from, to });
        }
        Err(SpanParseError::Unrecognised(s.trim().to_string()))
    }
}

impl fmt::Display for DateSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Before(date) => write!(f, "before {}", date.format(DATE_FORMAT)),
            Self::Between { from, to } => write!(
                f,
                "from {} to {}",
                from.format(DATE_FORMAT),
                to.format(DATE_FORMAT)
            ),
            Self::After(date) => write!(f, "after {}", date.format(DATE_FORMAT)),
        }
    }
}

impl From<DateSpan> for String {
    fn from(span: DateSpan) -> Self {
        span.to_string()
    }
}

impl TryFrom<String> for DateSpan {
    type Error = SpanParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// The three administrative eras of British local government.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Era {
    /// Historic counties, before the Local Government Act 1888 took effect.
    Historic,
    /// Administrative counties and districts, 1889 to 1974.
    Administrative,
    /// Unitary authorities and metropolitan counties, from 1974.
    Modern,
}

fn new_year(year: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, 1, 1).expect("January 1st exists in every year")
}

impl Era {
    pub const ALL: [Era; 3] = [Era::Historic, Era::Administrative, Era::Modern];

    /// The fixed validity span of links belonging to this era.
    pub fn span(self) -> DateSpan {
        match self {
            Self::Historic => DateSpan::Before(new_year(1889)),
            Self::Administrative => DateSpan::Between {
                from: new_year(1889),
                to: new_year(1974),
            },
            Self::Modern => DateSpan::After(new_year(1974)),
        }
    }

    /// The era whose span contains `date`.
    pub fn at(date: NaiveDate) -> Era {
        Self::ALL
            .into_iter()
            .find(|era| era.span().contains(date))
            .unwrap_or(Era::Modern)
    }
}
