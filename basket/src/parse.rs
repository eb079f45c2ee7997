//! Line parser for transaction data.
//!
//! One transaction per line: item names separated by blanks, optionally
//! followed by `:` and an integer occurrence weight. Empty lines and lines
//! starting with `#` are skipped.
//!
//! ```text
//! bread butter milk
//! bread butter :3
//! # a comment
//! ```

use std::fmt;

use nom::branch::alt;
use nom::bytes::complete::take_while1;
use nom::character::complete::{char, digit1, space0, space1};
use nom::combinator::{all_consuming, map, map_res, opt};
use nom::multi::separated_list1;
use nom::sequence::{delimited, pair, preceded};
use nom::IResult;

use crate::{ItemBase, ItemId, Supp, TransactionBag};

/// Why a transaction line was rejected. Line numbers are 1-based.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ParseError {
    /// The line is not of the form `item item ... [:weight]`.
    BadRecord { line: usize },
    /// The weight field is present but not a positive integer.
    BadWeight { line: usize },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ParseError::BadRecord { line } => write!(f, "malformed transaction in line {}", line),
            ParseError::BadWeight { line } => write!(f, "invalid weight in line {}", line),
        }
    }
}

/// An item name: anything without blanks and without the weight marker.
fn item(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| !c.is_whitespace() && c != ':')(input)
}

fn weight(input: &str) -> IResult<&str, Supp> {
    preceded(
        pair(char(':'), space0),
        map_res(digit1, |s: &str| s.parse::<Supp>()),
    )(input)
}

/// A full line: the item names and the weight (1 if absent).
fn record(input: &str) -> IResult<&str, (Vec<&str>, Supp)> {
    all_consuming(delimited(
        space0,
        pair(
            separated_list1(space1, item),
            map(opt(preceded(space0, weight)), |w| w.unwrap_or(1)),
        ),
        space0,
    ))(input)
}

/// Detects whether a malformed line at least carried a weight marker, to
/// report the more precise error.
fn has_weight_marker(line: &str) -> bool {
    let tail: IResult<&str, &str> = alt((take_while1(|c| c != ':'), space0))(line);
    match tail {
        Ok((rest, _)) => rest.starts_with(':'),
        Err(_) => false,
    }
}

/// Reads all transactions from `input` into `bag`, interning item names in
/// `base` and accumulating item frequencies and the total weight. Returns
/// the number of transactions read.
pub fn read_transactions(
    input: &str,
    base: &mut ItemBase,
    bag: &mut TransactionBag,
) -> Result<usize, ParseError> {
    let mut cnt = 0;
    for (no, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let (names, wgt) = match record(line) {
            Ok((_, parsed)) => parsed,
            Err(_) if has_weight_marker(line) => {
                return Err(ParseError::BadWeight { line: no + 1 })
            }
            Err(_) => return Err(ParseError::BadRecord { line: no + 1 }),
        };
        let items: Vec<ItemId> = names.iter().map(|n| base.intern(n)).collect();
        bag.push(base, &items, wgt);
        cnt += 1;
    }
    Ok(cnt)
}
