// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Numeric range parsing, per OPC UA Part 4 7.27. The subscription
//! engine validates ranges supplied for monitored items; applying a
//! range to a value is left to the sampling layer.

use crate::StatusCode;

/// A parsed numeric range, e.g. `"1"`, `"1:2"` or `"0:1,3:4"`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum NumericRange {
    /// No range.
    #[default]
    None,
    /// A single index.
    Index(u32),
    /// An inclusive range of indices, min strictly less than max.
    Range(u32, u32),
    /// One range per dimension of a multi dimensional value.
    MultipleRanges(Vec<NumericRange>),
}

impl NumericRange {
    /// Parse a numeric range string. An empty string is no range.
    /// Malformed input fails with `BadIndexRangeInvalid`.
    pub fn parse(s: &str) -> Result<NumericRange, StatusCode> {
        if s.is_empty() {
            return Ok(NumericRange::None);
        }
        let dimensions = s
            .split(',')
            .map(Self::parse_dimension)
            .collect::<Result<Vec<_>, _>>()?;
        if dimensions.len() == 1 {
            Ok(dimensions.into_iter().next().unwrap())
        } else {
            Ok(NumericRange::MultipleRanges(dimensions))
        }
    }

    fn parse_dimension(s: &str) -> Result<NumericRange, StatusCode> {
        match s.split_once(':') {
            None => {
                let index = Self::parse_index(s)?;
                Ok(NumericRange::Index(index))
            }
            Some((min, max)) => {
                let min = Self::parse_index(min)?;
                let max = Self::parse_index(max)?;
                if min >= max {
                    return Err(StatusCode::BadIndexRangeInvalid);
                }
                Ok(NumericRange::Range(min, max))
            }
        }
    }

    fn parse_index(s: &str) -> Result<u32, StatusCode> {
        // Leading '+' or whitespace is not legal range syntax.
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(StatusCode::BadIndexRangeInvalid);
        }
        s.parse().map_err(|_| StatusCode::BadIndexRangeInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::NumericRange;
    use crate::StatusCode;

    #[test]
    fn valid_ranges() {
        assert_eq!(NumericRange::parse(""), Ok(NumericRange::None));
        assert_eq!(NumericRange::parse("5"), Ok(NumericRange::Index(5)));
        assert_eq!(NumericRange::parse("1:2"), Ok(NumericRange::Range(1, 2)));
        assert_eq!(
            NumericRange::parse("0:1,3:4"),
            Ok(NumericRange::MultipleRanges(vec![
                NumericRange::Range(0, 1),
                NumericRange::Range(3, 4)
            ]))
        );
    }

    #[test]
    fn invalid_ranges() {
        for s in ["x", "1:", ":2", "2:1", "1:1", "1,,2", "-1", "1:2:3", " 1"] {
            assert_eq!(
                NumericRange::parse(s),
                Err(StatusCode::BadIndexRangeInvalid),
                "{s}"
            );
        }
    }
}
