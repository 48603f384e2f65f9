//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

use crate::error::Error;

// A `%allow-range` bound. Numeric bounds are widened to `i128` so that a
// `u64` maximum and an `i64` minimum can share one comparison without the
// silent truncation that a native 64-bit compare would risk at the edges
// of the unsigned range.
#[derive(Clone, Debug, Eq, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum ValueRange {
    Numeric { low: i128, high: i128 },
    Text { low: String, high: String },
}

// ===== impl ValueRange =====

impl ValueRange {
    pub fn numeric(low: i128, high: i128) -> Result<Self, Error> {
        if low > high {
            return Err(Error::InvertedRange(low.to_string(), high.to_string()));
        }
        Ok(ValueRange::Numeric { low, high })
    }

    pub fn text(low: String, high: String) -> Result<Self, Error> {
        if low > high {
            return Err(Error::InvertedRange(low, high));
        }
        Ok(ValueRange::Text { low, high })
    }

    pub fn contains_numeric(&self, n: i128) -> bool {
        match self {
            ValueRange::Numeric { low, high } => *low <= n && n <= *high,
            ValueRange::Text { .. } => false,
        }
    }

    pub fn contains_text(&self, s: &str) -> bool {
        match self {
            ValueRange::Text { low, high } => low.as_str() <= s && s <= high.as_str(),
            ValueRange::Numeric { .. } => false,
        }
    }
}

impl std::fmt::Display for ValueRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueRange::Numeric { low, high } => write!(f, "{low}-{high}"),
            ValueRange::Text { low, high } => write!(f, "{low}-{high}"),
        }
    }
}
