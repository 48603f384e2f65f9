//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use tracing::warn;

use crate::ValueKind;

// Value-model errors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    // The candidate text is not a legal rendition of the given kind.
    InvalidValue(ValueKind, String),
    // A network's host bits are set when only the masked form is accepted.
    HostBitsSet(String),
    // A prefix length exceeds the address family's bit length.
    PrefixTooLong(u8, u8),
    // A range's low bound is greater than its high bound.
    InvertedRange(String, String),
    // The value does not appear in the allowed-value set.
    NotAllowedValue(String, Vec<String>),
    // The value does not fall within any allowed range.
    NotAllowedRange(String, Vec<String>),
    // The operator is not in the node's allowed-operator list.
    OperatorNotAllowed(Operator, Vec<Operator>),
}

use crate::Operator;

// ===== impl Error =====

impl Error {
    pub fn log(&self) {
        warn!(error = %self, "value error");
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::InvalidValue(kind, text) => {
                write!(f, "'{text}' is not a valid {kind} value")
            }
            Error::HostBitsSet(text) => {
                write!(f, "'{text}' has host bits set in the network part")
            }
            Error::PrefixTooLong(prefix, max) => {
                write!(f, "prefix length {prefix} exceeds maximum of {max}")
            }
            Error::InvertedRange(lo, hi) => {
                write!(f, "range lower bound '{lo}' exceeds upper bound '{hi}'")
            }
            Error::NotAllowedValue(value, allowed) => {
                write!(
                    f,
                    "'{value}' is not one of the permitted values: {}",
                    allowed.join(", ")
                )
            }
            Error::NotAllowedRange(value, allowed) => {
                write!(
                    f,
                    "'{value}' is not within any of the permitted ranges: {}",
                    allowed.join(", ")
                )
            }
            Error::OperatorNotAllowed(op, allowed) => {
                write!(
                    f,
                    "operator '{op}' is not permitted here (allowed: {})",
                    allowed
                        .iter()
                        .map(|op| op.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
    }
}

impl std::error::Error for Error {}
