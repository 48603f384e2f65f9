//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use std::net::{Ipv4Addr, Ipv6Addr};

use ipnetwork::{Ipv4Network, Ipv6Network};
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::kind::ValueKind;
use crate::mac::MacAddr;
use crate::range::ValueRange;

// An inclusive pair of addresses of the same family, as used by
// `%allow-range`-style address ranges (distinct from a CIDR network: the
// bounds need not fall on a prefix boundary).
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
#[derive(Deserialize, Serialize)]
pub struct AddrRange<A> {
    pub low: A,
    pub high: A,
}

pub type Ipv4Range = AddrRange<Ipv4Addr>;
pub type Ipv6Range = AddrRange<Ipv6Addr>;

// The parsed, strongly-typed form of a configuration value. Every variant
// round-trips through `Display` to the same canonical text a user would
// type, which is what `ConfigNode::render` and the commit engine's diff
// output both rely on.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum TypedValue {
    Bool(bool),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Ipv4Addr(Ipv4Addr),
    Ipv4Net(Ipv4Network),
    Ipv4Range(Ipv4Range),
    Ipv6Addr(Ipv6Addr),
    Ipv6Net(Ipv6Network),
    Ipv6Range(Ipv6Range),
    MacAddr(MacAddr),
    UrlFile(String),
    UrlFtp(String),
    UrlHttp(String),
    UrlTftp(String),
    Text(String),
    Arith(String),
}

// ===== impl TypedValue =====

impl TypedValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            TypedValue::Bool(_) => ValueKind::Bool,
            TypedValue::Int32(_) => ValueKind::Int32,
            TypedValue::UInt32(_) => ValueKind::UInt32,
            TypedValue::Int64(_) => ValueKind::Int64,
            TypedValue::UInt64(_) => ValueKind::UInt64,
            TypedValue::Ipv4Addr(_) => ValueKind::Ipv4Addr,
            TypedValue::Ipv4Net(_) => ValueKind::Ipv4Net,
            TypedValue::Ipv4Range(_) => ValueKind::Ipv4Range,
            TypedValue::Ipv6Addr(_) => ValueKind::Ipv6Addr,
            TypedValue::Ipv6Net(_) => ValueKind::Ipv6Net,
            TypedValue::Ipv6Range(_) => ValueKind::Ipv6Range,
            TypedValue::MacAddr(_) => ValueKind::MacAddr,
            TypedValue::UrlFile(_) => ValueKind::UrlFile,
            TypedValue::UrlFtp(_) => ValueKind::UrlFtp,
            TypedValue::UrlHttp(_) => ValueKind::UrlHttp,
            TypedValue::UrlTftp(_) => ValueKind::UrlTftp,
            TypedValue::Text(_) => ValueKind::Text,
            TypedValue::Arith(_) => ValueKind::Arith,
        }
    }

    // Parses `text` as a value of `kind`, rejecting networks with host
    // bits set and prefixes longer than the address family allows.
    // `Arith` always matches, same as the lexer-driven `ArithTemplate::
    // type_match` in the original: whatever text the scanner already
    // recognized as an arithmetic expression is accepted as-is.
    pub fn parse(kind: ValueKind, text: &str) -> Result<Self, Error> {
        let invalid = || Error::InvalidValue(kind, text.to_string());

        Ok(match kind {
            ValueKind::Bool => match text {
                "true" => TypedValue::Bool(true),
                "false" => TypedValue::Bool(false),
                _ => return Err(invalid()),
            },
            ValueKind::Int32 => TypedValue::Int32(text.parse().map_err(|_| invalid())?),
            ValueKind::UInt32 => TypedValue::UInt32(text.parse().map_err(|_| invalid())?),
            ValueKind::Int64 => TypedValue::Int64(text.parse().map_err(|_| invalid())?),
            ValueKind::UInt64 => TypedValue::UInt64(text.parse().map_err(|_| invalid())?),
            ValueKind::Ipv4Addr => {
                TypedValue::Ipv4Addr(text.parse().map_err(|_| invalid())?)
            }
            ValueKind::Ipv4Net => {
                let net: Ipv4Network = text.parse().map_err(|_| invalid())?;
                if net.ip() != net.network() {
                    return Err(Error::HostBitsSet(text.to_string()));
                }
                if net.prefix() > 32 {
                    return Err(Error::PrefixTooLong(net.prefix(), 32));
                }
                TypedValue::Ipv4Net(net)
            }
            ValueKind::Ipv4Range => TypedValue::Ipv4Range(parse_range(text).ok_or_else(invalid)?),
            ValueKind::Ipv6Addr => {
                TypedValue::Ipv6Addr(text.parse().map_err(|_| invalid())?)
            }
            ValueKind::Ipv6Net => {
                let net: Ipv6Network = text.parse().map_err(|_| invalid())?;
                if net.ip() != net.network() {
                    return Err(Error::HostBitsSet(text.to_string()));
                }
                if net.prefix() > 128 {
                    return Err(Error::PrefixTooLong(net.prefix(), 128));
                }
                TypedValue::Ipv6Net(net)
            }
            ValueKind::Ipv6Range => TypedValue::Ipv6Range(parse_range(text).ok_or_else(invalid)?),
            ValueKind::MacAddr => TypedValue::MacAddr(text.parse().map_err(|_| invalid())?),
            ValueKind::UrlFile => TypedValue::UrlFile(text.to_string()),
            ValueKind::UrlFtp => TypedValue::UrlFtp(text.to_string()),
            ValueKind::UrlHttp => TypedValue::UrlHttp(text.to_string()),
            ValueKind::UrlTftp => TypedValue::UrlTftp(text.to_string()),
            ValueKind::Text => TypedValue::Text(text.to_string()),
            ValueKind::Arith => TypedValue::Arith(text.to_string()),
        })
    }

    // The canonical rendition used for storage, diffing, and display.
    // Must be a fixed point of `parse(kind, &self.canonical())`.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    // Widens ordered, numeric-ish values to `i128` for range checks. Not
    // meaningful for `Text` or address kinds; those compare lexically or
    // by network relation instead.
    pub fn as_i128(&self) -> Option<i128> {
        match self {
            TypedValue::Int32(v) => Some(*v as i128),
            TypedValue::UInt32(v) => Some(*v as i128),
            TypedValue::Int64(v) => Some(*v as i128),
            TypedValue::UInt64(v) => Some(*v as i128),
            _ => None,
        }
    }

    pub fn check_allowed_values(&self, allowed: &[TypedValue]) -> Result<(), Error> {
        if allowed.is_empty() || allowed.iter().any(|v| v == self) {
            return Ok(());
        }
        Err(Error::NotAllowedValue(
            self.canonical(),
            allowed.iter().map(|v| v.canonical()).collect(),
        ))
    }

    pub fn check_allowed_ranges(&self, ranges: &[ValueRange]) -> Result<(), Error> {
        if ranges.is_empty() {
            return Ok(());
        }
        let ok = match self.as_i128() {
            Some(n) => ranges.iter().any(|r| r.contains_numeric(n)),
            None => {
                let text = self.canonical();
                ranges.iter().any(|r| r.contains_text(&text))
            }
        };
        if ok {
            return Ok(());
        }
        Err(Error::NotAllowedRange(
            self.canonical(),
            ranges.iter().map(|r| r.to_string()).collect(),
        ))
    }
}

fn parse_range<A: std::str::FromStr + Copy>(text: &str) -> Option<AddrRange<A>> {
    let (low, high) = text.split_once('-')?;
    let low = low.trim().parse().ok()?;
    let high = high.trim().parse().ok()?;
    Some(AddrRange { low, high })
}

impl<A: std::fmt::Display> std::fmt::Display for AddrRange<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}-{}", self.low, self.high)
    }
}

impl std::fmt::Display for TypedValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TypedValue::Bool(v) => write!(f, "{v}"),
            TypedValue::Int32(v) => write!(f, "{v}"),
            TypedValue::UInt32(v) => write!(f, "{v}"),
            TypedValue::Int64(v) => write!(f, "{v}"),
            TypedValue::UInt64(v) => write!(f, "{v}"),
            TypedValue::Ipv4Addr(v) => write!(f, "{v}"),
            TypedValue::Ipv4Net(v) => write!(f, "{v}"),
            TypedValue::Ipv4Range(v) => write!(f, "{v}"),
            TypedValue::Ipv6Addr(v) => write!(f, "{v}"),
            TypedValue::Ipv6Net(v) => write!(f, "{v}"),
            TypedValue::Ipv6Range(v) => write!(f, "{v}"),
            TypedValue::MacAddr(v) => write!(f, "{v}"),
            TypedValue::UrlFile(v)
            | TypedValue::UrlFtp(v)
            | TypedValue::UrlHttp(v)
            | TypedValue::UrlTftp(v)
            | TypedValue::Text(v)
            | TypedValue::Arith(v) => write!(f, "{v}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_and_renders_ipv4_net() {
        let v = TypedValue::parse(ValueKind::Ipv4Net, "10.0.0.0/24").unwrap();
        assert_eq!(v.canonical(), "10.0.0.0/24");
    }

    #[test]
    fn rejects_ipv4_net_with_host_bits() {
        let err = TypedValue::parse(ValueKind::Ipv4Net, "10.0.0.1/24").unwrap_err();
        assert!(matches!(err, Error::HostBitsSet(_)));
    }

    #[test]
    fn rejects_bad_bool() {
        assert!(TypedValue::parse(ValueKind::Bool, "yes").is_err());
    }

    #[test]
    fn round_trips_mac() {
        let v = TypedValue::parse(ValueKind::MacAddr, "aa:bb:cc:dd:ee:ff").unwrap();
        assert_eq!(v.canonical(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn parses_ipv4_range() {
        let v = TypedValue::parse(ValueKind::Ipv4Range, "10.0.0.1-10.0.0.10").unwrap();
        assert_eq!(v.canonical(), "10.0.0.1-10.0.0.10");
    }

    #[test]
    fn checks_allowed_values() {
        let v = TypedValue::parse(ValueKind::Text, "eth0").unwrap();
        let allowed = vec![
            TypedValue::parse(ValueKind::Text, "eth0").unwrap(),
            TypedValue::parse(ValueKind::Text, "eth1").unwrap(),
        ];
        assert!(v.check_allowed_values(&allowed).is_ok());

        let other = TypedValue::parse(ValueKind::Text, "eth2").unwrap();
        assert!(other.check_allowed_values(&allowed).is_err());
    }

    #[test]
    fn arith_accepts_any_text() {
        let v = TypedValue::parse(ValueKind::Arith, "$(@.mtu) + 1").unwrap();
        assert_eq!(v.canonical(), "$(@.mtu) + 1");
        assert_eq!(v.kind(), ValueKind::Arith);
    }

    #[test]
    fn checks_allowed_ranges_numeric() {
        let v = TypedValue::parse(ValueKind::UInt32, "42").unwrap();
        let ranges = vec![ValueRange::numeric(0, 100).unwrap()];
        assert!(v.check_allowed_ranges(&ranges).is_ok());

        let out = TypedValue::parse(ValueKind::UInt32, "200").unwrap();
        assert!(out.check_allowed_ranges(&ranges).is_err());
    }
}
