//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

// The type tag carried by a `TypedValue`, and by every value-bearing
// template node. Grouping ("VOID") nodes are not a `ValueKind` -- they
// live one level up, on the template node itself.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum ValueKind {
    Bool,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Ipv4Addr,
    Ipv4Net,
    Ipv4Range,
    Ipv6Addr,
    Ipv6Net,
    Ipv6Range,
    MacAddr,
    UrlFile,
    UrlFtp,
    UrlHttp,
    UrlTftp,
    Text,
    Arith,
}

// ===== impl ValueKind =====

impl ValueKind {
    // Whether values of this kind support a total order (and therefore the
    // comparator operators beyond EQ/NE).
    pub fn is_ordered(&self) -> bool {
        !matches!(self, ValueKind::Bool)
    }

    // Whether values of this kind are networks/prefixes, for which the
    // IPNET_* comparators apply instead of the scalar comparators.
    pub fn is_network(&self) -> bool {
        matches!(self, ValueKind::Ipv4Net | ValueKind::Ipv6Net)
    }

    // Whether the kind participates in signed 64-bit range checks
    // (`%allow-range`). Text-like and address-like kinds do not.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ValueKind::Int32
                | ValueKind::UInt32
                | ValueKind::Int64
                | ValueKind::UInt64
        )
    }
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ValueKind::Bool => "bool",
            ValueKind::Int32 => "i32",
            ValueKind::UInt32 => "u32",
            ValueKind::Int64 => "i64",
            ValueKind::UInt64 => "u64",
            ValueKind::Ipv4Addr => "ipv4",
            ValueKind::Ipv4Net => "ipv4net",
            ValueKind::Ipv4Range => "ipv4range",
            ValueKind::Ipv6Addr => "ipv6",
            ValueKind::Ipv6Net => "ipv6net",
            ValueKind::Ipv6Range => "ipv6range",
            ValueKind::MacAddr => "macaddr",
            ValueKind::UrlFile => "url_file",
            ValueKind::UrlFtp => "url_ftp",
            ValueKind::UrlHttp => "url_http",
            ValueKind::UrlTftp => "url_tftp",
            ValueKind::Text => "txt",
            ValueKind::Arith => "arith",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ValueKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "bool" => ValueKind::Bool,
            "i32" => ValueKind::Int32,
            "u32" => ValueKind::UInt32,
            "i64" => ValueKind::Int64,
            "u64" => ValueKind::UInt64,
            "ipv4" => ValueKind::Ipv4Addr,
            "ipv4net" => ValueKind::Ipv4Net,
            "ipv4range" => ValueKind::Ipv4Range,
            "ipv6" => ValueKind::Ipv6Addr,
            "ipv6net" => ValueKind::Ipv6Net,
            "ipv6range" => ValueKind::Ipv6Range,
            "macaddr" => ValueKind::MacAddr,
            "url_file" => ValueKind::UrlFile,
            "url_ftp" => ValueKind::UrlFtp,
            "url_http" => ValueKind::UrlHttp,
            "url_tftp" => ValueKind::UrlTftp,
            "txt" => ValueKind::Text,
            "arith" => ValueKind::Arith,
            _ => return Err(()),
        })
    }
}
