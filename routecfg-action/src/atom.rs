//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

// A typed atom carried by an action's return spec or a subprocess's
// captured output. Broader than `TypedValue`: it also covers the
// wire-level `list`, `binary` and `fp64` atoms the dispatcher contract
// may hand back, which have no corresponding template value kind.
#[derive(Clone, Debug, PartialEq)]
#[derive(Deserialize, Serialize)]
pub enum ReturnAtom {
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Ipv4(std::net::Ipv4Addr),
    Ipv4Net(ipnetwork::Ipv4Network),
    Ipv6(std::net::Ipv6Addr),
    Ipv6Net(ipnetwork::Ipv6Network),
    Mac(routecfg_value::MacAddr),
    Text(String),
    Bool(bool),
    List(Vec<ReturnAtom>),
    Binary(Vec<u8>),
    Fp64(f64),
}

// ===== impl ReturnAtom =====

impl ReturnAtom {
    // The token used in the wire encoding of §6 ("i32", "u32", ...).
    pub fn type_tag(&self) -> &'static str {
        match self {
            ReturnAtom::Int32(_) => "i32",
            ReturnAtom::UInt32(_) => "u32",
            ReturnAtom::Int64(_) => "i64",
            ReturnAtom::UInt64(_) => "u64",
            ReturnAtom::Ipv4(_) => "ipv4",
            ReturnAtom::Ipv4Net(_) => "ipv4net",
            ReturnAtom::Ipv6(_) => "ipv6",
            ReturnAtom::Ipv6Net(_) => "ipv6net",
            ReturnAtom::Mac(_) => "mac",
            ReturnAtom::Text(_) => "text",
            ReturnAtom::Bool(_) => "bool",
            ReturnAtom::List(_) => "list",
            ReturnAtom::Binary(_) => "binary",
            ReturnAtom::Fp64(_) => "fp64",
        }
    }
}

impl std::fmt::Display for ReturnAtom {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnAtom::Int32(v) => write!(f, "{v}"),
            ReturnAtom::UInt32(v) => write!(f, "{v}"),
            ReturnAtom::Int64(v) => write!(f, "{v}"),
            ReturnAtom::UInt64(v) => write!(f, "{v}"),
            ReturnAtom::Ipv4(v) => write!(f, "{v}"),
            ReturnAtom::Ipv4Net(v) => write!(f, "{v}"),
            ReturnAtom::Ipv6(v) => write!(f, "{v}"),
            ReturnAtom::Ipv6Net(v) => write!(f, "{v}"),
            ReturnAtom::Mac(v) => write!(f, "{v}"),
            ReturnAtom::Text(v) => write!(f, "{v}"),
            ReturnAtom::Bool(v) => write!(f, "{v}"),
            ReturnAtom::List(items) => {
                write!(
                    f,
                    "[{}]",
                    items
                        .iter()
                        .map(|a| a.to_string())
                        .collect::<Vec<_>>()
                        .join(",")
                )
            }
            ReturnAtom::Binary(bytes) => write!(f, "{}", hex_encode(bytes)),
            ReturnAtom::Fp64(v) => write!(f, "{v}"),
        }
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
