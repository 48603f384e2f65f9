//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

// Configuration-file operators.
//
// The comparator set precedes the assignment/modifier set in declaration
// order (comparators are always numerically less than modifiers) so that
// `Operator::is_comparator`/`is_modifier` can be implemented as a single
// range check if desired, mirroring the original template language's
// `MAX_COMPARATOR`/`MAX_MODIFIER` split.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub enum Operator {
    None,
    Eq,
    Ne,
    Lt,
    Lte,
    Gt,
    Gte,
    IpNetEq,
    IpNetNe,
    IpNetLt,
    IpNetLe,
    IpNetGt,
    IpNetGe,
    Assign,
    Add,
    AddEq,
    Sub,
    SubEq,
    Mul,
    MulEq,
    Div,
    DivEq,
    LShift,
    LShiftEq,
    RShift,
    RShiftEq,
    BitAnd,
    BitAndEq,
    BitOr,
    BitOrEq,
    BitXor,
    BitXorEq,
    Del,
}

// ===== impl Operator =====

impl Operator {
    pub fn is_comparator(&self) -> bool {
        matches!(
            self,
            Operator::Eq
                | Operator::Ne
                | Operator::Lt
                | Operator::Lte
                | Operator::Gt
                | Operator::Gte
                | Operator::IpNetEq
                | Operator::IpNetNe
                | Operator::IpNetLt
                | Operator::IpNetLe
                | Operator::IpNetGt
                | Operator::IpNetGe
        )
    }

    pub fn is_modifier(&self) -> bool {
        !self.is_comparator() && !matches!(self, Operator::None)
    }

    // Default allowed-operator set for a plain scalar leaf: only the
    // implicit ":"/assignment form, unless the schema widens it.
    pub fn scalar_default() -> &'static [Operator] {
        &[Operator::Assign]
    }
}

impl std::fmt::Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Operator::None => "",
            Operator::Eq => "==",
            Operator::Ne => "!=",
            Operator::Lt => "<",
            Operator::Lte => "<=",
            Operator::Gt => ">",
            Operator::Gte => ">=",
            Operator::IpNetEq => "ipnet==",
            Operator::IpNetNe => "ipnet!=",
            Operator::IpNetLt => "ipnet<",
            Operator::IpNetLe => "ipnet<=",
            Operator::IpNetGt => "ipnet>",
            Operator::IpNetGe => "ipnet>=",
            Operator::Assign => ":",
            Operator::Add => "+",
            Operator::AddEq => "+=",
            Operator::Sub => "-",
            Operator::SubEq => "-=",
            Operator::Mul => "*",
            Operator::MulEq => "*=",
            Operator::Div => "/",
            Operator::DivEq => "/=",
            Operator::LShift => "<<",
            Operator::LShiftEq => "<<=",
            Operator::RShift => ">>",
            Operator::RShiftEq => ">>=",
            Operator::BitAnd => "&",
            Operator::BitAndEq => "&=",
            Operator::BitOr => "|",
            Operator::BitOrEq => "|=",
            Operator::BitXor => "^",
            Operator::BitXorEq => "^=",
            Operator::Del => "delete",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for Operator {
    type Err = ();

    // Parses the textual form used in configuration/template files. The
    // bare implicit assignment (no operator token at all) is handled by
    // the caller, not here: this only covers explicit operator spellings.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            ":" | "=" => Operator::Assign,
            "==" => Operator::Eq,
            "!=" => Operator::Ne,
            "<" => Operator::Lt,
            "<=" => Operator::Lte,
            ">" => Operator::Gt,
            ">=" => Operator::Gte,
            "ipnet==" => Operator::IpNetEq,
            "ipnet!=" => Operator::IpNetNe,
            "ipnet<" => Operator::IpNetLt,
            "ipnet<=" => Operator::IpNetLe,
            "ipnet>" => Operator::IpNetGt,
            "ipnet>=" => Operator::IpNetGe,
            "+" => Operator::Add,
            "+=" => Operator::AddEq,
            "-" => Operator::Sub,
            "-=" => Operator::SubEq,
            "*" => Operator::Mul,
            "*=" => Operator::MulEq,
            "/" => Operator::Div,
            "/=" => Operator::DivEq,
            "<<" => Operator::LShift,
            "<<=" => Operator::LShiftEq,
            ">>" => Operator::RShift,
            ">>=" => Operator::RShiftEq,
            "&" => Operator::BitAnd,
            "&=" => Operator::BitAndEq,
            "|" => Operator::BitOr,
            "|=" => Operator::BitOrEq,
            "^" => Operator::BitXor,
            "^=" => Operator::BitXorEq,
            "delete" => Operator::Del,
            _ => return Err(()),
        })
    }
}
