//
// Copyright (c) The Router Configuration Manager Contributors
//
// SPDX-License-Identifier: MIT
//

use serde::{Deserialize, Serialize};

// A 6-octet hardware address, rendered in colon-separated lowercase hex
// (`aa:bb:cc:dd:ee:ff`).
#[derive(Clone, Copy, Debug, Default, Eq, Hash, Ord, PartialEq, PartialOrd)]
#[derive(Deserialize, Serialize)]
pub struct MacAddr(pub [u8; 6]);

// ===== impl MacAddr =====

impl MacAddr {
    pub fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl std::fmt::Display for MacAddr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl std::str::FromStr for MacAddr {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() != 6 {
            return Err(());
        }

        let mut octets = [0u8; 6];
        for (octet, part) in octets.iter_mut().zip(parts.iter()) {
            if part.len() != 2 {
                return Err(());
            }
            *octet = u8::from_str_radix(part, 16).map_err(|_| ())?;
        }

        Ok(MacAddr(octets))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let addr: MacAddr = "aa:bb:cc:dd:ee:ff".parse().unwrap();
        assert_eq!(addr.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn rejects_short_octet() {
        assert!("aa:bb:cc:dd:ee:f".parse::<MacAddr>().is_err());
    }

    #[test]
    fn rejects_wrong_group_count() {
        assert!("aa:bb:cc:dd:ee".parse::<MacAddr>().is_err());
    }
}
