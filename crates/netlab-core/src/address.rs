// ── IPv4 address arithmetic ──
//
// Dotted-decimal parsing, subnet membership, and the display helpers
// used by routing-table rendering. Malformed input is always an error;
// nothing here truncates or coerces.

use std::net::Ipv4Addr;

use thiserror::Error;

/// Rejected dotted-decimal input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AddressError {
    #[error("Invalid IPv4 address '{input}': {reason}")]
    Malformed { input: String, reason: &'static str },

    #[error("Invalid subnet mask {mask}: set bits must be contiguous")]
    NonContiguousMask { mask: Ipv4Addr },
}

impl AddressError {
    fn malformed(input: &str, reason: &'static str) -> Self {
        Self::Malformed {
            input: input.to_owned(),
            reason,
        }
    }
}

/// Parse a dotted-decimal string and pack its octets big-endian.
///
/// Exactly four dot-separated decimal octets in `0..=255` are accepted.
/// Leading zeros, signs, whitespace and empty octets are rejected so the
/// accepted set is exactly the canonical form produced by [`format_address`].
pub fn to_integer(address: &str) -> Result<u32, AddressError> {
    let mut value: u32 = 0;
    let mut count = 0;

    for part in address.split('.') {
        count += 1;
        if count > 4 {
            return Err(AddressError::malformed(address, "expected four octets"));
        }
        if part.is_empty() {
            return Err(AddressError::malformed(address, "empty octet"));
        }
        if !part.bytes().all(|b| b.is_ascii_digit()) {
            return Err(AddressError::malformed(address, "octets must be decimal digits"));
        }
        if part.len() > 1 && part.starts_with('0') {
            return Err(AddressError::malformed(address, "octets must not have leading zeros"));
        }
        let octet: u8 = part
            .parse()
            .map_err(|_| AddressError::malformed(address, "octet out of range 0-255"))?;
        value = (value << 8) | u32::from(octet);
    }

    if count != 4 {
        return Err(AddressError::malformed(address, "expected four octets"));
    }
    Ok(value)
}

/// Inverse of [`to_integer`].
pub fn format_address(value: u32) -> String {
    Ipv4Addr::from(value).to_string()
}

/// Parse a dotted-decimal string into an [`Ipv4Addr`].
pub fn parse_address(address: &str) -> Result<Ipv4Addr, AddressError> {
    to_integer(address).map(Ipv4Addr::from)
}

/// Parse a subnet mask; the set bits must form a contiguous prefix.
pub fn parse_mask(mask: &str) -> Result<Ipv4Addr, AddressError> {
    let mask = parse_address(mask)?;
    if is_contiguous_mask(mask) {
        Ok(mask)
    } else {
        Err(AddressError::NonContiguousMask { mask })
    }
}

pub fn is_contiguous_mask(mask: Ipv4Addr) -> bool {
    let bits = u32::from(mask);
    bits.leading_ones() + bits.trailing_zeros() == 32
}

/// Subnet membership from the perspective of the interface owning `mask`.
///
/// Not symmetric when the two sides use different masks: callers pass the
/// mask of the interface doing the comparison.
pub fn same_subnet(a: Ipv4Addr, b: Ipv4Addr, mask: Ipv4Addr) -> bool {
    let mask = u32::from(mask);
    (u32::from(a) & mask) == (u32::from(b) & mask)
}

pub fn network_address(address: Ipv4Addr, mask: Ipv4Addr) -> Ipv4Addr {
    Ipv4Addr::from(u32::from(address) & u32::from(mask))
}

/// Number of set bits in the mask.
pub fn prefix_length(mask: Ipv4Addr) -> u32 {
    u32::from(mask).count_ones()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ip(s: &str) -> Ipv4Addr {
        parse_address(s).unwrap()
    }

    #[test]
    fn to_integer_packs_big_endian() {
        assert_eq!(to_integer("192.168.1.10").unwrap(), 0xC0A8_010A);
        assert_eq!(to_integer("0.0.0.0").unwrap(), 0);
        assert_eq!(to_integer("255.255.255.255").unwrap(), u32::MAX);
    }

    #[test]
    fn canonical_strings_round_trip() {
        for s in ["10.0.0.5", "172.16.254.1", "0.0.0.0", "255.255.255.0", "1.2.3.4"] {
            assert_eq!(format_address(to_integer(s).unwrap()), s);
        }
    }

    #[test]
    fn malformed_input_is_rejected() {
        for s in [
            "",
            "10.0.0",
            "10.0.0.0.1",
            "10..0.1",
            "10.0.0.256",
            "10.0.0.-1",
            "10.0.0.+1",
            "10.0.0.01",
            " 10.0.0.1",
            "10.0.0.1 ",
            "a.b.c.d",
            "1000.0.0.1",
        ] {
            assert!(to_integer(s).is_err(), "accepted {s:?}");
        }
    }

    #[test]
    fn malformed_error_names_input() {
        let err = to_integer("10.0.0.999").unwrap_err();
        assert!(err.to_string().contains("10.0.0.999"));
    }

    #[test]
    fn same_subnet_is_reflexive() {
        for (a, m) in [("10.0.0.5", "255.255.255.0"), ("192.168.7.1", "255.255.0.0")] {
            assert!(same_subnet(ip(a), ip(a), ip(m)));
        }
    }

    #[test]
    fn same_subnet_uses_given_mask() {
        let a = ip("192.168.1.10");
        let b = ip("192.168.2.10");
        assert!(!same_subnet(a, b, ip("255.255.255.0")));
        assert!(same_subnet(a, b, ip("255.255.0.0")));
    }

    #[test]
    fn mask_contiguity() {
        assert!(parse_mask("255.255.255.0").is_ok());
        assert!(parse_mask("255.255.255.252").is_ok());
        assert!(parse_mask("0.0.0.0").is_ok());
        assert!(parse_mask("255.255.255.255").is_ok());
        assert!(matches!(
            parse_mask("255.0.255.0"),
            Err(AddressError::NonContiguousMask { .. })
        ));
    }

    #[test]
    fn display_helpers() {
        assert_eq!(
            network_address(ip("192.168.1.77"), ip("255.255.255.0")),
            ip("192.168.1.0")
        );
        assert_eq!(prefix_length(ip("255.255.255.0")), 24);
        assert_eq!(prefix_length(ip("255.255.255.252")), 30);
        assert_eq!(prefix_length(ip("0.0.0.0")), 0);
    }
}
