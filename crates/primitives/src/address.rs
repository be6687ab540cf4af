//! Participant address parsing.

pub use alloy_primitives::Address;

/// Length of a hex-encoded address without the `0x` prefix.
const ADDRESS_HEX_LEN: usize = 40;

/// Input that does not describe a 20-byte hex address.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid address: {input:?}")]
pub struct InvalidAddress {
    /// The rejected input.
    pub input: String,
}

impl InvalidAddress {
    fn new(input: &str) -> Self {
        Self {
            input: input.to_owned(),
        }
    }
}

/// Parse a `0x`-prefixed, 40 hex digit address.
///
/// Surrounding whitespace is ignored and the hex digits are case-insensitive.
/// Checksums are not enforced: the indexer reports lowercase addresses.
pub fn parse_address(input: &str) -> Result<Address, InvalidAddress> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .ok_or_else(|| InvalidAddress::new(input))?;

    if digits.len() != ADDRESS_HEX_LEN {
        return Err(InvalidAddress::new(input));
    }

    let mut bytes = [0u8; 20];
    hex::decode_to_slice(digits, &mut bytes).map_err(|_| InvalidAddress::new(input))?;
    Ok(Address::from(bytes))
}
