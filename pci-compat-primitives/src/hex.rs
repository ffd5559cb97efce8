//! Parsers for the `0x`-prefixed hex attributes exposed by sysfs.

use core::num::ParseIntError;

/// Trims surrounding whitespace (sysfs attributes end in a newline) and an optional `0x`/`0X` prefix
pub fn strip_hex_prefix(input: &str) -> &str {
    let input = input.trim();
    input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
        .unwrap_or(input)
}

macro_rules! def_hex_parsers{
    ($($ty:ident),* $(,)?) => {
        $(paste::paste!{
            #[doc = "Parses a hex string, with or without a leading `0x`, into a [`" $ty "`]"]
            pub fn [<parse_hex_ $ty>](input: &str) -> Result<$ty, ParseIntError>{
                $ty::from_str_radix(strip_hex_prefix(input), 16)
            }
        })*
    }
}

def_hex_parsers!(u8, u16, u32);

#[cfg(test)]
mod test {
    use super::{parse_hex_u16, parse_hex_u32, parse_hex_u8};

    #[test]
    fn test_hex_decoding_max() {
        assert_eq!(parse_hex_u8("0xFF"), Ok(255));
        assert_eq!(parse_hex_u16("0xFFFF"), Ok(65535));
        assert_eq!(parse_hex_u32("0xFFFFFFFF"), Ok(4294967295));
    }

    #[test]
    fn test_hex_decoding_sysfs_line() {
        assert_eq!(parse_hex_u16("0x8086\n"), Ok(0x8086));
        assert_eq!(parse_hex_u32("0x030000\n"), Ok(0x030000));
    }

    #[test]
    fn test_hex_decoding_unprefixed() {
        assert_eq!(parse_hex_u8("1a"), Ok(0x1a));
    }

    #[test]
    fn test_hex_decoding_overflow() {
        assert!(parse_hex_u8("0x100").is_err());
        assert!(parse_hex_u16("").is_err());
    }
}
