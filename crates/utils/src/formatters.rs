// SPDX-License-Identifier: LGPL-3.0-only
//
// This file is provided WITHOUT ANY WARRANTY;
// without even the implied warranty of MERCHANTABILITY
// or FITNESS FOR A PARTICULAR PURPOSE.

use core::fmt;

/// Write bytes as `0x`-prefixed hex, eliding the middle of long values.
pub fn hexf(data: &[u8], f: &mut fmt::Formatter) -> fmt::Result {
    write!(f, "{}", truncate_hex(data))
}

pub fn truncate_hex(data: &[u8]) -> String {
    let s: String = data.iter().map(|b| format!("{:02x}", b)).collect();
    let threshold = 100;
    let limit = 50;
    let cutoff = limit / 2;
    if s.len() <= threshold {
        format!("0x{}", s)
    } else {
        let start = &s[..cutoff];
        let end = &s[s.len() - (limit - cutoff)..];
        format!("<bytes({}):0x{}..{}>", data.len(), start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::truncate_hex;

    #[test]
    fn short_values_are_printed_in_full() {
        assert_eq!(truncate_hex(&[0xde, 0xad, 0xbe, 0xef]), "0xdeadbeef");
        assert_eq!(truncate_hex(&[]), "0x");
    }

    #[test]
    fn long_values_are_elided() {
        let out = truncate_hex(&[0xab; 64]);
        assert!(out.starts_with("<bytes(64):0xabab"));
        assert!(out.contains(".."));
    }
}
