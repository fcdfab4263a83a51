//! Permissive hexadecimal literal parsing shared by every front-end.

/// Parses `0x`/`0X`/`$`-prefixed or bare hexadecimal text into a `u32`.
///
/// Digits are consumed left to right until the first non-hex character,
/// which ends parsing without error. Empty or non-numeric input yields `0`.
/// Values wider than 32 bits wrap.
#[must_use]
pub fn parse_hex(text: &str) -> u32 {
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .or_else(|| text.strip_prefix('$'))
        .unwrap_or(text);

    digits
        .chars()
        .map_while(|c| c.to_digit(16))
        .fold(0_u32, |value, digit| value.wrapping_mul(16).wrapping_add(digit))
}
