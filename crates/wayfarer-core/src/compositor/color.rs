//! Hex color parsing

use image::Rgb;

use crate::error::{ClientError, ClientResult};

/// Parse `#RGB` or `#RRGGBB` (leading `#` optional, case-insensitive)
pub fn parse_hex_color(input: &str) -> ClientResult<Rgb<u8>> {
    let hex = input.trim().trim_start_matches('#');
    let invalid = || ClientError::Compose(format!("invalid color '{}'", input));

    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(invalid());
    }
    let channel = |s: &str| u8::from_str_radix(s, 16).map_err(|_| invalid());

    match hex.len() {
        3 => {
            let expand = |i: usize| -> ClientResult<u8> {
                let d = &hex[i..i + 1];
                channel(&format!("{d}{d}"))
            };
            Ok(Rgb([expand(0)?, expand(1)?, expand(2)?]))
        }
        6 => Ok(Rgb([
            channel(&hex[0..2])?,
            channel(&hex[2..4])?,
            channel(&hex[4..6])?,
        ])),
        _ => Err(invalid()),
    }
}

/// Format as uppercase `#RRGGBB`
pub fn to_hex(color: Rgb<u8>) -> String {
    format!("#{:02X}{:02X}{:02X}", color[0], color[1], color[2])
}
