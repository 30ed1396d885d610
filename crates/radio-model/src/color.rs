//! Hex color codec.
//!
//! Voice colors are stored as `RRGGBB` hex strings with an optional leading `#`.
//! The RadioData export carries them as decimal byte attributes, recorded media
//! lines carry them as unit floats.

use std::fmt;

use crate::error::ModelError;

/// An 8-bit RGB triplet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Channels scaled to `[0, 1]`.
    pub fn to_unit(self) -> (f32, f32, f32) {
        (
            f32::from(self.r) / 255.0,
            f32::from(self.g) / 255.0,
            f32::from(self.b) / 255.0,
        )
    }

    /// Inverse of [`Rgb::to_unit`]; out-of-range channels are clamped.
    pub fn from_unit(r: f32, g: f32, b: f32) -> Self {
        Self {
            r: unit_to_byte(r),
            g: unit_to_byte(g),
            b: unit_to_byte(b),
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", encode_hex_color(*self))
    }
}

fn unit_to_byte(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Decode `RRGGBB` or `#RRGGBB` (either case) into bytes.
///
/// Fails closed: anything other than exactly six hex digits after one optional
/// `#` is an [`ModelError::InvalidColor`].
pub fn decode_hex_color(value: &str) -> Result<Rgb, ModelError> {
    let digits = value.strip_prefix('#').unwrap_or(value);
    if digits.len() != 6 {
        return Err(ModelError::InvalidColor {
            value: value.to_string(),
            reason: "expected exactly 6 hex digits",
        });
    }
    let bytes = hex::decode(digits).map_err(|_| ModelError::InvalidColor {
        value: value.to_string(),
        reason: "non-hex digit",
    })?;
    match bytes.as_slice() {
        [r, g, b] => Ok(Rgb::new(*r, *g, *b)),
        _ => Err(ModelError::InvalidColor {
            value: value.to_string(),
            reason: "expected exactly 6 hex digits",
        }),
    }
}

/// Encode as six lowercase hex digits without a `#` prefix.
pub fn encode_hex_color(rgb: Rgb) -> String {
    hex::encode([rgb.r, rgb.g, rgb.b])
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn decodes_with_and_without_hash() {
        assert_eq!(decode_hex_color("#112233").unwrap(), Rgb::new(0x11, 0x22, 0x33));
        assert_eq!(decode_hex_color("112233").unwrap(), Rgb::new(17, 34, 51));
    }

    #[test]
    fn decodes_either_case() {
        assert_eq!(decode_hex_color("#ABCDEF").unwrap(), decode_hex_color("abcdef").unwrap());
        assert_eq!(decode_hex_color("aBcDeF").unwrap(), Rgb::new(0xab, 0xcd, 0xef));
    }

    #[test]
    fn rejects_wrong_length() {
        for bad in ["", "#", "#12345", "1234567", "#fff", "##112233"] {
            assert!(
                matches!(decode_hex_color(bad), Err(ModelError::InvalidColor { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn rejects_non_hex_digits() {
        assert!(matches!(
            decode_hex_color("#11223g"),
            Err(ModelError::InvalidColor {
                reason: "non-hex digit",
                ..
            })
        ));
        // multi-byte characters never count as digits
        assert!(decode_hex_color("ééé").is_err());
    }

    #[test]
    fn encodes_lowercase_zero_padded() {
        assert_eq!(encode_hex_color(Rgb::new(0, 10, 255)), "000aff");
        assert_eq!(Rgb::new(0xab, 0, 1).to_string(), "#ab0001");
    }

    #[test]
    fn unit_conversion_round_trips_bytes() {
        let rgb = Rgb::new(17, 34, 51);
        let (r, g, b) = rgb.to_unit();
        assert_eq!(Rgb::from_unit(r, g, b), rgb);
        assert_eq!(Rgb::from_unit(-1.0, 2.0, f32::NAN), Rgb::new(0, 255, 0));
    }

    proptest! {
        #[test]
        fn decode_is_left_inverse_of_encode(r: u8, g: u8, b: u8) {
            let rgb = Rgb::new(r, g, b);
            prop_assert_eq!(decode_hex_color(&encode_hex_color(rgb)).unwrap(), rgb);
            let upper = format!("#{}", encode_hex_color(rgb).to_uppercase());
            prop_assert_eq!(decode_hex_color(&upper).unwrap(), rgb);
        }
    }
}
