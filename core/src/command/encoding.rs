//! Argument word packing shared by the commands.

/// Core selector bits of a per-core argument word
pub const CORE_MASK_BITS: u32 = 0xFFF0_0000;
/// Frequency bits of a per-core frequency argument word
pub const FREQUENCY_BITS: u32 = 0x000F_FFFF;

/// Pack a signed PSM margin into its 16-bit wire form
pub const fn encode_margin(margin: i32) -> u32 {
    if margin < 0 {
        (0x10_0000_i32.wrapping_add(margin) as u32) & 0xFFFF
    } else {
        (margin as u32) & 0xFFFF
    }
}

/// Decode a PSM margin returned by the firmware
///
/// The firmware answers with a sign-extended 32-bit value; a word with bit
/// 31 clear is read as the 16-bit form [`encode_margin`] produces.
pub const fn decode_margin(word: u32) -> i32 {
    if word & 0x8000_0000 != 0 {
        // -(!word + 1), i.e. the two's complement value
        word as i32
    } else {
        (word as u16) as i16 as i32
    }
}

/// Merge a core mask with a per-core value
pub const fn core_arg(core_mask: u32, value: u32) -> u32 {
    (core_mask & CORE_MASK_BITS) | (value & !CORE_MASK_BITS)
}

/// PBO scalar to its wire form (hundredths)
pub fn scalar_to_wire(scalar: f32) -> u32 {
    // `as` saturates: negative and NaN become 0
    (scalar * 100.0 + 0.5) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_margin_round_trip() {
        for m in -0x8000..=0x7FFF {
            assert_eq!(decode_margin(encode_margin(m)), m, "margin {}", m);
        }
    }

    #[test]
    fn test_margin_wire_values() {
        assert_eq!(encode_margin(0), 0);
        assert_eq!(encode_margin(5), 5);
        assert_eq!(encode_margin(-1), 0xFFFF);
        assert_eq!(encode_margin(-30), 0xFFE2);
    }

    #[test]
    fn test_decode_sign_extended() {
        assert_eq!(decode_margin(0xFFFF_FFF6), -10);
        assert_eq!(decode_margin(0x8000_0000), i32::MIN);
        assert_eq!(decode_margin(0x0000_0014), 20);
    }

    #[test]
    fn test_core_arg() {
        let mask = 0x1230_0000;
        assert_eq!(core_arg(mask, 4200), 0x1230_0000 | 4200);
        // value bits never leak into the core selector
        assert_eq!(core_arg(0, 0xFFFF_FFFF), 0x000F_FFFF);
        assert_eq!(core_arg(mask | 0xABCDE, 0), mask);
    }

    #[test]
    fn test_scalar_to_wire() {
        assert_eq!(scalar_to_wire(1.0), 100);
        assert_eq!(scalar_to_wire(2.5), 250);
        assert_eq!(scalar_to_wire(10.0), 1000);
        assert_eq!(scalar_to_wire(-1.0), 0);
        assert_eq!(scalar_to_wire(f32::NAN), 0);
    }
}
