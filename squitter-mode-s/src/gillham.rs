//! Gillham code
//!
//! Mode A identity codes and Mode C altitude codes share the same pulse
//! positions, but the bits arrive interleaved in Mode S frames:
//!
//! ```plain
//! bit:       12 11 10  9  8  7  6  5  4  3  2  1  0
//! identity:  C1 A1 C2 A2 C4 A4  X B1 D1 B2 D2 B4 D4
//! altitude:  C1 A1 C2 A2 C4 A4  M B1  Q B2 D2 B4 D4
//! ```
//!
//! So instead of reordering the whole word once, we gather the bits for each
//! digit directly from the 13-bit field.
//!
//! <https://en.wikipedia.org/wiki/Gillham_code>

use squitter_types::Squawk;

const C1: u16 = 1 << 12;
const A1: u16 = 1 << 11;
const C2: u16 = 1 << 10;
const A2: u16 = 1 << 9;
const C4: u16 = 1 << 8;
const A4: u16 = 1 << 7;
const B1: u16 = 1 << 5;
const D1: u16 = 1 << 4;
const B2: u16 = 1 << 3;
const D2: u16 = 1 << 2;
const B4: u16 = 1 << 1;
const D4: u16 = 1 << 0;

/// Builds a value from the given bits of `code`, most significant first.
#[inline(always)]
fn gather(code: u16, taps: &[u16]) -> u16 {
    taps.iter()
        .fold(0, |value, tap| (value << 1) | u16::from(code & tap != 0))
}

/// Decodes a reflected binary Gray code.
pub fn gray_decode(mut code: u64) -> u64 {
    for shift in [32, 16, 8, 4, 2, 1] {
        code ^= code >> shift;
    }
    code
}

pub fn gray_encode(value: u64) -> u64 {
    value ^ (value >> 1)
}

/// Decodes a 13-bit identity field into the 4 octal digits of the squawk.
///
/// The X bit is ignored.
pub fn decode_identity(code: u16) -> Squawk {
    let a = gather(code, &[A4, A2, A1]);
    let b = gather(code, &[B4, B2, B1]);
    let c = gather(code, &[C4, C2, C1]);
    let d = gather(code, &[D4, D2, D1]);
    Squawk::from_u16_unchecked((a << 9) | (b << 6) | (c << 3) | d)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
#[error("invalid 100 ft digit in gillham altitude: {hundreds}")]
pub struct InvalidGillhamAltitude {
    pub hundreds: u8,
}

/// Decodes a 13-bit altitude field with Q=0 into feet.
///
/// The M and Q bits are not checked here.
pub fn decode_gillham_altitude(code: u16) -> Result<i32, InvalidGillhamAltitude> {
    // 500 ft increments: D2 D4 A1 A2 A4 B1 B2 B4
    let five_hundreds = gray_decode(gather(code, &[D2, D4, A1, A2, A4, B1, B2, B4]).into());

    // 100 ft increments: C1 C2 C4
    let mut hundreds = gray_decode(gather(code, &[C1, C2, C4]).into());
    match hundreds {
        5 | 6 => {
            return Err(InvalidGillhamAltitude {
                hundreds: hundreds as u8,
            });
        }
        7 => hundreds = 5,
        _ => {}
    }

    // the 100 ft code runs backwards in every other 500 ft band
    if five_hundreds % 2 == 1 {
        hundreds = 6 - hundreds;
    }

    Ok(500 * five_hundreds as i32 + 100 * hundreds as i32 - 1300)
}
