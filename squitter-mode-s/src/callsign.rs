//! Aircraft identification
//!
//! <https://mode-s.org/1090mhz/content/ads-b/2-identification.html>

use std::fmt::{
    Debug,
    Display,
};

/// Character set for the 6-bit encoding. Codes that don't map to a character
/// are decoded as `?`.
const CALLSIGN_ENCODING: &[u8; 64] =
    b"?ABCDEFGHIJKLMNOPQRSTUVWXYZ????? ???????????????0123456789??????";

/// 48-bit field of eight 6-bit characters.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EncodedCallsign(u64);

impl EncodedCallsign {
    pub const fn from_u64_unchecked(word: u64) -> Self {
        Self(word)
    }

    pub const fn from_u64(word: u64) -> Option<Self> {
        if word >> 48 == 0 {
            Some(Self(word))
        }
        else {
            None
        }
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    /// Expands the encoded callsign to 8 bit per character.
    pub fn expand(&self) -> [u8; 8] {
        std::array::from_fn(|i| ((self.0 >> (42 - 6 * i)) & 0b11_1111) as u8)
    }

    /// Decodes the callsign and strips trailing spaces.
    pub fn decode(&self) -> Callsign {
        let mut characters = self.expand().map(|c| CALLSIGN_ENCODING[usize::from(c)]);

        let mut length = characters.len();
        while length > 0 && characters[length - 1] == b' ' {
            length -= 1;
        }
        characters[length..].fill(b' ');

        Callsign {
            characters,
            length: length as u8,
        }
    }
}

impl Debug for EncodedCallsign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EncodedCallsign(\"{}\")", self.decode())
    }
}

/// A decoded callsign.
///
/// This is a small string without heap allocation.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Callsign {
    // only ever filled from `CALLSIGN_ENCODING`, so this is always ASCII
    characters: [u8; 8],
    length: u8,
}

impl Callsign {
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(&self.characters[..usize::from(self.length)]).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if every character was a valid code.
    pub fn is_valid(&self) -> bool {
        !self.as_str().contains('?')
    }
}

impl Debug for Callsign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Callsign(\"{}\")", self.as_str())
    }
}

impl Display for Callsign {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl AsRef<str> for Callsign {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl PartialEq<str> for Callsign {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Callsign {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}

/// Emitter category of an aircraft identification message.
///
/// Displayed as set letter and category number, e.g. `A3`. Type code 4 is set
/// A, type code 1 is set D.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct EmitterCategory {
    type_code: u8,
    category: u8,
}

impl EmitterCategory {
    pub const fn from_type_code_and_category_unchecked(type_code: u8, category: u8) -> Self {
        Self {
            type_code,
            category,
        }
    }

    pub const fn from_type_code_and_category(type_code: u8, category: u8) -> Option<Self> {
        if type_code >= 1 && type_code <= 4 && category < 8 {
            Some(Self {
                type_code,
                category,
            })
        }
        else {
            None
        }
    }

    /// Category set `A` to `D`, or `?` for a type code outside 1 to 4.
    pub fn set(&self) -> char {
        match self.type_code {
            1..=4 => char::from(b'A' + (4 - self.type_code)),
            _ => '?',
        }
    }

    pub fn category(&self) -> u8 {
        self.category
    }

    pub fn description(&self) -> &'static str {
        match (self.type_code, self.category) {
            (_, 0) => "no category information",
            (2, 1) => "surface emergency vehicle",
            (2, 3) => "surface service vehicle",
            (2, 4..=7) => "ground obstruction",
            (3, 1) => "glider, sailplane",
            (3, 2) => "lighter-than-air",
            (3, 3) => "parachutist, skydiver",
            (3, 4) => "ultralight, hang-glider, paraglider",
            (3, 6) => "unmanned aerial vehicle",
            (3, 7) => "space or transatmospheric vehicle",
            (4, 1) => "light",
            (4, 2) => "medium 1",
            (4, 3) => "medium 2",
            (4, 4) => "high vortex aircraft",
            (4, 5) => "heavy",
            (4, 6) => "high performance",
            (4, 7) => "rotorcraft",
            _ => "reserved",
        }
    }
}

impl Display for EmitterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.set(), self.category)
    }
}

impl Debug for EmitterCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "EmitterCategory({self}, {})", self.description())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        EmitterCategory,
        EncodedCallsign,
    };

    #[test]
    fn it_decodes_and_trims_callsigns() {
        // ME bits 9-56 of 8dacf84e23101332cf3ca037ef13
        let callsign = EncodedCallsign::from_u64(0x101332cf3ca0).unwrap().decode();
        assert_eq!(callsign, "DAL2332");
        assert_eq!(callsign.to_string(), "DAL2332");
        assert!(callsign.is_valid());
    }

    #[test]
    fn it_maps_invalid_codes_to_question_marks() {
        // all codes 0
        let callsign = EncodedCallsign::from_u64(0).unwrap().decode();
        assert_eq!(callsign, "????????");
        assert!(!callsign.is_valid());
    }

    #[test]
    fn it_decodes_blank_callsigns() {
        // 8 spaces (code 32)
        let callsign = EncodedCallsign::from_u64(0x820820820820).unwrap().decode();
        assert!(callsign.is_empty());
        assert_eq!(callsign, "");
    }

    #[test]
    fn it_rejects_wide_words() {
        assert!(EncodedCallsign::from_u64(1 << 48).is_none());
    }

    #[test]
    fn it_formats_emitter_categories() {
        let category = EmitterCategory::from_type_code_and_category(4, 3).unwrap();
        assert_eq!(category.to_string(), "A3");
        assert_eq!(category.description(), "medium 2");
        assert_eq!(
            EmitterCategory::from_type_code_and_category(1, 0)
                .unwrap()
                .to_string(),
            "D0"
        );
        assert!(EmitterCategory::from_type_code_and_category(5, 0).is_none());

        let category = EmitterCategory::from_type_code_and_category_unchecked(9, 2);
        assert_eq!(category.set(), '?');
        assert_eq!(
            EmitterCategory::from_type_code_and_category_unchecked(0, 2).set(),
            '?'
        );
    }
}
