//! The ten enrollable fingers and their wire/on-disk encodings.

use std::fmt;

/// One of the ten fingers a print can be enrolled against.
///
/// Numeric values match libfprint's `enum fp_finger` so on-disk finger codes
/// stay compatible with the original file layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Finger {
    LeftThumb = 1,
    LeftIndex = 2,
    LeftMiddle = 3,
    LeftRing = 4,
    LeftLittle = 5,
    RightThumb = 6,
    RightIndex = 7,
    RightMiddle = 8,
    RightRing = 9,
    RightLittle = 10,
}

impl Finger {
    pub const ALL: [Finger; 10] = [
        Finger::LeftThumb,
        Finger::LeftIndex,
        Finger::LeftMiddle,
        Finger::LeftRing,
        Finger::LeftLittle,
        Finger::RightThumb,
        Finger::RightIndex,
        Finger::RightMiddle,
        Finger::RightRing,
        Finger::RightLittle,
    ];

    /// Stable lowercase kebab wire name, e.g. `"left-index-finger"`.
    pub fn wire_name(self) -> &'static str {
        match self {
            Finger::LeftThumb => "left-thumb",
            Finger::LeftIndex => "left-index-finger",
            Finger::LeftMiddle => "left-middle-finger",
            Finger::LeftRing => "left-ring-finger",
            Finger::LeftLittle => "left-little-finger",
            Finger::RightThumb => "right-thumb",
            Finger::RightIndex => "right-index-finger",
            Finger::RightMiddle => "right-middle-finger",
            Finger::RightRing => "right-ring-finger",
            Finger::RightLittle => "right-little-finger",
        }
    }

    /// Single hex digit used as the on-disk template filename (1..=A).
    pub fn code(self) -> u8 {
        self as u8
    }

    /// Parse the single-hex-digit on-disk filename back into a finger.
    pub fn from_code(code: u8) -> Option<Finger> {
        Self::ALL.into_iter().find(|f| f.code() == code)
    }

    /// Parse a wire name into a finger. Returns `None` for unknown names
    /// (including `"any"`, which is not a concrete finger).
    pub fn from_wire_name(name: &str) -> Option<Finger> {
        Self::ALL.into_iter().find(|f| f.wire_name() == name)
    }
}

impl fmt::Display for Finger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// What `VerifyStart`/`EnrollStart` were asked to operate on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FingerSelector {
    /// Auto-select: identify over the whole gallery, or the first enrolled
    /// finger if the driver can't identify.
    Any,
    Specific(Finger),
}

impl FingerSelector {
    /// Parse a `VerifyStart`/`EnrollStart` argument. Empty string and `"any"`
    /// both mean auto-select; anything else not matching a finger name
    /// returns `None` (the caller decides how to react: EnrollStart rejects,
    /// VerifyStart coerces to `Any`).
    pub fn parse(name: &str) -> Option<FingerSelector> {
        if name.is_empty() || name == "any" {
            return Some(FingerSelector::Any);
        }
        Finger::from_wire_name(name).map(FingerSelector::Specific)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finger_code_bijection() {
        for finger in Finger::ALL {
            let code = finger.code();
            assert_eq!(Finger::from_code(code), Some(finger));
        }
        for code in 1..=10u8 {
            let finger = Finger::from_code(code).expect("valid code");
            assert_eq!(finger.code(), code);
        }
        assert_eq!(Finger::from_code(0), None);
        assert_eq!(Finger::from_code(11), None);
    }

    #[test]
    fn finger_name_roundtrip() {
        for finger in Finger::ALL {
            let name = finger.wire_name();
            assert_eq!(Finger::from_wire_name(name), Some(finger));
        }
    }

    #[test]
    fn selector_parses_auto_forms() {
        assert_eq!(FingerSelector::parse(""), Some(FingerSelector::Any));
        assert_eq!(FingerSelector::parse("any"), Some(FingerSelector::Any));
        assert_eq!(
            FingerSelector::parse("left-thumb"),
            Some(FingerSelector::Specific(Finger::LeftThumb))
        );
        assert_eq!(FingerSelector::parse("pinky"), None);
    }
}
