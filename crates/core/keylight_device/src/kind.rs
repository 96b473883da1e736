/// How the colors of a keyboard can be changed.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum_macros::Display,
    strum_macros::EnumString,
    strum_macros::IntoStaticStr,
)]
#[strum(serialize_all = "kebab-case")]
pub enum KeyboardKind {
    /// Any RGB value, set per zone.
    #[default]
    Rgb,
    /// One of a fixed list of colors.
    List,
    /// Brightness only.
    NoColor,
    /// A single hard-wired color.
    SingleColor,
}

impl KeyboardKind {
    pub fn has_color(self) -> bool {
        matches!(self, KeyboardKind::Rgb | KeyboardKind::List)
    }
}

/// What a keyboard model supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardProfile {
    pub kind: KeyboardKind,
    pub brightness: bool,
    pub zones: usize,
    pub color_format: &'static str,
}

impl KeyboardProfile {
    pub const SYSTEM76: KeyboardProfile = KeyboardProfile {
        kind: KeyboardKind::Rgb,
        brightness: true,
        zones: 3,
        color_format: "hex@RRGGBB",
    };
}

impl Default for KeyboardProfile {
    fn default() -> Self {
        KeyboardProfile::SYSTEM76
    }
}
