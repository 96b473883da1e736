use crate::BrokerError;
use camino::Utf8Path;
use std::collections::BTreeSet;

/// The control files of the System76 keyboard backlight.
///
/// Supporting new hardware means adding paths here, never loosening the check.
pub const DEFAULT_ALLOW_LIST: &[&str] = &[
    "/sys/class/leds/system76::kbd_backlight/brightness",
    "/sys/class/leds/system76::kbd_backlight/max_brightness",
    "/sys/class/leds/system76::kbd_backlight/color_left",
    "/sys/class/leds/system76::kbd_backlight/color_center",
    "/sys/class/leds/system76::kbd_backlight/color_right",
    "/sys/class/leds/system76::kbd_backlight/color_extra",
];

/// Restricts the broker writes to a fixed set of paths.
///
/// Paths are compared as strings, not as path components: `/sys/class/leds/../leds/...` or a
/// trailing `/` never match. Only the superuser may write elsewhere.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathGuard {
    allowed: BTreeSet<String>,
}

impl Default for PathGuard {
    fn default() -> Self {
        PathGuard::new(DEFAULT_ALLOW_LIST.iter().copied())
    }
}

impl PathGuard {
    pub fn new<P: Into<String>>(paths: impl IntoIterator<Item = P>) -> Self {
        PathGuard {
            allowed: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn validate(&self, path: &Utf8Path, caller_is_superuser: bool) -> Result<(), BrokerError> {
        if caller_is_superuser || self.allowed.contains(path.as_str()) {
            Ok(())
        } else {
            Err(BrokerError::PathNotAllowed(path.to_owned()))
        }
    }

    pub fn allowed_paths(&self) -> impl Iterator<Item = &Utf8Path> {
        self.allowed.iter().map(Utf8Path::new)
    }
}
