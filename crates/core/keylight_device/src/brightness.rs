/// Converts a percentage into a raw brightness in `[0, max]`.
///
/// Out of range percentages are clamped.
pub fn percent_to_raw(percent: i64, max: u32) -> u32 {
    let raw = (percent as f64 / 100.0 * f64::from(max)).round();
    raw.clamp(0.0, f64::from(max)) as u32
}

/// Converts a raw brightness into a percentage in `[0, 100]`.
///
/// A keyboard with a max brightness of 0 is always off.
pub fn raw_to_percent(raw: u32, max: u32) -> u8 {
    if max == 0 {
        return 0;
    }
    (f64::from(raw.min(max)) / f64::from(max) * 100.0).round() as u8
}
