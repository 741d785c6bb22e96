//! Cue timestamp rendering and parsing.
//!
//! Timestamps are rendered as zero-padded `HH:MM:SS.mmm`; the short
//! `MM:SS.mmm` form is accepted on input for compatibility with hand-edited
//! files.

use crate::error::Error;

const CUE_ARROW: &str = "-->";

/// Format seconds as a `HH:MM:SS.mmm` cue timestamp.
pub fn format_timestamp(seconds: f64) -> String {
    let hours = (seconds / 3600.0).floor() as u64;
    let minutes = ((seconds % 3600.0) / 60.0).floor() as u64;
    let secs = seconds % 60.0;
    format!("{hours:02}:{minutes:02}:{secs:06.3}")
}

/// Parse a `HH:MM:SS.mmm` or `MM:SS.mmm` timestamp into seconds.
pub fn parse_timestamp(text: &str) -> Result<f64, Error> {
    let invalid = || Error::InvalidTimestamp(text.to_string());
    let parts: Vec<&str> = text.trim().split(':').collect();

    let (hours, minutes, seconds) = match parts.as_slice() {
        [h, m, s] => (
            h.parse::<u64>().map_err(|_| invalid())?,
            m.parse::<u64>().map_err(|_| invalid())?,
            s.parse::<f64>().map_err(|_| invalid())?,
        ),
        [m, s] => (
            0,
            m.parse::<u64>().map_err(|_| invalid())?,
            s.parse::<f64>().map_err(|_| invalid())?,
        ),
        _ => return Err(invalid()),
    };

    if !seconds.is_finite() || seconds < 0.0 {
        return Err(invalid());
    }

    Ok(hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds)
}

/// Render a `start --> end` cue timing line.
pub fn format_cue_timing(start: f64, end: f64) -> String {
    format!("{} {CUE_ARROW} {}", format_timestamp(start), format_timestamp(end))
}

/// Parse a `start --> end` cue timing line into `(start, end)` seconds.
pub fn parse_cue_timing(line: &str) -> Result<(f64, f64), Error> {
    let (start, end) = line
        .split_once(CUE_ARROW)
        .ok_or_else(|| Error::InvalidCueTiming(line.to_string()))?;
    Ok((parse_timestamp(start)?, parse_timestamp(end)?))
}
