//! LRC format parser.
//!
//! Parses synchronized lyrics in LRC format:
//! [mm:ss.xx] Lyrics line here
//!
//! Example:
//! [00:12.34] Hello world
//! [00:15.00] Another line

use crate::model::LyricLine;

/// Shown in place of blank or instrumental-marker lines.
const PLACEHOLDER: &str = "♪";

/// Sentinel time for lyrics with no timing information.
pub const UNTIMED: f64 = -1.0;

/// Parse LRC content into timed lines, in source line order.
///
/// Lines without a leading `[mm:ss.xx]` stamp (metadata headers like
/// `[ti:...]`, stray text) are skipped, not an error.
pub fn parse_synced(content: &str) -> Vec<LyricLine> {
    content.lines().filter_map(parse_line).collect()
}

/// Plain (unsynced) lyrics: one line per non-blank source line, with the
/// untimed sentinel and never marked instrumental.
pub fn parse_plain(content: &str) -> Vec<LyricLine> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| LyricLine {
            time: UNTIMED,
            text: line.to_string(),
            is_instrumental: false,
        })
        .collect()
}

fn parse_line(line: &str) -> Option<LyricLine> {
    let rest = line.strip_prefix('[')?;
    let (stamp, text) = rest.split_once(']')?;
    let time = parse_timestamp(stamp)?;

    let text = text.trim();
    let is_instrumental =
        text.is_empty() || text == PLACEHOLDER || text.eq_ignore_ascii_case("instrumental");

    Some(LyricLine {
        time,
        text: if is_instrumental {
            PLACEHOLDER.to_string()
        } else {
            text.to_string()
        },
        is_instrumental,
    })
}

/// Parse a `mm:ss.xx` or `mm:ss.xxx` stamp to seconds, rounded to 2
/// decimals. The fractional field is normalized to milliseconds first
/// (short fields padded with trailing zeros).
fn parse_timestamp(stamp: &str) -> Option<f64> {
    let (mins, rest) = stamp.split_once(':')?;
    let (secs, frac) = rest.split_once('.')?;
    if mins.len() != 2 || secs.len() != 2 || !(2..=3).contains(&frac.len()) {
        return None;
    }

    let mins: u32 = mins.parse().ok()?;
    let secs: u32 = secs.parse().ok()?;
    let ms: u32 = format!("{frac:0<3}")[..3].parse().ok()?;

    Some(round2(
        f64::from(mins) * 60.0 + f64::from(secs) + f64::from(ms) / 1000.0,
    ))
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}
