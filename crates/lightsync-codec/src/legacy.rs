// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Legacy line format, one light per line:
//!
//! ```text
//! <Type> (x,y,z) (pitch°,yaw°,roll°) <intensity> RGB(r,g,b) [inner° outer°]
//! ```
//!
//! Lines have no identity; a legacy file is always a full-replace batch.
//! Numbers are parsed permissively (see [`permissive_f32`]).

use std::borrow::Cow;

use lightsync_port::{LightKind, LightRecord, Orientation, Rgb8, Rotator, SpotCone, Vec3};
use thiserror::Error;

/// Minimum tokens on a line: type, location, rotation, intensity, color.
pub const MIN_LEGACY_TOKENS: usize = 5;

const WHITE: Rgb8 = [255, 255, 255];

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Line-level decode failure. The line is skipped; the file continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LegacyDecodeError {
    /// Fewer than [`MIN_LEGACY_TOKENS`] tokens.
    #[error("expected at least 5 tokens, found {found}")]
    TooFewTokens {
        /// Tokens actually present.
        found: usize,
    },
    /// First token is not a supported light type.
    #[error("unknown light type {0:?}")]
    UnknownKind(String),
    /// Location token did not parse (and was not literally `(0,0,0)`).
    #[error("unparseable location {0:?}")]
    BadLocation(String),
}

/// Turn raw legacy file bytes into text.
///
/// A leading UTF-8 byte order mark is dropped. When the file is not valid
/// UTF-8 as a whole, each line that fails UTF-8 is read as Latin-1, so a
/// single-byte `°` (0xB0) from an ANSI export survives.
pub fn decode_legacy_bytes(bytes: &[u8]) -> Cow<'_, str> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if let Ok(text) = std::str::from_utf8(bytes) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        bytes
            .split_inclusive(|&b| b == b'\n')
            .map(|line| match std::str::from_utf8(line) {
                Ok(text) => Cow::Borrowed(text),
                Err(_) => Cow::Owned(line.iter().copied().map(char::from).collect()),
            })
            .collect(),
    )
}

/// True for lines the caller should not hand to [`decode_line`]: blank or `#` comments.
pub fn is_skippable_line(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty() || trimmed.starts_with('#')
}

/// Split on whitespace, except inside parenthesized groups.
///
/// `Spot (1, 2, 3) RGB(1, 2, 3)` yields three tokens.
pub fn tokenize_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;

    for ch in line.chars() {
        match ch {
            '(' => {
                depth += 1;
                current.push(ch);
            }
            ')' => {
                depth = depth.saturating_sub(1);
                current.push(ch);
            }
            c if c.is_whitespace() && depth == 0 => flush_token(&mut current, &mut tokens),
            c => current.push(c),
        }
    }
    flush_token(&mut current, &mut tokens);
    tokens
}

fn flush_token(current: &mut String, tokens: &mut Vec<String>) {
    let token = current.trim();
    if !token.is_empty() {
        tokens.push(token.to_owned());
    }
    current.clear();
}

/// Parse a float the way the legacy exporter's readers always have: a
/// malformed token is `0.0`, never an error. A trailing degree glyph is ignored.
///
/// Kept isolated so it can be tightened without touching tokenization.
pub fn permissive_f32(token: &str) -> f32 {
    token
        .trim()
        .trim_end_matches('°')
        .trim()
        .parse::<f32>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// Parse `(a,b,c)` (parentheses and degree glyphs optional) into three floats.
fn parse_triple(token: &str) -> Option<[f32; 3]> {
    let cleaned: String = token
        .chars()
        .filter(|c| !matches!(c, '(' | ')' | '°'))
        .collect();
    let parts: Vec<&str> = cleaned.split(',').collect();
    match parts.as_slice() {
        [a, b, c] => Some([permissive_f32(a), permissive_f32(b), permissive_f32(c)]),
        _ => None,
    }
}

fn parse_location(token: &str) -> Result<Vec3, LegacyDecodeError> {
    let parsed = parse_triple(token).unwrap_or([0.0; 3]);
    if parsed == [0.0; 3] && token != "(0,0,0)" {
        return Err(LegacyDecodeError::BadLocation(token.to_owned()));
    }
    let [x, y, z] = parsed;
    Ok(Vec3::new(x, y, z))
}

fn parse_rotation(token: &str) -> Rotator {
    parse_triple(token).map_or(Rotator::ZERO, |[pitch, yaw, roll]| {
        Rotator::new(pitch, yaw, roll)
    })
}

fn parse_color(token: &str) -> Rgb8 {
    let Some(inner) = token
        .strip_prefix("RGB(")
        .and_then(|rest| rest.strip_suffix(')'))
    else {
        return WHITE;
    };
    let parts: Vec<&str> = inner.split(',').collect();
    match parts.as_slice() {
        [r, g, b] => [channel(r), channel(g), channel(b)],
        _ => WHITE,
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn channel(token: &str) -> u8 {
    permissive_f32(token).round().clamp(0.0, 255.0) as u8
}

/// Decode one non-comment line into a light record (sender units, no identity).
pub fn decode_line(line: &str) -> Result<LightRecord, LegacyDecodeError> {
    let tokens = tokenize_line(line);
    if tokens.len() < MIN_LEGACY_TOKENS {
        return Err(LegacyDecodeError::TooFewTokens {
            found: tokens.len(),
        });
    }

    let kind: LightKind = tokens[0]
        .parse()
        .map_err(|()| LegacyDecodeError::UnknownKind(tokens[0].clone()))?;
    let position = parse_location(&tokens[1])?;
    let rotation = parse_rotation(&tokens[2]);
    let intensity = permissive_f32(&tokens[3]).max(0.0);
    let color = parse_color(&tokens[4]);

    let cone = match (kind, tokens.get(5), tokens.get(6)) {
        (LightKind::Spot, Some(inner), Some(outer)) => SpotCone {
            inner_deg: permissive_f32(inner),
            outer_deg: permissive_f32(outer),
        },
        _ => SpotCone::DEFAULT,
    };

    Ok(LightRecord {
        kind,
        identity: None,
        position,
        orientation: Orientation::Rotation(rotation),
        intensity,
        color,
        cone,
    })
}
