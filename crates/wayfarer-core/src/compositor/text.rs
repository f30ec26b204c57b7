//! Text overlay layout: measuring, word wrapping and drawing centered lines

use std::sync::Arc;

use image::{Rgb, RgbImage};

use super::color::parse_hex_color;
use super::font::BitmapFont;
use crate::error::ClientResult;

/// Longest overlay string the compositor will lay out
pub const MAX_OVERLAY_CHARS: usize = 200;

/// Line height as a multiple of the font size
const LINE_SPACING: f32 = 1.2;

/// A face that can measure and rasterize single characters
pub trait Typeface: Send + Sync {
    fn name(&self) -> &str;

    /// Horizontal advance of `ch` at `size` pixels
    fn advance(&self, ch: char, size: f32) -> f32;

    /// Draw `ch` with its cell's top-left corner at (`x`, `y`)
    fn draw_glyph(&self, canvas: &mut RgbImage, ch: char, x: f32, y: f32, size: f32, color: Rgb<u8>);

    fn measure(&self, text: &str, size: f32) -> f32 {
        text.chars().map(|c| self.advance(c, size)).sum()
    }

    fn line_height(&self, size: f32) -> f32 {
        size * LINE_SPACING
    }
}

/// Font family, pixel size and color for an overlay
#[derive(Debug, Clone, PartialEq)]
pub struct FontSpec {
    pub family: String,
    /// Size in preview pixels
    pub size: f32,
    pub color: Rgb<u8>,
}

impl FontSpec {
    pub fn new(family: impl Into<String>, size: f32, color: &str) -> ClientResult<Self> {
        Ok(Self {
            family: family.into(),
            size,
            color: parse_hex_color(color)?,
        })
    }
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "sans-serif".to_string(),
            size: 24.0,
            color: Rgb([255, 255, 255]),
        }
    }
}

/// Text placed over the composed image
#[derive(Debug, Clone, PartialEq)]
pub struct TextOverlay {
    pub content: String,
    pub font: FontSpec,
    /// Anchor in preview coordinates; the text block is centered on it
    pub anchor: (f32, f32),
}

impl TextOverlay {
    pub fn new(content: impl Into<String>, font: FontSpec, anchor: (f32, f32)) -> Self {
        Self {
            content: content.into(),
            font,
            anchor,
        }
    }

    /// Content cut to [`MAX_OVERLAY_CHARS`]
    pub fn bounded_content(&self) -> String {
        self.content.chars().take(MAX_OVERLAY_CHARS).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.content.trim().is_empty()
    }
}

/// Greedy word wrap.
///
/// Explicit newlines start a new line. A single word wider than
/// `max_width` stays whole on its own line.
pub fn wrap_lines(text: &str, max_width: f32, measure: impl Fn(&str) -> f32) -> Vec<String> {
    let mut lines = Vec::new();

    for paragraph in text.lines() {
        let mut current = String::new();
        for word in paragraph.split_whitespace() {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = format!("{} {}", current, word);
            if measure(&candidate) <= max_width {
                current = candidate;
            } else {
                lines.push(std::mem::replace(&mut current, word.to_string()));
            }
        }
        if !current.is_empty() {
            lines.push(current);
        }
    }

    lines
}

/// Draw already-wrapped lines centered horizontally on `center.0`, with
/// the whole block centered vertically on `center.1`.
pub(crate) fn draw_block(
    canvas: &mut RgbImage,
    face: &Arc<dyn Typeface>,
    lines: &[String],
    center: (f32, f32),
    size: f32,
    color: Rgb<u8>,
) {
    let line_height = face.line_height(size);
    let block_height = line_height * lines.len() as f32;
    let mut y = center.1 - block_height / 2.0;

    for line in lines {
        let mut x = center.0 - face.measure(line, size) / 2.0;
        for ch in line.chars() {
            face.draw_glyph(canvas, ch, x, y, size, color);
            x += face.advance(ch, size);
        }
        y += line_height;
    }
}

/// The face used when no registered family matches
pub fn default_typeface() -> Arc<dyn Typeface> {
    Arc::new(BitmapFont)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn char_width(s: &str) -> f32 {
        s.chars().count() as f32 * 10.0
    }

    #[test]
    fn test_wrap_respects_width() {
        let lines = wrap_lines("the quick brown fox jumps over the lazy dog", 100.0, char_width);
        assert!(lines.len() >= 2);
        for line in &lines {
            assert!(char_width(line) <= 100.0, "{:?} too wide", line);
        }
        assert_eq!(lines.join(" "), "the quick brown fox jumps over the lazy dog");
    }

    #[test]
    fn test_wrap_keeps_long_word_whole() {
        let lines = wrap_lines("a supercalifragilistic b", 50.0, char_width);
        assert_eq!(lines, vec!["a", "supercalifragilistic", "b"]);
    }

    #[test]
    fn test_wrap_empty_and_whitespace() {
        assert!(wrap_lines("", 100.0, char_width).is_empty());
        assert!(wrap_lines("   \n  ", 100.0, char_width).is_empty());
    }

    #[test]
    fn test_wrap_honors_newlines() {
        let lines = wrap_lines("hello\nworld", 1000.0, char_width);
        assert_eq!(lines, vec!["hello", "world"]);
    }

    #[test]
    fn test_bounded_content() {
        let overlay = TextOverlay::new("x".repeat(500), FontSpec::default(), (0.0, 0.0));
        assert_eq!(overlay.bounded_content().chars().count(), MAX_OVERLAY_CHARS);
    }

    #[test]
    fn test_font_spec_parses_color() {
        let font = FontSpec::new("serif", 32.0, "#000").unwrap();
        assert_eq!(font.color, Rgb([0, 0, 0]));
        assert!(FontSpec::new("serif", 32.0, "nope").is_err());
    }

    #[test]
    fn test_draw_block_centers_text() {
        let face = default_typeface();
        let mut canvas = RgbImage::new(200, 100);
        let white = Rgb([255, 255, 255]);
        draw_block(&mut canvas, &face, &["HI".to_string()], (100.0, 50.0), 16.0, white);

        let xs: Vec<u32> = canvas
            .enumerate_pixels()
            .filter(|(_, _, p)| **p == white)
            .map(|(x, _, _)| x)
            .collect();
        let min = *xs.iter().min().unwrap();
        let max = *xs.iter().max().unwrap();
        // Glyph cells are centered, so ink sits within the 24px-wide span around x=100
        assert!(min >= 88 && max <= 112, "ink spans {}..{}", min, max);
    }
}
