//! Dominant-color palette extraction
//!
//! Decodes a wallpaper, reduces it to a handful of representative colors and
//! fits those onto the LED zones of the keyboard.

mod quantize;

use std::fmt;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PaletteError {
    #[error("Palette size must be positive")]
    InvalidSize,

    #[error("Wallpaper not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to open {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode {}: {source}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Palette extraction returned no colors")]
    Empty,
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("Invalid color '{0}', expected 6 hex digits")]
pub struct ParseColorError(String);

/// A 24-bit RGB color
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }
}

impl From<[u8; 3]> for Color {
    fn from([r, g, b]: [u8; 3]) -> Self {
        Self { r, g, b }
    }
}

/// Six lowercase hex digits, no prefix
impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl FromStr for Color {
    type Err = ParseColorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.trim();
        let digits = digits
            .strip_prefix('#')
            .or_else(|| digits.strip_prefix("0x"))
            .or_else(|| digits.strip_prefix("0X"))
            .unwrap_or(digits);

        if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseColorError(s.to_string()));
        }

        let value = u32::from_str_radix(digits, 16).map_err(|_| ParseColorError(s.to_string()))?;
        Ok(Self::new(
            (value >> 16) as u8,
            (value >> 8) as u8,
            value as u8,
        ))
    }
}

/// Exactly one color per LED zone
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LedColors(Vec<Color>);

impl LedColors {
    pub fn as_slice(&self) -> &[Color] {
        &self.0
    }

    pub fn to_hex_strings(&self) -> Vec<String> {
        self.0.iter().map(Color::to_string).collect()
    }
}

impl AsRef<[Color]> for LedColors {
    fn as_ref(&self) -> &[Color] {
        &self.0
    }
}

/// Extract the `size` most dominant colors of the image at `path`.
///
/// The result is ordered most-frequent first and always has exactly `size`
/// entries; images with fewer distinct colors repeat the last one.
pub fn extract_palette(path: &Path, size: usize) -> Result<Vec<Color>, PaletteError> {
    if size == 0 {
        return Err(PaletteError::InvalidSize);
    }
    if !path.exists() {
        return Err(PaletteError::NotFound(path.to_path_buf()));
    }

    let reader = image::ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|source| PaletteError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let image = reader.decode().map_err(|source| PaletteError::Decode {
        path: path.to_path_buf(),
        source,
    })?;

    palette_from_pixels(image.to_rgb8().pixels().map(|p| p.0), size)
}

/// Quantize raw RGB pixels down to `size` dominant colors.
pub fn palette_from_pixels(
    pixels: impl IntoIterator<Item = [u8; 3]>,
    size: usize,
) -> Result<Vec<Color>, PaletteError> {
    if size == 0 {
        return Err(PaletteError::InvalidSize);
    }

    let pixels: Vec<[u8; 3]> = pixels.into_iter().collect();
    let mut ranked = quantize::dominant_colors(&pixels, size);
    ranked.sort_by(|(a_color, a_count), (b_color, b_count)| {
        b_count.cmp(a_count).then_with(|| a_color.cmp(b_color))
    });

    let mut colors: Vec<Color> = ranked.into_iter().map(|(color, _)| color).take(size).collect();
    let last = *colors.last().ok_or(PaletteError::Empty)?;
    colors.resize(size, last);
    Ok(colors)
}

/// Pad (repeating the last color) or truncate a palette to `led_count` colors.
pub fn fit_colors(palette: &[Color], led_count: NonZeroUsize) -> Result<LedColors, PaletteError> {
    let last = *palette.last().ok_or(PaletteError::Empty)?;
    let led_count = led_count.get();

    let mut colors: Vec<Color> = palette.iter().copied().take(led_count).collect();
    colors.resize(led_count, last);
    Ok(LedColors(colors))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use tempfile::TempDir;

    const RAINBOW: [[u8; 3]; 8] = [
        [255, 0, 0],
        [255, 128, 0],
        [255, 255, 0],
        [0, 255, 0],
        [0, 255, 255],
        [0, 0, 255],
        [128, 0, 255],
        [255, 0, 255],
    ];

    fn count(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn hex(colors: &[&str]) -> Vec<Color> {
        colors.iter().map(|c| c.parse().unwrap()).collect()
    }

    fn write_rainbow(path: &Path) {
        let mut image = RgbImage::new(4, 2);
        for (i, pixel) in image.pixels_mut().enumerate() {
            *pixel = Rgb(RAINBOW[i]);
        }
        image.save(path).unwrap();
    }

    #[test]
    fn test_color_display_and_parse() {
        let color = Color::new(0xff, 0x80, 0x0a);
        assert_eq!(color.to_string(), "ff800a");
        assert_eq!("FF800A".parse::<Color>().unwrap(), color);
        assert_eq!("#ff800a".parse::<Color>().unwrap(), color);
        assert_eq!("0xFF800a".parse::<Color>().unwrap(), color);
        assert!("ff80".parse::<Color>().is_err());
        assert!("gg0000".parse::<Color>().is_err());
    }

    #[test]
    fn test_fit_pads_with_last_color() {
        let palette = hex(&["ff0000", "00ff00", "0000ff"]);
        let fitted = fit_colors(&palette, count(8)).unwrap();

        assert_eq!(fitted.as_slice().len(), 8);
        assert_eq!(&fitted.as_slice()[..3], palette.as_slice());
        assert!(fitted.as_slice()[3..].iter().all(|c| *c == palette[2]));
    }

    #[test]
    fn test_fit_exact_length_is_unchanged() {
        let palette = hex(&["111111", "222222"]);
        let fitted = fit_colors(&palette, count(2)).unwrap();
        assert_eq!(fitted.as_slice(), palette.as_slice());
    }

    #[test]
    fn test_fit_truncates_in_order() {
        let palette = hex(&["111111", "222222", "333333", "444444", "555555"]);
        let fitted = fit_colors(&palette, count(3)).unwrap();
        assert_eq!(fitted.as_slice(), &palette[..3]);
    }

    #[test]
    fn test_fit_rejects_empty_palette() {
        for n in [1, 8, 12] {
            assert!(matches!(fit_colors(&[], count(n)), Err(PaletteError::Empty)));
        }
    }

    #[test]
    fn test_extract_rainbow_image() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("wallpaper.png");
        write_rainbow(&path);

        let colors = extract_palette(&path, 8).unwrap();

        assert_eq!(colors.len(), 8);
        assert!(colors.iter().all(|c| c.to_string().len() == 6));
        let mut got: Vec<[u8; 3]> = colors.iter().map(|c| [c.r, c.g, c.b]).collect();
        let mut expected = RAINBOW.to_vec();
        got.sort();
        expected.sort();
        assert_eq!(got, expected);
    }

    #[test]
    fn test_extract_ranks_by_frequency_and_pads() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("two-tone.png");
        let mut image = RgbImage::from_pixel(10, 1, Rgb([0, 0, 255]));
        for x in 0..3 {
            image.put_pixel(x, 0, Rgb([255, 0, 0]));
        }
        image.save(&path).unwrap();

        let colors = extract_palette(&path, 4).unwrap();
        assert_eq!(colors, hex(&["0000ff", "ff0000", "ff0000", "ff0000"]));
    }

    #[test]
    fn test_extract_errors() {
        let temp_dir = TempDir::new().unwrap();

        let missing = temp_dir.path().join("missing.png");
        assert!(matches!(
            extract_palette(&missing, 8),
            Err(PaletteError::NotFound(_))
        ));

        let garbage = temp_dir.path().join("garbage.png");
        std::fs::write(&garbage, b"definitely not a png").unwrap();
        assert!(matches!(
            extract_palette(&garbage, 8),
            Err(PaletteError::Decode { .. })
        ));

        write_rainbow(&missing);
        assert!(matches!(
            extract_palette(&missing, 0),
            Err(PaletteError::InvalidSize)
        ));
    }

    #[test]
    fn test_extract_clusters_busy_image() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gradient.png");
        let image = RgbImage::from_fn(64, 4, |x, y| {
            if y < 3 {
                Rgb([200 + (x % 8) as u8, 10, 10])
            } else {
                Rgb([10, 10, 200 + (x % 8) as u8])
            }
        });
        image.save(&path).unwrap();

        let colors = extract_palette(&path, 2).unwrap();
        assert_eq!(colors.len(), 2);
        assert!(colors[0].r > 190 && colors[0].b < 20, "reds dominate: {colors:?}");
        assert!(colors[1].b > 190 && colors[1].r < 20, "blues second: {colors:?}");
    }

    #[test]
    fn test_empty_pixels_error() {
        assert!(matches!(
            palette_from_pixels(Vec::new(), 4),
            Err(PaletteError::Empty)
        ));
    }
}
