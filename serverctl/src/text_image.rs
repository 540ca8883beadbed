use image::{imageops::FilterType, DynamicImage};

const MAX_COLUMNS: u32 = 175;
const MAX_ROWS: u32 = 20;
// Source pixels covered by one glyph row
const ROW_HEIGHT: u32 = 9;
const GLYPH: char = '🭴';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColoredGlyph {
    pub symbol: char,
    pub color: String,
}

pub fn hex_color(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Render a picture as rows of colored glyphs that fit in the game chat.
pub fn render(image: &DynamicImage) -> Vec<Vec<ColoredGlyph>> {
    let (width, height) = (image.width(), image.height());
    if width == 0 || height == 0 {
        return Vec::new();
    }

    let factor = f32::min(
        MAX_COLUMNS as f32 / width as f32,
        (MAX_ROWS * ROW_HEIGHT) as f32 / height as f32,
    );
    let columns = ((width as f32 * factor) as u32).max(1);
    let rows = ((height as f32 * factor) as u32 / ROW_HEIGHT).max(1);

    let scaled = image::imageops::resize(&image.to_rgba8(), columns, rows, FilterType::CatmullRom);

    scaled
        .rows()
        .map(|row| {
            row.map(|pixel| {
                let [r, g, b, a] = pixel.0;
                let color = if a == 0 { hex_color(255, 255, 255) } else { hex_color(r, g, b) };
                ColoredGlyph { symbol: GLYPH, color }
            })
            .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use image::{Rgba, RgbaImage};

    use super::*;

    #[test]
    fn hex_is_lowercase_and_padded() {
        assert_eq!(hex_color(255, 8, 0), "#ff0800");
    }

    #[test]
    fn wide_image_is_limited_by_columns() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(350, 90, Rgba([10, 20, 30, 255])));
        let rows = render(&image);
        assert_eq!(rows.len(), 5);
        assert!(rows.iter().all(|row| row.len() == 175));
        assert_eq!(rows[0][0].color, "#0a141e");
    }

    #[test]
    fn tall_image_is_limited_by_rows() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(40, 360, Rgba([0, 0, 0, 255])));
        let rows = render(&image);
        assert_eq!(rows.len(), 20);
    }

    #[test]
    fn transparent_pixels_become_white() {
        let image = DynamicImage::ImageRgba8(RgbaImage::from_pixel(18, 18, Rgba([0, 0, 0, 0])));
        let rows = render(&image);
        assert!(!rows.is_empty());
        assert!(rows.iter().flatten().all(|glyph| glyph.color == "#ffffff" && glyph.symbol == GLYPH));
    }
}
