use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use rusttype::{point, Font, Scale};
use thiserror::Error;

use crate::crossword::Crossword;
use crate::render::{letter_grid, open_cells};
use crate::search::Assignment;

/// Side of one grid cell in pixels.
pub const CELL_SIZE: u32 = 100;

/// Black margin kept around the white interior of each open cell.
pub const CELL_BORDER: u32 = 2;

/// Height of the letters drawn inside a cell, in pixels.
pub const FONT_SIZE: f32 = 80.0;

const BLACK: [u8; 4] = [0, 0, 0, 255];
const WHITE: [u8; 4] = [255, 255, 255, 255];

#[derive(Error, Debug)]
pub enum ImageError {
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("can't read font {path}: {source}")]
    FontUnreadable { path: PathBuf, source: io::Error },

    #[error("{0} is not a usable TrueType font")]
    InvalidFont(PathBuf),

    #[error("can't encode PNG: {0}")]
    Encoding(#[from] png::EncodingError),
}

/// An RGBA image, stored row by row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<[u8; 4]>,
}

impl Canvas {
    fn filled(width: u32, height: u32, color: [u8; 4]) -> Canvas {
        Canvas { width, height, pixels: vec![color; width as usize * height as usize] }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.pixels[self.index(x, y)]
    }

    fn index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn fill_rect(&mut self, x0: u32, y0: u32, x1: u32, y1: u32, color: [u8; 4]) {
        for y in y0..y1.min(self.height) {
            for x in x0..x1.min(self.width) {
                let index = self.index(x, y);
                self.pixels[index] = color;
            }
        }
    }

    /// Darken a pixel by `coverage` (0 leaves it alone, 1 makes it black).
    fn darken(&mut self, x: u32, y: u32, coverage: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let index = self.index(x, y);
        let keep = 1.0 - coverage.clamp(0.0, 1.0);
        for channel in &mut self.pixels[index][..3] {
            *channel = (*channel as f32 * keep).round() as u8;
        }
    }
}

pub fn load_font(path: &Path) -> Result<Font<'static>, ImageError> {
    let data = fs::read(path)
        .map_err(|source| ImageError::FontUnreadable { path: path.to_path_buf(), source })?;
    Font::try_from_vec(data).ok_or_else(|| ImageError::InvalidFont(path.to_path_buf()))
}

/// Draw the grid: black background, a white square for every open cell, and the assigned
/// letters centered in their cells. Without a font only the squares are drawn.
pub fn render_image(
    crossword: &Crossword,
    assignment: &Assignment,
    font: Option<&Font<'_>>,
) -> Canvas {
    let mut canvas = Canvas::filled(
        crossword.width() as u32 * CELL_SIZE,
        crossword.height() as u32 * CELL_SIZE,
        BLACK,
    );
    let open = open_cells(crossword);
    let letters = letter_grid(crossword, assignment);

    for (row, row_letters) in letters.iter().enumerate() {
        for (col, letter) in row_letters.iter().enumerate() {
            if !open.contains(&(row, col)) {
                continue;
            }
            let left = col as u32 * CELL_SIZE + CELL_BORDER;
            let top = row as u32 * CELL_SIZE + CELL_BORDER;
            let interior = CELL_SIZE - 2 * CELL_BORDER;
            canvas.fill_rect(left, top, left + interior, top + interior, WHITE);

            if let (Some(glyph), Some(font)) = (letter, font) {
                draw_letter(&mut canvas, font, *glyph, left, top, interior);
            }
        }
    }

    canvas
}

fn draw_letter(canvas: &mut Canvas, font: &Font<'_>, letter: char, left: u32, top: u32, size: u32) {
    let glyph =
        font.glyph(letter).scaled(Scale::uniform(FONT_SIZE)).positioned(point(0.0, 0.0));
    let Some(bounds) = glyph.pixel_bounding_box() else {
        return;
    };

    let x_offset = (size as i32 - bounds.width()) / 2;
    let y_offset = (size as i32 - bounds.height()) / 2;
    glyph.draw(|x, y, coverage| {
        let px = left as i32 + x_offset + x as i32;
        let py = top as i32 + y_offset + y as i32;
        if px >= 0 && py >= 0 {
            canvas.darken(px as u32, py as u32, coverage);
        }
    });
}

/// Encode the canvas as an 8-bit RGBA PNG.
pub fn write_png<W: Write>(canvas: &Canvas, writer: W) -> Result<(), ImageError> {
    let mut encoder = png::Encoder::new(writer, canvas.width, canvas.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);

    let data: Vec<u8> = canvas.pixels.iter().flatten().copied().collect();
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&data)?;
    writer.finish()?;

    Ok(())
}
