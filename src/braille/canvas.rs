use crate::map::Rgb;

/// One terminal cell: a 2x4 braille dot pattern plus optional colors
#[derive(Clone, Copy, Default, PartialEq, Eq, Debug)]
pub struct Cell {
    pub bits: u8,
    /// Color of the braille dots (outlines)
    pub fg: Option<Rgb>,
    /// Cell background (region fill)
    pub bg: Option<Rgb>,
}

impl Cell {
    pub fn glyph(&self) -> char {
        char::from_u32(0x2800 + self.bits as u32).unwrap_or(' ')
    }
}

/// Braille Unicode canvas with per-cell colors.
/// Each character cell represents a 2x4 pixel grid (8 dots).
/// Unicode Braille patterns: U+2800 to U+28FF
pub struct BrailleCanvas {
    width: usize,  // Characters
    height: usize, // Characters
    cells: Vec<Cell>,
    /// Color applied to dots set by `set_pixel`
    pen: Rgb,
}

impl BrailleCanvas {
    /// Create a new canvas with the given character dimensions.
    /// Effective pixel resolution: width*2 x height*4
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![Cell::default(); width * height],
            pen: Rgb::BLACK,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn set_pen(&mut self, color: Rgb) {
        self.pen = color;
    }

    /// Set a pixel at the given coordinates.
    /// Braille dot layout per character:
    /// ```text
    /// (0,0) (1,0)   bits: 0x01 0x08
    /// (0,1) (1,1)   bits: 0x02 0x10
    /// (0,2) (1,2)   bits: 0x04 0x20
    /// (0,3) (1,3)   bits: 0x40 0x80
    /// ```
    pub fn set_pixel(&mut self, x: usize, y: usize) {
        let cx = x / 2;
        let cy = y / 4;

        if cx >= self.width || cy >= self.height {
            return;
        }

        let bit = match (x % 2, y % 4) {
            (0, 0) => 0x01,
            (1, 0) => 0x08,
            (0, 1) => 0x02,
            (1, 1) => 0x10,
            (0, 2) => 0x04,
            (1, 2) => 0x20,
            (0, 3) => 0x40,
            (1, 3) => 0x80,
            _ => 0,
        };

        let cell = &mut self.cells[cy * self.width + cx];
        cell.bits |= bit;
        cell.fg = Some(self.pen);
    }

    /// Set a pixel using signed coordinates (ignores negative values)
    pub fn set_pixel_signed(&mut self, x: i32, y: i32) {
        if x >= 0 && y >= 0 {
            self.set_pixel(x as usize, y as usize);
        }
    }

    /// Paint the background of a character cell
    pub fn fill_cell(&mut self, cx: usize, cy: usize, color: Rgb) {
        if cx < self.width && cy < self.height {
            self.cells[cy * self.width + cx].bg = Some(color);
        }
    }

    pub fn cell(&self, cx: usize, cy: usize) -> Option<&Cell> {
        if cx < self.width && cy < self.height {
            Some(&self.cells[cy * self.width + cx])
        } else {
            None
        }
    }

    /// Iterate rows of cells, top to bottom
    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> + '_ {
        self.cells.chunks(self.width.max(1)).take(self.height)
    }

    /// Convert the dot pattern to a string of Braille characters
    #[cfg(test)]
    pub fn to_string(&self) -> String {
        self.rows()
            .map(|row| row.iter().map(Cell::glyph).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}
