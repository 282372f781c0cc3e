use std::fmt::{self, Write as _};

use crate::glyph::{self, GlyphTable};

/// Grid columns.
pub const MAX_X: usize = 60;
/// Grid rows.
pub const MAX_Y: usize = 22;
/// Cells per frame.
pub const MAX_T: usize = MAX_X * MAX_Y;

/// Size of the per-frame header (`frame_idx: u32`, `size: u32`).
pub const FRAME_HEADER_SIZE: usize = 8;
/// Size of one frame block on disk.
pub const FRAME_BLOCK_SIZE: usize = FRAME_HEADER_SIZE + MAX_T * 2;

/// Index of a cell in the flat grid. The recorder stores columns contiguously.
pub fn grid_index(col: usize, row: usize) -> usize {
    assert!(
        col < MAX_X && row < MAX_Y,
        "cell ({col}, {row}) outside {MAX_X}x{MAX_Y} grid"
    );
    col * MAX_Y + row
}

/// One decoded OSD snapshot.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Frame {
    /// Video frame number this snapshot was captured at. Increasing, not necessarily contiguous.
    pub frame_idx: u32,
    /// Payload size declared by the recorder. Informational only.
    pub size: u32,
    /// Glyph table used for extraction.
    pub glyphs: GlyphTable,
    /// `MAX_T` glyph codes in column-major order.
    grid: Vec<u16>,
}

impl Frame {
    /// Decode a frame block. Returns `None` if the block is short, which marks the end of the stream.
    pub fn decode(data: &[u8], glyphs: GlyphTable) -> Option<Frame> {
        if data.len() < FRAME_BLOCK_SIZE {
            return None;
        }

        let frame_idx = u32::from_le_bytes([data[0], data[1], data[2], data[3]]);
        let size = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        let grid = data[FRAME_HEADER_SIZE..FRAME_BLOCK_SIZE]
            .chunks_exact(2)
            .map(|w| u16::from_le_bytes([w[0], w[1]]))
            .collect();

        Some(Frame {
            frame_idx,
            size,
            glyphs,
            grid,
        })
    }

    /// Build a frame from a column-major grid of exactly `MAX_T` codes.
    pub fn from_grid(frame_idx: u32, grid: Vec<u16>, glyphs: GlyphTable) -> Frame {
        assert_eq!(grid.len(), MAX_T, "grid must hold {MAX_T} cells");
        Frame {
            frame_idx,
            size: (MAX_T * 2) as u32,
            glyphs,
            grid,
        }
    }

    /// Encode the frame in its on-disk layout.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(FRAME_BLOCK_SIZE);
        buf.extend_from_slice(&self.frame_idx.to_le_bytes());
        buf.extend_from_slice(&self.size.to_le_bytes());
        for code in &self.grid {
            buf.extend_from_slice(&code.to_le_bytes());
        }
        buf
    }

    pub fn cell(&self, col: usize, row: usize) -> u16 {
        self.grid[grid_index(col, row)]
    }

    /// All cells of one row, left to right.
    pub fn line(&self, row: usize) -> [u16; MAX_X] {
        assert!(row < MAX_Y, "row {row} outside grid");
        std::array::from_fn(|col| self.grid[col * MAX_Y + row])
    }

    /// First cell holding `code`, scanning column by column. Returns `(col, row)`.
    pub fn find(&self, code: u16) -> Option<(usize, usize)> {
        self.grid
            .iter()
            .position(|&c| c == code)
            .map(|idx| (idx / MAX_Y, idx % MAX_Y))
    }

    /// Cells in storage order as `(col, row, code)`.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, u16)> + '_ {
        self.grid
            .iter()
            .enumerate()
            .map(|(idx, &code)| (idx / MAX_Y, idx % MAX_Y, code))
    }

    /// Raw grid in storage order.
    pub fn grid(&self) -> &[u16] {
        &self.grid
    }

    /// One row rendered as text, see [`code_to_char`].
    pub fn sline(&self, row: usize) -> String {
        self.line(row).iter().map(|&c| code_to_char(c)).collect()
    }

    /// Grid rendered with one cell per `XX|` column: blank, printable character or hex code.
    pub fn hex_dump(&self) -> String {
        let mut out = String::with_capacity(MAX_Y * (MAX_X * 3 + 1));
        for row in 0..MAX_Y {
            for code in self.line(row) {
                if code == glyph::BLANK {
                    out.push_str("  |");
                } else if glyph::is_printable(code) {
                    out.push(code as u8 as char);
                    out.push_str(" |");
                } else {
                    let _ = write!(out, "{:02X}|", code);
                }
            }
            out.push('\n');
        }
        out
    }
}

/// Render a glyph as a single character: `~` for blank, ASCII as itself, `u` for icons.
pub fn code_to_char(code: u16) -> char {
    if code == glyph::BLANK {
        '~'
    } else if glyph::is_printable(code) {
        code as u8 as char
    } else {
        'u'
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in 0..MAX_Y {
            writeln!(f, "{}", self.sline(row))?;
        }
        Ok(())
    }
}
