use crate::frame::{Frame, MAX_X};
use crate::glyph::{self, Direction, Expanded, Locator, Quantity};

/// Characters that may appear in a value run unless the caller narrows them.
pub const DEFAULT_ALLOWED: &[u8] = b"0123456789.-: ";

/// Result of locating and reading one value.
///
/// `value` is `None` only when the anchor was not found. A found anchor with nothing readable
/// next to it gives `Some("")`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extracted {
    pub value: Option<String>,
    /// Glyph that ended the run in reading order. For backward runs this is the tag itself.
    pub terminator: Option<u16>,
}

impl Extracted {
    fn is_non_empty(&self) -> bool {
        self.value.as_deref().is_some_and(|v| !v.is_empty())
    }
}

fn is_allowed(code: u16, allowed: &[u8]) -> bool {
    u8::try_from(code).is_ok_and(|b| allowed.contains(&b))
}

/// Read the run of `allowed` characters next to the first `tag` glyph in the frame.
///
/// The row holding the tag is walked away from it in `direction` until a character outside
/// `allowed` is hit. Frames using a split-digit glyph table have those glyphs expanded during
/// the walk. The result is returned in reading order with surrounding whitespace trimmed.
pub fn extract_value(frame: &Frame, tag: u16, direction: Direction, allowed: &[u8]) -> Extracted {
    let Some((col, row)) = frame.find(tag) else {
        return Extracted::default();
    };

    let mut line = frame.line(row);
    let start = match direction {
        Direction::Forward => col + 1,
        Direction::Backward => {
            line.reverse();
            MAX_X - col
        }
    };

    let split_digits = frame.glyphs.split_digits();
    let mut half_point = false;
    let mut text: Vec<u8> = Vec::new();
    let mut terminator = None;

    for &code in &line[start..] {
        let chars = if split_digits {
            glyph::expand_split_digit(code, direction, &mut half_point)
        } else {
            Expanded::one(code)
        };

        if chars.as_slice().iter().all(|&c| is_allowed(c, allowed)) {
            // allowed characters are single bytes
            text.extend(chars.as_slice().iter().map(|&c| c as u8));
        } else {
            terminator = Some(code);
            break;
        }
    }

    if direction == Direction::Backward {
        text.reverse();
        terminator = Some(tag);
    }

    let value: String = text.iter().map(|&b| b as char).collect();
    Extracted {
        value: Some(value.trim().to_string()),
        terminator,
    }
}

/// Find a power readout without a tag glyph: digits directly left of a plain `W` whose right
/// neighbour is blank or a space.
///
/// Candidates are visited in storage order and the first acceptable one wins. Cells beyond the
/// right edge count as blank; a `W` in the first column has no digit to its left and is skipped.
pub fn extract_power_heuristic(frame: &Frame) -> Extracted {
    for (col, row, code) in frame.cells() {
        if code != glyph::betaflight::WATT || col == 0 {
            continue;
        }
        if !glyph::is_digit(frame.cell(col - 1, row)) {
            continue;
        }
        let right = if col + 1 < MAX_X {
            frame.cell(col + 1, row)
        } else {
            glyph::BLANK
        };
        if right != glyph::BLANK && right != glyph::SPACE {
            continue;
        }

        let line = frame.line(row);
        let mut digits: Vec<char> = line[..col]
            .iter()
            .rev()
            .take_while(|&&c| glyph::is_digit(c))
            .map(|&c| c as u8 as char)
            .collect();
        digits.reverse();

        return Extracted {
            value: Some(digits.into_iter().collect()),
            terminator: Some(glyph::betaflight::WATT),
        };
    }

    Extracted::default()
}

impl Frame {
    /// Extract one quantity using this frame's glyph table.
    ///
    /// Where the table lists several alternative tags they are tried in order and the first one
    /// yielding a non-empty value wins; if none does, the quantity is absent.
    pub fn extract(&self, quantity: Quantity) -> Extracted {
        match self.glyphs.locator(quantity) {
            Locator::PowerHeuristic => extract_power_heuristic(self),
            Locator::Tags { tags: [tag], direction } => {
                extract_value(self, *tag, direction, DEFAULT_ALLOWED)
            }
            Locator::Tags { tags, direction } => tags
                .iter()
                .map(|&tag| extract_value(self, tag, direction, DEFAULT_ALLOWED))
                .find(Extracted::is_non_empty)
                .unwrap_or_default(),
        }
    }

    pub fn latitude(&self) -> Extracted {
        self.extract(Quantity::Latitude)
    }

    pub fn longitude(&self) -> Extracted {
        self.extract(Quantity::Longitude)
    }

    pub fn altitude(&self) -> Extracted {
        self.extract(Quantity::Altitude)
    }

    pub fn speed(&self) -> Extracted {
        self.extract(Quantity::Speed)
    }

    pub fn power(&self) -> Extracted {
        self.extract(Quantity::Power)
    }
}
