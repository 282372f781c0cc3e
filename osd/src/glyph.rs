/// Betaflight OSD font symbols.
pub mod betaflight {
    pub const SPEED: u16 = 0x70;
    pub const ALTITUDE: u16 = 0x7F;
    pub const LATITUDE: u16 = 0x89;
    pub const LONGITUDE: u16 = 0x98;
    /// Plain ASCII 'W' trailing the power readout (Betaflight has no watt icon).
    pub const WATT: u16 = b'W' as u16;
}

/// iNav OSD font symbols, see `src/main/drivers/osd_symbols.h` in the iNav tree.
pub mod inav {
    pub const LATITUDE: u16 = 0x03;
    pub const LONGITUDE: u16 = 0x04;
    pub const WATT: u16 = 0x71;
    pub const ALTITUDE_M: u16 = 0x76;
    pub const SPEED_KMPH: u16 = 0x90;
    pub const SPEED_MPH: u16 = 0x91;
    pub const SPEED_KT: u16 = 0x92;

    /// Digit followed by a decimal point, digits 0-9.
    pub const DIGIT_POINT_FIRST: u16 = 0xA1;
    pub const DIGIT_POINT_LAST: u16 = 0xAA;
    /// Decimal point followed by a digit, digits 0-9.
    pub const POINT_DIGIT_FIRST: u16 = 0xB1;
    pub const POINT_DIGIT_LAST: u16 = 0xBA;
}

pub const BLANK: u16 = 0x00;
pub const SPACE: u16 = b' ' as u16;

/// Printable ASCII glyphs are rendered by code; everything outside this range is an icon.
pub fn is_printable(code: u16) -> bool {
    (0x20..0x5F).contains(&code)
}

pub fn is_digit(code: u16) -> bool {
    (b'0' as u16..=b'9' as u16).contains(&code)
}

/// Telemetry quantities exported to the track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum Quantity {
    Latitude,
    Longitude,
    Altitude,
    Speed,
    Power,
}

impl Quantity {
    pub const ALL: [Quantity; 5] = [
        Quantity::Latitude,
        Quantity::Longitude,
        Quantity::Altitude,
        Quantity::Speed,
        Quantity::Power,
    ];
}

/// Which side of the tag glyph the value text sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Value text follows the tag.
    Forward,
    /// Value text precedes the tag.
    Backward,
}

/// How a quantity is found in the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    /// Anchored by a tag glyph. Alternative tags are tried in order, first non-empty value wins.
    Tags {
        tags: &'static [u16],
        direction: Direction,
    },
    /// Digits immediately left of a plain 'W' glyph.
    PowerHeuristic,
}

/// Per-firmware glyph table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum GlyphTable {
    Betaflight,
    Inav,
}

impl GlyphTable {
    pub fn locator(self, quantity: Quantity) -> Locator {
        use Direction::*;

        match (self, quantity) {
            (GlyphTable::Betaflight, Quantity::Latitude) => Locator::Tags {
                tags: &[betaflight::LATITUDE],
                direction: Forward,
            },
            (GlyphTable::Betaflight, Quantity::Longitude) => Locator::Tags {
                tags: &[betaflight::LONGITUDE],
                direction: Forward,
            },
            (GlyphTable::Betaflight, Quantity::Altitude) => Locator::Tags {
                tags: &[betaflight::ALTITUDE],
                direction: Forward,
            },
            (GlyphTable::Betaflight, Quantity::Speed) => Locator::Tags {
                tags: &[betaflight::SPEED],
                direction: Forward,
            },
            (GlyphTable::Betaflight, Quantity::Power) => Locator::PowerHeuristic,

            (GlyphTable::Inav, Quantity::Latitude) => Locator::Tags {
                tags: &[inav::LATITUDE],
                direction: Backward,
            },
            (GlyphTable::Inav, Quantity::Longitude) => Locator::Tags {
                tags: &[inav::LONGITUDE],
                direction: Backward,
            },
            (GlyphTable::Inav, Quantity::Altitude) => Locator::Tags {
                tags: &[inav::ALTITUDE_M],
                direction: Backward,
            },
            (GlyphTable::Inav, Quantity::Speed) => Locator::Tags {
                tags: &[inav::SPEED_KMPH, inav::SPEED_MPH, inav::SPEED_KT],
                direction: Backward,
            },
            (GlyphTable::Inav, Quantity::Power) => Locator::Tags {
                tags: &[inav::WATT],
                direction: Backward,
            },
        }
    }

    /// Whether values may contain split digit-with-point glyphs.
    pub fn split_digits(self) -> bool {
        matches!(self, GlyphTable::Inav)
    }
}

/// One glyph expanded into at most two characters, in walk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Expanded {
    buf: [u16; 2],
    len: usize,
}

impl Expanded {
    pub(crate) fn one(c: u16) -> Self {
        Expanded { buf: [c, 0], len: 1 }
    }

    fn two(a: u16, b: u16) -> Self {
        Expanded { buf: [a, b], len: 2 }
    }

    pub fn as_slice(&self) -> &[u16] {
        &self.buf[..self.len]
    }
}

const POINT: u16 = b'.' as u16;

fn ascii_digit(code: u16, first: u16) -> u16 {
    code - first + b'0' as u16
}

/// Expand a glyph that may be one half of an iNav split digit rendering.
///
/// `0xA1..=0xAA` render "d." and `0xB1..=0xBA` render ".d". When the two kinds are adjacent
/// they share one point; `half_point` records that a point has already been emitted and must
/// be carried between consecutive calls of the same walk. Output is in walk order, so a
/// backward walk gets its characters mirrored and reverses them afterwards.
pub fn expand_split_digit(code: u16, direction: Direction, half_point: &mut bool) -> Expanded {
    let digit_point = (inav::DIGIT_POINT_FIRST..=inav::DIGIT_POINT_LAST).contains(&code);
    let point_digit = (inav::POINT_DIGIT_FIRST..=inav::POINT_DIGIT_LAST).contains(&code);

    match direction {
        Direction::Forward if digit_point => {
            *half_point = true;
            Expanded::two(ascii_digit(code, inav::DIGIT_POINT_FIRST), POINT)
        }
        Direction::Forward if point_digit => {
            let d = ascii_digit(code, inav::POINT_DIGIT_FIRST);
            if *half_point {
                *half_point = false;
                Expanded::one(d)
            } else {
                Expanded::two(POINT, d)
            }
        }
        Direction::Backward if digit_point => {
            let d = ascii_digit(code, inav::DIGIT_POINT_FIRST);
            if *half_point {
                *half_point = false;
                Expanded::one(d)
            } else {
                Expanded::two(POINT, d)
            }
        }
        Direction::Backward if point_digit => {
            *half_point = true;
            Expanded::two(ascii_digit(code, inav::POINT_DIGIT_FIRST), POINT)
        }
        _ => {
            *half_point = false;
            Expanded::one(code)
        }
    }
}
