use crate::error::{OsdError, Result};
use crate::glyph::GlyphTable;

/// Magic bytes at the start of every `.osd` file.
pub const OSD_MAGIC: [u8; 7] = *b"MSPOSD\0";

/// The only file format version understood by this parser.
pub const OSD_VERSION: u16 = 1;

/// Size of the packed global file header in bytes.
pub const HEADER_SIZE: usize = 18;

/// Flight controller firmware the recorder was configured for, from the last header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub enum FontVariant {
    Generic,
    Betaflight,
    Inav,
    Ardupilot,
    KissUltra,
    Quicksilver,
}

impl FontVariant {
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(FontVariant::Generic),
            1 => Some(FontVariant::Betaflight),
            2 => Some(FontVariant::Inav),
            3 => Some(FontVariant::Ardupilot),
            4 => Some(FontVariant::KissUltra),
            5 => Some(FontVariant::Quicksilver),
            _ => None,
        }
    }

    pub fn id(self) -> u8 {
        match self {
            FontVariant::Generic => 0,
            FontVariant::Betaflight => 1,
            FontVariant::Inav => 2,
            FontVariant::Ardupilot => 3,
            FontVariant::KissUltra => 4,
            FontVariant::Quicksilver => 5,
        }
    }

    /// Glyph table used to extract telemetry, if this firmware has one.
    pub fn glyph_table(self) -> Option<GlyphTable> {
        match self {
            FontVariant::Betaflight => Some(GlyphTable::Betaflight),
            FontVariant::Inav => Some(GlyphTable::Inav),
            _ => None,
        }
    }
}

/// Parsed global file header.
///
/// Layout (little-endian, packed):
///
/// | offset | size | field          |
/// |--------|------|----------------|
/// | 0      | 7    | magic          |
/// | 7      | 2    | version        |
/// | 9      | 1    | char_width     |
/// | 10     | 1    | char_height    |
/// | 11     | 1    | font_width     |
/// | 12     | 1    | font_height    |
/// | 13     | 2    | x_offset       |
/// | 15     | 2    | y_offset       |
/// | 17     | 1    | font_variant   |
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FileHeader {
    pub version: u16,
    /// Character cell size in pixels.
    pub char_width: u8,
    pub char_height: u8,
    /// Font glyph size in pixels.
    pub font_width: u8,
    pub font_height: u8,
    /// Pixel offset of the grid on the video frame.
    pub x_offset: u16,
    pub y_offset: u16,
    pub font_variant: FontVariant,
}

impl FileHeader {
    /// Parse and validate the header. Magic, version and font variant must all be recognised.
    ///
    /// Only the variant id is checked here; whether it has a glyph table is decided by the reader.
    pub fn parse(buf: &[u8]) -> Result<Self> {
        if buf.len() < HEADER_SIZE {
            return Err(OsdError::TruncatedHeader {
                expected: HEADER_SIZE,
                got: buf.len(),
            });
        }

        let mut magic = [0u8; 7];
        magic.copy_from_slice(&buf[0..7]);
        if magic != OSD_MAGIC {
            return Err(OsdError::BadMagic {
                expected: OSD_MAGIC,
                got: magic,
            });
        }

        let version = u16::from_le_bytes([buf[7], buf[8]]);
        if version != OSD_VERSION {
            return Err(OsdError::UnsupportedVersion {
                expected: OSD_VERSION,
                got: version,
            });
        }

        let font_variant =
            FontVariant::from_id(buf[17]).ok_or(OsdError::UnknownFontVariant(buf[17]))?;

        Ok(FileHeader {
            version,
            char_width: buf[9],
            char_height: buf[10],
            font_width: buf[11],
            font_height: buf[12],
            x_offset: u16::from_le_bytes([buf[13], buf[14]]),
            y_offset: u16::from_le_bytes([buf[15], buf[16]]),
            font_variant,
        })
    }

    /// A header for the given variant with the cell geometry DJI goggles write.
    pub fn new(font_variant: FontVariant) -> Self {
        FileHeader {
            version: OSD_VERSION,
            char_width: 60,
            char_height: 22,
            font_width: 24,
            font_height: 36,
            x_offset: 0,
            y_offset: 0,
            font_variant,
        }
    }

    /// Encode the header in its on-disk layout.
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0u8; HEADER_SIZE];
        buf[0..7].copy_from_slice(&OSD_MAGIC);
        buf[7..9].copy_from_slice(&self.version.to_le_bytes());
        buf[9] = self.char_width;
        buf[10] = self.char_height;
        buf[11] = self.font_width;
        buf[12] = self.font_height;
        buf[13..15].copy_from_slice(&self.x_offset.to_le_bytes());
        buf[15..17].copy_from_slice(&self.y_offset.to_le_bytes());
        buf[17] = self.font_variant.id();
        buf
    }
}
