pub mod error;
pub mod extract;
pub mod frame;
pub mod glyph;
pub mod header;
pub mod reader;
pub mod track;
pub mod version;
