use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use flate2::read::GzDecoder;

use crate::error::{OsdError, Result};
use crate::frame::{FRAME_BLOCK_SIZE, Frame};
use crate::glyph::GlyphTable;
use crate::header::{FileHeader, HEADER_SIZE};

/// A reader that transparently handles both plain `.osd` and gzip-compressed `.osd.gz` files.
pub enum OsdSource {
    File(BufReader<File>),
    Memory(Cursor<Vec<u8>>),
}

impl Read for OsdSource {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        match self {
            OsdSource::File(r) => r.read(buf),
            OsdSource::Memory(r) => r.read(buf),
        }
    }
}

impl Seek for OsdSource {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        match self {
            OsdSource::File(r) => r.seek(pos),
            OsdSource::Memory(r) => r.seek(pos),
        }
    }
}

/// Open a `.osd` or `.osd.gz` file and return a seekable source.
///
/// Gzip-compressed files are fully decompressed into memory. Recordings are a few MB per
/// minute of flight so this stays cheap.
pub fn open_osd(path: &Path) -> std::io::Result<OsdSource> {
    let is_gz = path
        .to_str()
        .map(|s| s.ends_with(".gz"))
        .unwrap_or(false);

    let file = File::open(path)?;
    if is_gz {
        let mut decoder = GzDecoder::new(file);
        let mut buf = Vec::new();
        decoder.read_to_end(&mut buf)?;
        Ok(OsdSource::Memory(Cursor::new(buf)))
    } else {
        Ok(OsdSource::File(BufReader::new(file)))
    }
}

/// Byte offset of frame `index`, or `None` if it does not fit in a `u64`.
pub fn frame_offset(index: u64) -> Option<u64> {
    index
        .checked_mul(FRAME_BLOCK_SIZE as u64)?
        .checked_add(HEADER_SIZE as u64)
}

/// Read until `buf` is full or the stream ends, returning the number of bytes read.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

/// Frame stream over an `.osd` recording.
///
/// Construction validates the header, so an `OsdReader` always has a usable glyph table.
/// Frames can be fetched by index in any order with [`OsdReader::get`]; sequential reads through
/// [`OsdReader::next_frame`] (or the `Iterator` impl) keep their own cursor, which random access
/// does not disturb. The cursor is exhausted by the first short read and stays exhausted until
/// [`OsdReader::rewind`].
pub struct OsdReader<R> {
    inner: R,
    header: FileHeader,
    glyphs: GlyphTable,
    cursor: u64,
    exhausted: bool,
}

impl<R: Read + Seek> OsdReader<R> {
    pub fn new(mut inner: R) -> Result<Self> {
        inner.seek(SeekFrom::Start(0))?;
        let mut buf = [0u8; HEADER_SIZE];
        let got = read_full(&mut inner, &mut buf)?;
        let header = FileHeader::parse(&buf[..got])?;
        let glyphs = header
            .font_variant
            .glyph_table()
            .ok_or(OsdError::UnsupportedFontVariant(header.font_variant))?;

        log::debug!(
            "OSD header: version {}, cell {}x{}, font {}x{}, offset ({}, {}), variant {:?}",
            header.version,
            header.char_width,
            header.char_height,
            header.font_width,
            header.font_height,
            header.x_offset,
            header.y_offset,
            header.font_variant
        );

        Ok(OsdReader {
            inner,
            header,
            glyphs,
            cursor: 0,
            exhausted: false,
        })
    }

    pub fn header(&self) -> &FileHeader {
        &self.header
    }

    pub fn glyphs(&self) -> GlyphTable {
        self.glyphs
    }

    /// Fetch frame `index`. Returns `Ok(None)` past the last complete frame.
    pub fn get(&mut self, index: u64) -> Result<Option<Frame>> {
        let len = self.inner.seek(SeekFrom::End(0))?;
        let offset = match frame_offset(index) {
            Some(offset) if offset < len => offset,
            _ => return Ok(None),
        };
        self.inner.seek(SeekFrom::Start(offset))?;
        let mut block = vec![0u8; FRAME_BLOCK_SIZE];
        let got = read_full(&mut self.inner, &mut block)?;
        Ok(Frame::decode(&block[..got], self.glyphs))
    }

    /// Next frame in file order, or `Ok(None)` once the stream is exhausted.
    pub fn next_frame(&mut self) -> Result<Option<Frame>> {
        if self.exhausted {
            return Ok(None);
        }
        match self.get(self.cursor)? {
            Some(frame) => {
                self.cursor += 1;
                Ok(Some(frame))
            }
            None => {
                self.exhausted = true;
                Ok(None)
            }
        }
    }

    /// Restart sequential reading from frame 0.
    pub fn rewind(&mut self) {
        self.cursor = 0;
        self.exhausted = false;
    }

    /// Number of complete frames in the stream. A trailing partial block is not counted.
    pub fn frame_count(&mut self) -> Result<u64> {
        let len = self.inner.seek(SeekFrom::End(0))?;
        Ok(len.saturating_sub(HEADER_SIZE as u64) / FRAME_BLOCK_SIZE as u64)
    }
}

impl<R: Read + Seek> Iterator for OsdReader<R> {
    type Item = Result<Frame>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{MAX_T, grid_index};
    use crate::header::FontVariant;

    fn recording(variant: FontVariant, frame_idxs: &[u32]) -> Vec<u8> {
        let glyphs = variant.glyph_table().unwrap_or(GlyphTable::Betaflight);
        let mut data = FileHeader::new(variant).to_bytes().to_vec();
        for &idx in frame_idxs {
            let mut grid = vec![0u16; MAX_T];
            grid[grid_index(0, 0)] = b'0' as u16 + (idx % 10) as u16;
            data.extend(Frame::from_grid(idx, grid, glyphs).to_bytes());
        }
        data
    }

    #[test]
    fn test_single_frame() {
        let data = recording(FontVariant::Betaflight, &[42]);
        assert_eq!(
            u32::from_le_bytes(data[HEADER_SIZE..HEADER_SIZE + 4].try_into().unwrap()),
            42
        );

        let mut reader = OsdReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.glyphs(), GlyphTable::Betaflight);
        assert_eq!(reader.get(0).unwrap().unwrap().frame_idx, 42);
        assert!(reader.get(1).unwrap().is_none());
    }

    #[test]
    fn test_random_access_any_order() {
        let data = recording(FontVariant::Inav, &[0, 3, 7, 8]);
        let mut reader = OsdReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.get(2).unwrap().unwrap().frame_idx, 7);
        assert_eq!(reader.get(0).unwrap().unwrap().frame_idx, 0);
        assert_eq!(reader.get(3).unwrap().unwrap().frame_idx, 8);
        assert_eq!(reader.get(1).unwrap().unwrap().frame_idx, 3);
        assert!(reader.get(100).unwrap().is_none());
        assert_eq!(reader.frame_count().unwrap(), 4);
    }

    #[test]
    fn test_sequential_iteration_and_exhaustion() {
        let data = recording(FontVariant::Betaflight, &[1, 2, 5]);
        let mut reader = OsdReader::new(Cursor::new(data)).unwrap();
        let idxs: Vec<u32> = reader
            .by_ref()
            .map(|f| f.unwrap().frame_idx)
            .collect();
        assert_eq!(idxs, vec![1, 2, 5]);
        assert!(reader.next_frame().unwrap().is_none());
        assert!(reader.next_frame().unwrap().is_none());

        // random access still works after the cursor is exhausted
        assert_eq!(reader.get(1).unwrap().unwrap().frame_idx, 2);
        assert!(reader.next_frame().unwrap().is_none());

        reader.rewind();
        assert_eq!(reader.next_frame().unwrap().unwrap().frame_idx, 1);
    }

    #[test]
    fn test_random_access_does_not_move_cursor() {
        let data = recording(FontVariant::Betaflight, &[10, 20, 30]);
        let mut reader = OsdReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.next_frame().unwrap().unwrap().frame_idx, 10);
        assert_eq!(reader.get(2).unwrap().unwrap().frame_idx, 30);
        assert_eq!(reader.next_frame().unwrap().unwrap().frame_idx, 20);
    }

    #[test]
    fn test_truncated_trailing_frame_ends_stream() {
        let mut data = recording(FontVariant::Betaflight, &[1, 2]);
        data.truncate(data.len() - 100);
        let mut reader = OsdReader::new(Cursor::new(data)).unwrap();
        assert_eq!(reader.frame_count().unwrap(), 1);
        let frames: Vec<_> = reader.collect::<Result<Vec<_>>>().unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_header_only_file_has_no_frames() {
        let data = recording(FontVariant::Inav, &[]);
        let mut reader = OsdReader::new(Cursor::new(data)).unwrap();
        assert!(reader.next().is_none());
        assert_eq!(reader.frame_count().unwrap(), 0);
    }

    #[test]
    fn test_unsupported_variants_rejected() {
        for variant in [
            FontVariant::Generic,
            FontVariant::Ardupilot,
            FontVariant::KissUltra,
            FontVariant::Quicksilver,
        ] {
            let data = recording(variant, &[0]);
            match OsdReader::new(Cursor::new(data)) {
                Err(OsdError::UnsupportedFontVariant(v)) => assert_eq!(v, variant),
                Err(e) => panic!("unexpected error {e}"),
                Ok(_) => panic!("variant {:?} should be rejected", variant),
            }
        }
    }

    #[test]
    fn test_bad_magic_rejected_before_frames() {
        let mut data = recording(FontVariant::Betaflight, &[0]);
        data[..7].copy_from_slice(b"NOTOSD\0");
        assert!(matches!(
            OsdReader::new(Cursor::new(data)),
            Err(OsdError::BadMagic { .. })
        ));
    }

    #[test]
    fn test_empty_file_rejected() {
        assert!(matches!(
            OsdReader::new(Cursor::new(Vec::new())),
            Err(OsdError::TruncatedHeader { got: 0, .. })
        ));
    }

    #[test]
    fn test_frame_offsets() {
        assert_eq!(frame_offset(0), Some(18));
        assert_eq!(frame_offset(3), Some(18 + 3 * 2648));
        assert_eq!(frame_offset(u64::MAX), None);
        assert_eq!(frame_offset(u64::MAX / FRAME_BLOCK_SIZE as u64), None);
    }

    #[test]
    fn test_huge_index_is_end_of_stream() {
        let data = recording(FontVariant::Betaflight, &[5]);
        let mut reader = OsdReader::new(Cursor::new(data.clone())).unwrap();
        assert!(reader.get(u64::MAX).unwrap().is_none());
        assert!(reader.get(u64::MAX / 1000).unwrap().is_none());
        assert!(reader.get(u64::MAX / 4000).unwrap().is_none());
        assert_eq!(reader.get(0).unwrap().unwrap().frame_idx, 5);

        let path = std::env::temp_dir()
            .join(format!("osd-reader-{}-huge.osd", std::process::id()));
        std::fs::write(&path, data).unwrap();
        let mut reader = OsdReader::new(open_osd(&path).unwrap()).unwrap();
        let results = [
            reader.get(u64::MAX).map(|f| f.is_none()),
            reader.get(u64::MAX / 4000).map(|f| f.is_none()),
            reader.get(1).map(|f| f.is_none()),
        ];
        let first = reader.get(0).map(|f| f.map(|f| f.frame_idx));
        std::fs::remove_file(&path).unwrap();

        for r in results {
            assert!(r.unwrap());
        }
        assert_eq!(first.unwrap(), Some(5));
    }
}
