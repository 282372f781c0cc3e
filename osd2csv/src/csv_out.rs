use std::io::Write;

use osd::track::{COLUMNS, Track};

/// Write a track as CSV: a header row, then one row per point.
pub fn write_track<W: Write>(writer: W, track: &Track) -> Result<(), csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(writer);

    wtr.write_record(COLUMNS)?;
    for point in &track.points {
        wtr.write_record(point.record())?;
    }
    wtr.flush()?;
    Ok(())
}
