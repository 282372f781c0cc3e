use std::fmt;
use std::path::Path;
use std::str::FromStr;

use crate::error::{OsdError, Result};
use crate::frame::Frame;
use crate::reader::{OsdReader, open_osd};

pub const DEFAULT_FPS: u32 = 60;

/// CSV column order of a track.
pub const COLUMNS: [&str; 6] = [
    "latitude",
    "longitude",
    "altitude",
    "speed",
    "time_ms",
    "power",
];

/// What to do with a quantity missing from a frame that has at least one other quantity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnError {
    /// Drop the whole frame.
    Skip,
    /// Emit an empty string.
    Empty,
    /// Repeat the last emitted value for that quantity.
    #[default]
    Prev,
}

impl FromStr for OnError {
    type Err = OsdError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "skip" => Ok(OnError::Skip),
            "empty" => Ok(OnError::Empty),
            "prev" => Ok(OnError::Prev),
            other => Err(OsdError::InvalidPolicy(other.to_string())),
        }
    }
}

impl fmt::Display for OnError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OnError::Skip => "skip",
            OnError::Empty => "empty",
            OnError::Prev => "prev",
        })
    }
}

/// Track building options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOptions {
    pub on_error: OnError,
    /// Video frame rate, used to turn frame indices into timestamps.
    pub fps: u32,
}

impl Default for TrackOptions {
    fn default() -> Self {
        TrackOptions {
            on_error: OnError::Prev,
            fps: DEFAULT_FPS,
        }
    }
}

/// One decoded telemetry sample. Values are the on-screen strings in display units.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct TrackPoint {
    pub latitude: String,
    pub longitude: String,
    pub altitude: String,
    pub speed: String,
    /// Milliseconds since the start of the recording.
    pub time_ms: u64,
    pub power: String,
}

impl TrackPoint {
    /// Fields in [`COLUMNS`] order.
    pub fn record(&self) -> [String; 6] {
        [
            self.latitude.clone(),
            self.longitude.clone(),
            self.altitude.clone(),
            self.speed.clone(),
            self.time_ms.to_string(),
            self.power.clone(),
        ]
    }
}

/// Raw per-frame readings before the missing-value policy is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Sample {
    pub frame_idx: u32,
    pub latitude: Option<String>,
    pub longitude: Option<String>,
    pub altitude: Option<String>,
    pub speed: Option<String>,
    pub power: Option<String>,
}

impl Sample {
    pub fn from_frame(frame: &Frame) -> Self {
        Sample {
            frame_idx: frame.frame_idx,
            latitude: frame.latitude().value,
            longitude: frame.longitude().value,
            altitude: frame.altitude().value,
            speed: frame.speed().value,
            power: frame.power().value,
        }
    }

    fn values(&self) -> [&Option<String>; 5] {
        [
            &self.latitude,
            &self.longitude,
            &self.altitude,
            &self.speed,
            &self.power,
        ]
    }
}

/// Last emitted value per quantity, carried between frames under [`OnError::Prev`].
#[derive(Debug, Clone, Default)]
struct Previous {
    latitude: String,
    longitude: String,
    altitude: String,
    speed: String,
    power: String,
}

/// Absent and empty readings are both replaced.
fn or_prev(value: Option<String>, prev: &str) -> String {
    match value {
        Some(v) if !v.is_empty() => v,
        _ => prev.to_string(),
    }
}

/// Timestamp in milliseconds for a frame index, rounded down.
pub fn frame_time_ms(frame_idx: u32, fps: u32) -> u64 {
    frame_idx as u64 * 1000 / fps as u64
}

/// Ordered telemetry track extracted from a recording.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct Track {
    pub points: Vec<TrackPoint>,
}

impl Track {
    /// Build a track from per-frame samples, in the order given.
    pub fn from_samples<I>(samples: I, options: TrackOptions) -> Result<Track>
    where
        I: IntoIterator<Item = Sample>,
    {
        if options.fps == 0 {
            return Err(OsdError::InvalidFps);
        }

        let mut points = Vec::new();
        let mut prev = Previous::default();
        let mut seen = 0u64;
        let mut dropped = 0u64;

        for sample in samples {
            seen += 1;
            let values = sample.values();

            if values.iter().all(|v| v.is_none()) {
                log::trace!("frame {}: no telemetry, dropped", sample.frame_idx);
                dropped += 1;
                continue;
            }

            if options.on_error == OnError::Skip && values.iter().any(|v| v.is_none()) {
                log::trace!("frame {}: incomplete, skipped", sample.frame_idx);
                dropped += 1;
                continue;
            }

            let time_ms = frame_time_ms(sample.frame_idx, options.fps);
            let point = match options.on_error {
                OnError::Skip | OnError::Empty => TrackPoint {
                    latitude: sample.latitude.unwrap_or_default(),
                    longitude: sample.longitude.unwrap_or_default(),
                    altitude: sample.altitude.unwrap_or_default(),
                    speed: sample.speed.unwrap_or_default(),
                    time_ms,
                    power: sample.power.unwrap_or_default(),
                },
                OnError::Prev => {
                    let point = TrackPoint {
                        latitude: or_prev(sample.latitude, &prev.latitude),
                        longitude: or_prev(sample.longitude, &prev.longitude),
                        altitude: or_prev(sample.altitude, &prev.altitude),
                        speed: or_prev(sample.speed, &prev.speed),
                        time_ms,
                        power: or_prev(sample.power, &prev.power),
                    };
                    prev = Previous {
                        latitude: point.latitude.clone(),
                        longitude: point.longitude.clone(),
                        altitude: point.altitude.clone(),
                        speed: point.speed.clone(),
                        power: point.power.clone(),
                    };
                    point
                }
            };
            points.push(point);
        }

        log::debug!(
            "Track: {} frames read, {} points, {} frames dropped ({} policy)",
            seen,
            points.len(),
            dropped,
            options.on_error
        );

        Ok(Track { points })
    }

    /// Build a track from a stream of decoded frames.
    pub fn from_frames<I>(frames: I, options: TrackOptions) -> Result<Track>
    where
        I: IntoIterator<Item = Result<Frame>>,
    {
        let samples = frames
            .into_iter()
            .map(|frame| frame.map(|f| Sample::from_frame(&f)))
            .collect::<Result<Vec<_>>>()?;
        Track::from_samples(samples, options)
    }

    /// Open a `.osd` or `.osd.gz` recording and build its track.
    pub fn from_path(path: &Path, options: TrackOptions) -> Result<Track> {
        let reader = OsdReader::new(open_osd(path)?)?;
        Track::from_frames(reader, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(frame_idx: u32, values: [Option<&str>; 5]) -> Sample {
        let [latitude, longitude, altitude, speed, power] = values.map(|v| v.map(str::to_string));
        Sample {
            frame_idx,
            latitude,
            longitude,
            altitude,
            speed,
            power,
        }
    }

    fn build(samples: Vec<Sample>, on_error: OnError) -> Vec<TrackPoint> {
        Track::from_samples(samples, TrackOptions { on_error, fps: 60 })
            .unwrap()
            .points
    }

    #[test]
    fn test_all_absent_frame_dropped_under_every_policy() {
        for policy in [OnError::Skip, OnError::Empty, OnError::Prev] {
            let points = build(vec![sample(0, [None; 5])], policy);
            assert!(points.is_empty(), "{policy} kept an empty frame");
        }
    }

    #[test]
    fn test_skip_drops_incomplete_frames() {
        let samples = vec![
            sample(0, [Some("1"), Some("2"), Some("3"), Some("4"), None]),
            sample(1, [Some("1"), Some("2"), Some("3"), Some("4"), Some("5")]),
        ];
        let points = build(samples, OnError::Skip);
        assert_eq!(points.len(), 1);
        assert_eq!(points[0].power, "5");
        assert_eq!(points[0].time_ms, 16);
    }

    #[test]
    fn test_empty_fills_blanks() {
        let points = build(vec![sample(0, [None, None, Some("120"), None, None])], OnError::Empty);
        assert_eq!(
            points,
            vec![TrackPoint {
                altitude: "120".to_string(),
                ..Default::default()
            }]
        );
    }

    #[test]
    fn test_prev_carries_each_quantity_independently() {
        let samples = vec![
            sample(0, [Some("55.1"), None, Some("10"), None, Some("300")]),
            sample(60, [None, Some("37.6"), None, Some("40"), None]),
            sample(120, [None, None, Some("12"), None, None]),
        ];
        let points = build(samples, OnError::Prev);
        assert_eq!(points.len(), 3);

        assert_eq!(points[0].longitude, "");
        assert_eq!(points[0].speed, "");

        assert_eq!(points[1].latitude, "55.1");
        assert_eq!(points[1].longitude, "37.6");
        assert_eq!(points[1].altitude, "10");
        assert_eq!(points[1].power, "300");
        assert_eq!(points[1].time_ms, 1000);

        assert_eq!(points[2].latitude, "55.1");
        assert_eq!(points[2].longitude, "37.6");
        assert_eq!(points[2].altitude, "12");
        assert_eq!(points[2].speed, "40");
        assert_eq!(points[2].power, "300");
        assert_eq!(points[2].time_ms, 2000);
    }

    #[test]
    fn test_prev_replaces_empty_reading() {
        let samples = vec![
            sample(0, [None, None, Some("50"), None, None]),
            sample(1, [None, None, Some(""), Some("3"), None]),
        ];
        let points = build(samples, OnError::Prev);
        assert_eq!(points[1].altitude, "50");
    }

    #[test]
    fn test_order_and_duplicates_preserved() {
        let samples = vec![
            sample(5, [Some("a"), None, None, None, None]),
            sample(5, [Some("b"), None, None, None, None]),
            sample(2, [Some("c"), None, None, None, None]),
        ];
        let lats: Vec<String> = build(samples, OnError::Empty)
            .into_iter()
            .map(|p| p.latitude)
            .collect();
        assert_eq!(lats, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_timestamps_floor() {
        assert_eq!(frame_time_ms(0, 60), 0);
        assert_eq!(frame_time_ms(1, 60), 16);
        assert_eq!(frame_time_ms(59, 60), 983);
        assert_eq!(frame_time_ms(u32::MAX, 1), u32::MAX as u64 * 1000);
    }

    #[test]
    fn test_zero_fps_rejected() {
        let result = Track::from_samples(
            Vec::new(),
            TrackOptions {
                on_error: OnError::Prev,
                fps: 0,
            },
        );
        assert!(matches!(result, Err(OsdError::InvalidFps)));
    }

    #[test]
    fn test_policy_parsing() {
        assert_eq!("skip".parse::<OnError>().unwrap(), OnError::Skip);
        assert_eq!("empty".parse::<OnError>().unwrap(), OnError::Empty);
        assert_eq!("prev".parse::<OnError>().unwrap(), OnError::Prev);
        assert!(matches!(
            "last".parse::<OnError>(),
            Err(OsdError::InvalidPolicy(p)) if p == "last"
        ));
        assert_eq!(OnError::default(), OnError::Prev);
        assert_eq!(OnError::Skip.to_string(), "skip");
    }

    #[test]
    fn test_record_column_order() {
        let point = TrackPoint {
            latitude: "1".into(),
            longitude: "2".into(),
            altitude: "3".into(),
            speed: "4".into(),
            time_ms: 5,
            power: "6".into(),
        };
        assert_eq!(point.record(), ["1", "2", "3", "4", "5", "6"].map(String::from));
    }
}
