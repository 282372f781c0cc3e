use std::io::{Read, Seek};
use std::path::Path;

use clap::Parser;
use osd::frame::Frame;
use osd::header::FileHeader;
use osd::reader::OsdReader;
use osd::track::Sample;

#[derive(Parser)]
#[command(name = "osd-info", about = "Display OSD frames and the telemetry extracted from them")]
struct Args {
    /// Input .osd file
    #[arg(short = 'f', long = "file")]
    file: Option<String>,

    /// Input .osd file (positional)
    #[arg(conflicts_with = "file", required_unless_present_any = ["file", "schema", "version"])]
    input: Option<String>,

    /// Only show the frame at this position in the file
    #[arg(long = "frame")]
    frame: Option<u64>,

    /// Render grids as hex cells instead of text
    #[arg(long, conflicts_with = "telemetry")]
    hex: bool,

    /// Print one row of extracted values per frame instead of grids
    #[arg(long)]
    telemetry: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Print JSON schema for the output format and exit
    #[arg(long)]
    schema: bool,

    /// Display version and quit
    #[arg(long)]
    version: bool,
}

/// JSON output: the file header plus each selected frame with its extracted values.
#[derive(serde::Serialize, schemars::JsonSchema)]
struct OsdDump {
    header: FileHeader,
    frames: Vec<FrameDump>,
}

#[derive(serde::Serialize, schemars::JsonSchema)]
struct FrameDump {
    frame: Frame,
    telemetry: Sample,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Reset SIGPIPE to default so piped output (e.g. head/tail) exits cleanly
    #[cfg(unix)]
    unsafe {
        libc::signal(libc::SIGPIPE, libc::SIG_DFL);
    }

    let args = Args::parse();

    if args.version {
        osd::version::print_cli_version_banner(
            "OSD Info Tool",
            env!("CARGO_PKG_VERSION"),
            env!("RELEASE_VERSION"),
            env!("GIT_COMMIT"),
        );
        return Ok(());
    }

    if args.schema {
        let schema = schemars::schema_for!(OsdDump);
        println!("{}", serde_json::to_string_pretty(&schema)?);
        return Ok(());
    }

    let file = args
        .file
        .as_deref()
        .or(args.input.as_deref())
        .ok_or("file argument required")?;
    let mut reader = OsdReader::new(osd::reader::open_osd(Path::new(file))?)?;
    let frames = select_frames(&mut reader, args.frame)?;

    if args.json {
        let dump = OsdDump {
            header: *reader.header(),
            frames: frames
                .into_iter()
                .map(|frame| FrameDump {
                    telemetry: Sample::from_frame(&frame),
                    frame,
                })
                .collect(),
        };
        println!("{}", serde_json::to_string(&dump)?);
        return Ok(());
    }

    let frame_count = reader.frame_count()?;
    print_header(reader.header(), frame_count);

    if args.telemetry {
        print_telemetry(&frames);
        return Ok(());
    }

    for (n, frame) in frames.iter().enumerate() {
        let position = args.frame.unwrap_or(n as u64);
        println!("----------- FRAME {} (idx {}) -----------", position, frame.frame_idx);
        if args.hex {
            print!("{}", frame.hex_dump());
        } else {
            print!("{}", frame);
        }
    }

    Ok(())
}

/// Either the single requested frame or every frame in file order.
fn select_frames<R: Read + Seek>(
    reader: &mut OsdReader<R>,
    only: Option<u64>,
) -> Result<Vec<Frame>, Box<dyn std::error::Error>> {
    match only {
        Some(index) => match reader.get(index)? {
            Some(frame) => Ok(vec![frame]),
            None => Err(format!(
                "frame {} out of range: file has {} frames",
                index,
                reader.frame_count()?
            )
            .into()),
        },
        None => Ok(reader.by_ref().collect::<osd::error::Result<Vec<_>>>()?),
    }
}

fn print_header(header: &FileHeader, frame_count: u64) {
    println!("Font variant:  {:?}", header.font_variant);
    println!("Version:       {}", header.version);
    println!("Cell size:     {}x{}", header.char_width, header.char_height);
    println!("Font size:     {}x{}", header.font_width, header.font_height);
    println!("Grid offset:   ({}, {})", header.x_offset, header.y_offset);
    println!("Frames:        {}", frame_count);
}

fn print_telemetry(frames: &[Frame]) {
    println!(
        "{:>8} {:>12} {:>12} {:>8} {:>6} {:>6}",
        "IDX", "LAT", "LON", "ALT", "SPD", "PWR"
    );
    for frame in frames {
        let s = Sample::from_frame(frame);
        let show = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".to_string());
        println!(
            "{:>8} {:>12} {:>12} {:>8} {:>6} {:>6}",
            s.frame_idx,
            show(&s.latitude),
            show(&s.longitude),
            show(&s.altitude),
            show(&s.speed),
            show(&s.power),
        );
    }
}
