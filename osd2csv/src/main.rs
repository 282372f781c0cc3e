mod csv_out;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use clap::Parser;

use osd::track::{DEFAULT_FPS, OnError, Track, TrackOptions};

/// Parse GPS data from an .osd (MSPOSD) recording made by DJI goggles.
#[derive(Parser, Debug)]
#[command(name = "osd2csv")]
struct Args {
    /// Output .csv file
    #[arg(short = 'o', long = "output", value_name = "CSVFILE", default_value = "output.csv")]
    output: PathBuf,

    /// Force overwrite output file if exists
    #[arg(short = 'f', long = "force")]
    force: bool,

    /// What to do with a value missing from a frame: prev, empty or skip
    #[arg(long = "on-error", default_value_t = OnError::Prev)]
    on_error: OnError,

    /// Video frame rate used to compute timestamps
    #[arg(long = "fps", default_value_t = DEFAULT_FPS)]
    fps: u32,

    /// Display version and quit
    #[arg(long)]
    version: bool,

    /// Input .osd or .osd.gz file
    #[arg(value_name = "OSDFILE", required_unless_present = "version")]
    input: Option<PathBuf>,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    if let Err(e) = run(&args) {
        log::error!("{e}");
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.version {
        osd::version::print_cli_version_banner(
            "OSD to CSV Tool",
            env!("CARGO_PKG_VERSION"),
            env!("RELEASE_VERSION"),
            env!("GIT_COMMIT"),
        );
        return Ok(());
    }

    let input = args
        .input
        .as_ref()
        .ok_or("OSDFILE is required unless --version is specified")?;
    convert(input, args)
}

fn convert(input: &Path, args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    if args.output.exists() && !args.force {
        return Err(format!(
            "File \"{}\" already exists, use -f to overwrite",
            args.output.display()
        )
        .into());
    }

    log::info!("Reading {}", input.display());
    let options = TrackOptions {
        on_error: args.on_error,
        fps: args.fps,
    };
    let track = Track::from_path(input, options)
        .map_err(|e| format!("Error reading '{}': {}", input.display(), e))?;
    log::info!("Extracted {} track points", track.points.len());

    write_output(&args.output, |out| csv_out::write_track(out, &track))?;

    log::info!("File \"{}\" written.", args.output.display());
    Ok(())
}

/// Write `path` through a `.part` sibling that is renamed into place once `write` succeeds.
/// On failure the sibling is removed and `path` is left untouched.
fn write_output<F, E>(path: &Path, write: F) -> Result<(), Box<dyn std::error::Error>>
where
    F: FnOnce(BufWriter<File>) -> Result<(), E>,
    E: Into<Box<dyn std::error::Error>>,
{
    let mut part = path.as_os_str().to_owned();
    part.push(".part");
    let part = PathBuf::from(part);

    let file = File::create(&part)
        .map_err(|e| format!("Creating '{}': {}", part.display(), e))?;
    let written: Result<(), Box<dyn std::error::Error>> = write(BufWriter::new(file))
        .map_err(Into::into)
        .and_then(|()| {
            std::fs::rename(&part, path).map_err(|e| {
                format!("Renaming to '{}': {}", path.display(), e).into()
            })
        });
    if written.is_err() {
        let _ = std::fs::remove_file(&part);
    }
    written
}
