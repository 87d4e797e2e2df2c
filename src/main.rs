use std::str::FromStr;

use clap::{App, Arg, ArgMatches};
use log::{error, warn};

use mandelbench::{
    bench::{BenchConfig, Harness},
    colour::Palette,
    error::{BenchError, ConfigError},
    render::{Backend, TileSize},
    screen,
    surface::{NullSurface, WindowSurface},
};

/// Given a string and a separator, returns the two values
/// separated by the separator.
fn parse_pair<T: FromStr>(s: &str, separator: char) -> Option<(T, T)> {
    let index = s.find(separator)?;
    match (T::from_str(&s[..index]), T::from_str(&s[index + 1..])) {
        (Ok(l), Ok(r)) => Some((l, r)),
        _ => None,
    }
}

fn validate_pair<T: FromStr>(s: &str, separator: char, err: &str) -> Result<(), String> {
    match parse_pair::<T>(s, separator) {
        Some(_) => Ok(()),
        None => Err(err.to_string()),
    }
}

fn validate_number<T: FromStr>(s: &str, err: &str) -> Result<(), String> {
    T::from_str(s).map(|_| ()).map_err(|_| err.to_string())
}

const BACKEND: &str = "backend";
const FRAMES: &str = "frames";
const SIZE: &str = "size";
const CENTER: &str = "center";
const SPAN: &str = "span";
const DECAY: &str = "decay";
const ITERATIONS: &str = "iterations";
const TILE: &str = "tile";
const THREADS: &str = "threads";
const PALETTE: &str = "palette";
const HEADLESS: &str = "headless";

fn args<'a>() -> ArgMatches<'a> {
    App::new("mandelbench")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Mandelbrot zoom benchmark")
        .arg(
            Arg::with_name(BACKEND)
                .long(BACKEND)
                .short("b")
                .takes_value(true)
                .possible_values(&Backend::NAMES)
                .default_value("gpu")
                .help("Renderer to benchmark"),
        )
        .arg(
            Arg::with_name(FRAMES)
                .long(FRAMES)
                .short("n")
                .takes_value(true)
                .default_value("5000")
                .validator(|s| validate_number::<usize>(&s, "Could not parse frame count"))
                .help("Number of frames to render"),
        )
        .arg(
            Arg::with_name(SIZE)
                .long(SIZE)
                .short("s")
                .takes_value(true)
                .default_value("1280x720")
                .validator(|s| validate_pair::<u32>(&s, 'x', "Could not parse image size"))
                .help("Size of the frame in pixels"),
        )
        .arg(
            Arg::with_name(CENTER)
                .long(CENTER)
                .short("c")
                .takes_value(true)
                .allow_hyphen_values(true)
                .default_value("-0.727003,0.19996")
                .validator(|s| validate_pair::<f32>(&s, ',', "Could not parse zoom centre"))
                .help("Point of the complex plane to zoom into, as re,im"),
        )
        .arg(
            Arg::with_name(SPAN)
                .long(SPAN)
                .takes_value(true)
                .default_value("10.0")
                .validator(|s| validate_number::<f32>(&s, "Could not parse initial span"))
                .help("Width of the first frame in the complex plane"),
        )
        .arg(
            Arg::with_name(DECAY)
                .long(DECAY)
                .takes_value(true)
                .default_value("0.9975")
                .validator(|s| validate_number::<f32>(&s, "Could not parse decay factor"))
                .help("Factor the span is multiplied by after each frame"),
        )
        .arg(
            Arg::with_name(ITERATIONS)
                .long(ITERATIONS)
                .short("i")
                .takes_value(true)
                .default_value("256")
                .validator(|s| validate_number::<u32>(&s, "Could not parse iteration limit"))
                .help("Iteration limit per pixel"),
        )
        .arg(
            Arg::with_name(TILE)
                .long(TILE)
                .takes_value(true)
                .default_value("32x16")
                .validator(|s| validate_pair::<u32>(&s, 'x', "Could not parse tile size"))
                .help("Tile size for the tiled renderer"),
        )
        .arg(
            Arg::with_name(THREADS)
                .long(THREADS)
                .short("t")
                .takes_value(true)
                .validator(|s| validate_number::<usize>(&s, "Could not parse thread count"))
                .help("Worker threads for the tiled renderer [default: number of CPUs]"),
        )
        .arg(
            Arg::with_name(PALETTE)
                .long(PALETTE)
                .short("p")
                .takes_value(true)
                .help("Raw 768-byte RGB palette file"),
        )
        .arg(
            Arg::with_name(HEADLESS)
                .long(HEADLESS)
                .help("Render without opening a window"),
        )
        .get_matches()
}

fn value<T: FromStr>(matches: &ArgMatches, name: &'static str) -> Result<T, ConfigError> {
    let raw = matches.value_of(name).unwrap_or_default();
    raw.parse().map_err(|_| ConfigError::Argument {
        name,
        value: raw.to_string(),
    })
}

fn pair<T: FromStr>(matches: &ArgMatches, name: &'static str, separator: char) -> Result<(T, T), ConfigError> {
    let raw = matches.value_of(name).unwrap_or_default();
    parse_pair(raw, separator).ok_or_else(|| ConfigError::Argument {
        name,
        value: raw.to_string(),
    })
}

fn config(matches: &ArgMatches) -> Result<BenchConfig, ConfigError> {
    let (width, height) = pair(matches, SIZE, 'x')?;
    let (tile_width, tile_height) = pair(matches, TILE, 'x')?;
    let config = BenchConfig {
        center: pair(matches, CENTER, ',')?,
        initial_span: value(matches, SPAN)?,
        decay: value(matches, DECAY)?,
        frame_count: value(matches, FRAMES)?,
        max_iterations: value(matches, ITERATIONS)?,
        size: screen::Size::new(width, height),
        tile: TileSize {
            width: tile_width,
            height: tile_height,
        },
    };
    config.validate()?;
    Ok(config)
}

fn run() -> Result<(), BenchError> {
    let matches = args();
    let config = config(&matches)?;

    let threads = match matches.value_of(THREADS) {
        Some(_) => value(&matches, THREADS)?,
        None => num_cpus::get(),
    };
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()?;

    let palette = match matches.value_of(PALETTE) {
        Some(path) => Palette::load(path)?,
        None => Palette::default(),
    };

    let backend: Backend = value(&matches, BACKEND)?;
    let mut harness = Harness::from_backend(config, backend)?;

    let report = if matches.is_present(HEADLESS) {
        harness.run(&mut NullSurface)?
    } else {
        match WindowSurface::new(config.size, palette) {
            Ok(mut surface) => harness.run(&mut surface)?,
            Err(error) => {
                warn!("cannot open a window ({error}), running headless");
                harness.run(&mut NullSurface)?
            }
        }
    };

    print!("{report}");
    Ok(())
}

fn main() {
    env_logger::init();

    if let Err(error) = run() {
        error!("{error}");
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}
