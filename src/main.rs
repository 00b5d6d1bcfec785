use std::process;

use bytesize::ByteSize;
use clap::ArgEnum;
use env_logger;
use log;

use runsort::{ExternalSorter, SortConfig, SortError};

fn main() {
    let arg_parser = build_arg_parser();

    let log_level: LogLevel = arg_parser.value_of_t_or_exit("log_level");
    init_logger(log_level);

    let input = arg_parser.value_of("input").expect("value is required");
    let memory = arg_parser.value_of("memory").expect("value is required");
    let total_budget = memory.parse::<ByteSize>().expect("value is pre-validated").as_u64() as usize;

    // half the allotment for the run buffer, the full allotment is divided
    // across the merge streams later (the two phases never run concurrently)
    let config = match SortConfig::for_input(input, total_budget / 2, total_budget) {
        Ok(config) => config,
        Err(err) => {
            log::error!("invalid configuration: {}", err);
            process::exit(2);
        }
    };

    let sorter = match ExternalSorter::new(config) {
        Ok(sorter) => sorter,
        Err(err) => exit_with(err),
    };

    match sorter.sort() {
        Ok(output) => log::info!("sort successful, output written to {}", output.display()),
        Err(err) => exit_with(err),
    }
}

fn exit_with(err: SortError) -> ! {
    log::error!("{}", err);
    process::exit(match err {
        SortError::Config(_) => 2,
        SortError::Parse { .. } => 3,
        SortError::Io(_) => 4,
        SortError::UndersizedBuffer(_) => 5,
    })
}

#[derive(Copy, Clone, clap::ArgEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    pub fn possible_values() -> impl Iterator<Item = clap::PossibleValue<'static>> {
        Self::value_variants().iter().filter_map(|v| v.to_possible_value())
    }
}

impl std::str::FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <LogLevel as clap::ArgEnum>::from_str(s, false)
    }
}

fn build_arg_parser() -> clap::ArgMatches {
    clap::App::new("runsort")
        .about("external merge sort for newline-delimited integer files")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("file of newline-separated decimal integers to be sorted")
                .required(true)
                .takes_value(true),
        )
        .arg(
            clap::Arg::new("memory")
                .short('m')
                .long("memory")
                .help("total memory budget, e.g. 256M or 1G (metric prefixes)")
                .required(true)
                .takes_value(true)
                .validator(|v| match v.parse::<ByteSize>() {
                    Ok(_) => Ok(()),
                    Err(err) => Err(format!("Memory size format incorrect: {}", err)),
                }),
        )
        .arg(
            clap::Arg::new("log_level")
                .short('l')
                .long("loglevel")
                .help("logging level")
                .takes_value(true)
                .default_value("info")
                .possible_values(LogLevel::possible_values()),
        )
        .get_matches()
}

fn init_logger(log_level: LogLevel) {
    env_logger::Builder::new()
        .filter_level(match log_level {
            LogLevel::Off => log::LevelFilter::Off,
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        })
        .format_timestamp_millis()
        .init();
}
