use std::time::Duration;

use anyhow::Result;
use camscan::{
    error::ScanError,
    interface, logger, port,
    scan::{prefix::SubnetPrefix, ScanConfig, ScanResult, Scanner},
    source,
};
use clap::{arg, crate_name, crate_version, ArgAction, ArgMatches, Command};
use pad::PadStr;

struct ParsedArgs {
    debug: bool,
    prefix: Option<SubnetPrefix>,
    ports: Vec<u16>,
    workers: usize,
    timeout: Duration,
}

fn parse_args(matches: ArgMatches) -> Result<ParsedArgs, ScanError> {
    let debug = matches.get_flag("debug");

    let prefix = matches
        .get_one::<String>("prefix")
        .map(|raw| raw.parse::<SubnetPrefix>())
        .transpose()?;

    let ports = match matches.get_many::<String>("port") {
        Some(rps) => rps
            .map(|rp| port::parse(rp))
            .collect::<Result<_, _>>()?,
        None => port::DEFAULT_CAMERA_PORTS.to_vec(),
    };

    let workers = *matches.get_one::<usize>("workers").unwrap();

    let timeout = Duration::from_millis(*matches.get_one::<u64>("timeout").unwrap());

    Ok(ParsedArgs {
        debug,
        prefix,
        ports,
        workers,
        timeout,
    })
}

fn print_results(result: ScanResult) {
    let mut out = format!("Scan Duration: {:.4}s\n\n", result.elapsed.as_secs_f32());
    if result.endpoints.is_empty() {
        out.push_str("Didn't find any camera endpoint.\n");
    } else {
        out.push_str("Endpoint                Stream URL\n");

        result.endpoints.iter().for_each(|endpoint| {
            out.push_str(&format!(
                "{}{}\n",
                endpoint.to_string().pad_to_width(24),
                source::stream_url(endpoint),
            ))
        });
    }

    print!("{}", out);
}

fn main() -> Result<()> {
    let arg_matches = Command::new(crate_name!())
        .about(
            "Discovers IP cameras on a /24 subnet by probing every host\n\
            for ports that camera streams commonly listen on.",
        )
        .version(crate_version!())
        .args([
            // Miscellaneous arguments.
            arg!(-d --debug "Turns on debugging information").action(ArgAction::SetTrue),
            arg!(-x --prefix <PREFIX> "First three octets of the subnet to scan (defaults to the local /24)")
                .required(false),
            arg!(-p --port <PORT> "One or more candidate ports separated by a comma, tried in order")
                .value_delimiter(',')
                .required(false),
            arg!(-w --workers <COUNT> "Maximum simultaneous host probes")
                .value_parser(clap::value_parser!(usize))
                .required(false)
                .default_value("10"),
            arg!(-t --timeout <MILLIS> "Per-connection-attempt timeout in milliseconds")
                .value_parser(clap::value_parser!(u64))
                .required(false)
                .default_value("1000"),
        ])
        .get_matches();

    // Extract arguments.
    let parsed = parse_args(arg_matches)?;

    // Set debug if desired.
    if parsed.debug {
        logger::init();
    }

    // Fall back to the subnet of the default interface.
    let prefix = match parsed.prefix {
        Some(prefix) => prefix,
        None => *interface::DEFAULT_PREFIX,
    };

    // Validate the configuration before any probe goes out.
    let config = ScanConfig::new(prefix, parsed.ports, parsed.workers, parsed.timeout)?;

    // Start scanner.
    let result = Scanner::new(config).start()?;

    // Show result.
    print_results(result);

    Ok(())
}
