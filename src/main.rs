use anyhow::Result;
use clap::{Arg, ArgAction, Command};

use barstat::commands;

fn build_cli() -> Command {
    Command::new("barstat")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Menu bar telemetry: CPU, RAM, storage, network, weather, keep-awake and running apps")
        .subcommand(
            Command::new("monitor")
                .about("Sample continuously and print the menu bar state")
                .arg(
                    Arg::new("interval")
                        .short('i')
                        .long("interval-ms")
                        .value_name("MS")
                        .help("Stats sampling interval in milliseconds (default from config)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print one JSON object per tick")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("stats")
                .about("Print a single stats snapshot")
                .arg(
                    Arg::new("json")
                        .long("json")
                        .help("Print the snapshot as JSON")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("weather")
                .about("Show the current weather")
                .arg(
                    Arg::new("refresh")
                        .short('r')
                        .long("refresh")
                        .help("Bypass the cached forecast")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(Command::new("apps").about("List running user-facing apps"))
        .subcommand(
            Command::new("quit")
                .about("Ask running apps to quit")
                .arg_required_else_help(true)
                .arg(
                    Arg::new("bundle-id")
                        .help("Bundle identifier of the app to quit")
                        .index(1)
                        .conflicts_with("all"),
                )
                .arg(
                    Arg::new("all")
                        .short('a')
                        .long("all")
                        .help("Quit every listed app")
                        .action(ArgAction::SetTrue),
                ),
        )
        .subcommand(
            Command::new("awake")
                .about("Keep the machine awake until Ctrl+C or the timer ends")
                .arg(
                    Arg::new("minutes")
                        .short('m')
                        .long("minutes")
                        .value_name("N")
                        .help("Allow sleep again after N minutes (default: indefinitely)")
                        .value_parser(clap::value_parser!(u64).range(1..)),
                ),
        )
}

fn main() -> Result<()> {
    barstat::init_logging();

    let matches = build_cli().get_matches();

    match matches.subcommand() {
        Some(("monitor", sub_matches)) => commands::monitor(sub_matches)?,
        Some(("stats", sub_matches)) => commands::stats(sub_matches)?,
        Some(("weather", sub_matches)) => commands::weather(sub_matches)?,
        Some(("apps", sub_matches)) => commands::apps(sub_matches)?,
        Some(("quit", sub_matches)) => commands::quit(sub_matches)?,
        Some(("awake", sub_matches)) => commands::awake(sub_matches)?,
        _ => {
            println!("Welcome to barstat!");
            println!("Use 'barstat --help' for more information.");
        }
    }

    Ok(())
}
