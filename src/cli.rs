use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::time::Duration;

use crate::wait::DEFAULT_EVENT_DELTA;

pub fn build_cli() -> Command {
    Command::new("cluster-probe")
        .version("0.1.0")
        .about("Polls query cluster status pages until expected state is reached")
        .subcommand_required(true)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Configuration file path"),
        )
        .arg(
            Arg::new("impalad")
                .long("impalad")
                .value_name("URL")
                .help("Query daemon web server, e.g. http://localhost:25000"),
        )
        .arg(
            Arg::new("catalog")
                .long("catalog")
                .value_name("URL")
                .help("Catalog web server, e.g. http://localhost:25020"),
        )
        .arg(
            Arg::new("interval-ms")
                .short('i')
                .long("interval-ms")
                .value_name("MILLIS")
                .value_parser(value_parser!(u64))
                .help("Delay between poll attempts"),
        )
        .arg(
            Arg::new("timeout-secs")
                .short('t')
                .long("timeout-secs")
                .value_name("SECS")
                .value_parser(value_parser!(u64))
                .help("Deadline for wait commands"),
        )
        .arg(
            Arg::new("log-level")
                .short('l')
                .long("log-level")
                .value_name("LEVEL")
                .help("Log level (error, warn, info, debug, trace)"),
        )
        .subcommand(
            Command::new("metric")
                .about("Print the current value of a daemon metric")
                .arg(Arg::new("name").required(true).value_name("NAME")),
        )
        .subcommand(
            Command::new("wait-metric")
                .about("Wait until a daemon metric reaches a value")
                .arg(Arg::new("name").required(true).value_name("NAME"))
                .arg(
                    Arg::new("expected")
                        .required(true)
                        .value_name("EXPECTED")
                        .value_parser(value_parser!(i64)),
                )
                .arg(
                    Arg::new("at-least")
                        .long("at-least")
                        .action(ArgAction::SetTrue)
                        .help("Accept any value >= EXPECTED"),
                ),
        )
        .subcommand(Command::new("events").about("Print catalog event processor metrics"))
        .subcommand(
            Command::new("wait-events")
                .about("Wait until the catalog syncs events past a previous event id")
                .arg(
                    Arg::new("previous-id")
                        .required(true)
                        .value_name("PREVIOUS_ID")
                        .value_parser(value_parser!(i64).range(0..)),
                )
                .arg(
                    Arg::new("min-delta")
                        .long("min-delta")
                        .value_name("N")
                        .value_parser(value_parser!(i64).range(1..))
                        .help(format!(
                            "Events the id must advance by [default: {DEFAULT_EVENT_DELTA}]"
                        )),
                )
                .arg(
                    Arg::new("settle-ms")
                        .long("settle-ms")
                        .value_name("MILLIS")
                        .value_parser(value_parser!(u64))
                        .help("Delay after sync for daemons to see the update (overrides config)"),
                ),
        )
        .subcommand(
            Command::new("grep")
                .about("Search a log directory for a string")
                .arg(Arg::new("dir").required(true).value_name("DIR"))
                .arg(Arg::new("search").required(true).value_name("SEARCH")),
        )
        .subcommand(
            Command::new("sample-config")
                .about("Write a configuration file with default values")
                .arg(Arg::new("path").required(true).value_name("PATH")),
        )
}

/// `--min-delta` of `wait-events`, or the per-insert event count.
pub fn min_event_delta(sub: &ArgMatches) -> i64 {
    sub.get_one::<i64>("min-delta")
        .copied()
        .unwrap_or(DEFAULT_EVENT_DELTA)
}

/// `--settle-ms` of `wait-events`, or `configured` when absent.
pub fn event_settle(sub: &ArgMatches, configured: Duration) -> Duration {
    sub.get_one::<u64>("settle-ms")
        .map(|ms| Duration::from_millis(*ms))
        .unwrap_or(configured)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition() {
        build_cli().debug_assert();
    }

    #[test]
    fn test_wait_metric_args() {
        let matches = build_cli()
            .try_get_matches_from([
                "cluster-probe",
                "wait-metric",
                "impala-server.num-sessions-expired",
                "4",
                "--at-least",
            ])
            .unwrap();

        let (name, sub) = matches.subcommand().unwrap();
        assert_eq!(name, "wait-metric");
        assert_eq!(sub.get_one::<i64>("expected"), Some(&4));
        assert!(sub.get_flag("at-least"));
    }

    #[test]
    fn test_subcommand_required() {
        assert!(build_cli().try_get_matches_from(["cluster-probe"]).is_err());
    }

    #[test]
    fn test_wait_events_defaults() {
        let matches = build_cli()
            .try_get_matches_from(["cluster-probe", "wait-events", "41"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        assert_eq!(min_event_delta(sub), DEFAULT_EVENT_DELTA);
        assert_eq!(
            event_settle(sub, Duration::from_secs(2)),
            Duration::from_secs(2)
        );
    }

    #[test]
    fn test_wait_events_overrides() {
        let matches = build_cli()
            .try_get_matches_from([
                "cluster-probe",
                "wait-events",
                "41",
                "--min-delta",
                "5",
                "--settle-ms",
                "0",
            ])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();

        assert_eq!(min_event_delta(sub), 5);
        assert_eq!(event_settle(sub, Duration::from_secs(2)), Duration::ZERO);
    }

    #[test]
    fn test_wait_events_rejects_out_of_range() {
        assert!(build_cli()
            .try_get_matches_from(["cluster-probe", "wait-events", "--", "-5"])
            .is_err());
        assert!(build_cli()
            .try_get_matches_from(["cluster-probe", "wait-events", "41", "--min-delta", "0"])
            .is_err());
    }
}
