use crate::demo::{run_availability, run_demo, run_quote, AvailabilityArgs, DemoArgs, QuoteArgs};
use clap::{Parser, Subcommand};
use parkade_core::error::AppError;

#[derive(Parser, Debug)]
#[command(
    name = "parkade",
    about = "Simulate and inspect a multi-floor parking facility from the command line",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a concurrent check-in/check-out simulation (default command)
    Demo(DemoArgs),
    /// Print availability for the configured lot before any traffic
    Availability(AvailabilityArgs),
    /// Preview the fee for a stay
    Quote(QuoteArgs),
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Demo(DemoArgs::default()));

    match command {
        Command::Demo(args) => run_demo(args).await,
        Command::Availability(args) => run_availability(args).await,
        Command::Quote(args) => run_quote(args),
    }
}

/// Ten years. Longer stays are treated as input mistakes.
pub(crate) const MAX_STAY_HOURS: f64 = 24.0 * 366.0 * 10.0;

pub(crate) fn parse_hours(raw: &str) -> Result<f64, String> {
    let hours: f64 = raw
        .trim()
        .parse()
        .map_err(|err| format!("failed to parse '{raw}' as hours ({err})"))?;
    if !hours.is_finite() || hours < 0.0 {
        return Err(format!("'{raw}' must be a non-negative number of hours"));
    }
    if hours > MAX_STAY_HOURS {
        return Err(format!("'{raw}' exceeds the {MAX_STAY_HOURS} hour limit"));
    }
    Ok(hours)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn quote_arguments_parse() {
        let cli = Cli::try_parse_from(["parkade", "quote", "--vehicle", "car", "--hours", "3.5"])
            .expect("valid arguments");
        match cli.command {
            Some(Command::Quote(args)) => {
                assert_eq!(args.vehicle, parkade_core::lot::VehicleSize::Medium);
                assert!((args.hours - 3.5).abs() < f64::EPSILON);
            }
            other => panic!("expected quote command, got {other:?}"),
        }
    }

    #[test]
    fn negative_hours_are_rejected() {
        assert!(parse_hours("-2").is_err());
        assert!(parse_hours("soon").is_err());
        assert_eq!(parse_hours(" 1.25 "), Ok(1.25));
    }

    #[test]
    fn absurdly_long_stays_are_rejected() {
        assert!(parse_hours("1e12").is_err());
        assert!(parse_hours("inf").is_err());
        assert_eq!(parse_hours("87840"), Ok(MAX_STAY_HOURS));
        assert!(Cli::try_parse_from(["parkade", "demo", "--stay-hours", "1e12"]).is_err());
    }
}
