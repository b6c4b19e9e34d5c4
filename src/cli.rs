//! CLI argument parsing for the buslink-worker binary.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "buslink-worker", about = "BusLink real-time tracking worker")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the tracking worker (default if no subcommand given)
    Serve,
    /// Resolve a test route through the directions chain and report which
    /// tier served it, then exit
    CheckProviders {
        /// Waypoints as "lat,lng" pairs (at least two)
        #[arg(long, num_args = 2.., value_parser = parse_coordinate)]
        waypoint: Vec<(f64, f64)>,
    },
}

fn parse_coordinate(raw: &str) -> Result<(f64, f64), String> {
    let (lat, lng) = raw
        .split_once(',')
        .ok_or_else(|| format!("expected \"lat,lng\", got \"{}\"", raw))?;

    let lat: f64 = lat.trim().parse().map_err(|_| format!("bad latitude in \"{}\"", raw))?;
    let lng: f64 = lng.trim().parse().map_err(|_| format!("bad longitude in \"{}\"", raw))?;
    Ok((lat, lng))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_no_command_defaults_to_none() {
        let cli = Cli::parse_from(["buslink-worker"]);
        assert!(cli.command.is_none());
    }

    #[test]
    fn test_cli_serve_command_parses() {
        let cli = Cli::parse_from(["buslink-worker", "serve"]);
        assert!(matches!(cli.command, Some(Command::Serve)));
    }

    #[test]
    fn test_cli_check_providers_parses_waypoints() {
        let cli = Cli::parse_from([
            "buslink-worker",
            "check-providers",
            "--waypoint", "10.0,106.0", "10.01,106.01",
        ]);

        match cli.command {
            Some(Command::CheckProviders { waypoint }) => {
                assert_eq!(waypoint.len(), 2);
                assert_eq!(waypoint[0], (10.0, 106.0));
            }
            _ => panic!("expected check-providers"),
        }
    }

    #[test]
    fn test_parse_coordinate_rejects_garbage() {
        assert!(parse_coordinate("10.0;106.0").is_err());
        assert!(parse_coordinate("north,106.0").is_err());
    }
}
