use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod control;
mod replay;

#[derive(Parser)]
#[command(name = "vigil", version, about = "Vigil attention monitoring")]
struct Cli {
    /// Talk to a daemon on the session bus instead of the system bus
    #[arg(long, global = true)]
    session: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a recorded landmark stream through the estimator and report events
    Replay(replay::ReplayArgs),
    /// Start a monitoring session in vigild
    Start,
    /// Stop the running monitoring session
    Stop,
    /// Reset the away count and risk score
    Reset,
    /// Show daemon status
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Replay(args) => replay::run(&args),
        Command::Start => control::start(cli.session).await,
        Command::Stop => control::stop(cli.session).await,
        Command::Reset => control::reset(cli.session).await,
        Command::Status => control::status(cli.session).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_replay_flags() {
        let cli = Cli::try_parse_from([
            "vigil",
            "replay",
            "session.jsonl",
            "--away-threshold",
            "7",
            "--cumulative",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Command::Replay(args) => {
                assert_eq!(args.away_threshold, Some(7));
                assert!(args.cumulative);
                assert!(args.json);
                assert!(args.off_axis_threshold.is_none());
            }
            _ => panic!("expected replay"),
        }
    }

    #[test]
    fn test_session_flag_is_global() {
        let cli = Cli::try_parse_from(["vigil", "status", "--session"]).unwrap();
        assert!(cli.session);
        assert!(matches!(cli.command, Command::Status));
    }
}
