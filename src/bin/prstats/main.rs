mod display;

use std::process::ExitCode;

use prstats::{FetchError, GhCli, collect_stats, parse_args};

use display::write_report;

fn handle_clap_error(clap_err: &clap::Error) -> u8 {
    use clap::error::ErrorKind;
    match clap_err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            print!("{clap_err}");
            0
        }
        // Too few positional arguments: usage goes to stdout with status 1.
        ErrorKind::MissingRequiredArgument
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
            print!("{clap_err}");
            1
        }
        _ => {
            eprint!("{clap_err}");
            2
        }
    }
}

/// Maps a failure to the process exit status, passing through the exit
/// code of `gh` when that is what failed.
fn exit_status_for(err: &anyhow::Error) -> u8 {
    err.downcast_ref::<FetchError>()
        .and_then(FetchError::exit_code)
        .and_then(|code| u8::try_from(code).ok())
        .filter(|code| *code != 0)
        .unwrap_or(1)
}

fn init_tracing() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let invocation = match parse_args(std::env::args_os()) {
        Ok(invocation) => invocation,
        Err(err) => {
            if let Some(clap_err) = err.downcast_ref::<clap::Error>() {
                return ExitCode::from(handle_clap_error(clap_err));
            }
            eprintln!("Error: {err:#}");
            return ExitCode::from(2);
        }
    };

    let gh = GhCli::new(&invocation.gh);
    let result = async {
        let report = collect_stats(&invocation.spec, &gh).await?;
        write_report(&report, &mut std::io::stdout().lock())
    }
    .await;

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(exit_status_for(&err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    fn gh_failure(source: FetchError) -> anyhow::Error {
        Err::<(), _>(source)
            .context("Failed to list pull requests for owner/repo")
            .unwrap_err()
    }

    #[cfg(unix)]
    #[test]
    fn test_gh_exit_code_passed_through() {
        use std::os::unix::process::ExitStatusExt;

        let err = gh_failure(FetchError::Exit {
            status: std::process::ExitStatus::from_raw(4 << 8),
            stderr: "HTTP 404: Not Found".to_string(),
        });
        assert_eq!(exit_status_for(&err), 4);

        // Killed by a signal: no exit code to pass through.
        let err = gh_failure(FetchError::Exit {
            status: std::process::ExitStatus::from_raw(9),
            stderr: String::new(),
        });
        assert_eq!(exit_status_for(&err), 1);
    }

    #[test]
    fn test_decode_and_spawn_failures_exit_1() {
        let decode = serde_json::from_str::<Vec<u64>>("not json").unwrap_err();
        assert_eq!(exit_status_for(&gh_failure(FetchError::Decode(decode))), 1);

        let spawn = FetchError::Spawn {
            program: "gh".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(exit_status_for(&gh_failure(spawn)), 1);

        assert_eq!(exit_status_for(&anyhow::anyhow!("something else")), 1);
    }

    #[test]
    fn test_missing_arguments_exit_1() {
        let err = prstats::parse_args(["prstats", "owner/repo"]).unwrap_err();
        let clap_err = err.downcast_ref::<clap::Error>().unwrap();
        assert_eq!(handle_clap_error(clap_err), 1);
    }
}
