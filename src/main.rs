use std::process::ExitCode;

use vcd_extraconfig::cli::Cli;
use vcd_extraconfig::commands::set_extra_config::SetExtraConfigCommand;
use vcd_extraconfig::utils::config::Config;
use vcd_extraconfig::utils::output::{print_error, set_verbose};

/// Exit status for missing required arguments
const EXIT_USAGE: u8 = 2;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let (cli, presence) = match Cli::try_parse_with_presence(std::env::args_os()) {
        Ok(parsed) => parsed,
        Err(err) => err.exit(),
    };
    set_verbose(cli.verbose);

    let config = match Config::assemble(cli, &presence) {
        Ok(config) => config,
        Err(err) => {
            print_error(&err.to_string());
            eprint!("{}", Cli::usage());
            return ExitCode::from(EXIT_USAGE);
        }
    };

    match SetExtraConfigCommand::new(config).execute().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            println!("{err}");
            ExitCode::from(err.exit_code())
        }
    }
}
