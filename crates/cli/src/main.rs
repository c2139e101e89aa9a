use std::process::ExitCode;

fn main() -> ExitCode {
    riverlevels_cli::run()
}
