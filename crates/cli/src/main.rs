use std::process::ExitCode;

fn main() -> ExitCode {
    spectrum_cli::run()
}
