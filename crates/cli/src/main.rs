use std::process::ExitCode;

fn main() -> ExitCode {
    // Commands report config problems themselves; logging just stays off.
    if let Err(error) = enrollo_cli::init_logging() {
        eprintln!("logging disabled: {error:#}");
    }
    enrollo_cli::run()
}
