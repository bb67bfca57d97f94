use std::process::ExitCode;

fn main() -> ExitCode {
    ExitCode::from(tcsimd::run_daemon().code())
}
