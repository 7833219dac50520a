use std::process::ExitCode;

mod bootstrap;
mod bundle;
mod engine;
mod launch;
mod render;

#[cfg(test)]
mod tests;

/// The single termination point: every fatal condition below arrives here
/// as an error and exits non-zero.
fn main() -> ExitCode {
    let arguments: Vec<String> = std::env::args().skip(1).collect();
    match bootstrap::run(&arguments) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => ExitCode::from(code.clamp(1, 255) as u8),
        Err(err) => {
            render::error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}
