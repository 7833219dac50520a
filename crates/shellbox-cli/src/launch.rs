//! Launches a subprocess and watches its output until it reports ready,
//! exits, or exceeds a timeout.

use std::io::{BufRead, BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{bail, Context, Result};

use crate::render;

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Spawns `command` and polls its merged output.
///
/// Returns 0 as soon as a line contains `ready_marker` (the subprocess is
/// left running), or the subprocess exit code when it terminates first. If
/// the timeout elapses the subprocess is destroyed and the launch fails.
/// This is the only polling loop in the loader.
pub fn launch_and_watch(
    command: &mut Command,
    timeout: Duration,
    ready_marker: &str,
) -> Result<i32> {
    command.stdout(Stdio::piped()).stderr(Stdio::piped());
    let mut child = command.spawn().context("failed to start subprocess")?;

    let (sender, receiver) = mpsc::channel::<String>();
    if let Some(stream) = child.stdout.take() {
        spawn_line_reader(stream, sender.clone());
    }
    if let Some(stream) = child.stderr.take() {
        spawn_line_reader(stream, sender.clone());
    }
    drop(sender);

    render::status("Starting in background -");
    let started = Instant::now();
    while started.elapsed() < timeout {
        match receiver.recv_timeout(POLL_INTERVAL) {
            Ok(line) => {
                render::status(&line);
                if line.contains(ready_marker) {
                    return Ok(0);
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                // Both pipes closed; the subprocess is done or about to be.
                let status = child.wait().context("failed to wait for subprocess")?;
                return Ok(status.code().unwrap_or(1));
            }
        }
    }

    child
        .kill()
        .context("failed to destroy the timed-out subprocess")?;
    let _ = child.wait();
    bail!(
        "startup exceeded the timeout of {} seconds - aborting",
        timeout.as_secs()
    );
}

fn spawn_line_reader(stream: impl Read + Send + 'static, sender: Sender<String>) {
    thread::spawn(move || {
        let reader = BufReader::new(stream);
        for line in reader.lines() {
            let Ok(line) = line else {
                break;
            };
            if sender.send(line).is_err() {
                break;
            }
        }
    });
}
