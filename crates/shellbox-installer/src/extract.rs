use std::fs::{self, File};
use std::io::{BufReader, Cursor, Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use flate2::read::GzDecoder;
use zip::ZipArchive;

/// Suffixes whose deployed files are never overwritten by later installs;
/// local edits to them survive upgrades.
pub const PROTECTED_SUFFIXES: [&str; 2] = [".xml", ".conf"];

const BUFFER_CEILING: u64 = 256 * 1024;
const BUFFER_FLOOR: u64 = 8 * 1024;

pub fn is_protected_config(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    PROTECTED_SUFFIXES
        .iter()
        .any(|suffix| lower.ends_with(suffix))
}

/// Extracts an embedded zip into `target_dir`, returning the number of
/// bytes written.
///
/// Directory entries are created and skipped. Protected-configuration
/// entries are skipped when a file already exists at the destination.
/// Entries ending in `.gz` are expanded in a second pass immediately after
/// being written and the intermediate file is removed. `progress` receives
/// each written entry name; it is cosmetic only.
pub fn install_archive(
    bytes: &[u8],
    target_dir: &Path,
    progress: &mut dyn FnMut(&str),
) -> Result<u64> {
    fs::create_dir_all(target_dir)
        .with_context(|| format!("failed to create {}", target_dir.display()))?;
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).context("embedded archive is not a readable zip")?;

    let mut written = 0_u64;
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .with_context(|| format!("failed to read archive entry #{index}"))?;
        // Entries that would escape the target directory are never written.
        let Some(relative) = entry.enclosed_name() else {
            continue;
        };
        let name = entry.name().to_string();
        let destination = target_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&destination)
                .with_context(|| format!("failed to create {}", destination.display()))?;
            continue;
        }
        if is_protected_config(&name) && destination.is_file() {
            continue;
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }

        progress(&name);
        let declared_size = entry.size();
        written += write_entry(&mut entry, declared_size, &destination)?;

        if name.ends_with(".gz") {
            written += unpack_gz(&destination)?;
            fs::remove_file(&destination).with_context(|| {
                format!(
                    "failed to remove intermediate file: {}",
                    destination.display()
                )
            })?;
        }
    }
    Ok(written)
}

fn write_entry(entry: &mut impl Read, declared_size: u64, destination: &Path) -> Result<u64> {
    // Buffer sized to the entry, between an 8 KiB floor and a 256 KiB
    // ceiling, so huge entries do not allocate their full length.
    let buffer_len = declared_size.clamp(BUFFER_FLOOR, BUFFER_CEILING) as usize;
    let mut buffer = vec![0_u8; buffer_len];
    let mut out = File::create(destination)
        .with_context(|| format!("failed to create {}", destination.display()))?;

    let mut written = 0_u64;
    loop {
        let count = entry
            .read(&mut buffer)
            .with_context(|| format!("failed reading archive entry for {}", destination.display()))?;
        if count == 0 {
            break;
        }
        out.write_all(&buffer[..count])
            .with_context(|| format!("failed writing {}", destination.display()))?;
        written += count as u64;
    }
    Ok(written)
}

fn unpack_gz(path: &Path) -> Result<u64> {
    let Some(unpacked) = path
        .to_str()
        .and_then(|raw| raw.strip_suffix(".gz"))
        .map(PathBuf::from)
    else {
        bail!("unexpected compressed entry name: {}", path.display());
    };

    let source = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut decoder = GzDecoder::new(BufReader::new(source));
    let mut out = File::create(&unpacked)
        .with_context(|| format!("failed to create {}", unpacked.display()))?;
    std::io::copy(&mut decoder, &mut out)
        .with_context(|| format!("failed to unpack {}", path.display()))
}

/// Removes leftover `.gz` intermediates from an interrupted earlier run.
/// Best effort; failures here are ignored like any other cosmetic cleanup.
pub fn clean_unpacked(lib_dir: &Path) {
    let Ok(entries) = fs::read_dir(lib_dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) == Some("gz") {
            let _ = fs::remove_file(&path);
        }
    }
}
