//! Capability-based filesystem helpers for the geomap CLI.
//!
//! Every helper opens the closest ambient directory (the filesystem root, a
//! Windows drive, or the working directory) through `cap-std` and performs
//! the operation relative to it, so paths are handled as UTF-8 via `camino`.
#![forbid(unsafe_code)]

use std::io;

use camino::{Utf8Component, Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs_utf8::Dir};

/// Read a UTF-8 text file, such as a GeoJSON document, into memory.
pub fn read_utf8_file(path: &Utf8Path) -> io::Result<String> {
    let (dir, name) = parent_dir_and_name(path)?;
    dir.read_to_string(name.as_str())
}

/// Return whether `path` exists and is a regular file.
///
/// A missing path yields an [`io::ErrorKind::NotFound`] error rather than
/// `false`, letting callers tell "absent" apart from "not a file".
pub fn file_is_file(path: &Utf8Path) -> io::Result<bool> {
    let (dir, name) = parent_dir_and_name(path)?;
    dir.metadata(name.as_str()).map(|meta| meta.is_file())
}

/// Create every missing directory above `path`, for example before opening a
/// database file there.
pub fn ensure_parent_dir(path: &Utf8Path) -> io::Result<()> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_str().is_empty()) else {
        return Ok(());
    };
    let (anchor, relative) = anchor_and_relative(parent)?;
    if relative.as_str().is_empty() {
        return Ok(());
    }
    anchor.create_dir_all(relative)
}

fn parent_dir_and_name(path: &Utf8Path) -> io::Result<(Dir, String)> {
    let name = path
        .file_name()
        .ok_or_else(|| io::Error::other(format!("{path} does not name a file")))?;
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let dir = Dir::open_ambient_dir(parent, ambient_authority())?;
    Ok((dir, name.to_owned()))
}

/// Split `path` into an opened ambient anchor (root, drive or working
/// directory) and the remainder relative to it.
fn anchor_and_relative(path: &Utf8Path) -> io::Result<(Dir, Utf8PathBuf)> {
    let (anchor, relative): (Vec<_>, Vec<_>) = path.components().partition(|component| {
        matches!(component, Utf8Component::Prefix(_) | Utf8Component::RootDir)
    });
    let anchor: Utf8PathBuf = if anchor.is_empty() {
        Utf8PathBuf::from(".")
    } else {
        anchor.into_iter().collect()
    };
    let dir = Dir::open_ambient_dir(&anchor, ambient_authority())?;
    Ok((dir, relative.into_iter().collect()))
}
