//! Collapse a single wrapper directory left behind by extraction.
//!
//! Most upstream archives wrap their contents in one top-level directory
//! (`avr/`, `avr-gcc-4.9.2/`). Flattening moves those contents up so every
//! artifact lands directly in its destination.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::Path;

const STAGING_PREFIX: &str = ".corefetch-flatten-";

/// Collapse the wrapper directory an extraction just created in `dir`.
///
/// `top_level` is the set of top-level names the archive held (see
/// [`Unpacked::top_level`](crate::io::extract::Unpacked::top_level)). Only
/// when that set is a single name, and `dir` holds exactly that one entry as
/// a directory, are its children moved up into `dir` and the wrapper removed.
/// Every other shape is left untouched, so calling this again on a flattened
/// directory is a no-op even when the payload is itself one directory.
///
/// Returns `true` if a wrapper was collapsed.
///
/// The wrapper is first renamed into a temporary staging directory inside
/// `dir`, so a child sharing the wrapper's name can be moved up without a
/// collision. The staging directory is removed on every exit path.
///
/// # Errors
///
/// Returns any I/O error from listing or renaming entries.
pub fn flatten_single_wrapper(dir: &Path, top_level: &BTreeSet<OsString>) -> io::Result<bool> {
    let mut names = top_level.iter();
    let (Some(wrapper_name), None) = (names.next(), names.next()) else {
        return Ok(false);
    };

    let mut entries = fs::read_dir(dir)?;
    let Some(first) = entries.next().transpose()? else {
        return Ok(false);
    };
    if entries.next().is_some()
        || first.file_name() != *wrapper_name
        || !first.file_type()?.is_dir()
    {
        return Ok(false);
    }

    let staging = tempfile::Builder::new()
        .prefix(STAGING_PREFIX)
        .tempdir_in(dir)?;
    let wrapper = staging.path().join("wrapper");
    fs::rename(first.path(), &wrapper)?;

    for child in fs::read_dir(&wrapper)? {
        let child = child?;
        fs::rename(child.path(), dir.join(child.file_name()))?;
    }

    tracing::debug!(
        dir = %dir.display(),
        wrapper = %wrapper_name.to_string_lossy(),
        "Flattened wrapper directory"
    );
    staging.close()?;
    Ok(true)
}
