//! Archive extraction.
//!
//! Archives are unpacked next to themselves, into the directory that holds
//! them, and deleted afterwards. Zip is chosen by extension; everything else
//! is treated as a tar stream whose compression is sniffed from magic bytes.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read};
use std::path::{Component, Path, PathBuf};

use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use thiserror::Error;
use xz2::read::XzDecoder;
use zip::ZipArchive;
use zstd::stream::Decoder as ZstdDecoder;

#[derive(Error, Debug)]
/// Errors raised while unpacking an archive.
pub enum UnpackError {
    /// Reading the archive or writing an entry failed.
    #[error("failed to unpack {}", archive.display())]
    Io {
        /// Archive being unpacked.
        archive: PathBuf,
        /// Underlying failure.
        #[source]
        source: io::Error,
    },

    /// The archive is malformed, empty, or holds an unsafe entry.
    #[error("failed to unpack {}: {message}", archive.display())]
    Archive {
        /// Archive being unpacked.
        archive: PathBuf,
        /// Diagnostic.
        message: String,
    },
}

impl UnpackError {
    fn io(archive: &Path, source: io::Error) -> Self {
        Self::Io {
            archive: archive.to_path_buf(),
            source,
        }
    }

    fn archive(archive: &Path, message: impl Into<String>) -> Self {
        Self::Archive {
            archive: archive.to_path_buf(),
            message: message.into(),
        }
    }
}

/// Result of a successful [`unpack`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Unpacked {
    /// Directory the entries were written into.
    pub root: PathBuf,
    /// Number of archive entries written, directories included.
    pub entries: usize,
    /// First path component of every entry, i.e. what the archive put in `root`.
    pub top_level: BTreeSet<OsString>,
}

/// Compression wrapped around a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// `1f 8b`
    Gzip,
    /// `BZh`
    Bzip2,
    /// `fd 37 7a 58 5a 00`
    Xz,
    /// `28 b5 2f fd`
    Zstd,
    /// Anything else is read as plain tar.
    None,
}

impl Compression {
    /// Identify the compression from the first bytes of a file.
    pub fn sniff(head: &[u8]) -> Self {
        if head.starts_with(&[0x1f, 0x8b]) {
            Self::Gzip
        } else if head.starts_with(b"BZh") {
            Self::Bzip2
        } else if head.starts_with(&[0xfd, b'7', b'z', b'X', b'Z', 0x00]) {
            Self::Xz
        } else if head.starts_with(&[0x28, 0xb5, 0x2f, 0xfd]) {
            Self::Zstd
        } else {
            Self::None
        }
    }
}

/// True if the file name selects the zip extractor.
pub fn is_zip(path: &Path) -> bool {
    path.extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("zip"))
}

/// Extract `archive` into its containing directory, then delete it.
///
/// The archive is kept when extraction fails.
///
/// # Errors
///
/// Returns [`UnpackError`] if the archive cannot be read, is empty, or holds
/// an entry that would land outside the containing directory.
pub fn unpack(archive: &Path) -> Result<Unpacked, UnpackError> {
    let root = match archive.parent() {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => PathBuf::from("."),
    };

    let mut top_level = BTreeSet::new();
    let entries = if is_zip(archive) {
        extract_zip(archive, &root, &mut top_level)?
    } else {
        extract_tar(archive, &root, &mut top_level)?
    };

    if entries == 0 {
        return Err(UnpackError::archive(archive, "archive contains no entries"));
    }

    fs::remove_file(archive).map_err(|e| UnpackError::io(archive, e))?;
    tracing::debug!(archive = %archive.display(), entries, "Unpacked");

    Ok(Unpacked {
        root,
        entries,
        top_level,
    })
}

fn top_level_name(path: &Path) -> Option<OsString> {
    path.components().find_map(|c| match c {
        Component::Normal(name) => Some(name.to_os_string()),
        _ => None,
    })
}

fn extract_tar(
    archive: &Path,
    dest: &Path,
    top_level: &mut BTreeSet<OsString>,
) -> Result<usize, UnpackError> {
    let file = File::open(archive).map_err(|e| UnpackError::io(archive, e))?;
    let mut reader = BufReader::new(file);
    let compression = Compression::sniff(reader.fill_buf().map_err(|e| UnpackError::io(archive, e))?);
    tracing::trace!(archive = %archive.display(), ?compression, "Detected compression");

    match compression {
        Compression::Gzip => unpack_tar_stream(GzDecoder::new(reader), archive, dest, top_level),
        Compression::Bzip2 => unpack_tar_stream(BzDecoder::new(reader), archive, dest, top_level),
        Compression::Xz => unpack_tar_stream(XzDecoder::new(reader), archive, dest, top_level),
        Compression::Zstd => {
            let decoder =
                ZstdDecoder::with_buffer(reader).map_err(|e| UnpackError::io(archive, e))?;
            unpack_tar_stream(decoder, archive, dest, top_level)
        }
        Compression::None => unpack_tar_stream(reader, archive, dest, top_level),
    }
}

fn unpack_tar_stream<R: Read>(
    reader: R,
    archive: &Path,
    dest: &Path,
    top_level: &mut BTreeSet<OsString>,
) -> Result<usize, UnpackError> {
    let mut tar = tar::Archive::new(reader);
    let mut count = 0;

    for entry in tar.entries().map_err(|e| UnpackError::io(archive, e))? {
        let mut entry = entry.map_err(|e| UnpackError::io(archive, e))?;
        let name = entry
            .path()
            .map_err(|e| UnpackError::io(archive, e))?
            .into_owned();
        // unpack_in refuses anything that would resolve outside `dest`.
        let inside = entry
            .unpack_in(dest)
            .map_err(|e| UnpackError::io(archive, e))?;
        if !inside {
            return Err(UnpackError::archive(
                archive,
                format!("entry escapes target directory: {}", name.display()),
            ));
        }
        top_level.extend(top_level_name(&name));
        count += 1;
    }

    Ok(count)
}

fn extract_zip(
    archive: &Path,
    dest: &Path,
    top_level: &mut BTreeSet<OsString>,
) -> Result<usize, UnpackError> {
    let file = File::open(archive).map_err(|e| UnpackError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| UnpackError::archive(archive, e.to_string()))?;

    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|e| UnpackError::archive(archive, e.to_string()))?;
        let Some(relative_path) = entry.enclosed_name() else {
            return Err(UnpackError::archive(
                archive,
                format!("entry escapes target directory: {}", entry.name()),
            ));
        };
        top_level.extend(top_level_name(&relative_path));
        let absolute_path = dest.join(relative_path);

        if entry.is_dir() {
            fs::create_dir_all(&absolute_path).map_err(|e| UnpackError::io(archive, e))?;
            continue;
        }

        if let Some(parent) = absolute_path.parent() {
            fs::create_dir_all(parent).map_err(|e| UnpackError::io(archive, e))?;
        }
        let mut outfile = File::create(&absolute_path).map_err(|e| UnpackError::io(archive, e))?;
        io::copy(&mut entry, &mut outfile).map_err(|e| UnpackError::io(archive, e))?;

        #[cfg(unix)]
        if let Some(mode) = entry.unix_mode() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&absolute_path, fs::Permissions::from_mode(mode))
                .map_err(|e| UnpackError::io(archive, e))?;
        }
    }

    Ok(zip.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;

    fn tar_bytes(files: &[(&str, &[u8])]) -> Vec<u8> {
        let mut builder = tar::Builder::new(Vec::new());
        for (path, data) in files {
            let mut header = tar::Header::new_gnu();
            header.set_size(data.len() as u64);
            header.set_mode(0o755);
            header.set_cksum();
            builder.append_data(&mut header, path, *data).unwrap();
        }
        builder.into_inner().unwrap()
    }

    fn write(path: &Path, bytes: &[u8]) {
        fs::write(path, bytes).unwrap();
    }

    #[test]
    fn sniffs_magic_bytes() {
        assert_eq!(Compression::sniff(&[0x1f, 0x8b, 0x08]), Compression::Gzip);
        assert_eq!(Compression::sniff(b"BZh91AY"), Compression::Bzip2);
        assert_eq!(
            Compression::sniff(&[0xfd, 0x37, 0x7a, 0x58, 0x5a, 0x00, 0x00]),
            Compression::Xz
        );
        assert_eq!(Compression::sniff(&[0x28, 0xb5, 0x2f, 0xfd]), Compression::Zstd);
        assert_eq!(Compression::sniff(b"ustar"), Compression::None);
        assert_eq!(Compression::sniff(&[]), Compression::None);
    }

    #[test]
    fn zip_detection_is_case_insensitive() {
        assert!(is_zip(Path::new("tool.zip")));
        assert!(is_zip(Path::new("TOOL.ZIP")));
        assert!(!is_zip(Path::new("tool.tar.bz2")));
        assert!(!is_zip(Path::new("zip")));
    }

    #[test]
    fn unpacks_gzip_tar_and_removes_archive() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("core.tar.gz");
        let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::default());
        enc.write_all(&tar_bytes(&[("avr/platform.txt", b"name=AVR")]))
            .unwrap();
        write(&archive, &enc.finish().unwrap());

        let unpacked = unpack(&archive).unwrap();

        assert_eq!(unpacked.root, dir.path());
        assert_eq!(unpacked.top_level, BTreeSet::from([OsString::from("avr")]));
        assert_eq!(
            fs::read_to_string(dir.path().join("avr/platform.txt")).unwrap(),
            "name=AVR"
        );
        assert!(!archive.exists());
    }

    #[test]
    fn unpacks_bzip2_tar() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("avr-1.6.0.tar.bz2");
        let mut enc = bzip2::write::BzEncoder::new(Vec::new(), bzip2::Compression::default());
        enc.write_all(&tar_bytes(&[("avr/boards.txt", b"uno")])).unwrap();
        write(&archive, &enc.finish().unwrap());

        unpack(&archive).unwrap();
        assert!(dir.path().join("avr/boards.txt").exists());
    }

    #[test]
    fn unpacks_xz_and_zstd_tar() {
        let dir = tempdir().unwrap();

        let xz = dir.path().join("a.tar.xz");
        let mut enc = xz2::write::XzEncoder::new(Vec::new(), 6);
        enc.write_all(&tar_bytes(&[("x/one", b"1")])).unwrap();
        write(&xz, &enc.finish().unwrap());
        unpack(&xz).unwrap();
        assert!(dir.path().join("x/one").exists());

        let zst = dir.path().join("b.tar.zst");
        let compressed = zstd::encode_all(&tar_bytes(&[("z/two", b"2")])[..], 0).unwrap();
        write(&zst, &compressed);
        unpack(&zst).unwrap();
        assert!(dir.path().join("z/two").exists());
    }

    #[test]
    fn unpacks_plain_tar_regardless_of_extension() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("bossac-1.6.1-arduino.tar.gz");
        write(&archive, &tar_bytes(&[("bossac", b"#!/bin/sh")]));

        let unpacked = unpack(&archive).unwrap();
        assert_eq!(unpacked.entries, 1);
        assert!(dir.path().join("bossac").exists());
    }

    #[test]
    fn top_level_name_skips_current_dir() {
        assert_eq!(top_level_name(Path::new("./avr/boards.txt")), Some("avr".into()));
        assert_eq!(top_level_name(Path::new("bossac")), Some("bossac".into()));
        assert_eq!(top_level_name(Path::new("./")), None);
    }

    #[test]
    fn top_level_names_are_deduplicated() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("multi.tar");
        write(
            &archive,
            &tar_bytes(&[
                ("./avr/boards.txt", b"uno"),
                ("./avr/platform.txt", b"AVR"),
                ("LICENSE", b"GPL"),
            ]),
        );

        let unpacked = unpack(&archive).unwrap();
        assert_eq!(unpacked.entries, 3);
        assert_eq!(
            unpacked.top_level,
            BTreeSet::from([OsString::from("LICENSE"), OsString::from("avr")])
        );
    }

    #[test]
    fn unpacks_zip_with_uppercase_extension() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("TOOL.ZIP");
        let mut zip = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default().unix_permissions(0o755);
        zip.add_directory("tool/", options).unwrap();
        zip.start_file("tool/bin/avrdude", options).unwrap();
        zip.write_all(b"binary").unwrap();
        write(&archive, &zip.finish().unwrap().into_inner());

        let unpacked = unpack(&archive).unwrap();
        assert_eq!(unpacked.entries, 2);
        assert_eq!(unpacked.top_level, BTreeSet::from([OsString::from("tool")]));
        assert_eq!(fs::read(dir.path().join("tool/bin/avrdude")).unwrap(), b"binary");
        assert!(!archive.exists());

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let mode = fs::metadata(dir.path().join("tool/bin/avrdude"))
                .unwrap()
                .permissions()
                .mode();
            assert_eq!(mode & 0o111, 0o111);
        }
    }

    #[test]
    fn rejects_tar_entry_outside_target() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let archive = target.join("evil.tar");

        let mut header = tar::Header::new_gnu();
        let name = b"../escaped";
        header.as_gnu_mut().unwrap().name[..name.len()].copy_from_slice(name);
        header.set_size(4);
        header.set_mode(0o644);
        header.set_cksum();
        let mut builder = tar::Builder::new(Vec::new());
        builder.append(&header, &b"evil"[..]).unwrap();
        write(&archive, &builder.into_inner().unwrap());

        let err = unpack(&archive).unwrap_err();
        assert!(matches!(err, UnpackError::Archive { .. }));
        assert!(!dir.path().join("escaped").exists());
        assert!(archive.exists());
    }

    #[test]
    fn rejects_zip_entry_outside_target() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("evil.zip");
        let mut zip = zip::ZipWriter::new(io::Cursor::new(Vec::new()));
        zip.start_file("../escaped", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"evil").unwrap();
        write(&archive, &zip.finish().unwrap().into_inner());

        let err = unpack(&archive).unwrap_err();
        assert!(matches!(err, UnpackError::Archive { .. }));
        assert!(archive.exists());
    }

    #[test]
    fn empty_archive_is_an_error() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("empty.tar");
        write(&archive, &tar_bytes(&[]));

        let err = unpack(&archive).unwrap_err();
        assert!(matches!(err, UnpackError::Archive { .. }));
        assert!(archive.exists());
    }

    #[test]
    fn garbage_is_an_error_and_archive_is_kept() {
        let dir = tempdir().unwrap();
        let archive = dir.path().join("broken.zip");
        write(&archive, b"not a zip at all");

        assert!(unpack(&archive).is_err());
        assert!(archive.exists());
    }
}
