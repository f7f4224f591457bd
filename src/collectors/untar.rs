//! Streaming extraction of tar archives into a directory tree.
//!
//! Entries are processed strictly in stream order. Regular files and
//! directories are materialized; every other entry kind is reported through
//! the configured [`WarningSink`] and skipped.

use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::debug;
use tar::{Archive, EntryType};

use crate::error::CollectError;
use crate::logging::{LogWarningSink, WarningSink};

/// Unpacks a trusted tar stream under a destination root.
#[derive(Clone)]
pub struct TarUnpacker {
    warnings: Arc<dyn WarningSink>,
}

impl Default for TarUnpacker {
    fn default() -> Self {
        Self::new(Arc::new(LogWarningSink))
    }
}

impl TarUnpacker {
    pub fn new(warnings: Arc<dyn WarningSink>) -> Self {
        Self { warnings }
    }

    /// Read the archive from `reader` and write its contents into `dir`.
    ///
    /// Intermediate directories are not created for regular files; the stream
    /// is expected to carry directory entries ahead of their contents.
    pub fn unpack<R: Read>(&self, reader: R, dir: &Path) -> Result<()> {
        let mut archive = Archive::new(reader);
        let entries = archive.entries().context("tar reading error")?;

        for entry in entries {
            let mut entry = entry.context("tar reading error")?;

            let name = String::from_utf8_lossy(&entry.path_bytes()).into_owned();
            if name.is_empty() {
                continue;
            }
            let abs = dir.join(relative_entry_path(&name)?);

            match entry.header().entry_type() {
                EntryType::Regular => {
                    let expected = entry.header().size().context("tar reading error")?;
                    let mode = entry.header().mode().context("tar reading error")?;
                    write_file(&mut entry, &abs, mode, expected)?;
                }
                EntryType::Directory => {
                    if fs::metadata(&abs).is_err() {
                        create_dir(&abs)
                            .with_context(|| format!("Failed to create directory {}", abs.display()))?;
                    }
                }
                other => {
                    self.warnings.warn(&format!(
                        "tar file entry {} contained unsupported file type {:?}",
                        name, other
                    ));
                }
            }
        }

        Ok(())
    }
}

/// Turn a slash-separated archive path into a path relative to the destination root.
fn relative_entry_path(name: &str) -> Result<PathBuf> {
    let mut rel = PathBuf::new();
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => rel.push(part),
            Component::CurDir => {}
            Component::ParentDir | Component::RootDir | Component::Prefix(_) => {
                return Err(CollectError::UnsafeEntryPath { path: name.to_string() }.into());
            }
        }
    }
    Ok(rel)
}

fn write_file<R: Read>(content: &mut R, abs: &Path, mode: u32, expected: u64) -> Result<()> {
    let mut file = open_for_write(abs, mode)
        .with_context(|| format!("Failed to create {}", abs.display()))?;

    let copied = io::copy(content, &mut file);
    let closed = file.flush().and_then(|_| set_mode(&file, mode));
    drop(file);

    let written = match (copied, closed) {
        (Err(e), _) | (Ok(_), Err(e)) => {
            return Err(anyhow::Error::new(e).context(format!("error writing to {}", abs.display())));
        }
        (Ok(n), Ok(())) => n,
    };

    if written != expected {
        return Err(CollectError::SizeMismatch {
            path: abs.to_path_buf(),
            written,
            expected,
        }
        .into());
    }

    debug!("Unpacked {} ({} bytes)", abs.display(), written);
    Ok(())
}

#[cfg(unix)]
fn open_for_write(path: &Path, mode: u32) -> io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(true)
        .mode(mode)
        .open(path)
}

#[cfg(not(unix))]
fn open_for_write(path: &Path, _mode: u32) -> io::Result<File> {
    OpenOptions::new().create(true).write(true).truncate(true).open(path)
}

// Creation modes are filtered by the umask; the declared bits are applied afterwards.
#[cfg(unix)]
fn set_mode(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode & 0o7777))
}

#[cfg(not(unix))]
fn set_mode(_file: &File, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn create_dir(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    fs::DirBuilder::new().recursive(true).mode(0o755).create(path)
}

#[cfg(not(unix))]
fn create_dir(path: &Path) -> io::Result<()> {
    fs::create_dir_all(path)
}
