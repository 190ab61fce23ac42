use anyhow::{Context, Result, bail};
use bzip2::read::BzDecoder;
use flate2::read::GzDecoder;
use std::io::Read;
use std::path::{Component, Path, PathBuf};
use tar::{Archive, EntryType};

/// Compression of a recognised bundle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    Gzip,
    Bzip2,
}

impl Compression {
    /// Detect the compression from a bundle file name (`.tar.gz`, `.tgz`, `.tar.bz2`, `.tbz`)
    pub fn from_file_name(name: &str) -> Option<Self> {
        let lower = name.to_ascii_lowercase();
        if lower.ends_with(".tar.gz") || lower.ends_with(".tgz") {
            Some(Compression::Gzip)
        } else if lower.ends_with(".tar.bz2") || lower.ends_with(".tbz") {
            Some(Compression::Bzip2)
        } else {
            None
        }
    }

    fn decoder<'a, R: Read + 'a>(self, reader: R) -> Box<dyn Read + 'a> {
        match self {
            Compression::Gzip => Box::new(GzDecoder::new(reader)),
            Compression::Bzip2 => Box::new(BzDecoder::new(reader)),
        }
    }
}

/// Unpack every member of a compressed tar stream beneath `dest`
pub fn unpack<R: Read>(compression: Compression, reader: R, dest: &Path) -> Result<usize> {
    let mut archive = Archive::new(compression.decoder(reader));
    let mut count = 0;

    for entry in archive.entries().context("Failed to read archive")? {
        let mut entry = entry.context("Failed to read archive entry")?;
        let unpacked = entry
            .unpack_in(dest)
            .with_context(|| format!("Failed to unpack archive entry into {:?}", dest))?;
        if unpacked {
            count += 1;
        } else {
            log::warn!("Skipped archive entry outside of {:?}", dest);
        }
    }

    Ok(count)
}

/// Read a compressed tar stream into memory.
///
/// Directories come back with `None` contents.
pub fn read_entries<R: Read>(
    compression: Compression,
    reader: R,
) -> Result<Vec<(PathBuf, Option<Vec<u8>>)>> {
    let mut archive = Archive::new(compression.decoder(reader));
    let mut entries = Vec::new();

    for entry in archive.entries().context("Failed to read archive")? {
        let mut entry = entry.context("Failed to read archive entry")?;
        let path = entry.path().context("Invalid archive entry path")?.into_owned();

        if path
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            bail!("Archive entry escapes the destination: {:?}", path);
        }

        match entry.header().entry_type() {
            EntryType::Directory => entries.push((path, None)),
            _ => {
                let mut data = Vec::new();
                entry
                    .read_to_end(&mut data)
                    .with_context(|| format!("Failed to read archive entry {:?}", path))?;
                entries.push((path, Some(data)));
            }
        }
    }

    Ok(entries)
}
