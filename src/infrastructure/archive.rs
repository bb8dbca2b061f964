//! Extraction of the executable from release archives

use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use flate2::read::GzDecoder;
use tar::Archive;
use tracing::debug;

/// Archive formats used by published releases.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    TarGz,
    Zip,
}

impl ArchiveFormat {
    /// Infer the format from an asset file name.
    pub fn from_name(name: &str) -> Option<Self> {
        if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
            Some(ArchiveFormat::TarGz)
        } else if name.ends_with(".zip") {
            Some(ArchiveFormat::Zip)
        } else {
            None
        }
    }
}

/// Extract the entry whose file name equals `executable` into `dest_dir`.
///
/// Directory components inside the archive are ignored.
pub fn extract_executable(
    data: &[u8],
    format: ArchiveFormat,
    executable: &str,
    dest_dir: &Path,
) -> io::Result<PathBuf> {
    let dest = dest_dir.join(executable);
    let found = match format {
        ArchiveFormat::TarGz => extract_from_tar_gz(data, executable, &dest)?,
        ArchiveFormat::Zip => extract_from_zip(data, executable, &dest)?,
    };
    if !found {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("executable '{executable}' not found in archive"),
        ));
    }
    debug!("extracted {} to {}", executable, dest.display());
    Ok(dest)
}

fn extract_from_tar_gz(data: &[u8], executable: &str, dest: &Path) -> io::Result<bool> {
    let mut archive = Archive::new(GzDecoder::new(data));
    for entry in archive.entries()? {
        let mut entry = entry?;
        let matches = entry
            .path()?
            .file_name()
            .is_some_and(|name| name == executable);
        if matches && entry.header().entry_type().is_file() {
            entry.unpack(dest)?;
            return Ok(true);
        }
    }
    Ok(false)
}

fn extract_from_zip(data: &[u8], executable: &str, dest: &Path) -> io::Result<bool> {
    let mut archive = zip::ZipArchive::new(Cursor::new(data)).map_err(io::Error::other)?;
    for index in 0..archive.len() {
        let mut file = archive.by_index(index).map_err(io::Error::other)?;
        let matches = file.is_file()
            && Path::new(file.name())
                .file_name()
                .is_some_and(|name| name == executable);
        if matches {
            let mut out = std::fs::File::create(dest)?;
            io::copy(&mut file, &mut out)?;
            return Ok(true);
        }
    }
    Ok(false)
}
