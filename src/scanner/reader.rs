//! Scoped read-only memory mapping of candidate files.
//!
//! # Overview
//!
//! [`with_mapped`] opens a file, maps it, hands the bytes to a closure and
//! unmaps before returning. The mapping never outlives the call, so at most
//! one mapping per worker thread is alive at any time.
//!
//! # Example
//!
//! ```no_run
//! use neardupe::scanner::reader::with_mapped;
//! use std::path::Path;
//!
//! let (len, size) = with_mapped(Path::new("some.bin"), |bytes| bytes.len()).unwrap();
//! assert_eq!(len as u64, size);
//! ```

use std::fs::File;
use std::io::ErrorKind;
use std::path::Path;

use memmap2::Mmap;

use super::ReadError;

/// Map `path` read-only and run `f` over its bytes.
///
/// Returns the closure's result together with the file length observed when
/// the file was opened. Empty files are passed as an empty slice without
/// mapping.
///
/// # Errors
///
/// Returns [`ReadError`] if the file cannot be opened, stat-ed or mapped.
pub fn with_mapped<T>(path: &Path, f: impl FnOnce(&[u8]) -> T) -> Result<(T, u64), ReadError> {
    let file = File::open(path).map_err(|e| open_error(path, e))?;
    let size = file
        .metadata()
        .map_err(|source| ReadError::Stat {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    if size == 0 {
        return Ok((f(&[]), 0));
    }

    // SAFETY: the mapping is read-only and private to this call. Another
    // process truncating the file while it is mapped can still fault; that
    // risk is inherent to memory-mapped reads.
    let mmap = unsafe { Mmap::map(&file) }.map_err(|source| ReadError::Map {
        path: path.to_path_buf(),
        source,
    })?;

    let result = f(&mmap);
    drop(mmap);
    log::trace!("Unmapped {} ({} bytes)", path.display(), size);

    Ok((result, size))
}

fn open_error(path: &Path, error: std::io::Error) -> ReadError {
    match error.kind() {
        ErrorKind::NotFound => ReadError::NotFound(path.to_path_buf()),
        ErrorKind::PermissionDenied => ReadError::PermissionDenied(path.to_path_buf()),
        _ => ReadError::Io {
            path: path.to_path_buf(),
            source: error,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_maps_file_contents() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("data.bin");
        fs::write(&path, b"mapped bytes").unwrap();

        let (copy, size) = with_mapped(&path, <[u8]>::to_vec).unwrap();
        assert_eq!(copy, b"mapped bytes");
        assert_eq!(size, 12);
    }

    #[test]
    fn test_empty_file_is_empty_slice() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("empty.bin");
        fs::write(&path, b"").unwrap();

        let (len, size) = with_mapped(&path, <[u8]>::len).unwrap();
        assert_eq!(len, 0);
        assert_eq!(size, 0);
    }

    #[test]
    fn test_missing_file_is_not_found() {
        let result = with_mapped(Path::new("/nonexistent/neardupe/file.bin"), |_| ());
        assert!(matches!(result, Err(ReadError::NotFound(_))));
    }
}
