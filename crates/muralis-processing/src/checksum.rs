//! File digests recorded on the asset descriptor.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, BufReader};
use std::path::Path;

/// SHA-256 of the file at `path`, as lowercase hex.
///
/// The file is streamed, never loaded whole.
pub fn checksum(path: &Path) -> io::Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Like [`checksum`], but a failure is logged and yields `None`.
pub fn checksum_best_effort(path: &Path) -> Option<String> {
    match checksum(path) {
        Ok(digest) => Some(digest),
        Err(e) => {
            tracing::warn!(
                error = %e,
                path = %path.display(),
                "Checksum unavailable, continuing without it"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("abc.txt");
        std::fs::write(&path, b"abc").unwrap();

        assert_eq!(
            checksum(&path).unwrap(),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_same_bytes_same_digest() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.bin");
        let b = dir.path().join("b.bin");
        let data: Vec<u8> = (0..100_000u32).map(|i| (i % 251) as u8).collect();
        std::fs::write(&a, &data).unwrap();
        std::fs::write(&b, &data).unwrap();

        assert_eq!(checksum(&a).unwrap(), checksum(&b).unwrap());

        std::fs::write(&b, &data[1..]).unwrap();
        assert_ne!(checksum(&a).unwrap(), checksum(&b).unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing");
        assert!(checksum(&path).is_err());
        assert_eq!(checksum_best_effort(&path), None);
    }
}
