// src/scan/hash.rs

use std::io::{self, Read};
use std::path::Path;

use blake3::Hasher;

use crate::fs::FileSystem;

/// Compute the `blake3` hex digest of a single file.
pub fn compute_file_hash(fs: &dyn FileSystem, path: &Path) -> io::Result<String> {
    let mut hasher = Hasher::new();
    let mut file = fs.open_read(path)?;
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(hasher.finalize().to_hex().to_string())
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::fs::mock::MockFileSystem;

    #[test]
    fn hashes_mock_file_contents() {
        let fs = MockFileSystem::new();
        fs.add_file("test.txt", b"hello world".to_vec());

        let hash = compute_file_hash(&fs, &PathBuf::from("test.txt")).unwrap();
        // blake3 hash of "hello world"
        assert_eq!(
            hash,
            "d74981efa70a0c880b8d8c1985d075dbcbf679b99a5f9914e5aaf96b831a9e24"
        );
    }

    #[test]
    fn missing_file_is_not_found() {
        let fs = MockFileSystem::new();
        let err = compute_file_hash(&fs, Path::new("nope")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
