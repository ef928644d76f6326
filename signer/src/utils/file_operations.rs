use anyhow::Error;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tempfile::NamedTempFile;

#[cfg(unix)]
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt};

pub const PRIVATE_FILE_MODE: u32 = 0o600;
pub const PUBLIC_FILE_MODE: u32 = 0o644;
#[cfg(unix)]
const PRIVATE_DIR_MODE: u32 = 0o700;

/// `None` when the file does not exist.
pub fn read_trimmed(path: &Path) -> io::Result<Option<String>> {
    match fs::read_to_string(path) {
        Ok(contents) => Ok(Some(contents.trim().to_string())),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    }
}

/// Decodes a fixed size hex secret, with or without a `0x` prefix.
pub fn decode_hex_secret<const N: usize>(contents: &str) -> Result<[u8; N], Error> {
    let contents = contents.trim();
    let secret_bytes = hex::decode(contents.strip_prefix("0x").unwrap_or(contents))
        .map_err(|e| anyhow::anyhow!("Failed to decode hex string: {}", e))?;
    let secret_bytes: [u8; N] = secret_bytes.try_into().map_err(|e: Vec<u8>| {
        anyhow::anyhow!("Expected {} bytes, found {}", N, e.len())
    })?;
    Ok(secret_bytes)
}

/// Creates `dir` and its parents; the leaf is owner-only on unix.
pub fn ensure_private_dir(dir: &Path) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);
    #[cfg(unix)]
    builder.mode(PRIVATE_DIR_MODE);
    builder.create(dir)
}

/// Writes `contents` to a file that must not exist yet.
pub fn create_new_file(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    set_mode(&mut options, mode);
    let mut file = options.open(path)?;
    file.write_all(contents)?;
    file.sync_all()
}

/// Replaces `path` with `contents` through a fresh temporary file in the same
/// directory and a rename, so readers see either the old or the new contents.
pub fn write_atomically(path: &Path, contents: &[u8], mode: u32) -> io::Result<()> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("{} has no parent directory", path.display()),
            ))
        }
    };

    let temp = NamedTempFile::new_in(parent)?;
    set_file_mode(temp.as_file(), mode)?;
    let mut file = temp.as_file();
    file.write_all(contents)?;
    file.sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

#[cfg(unix)]
fn set_file_mode(file: &File, mode: u32) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    file.set_permissions(fs::Permissions::from_mode(mode))
}

#[cfg(not(unix))]
fn set_file_mode(_file: &File, _mode: u32) -> io::Result<()> {
    Ok(())
}

#[cfg(unix)]
fn set_mode(options: &mut OpenOptions, mode: u32) {
    options.mode(mode);
}

#[cfg(not(unix))]
fn set_mode(_options: &mut OpenOptions, _mode: u32) {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_trimmed_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(read_trimmed(&dir.path().join("missing")).unwrap(), None);
    }

    #[test]
    fn test_read_trimmed_strips_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("value");
        fs::write(&path, "  abcdef\n").unwrap();
        assert_eq!(read_trimmed(&path).unwrap().as_deref(), Some("abcdef"));
    }

    #[test]
    fn test_decode_hex_secret() {
        let secret: [u8; 2] = decode_hex_secret("0xabcd\n").unwrap();
        assert_eq!(secret, [0xab, 0xcd]);
        let secret: [u8; 2] = decode_hex_secret("ABCD").unwrap();
        assert_eq!(secret, [0xab, 0xcd]);

        assert!(decode_hex_secret::<2>("abc").is_err());
        assert!(decode_hex_secret::<2>("abcdef").is_err());
        assert!(decode_hex_secret::<2>("zzzz").is_err());
    }

    #[test]
    fn test_write_atomically_replaces_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state");
        write_atomically(&path, b"first", PRIVATE_FILE_MODE).unwrap();
        write_atomically(&path, b"second", PRIVATE_FILE_MODE).unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second");
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomically_ignores_planted_tmp_files() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prior-block-hash");
        let victim = dir.path().join("victim");
        fs::write(&victim, "precious").unwrap();
        symlink(&victim, dir.path().join("prior-block-hash.tmp")).unwrap();

        write_atomically(&path, b"newhash", PRIVATE_FILE_MODE).unwrap();

        assert_eq!(fs::read_to_string(&victim).unwrap(), "precious");
        assert_eq!(fs::read_to_string(&path).unwrap(), "newhash");
        let metadata = fs::symlink_metadata(&path).unwrap();
        assert!(metadata.file_type().is_file());
        assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[test]
    fn test_write_atomically_replaces_symlink_and_loose_mode() {
        use std::os::unix::fs::{symlink, PermissionsExt};

        let dir = tempfile::tempdir().unwrap();
        let victim = dir.path().join("victim");
        fs::write(&victim, "precious").unwrap();
        let linked = dir.path().join("linked");
        symlink(&victim, &linked).unwrap();

        write_atomically(&linked, b"newhash", PRIVATE_FILE_MODE).unwrap();
        assert_eq!(fs::read_to_string(&victim).unwrap(), "precious");
        assert!(fs::symlink_metadata(&linked).unwrap().file_type().is_file());

        let loose = dir.path().join("loose");
        fs::write(&loose, "old").unwrap();
        fs::set_permissions(&loose, fs::Permissions::from_mode(0o666)).unwrap();
        write_atomically(&loose, b"new", PRIVATE_FILE_MODE).unwrap();
        let mode = fs::metadata(&loose).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);

        let public = dir.path().join("public-key");
        write_atomically(&public, b"04ab", PUBLIC_FILE_MODE).unwrap();
        let mode = fs::metadata(&public).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_create_new_file_refuses_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("key");
        create_new_file(&path, b"one", PRIVATE_FILE_MODE).unwrap();

        let err = create_new_file(&path, b"two", PRIVATE_FILE_MODE).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AlreadyExists);
        assert_eq!(fs::read_to_string(&path).unwrap(), "one");
    }

    #[cfg(unix)]
    #[test]
    fn test_private_modes() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("a").join("b");
        ensure_private_dir(&data_dir).unwrap();
        let mode = fs::metadata(&data_dir).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o700);

        let path = data_dir.join("key");
        create_new_file(&path, b"secret", PRIVATE_FILE_MODE).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }
}
