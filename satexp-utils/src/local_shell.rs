//! File system helpers used to lay out experiment directories.

use std::{fs, io, path::Path};

/// Remove a file or directory including its content. A non-existing path is not an error.
pub fn remove_force_recursive(path: impl AsRef<Path>) -> io::Result<()> {
    let path = path.as_ref();
    let result = if path.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };
    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        x => x,
    }
}

/// Create a directory and all of its parents.
pub fn make_full_dir(path: impl AsRef<Path>) -> io::Result<()> {
    fs::create_dir_all(path)
}

/// Remove `path` (if present) and create it again as an empty directory.
pub fn recreate_dir(path: impl AsRef<Path>) -> io::Result<()> {
    remove_force_recursive(path.as_ref())?;
    make_full_dir(path)
}

/// Copy a single file, overwriting the target.
pub fn copy_file(from: impl AsRef<Path>, to: impl AsRef<Path>) -> io::Result<()> {
    fs::copy(from, to).map(|_| ())
}

/// Replace every occurrence of `pattern` (taken literally) in the file at `path`.
pub fn replace_in_file_plain(
    path: impl AsRef<Path>,
    pattern: impl AsRef<str>,
    replacement: impl AsRef<str>,
) -> io::Result<()> {
    replace_all_in_file_plain(path, [(pattern, replacement)])
}

/// Apply multiple literal replacements to the file at `path`, in the given order, writing the
/// file only once.
pub fn replace_all_in_file_plain<P, R>(
    path: impl AsRef<Path>,
    replacements: impl IntoIterator<Item = (P, R)>,
) -> io::Result<()>
where
    P: AsRef<str>,
    R: AsRef<str>,
{
    let path = path.as_ref();
    let mut content = fs::read_to_string(path)?;
    for (pattern, replacement) in replacements {
        content = content.replace(pattern.as_ref(), replacement.as_ref());
    }
    fs::write(path, content)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn remove_and_recreate() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("runs/a/logs_ns3");
        make_full_dir(&nested).unwrap();
        fs::write(nested.join("console.txt"), "old").unwrap();

        recreate_dir(&nested).unwrap();
        assert!(nested.is_dir());
        assert_eq!(fs::read_dir(&nested).unwrap().count(), 0);

        remove_force_recursive(dir.path().join("runs")).unwrap();
        assert!(!dir.path().join("runs").exists());
        // removing again is fine
        remove_force_recursive(dir.path().join("runs")).unwrap();
    }

    #[test]
    fn replace_plain() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("config.properties");
        fs::write(&file, "a=[A]\nb=[B]\nc=[A]\n").unwrap();

        replace_in_file_plain(&file, "[A]", "1.5").unwrap();
        replace_all_in_file_plain(&file, [("[B]", "x"), ("[C]", "y")]).unwrap();
        assert_eq!(fs::read_to_string(&file).unwrap(), "a=1.5\nb=x\nc=1.5\n");
    }
}
