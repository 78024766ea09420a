use std::io;
use std::path::Path;
use walkdir::WalkDir;

/// Totals produced by a directory walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DirUsage {
    pub files: i64,
    pub size: i64,
}

/// Computes the storage used below a home directory.
///
/// Implementations may block; callers run them on the blocking pool.
pub trait DirectoryWalker: Send + Sync {
    fn scan(&self, root: &Path) -> io::Result<DirUsage>;
}

/// Walks the local filesystem counting regular files. Symlinks are not
/// followed and do not count.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsWalker;

impl DirectoryWalker for FsWalker {
    fn scan(&self, root: &Path) -> io::Result<DirUsage> {
        let mut usage = DirUsage::default();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(io::Error::from)?;
            if !entry.file_type().is_file() {
                continue;
            }

            let len = entry.metadata().map_err(io::Error::from)?.len();
            usage.files += 1;
            usage.size = usage
                .size
                .saturating_add(i64::try_from(len).unwrap_or(i64::MAX));
        }

        Ok(usage)
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use std::sync::mpsc;
    use std::sync::Mutex;

    /// Blocks every scan until the test sends on the gate, then reports
    /// `usage`.
    pub(crate) struct GatedWalker {
        gate: Mutex<mpsc::Receiver<()>>,
        usage: DirUsage,
    }

    impl GatedWalker {
        pub(crate) fn new(usage: DirUsage) -> (Self, mpsc::Sender<()>) {
            let (tx, rx) = mpsc::channel();
            let walker = Self {
                gate: Mutex::new(rx),
                usage,
            };
            (walker, tx)
        }
    }

    impl DirectoryWalker for GatedWalker {
        fn scan(&self, _root: &Path) -> io::Result<DirUsage> {
            self.gate.lock().unwrap().recv().map_err(io::Error::other)?;
            Ok(self.usage)
        }
    }
}
