use std::fs::{File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lock file inside the data directory. It is created once and never
/// removed: the flock, not the file's existence, is the lock.
pub const LOCK_FILE: &str = ".lock";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Exclusive advisory lock serializing writers of one board.
///
/// Held across load → mutate → save so that two `wb` processes never
/// interleave their read-modify-write of the snapshot. Dropping the guard
/// closes the handle, which releases the flock.
#[derive(Debug)]
pub struct BoardLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    OpenError { path: PathBuf, source: io::Error },
    #[error("could not lock {path}: {source}")]
    FlockError { path: PathBuf, source: io::Error },
    #[error("timed out waiting for {path}: another wb process is writing this board")]
    Timeout { path: PathBuf },
}

impl BoardLock {
    /// Try once. `Ok(None)` means another process holds the lock.
    pub fn try_acquire(data_dir: &Path) -> Result<Option<Self>, LockError> {
        let path = data_dir.join(LOCK_FILE);
        let file = open_lock_file(&path)?;
        match try_flock(&file) {
            Ok(()) => Ok(Some(BoardLock { _file: file, path })),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(None),
            Err(source) => Err(LockError::FlockError { path, source }),
        }
    }

    /// Poll until the lock is free or `timeout` passes.
    pub fn acquire(data_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(lock) = Self::try_acquire(data_dir)? {
                return Ok(lock);
            }
            if Instant::now() >= deadline {
                return Err(LockError::Timeout {
                    path: data_dir.join(LOCK_FILE),
                });
            }
            std::thread::sleep(POLL_INTERVAL);
        }
    }

    /// Acquire with the default timeout (5 seconds)
    pub fn acquire_default(data_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(data_dir, Duration::from_secs(5))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn open_lock_file(path: &Path) -> Result<File, LockError> {
    OpenOptions::new()
        .create(true)
        .write(true)
        .truncate(false)
        .open(path)
        .map_err(|source| LockError::OpenError {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(unix)]
fn try_flock(file: &File) -> io::Result<()> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_flock(_file: &File) -> io::Result<()> {
    Ok(())
}
