//! Advisory lock held for the life of the process. Send sessions live in
//! memory, so a second dispatcher on the same database would find the first
//! one's Sending campaigns without a session and fail them.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::mpsc;
use std::thread;

/// Errors raised while taking the database lock.
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("Another mailgo instance is already dispatching from this database. Stop it first or use a different DATABASE_URL.")]
    Held,
    #[error("DATABASE_URL: {0}")]
    Url(String),
    #[error("Lock file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("lock thread exited before reporting")]
    Thread,
}

/// `<db file>.lock` next to the database. In-memory databases need no lock.
pub fn lock_path(url: &str) -> Result<Option<PathBuf>, LockError> {
    if url.contains(":memory:") {
        return Ok(None);
    }

    let options = sqlx::sqlite::SqliteConnectOptions::from_str(url).map_err(|e| LockError::Url(e.to_string()))?;
    let db_file = options.get_filename();
    if db_file.as_os_str().is_empty() {
        return Ok(None);
    }

    let name = db_file
        .file_name()
        .map(|n| format!("{}.lock", n.to_string_lossy()))
        .unwrap_or_else(|| "mailgo.lock".to_string());

    Ok(Some(match db_file.parent() {
        Some(dir) if dir != Path::new("") => dir.join(name),
        _ => PathBuf::from(name),
    }))
}

/// Take the lock, or fail with `LockError::Held` if another process has it.
pub fn acquire(url: &str) -> Result<Option<DispatchLock>, LockError> {
    let Some(path) = lock_path(url)? else {
        return Ok(None);
    };

    let file = std::fs::OpenOptions::new()
        .create(true)
        .truncate(false)
        .write(true)
        .open(&path)
        .map_err(|source| LockError::Io {
            path: path.display().to_string(),
            source,
        })?;

    // fd_lock guards borrow the lock, so a dedicated thread owns both until release.
    let (result_tx, result_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel::<()>();
    let join = thread::spawn(move || {
        let mut lock = fd_lock::RwLock::new(file);
        let outcome = lock.try_write();
        match outcome {
            Ok(_guard) => {
                let _ = result_tx.send(Ok(()));
                let _ = release_rx.recv();
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                let _ = result_tx.send(Err(LockError::Held));
            }
            Err(source) => {
                let _ = result_tx.send(Err(LockError::Io {
                    path: path.display().to_string(),
                    source,
                }));
            }
        };
    });

    result_rx.recv().map_err(|_| LockError::Thread)??;

    Ok(Some(DispatchLock {
        release_tx,
        join: Some(join),
    }))
}

/// Releases the lock on drop.
pub struct DispatchLock {
    release_tx: mpsc::Sender<()>,
    join: Option<thread::JoinHandle<()>>,
}

impl Drop for DispatchLock {
    fn drop(&mut self) {
        let _ = self.release_tx.send(());
        if let Some(handle) = self.join.take() {
            let _ = handle.join();
        }
    }
}
