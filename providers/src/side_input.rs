//! Read-only JSON side-inputs (§6 "Persistent state layout", §9
//! "Honeypot / token-list providers", SPEC_FULL §4): files maintained by
//! something outside the core, re-read only when their mtime changes —
//! the same spirit as the teacher's `abigen!`-from-JSON pattern, just at
//! runtime instead of build time.

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::SystemTime;

struct Cached<T> {
    value: T,
    loaded_mtime: Option<SystemTime>,
}

pub struct RefreshingJson<T> {
    path: PathBuf,
    default: fn() -> T,
    cache: Mutex<Option<Cached<T>>>,
}

impl<T: DeserializeOwned + Clone> RefreshingJson<T> {
    pub fn new(path: impl Into<PathBuf>, default: fn() -> T) -> Self {
        Self {
            path: path.into(),
            default,
            cache: Mutex::new(None),
        }
    }

    fn mtime(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path).ok()?.modified().ok()
    }

    fn load(&self) -> Result<T> {
        if !self.path.exists() {
            return Ok((self.default)());
        }
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("reading side input {}", self.path.display()))?;
        serde_json::from_slice(&bytes)
            .with_context(|| format!("parsing side input {}", self.path.display()))
    }

    /// Returns the current value, re-reading the file if its mtime has
    /// advanced since the last read (or on first use).
    pub fn get(&self) -> Result<T> {
        let current_mtime = self.mtime();
        let mut guard = self.cache.lock().expect("side input cache poisoned");
        let needs_reload = match guard.as_ref() {
            Some(cached) => cached.loaded_mtime != current_mtime,
            None => true,
        };
        if needs_reload {
            let value = self.load()?;
            *guard = Some(Cached {
                value: value.clone(),
                loaded_mtime: current_mtime,
            });
            return Ok(value);
        }
        Ok(guard.as_ref().expect("checked Some above").value.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn reloads_on_mtime_change() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.json");
        std::fs::write(&path, b"[1,2,3]").unwrap();
        let side_input: RefreshingJson<Vec<i32>> = RefreshingJson::new(&path, Vec::new);
        assert_eq!(side_input.get().unwrap(), vec![1, 2, 3]);

        std::thread::sleep(std::time::Duration::from_millis(10));
        let mut file = std::fs::OpenOptions::new().write(true).truncate(true).open(&path).unwrap();
        file.write_all(b"[4,5]").unwrap();
        drop(file);
        // Force an mtime bump on filesystems with coarse resolution.
        let now = SystemTime::now() + std::time::Duration::from_secs(1);
        filetime::set_file_mtime(&path, filetime::FileTime::from_system_time(now)).ok();

        assert_eq!(side_input.get().unwrap(), vec![4, 5]);
    }

    #[test]
    fn missing_file_returns_default() {
        let side_input: RefreshingJson<Vec<i32>> = RefreshingJson::new("/nonexistent/path.json", Vec::new);
        assert_eq!(side_input.get().unwrap(), Vec::<i32>::new());
    }
}
