//! Helpers for tests that read or write the configuration under `HOME`.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

static HOME_LOCK: Mutex<()> = Mutex::new(());
static HOME_COUNTER: AtomicUsize = AtomicUsize::new(0);

const HOME_VARS: [&str; 2] = ["HOME", "USERPROFILE"];

/// Run `func` with `HOME` and `USERPROFILE` pointing at a fresh, empty
/// directory. Calls are serialized, and the previous values come back even
/// when `func` panics.
pub fn with_isolated_home<F>(func: F)
where
    F: FnOnce(&Path),
{
    let _lock = HOME_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let home = IsolatedHome::enter();
    func(&home.path);
}

struct IsolatedHome {
    path: PathBuf,
    saved: Vec<(&'static str, Option<OsString>)>,
}

impl IsolatedHome {
    fn enter() -> Self {
        let id = HOME_COUNTER.fetch_add(1, Ordering::Relaxed);
        let path = std::env::temp_dir().join(format!("inkmark-home-{}-{id}", std::process::id()));
        fs::create_dir_all(&path).expect("create isolated home");

        let saved = HOME_VARS
            .iter()
            .map(|&key| (key, std::env::var_os(key)))
            .collect();
        for key in HOME_VARS {
            // SAFETY: every caller holds HOME_LOCK, and the value is a temp-dir
            // path without interior null bytes.
            unsafe { std::env::set_var(key, &path) };
        }

        Self { path, saved }
    }
}

impl Drop for IsolatedHome {
    fn drop(&mut self) {
        for (key, value) in self.saved.drain(..) {
            // SAFETY: HOME_LOCK is released only after this guard is dropped.
            unsafe {
                match value {
                    Some(value) => std::env::set_var(key, value),
                    None => std::env::remove_var(key),
                }
            }
        }
        let _ = fs::remove_dir_all(&self.path);
    }
}
