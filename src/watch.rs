//! Workbook file watcher
//!
//! Invalidates a workbook's cached results as soon as its file changes on
//! disk, instead of waiting for the next scheduled refresh.

use crate::dashboard::Dashboard;
use crate::error::{DashError, DashResult};
use notify::{RecommendedWatcher, RecursiveMode};
use notify_debouncer_mini::{new_debouncer, DebounceEventResult, DebouncedEventKind, Debouncer};
use std::collections::BTreeSet;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

const DEBOUNCE: Duration = Duration::from_millis(200);

/// Keeps the watch alive; dropping it stops the watcher thread.
pub struct WorkbookWatcher {
    _debouncer: Debouncer<RecommendedWatcher>,
    _worker: JoinHandle<()>,
    directories: Vec<PathBuf>,
}

impl WorkbookWatcher {
    pub fn directories(&self) -> &[PathBuf] {
        &self.directories
    }
}

/// Watch the directories holding every configured workbook
pub fn spawn(dashboard: Arc<Dashboard>) -> DashResult<WorkbookWatcher> {
    let targets: Vec<(PathBuf, OsString)> = dashboard
        .config()
        .workbooks
        .iter()
        .filter_map(|w| w.path.file_name().map(|name| (w.path.clone(), name.to_os_string())))
        .collect();

    let directories: BTreeSet<PathBuf> = targets
        .iter()
        .map(|(path, _)| watch_dir(path))
        .collect();

    let (tx, rx) = channel();
    let mut debouncer = new_debouncer(DEBOUNCE, tx)
        .map_err(|e| DashError::Config(format!("Failed to create file watcher: {}", e)))?;

    let mut watched = Vec::new();
    for dir in directories {
        if !dir.is_dir() {
            warn!(dir = %dir.display(), "Workbook directory missing, not watched");
            continue;
        }
        debouncer
            .watcher()
            .watch(&dir, RecursiveMode::NonRecursive)
            .map_err(|e| DashError::Config(format!("Failed to watch {}: {}", dir.display(), e)))?;
        info!(dir = %dir.display(), "Watching workbook directory");
        watched.push(dir);
    }

    let worker = thread::spawn(move || watch_loop(rx, &dashboard, &targets));

    Ok(WorkbookWatcher {
        _debouncer: debouncer,
        _worker: worker,
        directories: watched,
    })
}

fn watch_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

fn watch_loop(
    rx: Receiver<DebounceEventResult>,
    dashboard: &Dashboard,
    targets: &[(PathBuf, OsString)],
) {
    // Ends once the debouncer (and its sender) is dropped
    while let Ok(result) = rx.recv() {
        let events = match result {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "Watch error");
                continue;
            }
        };

        for event in events.iter().filter(|e| e.kind == DebouncedEventKind::Any) {
            let Some(name) = event.path.file_name() else {
                continue;
            };
            for (path, _) in targets.iter().filter(|(_, target)| target == name) {
                let removed = dashboard.invalidate_path(path);
                debug!(path = %path.display(), removed, "Workbook changed on disk");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_watch_dir_of_bare_file_name() {
        assert_eq!(watch_dir(Path::new("geral.xlsx")), PathBuf::from("."));
        assert_eq!(watch_dir(Path::new("data/geral.xlsx")), PathBuf::from("data"));
    }

    #[test]
    fn test_spawn_skips_missing_directories() {
        let dir = tempfile::TempDir::new().unwrap();
        let mut config = crate::config::DashboardConfig::default();
        config.workbooks[0].path = dir.path().join("geral.xlsx");
        config.workbooks[1].path = dir.path().join("missing").join("visa.xlsx");
        config.workbooks[2].path = dir.path().join("haccp.xlsx");
        let dashboard = Arc::new(Dashboard::new(config).unwrap());

        let watcher = spawn(dashboard).unwrap();
        assert_eq!(watcher.directories(), &[dir.path().to_path_buf()]);
    }
}
