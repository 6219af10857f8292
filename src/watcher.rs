//! Change notifications for the listings page on disk.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::Context;
use notify::event::ModifyKind;
use notify::{Config, Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{info, warn};

/// Keeps the filesystem watch alive; dropping it stops notifications.
pub struct ChangeWatcher {
    _watcher: RecommendedWatcher,
}

impl ChangeWatcher {
    /// Watches the page's directory (so replaced files are still seen) and
    /// forwards one unit notification per structural change to the page.
    pub fn install(page: &Path) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<()>)> {
        let file_name = page
            .file_name()
            .map(|n| n.to_os_string())
            .with_context(|| format!("{} has no file name", page.display()))?;
        let dir = match page.parent() {
            Some(d) if !d.as_os_str().is_empty() => d.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if is_structural(&event.kind) && touches(&event, &file_name) => {
                    let _ = tx.send(());
                }
                Ok(_) => {}
                Err(e) => warn!(error = %e, "Page watcher error"),
            },
            Config::default(),
        )
        .context("creating page watcher")?;

        watcher
            .watch(&dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("watching {}", dir.display()))?;

        info!(page = %page.display(), "Watching listings page for changes");

        Ok((
            Self { _watcher: watcher },
            rx,
        ))
    }
}

/// Content changes only: reads and metadata updates are not mutations.
fn is_structural(kind: &EventKind) -> bool {
    match kind {
        EventKind::Modify(ModifyKind::Metadata(_)) => false,
        EventKind::Create(_) | EventKind::Modify(_) | EventKind::Remove(_) => true,
        _ => false,
    }
}

fn touches(event: &Event, file_name: &OsString) -> bool {
    event
        .paths
        .iter()
        .any(|p| p.file_name() == Some(file_name.as_os_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, DataChange, MetadataKind};
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn only_content_changes_count() {
        assert!(is_structural(&EventKind::Modify(ModifyKind::Data(DataChange::Any))));
        assert!(is_structural(&EventKind::Create(CreateKind::File)));
        assert!(!is_structural(&EventKind::Access(AccessKind::Read)));
        assert!(!is_structural(&EventKind::Modify(ModifyKind::Metadata(
            MetadataKind::AccessTime
        ))));
    }

    #[test]
    fn events_for_other_files_are_ignored() {
        let name = OsString::from("results.html");
        let ours = Event::new(EventKind::Any).add_path(PathBuf::from("/tmp/x/results.html"));
        let other = Event::new(EventKind::Any).add_path(PathBuf::from("/tmp/x/overlay.html"));

        assert!(touches(&ours, &name));
        assert!(!touches(&other, &name));
    }

    #[tokio::test]
    async fn rewriting_the_page_notifies() {
        let dir = TempDir::new().unwrap();
        let page = dir.path().join("results.html");
        std::fs::write(&page, "<ul class=\"result-list\"></ul>").unwrap();

        let (_watcher, mut rx) = ChangeWatcher::install(&page).unwrap();

        std::fs::write(&page, "<ul class=\"result-list\"><li></li></ul>").unwrap();

        let notified = tokio::time::timeout(Duration::from_secs(5), rx.recv()).await;
        assert_eq!(notified.unwrap(), Some(()));
    }
}
