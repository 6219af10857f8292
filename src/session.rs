use std::future;

use anyhow::Context;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::controls::{ControlBar, ControlCommand, TOOLBAR_ID};
use crate::overlay::models::{Parameters, RunSummary};
use crate::overlay::OverlayEngine;
use crate::page::HtmlPage;
use crate::scheduler::Debouncer;
use crate::settings::{KeyValueStore, Settings};
use crate::watcher::ChangeWatcher;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SessionStats {
    pub runs: usize,
    pub rescans: usize,
}

enum Flow {
    Continue,
    Stop,
}

/// One loaded result page with its control bar, settings and overlays.
pub struct Session<S> {
    cfg: Config,
    engine: OverlayEngine,
    settings: Settings<S>,
    page: HtmlPage,
    toolbar: ControlBar,
    stats: SessionStats,
}

impl<S: KeyValueStore> Session<S> {
    /// Page load: read persisted parameters, mount the control bar and run
    /// the engine once.
    pub async fn open(cfg: Config, store: S) -> anyhow::Result<Self> {
        let page = HtmlPage::load(&cfg.listings_page).await?;
        let settings = Settings::new(store);
        let stored = settings.load().await?;
        let params = stored.to_parameters()?;

        info!(
            interest_rate = stored.interest_rate,
            clearance_rate = stored.clearance_rate,
            factor = stored.factor,
            "Loaded parameters"
        );

        let mut session = Self {
            engine: OverlayEngine::new(cfg.markup()),
            toolbar: ControlBar::new(&stored),
            cfg,
            settings,
            page,
            stats: SessionStats::default(),
        };
        session.render(&params).await?;

        Ok(session)
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Installs the page watcher unless disabled or the page has no
    /// listings container.
    pub fn install_watcher(&self) -> anyhow::Result<Option<(ChangeWatcher, mpsc::UnboundedReceiver<()>)>> {
        if !self.cfg.watch_page {
            info!("Page watching disabled");
            return Ok(None);
        }
        if !self.engine.has_container(&self.page)? {
            info!("No listings container on page, change watcher not installed");
            return Ok(None);
        }

        ChangeWatcher::install(&self.cfg.listings_page).map(Some)
    }

    /// Event loop: page changes are debounced into rescans, command lines
    /// edit the control bar. Ends on `quit`, Ctrl-C, or when neither source
    /// is left.
    pub async fn run<R>(
        mut self,
        mut notifications: Option<mpsc::UnboundedReceiver<()>>,
        commands: R,
    ) -> anyhow::Result<SessionStats>
    where
        R: AsyncBufRead + Unpin,
    {
        let mut debouncer = Debouncer::new(self.cfg.quiet_window);
        let mut lines = commands.lines();
        let mut commands_open = true;

        let shutdown = tokio::signal::ctrl_c();
        tokio::pin!(shutdown);

        loop {
            if !commands_open && notifications.is_none() && !debouncer.is_pending() {
                break;
            }

            tokio::select! {
                notice = next_notification(&mut notifications) => match notice {
                    Some(()) => {
                        debug!("Listings page changed");
                        debouncer.trigger();
                    }
                    None => notifications = None,
                },
                _ = debouncer.fired() => {
                    info!("Listings page changed, updating overlays");
                    if let Err(e) = self.rescan().await {
                        error!(error = %e, "Failed to rescan page");
                    }
                }
                line = lines.next_line(), if commands_open => match line {
                    Ok(Some(line)) if line.trim().is_empty() => {}
                    Ok(Some(line)) => match line.parse::<ControlCommand>() {
                        Ok(command) => match self.apply(command).await {
                            Ok(Flow::Continue) => {}
                            Ok(Flow::Stop) => break,
                            Err(e) => error!(error = %e, "Command failed"),
                        },
                        Err(e) => warn!(error = %e, "Ignoring command"),
                    },
                    Ok(None) => commands_open = false,
                    Err(e) => {
                        warn!(error = %e, "Command input failed");
                        commands_open = false;
                    }
                },
                _ = &mut shutdown => {
                    info!("Interrupted");
                    break;
                }
            }
        }

        Ok(self.stats)
    }

    /// Watcher path: reload the page and re-read parameters from storage.
    pub async fn rescan(&mut self) -> anyhow::Result<RunSummary> {
        self.page = HtmlPage::load(&self.cfg.listings_page).await?;
        let params = self.settings.load().await?.to_parameters()?;

        let summary = self.render(&params).await?;
        self.stats.rescans += 1;
        Ok(summary)
    }

    async fn apply(&mut self, command: ControlCommand) -> anyhow::Result<Flow> {
        match command {
            ControlCommand::Set(field, raw) => {
                debug!(field = field.key(), value = %raw, "Input changed");
                self.toolbar.set_input(field, &raw);
            }
            ControlCommand::Update => match self.toolbar.submit() {
                Ok((stored, params)) => {
                    self.settings.save(&stored).await?;
                    info!(
                        interest_rate = stored.interest_rate,
                        clearance_rate = stored.clearance_rate,
                        factor = stored.factor,
                        "Saved parameters"
                    );
                    self.render(&params).await?;
                }
                Err(e) => warn!(error = %e, "Update rejected"),
            },
            ControlCommand::Show => {
                for input in self.toolbar.inputs() {
                    println!("{}: {}", input.field.label(), input.value);
                }
                println!("runs: {}, rescans: {}", self.stats.runs, self.stats.rescans);
            }
            ControlCommand::Quit => return Ok(Flow::Stop),
        }

        Ok(Flow::Continue)
    }

    /// Remounts the control bar, recomputes every overlay and writes the page out.
    async fn render(&mut self, params: &Parameters) -> anyhow::Result<RunSummary> {
        self.page.remove_all(&format!("#{TOOLBAR_ID}"), None)?;
        self.page.append_to_body(&self.toolbar.to_html())?;

        let summary = self.engine.run(&mut self.page, params)?;

        tokio::fs::write(&self.cfg.output_path, self.page.to_html())
            .await
            .with_context(|| format!("writing {}", self.cfg.output_path.display()))?;

        self.stats.runs += 1;
        Ok(summary)
    }
}

async fn next_notification(rx: &mut Option<mpsc::UnboundedReceiver<()>>) -> Option<()> {
    match rx {
        Some(rx) => rx.recv().await,
        None => future::pending().await,
    }
}
