//! Terminal rendering of the purchase flow.
//!
//! Rendering is split from printing: [`StatusView`] and [`NoticeView`]
//! implement `Display`, and only [`Terminal`] touches stdout.

use std::fmt;
use std::io::{self, Write};

use crate::services::{ControllerSnapshot, Notice, Phase, Severity};

const BAR_WIDTH: usize = 20;

/// Status block for one controller snapshot.
#[derive(Debug, Clone, Copy)]
pub struct StatusView<'a> {
    snapshot: &'a ControllerSnapshot,
    purchases: u64,
}

impl<'a> StatusView<'a> {
    /// `purchases` is the number of successful purchases this session.
    #[must_use]
    pub const fn new(snapshot: &'a ControllerSnapshot, purchases: u64) -> Self {
        Self {
            snapshot,
            purchases,
        }
    }
}

impl fmt::Display for StatusView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Client: {}...", self.snapshot.identity.short())?;

        match self.snapshot.phase {
            Phase::Ready => writeln!(f, "[Enter] Buy corn   [q] Quit")?,
            Phase::InFlight => writeln!(f, "Buying...")?,
            Phase::Cooldown => {
                let cooldown = self.snapshot.cooldown;
                writeln!(
                    f,
                    "Wait {}s [{}] {}%",
                    cooldown.remaining_seconds(),
                    progress_bar(self.snapshot.progress(), BAR_WIDTH),
                    percent(self.snapshot.progress())
                )?;
            }
        }

        if let Some(bought_at) = self.snapshot.last_attempt.and_then(|log| log.bought_at()) {
            writeln!(f, "Last purchase: {}", bought_at.format("%Y-%m-%d %H:%M:%S UTC"))?;
        }

        write!(f, "Purchased this session: {}", self.purchases)
    }
}

/// One notice line, prefixed by its severity.
#[derive(Debug, Clone, Copy)]
pub struct NoticeView<'a>(pub &'a Notice);

impl fmt::Display for NoticeView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self.0.severity() {
            Severity::Success => "[ok]",
            Severity::Info => "[info]",
            Severity::Error => "[error]",
        };
        write!(f, "{tag} {}", self.0)
    }
}

/// Render `progress` (clamped to `[0, 1]`) as a fixed-width bar.
#[must_use]
pub fn progress_bar(progress: f64, width: usize) -> String {
    let filled = filled_cells(progress, width);
    let mut bar = "#".repeat(filled);
    bar.push_str(&".".repeat(width - filled));
    bar
}

#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
fn filled_cells(progress: f64, width: usize) -> usize {
    let cells = (progress.clamp(0.0, 1.0) * width as f64).round() as usize;
    cells.min(width)
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn percent(progress: f64) -> u8 {
    (progress.clamp(0.0, 1.0) * 100.0).round() as u8
}

/// Stdout sink for status blocks and notices.
#[derive(Debug, Default)]
pub struct Terminal {
    last_status: Option<String>,
}

impl Terminal {
    /// Terminal writing to stdout.
    #[must_use]
    pub const fn new() -> Self {
        Self { last_status: None }
    }

    /// Print the status block unless it is unchanged since the last call.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be written.
    pub fn status(&mut self, view: &StatusView<'_>) -> io::Result<()> {
        let rendered = view.to_string();
        if self.last_status.as_deref() == Some(rendered.as_str()) {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        writeln!(out, "\n{rendered}")?;
        out.flush()?;
        self.last_status = Some(rendered);
        Ok(())
    }

    /// Print a notice.
    ///
    /// # Errors
    ///
    /// Returns an error if stdout cannot be written.
    pub fn notice(&mut self, notice: &Notice) -> io::Result<()> {
        let mut out = io::stdout().lock();
        writeln!(out, "{}", NoticeView(notice))?;
        out.flush()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use bobs_corn_core::{AttemptLog, ClientIdentity, CooldownState, PurchaseOutcome};
    use chrono::DateTime;

    fn snapshot(phase: Phase, cooldown: CooldownState) -> ControllerSnapshot {
        ControllerSnapshot {
            phase,
            cooldown,
            last_attempt: None,
            identity: ClientIdentity::parse("3f2b9c1e-4d5a-4b6c-8d7e-0123456789ab").unwrap(),
        }
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(0.0, 4), "....");
        assert_eq!(progress_bar(0.5, 4), "##..");
        assert_eq!(progress_bar(1.0, 4), "####");
        assert_eq!(progress_bar(7.0, 4), "####");
        assert_eq!(progress_bar(-1.0, 4), "....");
    }

    #[test]
    fn test_ready_status_shows_identity_hint() {
        let snap = snapshot(Phase::Ready, CooldownState::idle());
        let rendered = StatusView::new(&snap, 0).to_string();
        assert!(rendered.contains("Client: 3f2b9c1e..."));
        assert!(!rendered.contains("4d5a"));
        assert!(rendered.contains("[Enter] Buy corn"));
        assert!(rendered.ends_with("Purchased this session: 0"));
    }

    #[test]
    fn test_cooldown_status_shows_wait_and_percent() {
        let mut cooldown = CooldownState::idle();
        cooldown.start(40);
        for _ in 0..10 {
            cooldown.tick();
        }
        let snap = snapshot(Phase::Cooldown, cooldown);
        let rendered = StatusView::new(&snap, 1).to_string();
        assert!(rendered.contains("Wait 30s [#####...............] 25%"));
    }

    #[test]
    fn test_last_purchase_time_shown_after_success() {
        let bought_at = DateTime::from_timestamp_millis(1_700_000_000_000).unwrap();
        let mut snap = snapshot(Phase::Ready, CooldownState::idle());
        snap.last_attempt = Some(AttemptLog::new(1, PurchaseOutcome::Success { bought_at }));

        let rendered = StatusView::new(&snap, 1).to_string();
        assert!(rendered.contains("Last purchase: 2023-11-14 22:13:20 UTC"));
    }

    #[test]
    fn test_notice_tagged_by_severity() {
        assert!(
            NoticeView(&Notice::NetworkFailure)
                .to_string()
                .starts_with("[error] ")
        );
        assert!(NoticeView(&Notice::Busy).to_string().starts_with("[info] "));
    }
}
