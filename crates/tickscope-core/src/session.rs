//! One visualization session: the reconciler, its registries, and the tick readout.

use tracing::{debug, error, warn};

use crate::config::ScopeConfig;
use crate::error::{ConfigError, DecodeError, RegistryError};
use crate::reconcile::{ReconcileReport, Reconciler};
use crate::snapshot::WorldSnapshot;
use crate::surface::DrawingSurface;

#[derive(Debug)]
pub enum MessageOutcome {
    Applied(ReconcileReport),
    /// The message could not be decoded; nothing changed.
    Dropped(DecodeError),
    /// The reconciler refused the snapshot part-way through.
    Rejected(RegistryError),
}

impl MessageOutcome {
    pub fn report(&self) -> Option<&ReconcileReport> {
        match self {
            MessageOutcome::Applied(report) => Some(report),
            MessageOutcome::Dropped(_) | MessageOutcome::Rejected(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionStats {
    pub messages_applied: u64,
    pub messages_dropped: u64,
    pub entries_ignored: u64,
}

/// Owns all scene state for one stream connection. Messages must be fed in arrival order, one at
/// a time.
#[derive(Debug)]
pub struct Session {
    reconciler: Reconciler,
    tick: Option<u64>,
    stats: SessionStats,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Reconciler::default())
    }
}

impl Session {
    pub fn new(reconciler: Reconciler) -> Self {
        Self {
            reconciler,
            tick: None,
            stats: SessionStats::default(),
        }
    }

    pub fn from_config(config: &ScopeConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(Reconciler::from_config(config)?))
    }

    pub fn reconciler(&self) -> &Reconciler {
        &self.reconciler
    }

    /// Latest applied tick; `None` until the first valid message.
    pub fn tick(&self) -> Option<u64> {
        self.tick
    }

    pub fn tick_label(&self) -> String {
        match self.tick {
            Some(tick) => format!("tick {tick}"),
            None => "tick -".to_string(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Decodes and reconciles one raw message. Decode failures drop the message and leave the
    /// scene untouched.
    pub fn handle_message(
        &mut self,
        text: &str,
        surface: &mut dyn DrawingSurface,
    ) -> MessageOutcome {
        let snapshot = match WorldSnapshot::decode(text) {
            Ok(snapshot) => snapshot,
            Err(err) => {
                self.stats.messages_dropped += 1;
                warn!(error = %err, bytes = text.len(), "dropping state message");
                return MessageOutcome::Dropped(err);
            }
        };

        match self.handle_snapshot(&snapshot, surface) {
            Ok(report) => MessageOutcome::Applied(report),
            Err(err) => {
                error!(error = %err, tick = snapshot.tick, "reconciliation failed");
                MessageOutcome::Rejected(err)
            }
        }
    }

    pub fn handle_snapshot(
        &mut self,
        snapshot: &WorldSnapshot,
        surface: &mut dyn DrawingSurface,
    ) -> Result<ReconcileReport, RegistryError> {
        let report = self.reconciler.apply(snapshot, surface)?;
        self.tick = Some(snapshot.tick);
        self.stats.messages_applied += 1;
        self.stats.entries_ignored += report.entries_ignored as u64;
        if report.entries_ignored > 0 {
            debug!(tick = report.tick, ignored = report.entries_ignored, "ignored entries");
        }
        debug!(
            tick = report.tick,
            created = report.agents_created,
            updated = report.agents_updated,
            obstacles = report.obstacles_created,
            retired = report.retired,
            "snapshot reconciled"
        );
        Ok(report)
    }
}
