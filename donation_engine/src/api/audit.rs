//! Fire-and-forget activity recording.
//!
//! Audit writes run on their own task, fed by a bounded channel. The [`AuditLogger`] handle never blocks and
//! never returns an error to its caller: a full channel, a dropped writer or a failed INSERT are logged and
//! swallowed. The audit trail is therefore structurally incapable of blocking or failing a financial
//! operation, which is the isolation boundary the ledger requires.

use log::*;
use tokio::sync::mpsc;

use crate::{db_types::NewActivityEntry, traits::AuditManagement};

/// Creates the logger handle and its writer. The caller spawns the writer onto the runtime:
/// ```nocompile
///     let (audit, writer) = new_audit_channel(db.clone(), 64);
///     tokio::spawn(writer.run());
/// ```
pub fn new_audit_channel<B: AuditManagement>(db: B, buffer_size: usize) -> (AuditLogger, AuditWriter<B>) {
    let (sender, receiver) = mpsc::channel(buffer_size);
    (AuditLogger { sender }, AuditWriter { db, receiver })
}

#[derive(Clone)]
pub struct AuditLogger {
    sender: mpsc::Sender<NewActivityEntry>,
}

impl AuditLogger {
    /// Hands the entry to the writer task without waiting. If the channel is full or the writer is gone, the
    /// entry is dropped with an error log entry.
    pub fn append(&self, entry: NewActivityEntry) {
        if let Err(e) = self.sender.try_send(entry) {
            error!("📬️ Activity entry dropped. The audit writer is saturated or gone. {e}");
        }
    }

    /// A logger whose entries are received and discarded. For tests and tooling that do not care about the
    /// audit trail. Requires a running tokio runtime.
    pub fn sink() -> Self {
        let (sender, mut receiver) = mpsc::channel::<NewActivityEntry>(16);
        tokio::spawn(async move { while receiver.recv().await.is_some() {} });
        Self { sender }
    }
}

pub struct AuditWriter<B> {
    db: B,
    receiver: mpsc::Receiver<NewActivityEntry>,
}

impl<B: AuditManagement> AuditWriter<B> {
    pub async fn run(mut self) {
        debug!("📬️ Audit writer started");
        while let Some(entry) = self.receiver.recv().await {
            trace!("📬️ Recording activity: {} on {}/{}", entry.action, entry.entity_type, entry.entity_id);
            if let Err(e) = self.db.append_activity(entry).await {
                error!("📬️ Could not record activity entry. The primary operation is unaffected. {e}");
            }
        }
        debug!("📬️ Audit writer shut down");
    }
}
