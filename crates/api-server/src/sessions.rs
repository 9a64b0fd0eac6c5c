//! In-memory wizard session store.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use forge_core::config::StudioConfig;
use forge_core::types::CreativeDisplay;
use forge_genai::Backend;
use forge_pipeline::{Wizard, WizardSnapshot};
use tracing::info;
use uuid::Uuid;

/// One wizard session plus its presentation-layer view state.
pub struct Session {
    pub id: Uuid,
    pub wizard: Wizard,
    /// Display overlays keyed by creative id. View state only: never part
    /// of the creative entity, dropped when the creative is discarded.
    pub displays: DashMap<Uuid, CreativeDisplay>,
    pub created_at: DateTime<Utc>,
}

impl Session {
    /// Reconcile overlay view state with the current creative collection:
    /// drop overlays for discarded creatives and seed brand defaults for
    /// newly rendered ones.
    pub fn reconcile_displays(&self, snapshot: &WizardSnapshot) {
        let live: HashSet<Uuid> = snapshot.creatives.iter().map(|c| c.id).collect();
        self.displays.retain(|id, _| live.contains(id));

        if let Some(brand) = &snapshot.brand {
            for creative in &snapshot.creatives {
                self.displays
                    .entry(creative.id)
                    .or_insert_with(|| CreativeDisplay::for_brand(brand));
            }
        }
    }
}

/// Store of independent wizard sessions. Sessions live for the process
/// lifetime only; there is no persistence.
pub struct SessionStore {
    backend: Backend,
    studio: StudioConfig,
    sessions: DashMap<Uuid, Arc<Session>>,
}

impl SessionStore {
    pub fn new(backend: Backend, studio: StudioConfig) -> Self {
        Self {
            backend,
            studio,
            sessions: DashMap::new(),
        }
    }

    pub fn create(&self) -> Arc<Session> {
        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            wizard: Wizard::new(self.backend.clone(), self.studio.clone()),
            displays: DashMap::new(),
            created_at: Utc::now(),
        });
        self.sessions.insert(session.id, session.clone());
        info!(session_id = %session.id, "session created");
        session
    }

    pub fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.get(id).map(|entry| entry.clone())
    }

    /// Remove a session. Returns `true` if it existed.
    pub fn remove(&self, id: &Uuid) -> bool {
        self.sessions.remove(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
