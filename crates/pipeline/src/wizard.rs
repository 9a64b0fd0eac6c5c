//! Session state machine for the three-step wizard.
//!
//! The wizard is the sole owner of the session's brand identity, idea
//! batch, campaign selection, and creative collection. Stage transitions
//! are strictly sequenced; generation requests are tagged with a per-stage
//! monotonic epoch and a result is committed only if its epoch is still
//! the latest issued for that stage, so a superseded request can never
//! overwrite a newer one, no matter which resolves first.

use std::sync::atomic::{AtomicU64, Ordering};

use forge_core::config::StudioConfig;
use forge_core::types::{BrandIdentity, CampaignIdea, Creative, SizePreset};
use forge_core::{ForgeError, ForgeResult};
use forge_genai::Backend;
use parking_lot::RwLock;
use serde::Serialize;
use tokio::task::JoinSet;
use tracing::{debug, info};

use crate::creative::CreativeRenderer;
use crate::ideas::CampaignIdeator;
use crate::profile::BrandProfileGenerator;

/// Wizard stage. A later stage never begins before the prior stage's
/// single authoritative result has been committed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WizardStage {
    BrandInput,
    CampaignSelection,
    CreativeReview,
}

/// Read-only view of the session handed to presentation collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct WizardSnapshot {
    pub stage: WizardStage,
    pub brand: Option<BrandIdentity>,
    pub ideas: Vec<CampaignIdea>,
    pub selected_campaign: Option<CampaignIdea>,
    pub size_preset: SizePreset,
    pub creatives: Vec<Creative>,
}

#[derive(Debug)]
struct WizardState {
    stage: WizardStage,
    brand: Option<BrandIdentity>,
    ideas: Vec<CampaignIdea>,
    selected: Option<CampaignIdea>,
    size: SizePreset,
    creatives: Vec<Creative>,
}

impl WizardState {
    fn initial() -> Self {
        Self {
            stage: WizardStage::BrandInput,
            brand: None,
            ideas: Vec::new(),
            selected: None,
            size: SizePreset::Square,
            creatives: Vec::new(),
        }
    }
}

fn snapshot_of(state: &WizardState) -> WizardSnapshot {
    WizardSnapshot {
        stage: state.stage,
        brand: state.brand.clone(),
        ideas: state.ideas.clone(),
        selected_campaign: state.selected.clone(),
        size_preset: state.size,
        creatives: state.creatives.clone(),
    }
}

#[derive(Debug)]
struct StageEpochs {
    brand: AtomicU64,
    ideas: AtomicU64,
    creatives: AtomicU64,
}

impl StageEpochs {
    fn new() -> Self {
        Self {
            brand: AtomicU64::new(0),
            ideas: AtomicU64::new(0),
            creatives: AtomicU64::new(0),
        }
    }

    fn next(counter: &AtomicU64) -> u64 {
        counter.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_latest(counter: &AtomicU64, epoch: u64) -> bool {
        counter.load(Ordering::SeqCst) == epoch
    }
}

/// One user session's orchestration pipeline.
pub struct Wizard {
    profiles: BrandProfileGenerator,
    ideator: CampaignIdeator,
    renderer: CreativeRenderer,
    config: StudioConfig,
    state: RwLock<WizardState>,
    epochs: StageEpochs,
}

impl Wizard {
    pub fn new(backend: Backend, config: StudioConfig) -> Self {
        Self {
            profiles: BrandProfileGenerator::new(backend.clone(), config.clone()),
            ideator: CampaignIdeator::new(backend.clone(), config.clone()),
            renderer: CreativeRenderer::new(backend),
            config,
            state: RwLock::new(WizardState::initial()),
            epochs: StageEpochs::new(),
        }
    }

    pub fn snapshot(&self) -> WizardSnapshot {
        snapshot_of(&self.state.read())
    }

    /// Run the brand scan. On success the identity is committed and the
    /// wizard advances to campaign selection; on failure it stays in
    /// BrandInput with the failure surfaced for display and retry.
    pub async fn scan(&self, website_url: &str) -> ForgeResult<WizardSnapshot> {
        if website_url.trim().is_empty() {
            return Err(ForgeError::Validation("website URL must not be empty".into()));
        }
        {
            let state = self.state.read();
            if state.stage != WizardStage::BrandInput {
                return Err(ForgeError::Validation(
                    "a brand identity already exists; restart to scan again".into(),
                ));
            }
        }

        let epoch = StageEpochs::next(&self.epochs.brand);
        match self.profiles.generate(website_url).await {
            Ok(brand) => {
                let mut state = self.state.write();
                if StageEpochs::is_latest(&self.epochs.brand, epoch) {
                    info!(name = %brand.name, url = website_url, "brand identity committed");
                    state.brand = Some(brand);
                    state.stage = WizardStage::CampaignSelection;
                } else {
                    debug!(epoch, "discarding stale brand scan result");
                    metrics::counter!("wizard.stale_results_discarded").increment(1);
                }
                Ok(snapshot_of(&state))
            }
            Err(e) => {
                metrics::counter!("wizard.brand_profile_failures").increment(1);
                Err(e)
            }
        }
    }

    /// Generate (or regenerate) the idea batch. The new batch replaces the
    /// previous one wholesale; results are never merged.
    pub async fn generate_ideas(&self) -> ForgeResult<WizardSnapshot> {
        let brand = {
            let state = self.state.read();
            if state.stage != WizardStage::CampaignSelection {
                return Err(ForgeError::Validation(
                    "campaign ideation requires a confirmed brand identity".into(),
                ));
            }
            state
                .brand
                .clone()
                .ok_or_else(|| ForgeError::Validation("no brand identity available".into()))?
        };

        let epoch = StageEpochs::next(&self.epochs.ideas);
        match self.ideator.generate(&brand).await {
            Ok(ideas) => {
                let mut state = self.state.write();
                if StageEpochs::is_latest(&self.epochs.ideas, epoch) {
                    state.ideas = ideas;
                } else {
                    debug!(epoch, "discarding stale idea batch");
                    metrics::counter!("wizard.stale_results_discarded").increment(1);
                }
                Ok(snapshot_of(&state))
            }
            Err(e) => {
                metrics::counter!("wizard.campaign_ideation_failures").increment(1);
                Err(e)
            }
        }
    }

    /// Select one idea from the current batch, advance to creative review,
    /// and render the initial batch at the Square preset.
    pub async fn select_campaign(&self, index: usize) -> ForgeResult<WizardSnapshot> {
        let (campaign, brand) = {
            let state = self.state.read();
            if state.stage != WizardStage::CampaignSelection {
                return Err(ForgeError::Validation(
                    "campaign selection is only valid while reviewing ideas".into(),
                ));
            }
            let campaign = state
                .ideas
                .get(index)
                .cloned()
                .ok_or_else(|| ForgeError::Validation(format!("no campaign idea at index {index}")))?;
            let brand = state
                .brand
                .clone()
                .ok_or_else(|| ForgeError::Validation("no brand identity available".into()))?;
            (campaign, brand)
        };

        {
            let mut state = self.state.write();
            state.selected = Some(campaign.clone());
            state.stage = WizardStage::CreativeReview;
            state.size = SizePreset::Square;
            state.creatives.clear();
        }

        info!(headline = %campaign.headline, "campaign selected");
        self.replace_batch(&campaign, &brand, SizePreset::Square).await
    }

    /// Change the size preset: a destructive full-batch replace. The brand
    /// identity and the selected campaign are unaffected.
    pub async fn change_size(&self, size: SizePreset) -> ForgeResult<WizardSnapshot> {
        let (campaign, brand, _) = self.review_context()?;
        self.replace_batch(&campaign, &brand, size).await
    }

    /// Append one creative to the existing collection. A failed add leaves
    /// the collection exactly as it was.
    pub async fn add_creative(&self) -> ForgeResult<WizardSnapshot> {
        let (campaign, brand, size) = self.review_context()?;

        let epoch = StageEpochs::next(&self.epochs.creatives);
        match self.renderer.render(&campaign, &brand, size).await {
            Ok(creative) => {
                let mut state = self.state.write();
                if StageEpochs::is_latest(&self.epochs.creatives, epoch) {
                    state.creatives.push(creative);
                } else {
                    debug!(epoch, "discarding stale incremental creative");
                    metrics::counter!("wizard.stale_results_discarded").increment(1);
                }
                Ok(snapshot_of(&state))
            }
            Err(e) => {
                metrics::counter!("wizard.creative_render_failures").increment(1);
                Err(e)
            }
        }
    }

    /// Discard all held entities and return to the first step. Every stage
    /// epoch is bumped so results still in flight for the old session are
    /// discarded when they eventually resolve.
    pub fn restart(&self) -> WizardSnapshot {
        StageEpochs::next(&self.epochs.brand);
        StageEpochs::next(&self.epochs.ideas);
        StageEpochs::next(&self.epochs.creatives);

        let mut state = self.state.write();
        *state = WizardState::initial();
        info!("wizard restarted");
        snapshot_of(&state)
    }

    fn review_context(&self) -> ForgeResult<(CampaignIdea, BrandIdentity, SizePreset)> {
        let state = self.state.read();
        if state.stage != WizardStage::CreativeReview {
            return Err(ForgeError::Validation(
                "creative operations require a selected campaign".into(),
            ));
        }
        let campaign = state
            .selected
            .clone()
            .ok_or_else(|| ForgeError::Validation("no campaign selected".into()))?;
        let brand = state
            .brand
            .clone()
            .ok_or_else(|| ForgeError::Validation("no brand identity available".into()))?;
        Ok((campaign, brand, state.size))
    }

    /// Render a full batch and commit it as the new collection. On failure
    /// the collection is emptied rather than left partially filled; the
    /// requested preset is committed either way, matching the
    /// clear-then-render ordering of the review screen.
    async fn replace_batch(
        &self,
        campaign: &CampaignIdea,
        brand: &BrandIdentity,
        size: SizePreset,
    ) -> ForgeResult<WizardSnapshot> {
        let count = self.config.initial_creative_count;
        let epoch = StageEpochs::next(&self.epochs.creatives);
        let result = self.render_many(campaign, brand, size, count).await;

        let mut state = self.state.write();
        if !StageEpochs::is_latest(&self.epochs.creatives, epoch) {
            debug!(epoch, "discarding stale creative batch");
            metrics::counter!("wizard.stale_results_discarded").increment(1);
            return result.map(|_| snapshot_of(&state));
        }

        match result {
            Ok(batch) => {
                info!(count = batch.len(), size = %size, "creative batch committed");
                state.size = size;
                state.creatives = batch;
                Ok(snapshot_of(&state))
            }
            Err(e) => {
                state.size = size;
                state.creatives.clear();
                metrics::counter!("wizard.creative_render_failures").increment(1);
                Err(e)
            }
        }
    }

    /// Fan out `count` independent render calls and join on all of them.
    /// All-or-nothing: the first failure aborts every sibling and fails
    /// the batch; successes are reassembled in issue order.
    async fn render_many(
        &self,
        campaign: &CampaignIdea,
        brand: &BrandIdentity,
        size: SizePreset,
        count: usize,
    ) -> ForgeResult<Vec<Creative>> {
        let mut tasks = JoinSet::new();
        for index in 0..count {
            let renderer = self.renderer.clone();
            let campaign = campaign.clone();
            let brand = brand.clone();
            tasks.spawn(async move { (index, renderer.render(&campaign, &brand, size).await) });
        }

        let mut batch: Vec<Option<Creative>> = vec![None; count];
        while let Some(joined) = tasks.join_next().await {
            let (index, result) = joined
                .map_err(|e| ForgeError::CreativeRender(format!("render task failed: {e}")))?;
            match result {
                Ok(creative) => batch[index] = Some(creative),
                Err(e) => {
                    tasks.abort_all();
                    return Err(e);
                }
            }
        }

        batch
            .into_iter()
            .map(|slot| {
                slot.ok_or_else(|| ForgeError::CreativeRender("creative fan-out lost a result".into()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use forge_core::config::StudioConfig;
    use forge_genai::{mock, GeneratedImage, GenerativeBackend, ImageRequest, ResponseSchema};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Duration;

    fn studio_config() -> StudioConfig {
        StudioConfig {
            mock_scan_delay_ms: 0,
            ..StudioConfig::default()
        }
    }

    fn seed_campaign_selection(wizard: &Wizard) {
        let mut state = wizard.state.write();
        state.brand = Some(mock::brand_identity("https://wanderlust-coffee.com"));
        state.stage = WizardStage::CampaignSelection;
    }

    #[tokio::test]
    async fn test_scan_rejects_empty_url() {
        let wizard = Wizard::new(Backend::Mock, studio_config());
        let err = wizard.scan("   ").await.unwrap_err();
        assert!(matches!(err, ForgeError::Validation(_)));
        assert_eq!(wizard.snapshot().stage, WizardStage::BrandInput);
    }

    #[tokio::test]
    async fn test_stage_guards() {
        let wizard = Wizard::new(Backend::Mock, studio_config());

        // Ideation and creative operations are invalid before a scan.
        assert!(matches!(
            wizard.generate_ideas().await.unwrap_err(),
            ForgeError::Validation(_)
        ));
        assert!(matches!(
            wizard.add_creative().await.unwrap_err(),
            ForgeError::Validation(_)
        ));
        assert!(matches!(
            wizard.change_size(SizePreset::Banner).await.unwrap_err(),
            ForgeError::Validation(_)
        ));

        // Selecting outside the current batch is a validation error.
        seed_campaign_selection(&wizard);
        assert!(matches!(
            wizard.select_campaign(7).await.unwrap_err(),
            ForgeError::Validation(_)
        ));
    }

    #[tokio::test]
    async fn test_rescan_requires_restart() {
        let wizard = Wizard::new(Backend::Mock, studio_config());
        wizard.scan("https://wanderlust-coffee.com").await.unwrap();

        let err = wizard.scan("https://other.example").await.unwrap_err();
        assert!(matches!(err, ForgeError::Validation(_)));

        wizard.restart();
        assert!(wizard.scan("https://other.example").await.is_ok());
    }

    /// Backend whose first structured call resolves slowly, so a second,
    /// faster call issued later can land first.
    #[derive(Default)]
    struct DelayedIdeasBackend {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl GenerativeBackend for DelayedIdeasBackend {
        async fn generate_structured(
            &self,
            _prompt: &str,
            _schema: &ResponseSchema,
        ) -> ForgeResult<serde_json::Value> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst);
            if call == 0 {
                tokio::time::sleep(Duration::from_millis(200)).await;
                Ok(json!([
                    {"headline": "Slow First", "description": "Issued first, resolved last."}
                ]))
            } else {
                Ok(json!([
                    {"headline": "Fast Second", "description": "Issued last, resolved first."}
                ]))
            }
        }

        async fn generate_image(&self, _request: &ImageRequest) -> ForgeResult<GeneratedImage> {
            Err(ForgeError::Backend("not used in this test".into()))
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_idea_batch_is_discarded() {
        let wizard = Wizard::new(
            Backend::live(Arc::new(DelayedIdeasBackend::default())),
            studio_config(),
        );
        seed_campaign_selection(&wizard);

        // Both requests succeed, but only the later-issued one may commit,
        // even though the earlier one resolves after it.
        let (first, second) = tokio::join!(wizard.generate_ideas(), wizard.generate_ideas());
        first.unwrap();
        second.unwrap();

        let ideas = wizard.snapshot().ideas;
        assert_eq!(ideas.len(), 1);
        assert_eq!(ideas[0].headline, "Fast Second");
    }

    #[tokio::test]
    async fn test_restart_discards_in_flight_results() {
        let wizard = Wizard::new(Backend::Mock, studio_config());
        wizard.scan("https://wanderlust-coffee.com").await.unwrap();
        wizard.generate_ideas().await.unwrap();
        wizard.select_campaign(0).await.unwrap();

        // Restart bumps the creative epoch, so an add issued before the
        // restart may not commit into the fresh session.
        let epoch = StageEpochs::next(&wizard.epochs.creatives);
        wizard.restart();
        assert!(!StageEpochs::is_latest(&wizard.epochs.creatives, epoch));

        let snapshot = wizard.snapshot();
        assert_eq!(snapshot.stage, WizardStage::BrandInput);
        assert!(snapshot.brand.is_none());
        assert!(snapshot.ideas.is_empty());
        assert!(snapshot.selected_campaign.is_none());
        assert!(snapshot.creatives.is_empty());
    }
}
