//! Generation orchestration pipeline: the three wizard stages (brand scan,
//! campaign ideation, creative rendering) and the session state machine
//! that sequences them.

pub mod creative;
pub mod ideas;
pub mod profile;
pub mod wizard;

pub use creative::CreativeRenderer;
pub use ideas::CampaignIdeator;
pub use profile::BrandProfileGenerator;
pub use wizard::{Wizard, WizardSnapshot, WizardStage};

#[cfg(test)]
pub(crate) mod testing;
