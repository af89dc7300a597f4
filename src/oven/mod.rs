//! The baking pipeline.
//!
//! A bake turns a project's work packets into validated, applied code by
//! driving three external collaborators (generation engine, scaffold
//! builder, code applier) through a fixed state sequence.
//!
//! ## Architecture
//!
//! 1. **State** - bake states, quality tiers, updates and results
//! 2. **Runner** - the [`Oven`] orchestrator that runs one bake
//! 3. **Ramp** - the escalating retry loop that repeats bakes with a rising
//!    confidence bar until a target tier is reached
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use oven::collaborators::{CodeApplier, GenerationEngine, ScaffoldBuilder};
//! use oven::oven::{BakeRequest, Oven, QualityTier, Ramp, RampUpdate};
//! use oven::packet::{Project, RepoHandle, WorkPacket};
//! use tokio::sync::mpsc;
//!
//! # async fn example(
//! #     engine: Arc<dyn GenerationEngine>,
//! #     scaffold: Arc<dyn ScaffoldBuilder>,
//! #     applier: Arc<dyn CodeApplier>,
//! # ) {
//! let oven = Oven::new(engine, scaffold, applier);
//! let request = BakeRequest::new(
//!     Project::new("Shop", "An online store"),
//!     vec![WorkPacket::new("cart", "Shopping cart", "Add and remove items")],
//!     RepoHandle::new("acme", "shop"),
//! );
//!
//! let (tx, mut rx) = mpsc::channel::<RampUpdate>(64);
//! tokio::spawn(async move {
//!     while let Some(update) = rx.recv().await {
//!         println!("[attempt {}] {}: {}", update.attempt, update.update.state, update.update.message);
//!     }
//! });
//!
//! let outcome = Ramp::new(oven)
//!     .ramp_until_quality(request, 3, QualityTier::Crispy, tx)
//!     .await;
//! println!("{}", outcome.message);
//! # }
//! ```

mod ramp;
mod runner;
mod state;

pub use ramp::{CONFIDENCE_CAP, CONFIDENCE_STEP, Ramp, RampOutcome, RampUpdate, attempt_confidence};
pub use runner::{
    Bake, BakeRequest, BakeStream, Oven, UPDATE_BUFFER, branch_name, commit_message,
    select_template,
};
pub use state::{
    BakeResult, BakeUpdate, OvenState, PacketResult, QualityTier, compute_quality_tier,
    is_successful,
};
