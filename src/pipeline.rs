//! Round-trip through the external transformation services.
//!
//! The ingested store is encoded once, passed through the fixed stage chain
//! and decoded into the store that is finally served. Every call is
//! sequential, timeout bounded and fatal on failure.

use crate::codec::{self, Envelope};
use crate::config::CollaboratorConfig;
use crate::error::{DataError, Result};
use crate::store::BuildingStore;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// A transformation service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Clean,
    Interpolate,
    Diff,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Clean => "clean",
            Stage::Interpolate => "interpolate",
            Stage::Diff => "diff",
        };
        f.write_str(name)
    }
}

/// Interpolation runs again after differencing to fill the gaps it opens
pub const STAGE_ORDER: [Stage; 4] = [Stage::Clean, Stage::Interpolate, Stage::Diff, Stage::Interpolate];

#[async_trait]
pub trait Transformer: Send + Sync {
    /// Send one canonical payload through `stage` and return the result
    async fn transform(&self, stage: Stage, payload: Envelope) -> Result<Envelope>;
}

/// Response body of a collaborator: the envelope, or the bare payload text
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Reply {
    Envelope(Envelope),
    Bare(String),
}

impl From<Reply> for Envelope {
    fn from(reply: Reply) -> Self {
        match reply {
            Reply::Envelope(envelope) => envelope,
            Reply::Bare(payload) => Envelope::new(payload),
        }
    }
}

/// Transformer backed by HTTP POST calls
#[derive(Debug, Clone)]
pub struct HttpTransformer {
    client: Client,
    config: CollaboratorConfig,
}

impl HttpTransformer {
    pub fn new(config: CollaboratorConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| DataError::configuration(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    fn url_for(&self, stage: Stage) -> &str {
        match stage {
            Stage::Clean => &self.config.clean_url,
            Stage::Interpolate => &self.config.interpolate_url,
            Stage::Diff => &self.config.diff_url,
        }
    }
}

#[async_trait]
impl Transformer for HttpTransformer {
    async fn transform(&self, stage: Stage, payload: Envelope) -> Result<Envelope> {
        let url = self.url_for(stage);
        let failure = |e: reqwest::Error| DataError::Collaborator {
            stage: stage.to_string(),
            reason: e.to_string(),
        };

        debug!("POST {} ({} bytes)", url, payload.payload.len());
        self.client
            .post(url)
            .json(&payload)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .map_err(failure)?
            .json::<Reply>()
            .await
            .map(Envelope::from)
            .map_err(failure)
    }
}

/// Encode `store`, run it through [`STAGE_ORDER`] and decode the result
pub async fn run_transforms(
    store: &BuildingStore,
    transformer: &dyn Transformer,
) -> Result<BuildingStore> {
    let mut envelope = Envelope::new(codec::encode_store(store)?);

    for stage in STAGE_ORDER {
        let started = Instant::now();
        envelope = transformer.transform(stage, envelope).await?;
        info!(
            "Stage {} finished in {}ms",
            stage,
            started.elapsed().as_millis()
        );
    }

    let transformed = codec::decode_store(&envelope.payload)?;
    info!("Transformed store holds {} buildings", transformed.len());
    Ok(transformed)
}
