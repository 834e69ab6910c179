use std::fs;
use std::io;
use std::path::Path;

use serde::Serialize;
use tracing::{debug, warn};

pub const FALLBACK_NARRATIVE: &str = "\
- Cluster 2 = High-Value Spenders: highest average total spend across major cities; ideal for premium offers, upgrades and retention.
- Cluster 3 = Largest Base: biggest share of customers in most metros; prioritise broad re-engagement and loyalty uplift.
- Consistency Across Cities: cluster spending patterns are stable across locations, enabling national, cluster-led strategies.
- Tier-2 Opportunity: cities with balanced mixes are strong pilots for localised promotions.

Strategic Actions
1) Focus Cluster 2 on exclusive financial products and concierge-style services.
2) Launch reactivation and cross-sell campaigns for Cluster 3 to move them up the value ladder.
3) Maintain a cluster-first playbook with city overlays rather than city-only targeting.
4) Test regional playbooks in second-tier cities to capture emerging growth.
";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "source", content = "text", rename_all = "snake_case")]
pub enum Narrative {
    File(String),
    Fallback(&'static str),
}

impl Narrative {
    pub fn text(&self) -> &str {
        match self {
            Narrative::File(text) => text,
            Narrative::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Narrative::Fallback(_))
    }
}

/// Reads the companion narrative verbatim, or falls back to the built-in text.
/// Invalid UTF-8 is replaced rather than rejected.
pub fn load_narrative(path: &Path) -> Narrative {
    match fs::read(path) {
        Ok(bytes) => Narrative::File(String::from_utf8_lossy(&bytes).into_owned()),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            debug!(path = %path.display(), "no narrative file; using fallback");
            Narrative::Fallback(FALLBACK_NARRATIVE)
        }
        Err(err) => {
            warn!(path = %path.display(), error = %err, "failed to read narrative; using fallback");
            Narrative::Fallback(FALLBACK_NARRATIVE)
        }
    }
}
