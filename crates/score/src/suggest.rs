//! Improvement suggestions derived from a score breakdown.

use std::cmp::Ordering;

use nomad_primitives::{ComponentId, ScoreBreakdown};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SuggestionConfig {
    /// Maximum number of suggestions returned (default: 3).
    pub top_k: usize,
}

impl Default for SuggestionConfig {
    fn default() -> Self {
        Self { top_k: 3 }
    }
}

/// A ranked improvement suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Suggestion {
    pub component: ComponentId,
    /// Points still attainable for the component.
    pub headroom: f64,
    pub text: String,
}

fn template(id: ComponentId) -> &'static str {
    match id {
        ComponentId::Completion => {
            "Finish the tasks you are assigned: completed and paid tasks raise your completion rate."
        }
        ComponentId::MilestoneProgress => {
            "Deliver the outstanding milestones on your milestone-payment tasks."
        }
        ComponentId::DisputeFairness => {
            "Agree on deliverables up front to avoid disputes; awards in your favour restore dispute fairness."
        }
        ComponentId::BiddingActivity => "Bid on more open tasks to show activity on the marketplace.",
    }
}

/// Ranks components by headroom and maps the top ones to suggestions.
#[derive(Debug, Clone, Default)]
pub struct SuggestionEngine {
    config: SuggestionConfig,
}

impl SuggestionEngine {
    pub fn new(config: SuggestionConfig) -> Self {
        Self { config }
    }

    /// Suggestions ordered by headroom descending, ties in component order.
    ///
    /// Components already at their maximum are never suggested.
    pub fn suggest(&self, breakdown: &ScoreBreakdown) -> Vec<Suggestion> {
        let mut ranked: Vec<(ComponentId, f64)> = breakdown
            .components
            .iter()
            .map(|(id, component)| (*id, component.headroom()))
            .filter(|(_, headroom)| *headroom > 0.0)
            .collect();

        // Stable sort keeps the map's component order for equal headroom.
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

        ranked
            .into_iter()
            .take(self.config.top_k)
            .map(|(component, headroom)| Suggestion {
                component,
                headroom,
                text: template(component).to_owned(),
            })
            .collect()
    }
}
