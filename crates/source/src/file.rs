use std::{collections::HashMap, fs, path::Path};

use async_trait::async_trait;
use nomad_primitives::{ActivitySnapshot, Address, parse_address, unix_timestamp_millis};
use tracing::{debug, warn};

use crate::{ActivitySource, SourceError, SourceResult, UserWorkSummary};

/// Activity source backed by a JSON array of indexer work summaries.
#[derive(Debug, Clone, Default)]
pub struct FileActivitySource {
    summaries: HashMap<Address, UserWorkSummary>,
}

impl FileActivitySource {
    /// Load and index the summaries in `path`.
    ///
    /// Entries with an unparsable `address` are skipped.
    pub fn load(path: impl AsRef<Path>) -> SourceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| SourceError::Transport(format!("{}: {e}", path.display())))?;
        let source = Self::from_json(&content)?;
        debug!(path = %path.display(), entries = source.len(), "loaded activity fixture");
        Ok(source)
    }

    pub fn from_json(content: &str) -> SourceResult<Self> {
        let records: Vec<UserWorkSummary> =
            serde_json::from_str(content).map_err(|e| SourceError::Malformed(e.to_string()))?;
        Ok(Self::from_summaries(records))
    }

    pub fn from_summaries(records: impl IntoIterator<Item = UserWorkSummary>) -> Self {
        let mut summaries = HashMap::new();
        for summary in records {
            match parse_address(&summary.address) {
                Ok(address) => {
                    summaries.insert(address, summary);
                }
                Err(err) => warn!(%err, "skipping summary with invalid address"),
            }
        }
        Self { summaries }
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

#[async_trait]
impl ActivitySource for FileActivitySource {
    async fn fetch_snapshot(&self, address: Address) -> SourceResult<ActivitySnapshot> {
        match self.summaries.get(&address) {
            Some(summary) if !summary.is_empty() => {
                summary.normalize(address, unix_timestamp_millis())
            }
            _ => Err(SourceError::NotFound(address)),
        }
    }
}
