pub mod csv;

use common::model::datasource::TabularDataset;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;

pub const DEFAULT_MAX_DATASETS: usize = 50;

#[derive(Default)]
struct DatasetCache {
    datasets: HashMap<String, TabularDataset>,
    /// Ids from least to most recently uploaded.
    order: VecDeque<String>,
}

/// Uploaded recipient files, keyed by the MD5 of their bytes.
///
/// Holds at most `capacity` files; uploading past that forgets the file
/// uploaded longest ago. Re-uploading a file refreshes its place.
#[derive(Clone)]
pub struct DatasetsState {
    cache: Arc<RwLock<DatasetCache>>,
    capacity: usize,
}

impl Default for DatasetsState {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_MAX_DATASETS)
    }
}

impl DatasetsState {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            cache: Arc::default(),
            capacity: capacity.max(1),
        }
    }

    pub async fn insert(&self, dataset_id: &str, dataset: TabularDataset) {
        let mut cache = self.cache.write().await;
        cache.order.retain(|id| id != dataset_id);
        cache.order.push_back(dataset_id.to_string());
        cache.datasets.insert(dataset_id.to_string(), dataset);

        while cache.order.len() > self.capacity {
            if let Some(evicted) = cache.order.pop_front() {
                cache.datasets.remove(&evicted);
                debug!("Evicted dataset {}", evicted);
            }
        }
    }

    pub async fn get(&self, dataset_id: &str) -> Option<TabularDataset> {
        self.cache.read().await.datasets.get(dataset_id).cloned()
    }
}
