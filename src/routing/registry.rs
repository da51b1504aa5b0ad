//! Category → lane mapping.
//!
//! # Design Decisions
//! - Built once per session, immutable while routing (shared via Arc)
//! - O(1) lookup by category
//! - Absent category = no lane; the caller decides what that means

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::DispatcherConfig;
use crate::duty::Category;
use crate::processing::{CategoryProcessor, CompletionRecord, Executor, SimulatedWork};

#[derive(Debug, Default)]
pub struct LaneRegistry {
    lanes: HashMap<Category, Arc<CategoryProcessor>>,
}

impl LaneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a processor under its category, replacing any previous one.
    pub fn register(&mut self, processor: CategoryProcessor) -> Option<Arc<CategoryProcessor>> {
        let category = processor.category().clone();
        self.lanes.insert(category, Arc::new(processor))
    }

    /// Lane for `category`, if one exists.
    pub fn get(&self, category: &Category) -> Option<Arc<CategoryProcessor>> {
        self.lanes.get(category).cloned()
    }

    pub fn len(&self) -> usize {
        self.lanes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lanes.is_empty()
    }

    /// Build the four standard lanes from configuration.
    ///
    /// When execution is enabled an executor task is spawned per lane; the
    /// handles are returned so callers may await or ignore them.
    pub fn standard(
        config: &DispatcherConfig,
        completions: Option<mpsc::UnboundedSender<CompletionRecord>>,
    ) -> (Self, Vec<JoinHandle<usize>>) {
        let processing = Arc::new(SimulatedWork::for_processing(&config.processing));
        let execution = Arc::new(SimulatedWork::for_execution(&config.execution));

        let mut registry = Self::new();
        let mut executors = Vec::new();

        for category in Category::KNOWN {
            let mut processor = CategoryProcessor::new(category.clone(), processing.clone());

            if let Some(completions) = &completions {
                processor = processor.with_completions(completions.clone());
            }

            if config.execution.enabled {
                let (executor, queue) = Executor::new(
                    category.clone(),
                    execution.clone(),
                    config.execution.queue_capacity,
                );
                executors.push(tokio::spawn(executor.run()));
                processor = processor.with_executor(queue);
            }

            registry.register(processor);
        }

        tracing::debug!(lanes = registry.len(), executors = executors.len(), "Lanes ready");
        (registry, executors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processing::processor::test_support::CountingWork;

    #[tokio::test]
    async fn test_standard_lanes_cover_known_categories() {
        let mut config = DispatcherConfig::default();
        config.execution.enabled = false;
        let (registry, executors) = LaneRegistry::standard(&config, None);

        assert_eq!(registry.len(), 4);
        assert!(executors.is_empty());
        for category in Category::KNOWN {
            assert_eq!(registry.get(&category).unwrap().category(), &category);
        }
        assert!(registry.get(&Category::Unknown("UNKNOWN".into())).is_none());
        assert!(registry.get(&Category::default()).is_none());
    }

    #[tokio::test]
    async fn test_executors_spawned_per_lane() {
        let config = DispatcherConfig::default();
        let (registry, executors) = LaneRegistry::standard(&config, None);
        assert_eq!(executors.len(), 4);

        drop(registry);
        for handle in executors {
            assert_eq!(handle.await.unwrap(), 0);
        }
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = LaneRegistry::new();
        let first = CategoryProcessor::new(Category::Proposer, Arc::new(CountingWork::default()));
        let second = CategoryProcessor::new(Category::Proposer, Arc::new(CountingWork::default()));

        assert!(registry.register(first).is_none());
        assert!(registry.register(second).is_some());
        assert_eq!(registry.len(), 1);
    }
}
