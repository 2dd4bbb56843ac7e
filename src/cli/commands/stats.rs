//! Stats command - report what the vector store holds.

use anyhow::Result;
use serde::Serialize;

use crate::config::Settings;
use crate::store::VectorStoreGateway;

#[derive(Debug, Serialize, PartialEq)]
pub struct StoreStats {
    pub collection: String,
    pub chunks: usize,
    pub metric: String,
    pub index_path: String,
}

pub fn collect(settings: &Settings, gateway: &VectorStoreGateway) -> StoreStats {
    StoreStats {
        collection: gateway.collection().to_string(),
        chunks: gateway.chunk_count(),
        metric: gateway.metric().to_string(),
        index_path: settings.index_path.display().to_string(),
    }
}

/// Run stats command.
pub fn run(settings: &Settings, gateway: &VectorStoreGateway, json: bool) -> Result<()> {
    let stats = collect(settings, gateway);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Collection: {}", stats.collection);
        println!("Chunks:     {}", stats.chunks);
        println!("Metric:     {}", stats.metric);
        println!("Index:      {}", stats.index_path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{DistanceMetric, InMemoryBackend};
    use crate::vector::MockEmbeddingGenerator;
    use std::sync::Arc;

    #[test]
    fn test_collect_counts_chunks() {
        let settings = Settings::default();
        let gateway = VectorStoreGateway::new(
            Box::new(InMemoryBackend::new()),
            Arc::new(MockEmbeddingGenerator::new()),
            "rag_collection",
            DistanceMetric::SquaredL2,
        );
        assert_eq!(collect(&settings, &gateway).chunks, 0);

        gateway
            .store(&["one".to_string(), "two".to_string()], "a.txt")
            .unwrap();
        let stats = collect(&settings, &gateway);
        assert_eq!(stats.chunks, 2);
        assert_eq!(stats.metric, "squared_l2");
        assert_eq!(stats.collection, "rag_collection");
    }
}
