//! Demo driver: hammer the save service with concurrent duplicate content.
//!
//! Spawns 50 concurrent saves with content drawn from {"a", "b", "c"} and
//! prints every outcome followed by the final saved collection. At most
//! three saves succeed, one per distinct content.

use std::sync::Arc;

use rand::Rng;

use clasp::{
    AppConfig, ItemIntegrationService, ItemRepository, LockConfig, RedisCoordinationStore,
    RepositoryConfig, ServiceConfig,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let config = AppConfig::load()?;

    tracing::info!(redis_url = %config.redis_url, "connecting to coordination store");
    let store = Arc::new(RedisCoordinationStore::connect(&config.redis_url).await?);

    let lock = LockConfig {
        ttl_ms: config.lock_ttl_ms,
    };
    let repository = Arc::new(ItemRepository::new(
        store.clone(),
        RepositoryConfig {
            processing_delay_ms: config.processing_delay_ms,
            lock: lock.clone(),
        },
    ));
    let service = Arc::new(ItemIntegrationService::new(
        store,
        repository,
        ServiceConfig { lock },
    ));

    let contents = ["a", "b", "c"];
    let mut handles = Vec::with_capacity(50);
    for _ in 0..50 {
        let service = service.clone();
        let content = contents[rand::rng().random_range(0..contents.len())];
        handles.push(tokio::spawn(async move {
            match service.save_item(content).await {
                Ok(outcome) => println!("{outcome}"),
                Err(error) => eprintln!("save failed: {error}"),
            }
        }));
    }
    for handle in handles {
        handle.await?;
    }

    println!("Everything recorded:");
    for item in service.all_items().await {
        println!("{item}");
    }

    Ok(())
}
