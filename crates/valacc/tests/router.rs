//! Router tests: sharding, multi-shard seals and the block timer.

use std::sync::Arc;
use std::time::Duration;

use valacc::core::{ChainId, EntryHash, Sha256Hash};
use valacc::store::{MemoryStore, RecordStore, SqliteStore};
use valacc::{AccumulatorConfig, AccumulatorError, Router, RouterConfig};

fn init_tracing() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();
}

fn entry(chain: usize, n: usize) -> EntryHash {
    EntryHash::new(
        ChainId::derive(&format!("chain {chain}")),
        Sha256Hash::digest(format!("entry {chain}.{n}").as_bytes()),
    )
}

fn config(shards: usize) -> RouterConfig {
    RouterConfig::default()
        .with_shards(shards)
        .with_accumulator(AccumulatorConfig::default().with_entry_queue_capacity(256))
}

#[tokio::test]
async fn test_shard_assignment_uses_prefix() {
    let router = Router::start(Arc::new(MemoryStore::new()), config(3)).await.unwrap();
    assert_eq!(router.shard_count(), 3);
    for chain in 0..50 {
        let id = ChainId::derive(&format!("chain {chain}"));
        let expected = (usize::from(id.0[0]) << 8 | usize::from(id.0[1])) % 3;
        assert_eq!(router.shard_for(&id), expected);
    }
    router.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_zero_shards_rejected() {
    let result = Router::start(Arc::new(MemoryStore::new()), config(0)).await;
    assert!(matches!(result, Err(AccumulatorError::InvalidConfig(_))));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_seal_all_reports_every_shard() {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let router = Router::start(store.clone(), config(4)).await.unwrap();

    for chain in 0..20 {
        for n in 0..10 {
            router.ingest(entry(chain, n)).await.unwrap();
        }
    }
    let report = router.seal_all().await.unwrap();

    assert_eq!(report.blocks.len(), 4);
    assert_eq!(report.entries, 200);
    assert_eq!(report.chains, 20);
    for (index, block) in report.blocks.iter().enumerate() {
        assert_eq!(block.height, 0);
        for pair in &block.chains {
            assert_eq!(router.shard_for(&pair.chain_id), index);
        }
    }

    let stats = router.stats();
    assert_eq!(stats.entries_total, 200);
    assert_eq!(stats.blocks_sealed, 4);

    // Each shard writes its own directory chain.
    for index in 0..4 {
        let id = AccumulatorConfig::accumulator_id_for(index);
        assert!(store.directory_at_height(&id, 0).await.unwrap().is_some());
    }

    let second = router.seal_all().await.unwrap();
    assert!(second.blocks.iter().all(|b| b.height == 1 && b.root.is_none()));
    router.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_directory_chain_ids_not_accepted_as_entries() {
    let store = Arc::new(MemoryStore::new());
    let router = Router::start(store.clone(), config(2)).await.unwrap();
    for index in 0..2 {
        let id = AccumulatorConfig::accumulator_id_for(index);
        router
            .ingest(EntryHash::new(id, Sha256Hash::digest(b"E1")))
            .await
            .unwrap();
    }
    router.ingest(entry(0, 0)).await.unwrap();

    let report = router.seal_all().await.unwrap();
    assert_eq!(report.chains, 1);
    assert_eq!(router.stats().rejected_total, 2);
    router.shutdown().await.unwrap();

    // Both directory heads are still directory records, so the shards reopen.
    let router = Router::start(store.clone(), config(2)).await.unwrap();
    for index in 0..2 {
        let id = AccumulatorConfig::accumulator_id_for(index);
        let (_, head) = store.head_record(&id).await.unwrap().unwrap();
        assert!(head.is_directory);
    }
    let report = router.seal_all().await.unwrap();
    assert!(report.blocks.iter().all(|b| b.height == 1));
    router.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_router_proof() {
    let router = Router::start(Arc::new(SqliteStore::open_memory().unwrap()), config(2))
        .await
        .unwrap();
    for chain in 0..6 {
        for n in 0..5 {
            router.ingest(entry(chain, n)).await.unwrap();
        }
    }
    router.seal_all().await.unwrap();

    let target = entry(3, 2);
    let proof = router
        .prove(&target.chain_id, &target.entry_hash)
        .await
        .unwrap()
        .unwrap();
    assert!(proof.validate());
    router.shutdown().await.unwrap();
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_block_timer_seals_until_shutdown() {
    init_tracing();
    let router = Router::start(
        Arc::new(MemoryStore::new()),
        config(2).with_block_interval(Duration::from_millis(40)),
    )
    .await
    .unwrap();
    for n in 0..10 {
        router.ingest(entry(n, 0)).await.unwrap();
    }

    router
        .run_block_timer(tokio::time::sleep(Duration::from_millis(250)))
        .await
        .unwrap();

    let stats = router.stats();
    assert!(stats.blocks_sealed >= 2, "blocks sealed: {}", stats.blocks_sealed);
    assert_eq!(stats.blocks_sealed % 2, 0);
    assert_eq!(stats.entries_total, 10);
    router.shutdown().await.unwrap();
}
