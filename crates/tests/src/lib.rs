//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约快照测试
//! - 配置 -> 路由 -> 调度器 e2e 测试 (ManualClock / IntervalClock)
//! - 合并 vs 直通 (passthrough) 的投递形态对比

#[cfg(test)]
mod contract_tests {
    use contracts::{CoalescerBlueprint, FALLBACK_FRAME_INTERVAL_MS};

    #[test]
    fn test_contracts_compile() {
        let _ = contracts::ConfigVersion::V1;
        assert!((FALLBACK_FRAME_INTERVAL_MS - 16.667).abs() < 0.001);
    }

    #[test]
    fn test_sample_config_is_valid() {
        let blueprint: CoalescerBlueprint = config_loader::ConfigLoader::load_from_str(
            include_str!("../../../configs/coalescer.toml"),
            config_loader::ConfigFormat::Toml,
        )
        .unwrap();

        assert_eq!(blueprint.subscribers.len(), 3);
        assert!(blueprint.subscriber("recorder").is_some());
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::sync::Arc;
    use std::time::Duration;

    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::{transformer, ContractError, DeliveryChannel, Transformer};
    use dispatcher::{create_router, BatchRouter};
    use frame_scheduler::{forward_frame, FrameScheduler, IntervalClock, ManualClock};

    fn tagged(tag: &'static str) -> Transformer<String> {
        transformer(move |t| format!("{tag}@{t}"))
    }

    async fn memory_router(ids: &[&str]) -> Arc<BatchRouter<String>> {
        let builder = ids
            .iter()
            .try_fold(BatchRouter::builder(), |b, id| b.memory(*id, 64))
            .unwrap();
        Arc::new(builder.build().await)
    }

    /// ManualClock -> FrameScheduler -> BatchRouter -> MemorySink
    ///
    /// 验证完整的数据流：
    /// 1. 两个订阅者的注册只产生一次帧请求
    /// 2. 帧触发后每个订阅者收到一个批次
    /// 3. 路由关闭后 sink 已 flush/close
    #[tokio::test]
    async fn test_e2e_manual_clock_pipeline() {
        let router = memory_router(&["A", "B"]).await;
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::new(clock.clone(), Arc::clone(&router));

        scheduler.register("A", [tagged("f1"), tagged("f2")]);
        scheduler.register("B", [tagged("g1")]);
        assert_eq!(clock.total_requests(), 1);

        clock.fire(100.0).unwrap();
        router.shutdown().await;

        let a = router.memory_record("A").unwrap();
        let b = router.memory_record("B").unwrap();
        assert_eq!(a.results(), vec!["f1@100", "f2@100"]);
        assert_eq!(b.results(), vec!["g1@100"]);
        assert!(a.is_closed() && b.is_closed());

        let stats = scheduler.stats();
        assert_eq!(stats.frame_requests, 1);
        assert_eq!(stats.frames_dispatched, 1);
        assert_eq!(stats.batches_delivered, 2);
        assert_eq!(stats.results_delivered, 3);
    }

    #[tokio::test]
    async fn test_e2e_unknown_subscriber_counts_delivery_failure() {
        let router = memory_router(&["A"]).await;
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::new(clock.clone(), Arc::clone(&router));

        scheduler.register("A", [tagged("ok")]);
        scheduler.register("ghost", [tagged("lost")]);
        clock.fire(16.0).unwrap();
        router.shutdown().await;

        let stats = scheduler.stats();
        assert_eq!(stats.batches_delivered, 1);
        assert_eq!(stats.delivery_failures, 1);
        assert_eq!(router.memory_record("A").unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_e2e_frames_stay_separate() {
        let router = memory_router(&["A"]).await;
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::new(clock.clone(), Arc::clone(&router));

        for (frame, ts) in [(1u64, 16.0), (2, 32.0), (3, 48.0)] {
            scheduler.register("A", [tagged("x"), tagged("y")]);
            clock.fire(ts).unwrap();
            let record = router.memory_record("A").unwrap();
            assert!(record.wait_for(frame as usize, Duration::from_secs(1)).await);
        }
        router.shutdown().await;

        let batches = router.memory_record("A").unwrap().batches();
        let seqs: Vec<u64> = batches.iter().map(|b| b.frame_seq).collect();
        assert_eq!(seqs, vec![1, 2, 3]);
        assert!(batches.iter().all(|b| b.len() == 2));
        assert_eq!(clock.total_requests(), 3);
    }

    /// IntervalClock 驱动：注册后无需手动触发即可收到批次
    #[tokio::test]
    async fn test_e2e_interval_clock_pipeline() {
        let router = memory_router(&["hud"]).await;
        let clock = IntervalClock::from_interval_ms(5.0).unwrap();
        let scheduler = FrameScheduler::new(clock.clone(), Arc::clone(&router));

        for _ in 0..10 {
            scheduler.register("hud", [transformer(|t: f64| format!("{t:.3}"))]);
        }

        let record = router.memory_record("hud").unwrap();
        assert!(record.wait_for(1, Duration::from_secs(2)).await);

        let batches = record.batches();
        assert_eq!(batches[0].len(), 10);
        assert_eq!(clock.total_requests(), 1);
        router.shutdown().await;
    }

    /// 直通模式: N 次调用 -> N 次请求、N 个批次；合并模式: 1 次请求、1 个批次
    #[tokio::test]
    async fn test_passthrough_and_coalesced_deliver_same_results() {
        let router = memory_router(&["direct", "merged"]).await;
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::new(clock.clone(), Arc::clone(&router));

        for tag in ["a", "b", "c", "d"] {
            forward_frame(&clock, Arc::clone(&router), "direct", tagged(tag));
            scheduler.register("merged", [tagged(tag)]);
        }
        assert_eq!(clock.total_requests(), 5);

        clock.fire(50.0).unwrap();
        router.shutdown().await;

        let direct = router.memory_record("direct").unwrap();
        let merged = router.memory_record("merged").unwrap();
        assert_eq!(direct.len(), 4);
        assert_eq!(merged.len(), 1);
        assert_eq!(direct.results(), merged.results());
    }

    #[tokio::test]
    async fn test_config_driven_router_and_scheduler() {
        let dir = tempfile::tempdir().unwrap();
        let toml = format!(
            r#"
version = "V1"

[clock]
kind = "manual"
interval_ms = 10.0

[[subscribers]]
id = "hud"
sink_type = "log"

[[subscribers]]
id = "recorder"
sink_type = "file"
params = {{ base_path = "{}" }}

[[subscribers]]
id = "probe"
sink_type = "memory"
"#,
            dir.path().display().to_string().replace('\\', "/")
        );

        let blueprint = ConfigLoader::load_from_str(&toml, ConfigFormat::Toml).unwrap();
        let router: Arc<BatchRouter<String>> =
            Arc::new(create_router(&blueprint.subscribers).await.unwrap());
        let clock = ManualClock::new();
        let scheduler = FrameScheduler::new(clock.clone(), Arc::clone(&router));

        for id in blueprint.subscriber_ids() {
            scheduler.register(id, [tagged("p"), tagged("q")]);
        }
        clock.fire(blueprint.clock.interval_ms).unwrap();
        router.shutdown().await;

        let lines = std::fs::read_to_string(dir.path().join("recorder.jsonl")).unwrap();
        assert_eq!(lines.lines().count(), 1);
        assert_eq!(
            router.memory_record("probe").unwrap().results(),
            vec!["p@10", "q@10"]
        );
        assert_eq!(router.total_metrics().write_count, 3);
    }

    #[tokio::test]
    async fn test_router_rejects_after_shutdown() {
        let router = memory_router(&["A"]).await;
        router.shutdown().await;

        let clock = ManualClock::new();
        let scheduler = FrameScheduler::new(clock.clone(), Arc::clone(&router));
        scheduler.register("A", [tagged("late")]);
        clock.fire(1.0).unwrap();

        assert_eq!(scheduler.stats().delivery_failures, 1);
        let err = router
            .deliver(contracts::Batch {
                subscriber_id: "A".into(),
                frame_seq: 9,
                timestamp: 2.0,
                results: vec!["x".to_string()],
            })
            .unwrap_err();
        assert!(matches!(err, ContractError::ChannelClosed { .. }));
    }
}
