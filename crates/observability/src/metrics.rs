//! 帧合并调度器指标收集模块
//!
//! 记录注册、帧请求、分发与投递的运行指标，并提供内存聚合器用于输出摘要。

use metrics::{counter, gauge, histogram};

/// 记录一次注册 (一个订阅者、若干 transformer)
pub fn record_registration(subscriber_id: &str, transformers: usize) {
    counter!(
        "frame_coalescer_registrations_total",
        "subscriber" => subscriber_id.to_string()
    )
    .increment(1);
    counter!("frame_coalescer_transformers_registered_total").increment(transformers as u64);
}

/// 记录向帧时钟发出的请求
pub fn record_frame_requested() {
    counter!("frame_coalescer_frame_requests_total").increment(1);
}

/// 记录一次帧分发
///
/// `frame_interval_ms` 为与上一帧时间戳的差值 (首帧为 None)。
pub fn record_frame_dispatched(subscribers: usize, frame_interval_ms: Option<f64>) {
    counter!("frame_coalescer_frames_dispatched_total").increment(1);
    gauge!("frame_coalescer_pending_subscribers").set(subscribers as f64);

    if let Some(interval) = frame_interval_ms {
        histogram!("frame_coalescer_frame_interval_ms").record(interval);
    }
}

/// 记录批次投递结果
pub fn record_batch_delivered(subscriber_id: &str, batch_size: usize, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "frame_coalescer_deliveries_total",
        "subscriber" => subscriber_id.to_string(),
        "status" => status.to_string()
    )
    .increment(1);

    if success {
        histogram!("frame_coalescer_batch_size").record(batch_size as f64);
    }
}

/// 记录 transformer 执行失败 (panic)
pub fn record_transformer_failure(subscriber_id: &str) {
    counter!(
        "frame_coalescer_transformer_failures_total",
        "subscriber" => subscriber_id.to_string()
    )
    .increment(1);
}

/// 记录内部不变量被破坏 (例如没有未完成请求时帧却触发了)
pub fn record_defect(kind: &str) {
    counter!("frame_coalescer_defects_total", "kind" => kind.to_string()).increment(1);
}

/// 记录订阅者队列深度
pub fn record_queue_depth(subscriber_id: &str, depth: usize) {
    gauge!(
        "frame_coalescer_queue_depth",
        "subscriber" => subscriber_id.to_string()
    )
    .set(depth as f64);
}

/// 分发统计聚合器
///
/// 在内存中聚合每帧的分发情况，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct DispatchStatsAggregator {
    /// 已分发帧数
    pub total_frames: u64,

    /// 投递成功的批次数
    pub total_batches: u64,

    /// 投递成功的结果总数
    pub total_results: u64,

    /// transformer 失败次数 (按订阅者计)
    pub transformer_failures: u64,

    /// 投递失败次数
    pub delivery_failures: u64,

    /// 每个批次的大小
    pub batch_size_stats: RunningStats,

    /// 相邻两帧的时间间隔 (毫秒)
    pub frame_interval_stats: RunningStats,

    /// 每帧涉及的订阅者数
    pub subscribers_per_frame: RunningStats,

    last_timestamp: Option<f64>,
}

impl DispatchStatsAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 记录一帧开始分发，返回与上一帧的间隔
    pub fn begin_frame(&mut self, timestamp: f64, subscribers: usize) -> Option<f64> {
        self.total_frames += 1;
        self.subscribers_per_frame.push(subscribers as f64);

        let interval = self.last_timestamp.map(|prev| timestamp - prev);
        if let Some(interval) = interval {
            self.frame_interval_stats.push(interval);
        }
        self.last_timestamp = Some(timestamp);
        interval
    }

    /// 记录一个批次的投递结果
    pub fn record_batch(&mut self, batch_size: usize, delivered: bool) {
        if delivered {
            self.total_batches += 1;
            self.total_results += batch_size as u64;
            self.batch_size_stats.push(batch_size as f64);
        } else {
            self.delivery_failures += 1;
        }
    }

    /// 记录一次 transformer 失败
    pub fn record_transformer_failure(&mut self) {
        self.transformer_failures += 1;
    }

    /// 生成摘要报告
    pub fn summary(&self) -> DispatchSummary {
        DispatchSummary {
            total_frames: self.total_frames,
            total_batches: self.total_batches,
            total_results: self.total_results,
            transformer_failures: self.transformer_failures,
            delivery_failures: self.delivery_failures,
            batch_size: StatsSummary::from(&self.batch_size_stats),
            frame_interval_ms: StatsSummary::from(&self.frame_interval_stats),
            subscribers_per_frame: StatsSummary::from(&self.subscribers_per_frame),
        }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 分发摘要
#[derive(Debug, Clone, Default)]
pub struct DispatchSummary {
    pub total_frames: u64,
    pub total_batches: u64,
    pub total_results: u64,
    pub transformer_failures: u64,
    pub delivery_failures: u64,
    pub batch_size: StatsSummary,
    pub frame_interval_ms: StatsSummary,
    pub subscribers_per_frame: StatsSummary,
}

impl DispatchSummary {
    /// 平均每帧投递的结果数
    pub fn results_per_frame(&self) -> f64 {
        if self.total_frames == 0 {
            0.0
        } else {
            self.total_results as f64 / self.total_frames as f64
        }
    }
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Dispatch Summary ===")?;
        writeln!(f, "Frames dispatched: {}", self.total_frames)?;
        writeln!(
            f,
            "Batches delivered: {} ({} results, {:.2} per frame)",
            self.total_batches,
            self.total_results,
            self.results_per_frame()
        )?;
        writeln!(f, "Transformer failures: {}", self.transformer_failures)?;
        writeln!(f, "Delivery failures: {}", self.delivery_failures)?;
        writeln!(f, "Batch size: {}", self.batch_size)?;
        writeln!(f, "Frame interval (ms): {}", self.frame_interval_ms)?;
        writeln!(f, "Subscribers per frame: {}", self.subscribers_per_frame)?;
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
            return;
        }

        self.min = self.min.min(value);
        self.max = self.max.max(value);

        let delta = value - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value - self.mean);
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 样本方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_running_stats() {
        let mut stats = RunningStats::default();
        for v in [1.0, 2.0, 3.0, 4.0, 5.0] {
            stats.push(v);
        }

        assert_eq!(stats.count(), 5);
        assert!((stats.mean() - 3.0).abs() < 1e-10);
        assert!((stats.min() - 1.0).abs() < 1e-10);
        assert!((stats.max() - 5.0).abs() < 1e-10);
        assert!((stats.variance() - 2.5).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_frame_intervals() {
        let mut aggregator = DispatchStatsAggregator::new();

        assert_eq!(aggregator.begin_frame(100.0, 2), None);
        assert_eq!(aggregator.begin_frame(116.0, 1), Some(16.0));
        assert_eq!(aggregator.begin_frame(133.0, 3), Some(17.0));

        let summary = aggregator.summary();
        assert_eq!(summary.total_frames, 3);
        assert_eq!(summary.frame_interval_ms.count, 2);
        assert!((summary.frame_interval_ms.mean - 16.5).abs() < 1e-10);
        assert!((summary.subscribers_per_frame.mean - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_aggregator_batches_and_failures() {
        let mut aggregator = DispatchStatsAggregator::new();
        aggregator.begin_frame(10.0, 3);
        aggregator.record_batch(2, true);
        aggregator.record_batch(4, true);
        aggregator.record_batch(1, false);
        aggregator.record_transformer_failure();

        let summary = aggregator.summary();
        assert_eq!(summary.total_batches, 2);
        assert_eq!(summary.total_results, 6);
        assert_eq!(summary.delivery_failures, 1);
        assert_eq!(summary.transformer_failures, 1);
        assert!((summary.results_per_frame() - 6.0).abs() < 1e-10);

        aggregator.reset();
        assert_eq!(aggregator.summary().total_frames, 0);
    }

    #[test]
    fn test_summary_display() {
        let summary = DispatchSummary {
            total_frames: 60,
            total_batches: 120,
            total_results: 240,
            batch_size: StatsSummary {
                count: 120,
                min: 1.0,
                max: 3.0,
                mean: 2.0,
                std_dev: 0.5,
            },
            ..Default::default()
        };

        let output = summary.to_string();
        assert!(output.contains("Frames dispatched: 60"));
        assert!(output.contains("4.00 per frame"));
        assert!(output.contains("Frame interval (ms): N/A"));
    }
}
