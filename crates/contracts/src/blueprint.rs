//! CoalescerBlueprint - Config Loader 输出
//!
//! 描述完整的运行配置：帧时钟、订阅者及其输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use validator::Validate;

use crate::{SubscriberId, FALLBACK_FRAME_INTERVAL_MS};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的运行配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CoalescerBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 帧时钟设置
    #[serde(default)]
    #[validate(nested)]
    pub clock: ClockConfig,

    /// 订阅者列表（至少一个）
    #[validate(length(min = 1, message = "at least one subscriber is required"), nested)]
    pub subscribers: Vec<SubscriberConfig>,
}

/// 帧时钟配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ClockConfig {
    /// 时钟类型
    #[serde(default)]
    pub kind: ClockKind,

    /// 帧间隔 (毫秒)，仅 interval 时钟使用
    #[serde(default = "default_interval_ms")]
    #[validate(range(exclusive_min = 0.0, max = 1000.0))]
    pub interval_ms: f64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            kind: ClockKind::default(),
            interval_ms: default_interval_ms(),
        }
    }
}

fn default_interval_ms() -> f64 {
    FALLBACK_FRAME_INTERVAL_MS
}

/// 帧时钟类型
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockKind {
    /// 固定间隔定时器 (~16.7ms)
    #[default]
    Interval,
    /// 手动触发（测试/逐帧调试）
    Manual,
}

/// 订阅者配置
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SubscriberConfig {
    /// 唯一标识符
    pub id: SubscriberId,

    /// 输出类型
    pub sink_type: SinkType,

    /// 投递队列容量
    #[serde(default = "default_queue_capacity")]
    #[validate(range(min = 1))]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    64
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// 文件输出 (JSON Lines)
    File,
    /// 内存记录
    Memory,
}

impl CoalescerBlueprint {
    /// 按 id 查找订阅者
    pub fn subscriber(&self, id: &str) -> Option<&SubscriberConfig> {
        self.subscribers.iter().find(|s| s.id == id)
    }

    /// 所有订阅者 id（按配置顺序）
    pub fn subscriber_ids(&self) -> Vec<SubscriberId> {
        self.subscribers.iter().map(|s| s.id.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subscriber(id: &str, sink_type: SinkType) -> SubscriberConfig {
        SubscriberConfig {
            id: id.into(),
            sink_type,
            queue_capacity: 8,
            params: HashMap::new(),
        }
    }

    #[test]
    fn test_clock_defaults_to_fallback_interval() {
        let clock = ClockConfig::default();
        assert_eq!(clock.kind, ClockKind::Interval);
        assert!((clock.interval_ms - 16.666).abs() < 0.01);
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let bp = CoalescerBlueprint {
            version: ConfigVersion::V1,
            clock: ClockConfig {
                kind: ClockKind::Interval,
                interval_ms: 0.0,
            },
            subscribers: vec![subscriber("hud", SinkType::Log)],
        };
        assert!(bp.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_empty_subscribers() {
        let bp = CoalescerBlueprint {
            version: ConfigVersion::V1,
            clock: ClockConfig::default(),
            subscribers: Vec::new(),
        };
        assert!(bp.validate().is_err());
    }

    #[test]
    fn test_subscriber_lookup() {
        let bp = CoalescerBlueprint {
            version: ConfigVersion::V1,
            clock: ClockConfig::default(),
            subscribers: vec![
                subscriber("hud", SinkType::Log),
                subscriber("rec", SinkType::Memory),
            ],
        };
        assert!(bp.validate().is_ok());
        assert_eq!(bp.subscriber("rec").map(|s| s.sink_type), Some(SinkType::Memory));
        assert!(bp.subscriber("nope").is_none());
        assert_eq!(bp.subscriber_ids(), vec![SubscriberId::from("hud"), "rec".into()]);
    }
}
