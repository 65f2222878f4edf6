//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束 (interval_ms 范围、queue_capacity >= 1、至少一个订阅者)，由 `validator` derive 提供
//! - subscriber id 非空且唯一
//! - file sink 必须提供 base_path

use std::collections::HashSet;

use contracts::{CoalescerBlueprint, ContractError, SinkType};
use validator::Validate;

/// 校验 CoalescerBlueprint 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(blueprint: &CoalescerBlueprint) -> Result<(), ContractError> {
    validate_fields(blueprint)?;
    validate_subscriber_ids(blueprint)?;
    validate_sink_params(blueprint)?;
    Ok(())
}

/// 字段级约束
fn validate_fields(blueprint: &CoalescerBlueprint) -> Result<(), ContractError> {
    blueprint.validate().map_err(|errors| {
        let field = errors
            .field_errors()
            .keys()
            .next()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "blueprint".to_string());
        ContractError::config_validation(field, errors.to_string())
    })
}

/// 校验 subscriber id 非空且唯一
fn validate_subscriber_ids(blueprint: &CoalescerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, subscriber) in blueprint.subscribers.iter().enumerate() {
        if subscriber.id.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("subscribers[{idx}].id"),
                "subscriber id cannot be empty",
            ));
        }
        if !seen.insert(subscriber.id.as_str()) {
            return Err(ContractError::config_validation(
                format!("subscribers[id={}]", subscriber.id),
                "duplicate subscriber id",
            ));
        }
    }
    Ok(())
}

/// 校验 sink 参数
fn validate_sink_params(blueprint: &CoalescerBlueprint) -> Result<(), ContractError> {
    for subscriber in &blueprint.subscribers {
        if subscriber.sink_type == SinkType::File
            && subscriber
                .params
                .get("base_path")
                .is_none_or(|p| p.trim().is_empty())
        {
            return Err(ContractError::config_validation(
                format!("subscribers[{}].params.base_path", subscriber.id),
                "file sink requires a non-empty base_path",
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{ClockConfig, ClockKind, ConfigVersion, SubscriberConfig};
    use std::collections::HashMap;

    fn minimal_blueprint() -> CoalescerBlueprint {
        CoalescerBlueprint {
            version: ConfigVersion::V1,
            clock: ClockConfig {
                kind: ClockKind::Interval,
                interval_ms: 16.0,
            },
            subscribers: vec![SubscriberConfig {
                id: "hud".into(),
                sink_type: SinkType::Log,
                queue_capacity: 16,
                params: HashMap::new(),
            }],
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(validate(&minimal_blueprint()).is_ok());
    }

    #[test]
    fn test_duplicate_subscriber_id() {
        let mut bp = minimal_blueprint();
        bp.subscribers.push(bp.subscribers[0].clone());
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("duplicate subscriber id"), "got: {err}");
    }

    #[test]
    fn test_empty_subscriber_id() {
        let mut bp = minimal_blueprint();
        bp.subscribers[0].id = " ".into();
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("cannot be empty"), "got: {err}");
    }

    #[test]
    fn test_interval_out_of_range() {
        let mut bp = minimal_blueprint();
        bp.clock.interval_ms = -1.0;
        let err = validate(&bp).unwrap_err();
        assert!(matches!(err, ContractError::ConfigValidation { .. }));
        assert!(err.to_string().contains("interval_ms"), "got: {err}");
    }

    #[test]
    fn test_zero_queue_capacity() {
        let mut bp = minimal_blueprint();
        bp.subscribers[0].queue_capacity = 0;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("queue_capacity"), "got: {err}");
    }

    #[test]
    fn test_file_sink_requires_base_path() {
        let mut bp = minimal_blueprint();
        bp.subscribers[0].sink_type = SinkType::File;
        let err = validate(&bp).unwrap_err().to_string();
        assert!(err.contains("base_path"), "got: {err}");

        bp.subscribers[0]
            .params
            .insert("base_path".into(), "./frames".into());
        assert!(validate(&bp).is_ok());
    }
}
