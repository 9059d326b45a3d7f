//! 行业配置查询
//!
//! 所有查询使用 `$n` 占位符，PostgreSQL 和 SQLite 均可执行。
//! 数值列统一转为文本，避免经过浮点数。

/// 按ID查询启用的行业 ($1 = focus_group_id, $2 = platform)
pub const FOCUS_GROUP_BY_ID: &str = r#"
    SELECT focus_group_id, group_name, group_code
    FROM focus_groups
    WHERE focus_group_id = $1
      AND platform = $2
      AND is_active = TRUE
"#;

/// 按展示顺序列出启用的行业 ($1 = platform)
pub const ACTIVE_FOCUS_GROUPS: &str = r#"
    SELECT focus_group_id
    FROM focus_groups
    WHERE platform = $1
      AND is_active = TRUE
    ORDER BY display_order
"#;

/// 当前生效的维度权重 ($1 = focus_group_id)
pub const DIMENSION_WEIGHTS: &str = r#"
    SELECT d.dimension_code, CAST(w.weight AS TEXT) AS weight
    FROM focus_group_dimension_weights w
    JOIN dimensions d ON w.dimension_id = d.dimension_id
    WHERE w.focus_group_id = $1
      AND w.is_current = TRUE
    ORDER BY d.display_order
"#;

/// 当前生效的校准参数 ($1 = focus_group_id)
pub const CALIBRATIONS: &str = r#"
    SELECT parameter_name, CAST(parameter_value AS TEXT) AS parameter_value
    FROM focus_group_calibrations
    WHERE focus_group_id = $1
      AND is_current = TRUE
    ORDER BY parameter_name
"#;
