use ghost_perception::PerceptionConfig;
use ghost_scheduler::EnforcementMode;

/// Every tunable the orchestration engine reads at startup, each with a
/// documented default and an optional environment override. Layered the
/// way the kernel's config loader layers file-then-env, minus the file
/// layer: this binary has no on-disk config format of its own, only env.
#[derive(Debug, Clone, PartialEq)]
pub struct GhostConfig {
    pub use_toon_encoding: bool,
    pub context_count: usize,
    pub context_auto_replenish: bool,
    pub warm_minimum: usize,
    pub confidence_threshold: f64,
    pub ax_deficient_threshold: usize,
    pub scroll_step_px: i32,
    pub max_scroll_steps: u32,
    pub max_no_progress_steps: u32,
    pub max_steps_default: u32,
    pub max_retries_default: u32,
    pub resource_sample_interval_ms: u64,
    pub resource_enforcement: EnforcementMode,
    pub status_broadcast_hz: u32,
}

impl Default for GhostConfig {
    fn default() -> Self {
        Self {
            use_toon_encoding: true,
            context_count: 6,
            context_auto_replenish: true,
            warm_minimum: 2,
            confidence_threshold: 0.75,
            ax_deficient_threshold: 5,
            scroll_step_px: 800,
            max_scroll_steps: 8,
            max_no_progress_steps: 3,
            max_steps_default: 20,
            max_retries_default: 1,
            resource_sample_interval_ms: 5000,
            resource_enforcement: EnforcementMode::WarnOnly,
            status_broadcast_hz: 2,
        }
    }
}

impl GhostConfig {
    /// Builds config from compiled-in defaults layered with environment
    /// variable overrides, mirroring the kernel's file-then-env precedence
    /// with the file layer omitted.
    pub fn from_env() -> anyhow::Result<Self> {
        let defaults = Self::default();
        let mut builder = config::Config::builder()
            .set_default("use_toon_encoding", defaults.use_toon_encoding)?
            .set_default("context_count", defaults.context_count as i64)?
            .set_default("context_auto_replenish", defaults.context_auto_replenish)?
            .set_default("warm_minimum", defaults.warm_minimum as i64)?
            .set_default("confidence_threshold", defaults.confidence_threshold)?
            .set_default("ax_deficient_threshold", defaults.ax_deficient_threshold as i64)?
            .set_default("scroll_step_px", defaults.scroll_step_px as i64)?
            .set_default("max_scroll_steps", defaults.max_scroll_steps as i64)?
            .set_default("max_no_progress_steps", defaults.max_no_progress_steps as i64)?
            .set_default("max_steps_default", defaults.max_steps_default as i64)?
            .set_default("max_retries_default", defaults.max_retries_default as i64)?
            .set_default("resource_sample_interval_ms", defaults.resource_sample_interval_ms as i64)?
            .set_default("resource_enforcement", "WARN_ONLY")?
            .set_default("status_broadcast_hz", defaults.status_broadcast_hz as i64)?;

        for (env_name, key) in ENV_ALIASES {
            if let Ok(value) = std::env::var(env_name) {
                builder = builder.set_override(*key, value)?;
            }
        }
        let source = builder.build()?;

        Ok(Self {
            use_toon_encoding: source.get_bool("use_toon_encoding").unwrap_or(defaults.use_toon_encoding),
            context_count: source.get_int("context_count").map(|v| v as usize).unwrap_or(defaults.context_count),
            context_auto_replenish: source
                .get_bool("context_auto_replenish")
                .unwrap_or(defaults.context_auto_replenish),
            warm_minimum: source.get_int("warm_minimum").map(|v| v as usize).unwrap_or(defaults.warm_minimum),
            confidence_threshold: source.get_float("confidence_threshold").unwrap_or(defaults.confidence_threshold),
            ax_deficient_threshold: source
                .get_int("ax_deficient_threshold")
                .map(|v| v as usize)
                .unwrap_or(defaults.ax_deficient_threshold),
            scroll_step_px: source.get_int("scroll_step_px").map(|v| v as i32).unwrap_or(defaults.scroll_step_px),
            max_scroll_steps: source
                .get_int("max_scroll_steps")
                .map(|v| v as u32)
                .unwrap_or(defaults.max_scroll_steps),
            max_no_progress_steps: source
                .get_int("max_no_progress_steps")
                .map(|v| v as u32)
                .unwrap_or(defaults.max_no_progress_steps),
            max_steps_default: source
                .get_int("max_steps_default")
                .map(|v| v as u32)
                .unwrap_or(defaults.max_steps_default),
            max_retries_default: source
                .get_int("max_retries_default")
                .map(|v| v as u32)
                .unwrap_or(defaults.max_retries_default),
            resource_sample_interval_ms: source
                .get_int("resource_sample_interval_ms")
                .map(|v| v as u64)
                .unwrap_or(defaults.resource_sample_interval_ms),
            resource_enforcement: parse_enforcement_mode(
                &source.get_string("resource_enforcement").unwrap_or_else(|_| "WARN_ONLY".to_string()),
            ),
            status_broadcast_hz: source
                .get_int("status_broadcast_hz")
                .map(|v| v as u32)
                .unwrap_or(defaults.status_broadcast_hz),
        })
    }

    pub fn perception_config(&self) -> PerceptionConfig {
        PerceptionConfig {
            confidence_threshold: self.confidence_threshold,
            ax_deficient_threshold: self.ax_deficient_threshold,
            scroll_step_px: self.scroll_step_px,
            max_scroll_steps: self.max_scroll_steps,
            max_no_progress_steps: self.max_no_progress_steps,
            ..PerceptionConfig::default()
        }
    }
}

fn parse_enforcement_mode(value: &str) -> EnforcementMode {
    match value.trim().to_ascii_uppercase().as_str() {
        "KILL_TAB" => EnforcementMode::KillTab,
        _ => EnforcementMode::WarnOnly,
    }
}

/// The documented env var names don't follow a single prefix convention
/// (`PHASE2_CONFIDENCE_THRESHOLD` alongside `GHOST_CONTEXT_COUNT`), so each
/// is mapped to its config key explicitly via `set_override` rather than
/// relying on `config::Environment`'s prefix-stripping.
const ENV_ALIASES: &[(&str, &str)] = &[
    ("USE_TOON_ENCODING", "use_toon_encoding"),
    ("GHOST_CONTEXT_COUNT", "context_count"),
    ("GHOST_CONTEXT_AUTO_REPLENISH", "context_auto_replenish"),
    ("GHOST_CONTEXT_WARM_MIN", "warm_minimum"),
    ("PHASE2_CONFIDENCE_THRESHOLD", "confidence_threshold"),
    ("PHASE2_AX_DEFICIENT_THRESHOLD", "ax_deficient_threshold"),
    ("PHASE2_SCROLL_STEP_PX", "scroll_step_px"),
    ("PHASE2_MAX_SCROLL_STEPS", "max_scroll_steps"),
    ("PHASE2_MAX_NO_PROGRESS_STEPS", "max_no_progress_steps"),
    ("GHOST_BUDGET_SAMPLE_MS", "resource_sample_interval_ms"),
    ("GHOST_BUDGET_MODE", "resource_enforcement"),
    ("GHOST_STATUS_HZ", "status_broadcast_hz"),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_documented_table() {
        let config = GhostConfig::default();
        assert!(config.use_toon_encoding);
        assert_eq!(config.context_count, 6);
        assert_eq!(config.warm_minimum, 2);
        assert_eq!(config.confidence_threshold, 0.75);
        assert_eq!(config.resource_enforcement, EnforcementMode::WarnOnly);
        assert_eq!(config.status_broadcast_hz, 2);
    }

    #[test]
    fn parses_kill_tab_case_insensitively() {
        assert_eq!(parse_enforcement_mode("kill_tab"), EnforcementMode::KillTab);
        assert_eq!(parse_enforcement_mode("KILL_TAB"), EnforcementMode::KillTab);
        assert_eq!(parse_enforcement_mode("warn_only"), EnforcementMode::WarnOnly);
        assert_eq!(parse_enforcement_mode("garbage"), EnforcementMode::WarnOnly);
    }

    #[test]
    fn perception_config_carries_the_configured_thresholds() {
        let config = GhostConfig { confidence_threshold: 0.9, ax_deficient_threshold: 3, ..GhostConfig::default() };
        let perception = config.perception_config();
        assert_eq!(perception.confidence_threshold, 0.9);
        assert_eq!(perception.ax_deficient_threshold, 3);
    }
}
