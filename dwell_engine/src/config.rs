// Copyright 2025 the Dwell Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine configuration.
//!
//! Configuration is sourced externally (a settings store, a `configure`
//! message) as JSON. Every field has a default, so a partial document only
//! overrides what it names.
//!
//! ```
//! use dwell_engine::config::EngineConfig;
//!
//! let config = EngineConfig::from_json(r#"{ "dwell": { "generic-ms": 1200 } }"#).unwrap();
//! assert_eq!(config.dwell.generic_ms, 1200);
//! assert_eq!(config.dwell.fine_control_ms, 500);
//! ```

use kurbo::Size;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::selector::SelectorList;

/// Dwell durations in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct DwellTimings {
    /// Dwell on page elements under the coarse pointer.
    pub generic_ms: u64,
    /// Dwell on fine UI controls (toolbar buttons, keys).
    pub fine_control_ms: u64,
}

impl Default for DwellTimings {
    fn default() -> Self {
        Self {
            generic_ms: 800,
            fine_control_ms: 500,
        }
    }
}

/// Size of the query window centered on the pointer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellRange {
    /// Window width in CSS pixels.
    pub width: f64,
    /// Window height in CSS pixels.
    pub height: f64,
}

impl DwellRange {
    /// As a `kurbo` size.
    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }
}

impl Default for DwellRange {
    fn default() -> Self {
        Self {
            width: 60.0,
            height: 60.0,
        }
    }
}

/// Re-index scheduling delays in milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RebuildTimings {
    /// Wait after a qualifying mutation before rebuilding.
    pub mutation_settle_ms: u64,
    /// Window after a qualifying mutation during which further mutations are ignored.
    pub mutation_cooldown_ms: u64,
    /// Wait after the last scroll event before rebuilding.
    pub scroll_settle_ms: u64,
}

impl Default for RebuildTimings {
    fn default() -> Self {
        Self {
            mutation_settle_ms: 50,
            mutation_cooldown_ms: 500,
            scroll_settle_ms: 150,
        }
    }
}

/// Names of the DOM artifacts the engine itself creates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ArtifactConfig {
    /// `id` of the cursor element.
    pub cursor_id: String,
    /// Classes added to highlighted or visualized nodes.
    pub marker_classes: Vec<String>,
}

impl Default for ArtifactConfig {
    fn default() -> Self {
        Self {
            cursor_id: "dwell-cursor".into(),
            marker_classes: vec![
                "dwell-highlight".into(),
                "dwell-visualized".into(),
                "dwell-region-highlight".into(),
            ],
        }
    }
}

/// Everything the engine reads from the outside.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct EngineConfig {
    /// Dwell durations.
    pub dwell: DwellTimings,
    /// Query window around the pointer.
    pub range: DwellRange,
    /// Selectors for interactive elements.
    pub element_selectors: Vec<String>,
    /// Selectors for navigation regions.
    pub region_selectors: Vec<String>,
    /// Items per quadtree cell before it subdivides.
    pub quadtree_capacity: usize,
    /// Re-index scheduling.
    pub rebuild: RebuildTimings,
    /// Engine-owned DOM artifacts.
    pub artifacts: ArtifactConfig,
}

const ELEMENT_SELECTORS: &[&str] = &[
    "a[href]",
    "button",
    "input",
    "select",
    "textarea",
    "summary",
    "[contenteditable]",
    "[role=button]",
    "[role=link]",
    "[role=checkbox]",
    "[role=radio]",
    "[role=switch]",
    "[role=tab]",
    "[role=menuitem]",
    "[role=option]",
    "[role=textbox]",
    "[role=searchbox]",
    "[onclick]",
];

const REGION_SELECTORS: &[&str] = &[
    "nav",
    "[role=navigation]",
    "[role=menubar]",
    "[role=menu]",
    "[role=tablist]",
];

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            dwell: DwellTimings::default(),
            range: DwellRange::default(),
            element_selectors: ELEMENT_SELECTORS.iter().map(|s| (*s).to_owned()).collect(),
            region_selectors: REGION_SELECTORS.iter().map(|s| (*s).to_owned()).collect(),
            quadtree_capacity: 8,
            rebuild: RebuildTimings::default(),
            artifacts: ArtifactConfig::default(),
        }
    }
}

/// Selector lists compiled from a configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CompiledSelectors {
    /// Interactive elements.
    pub elements: SelectorList,
    /// Navigation regions.
    pub regions: SelectorList,
}

impl EngineConfig {
    /// Decode and validate a JSON configuration.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.dwell.generic_ms == 0 {
            return Err(ConfigError::ZeroDuration("dwell.generic-ms"));
        }
        if self.dwell.fine_control_ms == 0 {
            return Err(ConfigError::ZeroDuration("dwell.fine-control-ms"));
        }
        let DwellRange { width, height } = self.range;
        if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
            return Err(ConfigError::InvalidRange { width, height });
        }
        if self.quadtree_capacity == 0 {
            return Err(ConfigError::ZeroCapacity);
        }
        self.compile_selectors()?;
        Ok(())
    }

    /// Parse both selector lists.
    pub fn compile_selectors(&self) -> Result<CompiledSelectors, ConfigError> {
        Ok(CompiledSelectors {
            elements: SelectorList::parse(&self.element_selectors)?,
            regions: SelectorList::parse(&self.region_selectors)?,
        })
    }

    /// Whether switching from `self` to `other` changes what gets collected.
    pub fn changes_collection(&self, other: &Self) -> bool {
        self.element_selectors != other.element_selectors
            || self.region_selectors != other.region_selectors
            || self.artifacts != other.artifacts
            || self.quadtree_capacity != other.quadtree_capacity
            || self.range != other.range
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SelectorError;

    #[test]
    fn defaults_are_valid() {
        let config = EngineConfig::default();
        config.validate().unwrap();
        assert_eq!(config.dwell.generic_ms, 800);
        assert_eq!(config.range.size(), Size::new(60.0, 60.0));
        let compiled = config.compile_selectors().unwrap();
        assert_eq!(compiled.elements.len(), ELEMENT_SELECTORS.len());
        assert_eq!(compiled.regions.len(), REGION_SELECTORS.len());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = EngineConfig::from_json(
            r#"{
                "range": { "width": 80 },
                "region-selectors": ["nav", "ul.menu"],
                "rebuild": { "scroll-settle-ms": 300 }
            }"#,
        )
        .unwrap();
        assert_eq!(config.range.width, 80.0);
        assert_eq!(config.range.height, 60.0);
        assert_eq!(config.region_selectors, vec!["nav", "ul.menu"]);
        assert_eq!(config.rebuild.scroll_settle_ms, 300);
        assert_eq!(config.rebuild.mutation_cooldown_ms, 500);
        assert_eq!(config.artifacts.cursor_id, "dwell-cursor");
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            EngineConfig::from_json(r#"{ "dwell": { "generic-ms": 0 } }"#),
            Err(ConfigError::ZeroDuration("dwell.generic-ms"))
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "range": { "width": -1 } }"#),
            Err(ConfigError::InvalidRange { .. })
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "quadtree-capacity": 0 }"#),
            Err(ConfigError::ZeroCapacity)
        ));
        assert!(matches!(
            EngineConfig::from_json(r#"{ "element-selectors": ["a >"] }"#),
            Err(ConfigError::Selector(SelectorError::Unexpected { .. }))
        ));
        assert!(matches!(
            EngineConfig::from_json("{ not json"),
            Err(ConfigError::Json(_))
        ));
    }

    #[test]
    fn collection_changes() {
        let base = EngineConfig::default();
        let mut slower = base.clone();
        slower.dwell.generic_ms = 1500;
        assert!(!base.changes_collection(&slower));

        let mut narrower = base.clone();
        narrower.element_selectors = vec!["button".into()];
        assert!(base.changes_collection(&narrower));
    }
}
