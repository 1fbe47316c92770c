//! Panel configuration and the per-field merge that resolves it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Edge of the viewport a panel slides in from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Position {
    Start,
    #[default]
    End,
}

/// Panel configuration. Every field is optional so a partial value can be
/// layered over another with [`PanelOptions::merge`].
///
/// Dimension and class strings are passed through untouched; the stack never
/// validates them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PanelOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable_close: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_close_button: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub panel_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub backdrop_class: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_backdrop: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub z_index: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

pub const DEFAULT_Z_INDEX: i32 = 1000;

impl PanelOptions {
    /// Built-in defaults, the lowest layer of every resolved option set.
    pub fn defaults() -> Self {
        Self {
            position: Some(Position::End),
            disable_close: Some(false),
            show_close_button: Some(true),
            width: Some("100%".to_string()),
            min_width: Some("250px".to_string()),
            max_width: Some("400px".to_string()),
            panel_class: None,
            backdrop_class: None,
            has_backdrop: Some(true),
            z_index: Some(DEFAULT_Z_INDEX),
            data: None,
        }
    }

    /// Layer `over` on top of `self`: each field set in `over` wins.
    pub fn merge(&self, over: &PanelOptions) -> PanelOptions {
        PanelOptions {
            position: over.position.or(self.position),
            disable_close: over.disable_close.or(self.disable_close),
            show_close_button: over.show_close_button.or(self.show_close_button),
            width: over.width.clone().or_else(|| self.width.clone()),
            min_width: over.min_width.clone().or_else(|| self.min_width.clone()),
            max_width: over.max_width.clone().or_else(|| self.max_width.clone()),
            panel_class: over.panel_class.clone().or_else(|| self.panel_class.clone()),
            backdrop_class: over
                .backdrop_class
                .clone()
                .or_else(|| self.backdrop_class.clone()),
            has_backdrop: over.has_backdrop.or(self.has_backdrop),
            z_index: over.z_index.or(self.z_index),
            data: over.data.clone().or_else(|| self.data.clone()),
        }
    }

    pub fn position(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn disable_close(mut self, disable: bool) -> Self {
        self.disable_close = Some(disable);
        self
    }

    pub fn show_close_button(mut self, show: bool) -> Self {
        self.show_close_button = Some(show);
        self
    }

    pub fn width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    pub fn min_width(mut self, min_width: impl Into<String>) -> Self {
        self.min_width = Some(min_width.into());
        self
    }

    pub fn max_width(mut self, max_width: impl Into<String>) -> Self {
        self.max_width = Some(max_width.into());
        self
    }

    pub fn panel_class(mut self, class: impl Into<String>) -> Self {
        self.panel_class = Some(class.into());
        self
    }

    pub fn backdrop_class(mut self, class: impl Into<String>) -> Self {
        self.backdrop_class = Some(class.into());
        self
    }

    pub fn has_backdrop(mut self, has_backdrop: bool) -> Self {
        self.has_backdrop = Some(has_backdrop);
        self
    }

    pub fn z_index(mut self, z_index: i32) -> Self {
        self.z_index = Some(z_index);
        self
    }

    pub fn data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Resolved `disableClose`, false when unset.
    pub fn is_close_disabled(&self) -> bool {
        self.disable_close.unwrap_or(false)
    }

    /// Resolved `hasBackdrop`; only an explicit `false` turns it off.
    pub fn wants_backdrop(&self) -> bool {
        self.has_backdrop != Some(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let defaults = PanelOptions::defaults();
        assert_eq!(defaults.position, Some(Position::End));
        assert_eq!(defaults.width.as_deref(), Some("100%"));
        assert_eq!(defaults.max_width.as_deref(), Some("400px"));
        assert_eq!(defaults.min_width.as_deref(), Some("250px"));
        assert_eq!(defaults.show_close_button, Some(true));
        assert_eq!(defaults.has_backdrop, Some(true));
        assert_eq!(defaults.z_index, Some(1000));
        assert!(defaults.data.is_none());
    }

    #[test]
    fn test_merge_overrides_per_field() {
        let base = PanelOptions::defaults();
        let over = PanelOptions::default().z_index(1500).position(Position::Start);

        let merged = base.merge(&over);
        assert_eq!(merged.z_index, Some(1500));
        assert_eq!(merged.position, Some(Position::Start));
        assert_eq!(merged.width.as_deref(), Some("100%"));
        assert_eq!(merged.max_width.as_deref(), Some("400px"));
    }

    #[test]
    fn test_merge_with_empty_is_identity() {
        let base = PanelOptions::defaults().data(json!({"a": 1}));
        assert_eq!(base.merge(&PanelOptions::default()), base);
    }

    #[test]
    fn test_backdrop_only_disabled_by_explicit_false() {
        assert!(PanelOptions::default().wants_backdrop());
        assert!(PanelOptions::default().has_backdrop(true).wants_backdrop());
        assert!(!PanelOptions::default().has_backdrop(false).wants_backdrop());
    }

    #[test]
    fn test_close_disabled_defaults_to_false() {
        assert!(!PanelOptions::default().is_close_disabled());
        assert!(PanelOptions::default().disable_close(true).is_close_disabled());
    }

    #[test]
    fn test_options_deserialize_camel_case() {
        let opts: PanelOptions = serde_json::from_str(
            r#"{"maxWidth":"90vw","zIndex":1200,"position":"start","hasBackdrop":false,"extra":1}"#,
        )
        .unwrap();
        assert_eq!(opts.max_width.as_deref(), Some("90vw"));
        assert_eq!(opts.z_index, Some(1200));
        assert_eq!(opts.position, Some(Position::Start));
        assert_eq!(opts.has_backdrop, Some(false));
        assert!(opts.width.is_none());
    }

    #[test]
    fn test_options_serialize_skips_unset() {
        let json = serde_json::to_value(PanelOptions::default().width("450px")).unwrap();
        assert_eq!(json, json!({"width": "450px"}));
    }
}
