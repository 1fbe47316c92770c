//! Scripted scenarios for the demo binary. Each one opens panels the way a
//! page would, waits for them to settle, then closes them and collects the
//! results.

use anyhow::Context;
use clap::ValueEnum;
use serde::Serialize;
use serde_json::{json, Value};

use crate::host::HostView;
use crate::options::{PanelOptions, Position};
use crate::stack::{StackManager, SETTLE_DELAY};

/// Content the demo renders inside a panel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DemoPage {
    pub title: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scenario {
    Basic,
    Position,
    Width,
    Data,
    Events,
    Form,
    Details,
    Wizard,
    ZIndex,
    DisableClose,
    Playground,
}

/// One panel a scenario opens.
#[derive(Debug, Clone)]
pub struct PanelSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub options: PanelOptions,
}

impl PanelSpec {
    fn new(key: &'static str, title: &'static str, options: PanelOptions) -> Self {
        Self {
            key,
            title,
            options,
        }
    }
}

impl Scenario {
    pub fn all() -> &'static [Scenario] {
        Scenario::value_variants()
    }

    /// Panels to open, bottom of the stack first. `playground` supplies the
    /// options for [`Scenario::Playground`].
    pub fn panels(self, playground: &PanelOptions) -> Vec<PanelSpec> {
        let narrow = || PanelOptions::default().width("400px").max_width("95%");
        match self {
            Scenario::Basic => vec![PanelSpec::new(
                "demo",
                "Basic Demo",
                narrow().data(json!({"type": "basic"})),
            )],
            Scenario::Position => vec![PanelSpec::new(
                "position-demo",
                "Left Side Positioning",
                PanelOptions::default()
                    .position(Position::Start)
                    .width("600px")
                    .max_width("95%")
                    .data(json!({"type": "position"})),
            )],
            Scenario::Width => vec![PanelSpec::new(
                "width-demo",
                "Customizable Width",
                PanelOptions::default()
                    .width("600px")
                    .max_width("95%")
                    .data(json!({"type": "width"})),
            )],
            Scenario::Data => vec![PanelSpec::new(
                "data-demo",
                "Data Passing",
                narrow().data(json!({
                    "type": "data",
                    "complexData": {
                        "items": [
                            {"id": 1, "name": "Item 1", "value": 100},
                            {"id": 2, "name": "Item 2", "value": 200},
                            {"id": 3, "name": "Item 3", "value": 300}
                        ],
                        "user": {"id": 123, "name": "John Doe", "email": "john@example.com"}
                    }
                })),
            )],
            Scenario::Events => vec![PanelSpec::new(
                "events-demo",
                "Events",
                narrow().data(json!({"type": "events"})),
            )],
            Scenario::Form => vec![PanelSpec::new(
                "form-example",
                "Contact Form Example",
                narrow().data(json!({"type": "form"})),
            )],
            Scenario::Details => vec![PanelSpec::new(
                "details-example",
                "Product Details",
                PanelOptions::default()
                    .width("500px")
                    .max_width("95%")
                    .data(json!({
                        "type": "details",
                        "product": {
                            "id": 123,
                            "name": "Premium Widget",
                            "price": 299.99,
                            "features": ["High durability", "Advanced technology", "Energy efficient"]
                        }
                    })),
            )],
            Scenario::Wizard => vec![PanelSpec::new(
                "wizard-example",
                "Multi-Step Wizard",
                PanelOptions::default()
                    .width("600px")
                    .max_width("95%")
                    .data(json!({
                        "type": "wizard",
                        "steps": [
                            {"title": "Step 1", "description": "Choose a package"},
                            {"title": "Step 2", "description": "Enter your details"},
                            {"title": "Step 3", "description": "Payment information"},
                            {"title": "Step 4", "description": "Confirmation"}
                        ]
                    })),
            )],
            Scenario::ZIndex => vec![
                PanelSpec::new(
                    "zindex-test-1",
                    "Z-Index Test - Layer 1",
                    narrow().z_index(1200).data(json!({"type": "zindex"})),
                ),
                PanelSpec::new(
                    "zindex-test-2",
                    "Z-Index Test - Layer 2",
                    PanelOptions::default()
                        .width("350px")
                        .max_width("90%")
                        .z_index(1500)
                        .position(Position::Start)
                        .data(json!({"type": "zindex-high"})),
                ),
            ],
            Scenario::DisableClose => vec![PanelSpec::new(
                "disable-close-demo",
                "Disable Close Demo",
                narrow()
                    .disable_close(true)
                    .data(json!({"type": "disable-close"})),
            )],
            Scenario::Playground => vec![PanelSpec::new(
                "playground-test",
                "Interactive Playground",
                playground.clone(),
            )],
        }
    }
}

/// What a scenario run observed.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub scenario: Scenario,
    /// Stack keys once every panel was open.
    pub opened: Vec<String>,
    pub view: HostView,
    /// Host close requests that were refused because of `disableClose`.
    pub refused_close_requests: Vec<String>,
    /// `(key, result)` in the order the panels finished closing.
    pub closed: Vec<(String, Option<Value>)>,
}

/// Open every panel of `scenario`, let them settle, then close them from the
/// top down.
pub async fn run_scenario(
    stack: &StackManager<DemoPage>,
    scenario: Scenario,
    playground: &PanelOptions,
) -> anyhow::Result<ScenarioReport> {
    let specs = scenario.panels(playground);
    let mut handles = Vec::with_capacity(specs.len());

    for spec in specs {
        let page = DemoPage {
            title: spec.title.to_string(),
        };
        let handle = stack.open(spec.key, page, Some(spec.options));
        tokio::time::timeout(SETTLE_DELAY * 4, handle.after_opened())
            .await
            .with_context(|| format!("side page {} never finished opening", spec.key))?;
        tracing::info!(key = spec.key, "side page opened");
        handles.push(handle);
    }

    let opened = stack.keys();
    let view = HostView::from_snapshot(&stack.current_snapshot());

    let mut refused_close_requests = Vec::new();
    let mut closed = Vec::with_capacity(handles.len());
    for handle in handles.iter().rev() {
        let result = json!({ "scenario": scenario, "key": handle.key() });
        let after_closed = handle.after_closed();

        if !stack.request_close(handle.key(), Some(result.clone())) {
            tracing::info!(key = handle.key(), "close request refused, closing from code");
            refused_close_requests.push(handle.key().to_string());
            handle.close(Some(result));
        }

        let value = tokio::time::timeout(SETTLE_DELAY * 4, after_closed)
            .await
            .with_context(|| format!("side page {} never finished closing", handle.key()))?;
        tracing::info!(key = handle.key(), ?value, "side page closed");
        closed.push((handle.key().to_string(), value));
    }

    Ok(ScenarioReport {
        scenario,
        opened,
        view,
        refused_close_requests,
        closed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GlobalConfig;

    #[test]
    fn test_every_scenario_opens_something() {
        let playground = PanelOptions::default().width("500px");
        for scenario in Scenario::all() {
            assert!(!scenario.panels(&playground).is_empty(), "{scenario:?}");
        }
    }

    #[test]
    fn test_playground_uses_supplied_options() {
        let playground = PanelOptions::default().z_index(1700).has_backdrop(false);
        let specs = Scenario::Playground.panels(&playground);
        assert_eq!(specs[0].options, playground);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zindex_scenario() {
        let stack = StackManager::new(GlobalConfig::default());
        let report = run_scenario(&stack, Scenario::ZIndex, &PanelOptions::default())
            .await
            .unwrap();

        assert_eq!(report.opened, vec!["zindex-test-1", "zindex-test-2"]);
        assert_eq!(report.view.overlay_z_index, 1499);
        let closed: Vec<_> = report.closed.iter().map(|(k, _)| k.as_str()).collect();
        assert_eq!(closed, vec!["zindex-test-2", "zindex-test-1"]);
        assert!(stack.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_disable_close_scenario_closes_from_code() {
        let stack = StackManager::new(GlobalConfig::default());
        let report = run_scenario(&stack, Scenario::DisableClose, &PanelOptions::default())
            .await
            .unwrap();

        assert_eq!(report.refused_close_requests, vec!["disable-close-demo"]);
        assert_eq!(
            report.closed[0].1,
            Some(json!({"scenario": "disable-close", "key": "disable-close-demo"}))
        );
    }
}
