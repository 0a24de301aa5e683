//! YAML rule files.
//!
//! A rule file is the data form of a pipeline. Each rule becomes one hook,
//! in file order, so the first matching rule decides:
//!
//! ```yaml
//! rules:
//!   - tag: script
//!     skip: true
//!   - tag: pre
//!     component: code_block
//!     state:
//!       theme: dark
//!   - class: note
//!     component: note
//! ```
//!
//! A rule matches on `tag`, `class` or both, and does exactly one thing:
//! `skip: true` or `component: <name>`.

use std::path::Path;

use anyhow::{bail, Context};
use arbor_dispatch::{ComponentState, Element, Outcome, Pipeline};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RuleFile {
    #[serde(default)]
    rules: Vec<RawRule>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawRule {
    tag: Option<String>,
    class: Option<String>,
    #[serde(default)]
    skip: bool,
    component: Option<String>,
    #[serde(default)]
    state: Map<String, Value>,
}

/// What a matching rule does.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Skip,
    Use {
        component: String,
        state: Map<String, Value>,
    },
}

/// A validated rule.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub tag: Option<String>,
    pub class: Option<String>,
    pub action: Action,
}

impl Rule {
    pub fn matches(&self, el: &Element) -> bool {
        self.tag.as_deref().map_or(true, |tag| el.tag_name == tag)
            && self.class.as_deref().map_or(true, |class| el.has_class(class))
    }

    /// The component this rule selects, if any.
    pub fn component(&self) -> Option<&str> {
        match &self.action {
            Action::Use { component, .. } => Some(component),
            Action::Skip => None,
        }
    }

    fn outcome(&self, el: &Element, pipeline: &std::sync::Arc<Pipeline>) -> Outcome {
        match &self.action {
            Action::Skip => Outcome::Skip,
            Action::Use { component, state } => {
                let mut component_state = ComponentState::for_node(el.clone());
                component_state.extra = state.clone();
                pipeline.component(component.clone(), component_state)
            }
        }
    }
}

/// Parses and validates rule file contents.
pub fn parse(source: &str) -> anyhow::Result<Vec<Rule>> {
    let file: RuleFile = serde_yaml::from_str(source).context("invalid rule file")?;

    file.rules
        .into_iter()
        .enumerate()
        .map(|(index, raw)| validate(index, raw))
        .collect()
}

fn validate(index: usize, raw: RawRule) -> anyhow::Result<Rule> {
    if raw.tag.is_none() && raw.class.is_none() {
        bail!("rule #{index} needs a `tag` or `class` to match on");
    }
    let action = match (raw.skip, raw.component) {
        (true, None) => {
            if !raw.state.is_empty() {
                bail!("rule #{index} skips nodes, so it cannot have `state`");
            }
            Action::Skip
        }
        (false, Some(component)) => Action::Use {
            component,
            state: raw.state,
        },
        (true, Some(_)) => bail!("rule #{index} sets both `skip` and `component`"),
        (false, None) => bail!("rule #{index} needs either `skip: true` or a `component`"),
    };
    Ok(Rule {
        tag: raw.tag,
        class: raw.class,
        action,
    })
}

/// Reads and validates a rule file.
pub fn load(path: &Path) -> anyhow::Result<Vec<Rule>> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("could not read rule file {}", path.display()))?;
    let rules = parse(&source).with_context(|| format!("in {}", path.display()))?;
    debug!(count = rules.len(), path = %path.display(), "loaded rules");
    Ok(rules)
}

/// Builds a pipeline with one hook per rule, in order.
pub fn pipeline(rules: Vec<Rule>) -> Pipeline {
    rules.into_iter().fold(Pipeline::new(), |pipeline, rule| {
        pipeline.hook(move |el, pipeline| {
            Ok(if rule.matches(el) {
                rule.outcome(el, pipeline)
            } else {
                Outcome::Continue
            })
        })
    })
}
