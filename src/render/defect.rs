//! Rendering of defects into report fragments.
//!
//! Each rule carries a main template and an optional event template. Both
//! are JSON text with `${key}` placeholders. Keys resolve against one lookup
//! table per defect, built from (later entries win):
//!
//! 1. the entity's stored metric values;
//! 2. the entity's identity attributes, so a metric named `file` or
//!    `function` never hides them;
//! 3. `checker` and `description` of the rule;
//! 4. per threshold, the metric key and short name bound to the observed
//!    value, and `<key>.threshold` / `<name>.threshold` bound to the limit.
//!
//! Keys missing from the table fall back to the entity's own metric lookup,
//! so aggregate statistics such as `${lines-of-code_max}` work too.
//!
//! The event template is rendered once per source (with `${source}` bound
//! to it); the results are joined with `",\n"` and replace `${EVENTS}` in
//! the main template.

use super::template::Template;
use crate::core::{format_metric_value, Measurable};
use crate::rules::Defect;
use rayon::prelude::*;
use std::borrow::Cow;
use std::collections::HashMap;
use thiserror::Error;

/// Reserved key replaced by the rendered events.
pub const EVENTS_KEY: &str = "EVENTS";
const EVENT_SEPARATOR: &str = ",\n";

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("checker {rule} has no defect template")]
    MissingTemplate { rule: String },

    #[error("defect of {rule} on '{entity}' is not valid JSON: {source}")]
    InvalidFragment {
        rule: String,
        entity: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A defect rendered into its report fragment.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedDefect {
    pub checker: String,
    pub fragment: serde_json::Value,
    /// Sources the defect refers to, sorted and de-duplicated.
    pub sources: Vec<String>,
}

impl RenderedDefect {
    pub fn sources_label(&self) -> String {
        self.sources.join(",")
    }
}

/// Renders defects with their rule's templates.
///
/// Every substituted string is JSON-escaped, since templates are JSON text.
#[derive(Debug, Clone, Default)]
pub struct DefectRenderer;

impl DefectRenderer {
    pub fn new() -> Self {
        Self
    }

    /// Lookup table for one defect.
    pub fn lookup_table(&self, defect: &Defect) -> HashMap<String, String> {
        let rule = &defect.rule;
        let entity = &defect.entity;
        let mut table = HashMap::new();

        for (key, value) in entity.metric_values() {
            table.insert(key, format_metric_value(value));
        }
        for (key, value) in entity.attributes() {
            table.insert(key.to_string(), json_escape(&value));
        }

        table.insert("checker".to_string(), json_escape(&rule.name));
        table.insert("description".to_string(), json_escape(&rule.description));

        for threshold in &rule.thresholds {
            let value = defect.observed(&threshold.metric).or_else(|| {
                entity
                    .is_metric(&threshold.metric)
                    .then(|| entity.metric(&threshold.metric))
                    .flatten()
            });
            if let Some(value) = value {
                let value = format_metric_value(value);
                table.insert(threshold.metric.clone(), value.clone());
                table.insert(threshold.name.clone(), value);
            }
            let limit = format_metric_value(threshold.limit);
            table.insert(format!("{}.threshold", threshold.metric), limit.clone());
            table.insert(format!("{}.threshold", threshold.name), limit);
        }

        table
    }

    /// Render the defect's main template to text.
    pub fn render_text(&self, defect: &Defect) -> Result<String, RenderError> {
        let rule = &defect.rule;
        let main = rule
            .defect_template
            .as_deref()
            .filter(|text| !text.trim().is_empty())
            .ok_or_else(|| RenderError::MissingTemplate {
                rule: rule.name.clone(),
            })?;

        let bindings = Bindings {
            table: self.lookup_table(defect),
            defect,
        };

        let events = match rule.event_template.as_deref() {
            Some(text) if !text.trim().is_empty() => {
                let event = Template::parse(text);
                defect
                    .entity
                    .sources_label()
                    .split(',')
                    .map(|source| {
                        let source = json_escape(source);
                        event.render(|key| {
                            if key == "source" {
                                Some(Cow::Borrowed(source.as_str()))
                            } else {
                                bindings.get(key)
                            }
                        })
                    })
                    .collect::<Vec<_>>()
                    .join(EVENT_SEPARATOR)
            }
            _ => String::new(),
        };

        Ok(Template::parse(main).render(|key| {
            if key == EVENTS_KEY {
                Some(Cow::Borrowed(events.as_str()))
            } else {
                bindings.get(key)
            }
        }))
    }

    /// Render one defect into a parsed report fragment.
    pub fn render(&self, defect: &Defect) -> Result<RenderedDefect, RenderError> {
        let text = self.render_text(defect)?;
        let fragment =
            serde_json::from_str(&text).map_err(|source| RenderError::InvalidFragment {
                rule: defect.rule.name.clone(),
                entity: defect.entity.name().to_string(),
                source,
            })?;
        Ok(RenderedDefect {
            checker: defect.rule.name.clone(),
            fragment,
            sources: defect.entity.sources(),
        })
    }

    /// Render every defect, logging and dropping the ones that fail.
    ///
    /// Output order follows `defects`.
    pub fn render_all(&self, defects: &[Defect]) -> Vec<RenderedDefect> {
        defects
            .par_iter()
            .filter_map(|defect| match self.render(defect) {
                Ok(rendered) => Some(rendered),
                Err(e) => {
                    log::error!("Cannot render defect: {}", e);
                    None
                }
            })
            .collect()
    }
}

/// Lookup table of one defect plus the entity's metric fallback.
struct Bindings<'d> {
    table: HashMap<String, String>,
    defect: &'d Defect,
}

impl Bindings<'_> {
    fn get(&self, key: &str) -> Option<Cow<'_, str>> {
        if let Some(value) = self.table.get(key) {
            return Some(Cow::Borrowed(value.as_str()));
        }
        let entity = &self.defect.entity;
        if entity.is_metric(key) {
            entity
                .metric(key)
                .map(|value| Cow::Owned(format_metric_value(value)))
        } else {
            None
        }
    }
}

/// Escape `value` for use inside a JSON string literal.
fn json_escape(value: &str) -> String {
    let quoted = serde_json::Value::String(value.to_string()).to_string();
    quoted[1..quoted.len() - 1].to_string()
}
