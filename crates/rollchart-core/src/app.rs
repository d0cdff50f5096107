//! Application root and manifest synthesis
//!
//! Synthesis renders every chart to a multi-document YAML string. Writing
//! the result anywhere is left to the caller.

use tracing::debug;

use crate::chart::Chart;
use crate::error::{ChartError, Result};

/// Document separator between manifests
const DOCUMENT_SEPARATOR: &str = "---\n";

/// Owner of all charts synthesized in one run
#[derive(Debug, Clone, Default)]
pub struct App {
    charts: Vec<Chart>,
}

/// Rendered output of one chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedChart {
    /// Chart id
    pub id: String,

    /// Suggested file name (`<id>.k8s.yaml`)
    pub file_name: String,

    /// One YAML document per resource, in traversal order
    pub documents: Vec<String>,
}

impl SynthesizedChart {
    /// All documents joined into a single YAML stream
    pub fn content(&self) -> String {
        self.documents.join(DOCUMENT_SEPARATOR)
    }
}

impl App {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a chart; chart ids must be unique
    pub fn add_chart(&mut self, chart: Chart) -> Result<()> {
        if self.charts.iter().any(|existing| existing.id() == chart.id()) {
            return Err(ChartError::DuplicateId {
                scope: "app".to_string(),
                id: chart.id().to_string(),
            });
        }
        self.charts.push(chart);
        Ok(())
    }

    pub fn charts(&self) -> &[Chart] {
        &self.charts
    }

    /// Validate and render every chart
    pub fn synth(&self) -> Result<Vec<SynthesizedChart>> {
        self.charts.iter().map(synth_chart).collect()
    }
}

fn synth_chart(chart: &Chart) -> Result<SynthesizedChart> {
    chart.validate()?;

    let documents = chart
        .scope()
        .resources()
        .map(|node| serde_yaml::to_string(node.resource()))
        .collect::<std::result::Result<Vec<_>, _>>()?;

    debug!(chart = chart.id(), documents = documents.len(), "synthesized chart");

    Ok(SynthesizedChart {
        id: chart.id().to_string(),
        file_name: format!("{}.k8s.yaml", chart.id()),
        documents,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Service;
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn service(name: &str) -> Service {
        Service {
            metadata: ObjectMeta {
                name: Some(name.to_string()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[test]
    fn test_synth_one_document_per_resource() {
        let mut chart = Chart::new("demo");
        chart.scope_mut().add("a", service("a")).unwrap();
        chart.scope_mut().add("b", service("b")).unwrap();

        let mut app = App::new();
        app.add_chart(chart).unwrap();
        let output = app.synth().unwrap();

        assert_eq!(output.len(), 1);
        assert_eq!(output[0].file_name, "demo.k8s.yaml");
        assert_eq!(output[0].documents.len(), 2);
        assert!(output[0].documents[0].contains("kind: Service"));
        assert!(output[0].documents[0].contains("name: a"));
        assert_eq!(output[0].content().matches("---\n").count(), 1);
    }

    #[test]
    fn test_duplicate_chart_id_rejected() {
        let mut app = App::new();
        app.add_chart(Chart::new("demo")).unwrap();
        assert!(app.add_chart(Chart::new("demo")).is_err());
        assert_eq!(app.charts().len(), 1);
    }

    #[test]
    fn test_synth_rejects_duplicate_names() {
        let mut chart = Chart::new("demo");
        chart.scope_mut().add("a", service("dup")).unwrap();
        chart
            .scope_mut()
            .add_scope("nested")
            .unwrap()
            .add("b", service("dup"))
            .unwrap();

        let mut app = App::new();
        app.add_chart(chart).unwrap();
        assert!(matches!(app.synth(), Err(ChartError::DuplicateName { .. })));
    }

    #[test]
    fn test_empty_chart_synthesizes_nothing() {
        let mut app = App::new();
        app.add_chart(Chart::new("empty")).unwrap();
        let output = app.synth().unwrap();
        assert!(output[0].documents.is_empty());
        assert_eq!(output[0].content(), "");
    }
}
