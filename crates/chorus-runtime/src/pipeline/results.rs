//! Per-run result accumulation.
//!
//! [`StepResult`] is a tagged union with one variant per result slot, so an
//! action's prerequisites are a pattern match instead of a string-keyed
//! existence probe. The [`ResultSet`] is write-once per slot for the
//! lifetime of a pipeline run; a second write to an occupied slot is
//! rejected.

use chorus_core::table::DataTable;
use chorus_core::viz::Visualization;

/// One action's output.
#[derive(Clone, Debug, PartialEq)]
pub enum StepResult {
    /// Parsed upload plus its natural-language analysis.
    DataAnalysis {
        /// Parsed tabular data.
        table: DataTable,
        /// Model analysis of the sample.
        analysis: String,
    },
    /// Persisted visualization record.
    Visualization(Visualization),
    /// Natural-language summary of the findings so far.
    Summary(String),
    /// Concatenated active knowledge content (may be empty).
    Knowledge(String),
    /// The final synthesized answer.
    FinalResponse(String),
}

impl StepResult {
    /// Wire-vocabulary name of the slot this result occupies.
    #[must_use]
    pub fn slot(&self) -> &'static str {
        match self {
            Self::DataAnalysis { .. } => "data_analysis",
            Self::Visualization(_) => "visualization",
            Self::Summary(_) => "summary",
            Self::Knowledge(_) => "knowledge",
            Self::FinalResponse(_) => "final_response",
        }
    }
}

/// Write-once result slots for one pipeline run.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResultSet {
    data_analysis: Option<(DataTable, String)>,
    visualization: Option<Visualization>,
    summary: Option<String>,
    knowledge: Option<String>,
    final_response: Option<String>,
}

impl ResultSet {
    /// A fresh empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write a result into its slot. Returns `false` (leaving the existing
    /// value untouched) when the slot is already occupied.
    pub fn insert(&mut self, result: StepResult) -> bool {
        match result {
            StepResult::DataAnalysis { table, analysis } => {
                Self::write(&mut self.data_analysis, (table, analysis))
            }
            StepResult::Visualization(viz) => Self::write(&mut self.visualization, viz),
            StepResult::Summary(text) => Self::write(&mut self.summary, text),
            StepResult::Knowledge(text) => Self::write(&mut self.knowledge, text),
            StepResult::FinalResponse(text) => Self::write(&mut self.final_response, text),
        }
    }

    fn write<T>(slot: &mut Option<T>, value: T) -> bool {
        if slot.is_some() {
            return false;
        }
        *slot = Some(value);
        true
    }

    /// The parsed table and its analysis, when `analyze_data` ran.
    #[must_use]
    pub fn data_analysis(&self) -> Option<(&DataTable, &str)> {
        self.data_analysis
            .as_ref()
            .map(|(table, analysis)| (table, analysis.as_str()))
    }

    /// The created visualization, when `create_visualization` ran.
    #[must_use]
    pub fn visualization(&self) -> Option<&Visualization> {
        self.visualization.as_ref()
    }

    /// The findings summary, when `summarize` ran.
    #[must_use]
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    /// The retrieved knowledge, when `retrieve_knowledge` ran.
    #[must_use]
    pub fn knowledge(&self) -> Option<&str> {
        self.knowledge.as_deref()
    }

    /// The final answer, when `respond` ran.
    #[must_use]
    pub fn final_response(&self) -> Option<&str> {
        self.final_response.as_deref()
    }

    /// Whether any slot other than the final response holds useful content.
    /// Empty retrieved knowledge does not count as a finding.
    #[must_use]
    pub fn has_findings(&self) -> bool {
        self.data_analysis.is_some()
            || self.visualization.is_some()
            || self.summary.is_some()
            || self.knowledge.as_deref().is_some_and(|k| !k.is_empty())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_fills_slot_once() {
        let mut results = ResultSet::new();
        assert!(results.insert(StepResult::Summary("first".into())));
        assert!(!results.insert(StepResult::Summary("second".into())));
        assert_eq!(results.summary(), Some("first"));
    }

    #[test]
    fn slots_are_independent() {
        let mut results = ResultSet::new();
        assert!(results.insert(StepResult::Knowledge("kb".into())));
        assert!(results.insert(StepResult::FinalResponse("done".into())));
        assert_eq!(results.knowledge(), Some("kb"));
        assert_eq!(results.final_response(), Some("done"));
        assert!(results.data_analysis().is_none());
    }

    #[test]
    fn slot_names_match_wire_vocabulary() {
        assert_eq!(
            StepResult::DataAnalysis {
                table: DataTable::default(),
                analysis: String::new()
            }
            .slot(),
            "data_analysis"
        );
        assert_eq!(StepResult::Knowledge(String::new()).slot(), "knowledge");
        assert_eq!(
            StepResult::FinalResponse(String::new()).slot(),
            "final_response"
        );
    }

    #[test]
    fn findings_ignore_final_response() {
        let mut results = ResultSet::new();
        assert!(!results.has_findings());
        let _ = results.insert(StepResult::FinalResponse("answer".into()));
        assert!(!results.has_findings());
    }

    #[test]
    fn empty_knowledge_is_not_a_finding() {
        let mut results = ResultSet::new();
        let _ = results.insert(StepResult::Knowledge(String::new()));
        assert!(!results.has_findings());

        let mut results = ResultSet::new();
        let _ = results.insert(StepResult::Knowledge("something".into()));
        assert!(results.has_findings());
    }

    #[test]
    fn analysis_counts_as_finding() {
        let mut results = ResultSet::new();
        let _ = results.insert(StepResult::DataAnalysis {
            table: DataTable::default(),
            analysis: "trendy".into(),
        });
        assert!(results.has_findings());
        let (_, analysis) = results.data_analysis().unwrap();
        assert_eq!(analysis, "trendy");
    }
}
