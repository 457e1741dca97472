//! Inspection checklist payload.
//!
//! A checklist is a list of titled sections, each a list of items marked
//! pass, fail, or not applicable. It is stored as JSON on the checklist row.

use serde::{Deserialize, Serialize};

/// Most items accepted in one checklist.
pub const MAX_CHECKLIST_ITEMS: usize = 500;

/// Result of a single checklist item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemResult {
    /// Compliant.
    #[serde(rename = "pass")]
    Pass,
    /// Non-compliant.
    #[serde(rename = "fail")]
    Fail,
    /// Does not apply to this establishment.
    #[serde(rename = "na")]
    NotApplicable,
}

/// One checked item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    /// What was checked, e.g. "Fire extinguisher tagged and charged".
    pub label: String,
    /// Outcome.
    pub result: ItemResult,
    /// Inspector note.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remarks: Option<String>,
}

/// A titled group of items.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistSection {
    /// Section title, e.g. "Means of egress".
    pub title: String,
    /// Items in the section.
    pub items: Vec<ChecklistItem>,
}

/// Full checklist as filled in by the inspector.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistData {
    /// Sections in display order.
    pub sections: Vec<ChecklistSection>,
    /// Free-text comments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Tally of item results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ChecklistSummary {
    /// Number of items.
    pub total: usize,
    /// Items marked pass.
    pub passed: usize,
    /// Items marked fail.
    pub failed: usize,
    /// Items marked not applicable.
    pub not_applicable: usize,
}

impl ChecklistSummary {
    /// True when nothing failed.
    #[must_use]
    pub fn is_compliant(&self) -> bool {
        self.failed == 0
    }
}

impl ChecklistData {
    /// Check the checklist is complete enough to record.
    ///
    /// # Errors
    ///
    /// Returns a message naming the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.sections.is_empty() {
            return Err("checklist must have at least one section".to_string());
        }

        let mut total = 0;
        for (i, section) in self.sections.iter().enumerate() {
            if section.title.trim().is_empty() {
                return Err(format!("section {} has no title", i + 1));
            }
            if section.items.is_empty() {
                return Err(format!("section '{}' has no items", section.title));
            }
            if let Some(j) = section.items.iter().position(|item| item.label.trim().is_empty()) {
                return Err(format!(
                    "item {} in section '{}' has no label",
                    j + 1,
                    section.title
                ));
            }
            total += section.items.len();
        }

        if total > MAX_CHECKLIST_ITEMS {
            return Err(format!(
                "checklist has {total} items; at most {MAX_CHECKLIST_ITEMS} are allowed"
            ));
        }
        Ok(())
    }

    /// Count item results across all sections.
    #[must_use]
    pub fn summary(&self) -> ChecklistSummary {
        self.sections
            .iter()
            .flat_map(|section| &section.items)
            .fold(ChecklistSummary::default(), |mut acc, item| {
                acc.total += 1;
                match item.result {
                    ItemResult::Pass => acc.passed += 1,
                    ItemResult::Fail => acc.failed += 1,
                    ItemResult::NotApplicable => acc.not_applicable += 1,
                }
                acc
            })
    }
}
