use shared::domain::AnalysisId;

pub const MAX_COMPARISON: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToggleOutcome {
    Added,
    Removed,
    /// Already holding `MAX_COMPARISON` other analyses; nothing changed.
    AtCapacity,
}

impl ToggleOutcome {
    pub fn changed(self) -> bool {
        !matches!(self, Self::AtCapacity)
    }
}

/// Analyses picked for side-by-side comparison, in the order they were picked.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonSelection {
    ids: Vec<AnalysisId>,
}

impl ComparisonSelection {
    pub fn toggle(&mut self, id: AnalysisId) -> ToggleOutcome {
        if let Some(pos) = self.ids.iter().position(|selected| *selected == id) {
            self.ids.remove(pos);
            return ToggleOutcome::Removed;
        }
        if self.ids.len() >= MAX_COMPARISON {
            return ToggleOutcome::AtCapacity;
        }
        self.ids.push(id);
        ToggleOutcome::Added
    }

    pub fn contains(&self, id: AnalysisId) -> bool {
        self.ids.contains(&id)
    }

    pub fn ids(&self) -> &[AnalysisId] {
        &self.ids
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// A comparison needs at least two analyses.
    pub fn is_comparable(&self) -> bool {
        self.ids.len() >= 2
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }
}

#[cfg(test)]
#[path = "tests/selection_tests.rs"]
mod tests;
