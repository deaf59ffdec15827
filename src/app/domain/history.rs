use std::collections::VecDeque;

pub const DEFAULT_HISTORY_LIMIT: usize = 50;

/// Bounded undo/redo over document snapshots.
///
/// The undo stack is never empty: its top is always the current text. The
/// bottom entry is the oldest state still reachable by undo.
#[derive(Debug, Clone)]
pub struct History {
    undo: VecDeque<String>,
    redo: Vec<String>,
    limit: usize,
}

impl History {
    pub fn new(seed: &str, limit: usize) -> Self {
        let mut undo = VecDeque::new();
        undo.push_back(seed.to_string());
        Self {
            undo,
            redo: Vec::new(),
            limit: limit.max(1),
        }
    }

    pub fn current(&self) -> &str {
        self.undo.back().map(String::as_str).unwrap_or("")
    }

    /// Record a settled edit. Consecutive duplicates are ignored.
    pub fn record_edit(&mut self, text: &str) {
        if self.current() == text {
            return;
        }
        self.undo.push_back(text.to_string());
        self.redo.clear();
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }

    pub fn undo(&mut self) -> Option<String> {
        if self.undo.len() < 2 {
            return None;
        }
        let top = self.undo.pop_back()?;
        self.redo.push(top);
        Some(self.current().to_string())
    }

    pub fn redo(&mut self) -> Option<String> {
        let text = self.redo.pop()?;
        self.undo.push_back(text.clone());
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
        Some(text)
    }

    pub fn can_undo(&self) -> bool {
        self.undo.len() >= 2
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    #[cfg(test)]
    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    #[cfg(test)]
    pub fn limit(&self) -> usize {
        self.limit
    }
}
