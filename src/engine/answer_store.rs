use std::collections::BTreeMap;

use crate::models::question::QuestionId;

/// Current answer text per question for the live session.
///
/// Entries are created on the first change for a question and overwritten on
/// every later one. Nothing is removed until the session terminates.
#[derive(Debug, Default, Clone)]
pub struct AnswerStore {
    answers: BTreeMap<QuestionId, String>,
}

impl AnswerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, question_id: QuestionId, answer: impl Into<String>) {
        self.answers.insert(question_id, answer.into());
    }

    pub fn get(&self, question_id: QuestionId) -> Option<&str> {
        self.answers.get(&question_id).map(String::as_str)
    }

    /// Questions whose current answer is not blank.
    pub fn answered_count(&self) -> usize {
        self.answers
            .values()
            .filter(|answer| !answer.trim().is_empty())
            .count()
    }

    pub fn snapshot(&self) -> BTreeMap<QuestionId, String> {
        self.answers.clone()
    }

    pub fn clear(&mut self) {
        self.answers.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_changes_overwrite_earlier_ones() {
        let mut store = AnswerStore::new();
        store.set(3, "b");
        store.set(3, "bridge");
        assert_eq!(store.get(3), Some("bridge"));
        assert_eq!(store.get(4), None);
    }

    #[test]
    fn blank_answers_do_not_count_as_answered() {
        let mut store = AnswerStore::new();
        store.set(1, "TRUE");
        store.set(2, "   ");
        store.set(5, "");
        assert_eq!(store.answered_count(), 1);
        assert_eq!(store.snapshot().len(), 3);
    }
}
