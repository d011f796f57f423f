//! Multiple-choice questions shown when a monster catches the player.
//!
//! A question document is a sequence of `{question, answers, correct}`
//! entries, where `correct` indexes into `answers`. At runtime one question
//! is current, picked at random, and a cursor marks the selected answer.

use rand::Rng;
use rand::rngs::StdRng;
use serde::Deserialize;
use serde_json::Value;
use tilequest_data::{CONFIG_DIR, Schema, questions_schema};

use crate::component::{CleanResult, Component, LoadError, LoadableComponent, Rejection};
use crate::helpers::{os_rng, raw_len, raw_u64, seeded_rng};
use crate::item::DEFAULT_POPUP_WIDTH;
use crate::resource::ResourceManager;
use crate::wrap::word_wrap;

pub const SELECTED_PREFIX: &str = "[X] ";
pub const UNSELECTED_PREFIX: &str = "[ ] ";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Question {
    pub question: String,
    pub answers: Vec<String>,
    pub correct: usize,
}

/// Options for building a [`QuestionSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuestionOptions {
    /// Popup width in characters.
    pub width: usize,
    pub seed: Option<u64>,
}

impl Default for QuestionOptions {
    fn default() -> Self {
        Self {
            width: DEFAULT_POPUP_WIDTH,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(from = "Vec<Question>")]
pub struct QuestionSet {
    questions: Vec<Question>,
    wrapped: Vec<Vec<String>>,
    width: usize,
    current: usize,
    choice: usize,
    rng: StdRng,
}

impl From<Vec<Question>> for QuestionSet {
    fn from(questions: Vec<Question>) -> Self {
        Self {
            questions,
            wrapped: Vec::new(),
            width: DEFAULT_POPUP_WIDTH,
            current: 0,
            choice: 0,
            rng: os_rng(),
        }
    }
}

impl Default for QuestionSet {
    fn default() -> Self {
        Self::from(Vec::new())
    }
}

impl QuestionSet {
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// Index of the selected answer.
    pub fn choice(&self) -> usize {
        self.choice
    }

    pub fn choices_len(&self) -> usize {
        self.current().map_or(0, |question| question.answers.len())
    }

    pub fn select_previous(&mut self) {
        self.choice = self.choice.saturating_sub(1);
    }

    pub fn select_next(&mut self) {
        if self.choice + 1 < self.choices_len() {
            self.choice += 1;
        }
    }

    pub fn is_correct(&self) -> bool {
        self.current().is_some_and(|question| question.correct == self.choice)
    }

    /// Pick a new current question at random and reset the cursor.
    pub fn next(&mut self) {
        if !self.questions.is_empty() {
            self.current = self.rng.random_range(0..self.questions.len());
        }
        self.choice = 0;
    }

    /// Lines to show: the wrapped question, a blank line, then each answer with its marker.
    pub fn display(&self) -> Vec<String> {
        let Some(question) = self.current() else {
            return Vec::new();
        };
        let mut lines = self
            .wrapped
            .get(self.current)
            .cloned()
            .unwrap_or_else(|| word_wrap(&question.question, self.width));
        lines.push(String::new());
        for (index, answer) in question.answers.iter().enumerate() {
            let prefix = if index == self.choice { SELECTED_PREFIX } else { UNSELECTED_PREFIX };
            lines.extend(word_wrap(&format!("{prefix}{answer}"), self.width));
        }
        lines
    }
}

impl Component for QuestionSet {
    const KIND: &'static str = "Questions";
    type Context = QuestionOptions;

    fn schema() -> Option<Schema> {
        Some(questions_schema())
    }

    fn clean(raw: &Value) -> CleanResult {
        let Some(entries) = raw.as_array() else {
            return Err(Rejection::because("questions must be a sequence"));
        };
        if entries.is_empty() {
            return Err(Rejection::because("at least one question is required"));
        }
        for (index, entry) in entries.iter().enumerate() {
            let answers = raw_len(entry, "answers");
            if answers == 0 {
                return Err(Rejection::because(format!("question {index} has no answers")));
            }
            if raw_u64(entry, "correct").is_none_or(|correct| correct >= answers as u64) {
                return Err(Rejection::because(format!(
                    "question {index} marks an answer that does not exist as correct"
                )));
            }
        }
        Ok(())
    }

    fn post_process(&mut self, _manager: &mut ResourceManager, options: &mut QuestionOptions) -> Result<(), LoadError> {
        if options.seed.is_some() {
            self.rng = seeded_rng(options.seed);
        }
        self.width = options.width;
        self.wrapped = self
            .questions
            .iter()
            .map(|question| word_wrap(&question.question, self.width))
            .collect();
        self.next();
        Ok(())
    }
}

impl LoadableComponent for QuestionSet {
    const PATH: &'static str = CONFIG_DIR;
}
