//! Quiz questions and the active question pool
//!
//! The pool is supplied by the caller (picked from a lesson catalog before a
//! session starts). The simulation only draws uniformly at random from it,
//! falling back to a built-in question when the supplied pool is empty.

use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

/// One multiple-choice question with exactly three options
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizQuestion {
    pub id: u32,
    /// Prompt shown to the player
    pub prompt: String,
    /// The three answer options, in display order
    pub options: [String; 3],
    /// Index into `options` of the correct answer
    pub correct_index: usize,
}

impl QuizQuestion {
    /// A question is usable if its correct index is in range and no option is blank
    pub fn is_valid(&self) -> bool {
        self.correct_index < self.options.len() && self.options.iter().all(|o| !o.is_empty())
    }
}

/// Built-in fallback so the quiz mechanic never dead-ends on an empty pool
fn default_question() -> QuizQuestion {
    QuizQuestion {
        id: 0,
        prompt: "2 + 2 = ?".to_string(),
        options: ["3".to_string(), "4".to_string(), "5".to_string()],
        correct_index: 1,
    }
}

/// The active question pool for a session
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuestionPool {
    questions: Vec<QuizQuestion>,
}

impl Default for QuestionPool {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl QuestionPool {
    /// Build a pool, dropping malformed questions up front. An empty (or
    /// entirely malformed) input yields the built-in fallback question.
    pub fn new(questions: Vec<QuizQuestion>) -> Self {
        let before = questions.len();
        let mut questions: Vec<QuizQuestion> =
            questions.into_iter().filter(QuizQuestion::is_valid).collect();
        let dropped = before - questions.len();
        if dropped > 0 {
            log::warn!("dropped {dropped} malformed quiz questions");
        }
        if questions.is_empty() {
            log::warn!("empty question pool, using built-in fallback");
            questions.push(default_question());
        }
        Self { questions }
    }

    /// Draw one question uniformly at random
    pub fn draw(&self, rng: &mut Pcg32) -> QuizQuestion {
        let idx = rng.random_range(0..self.questions.len());
        self.questions[idx].clone()
    }

    /// First question in the pool, used before any quiz chunk is reached
    pub fn first(&self) -> QuizQuestion {
        self.questions[0].clone()
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}
