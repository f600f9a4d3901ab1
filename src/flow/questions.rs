// src/flow/questions.rs — Question catalogue

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub step_number: u32,
}

impl Question {
    pub fn new(id: &str, text: &str, options: &[&str], step_number: u32) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            step_number,
        }
    }

    /// Answer used when the visitor runs out of time.
    pub fn default_answer(&self) -> Option<&str> {
        self.options.first().map(String::as_str)
    }

    pub fn has_option(&self, answer: &str) -> bool {
        self.options.iter().any(|o| o == answer)
    }
}

/// One answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub question_id: String,
    pub question: String,
    pub selected_answer: String,
    pub timestamp: DateTime<Utc>,
    pub step_number: u32,
}

impl Response {
    pub fn for_question(question: &Question, answer: &str) -> Self {
        Self {
            question_id: question.id.clone(),
            question: question.text.clone(),
            selected_answer: answer.to_string(),
            timestamp: Utc::now(),
            step_number: question.step_number,
        }
    }
}

/// The built-in summer-festival catalogue.
pub fn default_questions() -> Vec<Question> {
    vec![
        Question::new(
            "festival_memory",
            "夏祭りの思い出で一番印象的だったものは？",
            &["花火と浴衣", "屋台とかき氷", "お神輿と太鼓"],
            1,
        ),
        Question::new(
            "favorite_moment",
            "どんな瞬間が心に残っていますか？",
            &[
                "友達との楽しい時間",
                "家族との温かい思い出",
                "一人で感じた特別な瞬間",
            ],
            2,
        ),
        Question::new(
            "emotion",
            "その時どんな気持ちでしたか？",
            &[
                "ワクワクして楽しかった",
                "懐かしくて温かかった",
                "神秘的で心が震えた",
            ],
            3,
        ),
    ]
}
