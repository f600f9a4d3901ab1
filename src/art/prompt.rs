// src/art/prompt.rs — Keyword prompt builder
//
// Each answer is matched against a small rule table. Elements and themes
// accumulate across rules; the mood is taken from the last rule that sets one.

use minijinja::{context, Environment};
use serde::Serialize;

use crate::flow::questions::Response;

pub const DEFAULT_STYLE: &str = "watercolor Japanese art";
const DEFAULT_MOOD: &str = "nostalgic and warm";
const BASE_THEMES: &[&str] = &["夏祭り", "Japanese summer festival"];

const PROMPT_TEMPLATE: &str = "A beautiful watercolor painting in traditional Japanese art style \
depicting a summer festival (夏祭り) scene. \
{% if elements %}The painting includes: {{ elements | join(', ') }}. {% endif %}\
The atmosphere is {{ mood }}, with soft brush strokes and delicate color transitions typical of Japanese watercolor art. \
Warm summer evening lighting with paper lanterns glowing softly in the background. \
Style: Traditional Japanese watercolor painting with subtle gradients and ethereal quality.";

const EMPTY_SUMMARY: &str = "夏祭りの思い出を描いてください";
const SUMMARY_SUFFIX: &str =
    "という夏祭りの記憶を、温かく懐かしい雰囲気の日本の夏祭りのイラストとして描いてください。";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtPrompt {
    pub base_prompt: String,
    pub style: String,
    pub themes: Vec<String>,
    pub elements: Vec<String>,
    pub mood: String,
}

struct KeywordRule {
    question_id: &'static str,
    /// Matched against the question text when the id is unfamiliar.
    question_hint: &'static str,
    keywords: &'static [&'static str],
    elements: &'static [&'static str],
    themes: &'static [&'static str],
    mood: Option<&'static str>,
}

const RULES: &[KeywordRule] = &[
    // What stood out most
    KeywordRule {
        question_id: "festival_memory",
        question_hint: "印象的",
        keywords: &["花火", "浴衣"],
        elements: &["fireworks in night sky", "people in yukata"],
        themes: &["花火", "fireworks"],
        mood: None,
    },
    KeywordRule {
        question_id: "festival_memory",
        question_hint: "印象的",
        keywords: &["屋台", "かき氷"],
        elements: &["festival food stalls", "shaved ice", "lanterns"],
        themes: &["屋台", "food stalls"],
        mood: None,
    },
    KeywordRule {
        question_id: "festival_memory",
        question_hint: "印象的",
        keywords: &["お神輿", "太鼓"],
        elements: &["mikoshi parade", "taiko drums", "traditional festival"],
        themes: &["お神輿", "traditional"],
        mood: None,
    },
    // Who it was with
    KeywordRule {
        question_id: "favorite_moment",
        question_hint: "心に残",
        keywords: &["友達"],
        elements: &["group of friends", "joyful atmosphere"],
        themes: &[],
        mood: Some("joyful and energetic"),
    },
    KeywordRule {
        question_id: "favorite_moment",
        question_hint: "心に残",
        keywords: &["家族"],
        elements: &["family gathering", "warm atmosphere"],
        themes: &[],
        mood: Some("warm and heartfelt"),
    },
    KeywordRule {
        question_id: "favorite_moment",
        question_hint: "心に残",
        keywords: &["一人"],
        elements: &["solitary figure", "contemplative mood"],
        themes: &[],
        mood: Some("serene and contemplative"),
    },
    // How it felt
    KeywordRule {
        question_id: "emotion",
        question_hint: "気持ち",
        keywords: &["ワクワク", "楽しかった"],
        elements: &["bright colors", "dynamic composition"],
        themes: &[],
        mood: Some("vibrant and exciting"),
    },
    KeywordRule {
        question_id: "emotion",
        question_hint: "気持ち",
        keywords: &["懐かしく", "温かかった"],
        elements: &["soft lighting", "warm colors"],
        themes: &[],
        mood: Some("nostalgic and warm"),
    },
    KeywordRule {
        question_id: "emotion",
        question_hint: "気持ち",
        keywords: &["神秘的", "心が震えた"],
        elements: &["ethereal lighting", "magical atmosphere"],
        themes: &[],
        mood: Some("mystical and awe-inspiring"),
    },
];

impl KeywordRule {
    fn applies_to(&self, response: &Response) -> bool {
        let question_matches = response.question_id == self.question_id
            || response.question.contains(self.question_hint);
        if !question_matches {
            return false;
        }
        let answer = response.selected_answer.to_lowercase();
        self.keywords.iter().any(|k| answer.contains(k))
    }
}

/// Turn the visitor's answers into an image prompt.
pub fn build_prompt(responses: &[Response], style: &str) -> anyhow::Result<ArtPrompt> {
    let mut elements: Vec<String> = Vec::new();
    let mut themes: Vec<String> = BASE_THEMES.iter().map(|t| t.to_string()).collect();
    let mut mood = DEFAULT_MOOD;

    for response in responses {
        for rule in RULES.iter().filter(|r| r.applies_to(response)) {
            elements.extend(rule.elements.iter().map(|e| e.to_string()));
            themes.extend(rule.themes.iter().map(|t| t.to_string()));
            if let Some(m) = rule.mood {
                mood = m;
            }
        }
    }

    let env = Environment::new();
    let base_prompt = env.render_str(PROMPT_TEMPLATE, context! { elements => &elements, mood => mood })?;

    Ok(ArtPrompt {
        base_prompt,
        style: style.to_string(),
        themes,
        elements,
        mood: mood.to_string(),
    })
}

fn summary_label(question_id: &str) -> Option<&'static str> {
    Some(match question_id {
        "festival_memory" => "一番印象的だったのは",
        "favorite_moment" => "心に残った瞬間は",
        "emotion" => "その時の気持ちは",
        "q1_atmosphere" => "雰囲気は",
        "q2_sound" => "印象的な音は",
        "q3_food" => "思い出の食べ物は",
        "q4_activity" => "楽しかった体験は",
        "q5_emotion" => "全体的な感情は",
        _ => return None,
    })
}

/// Japanese one-paragraph summary of the conversation.
pub fn summarize(responses: &[Response]) -> String {
    if responses.is_empty() {
        return EMPTY_SUMMARY.to_string();
    }

    let parts: Vec<String> = responses
        .iter()
        .map(|r| match summary_label(&r.question_id) {
            Some(label) => format!("{label}{}", r.selected_answer),
            None => r.selected_answer.clone(),
        })
        .collect();

    format!("夏祭りの思い出: {}{SUMMARY_SUFFIX}", parts.join("、"))
}
