//! Prompt templates for the study tools

use std::fmt::Write;
use serde::{Deserialize, Serialize};

/// History turns included in a tutor prompt
pub const TUTOR_HISTORY_LIMIT: usize = 6;

/// One message of a tutoring conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// "user" or "assistant"
    pub role: String,
    pub content: String,
}

/// Summary of a learner's recent activity
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyAnalysis {
    pub top_subjects: Vec<String>,
    pub gap_subjects: Vec<String>,
    pub total_sessions: usize,
    /// Total study time in minutes
    pub study_time: i64,
    pub favorite_subject: String,
}

fn subtopic_clause(subtopics: &[String]) -> String {
    let subtopics: Vec<&str> = subtopics
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect();

    if subtopics.is_empty() {
        String::new()
    } else {
        format!(" Focus especially on these subtopics: {}.", subtopics.join(", "))
    }
}

pub fn study_plan_prompt(topic: &str, duration: &str) -> String {
    format!(
        "Create a structured study plan for the topic '{topic}' that fits into {duration}. \
         Break it into days or sessions, give each a clear goal, key concepts to review, \
         practice activities and a short self-assessment. Format the plan in markdown."
    )
}

pub fn notes_prompt(topic: &str, subtopics: &[String]) -> String {
    format!(
        "Generate concise, comprehensive, and well-structured study notes \
         for the topic: '{topic}'.{} The notes should be formatted clearly \
         using markdown for headings and bullet points.",
        subtopic_clause(subtopics)
    )
}

pub fn quiz_prompt(topic: &str, subtopics: &[String]) -> String {
    format!(
        "Create a short, multiple-choice quiz with 5 questions \
         about the topic: '{topic}'.{} For each question, provide 4 options \
         and clearly indicate the correct answer (e.g., by placing it on the next line or bolding it).",
        subtopic_clause(subtopics)
    )
}

pub fn tutor_prompt(message: &str, subject: &str, difficulty: &str, history: &[ChatTurn]) -> String {
    let mut prompt = format!(
        "You are a patient, encouraging {subject} tutor. The student is at the {difficulty} level. \
         Explain step by step, check understanding with a short question, and keep answers focused.\n"
    );

    let start = history.len().saturating_sub(TUTOR_HISTORY_LIMIT);
    let recent = &history[start..];
    if !recent.is_empty() {
        prompt.push_str("\nConversation so far:\n");
        for turn in recent {
            let speaker = if turn.role == "assistant" { "Tutor" } else { "Student" };
            let _ = writeln!(prompt, "{}: {}", speaker, turn.content);
        }
    }

    let _ = write!(prompt, "\nStudent: {}\nTutor:", message);
    prompt
}

pub fn recommendations_prompt(analysis: &StudyAnalysis) -> String {
    let gaps = if analysis.gap_subjects.is_empty() {
        "None identified".to_string()
    } else {
        analysis.gap_subjects.join(", ")
    };

    format!(
        "Based on this learning analysis, provide personalized study recommendations:\n\
         \n\
         Recent Activity:\n\
         - Top subjects: {}\n\
         - Potential gaps: {}\n\
         - Total sessions: {}\n\
         - Total study time: {} hours\n\
         - Favorite subject: {}\n\
         \n\
         Please provide:\n\
         1. 3 personalized study suggestions based on their current focus\n\
         2. 2 areas they should review or gaps to fill\n\
         3. 2 next learning steps to advance their knowledge\n\
         \n\
         Format as JSON with: suggestions, gaps, nextSteps arrays.\n\
         Each item should have: title, description, reason, and priority (high/medium/low).",
        analysis.top_subjects.join(", "),
        gaps,
        analysis.total_sessions,
        (analysis.study_time as f64 / 60.0).round() as i64,
        analysis.favorite_subject,
    )
}
