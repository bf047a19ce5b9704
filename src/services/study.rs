//! Study tools service
//!
//! Notes, quizzes, tutoring and recommendations go straight through the
//! generation gateway. Study plans are persisted as study sessions.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use crate::database::repositories::StudySessionRepository;
use crate::models::study_session::{CreateStudySessionRequest, StudySession, MAX_DURATION_LENGTH, MAX_TOPIC_NAME_LENGTH};
use crate::models::user::User;
use crate::services::generation::GenerationGateway;
use crate::services::prompts::{self, ChatTurn, StudyAnalysis};
use crate::utils::errors::{StudyBuddyError, Result};
use crate::utils::helpers::{ensure_max_length, extract_subject, parse_duration_minutes, strip_code_fences};
use crate::utils::logging;

/// Sessions considered when analysing recent activity
const ANALYSIS_WINDOW_DAYS: i64 = 7;
/// Recent sessions required before recommendations are generated
pub const MIN_SESSIONS_FOR_RECOMMENDATIONS: usize = 2;
const HISTORY_LIMIT: i64 = 100;
const TOP_SUBJECT_COUNT: usize = 3;
const DEFAULT_FAVORITE_SUBJECT: &str = "General Studies";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotesResponse {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub notes: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QuizResponse {
    pub topic: String,
    pub subtopics: Vec<String>,
    pub quiz: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorResponse {
    pub response: String,
    pub subject: String,
    pub difficulty: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default = "default_priority")]
    pub priority: String,
}

fn default_priority() -> String {
    "medium".to_string()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendations {
    #[serde(default)]
    pub suggestions: Vec<Recommendation>,
    #[serde(default)]
    pub gaps: Vec<Recommendation>,
    #[serde(default)]
    pub next_steps: Vec<Recommendation>,
    #[serde(default)]
    pub is_fallback: bool,
}

impl Recommendations {
    /// Built-in advice used when the model gives nothing usable
    pub fn fallback() -> Self {
        fn item(title: &str, description: &str, reason: &str, priority: &str) -> Recommendation {
            Recommendation {
                title: title.to_string(),
                description: description.to_string(),
                reason: reason.to_string(),
                priority: priority.to_string(),
            }
        }

        Self {
            suggestions: vec![
                item(
                    "Deepen Your Understanding",
                    "Review key concepts from your most studied topics and try to explain them in your own words.",
                    "Based on your recent focus areas",
                    "high",
                ),
                item(
                    "Practice Application",
                    "Solve practical problems related to your subjects to strengthen real-world application.",
                    "Builds on your current knowledge",
                    "medium",
                ),
                item(
                    "Explore Related Topics",
                    "Look into subjects that naturally extend from what you've been studying.",
                    "Expands your knowledge network",
                    "medium",
                ),
            ],
            gaps: vec![
                item(
                    "Fundamental Concepts Review",
                    "Spend 30 minutes reviewing basic principles to strengthen your foundation.",
                    "Solid foundation improves advanced learning",
                    "high",
                ),
                item(
                    "Cross-Subject Connections",
                    "Identify how your different subjects relate to each other.",
                    "Builds integrated understanding",
                    "low",
                ),
            ],
            next_steps: vec![
                item(
                    "Advanced Topics",
                    "Move to more complex concepts in your primary subject area.",
                    "You're ready for deeper challenges",
                    "high",
                ),
                item(
                    "Skill Application Project",
                    "Start a small project that applies what you've learned.",
                    "Practical application reinforces learning",
                    "medium",
                ),
            ],
            is_fallback: true,
        }
    }

    /// Parse model output, tolerating a surrounding code fence
    pub fn parse(text: &str) -> Option<Self> {
        let parsed: Self = serde_json::from_str(strip_code_fences(text)).ok()?;
        if parsed.suggestions.is_empty() && parsed.gaps.is_empty() && parsed.next_steps.is_empty() {
            return None;
        }
        Some(Self { is_fallback: false, ..parsed })
    }
}

/// Derive an activity summary from a learner's sessions.
///
/// Counts and study time cover sessions from the last seven days before
/// `now`; gap subjects are drawn from the whole history.
pub fn analyze_sessions(sessions: &[StudySession], now: DateTime<Utc>) -> StudyAnalysis {
    let cutoff = now - Duration::days(ANALYSIS_WINDOW_DAYS);
    let recent: Vec<&StudySession> = sessions.iter().filter(|s| s.created_at > cutoff).collect();

    // First-seen order breaks ties between equally frequent subjects
    let mut counts: Vec<(String, usize)> = Vec::new();
    let mut study_time = 0;
    for session in &recent {
        let subject = extract_subject(&session.topic_name);
        match counts.iter_mut().find(|(name, _)| *name == subject) {
            Some((_, count)) => *count += 1,
            None => counts.push((subject, 1)),
        }
        study_time += parse_duration_minutes(&session.duration_input);
    }

    let mut ranked = counts.clone();
    ranked.sort_by(|a, b| b.1.cmp(&a.1));
    let top_subjects: Vec<String> = ranked
        .into_iter()
        .take(TOP_SUBJECT_COUNT)
        .map(|(subject, _)| subject)
        .collect();

    let recent_count = |subject: &str| {
        counts
            .iter()
            .find(|(name, _)| name == subject)
            .map(|(_, count)| *count)
            .unwrap_or(0)
    };

    let mut gap_subjects: Vec<String> = Vec::new();
    for session in sessions {
        let subject = extract_subject(&session.topic_name);
        if !top_subjects.contains(&subject) && recent_count(&subject) < 2 && !gap_subjects.contains(&subject) {
            gap_subjects.push(subject);
        }
    }

    let favorite_subject = top_subjects
        .first()
        .cloned()
        .unwrap_or_else(|| DEFAULT_FAVORITE_SUBJECT.to_string());

    StudyAnalysis {
        top_subjects,
        gap_subjects,
        total_sessions: recent.len(),
        study_time,
        favorite_subject,
    }
}

fn required(value: &str) -> Option<String> {
    let value = value.trim();
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

fn clean_subtopics(subtopics: Vec<String>) -> Vec<String> {
    subtopics
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Stateless study tools backed by the generation gateway
#[derive(Debug, Clone)]
pub struct StudyTools {
    gateway: GenerationGateway,
}

impl StudyTools {
    pub fn new(gateway: GenerationGateway) -> Self {
        Self { gateway }
    }

    pub fn gateway(&self) -> &GenerationGateway {
        &self.gateway
    }

    pub async fn generate_notes(&self, topic: &str, subtopics: Vec<String>) -> Result<NotesResponse> {
        let topic = required(topic).ok_or_else(|| StudyBuddyError::InvalidInput("Topic not provided".to_string()))?;
        let subtopics = clean_subtopics(subtopics);
        debug!(topic = %topic, subtopics = subtopics.len(), "Generating study notes");

        let notes = self
            .gateway
            .generate_text(&prompts::notes_prompt(&topic, &subtopics), self.gateway.max_retries())
            .await;

        Ok(NotesResponse { topic, subtopics, notes })
    }

    pub async fn generate_quiz(&self, topic: &str, subtopics: Vec<String>) -> Result<QuizResponse> {
        let topic = required(topic).ok_or_else(|| StudyBuddyError::InvalidInput("Topic not provided".to_string()))?;
        let subtopics = clean_subtopics(subtopics);
        debug!(topic = %topic, subtopics = subtopics.len(), "Generating quiz");

        let quiz = self
            .gateway
            .generate_text(&prompts::quiz_prompt(&topic, &subtopics), self.gateway.max_retries())
            .await;

        Ok(QuizResponse { topic, subtopics, quiz })
    }

    pub async fn tutor_chat(
        &self,
        message: &str,
        subject: &str,
        difficulty: &str,
        history: &[ChatTurn],
    ) -> Result<TutorResponse> {
        let message = required(message).ok_or_else(|| StudyBuddyError::InvalidInput("Message not provided".to_string()))?;
        let subject = required(subject).unwrap_or_else(|| "general".to_string());
        let difficulty = required(difficulty).unwrap_or_else(|| "intermediate".to_string());
        debug!(subject = %subject, difficulty = %difficulty, history = history.len(), "Tutor chat");

        let prompt = prompts::tutor_prompt(&message, &subject, &difficulty, history);
        let response = self.gateway.generate_text(&prompt, self.gateway.max_retries()).await;

        Ok(TutorResponse { response, subject, difficulty })
    }

    /// Personalised recommendations, or the built-in set when the model
    /// fails or answers with something other than the expected JSON
    pub async fn recommendations(&self, analysis: &StudyAnalysis) -> Recommendations {
        let prompt = prompts::recommendations_prompt(analysis);

        match self.gateway.generate_default(&prompt).await {
            Ok(text) => Recommendations::parse(&text).unwrap_or_else(|| {
                warn!("Recommendation response was not valid JSON, using fallback");
                Recommendations::fallback()
            }),
            Err(error) => {
                logging::log_api_error("recommendations", &error.to_string(), None);
                Recommendations::fallback()
            }
        }
    }
}

/// Study plans and history, persisted per learner
#[derive(Debug, Clone)]
pub struct StudyService {
    tools: StudyTools,
    sessions: StudySessionRepository,
}

impl StudyService {
    pub fn new(tools: StudyTools, sessions: StudySessionRepository) -> Self {
        Self { tools, sessions }
    }

    pub fn tools(&self) -> &StudyTools {
        &self.tools
    }

    /// Generate a plan and record it as a study session
    pub async fn generate_study_plan(&self, user: &User, topic_name: &str, duration_input: &str) -> Result<StudySession> {
        let (topic_name, duration_input) = match (required(topic_name), required(duration_input)) {
            (Some(topic), Some(duration)) => (topic, duration),
            _ => return Err(StudyBuddyError::InvalidInput("Missing topic or duration.".to_string())),
        };
        ensure_max_length(&topic_name, MAX_TOPIC_NAME_LENGTH, "Topic")?;
        ensure_max_length(&duration_input, MAX_DURATION_LENGTH, "Duration")?;

        let prompt = prompts::study_plan_prompt(&topic_name, &duration_input);
        let gateway = self.tools.gateway();
        // Failed generations are not saved as plans
        let generated_content = gateway.generate(&prompt, gateway.max_retries()).await?;

        let session = self
            .sessions
            .create(CreateStudySessionRequest {
                user_id: user.id,
                topic_name,
                duration_input,
                generated_content,
            })
            .await?;

        info!(user_id = user.id, session_id = session.id, topic = %session.topic_name, "Study plan created");
        logging::log_user_action(user.id, "study_plan_created", Some(session.topic_name.as_str()));

        Ok(session)
    }

    /// The learner's sessions, newest first
    pub async fn study_history(&self, user: &User) -> Result<Vec<StudySession>> {
        debug!(user_id = user.id, "Loading study history");
        self.sessions.list_for_user(user.id, HISTORY_LIMIT).await
    }

    /// One session, only if it belongs to the learner
    pub async fn study_session(&self, user: &User, session_id: i64) -> Result<StudySession> {
        self.sessions
            .find_for_user(session_id, user.id)
            .await?
            .ok_or(StudyBuddyError::SessionNotFound { session_id })
    }

    /// Analyse the learner's history and ask for recommendations
    pub async fn recommend_for_user(&self, user: &User) -> Result<(StudyAnalysis, Recommendations)> {
        let history = self.study_history(user).await?;
        let analysis = analyze_sessions(&history, Utc::now());

        if analysis.total_sessions < MIN_SESSIONS_FOR_RECOMMENDATIONS {
            return Err(StudyBuddyError::InvalidInput(
                "Complete at least 2 study sessions to get AI recommendations".to_string(),
            ));
        }

        let recommendations = self.tools.recommendations(&analysis).await;
        info!(user_id = user.id, fallback = recommendations.is_fallback, "Recommendations generated");

        Ok((analysis, recommendations))
    }
}
