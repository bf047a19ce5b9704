//! Topic and course catalog
//!
//! Reading active topics is open to every learner; creating, editing and
//! deleting topics and courses is staff-only and checked by the caller.

use std::future::Future;
use tracing::{debug, info};
use crate::database::repositories::{CourseRepository, TopicRepository};
use crate::models::course::{Course, CourseWithTopics, CreateCourseRequest, UpdateCourseRequest, MAX_COURSE_NAME_LENGTH};
use crate::models::topic::{CreateTopicRequest, Topic, UpdateTopicRequest, MAX_TOPIC_NAME_LENGTH};
use crate::utils::errors::{StudyBuddyError, Result};
use crate::utils::helpers::{ensure_max_length, slugify};

/// Upper bound on numbered slug candidates before giving up
const MAX_SLUG_ATTEMPTS: u32 = 1000;

/// Slug derived from `name`, suffixed `-2`, `-3`, ... until `exists` reports it free
pub async fn unique_slug<F, Fut>(name: &str, fallback: &str, exists: F) -> Result<String>
where
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    let base = match slugify(name) {
        slug if slug.is_empty() => fallback.to_string(),
        slug => slug,
    };

    if !exists(base.clone()).await? {
        return Ok(base);
    }

    for n in 2..=MAX_SLUG_ATTEMPTS {
        let candidate = format!("{}-{}", base, n);
        if !exists(candidate.clone()).await? {
            return Ok(candidate);
        }
    }

    Err(StudyBuddyError::Conflict(format!("No free slug for '{}'", name)))
}

fn required_name(name: &str, max_length: usize) -> Result<String> {
    let name = name.trim();
    if name.is_empty() {
        return Err(StudyBuddyError::InvalidInput("Name is required".to_string()));
    }
    ensure_max_length(name, max_length, "Name")?;
    Ok(name.to_string())
}

#[derive(Debug, Clone)]
pub struct CatalogService {
    topics: TopicRepository,
    courses: CourseRepository,
}

impl CatalogService {
    pub fn new(topics: TopicRepository, courses: CourseRepository) -> Self {
        Self { topics, courses }
    }

    /// Topics offered to learners
    pub async fn active_topics(&self) -> Result<Vec<Topic>> {
        self.topics.list(true).await
    }

    pub async fn all_topics(&self) -> Result<Vec<Topic>> {
        self.topics.list(false).await
    }

    pub async fn get_topic(&self, topic_id: i64) -> Result<Topic> {
        self.topics
            .find_by_id(topic_id)
            .await?
            .ok_or(StudyBuddyError::TopicNotFound { topic_id })
    }

    pub async fn create_topic(&self, request: CreateTopicRequest) -> Result<Topic> {
        let name = required_name(&request.name, MAX_TOPIC_NAME_LENGTH)?;
        let repo = &self.topics;
        let slug = unique_slug(&name, "topic", |s| async move { repo.slug_exists(&s).await }).await?;

        let topic = self
            .topics
            .create(&name, &slug, request.description, request.is_active.unwrap_or(true))
            .await?;

        info!(topic_id = topic.id, slug = %topic.slug, "Topic created");
        Ok(topic)
    }

    pub async fn update_topic(&self, topic_id: i64, mut request: UpdateTopicRequest) -> Result<Topic> {
        if let Some(name) = request.name.as_deref() {
            request.name = Some(required_name(name, MAX_TOPIC_NAME_LENGTH)?);
        }

        let topic = self
            .topics
            .update(topic_id, request)
            .await?
            .ok_or(StudyBuddyError::TopicNotFound { topic_id })?;

        debug!(topic_id = topic_id, "Topic updated");
        Ok(topic)
    }

    pub async fn delete_topic(&self, topic_id: i64) -> Result<()> {
        if !self.topics.delete(topic_id).await? {
            return Err(StudyBuddyError::TopicNotFound { topic_id });
        }
        info!(topic_id = topic_id, "Topic deleted");
        Ok(())
    }

    async fn check_topics(&self, topic_ids: &[i64]) -> Result<Vec<i64>> {
        let mut ids = topic_ids.to_vec();
        ids.sort_unstable();
        ids.dedup();

        if !ids.is_empty() && self.topics.count_existing(&ids).await? != ids.len() as i64 {
            return Err(StudyBuddyError::InvalidInput("Unknown topic in topic_ids".to_string()));
        }
        Ok(ids)
    }

    async fn with_topics(&self, course: Course) -> Result<CourseWithTopics> {
        let topics = self.topics.list_for_course(course.id).await?;
        Ok(CourseWithTopics { course, topics })
    }

    pub async fn list_courses(&self) -> Result<Vec<CourseWithTopics>> {
        let courses = self.courses.list().await?;
        let mut result = Vec::with_capacity(courses.len());
        for course in courses {
            result.push(self.with_topics(course).await?);
        }
        Ok(result)
    }

    pub async fn get_course(&self, course_id: i64) -> Result<CourseWithTopics> {
        let course = self
            .courses
            .find_by_id(course_id)
            .await?
            .ok_or(StudyBuddyError::CourseNotFound { course_id })?;
        self.with_topics(course).await
    }

    pub async fn create_course(&self, request: CreateCourseRequest) -> Result<CourseWithTopics> {
        let name = required_name(&request.name, MAX_COURSE_NAME_LENGTH)?;
        let topic_ids = self.check_topics(&request.topic_ids).await?;
        let repo = &self.courses;
        let slug = unique_slug(&name, "course", |s| async move { repo.slug_exists(&s).await }).await?;

        let course = self
            .courses
            .create(
                &name,
                &slug,
                request.description,
                request.duration_hours,
                request.is_published.unwrap_or(false),
                &topic_ids,
            )
            .await?;

        info!(course_id = course.id, slug = %course.slug, topics = topic_ids.len(), "Course created");
        self.with_topics(course).await
    }

    pub async fn update_course(&self, course_id: i64, mut request: UpdateCourseRequest) -> Result<CourseWithTopics> {
        if let Some(name) = request.name.as_deref() {
            request.name = Some(required_name(name, MAX_COURSE_NAME_LENGTH)?);
        }
        if let Some(topic_ids) = request.topic_ids.take() {
            request.topic_ids = Some(self.check_topics(&topic_ids).await?);
        }

        let course = self
            .courses
            .update(course_id, request)
            .await?
            .ok_or(StudyBuddyError::CourseNotFound { course_id })?;

        debug!(course_id = course_id, "Course updated");
        self.with_topics(course).await
    }

    pub async fn delete_course(&self, course_id: i64) -> Result<()> {
        if !self.courses.delete(course_id).await? {
            return Err(StudyBuddyError::CourseNotFound { course_id });
        }
        info!(course_id = course_id, "Course deleted");
        Ok(())
    }
}
