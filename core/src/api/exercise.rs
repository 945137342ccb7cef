use crate::error::ApiResult;
use crate::http::ApiClient;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Exercise {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub course_id: Option<i64>,
    #[serde(default)]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct ExerciseQuery {
    pub course_id: Option<i64>,
    pub difficulty: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl ExerciseQuery {
    fn to_query(&self) -> Vec<(String, String)> {
        let mut query = Vec::new();
        if let Some(course_id) = self.course_id {
            query.push(("course_id".to_string(), course_id.to_string()));
        }
        if let Some(difficulty) = &self.difficulty {
            query.push(("difficulty".to_string(), difficulty.clone()));
        }
        if let Some(page) = self.page {
            query.push(("page".to_string(), page.to_string()));
        }
        if let Some(page_size) = self.page_size {
            query.push(("page_size".to_string(), page_size.to_string()));
        }
        query
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseDraft {
    pub title: String,
    pub course_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct GenerateParams {
    pub count: Option<u32>,
    pub difficulty: Option<String>,
}

/// One attempt at an exercise, from `start` through `complete`.
#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseRecord {
    pub id: i64,
    pub exercise_id: i64,
    #[serde(default)]
    pub score: Option<f64>,
    #[serde(default)]
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerSubmission {
    pub question_id: i64,
    pub answer: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AnswerResult {
    pub correct: bool,
    #[serde(default)]
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExerciseStats {
    #[serde(default)]
    pub total_attempts: i64,
    #[serde(default)]
    pub completed: i64,
    #[serde(default)]
    pub average_score: Option<f64>,
}

pub async fn list_exercises(api: &ApiClient, query: &ExerciseQuery) -> ApiResult<Vec<Exercise>> {
    api.get_with_query("/exercises", query.to_query()).await
}

pub async fn get_exercise(api: &ApiClient, id: i64) -> ApiResult<Exercise> {
    api.get(&format!("/exercises/{id}")).await
}

pub async fn create_exercise(api: &ApiClient, draft: &ExerciseDraft) -> ApiResult<Exercise> {
    api.post("/exercises", draft).await
}

/// AI-generate exercises for one chapter.
pub async fn generate_exercises(
    api: &ApiClient,
    course_id: i64,
    chapter_id: i64,
    params: &GenerateParams,
) -> ApiResult<Vec<Exercise>> {
    let mut query = Vec::new();
    if let Some(count) = params.count {
        query.push(("count".to_string(), count.to_string()));
    }
    if let Some(difficulty) = &params.difficulty {
        query.push(("difficulty".to_string(), difficulty.clone()));
    }
    api.post_with_query(
        &format!("/exercises/{course_id}/chapters/{chapter_id}/generate"),
        query,
    )
    .await
}

pub async fn start_exercise(api: &ApiClient, exercise_id: i64) -> ApiResult<ExerciseRecord> {
    api.post_empty(&format!("/exercise-records/start/{exercise_id}"))
        .await
}

pub async fn submit_answer(
    api: &ApiClient,
    record_id: i64,
    submission: &AnswerSubmission,
) -> ApiResult<AnswerResult> {
    api.post(&format!("/exercise-records/{record_id}/answers"), submission)
        .await
}

pub async fn complete_exercise(api: &ApiClient, record_id: i64) -> ApiResult<ExerciseRecord> {
    api.post_empty(&format!("/exercise-records/{record_id}/complete"))
        .await
}

pub async fn exercise_stats(api: &ApiClient) -> ApiResult<ExerciseStats> {
    api.get("/exercises/stats").await
}
