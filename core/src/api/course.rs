use crate::error::ApiResult;
use crate::http::ApiClient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Deserialize)]
pub struct Course {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub teacher_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CourseDraft {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseStats {
    #[serde(default)]
    pub student_count: i64,
    #[serde(default)]
    pub exercise_count: i64,
    #[serde(default)]
    pub average_score: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CourseMaterial {
    pub id: i64,
    pub file_name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LessonPlan {
    pub content: String,
}

pub async fn list_courses(api: &ApiClient) -> ApiResult<Vec<Course>> {
    api.get("/courses").await
}

pub async fn get_course(api: &ApiClient, id: i64) -> ApiResult<Course> {
    api.get(&format!("/courses/{id}")).await
}

pub async fn course_stats(api: &ApiClient, id: i64) -> ApiResult<CourseStats> {
    api.get(&format!("/courses/{id}/stats")).await
}

pub async fn create_course(api: &ApiClient, draft: &CourseDraft) -> ApiResult<Course> {
    api.post("/courses", draft).await
}

pub async fn update_course(api: &ApiClient, id: i64, draft: &CourseDraft) -> ApiResult<Course> {
    api.put(&format!("/courses/{id}"), draft).await
}

pub async fn delete_course(api: &ApiClient, id: i64) -> ApiResult<()> {
    api.delete(&format!("/courses/{id}")).await
}

/// Ask the backend to draft lesson content for one chapter.
pub async fn generate_lesson_plan(
    api: &ApiClient,
    course_id: i64,
    chapter_id: i64,
) -> ApiResult<LessonPlan> {
    api.post_empty(&format!("/courses/{course_id}/chapters/{chapter_id}/lesson-plan"))
        .await
}

pub async fn list_materials(api: &ApiClient, course_id: i64) -> ApiResult<Vec<CourseMaterial>> {
    api.get(&format!("/course-materials/{course_id}")).await
}

pub async fn upload_material(
    api: &ApiClient,
    course_id: i64,
    file_name: &str,
    bytes: Vec<u8>,
) -> ApiResult<CourseMaterial> {
    api.upload(&format!("/course-materials/{course_id}"), file_name, bytes)
        .await
}

pub async fn delete_material(api: &ApiClient, material_id: i64) -> ApiResult<()> {
    api.delete(&format!("/course-materials/{material_id}")).await
}
