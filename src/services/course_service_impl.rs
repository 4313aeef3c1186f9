//! `SeaORM` implementation of the `CourseService` trait.

use async_trait::async_trait;
use tracing::{debug, info};

use crate::db::Store;
use crate::domain::{CourseId, Principal, Role};
use crate::entities::courses;
use crate::models::course::{
    Course, CourseDraft, DEFAULT_SEGMENT_COUNT, Enrollment, MAX_SEGMENT_COUNT,
    MemberCourseProgress, NewCourse, WatchInput, WatchOutcome, WatchRecord,
};
use crate::services::course_service::CourseService;
use crate::services::error::ServiceError;

pub struct SeaOrmCourseService {
    store: Store,
}

impl SeaOrmCourseService {
    #[must_use]
    pub const fn new(store: Store) -> Self {
        Self { store }
    }

    async fn find_visible(
        &self,
        principal: &Principal,
        id: CourseId,
    ) -> Result<courses::Model, ServiceError> {
        let course = self
            .store
            .courses()
            .get(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Course not found"))?;

        if !principal.is_admin() && course.department != principal.department {
            return Err(ServiceError::forbidden(
                "This course is not available to your department",
            ));
        }
        Ok(course)
    }
}

#[async_trait]
impl CourseService for SeaOrmCourseService {
    async fn list(&self, principal: &Principal) -> Result<Vec<Course>, ServiceError> {
        let department = (!principal.is_admin()).then_some(principal.department);
        Ok(self.store.courses().list(department).await?)
    }

    async fn create(
        &self,
        principal: &Principal,
        draft: CourseDraft,
    ) -> Result<Course, ServiceError> {
        let department = match principal.role {
            Role::Admin => draft.department.unwrap_or(principal.department),
            Role::TeamLeader => {
                let department = draft.department.unwrap_or(principal.department);
                if department != principal.department {
                    return Err(ServiceError::forbidden(
                        "You can only create courses for your department",
                    ));
                }
                department
            }
            Role::Employee => {
                return Err(ServiceError::forbidden(
                    "Only team leaders and admins can create courses",
                ));
            }
        };

        let segment_count = draft.segment_count.unwrap_or(DEFAULT_SEGMENT_COUNT);
        if !(1..=MAX_SEGMENT_COUNT).contains(&segment_count) {
            return Err(ServiceError::validation(format!(
                "Segment count must be between 1 and {MAX_SEGMENT_COUNT}"
            )));
        }

        let course = self
            .store
            .courses()
            .create(NewCourse {
                title: draft.title,
                description: draft.description,
                department,
                video_url: draft.video_url,
                segment_count,
                created_by: principal.id,
            })
            .await?;

        info!(course_id = %course.id, department = %department, "Course created");
        Ok(course)
    }

    async fn enroll(
        &self,
        principal: &Principal,
        id: CourseId,
    ) -> Result<Enrollment, ServiceError> {
        let course = self.find_visible(principal, id).await?;
        Ok(self.store.courses().enroll(principal.id, &course).await?)
    }

    async fn record_watch(
        &self,
        principal: &Principal,
        id: CourseId,
        input: WatchInput,
    ) -> Result<WatchOutcome, ServiceError> {
        if input.duration < 0 || input.position < 0 {
            return Err(ServiceError::validation(
                "Duration and position must not be negative",
            ));
        }

        let course = self.find_visible(principal, id).await?;
        let outcome = self
            .store
            .courses()
            .record_watch(principal.id, &course, input)
            .await?;

        debug!(
            user_id = %principal.id,
            course_id = %id,
            progress = outcome.enrollment.progress,
            "Watch progress recorded"
        );
        Ok(outcome)
    }

    async fn watch_history(
        &self,
        principal: &Principal,
        id: CourseId,
    ) -> Result<Vec<WatchRecord>, ServiceError> {
        self.find_visible(principal, id).await?;
        Ok(self.store.courses().watch_history(principal.id, id).await?)
    }

    async fn team_progress(
        &self,
        principal: &Principal,
    ) -> Result<Vec<MemberCourseProgress>, ServiceError> {
        if !principal.is_team_leader() {
            return Err(ServiceError::forbidden("Team leader access required"));
        }
        Ok(self
            .store
            .courses()
            .team_progress(principal.department)
            .await?)
    }
}
