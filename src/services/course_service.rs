//! Domain service for courses, enrollments and watch history.

use crate::domain::{CourseId, Principal};
use crate::models::course::{
    Course, CourseDraft, Enrollment, MemberCourseProgress, WatchInput, WatchOutcome, WatchRecord,
};
use crate::services::error::ServiceError;

#[async_trait::async_trait]
pub trait CourseService: Send + Sync {
    /// Admins see the whole catalog, everyone else their department's courses.
    async fn list(&self, principal: &Principal) -> Result<Vec<Course>, ServiceError>;

    async fn create(&self, principal: &Principal, draft: CourseDraft)
    -> Result<Course, ServiceError>;

    /// Enrolls the caller. Enrolling twice returns the existing enrollment.
    async fn enroll(&self, principal: &Principal, id: CourseId)
    -> Result<Enrollment, ServiceError>;

    /// Records a watch event for the caller and advances their progress.
    async fn record_watch(
        &self,
        principal: &Principal,
        id: CourseId,
        input: WatchInput,
    ) -> Result<WatchOutcome, ServiceError>;

    async fn watch_history(
        &self,
        principal: &Principal,
        id: CourseId,
    ) -> Result<Vec<WatchRecord>, ServiceError>;

    /// Course progress of every employee in the team leader's department.
    async fn team_progress(
        &self,
        principal: &Principal,
    ) -> Result<Vec<MemberCourseProgress>, ServiceError>;
}
