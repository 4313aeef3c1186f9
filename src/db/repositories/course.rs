use anyhow::{Context, Result};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
    sea_query::{Expr, OnConflict},
};
use std::collections::{BTreeSet, HashMap};

use crate::domain::scoring::course_progress;
use crate::domain::{CourseId, Department, Progress, Role, UserId};
use crate::entities::{course_enrollments, course_watch_history, courses, users};
use crate::models::course::{
    Course, Enrollment, MemberCourseProgress, NewCourse, WatchInput, WatchOutcome, WatchRecord,
    decode_segments, encode_segments,
};

pub struct CourseRepository {
    conn: DatabaseConnection,
}

#[derive(Debug, FromQueryResult)]
struct WatchTotals {
    user_id: i32,
    course_id: i32,
    total_duration: Option<i64>,
    days_watched: i64,
}

impl CourseRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    pub async fn get(&self, id: CourseId) -> Result<Option<courses::Model>> {
        courses::Entity::find_by_id(id.value())
            .one(&self.conn)
            .await
            .context("Failed to query course by ID")
    }

    /// Courses, optionally limited to one department, each with its enrollment count.
    pub async fn list(&self, department: Option<Department>) -> Result<Vec<Course>> {
        let mut query = courses::Entity::find().order_by_asc(courses::Column::Id);
        if let Some(department) = department {
            query = query.filter(courses::Column::Department.eq(department));
        }
        let rows = query
            .all(&self.conn)
            .await
            .context("Failed to list courses")?;

        let ids: Vec<i32> = rows.iter().map(|c| c.id).collect();
        let counts = self.enrollment_counts(ids).await?;

        Ok(rows
            .into_iter()
            .map(|course| {
                let enrolled = counts.get(&course.id).copied().unwrap_or(0);
                Course::from_row(course, enrolled)
            })
            .collect())
    }

    async fn enrollment_counts(&self, course_ids: Vec<i32>) -> Result<HashMap<i32, u64>> {
        let rows = course_enrollments::Entity::find()
            .select_only()
            .column(course_enrollments::Column::CourseId)
            .column_as(course_enrollments::Column::Id.count(), "enrolled")
            .filter(course_enrollments::Column::CourseId.is_in(course_ids))
            .group_by(course_enrollments::Column::CourseId)
            .into_tuple::<(i32, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to count enrollments")?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (id, u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    pub async fn create(&self, new_course: NewCourse) -> Result<Course> {
        let model = courses::ActiveModel {
            title: Set(new_course.title),
            description: Set(new_course.description),
            department: Set(new_course.department),
            video_url: Set(new_course.video_url),
            segment_count: Set(new_course.segment_count),
            created_by: Set(Some(new_course.created_by.value())),
            created_at: Set(crate::db::timestamp()),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert course")?;

        Ok(Course::from_row(model, 0))
    }

    async fn find_enrollment<C: ConnectionTrait>(
        conn: &C,
        user_id: UserId,
        course_id: i32,
    ) -> Result<Option<course_enrollments::Model>> {
        course_enrollments::Entity::find()
            .filter(course_enrollments::Column::UserId.eq(user_id.value()))
            .filter(course_enrollments::Column::CourseId.eq(course_id))
            .one(conn)
            .await
            .context("Failed to query enrollment")
    }

    /// Enrolls the user, leaving an existing enrollment untouched.
    pub async fn enroll(&self, user_id: UserId, course: &courses::Model) -> Result<Enrollment> {
        course_enrollments::Entity::insert(course_enrollments::ActiveModel {
            user_id: Set(user_id.value()),
            course_id: Set(course.id),
            progress: Set(0),
            completed: Set(false),
            enrolled_at: Set(crate::db::timestamp()),
            last_accessed: Set(None),
            last_position: Set(0),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                course_enrollments::Column::UserId,
                course_enrollments::Column::CourseId,
            ])
            .do_nothing()
            .to_owned(),
        )
        .exec_without_returning(&self.conn)
        .await
        .context("Failed to insert enrollment")?;

        let model = Self::find_enrollment(&self.conn, user_id, course.id)
            .await?
            .context("Enrollment missing after insert")?;

        Ok(Enrollment::from_row(model, Some(course.clone())))
    }

    /// Records one watch event.
    ///
    /// The day row accumulates duration and overwrites position and segments.
    /// Enrollment progress counts the distinct segments of every day and never
    /// decreases.
    pub async fn record_watch(
        &self,
        user_id: UserId,
        course: &courses::Model,
        input: WatchInput,
    ) -> Result<WatchOutcome> {
        let txn = self
            .conn
            .begin()
            .await
            .context("Failed to begin watch transaction")?;

        let now = crate::db::timestamp();
        let today = chrono::Utc::now().format("%Y-%m-%d").to_string();

        // Must stay the first statement: the write lock is taken before any read.
        course_watch_history::Entity::insert(course_watch_history::ActiveModel {
            user_id: Set(user_id.value()),
            course_id: Set(course.id),
            watch_date: Set(today.clone()),
            watch_duration: Set(input.duration),
            last_position: Set(input.position),
            completed_segments: Set(encode_segments(&input.completed_segments)),
            updated_at: Set(now.clone()),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                course_watch_history::Column::UserId,
                course_watch_history::Column::CourseId,
                course_watch_history::Column::WatchDate,
            ])
            .value(
                course_watch_history::Column::WatchDuration,
                Expr::col((
                    course_watch_history::Entity,
                    course_watch_history::Column::WatchDuration,
                ))
                .add(input.duration),
            )
            .update_columns([
                course_watch_history::Column::LastPosition,
                course_watch_history::Column::CompletedSegments,
                course_watch_history::Column::UpdatedAt,
            ])
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .context("Failed to upsert watch history")?;

        let days = course_watch_history::Entity::find()
            .filter(course_watch_history::Column::UserId.eq(user_id.value()))
            .filter(course_watch_history::Column::CourseId.eq(course.id))
            .all(&txn)
            .await
            .context("Failed to query watch history")?;

        let watched: BTreeSet<u32> = days
            .iter()
            .flat_map(|d| decode_segments(&d.completed_segments))
            .collect();
        let day = days
            .into_iter()
            .find(|d| d.watch_date == today)
            .context("Watch history row missing after upsert")?;

        let previous = Self::find_enrollment(&txn, user_id, course.id)
            .await?
            .map_or(Progress::default(), |e| Progress::saturating(e.progress));
        let progress = course_progress(previous, watched.len(), course.segment_count);

        course_enrollments::Entity::insert(course_enrollments::ActiveModel {
            user_id: Set(user_id.value()),
            course_id: Set(course.id),
            progress: Set(progress.value()),
            completed: Set(progress == Progress::COMPLETE),
            enrolled_at: Set(now.clone()),
            last_accessed: Set(Some(now)),
            last_position: Set(input.position),
            ..Default::default()
        })
        .on_conflict(
            OnConflict::columns([
                course_enrollments::Column::UserId,
                course_enrollments::Column::CourseId,
            ])
            .update_columns([
                course_enrollments::Column::Progress,
                course_enrollments::Column::Completed,
                course_enrollments::Column::LastAccessed,
                course_enrollments::Column::LastPosition,
            ])
            .to_owned(),
        )
        .exec_without_returning(&txn)
        .await
        .context("Failed to upsert enrollment")?;

        let enrollment = Self::find_enrollment(&txn, user_id, course.id)
            .await?
            .context("Enrollment missing after upsert")?;

        txn.commit()
            .await
            .context("Failed to commit watch transaction")?;

        Ok(WatchOutcome {
            today: WatchRecord::from(day),
            enrollment: Enrollment::from_row(enrollment, Some(course.clone())),
        })
    }

    /// Day rows for the user and course, most recent first.
    pub async fn watch_history(&self, user_id: UserId, course_id: CourseId) -> Result<Vec<WatchRecord>> {
        let rows = course_watch_history::Entity::find()
            .filter(course_watch_history::Column::UserId.eq(user_id.value()))
            .filter(course_watch_history::Column::CourseId.eq(course_id.value()))
            .order_by_desc(course_watch_history::Column::WatchDate)
            .all(&self.conn)
            .await
            .context("Failed to query watch history")?;

        Ok(rows.into_iter().map(WatchRecord::from).collect())
    }

    pub async fn enrollments_for(&self, user_id: UserId) -> Result<Vec<Enrollment>> {
        let rows = course_enrollments::Entity::find()
            .find_also_related(courses::Entity)
            .filter(course_enrollments::Column::UserId.eq(user_id.value()))
            .order_by_desc(course_enrollments::Column::EnrolledAt)
            .all(&self.conn)
            .await
            .context("Failed to list enrollments")?;

        Ok(rows
            .into_iter()
            .map(|(enrollment, course)| Enrollment::from_row(enrollment, course))
            .collect())
    }

    /// Number of courses of `department` each user is enrolled in.
    pub async fn department_enrollment_counts(
        &self,
        department: Department,
    ) -> Result<HashMap<UserId, u64>> {
        let rows = course_enrollments::Entity::find()
            .select_only()
            .column(course_enrollments::Column::UserId)
            .column_as(course_enrollments::Column::Id.count(), "enrolled")
            .inner_join(courses::Entity)
            .filter(courses::Column::Department.eq(department))
            .group_by(course_enrollments::Column::UserId)
            .into_tuple::<(i32, i64)>()
            .all(&self.conn)
            .await
            .context("Failed to count department enrollments")?;

        Ok(rows
            .into_iter()
            .map(|(id, count)| (UserId::new(id), u64::try_from(count).unwrap_or(0)))
            .collect())
    }

    /// Every enrollment of the department's employees, joined with watch totals.
    pub async fn team_progress(&self, department: Department) -> Result<Vec<MemberCourseProgress>> {
        let members = users::Entity::find()
            .filter(users::Column::Department.eq(department))
            .filter(users::Column::Role.eq(Role::Employee))
            .order_by_asc(users::Column::Name)
            .all(&self.conn)
            .await
            .context("Failed to list team members")?;

        let member_ids: Vec<i32> = members.iter().map(|m| m.id).collect();

        let enrollments = course_enrollments::Entity::find()
            .find_also_related(courses::Entity)
            .filter(course_enrollments::Column::UserId.is_in(member_ids.clone()))
            .order_by_asc(course_enrollments::Column::CourseId)
            .all(&self.conn)
            .await
            .context("Failed to list team enrollments")?;

        let totals: HashMap<(i32, i32), WatchTotals> = course_watch_history::Entity::find()
            .select_only()
            .column(course_watch_history::Column::UserId)
            .column(course_watch_history::Column::CourseId)
            .column_as(
                course_watch_history::Column::WatchDuration.sum(),
                "total_duration",
            )
            .column_as(
                Expr::col(course_watch_history::Column::WatchDate).count_distinct(),
                "days_watched",
            )
            .filter(course_watch_history::Column::UserId.is_in(member_ids))
            .group_by(course_watch_history::Column::UserId)
            .group_by(course_watch_history::Column::CourseId)
            .into_model::<WatchTotals>()
            .all(&self.conn)
            .await
            .context("Failed to aggregate watch history")?
            .into_iter()
            .map(|t| ((t.user_id, t.course_id), t))
            .collect();

        let mut rows = Vec::new();
        for member in &members {
            for (enrollment, course) in enrollments.iter().filter(|(e, _)| e.user_id == member.id) {
                let watch = totals.get(&(member.id, enrollment.course_id));
                rows.push(MemberCourseProgress {
                    user_id: UserId::new(member.id),
                    user_name: member.name.clone(),
                    email: member.email.clone(),
                    course_id: CourseId::new(enrollment.course_id),
                    course_title: course.as_ref().map(|c| c.title.clone()).unwrap_or_default(),
                    progress: enrollment.progress,
                    completed: enrollment.completed,
                    last_accessed: enrollment.last_accessed.clone(),
                    total_watch_seconds: watch.and_then(|w| w.total_duration).unwrap_or(0),
                    days_watched: watch.map_or(0, |w| w.days_watched),
                });
            }
        }

        Ok(rows)
    }
}
