use crate::entities::prelude::*;
use crate::entities::{course_enrollments, course_watch_history, login_sessions, tasks};
use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::Schema;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        let backend = manager.get_database_backend();
        let schema = Schema::new(backend);

        manager
            .create_table(
                schema
                    .create_table_from_entity(Users)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(LoginSessions)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Tasks)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Courses)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(CourseEnrollments)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(CourseWatchHistory)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                schema
                    .create_table_from_entity(Notifications)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_enrollments_user_course")
                    .table(CourseEnrollments)
                    .col(course_enrollments::Column::UserId)
                    .col(course_enrollments::Column::CourseId)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_course_watch_history_user_course_date")
                    .table(CourseWatchHistory)
                    .col(course_watch_history::Column::UserId)
                    .col(course_watch_history::Column::CourseId)
                    .col(course_watch_history::Column::WatchDate)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_login_sessions_user_active")
                    .table(LoginSessions)
                    .col(login_sessions::Column::UserId)
                    .col(login_sessions::Column::IsActive)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_tasks_assigned_to")
                    .table(Tasks)
                    .col(tasks::Column::AssignedTo)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Notifications).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseWatchHistory).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(CourseEnrollments).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Courses).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tasks).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(LoginSessions).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Users).to_owned())
            .await?;

        Ok(())
    }
}
