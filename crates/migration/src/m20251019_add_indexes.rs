use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // One request per (student, course); concurrent duplicate requests fail here
        manager
            .create_index(
                Index::create()
                    .name("uq_student_courses_student_course")
                    .table(StudentCourses::Table)
                    .col(StudentCourses::StudentId)
                    .col(StudentCourses::CourseId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Codes are stored uppercased, so a plain unique index is case-insensitive.
        // NULL codes never collide.
        manager
            .create_index(
                Index::create()
                    .name("uq_add_on_courses_code")
                    .table(AddOnCourses::Table)
                    .col(AddOnCourses::Code)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_students_email")
                    .table(Students::Table)
                    .col(Students::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_students_reg_no")
                    .table(Students::Table)
                    .col(Students::RegNo)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Dashboards filter enrollments by status and list newest first
        manager
            .create_index(
                Index::create()
                    .name("idx_student_courses_status_purchased_at")
                    .table(StudentCourses::Table)
                    .col(StudentCourses::Status)
                    .col(StudentCourses::PurchasedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_student_courses_course_id")
                    .table(StudentCourses::Table)
                    .col(StudentCourses::CourseId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_add_on_courses_department_id")
                    .table(AddOnCourses::Table)
                    .col(AddOnCourses::DepartmentId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for name in [
            "idx_add_on_courses_department_id",
            "idx_student_courses_course_id",
            "idx_student_courses_status_purchased_at",
            "uq_students_reg_no",
            "uq_students_email",
            "uq_add_on_courses_code",
            "uq_student_courses_student_course",
        ] {
            manager
                .drop_index(Index::drop().name(name).to_owned())
                .await?;
        }

        Ok(())
    }
}

#[derive(Iden)]
enum AddOnCourses {
    Table,
    Code,
    DepartmentId,
}

#[derive(Iden)]
enum Students {
    Table,
    Email,
    RegNo,
}

#[derive(Iden)]
enum StudentCourses {
    Table,
    StudentId,
    CourseId,
    Status,
    PurchasedAt,
}
