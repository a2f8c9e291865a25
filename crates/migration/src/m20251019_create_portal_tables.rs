use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Create departments table
        manager
            .create_table(
                Table::create()
                    .table(Departments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Departments::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Departments::Name).string_len(20).not_null())
                    .col(ColumnDef::new(Departments::Description).text().not_null())
                    .to_owned(),
            )
            .await?;

        // Create add-on courses table
        manager
            .create_table(
                Table::create()
                    .table(AddOnCourses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(AddOnCourses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(AddOnCourses::Code).string_len(20))
                    .col(ColumnDef::new(AddOnCourses::Name).string_len(100).not_null())
                    .col(ColumnDef::new(AddOnCourses::DepartmentId).uuid())
                    .col(ColumnDef::new(AddOnCourses::Description).text().not_null())
                    .col(
                        ColumnDef::new(AddOnCourses::Price)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(AddOnCourses::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-add_on_courses-department_id")
                            .from(AddOnCourses::Table, AddOnCourses::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Create students table (holds principals too, distinguished by role)
        manager
            .create_table(
                Table::create()
                    .table(Students::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Students::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Students::Email).string().not_null())
                    .col(ColumnDef::new(Students::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Students::FirstName).string_len(30).not_null())
                    .col(ColumnDef::new(Students::LastName).string_len(150).not_null())
                    .col(
                        ColumnDef::new(Students::Role)
                            .string_len(20)
                            .not_null()
                            .default("STUDENT"),
                    )
                    .col(ColumnDef::new(Students::RegNo).string_len(12).not_null())
                    .col(ColumnDef::new(Students::DepartmentId).uuid())
                    .col(
                        ColumnDef::new(Students::YearOfAdmission)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Students::PhoneNo).string_len(10))
                    .col(ColumnDef::new(Students::Age).integer())
                    .col(ColumnDef::new(Students::Picture).string())
                    .col(
                        ColumnDef::new(Students::DateJoined)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-students-department_id")
                            .from(Students::Table, Students::DepartmentId)
                            .to(Departments::Table, Departments::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        // Create student_courses junction table (enrollment requests)
        manager
            .create_table(
                Table::create()
                    .table(StudentCourses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(StudentCourses::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(StudentCourses::StudentId).uuid().not_null())
                    .col(ColumnDef::new(StudentCourses::CourseId).uuid().not_null())
                    .col(
                        ColumnDef::new(StudentCourses::Status)
                            .string_len(20)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(StudentCourses::PurchasedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(StudentCourses::ApprovedAt).timestamp_with_time_zone())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_courses-student_id")
                            .from(StudentCourses::Table, StudentCourses::StudentId)
                            .to(Students::Table, Students::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk-student_courses-course_id")
                            .from(StudentCourses::Table, StudentCourses::CourseId)
                            .to(AddOnCourses::Table, AddOnCourses::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Drop tables in reverse order due to foreign key constraints
        manager
            .drop_table(Table::drop().table(StudentCourses::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Students::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(AddOnCourses::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Departments::Table).to_owned())
            .await?;

        Ok(())
    }
}

#[derive(Iden)]
enum Departments {
    Table,
    Id,
    Name,
    Description,
}

#[derive(Iden)]
enum AddOnCourses {
    Table,
    Id,
    Code,
    Name,
    DepartmentId,
    Description,
    Price,
    CreatedAt,
}

#[derive(Iden)]
enum Students {
    Table,
    Id,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Role,
    RegNo,
    DepartmentId,
    YearOfAdmission,
    PhoneNo,
    Age,
    Picture,
    DateJoined,
}

#[derive(Iden)]
enum StudentCourses {
    Table,
    Id,
    StudentId,
    CourseId,
    Status,
    PurchasedAt,
    ApprovedAt,
}
