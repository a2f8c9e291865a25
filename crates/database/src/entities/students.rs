use models::role::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A portal account; principals share the table and differ by `role`
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "students")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
    #[sea_orm(unique)]
    pub reg_no: String,
    pub department_id: Option<Uuid>,
    pub year_of_admission: i32,
    pub phone_no: Option<String>,
    pub age: Option<i32>,
    pub picture: Option<String>,
    pub date_joined: DateTimeUtc,
}

impl Model {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::Id",
        on_delete = "SetNull"
    )]
    Department,
    #[sea_orm(has_many = "super::student_courses::Entity")]
    StudentCourses,
}

impl Related<super::departments::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Department.def()
    }
}

impl Related<super::student_courses::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::StudentCourses.def()
    }
}

// Many-to-many relationship with requested add-on courses
impl Related<super::add_on_courses::Entity> for Entity {
    fn to() -> RelationDef {
        super::student_courses::Relation::Course.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::student_courses::Relation::Student.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
