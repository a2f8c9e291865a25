use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "add_on_courses")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Human readable code such as `CS101`, stored uppercased
    #[sea_orm(unique)]
    pub code: Option<String>,
    pub name: String,
    pub department_id: Option<Uuid>,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    pub price: i32,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::departments::Entity",
        from = "Column::DepartmentId",
        to = "super::departments::Column::Id",
        on_delete = "Cascade"
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

// Many-to-many relationship with the students who requested this course
impl Related<super::students::Entity> for Entity {
    fn to() -> RelationDef {
        super::student_courses::Relation::Student.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::student_courses::Relation::Course.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
