use crate::{
    entities::students,
    services::{
        course::CourseService,
        department::{DepartmentService, DepartmentWithCourseCount},
        enrollment::{EnrollmentDetail, EnrollmentService},
        error::ServiceError,
        student::StudentService,
    },
};
use sea_orm::DatabaseConnection;
use serde::Serialize;

/// Students shown in the "recently joined" panel
pub const RECENT_STUDENTS: u64 = 5;

#[derive(Debug, Clone, Serialize)]
pub struct PrincipalOverview {
    pub total_students: u64,
    pub total_departments: u64,
    pub total_courses: u64,
    pub pending_count: u64,
    pub total_revenue: i64,
    pub recent_students: Vec<students::Model>,
    pub pending_approvals: Vec<EnrollmentDetail>,
    pub departments: Vec<DepartmentWithCourseCount>,
}

pub struct DashboardService;

impl DashboardService {
    pub async fn principal_overview(
        db: &DatabaseConnection,
    ) -> Result<PrincipalOverview, ServiceError> {
        let (total_students, total_departments, total_courses, pending_count, total_revenue) = futures::try_join!(
            StudentService::count_students(db),
            DepartmentService::count(db),
            CourseService::count(db),
            EnrollmentService::count_pending(db),
            EnrollmentService::aggregate_revenue(db),
        )?;

        let (recent_students, pending_approvals, departments) = futures::try_join!(
            StudentService::recent(db, RECENT_STUDENTS),
            EnrollmentService::pending_approvals(db),
            DepartmentService::list_with_course_counts(db),
        )?;

        Ok(PrincipalOverview {
            total_students,
            total_departments,
            total_courses,
            pending_count,
            total_revenue,
            recent_students,
            pending_approvals,
            departments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{account, course, department, setup};
    use models::{actor::Actor, role::Role};

    #[tokio::test]
    async fn test_overview_counts() {
        let db = setup().await;
        let cs = department(&db, "CS").await;
        let c1 = course(&db, &cs, "C1", 500).await;
        course(&db, &cs, "C2", 300).await;
        account(&db, "Meera", Role::Principal).await;
        let asha = account(&db, "Asha", Role::Student).await;
        EnrollmentService::request_enrollment(&db, &Actor::new(asha.id, Role::Student), &[c1.id])
            .await
            .unwrap();

        let overview = DashboardService::principal_overview(&db).await.unwrap();
        assert_eq!(overview.total_students, 1);
        assert_eq!(overview.total_departments, 1);
        assert_eq!(overview.total_courses, 2);
        assert_eq!(overview.pending_count, 1);
        assert_eq!(overview.total_revenue, 0);
        assert_eq!(overview.recent_students.len(), 1);
        assert_eq!(overview.pending_approvals.len(), 1);
        assert_eq!(overview.departments[0].course_count, 2);
    }
}
