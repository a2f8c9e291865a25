pub mod add_on_courses;
pub mod departments;
pub mod student_courses;
pub mod students;
