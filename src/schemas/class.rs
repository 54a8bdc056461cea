use serde::{Deserialize, Serialize};

use crate::core::time::format_primitive;
use crate::repositories::classes::ClassSummaryRow;
use crate::repositories::enrollments::RosterRow;

#[derive(Debug, Deserialize)]
pub(crate) struct ClassCreate {
    pub(crate) name: String,
    #[serde(default)]
    pub(crate) teacher_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ClassUpdate {
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) teacher_id: Option<String>,
    /// Unassigns the teacher; mutually exclusive with `teacher_id`.
    #[serde(default)]
    pub(crate) remove_teacher: bool,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EnrollmentCreate {
    pub(crate) student_id: String,
    pub(crate) registration_number: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct ClassResponse {
    pub(crate) id: String,
    pub(crate) name: String,
    pub(crate) teacher_id: Option<String>,
    pub(crate) teacher_name: Option<String>,
    pub(crate) student_count: i64,
    pub(crate) test_count: i64,
    pub(crate) created_at: String,
    pub(crate) updated_at: String,
}

impl ClassResponse {
    pub(crate) fn from_db(row: ClassSummaryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            teacher_id: row.teacher_id,
            teacher_name: row.teacher_name,
            student_count: row.student_count,
            test_count: row.test_count,
            created_at: format_primitive(row.created_at),
            updated_at: format_primitive(row.updated_at),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct RosterEntryResponse {
    pub(crate) id: String,
    pub(crate) student_id: String,
    pub(crate) student_name: String,
    pub(crate) student_email: String,
    pub(crate) registration_number: String,
    pub(crate) enrolled_at: String,
}

impl RosterEntryResponse {
    pub(crate) fn from_db(row: RosterRow) -> Self {
        Self {
            id: row.id,
            student_id: row.student_id,
            student_name: row.student_name,
            student_email: row.student_email,
            registration_number: row.registration_number,
            enrolled_at: format_primitive(row.created_at),
        }
    }
}
