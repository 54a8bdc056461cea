use crate::db::models::QuestionKind;
use crate::db::types::SubmissionStatus;

/// Auto-grades a single answer. Pure and deterministic: no I/O, inputs are
/// not mutated.
///
/// Only multiple-choice questions have a machine-decidable outcome: the
/// stored correct-option letter is compared against the student's answer
/// after trimming, case-insensitively, and awards full marks or zero.
/// Short-answer and coding questions always come back `pending` with a zero
/// score; they are graded manually.
pub(crate) fn grade(kind: &QuestionKind, marks: i32, raw_answer: &str) -> (SubmissionStatus, i32) {
    match kind {
        QuestionKind::MultipleChoice { correct_option, .. } => {
            if raw_answer.trim().eq_ignore_ascii_case(correct_option.trim()) {
                (SubmissionStatus::Correct, marks)
            } else {
                (SubmissionStatus::Incorrect, 0)
            }
        }
        QuestionKind::ShortAnswer { .. } | QuestionKind::Coding { .. } => {
            (SubmissionStatus::Pending, 0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::TestCase;

    fn mcq(correct: &str) -> QuestionKind {
        QuestionKind::MultipleChoice {
            options: vec!["first".to_string(), "second".to_string(), "third".to_string()],
            correct_option: correct.to_string(),
        }
    }

    #[test]
    fn mcq_correct_is_case_insensitive() {
        assert_eq!(grade(&mcq("B"), 5, "b"), (SubmissionStatus::Correct, 5));
    }

    #[test]
    fn mcq_wrong_letter_scores_zero() {
        assert_eq!(grade(&mcq("B"), 5, "C"), (SubmissionStatus::Incorrect, 0));
    }

    #[test]
    fn mcq_answer_is_trimmed() {
        assert_eq!(grade(&mcq("B"), 5, " b "), (SubmissionStatus::Correct, 5));
    }

    #[test]
    fn mcq_empty_answer_is_incorrect() {
        assert_eq!(grade(&mcq("B"), 5, ""), (SubmissionStatus::Incorrect, 0));
    }

    #[test]
    fn short_answer_stays_pending() {
        let kind = QuestionKind::ShortAnswer { expected_answer: "42".to_string() };
        assert_eq!(grade(&kind, 3, "42"), (SubmissionStatus::Pending, 0));
    }

    #[test]
    fn coding_stays_pending() {
        let kind = QuestionKind::Coding {
            test_cases: vec![TestCase { input: "1".to_string(), expected_output: "1".to_string() }],
        };
        assert_eq!(grade(&kind, 10, "print(1)"), (SubmissionStatus::Pending, 0));
    }
}
