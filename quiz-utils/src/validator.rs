use crate::answers::{AnswerStore, AnswerValue};
use crate::quiz::{Question, QuestionType};

/// Pre-submit completeness check for manual submissions.
///
/// Returns the 1-based numbers of unanswered questions, in question order, so
/// the whole list can be surfaced at once. Empty means the submission may
/// proceed. Timer-expiry submissions skip this check entirely.
pub fn unanswered_questions(questions: &[Question], answers: &AnswerStore) -> Vec<usize> {
    questions
        .iter()
        .enumerate()
        .filter(|(_, question)| !is_answered(question, answers))
        .map(|(index, _)| index + 1)
        .collect()
}

fn is_answered(question: &Question, answers: &AnswerStore) -> bool {
    let entry = answers.get(&question.id);
    // An entry of the wrong shape for the question's type counts as
    // unanswered rather than silently passing validation.
    match question.question_type {
        QuestionType::CodeSolve => matches!(
            entry,
            Some(AnswerValue::Code { code, .. }) if !code.trim().is_empty()
        ),
        QuestionType::MatchTheFollowing => (0..question.options.len())
            .all(|left| answers.matched_right(&question.id, left).is_some()),
        QuestionType::MultipleChoice => matches!(
            entry,
            Some(AnswerValue::Selections(selected)) if !selected.is_empty()
        ),
        QuestionType::SingleAnswer => matches!(entry, Some(AnswerValue::Choice(_))),
        QuestionType::ShortAnswer | QuestionType::LongAnswer => matches!(
            entry,
            Some(AnswerValue::Text(text)) if !text.trim().is_empty()
        ),
    }
}
