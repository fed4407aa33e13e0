use rand::seq::SliceRandom;
use serde::Serialize;
use tracing::trace;

/// One right-column item as displayed: the text, where it came from, and the
/// letter label shown next to it.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ShuffledAnswer {
    pub text: String,
    pub original_index: usize,
    pub display_letter: char,
}

/// Shuffle the right column of a match question for display.
///
/// Re-shuffles until the order differs from the original one, so the learner
/// never sees the columns pre-matched. At least one element must move; a full
/// derangement is not required. Lists shorter than two elements cannot differ
/// and are returned as-is.
pub fn shuffle_answers(answers: &[String]) -> Vec<ShuffledAnswer> {
    let mut order: Vec<usize> = (0..answers.len()).collect();
    if answers.len() > 1 {
        let mut rng = rand::rng();
        loop {
            order.shuffle(&mut rng);
            if order.iter().enumerate().any(|(position, &original)| position != original) {
                break;
            }
            trace!("shuffle produced the original order; retrying");
        }
    }

    order
        .into_iter()
        .enumerate()
        .map(|(position, original_index)| ShuffledAnswer {
            text: answers[original_index].clone(),
            original_index,
            display_letter: char::from(b'A' + (position % 26) as u8),
        })
        .collect()
}
