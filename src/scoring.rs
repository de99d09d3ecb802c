use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Letters a strict answer string may contain.
pub const ANSWER_LETTERS: &[char] = &['a', 'b', 'c', 'd'];

/// Point values for one question, keyed by answer letter.
///
/// Values stay as raw JSON so a key document round-trips unchanged even when
/// an operator typed `"5"` or `5.0` instead of `5`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyTable(pub BTreeMap<String, serde_json::Value>);

impl KeyTable {
    pub fn from_points<I, S>(points: I) -> Self
    where
        I: IntoIterator<Item = (S, i64)>,
        S: Into<String>,
    {
        KeyTable(
            points
                .into_iter()
                .map(|(k, v)| (k.into(), serde_json::Value::from(v)))
                .collect(),
        )
    }

    /// Points for `letter`, or `None` when the letter is absent or its value
    /// is not a number.
    pub fn points(&self, letter: char) -> Option<i64> {
        let mut buf = [0u8; 4];
        let value = self.0.get(letter.encode_utf8(&mut buf) as &str)?;
        value_points(value)
    }
}

fn value_points(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        serde_json::Value::String(s) => s.trim().parse::<i64>().ok(),
        serde_json::Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

pub type DescriptionTable = BTreeMap<String, String>;

/// Sum of the points for every answered position the key covers.
///
/// Positions past the end of the key, letters missing from a question's
/// table and non-numeric values all contribute zero. The total saturates at
/// the `i64` bounds.
pub fn compute_score(keys: &[KeyTable], answers: &str) -> i64 {
    answers
        .chars()
        .enumerate()
        .map(|(i, ch)| match keys.get(i).and_then(|t| t.points(ch)) {
            Some(p) => p,
            None => {
                tracing::debug!(position = i, letter = %ch, "answer position not scored");
                0
            }
        })
        .fold(0i64, |acc, p| acc.saturating_add(p))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionFeedback {
    pub index: usize,
    pub letter: char,
    pub points: Option<i64>,
    pub description: Option<String>,
}

/// Per-question feedback for an answer string.
pub fn feedback(
    keys: &[KeyTable],
    descriptions: &[DescriptionTable],
    answers: &str,
) -> Vec<QuestionFeedback> {
    answers
        .chars()
        .enumerate()
        .map(|(index, letter)| {
            let mut buf = [0u8; 4];
            let key = letter.encode_utf8(&mut buf) as &str;
            QuestionFeedback {
                index,
                letter,
                points: keys.get(index).and_then(|t| t.points(letter)),
                description: descriptions.get(index).and_then(|d| d.get(key)).cloned(),
            }
        })
        .collect()
}

/// One "- description" line per question that has a description.
pub fn render_feedback(items: &[QuestionFeedback]) -> String {
    items
        .iter()
        .filter_map(|f| f.description.as_deref())
        .map(|d| format!("- {}", d))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Check an answer string before it is scored.
///
/// Lenient mode accepts anything; the scorer tolerates short or malformed
/// strings. Strict mode requires exactly one letter `a`..=`d` per question.
pub fn validate_answers(answers: &str, question_count: usize, strict: bool) -> Result<(), String> {
    if !strict {
        return Ok(());
    }
    let len = answers.chars().count();
    if len != question_count {
        return Err(format!(
            "answers must have {} letters, got {}",
            question_count, len
        ));
    }
    if let Some((i, ch)) = answers
        .chars()
        .enumerate()
        .find(|(_, ch)| !ANSWER_LETTERS.contains(ch))
    {
        return Err(format!(
            "answer {} is '{}', expected one of a, b, c, d",
            i + 1,
            ch
        ));
    }
    Ok(())
}
