// src/models/submission.rs

use std::fmt;

use serde::{
    Deserialize, Deserializer, Serialize, Serializer,
    de::{MapAccess, Visitor},
    ser::SerializeMap,
};

/// A candidate's answers: question id -> chosen answer id.
///
/// Entries keep their wire order and are not deduplicated, so a payload that
/// names the same question twice can be rejected by the scoring engine
/// instead of silently keeping the last value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Submission {
    entries: Vec<(i64, i64)>,
}

impl Submission {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds one answer. Builder-style, mostly for tests and seeding.
    pub fn answer(mut self, question_id: i64, answer_id: i64) -> Self {
        self.entries.push((question_id, answer_id));
        self
    }

    pub fn entries(&self) -> &[(i64, i64)] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(i64, i64)> for Submission {
    fn from_iter<I: IntoIterator<Item = (i64, i64)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl Serialize for Submission {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (question_id, answer_id) in &self.entries {
            map.serialize_entry(&question_id.to_string(), answer_id)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Submission {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SubmissionVisitor;

        impl<'de> Visitor<'de> for SubmissionVisitor {
            type Value = Submission;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of question id to answer id")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Submission, A::Error> {
                let mut entries = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some(entry) = map.next_entry::<i64, i64>()? {
                    entries.push(entry);
                }
                Ok(Submission { entries })
            }
        }

        deserializer.deserialize_map(SubmissionVisitor)
    }
}

/// DTO for submitting an exam attempt.
#[derive(Debug, Serialize, Deserialize)]
pub struct SubmitExamRequest {
    /// Key: Question ID, Value: chosen Answer ID.
    pub answers: Submission,
}
