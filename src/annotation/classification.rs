//! Classification payloads: free text, radio, checklist, and prompt.

use std::collections::BTreeMap;
use std::collections::HashSet;

use crate::error::LabelwireError;

use super::{ClassificationAnnotation, FeatureRef};

/// The payload of a classification annotation.
#[derive(Clone, Debug, PartialEq)]
pub enum ClassificationValue {
    /// Free-text answer.
    Text(TextValue),
    /// Exactly one selected option.
    Radio(Radio),
    /// A set of selected options, de-duplicated by feature identity.
    Checklist(Checklist),
    /// Free text authored for a generative task. Shares the text wire
    /// shape, so it deserializes as [`ClassificationValue::Text`].
    Prompt(TextValue),
}

/// A free-text answer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TextValue {
    pub answer: String,
}

impl TextValue {
    pub fn new(answer: impl Into<String>) -> Self {
        Self {
            answer: answer.into(),
        }
    }
}

/// A single selected option.
#[derive(Clone, Debug, PartialEq)]
pub struct Radio {
    pub answer: Answer,
}

impl Radio {
    pub fn new(answer: Answer) -> Self {
        Self { answer }
    }
}

/// A set of selected options.
#[derive(Clone, Debug, PartialEq)]
pub struct Checklist {
    answers: Vec<Answer>,
}

impl Checklist {
    /// Creates a checklist, dropping answers that repeat an earlier
    /// answer's feature identity. Order of first occurrence is kept.
    pub fn new(answers: Vec<Answer>) -> Self {
        let mut seen = HashSet::with_capacity(answers.len());
        let deduped = answers
            .into_iter()
            .filter(|answer| seen.insert(answer.feature.identity()))
            .collect();
        Self { answers: deduped }
    }

    /// Selected answers in first-occurrence order.
    pub fn answers(&self) -> &[Answer] {
        &self.answers
    }
}

/// One selected option of a radio or checklist, optionally carrying
/// nested classifications of its own.
#[derive(Clone, Debug, PartialEq)]
pub struct Answer {
    pub feature: FeatureRef,
    pub confidence: Option<f64>,
    pub classifications: Vec<ClassificationAnnotation>,
    /// Unrecognized wire fields, preserved for lossless round trips.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Answer {
    pub fn new(feature: FeatureRef) -> Self {
        Self {
            feature,
            confidence: None,
            classifications: Vec::new(),
            extra: BTreeMap::new(),
        }
    }

    /// Shorthand for an answer referenced by feature name.
    pub fn named(name: impl Into<String>) -> Self {
        Self::new(FeatureRef::named(name))
    }

    /// Adds a confidence score in `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self, LabelwireError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(LabelwireError::invalid(
                "answer.confidence",
                format!("confidence {confidence} outside [0, 1]"),
            ));
        }
        self.confidence = Some(confidence);
        Ok(self)
    }

    /// Attaches nested classifications to this answer.
    pub fn with_classifications(mut self, classifications: Vec<ClassificationAnnotation>) -> Self {
        self.classifications = classifications;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn checklist_dedupes_by_feature_identity() {
        let checklist = Checklist::new(vec![
            Answer::named("opt-a"),
            Answer::named("opt-b"),
            Answer::named("opt-a"),
        ]);
        let names: Vec<_> = checklist
            .answers()
            .iter()
            .map(|a| a.feature.name().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["opt-a", "opt-b"]);
    }

    #[test]
    fn checklist_keeps_first_occurrence_order() {
        let checklist = Checklist::new(vec![Answer::named("b"), Answer::named("a")]);
        let names: Vec<_> = checklist
            .answers()
            .iter()
            .map(|a| a.feature.name().unwrap_or_default().to_string())
            .collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn answer_confidence_is_range_checked() {
        assert!(Answer::named("x").with_confidence(1.5).is_err());
        assert!(Answer::named("x").with_confidence(-0.1).is_err());
        let answer = Answer::named("x").with_confidence(0.25).expect("answer");
        assert_eq!(answer.confidence, Some(0.25));
    }
}
