//! Message evaluation tools for conversational data rows.

use std::collections::HashSet;

use crate::error::LabelwireError;

/// Selection of a single child message under a parent message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageSelection {
    pub parent_message_id: String,
    pub message_id: String,
}

impl MessageSelection {
    /// Creates a selection of `message_id` under `parent_message_id`.
    pub fn new(
        parent_message_id: impl Into<String>,
        message_id: impl Into<String>,
    ) -> Result<Self, LabelwireError> {
        let parent_message_id = parent_message_id.into();
        let message_id = message_id.into();
        if parent_message_id.is_empty() || message_id.is_empty() {
            return Err(LabelwireError::invalid(
                "message_selection",
                "parent and child message ids must be non-empty",
            ));
        }
        Ok(Self {
            parent_message_id,
            message_id,
        })
    }
}

/// One entry of a ranking: a message and its 1-indexed rank.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RankedMessage {
    pub message_id: String,
    pub order: u32,
}

/// A total ranking of child messages under a parent message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageRanking {
    parent_message_id: String,
    ranked: Vec<RankedMessage>,
}

impl MessageRanking {
    /// Creates a ranking. The orders must form a permutation of `1..=N`
    /// with no gaps or duplicates.
    pub fn new(
        parent_message_id: impl Into<String>,
        ranked: Vec<RankedMessage>,
    ) -> Result<Self, LabelwireError> {
        let parent_message_id = parent_message_id.into();
        if parent_message_id.is_empty() {
            return Err(LabelwireError::invalid(
                "message_ranking.parent_message_id",
                "parent message id must be non-empty",
            ));
        }
        if ranked.is_empty() {
            return Err(LabelwireError::invalid(
                "message_ranking.ranked",
                "ranking must contain at least one message",
            ));
        }
        validate_orders(&ranked)?;
        Ok(Self {
            parent_message_id,
            ranked,
        })
    }

    pub fn parent_message_id(&self) -> &str {
        &self.parent_message_id
    }

    /// Ranked messages in input order.
    pub fn ranked(&self) -> &[RankedMessage] {
        &self.ranked
    }
}

fn validate_orders(ranked: &[RankedMessage]) -> Result<(), LabelwireError> {
    let n = ranked.len() as u32;
    let mut seen = HashSet::with_capacity(ranked.len());
    for entry in ranked {
        if entry.order == 0 || entry.order > n {
            return Err(LabelwireError::invalid(
                "message_ranking.order",
                format!("order {} outside 1..={n}", entry.order),
            ));
        }
        if !seen.insert(entry.order) {
            return Err(LabelwireError::invalid(
                "message_ranking.order",
                format!("duplicate order {}", entry.order),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked(pairs: &[(&str, u32)]) -> Vec<RankedMessage> {
        pairs
            .iter()
            .map(|(id, order)| RankedMessage {
                message_id: (*id).into(),
                order: *order,
            })
            .collect()
    }

    #[test]
    fn selection_requires_both_ids() {
        assert!(MessageSelection::new("", "child").is_err());
        assert!(MessageSelection::new("parent", "").is_err());
        assert!(MessageSelection::new("parent", "child").is_ok());
    }

    #[test]
    fn ranking_accepts_a_permutation() {
        let ranking =
            MessageRanking::new("parent", ranked(&[("a", 2), ("b", 1), ("c", 3)])).expect("ranking");
        assert_eq!(ranking.ranked().len(), 3);
        assert_eq!(ranking.parent_message_id(), "parent");
    }

    #[test]
    fn ranking_rejects_gaps() {
        let err = MessageRanking::new("parent", ranked(&[("a", 1), ("b", 3)]));
        assert!(err.is_err());
    }

    #[test]
    fn ranking_rejects_duplicates() {
        let err = MessageRanking::new("parent", ranked(&[("a", 1), ("b", 1)]));
        assert!(err.is_err());
    }

    #[test]
    fn ranking_rejects_order_zero() {
        let err = MessageRanking::new("parent", ranked(&[("a", 0)]));
        assert!(err.is_err());
    }
}
