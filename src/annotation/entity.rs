//! Extent annotations over text, conversation, and document media.

use crate::error::LabelwireError;

/// A half-open `[start, end)` character span over a text data row.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextEntity {
    start: u64,
    end: u64,
}

impl TextEntity {
    /// Creates a span, rejecting empty or inverted ranges.
    pub fn new(start: u64, end: u64) -> Result<Self, LabelwireError> {
        if end <= start {
            return Err(LabelwireError::invalid(
                "text_entity.end",
                format!("span [{start}, {end}) is empty or inverted"),
            ));
        }
        Ok(Self { start, end })
    }

    /// Inclusive start offset.
    #[inline]
    pub fn start(&self) -> u64 {
        self.start
    }

    /// Exclusive end offset.
    #[inline]
    pub fn end(&self) -> u64 {
        self.end
    }
}

/// A text span inside a single message of a conversation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConversationEntity {
    pub span: TextEntity,
    pub message_id: String,
}

impl ConversationEntity {
    /// Creates a span within the message identified by `message_id`.
    pub fn new(
        start: u64,
        end: u64,
        message_id: impl Into<String>,
    ) -> Result<Self, LabelwireError> {
        let message_id = message_id.into();
        if message_id.is_empty() {
            return Err(LabelwireError::invalid(
                "conversation_entity.message_id",
                "message id must be non-empty",
            ));
        }
        Ok(Self {
            span: TextEntity::new(start, end)?,
            message_id,
        })
    }
}

/// One group of OCR token ids on a document page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TokenGroup {
    pub token_ids: Vec<String>,
    pub group_id: String,
    /// 1-indexed page.
    pub page: u32,
}

/// An extent over a document, expressed as token-id groups per page.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentEntity {
    selections: Vec<TokenGroup>,
}

impl DocumentEntity {
    /// Creates a document extent. Every group must carry tokens and a
    /// 1-indexed page.
    pub fn new(selections: Vec<TokenGroup>) -> Result<Self, LabelwireError> {
        if selections.is_empty() {
            return Err(LabelwireError::invalid(
                "document_entity.selections",
                "at least one token group is required",
            ));
        }
        for group in &selections {
            if group.token_ids.is_empty() {
                return Err(LabelwireError::invalid(
                    "document_entity.token_ids",
                    format!("token group '{}' has no tokens", group.group_id),
                ));
            }
            if group.page == 0 {
                return Err(LabelwireError::invalid(
                    "document_entity.page",
                    format!("token group '{}': pages are 1-indexed; got 0", group.group_id),
                ));
            }
        }
        Ok(Self { selections })
    }

    /// The token groups in input order.
    pub fn selections(&self) -> &[TokenGroup] {
        &self.selections
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_entity_rejects_empty_and_inverted_spans() {
        assert!(TextEntity::new(5, 5).is_err());
        assert!(TextEntity::new(7, 3).is_err());

        let span = TextEntity::new(3, 7).expect("span");
        assert_eq!(span.start(), 3);
        assert_eq!(span.end(), 7);
    }

    #[test]
    fn conversation_entity_needs_message_id() {
        assert!(ConversationEntity::new(0, 4, "").is_err());
        assert!(ConversationEntity::new(0, 4, "msg-7").is_ok());
    }

    #[test]
    fn document_entity_validates_groups() {
        assert!(DocumentEntity::new(vec![]).is_err());

        let no_tokens = TokenGroup {
            token_ids: vec![],
            group_id: "g1".into(),
            page: 1,
        };
        assert!(DocumentEntity::new(vec![no_tokens]).is_err());

        let page_zero = TokenGroup {
            token_ids: vec!["t1".into()],
            group_id: "g1".into(),
            page: 0,
        };
        assert!(DocumentEntity::new(vec![page_zero]).is_err());

        let ok = TokenGroup {
            token_ids: vec!["t1".into(), "t2".into()],
            group_id: "g1".into(),
            page: 2,
        };
        assert!(DocumentEntity::new(vec![ok]).is_ok());
    }
}
