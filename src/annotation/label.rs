//! The label container: one data row's worth of annotations.

use std::collections::BTreeMap;

use crate::error::LabelwireError;

use super::Annotation;

/// Media kinds a data row can hold. Used as a hint for converters and as
/// the key under which inline content is emitted.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Image,
    Video,
    Text,
    Document,
    Conversation,
    Audio,
    Dicom,
}

impl MediaKind {
    /// The `dataRow` key under which inline content of this kind travels.
    pub fn inline_key(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
            MediaKind::Text => "text",
            MediaKind::Document => "document",
            MediaKind::Conversation => "conversation",
            MediaKind::Audio => "audio",
            MediaKind::Dicom => "dicom",
        }
    }

    /// Resolves an inline `dataRow` key back to a media kind.
    pub fn from_inline_key(key: &str) -> Option<Self> {
        match key {
            "image" => Some(MediaKind::Image),
            "video" => Some(MediaKind::Video),
            "text" => Some(MediaKind::Text),
            "document" => Some(MediaKind::Document),
            "conversation" => Some(MediaKind::Conversation),
            "audio" => Some(MediaKind::Audio),
            "dicom" => Some(MediaKind::Dicom),
            _ => None,
        }
    }
}

/// How a label points at its data row. Exactly one form per label.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DataRef {
    /// Platform-internal data row id.
    Id(String),
    /// User-supplied global key.
    GlobalKey(String),
    /// Raw content carried inline, keyed by media kind.
    Inline { media: MediaKind, content: String },
    /// Externally fetchable content.
    Uri(String),
}

impl DataRef {
    /// A stable identity string used to group records into labels.
    pub fn group_key(&self) -> String {
        match self {
            DataRef::Id(id) => format!("id:{id}"),
            DataRef::GlobalKey(key) => format!("gk:{key}"),
            DataRef::Inline { media, content } => {
                format!("inline:{}:{content}", media.inline_key())
            }
            DataRef::Uri(uri) => format!("uri:{uri}"),
        }
    }
}

/// A data row's annotations, plus the reference identifying the row.
#[derive(Clone, Debug, PartialEq)]
pub struct Label {
    /// Optional label identifier carried through the wire as `labelId`.
    pub id: Option<String>,
    pub data: DataRef,
    pub annotations: Vec<Annotation>,
    /// Optional media-type hint. Never emitted on the wire.
    pub media_type: Option<MediaKind>,
    /// Marks this label as the benchmark reference for its data row.
    /// Omitted from wire output when false.
    pub is_benchmark_reference: bool,
    /// Unrecognized `dataRow` wire fields, preserved for lossless
    /// round trips.
    pub row_extra: BTreeMap<String, serde_json::Value>,
}

impl Label {
    /// Creates an empty label over the given data reference.
    pub fn new(data: DataRef) -> Self {
        Self {
            id: None,
            data,
            annotations: Vec::new(),
            media_type: None,
            is_benchmark_reference: false,
            row_extra: BTreeMap::new(),
        }
    }

    /// Shorthand for a label over an internal data row id.
    pub fn for_data_row(id: impl Into<String>) -> Self {
        Self::new(DataRef::Id(id.into()))
    }

    /// Shorthand for a label over a global key.
    pub fn for_global_key(key: impl Into<String>) -> Self {
        Self::new(DataRef::GlobalKey(key.into()))
    }

    /// Sets the label identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Sets the media-type hint.
    pub fn with_media_type(mut self, media: MediaKind) -> Self {
        self.media_type = Some(media);
        self
    }

    /// Marks this label as its data row's benchmark reference.
    pub fn as_benchmark_reference(mut self) -> Self {
        self.is_benchmark_reference = true;
        self
    }

    /// Appends an annotation. This is the only mutation labels support;
    /// annotation values themselves are immutable once constructed.
    pub fn append(&mut self, annotation: Annotation) {
        self.annotations.push(annotation);
    }

    /// Appends every annotation in `annotations`, preserving order.
    pub fn extend(&mut self, annotations: impl IntoIterator<Item = Annotation>) {
        self.annotations.extend(annotations);
    }
}

/// Labels must reference their row by exactly one form; a constructor
/// taking both an id and a global key cannot exist, but wire input can
/// still claim both. Used by the converter to reject such rows.
pub fn ensure_single_reference(
    id: Option<&str>,
    global_key: Option<&str>,
) -> Result<(), LabelwireError> {
    if id.is_some() && global_key.is_some() {
        return Err(LabelwireError::invalid(
            "label.data",
            "data row has both an id and a global key",
        ));
    }
    Ok(())
}
