//! The annotation domain model.
//!
//! This module defines the in-memory representation of labels and
//! annotations: the closed set of geometry and classification variants,
//! the [`Label`] container, and the feature references that tie
//! annotations to an ontology.
//!
//! # Design Principles
//!
//! 1. **Closed variants**: every annotation kind is known at build time
//!    and dispatched exhaustively. Adding a kind means touching the enum
//!    and the converter's wire table, nothing else.
//!
//! 2. **Validated construction**: constructors reject out-of-range or
//!    malformed input with [`LabelwireError::InvalidAnnotation`] naming
//!    the offending field, so invalid values never reach the wire.
//!
//! 3. **Immutable values**: annotation values do not change after
//!    construction. Labels are only mutated by appending.
//!
//! # Example
//!
//! ```
//! use labelwire::annotation::{
//!     Annotation, FeatureRef, Label, ObjectAnnotation, ObjectValue, Point, Rectangle,
//! };
//!
//! let mut label = Label::for_data_row("dr-1");
//! let bbox = Rectangle::new(Point::new(10.0, 20.0), Point::new(110.0, 80.0));
//! label.append(Annotation::Object(ObjectAnnotation::new(
//!     FeatureRef::named("car"),
//!     ObjectValue::Rectangle(bbox),
//! )));
//! ```

mod classification;
mod entity;
mod frames;
mod geometry;
mod label;
mod mask;
mod message;

pub use classification::{Answer, Checklist, ClassificationValue, Radio, TextValue};
pub use entity::{ConversationEntity, DocumentEntity, TextEntity, TokenGroup};
pub use frames::{segment_runs, DicomPlane, DicomPolyline, FrameGeometry, VideoObject};
pub use geometry::{Line, Point, Polygon, Rectangle, RectangleUnit};
pub use label::{ensure_single_reference, DataRef, Label, MediaKind};
pub use mask::Mask;
pub use message::{MessageRanking, MessageSelection, RankedMessage};

use std::collections::BTreeMap;

use crate::error::LabelwireError;

/// Reference to an ontology feature, by stable schema id, by name, or
/// both. At least one side is always present.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FeatureRef {
    name: Option<String>,
    schema_id: Option<String>,
}

impl FeatureRef {
    /// A feature referenced by display name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            schema_id: None,
        }
    }

    /// A feature referenced by stable schema id.
    pub fn schema(schema_id: impl Into<String>) -> Self {
        Self {
            name: None,
            schema_id: Some(schema_id.into()),
        }
    }

    /// A feature carrying both forms, or either. Rejects neither.
    pub fn new(
        name: Option<String>,
        schema_id: Option<String>,
    ) -> Result<Self, LabelwireError> {
        if name.is_none() && schema_id.is_none() {
            return Err(LabelwireError::invalid(
                "feature",
                "either a name or a schema id is required",
            ));
        }
        Ok(Self { name, schema_id })
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn schema_id(&self) -> Option<&str> {
        self.schema_id.as_deref()
    }

    /// The identity used for equality, grouping, and wire emission:
    /// the schema id when present, else the name.
    pub fn identity(&self) -> FeatureIdentity {
        match (&self.schema_id, &self.name) {
            (Some(id), _) => FeatureIdentity::SchemaId(id.clone()),
            (None, Some(name)) => FeatureIdentity::Name(name.clone()),
            // Constructors guarantee one side is present.
            (None, None) => FeatureIdentity::Name(String::new()),
        }
    }
}

/// The resolved identity of a feature reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum FeatureIdentity {
    SchemaId(String),
    Name(String),
}

/// The geometric or extent payload of an object annotation.
#[derive(Clone, Debug, PartialEq)]
pub enum ObjectValue {
    Rectangle(Rectangle),
    Polygon(Polygon),
    Line(Line),
    Point(Point),
    Mask(Mask),
    TextEntity(TextEntity),
    ConversationEntity(ConversationEntity),
    DocumentEntity(DocumentEntity),
    Video(VideoObject),
    Dicom(DicomPolyline),
    MessageSelection(MessageSelection),
    MessageRanking(MessageRanking),
}

/// A geometric or extent-based assertion over a data row.
#[derive(Clone, Debug, PartialEq)]
pub struct ObjectAnnotation {
    pub feature: FeatureRef,
    /// Stable identifier, generated at serialization time when absent.
    pub uuid: Option<String>,
    pub confidence: Option<f64>,
    pub classifications: Vec<ClassificationAnnotation>,
    pub value: ObjectValue,
    /// Unrecognized wire fields, preserved for lossless round trips.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ObjectAnnotation {
    pub fn new(feature: FeatureRef, value: ObjectValue) -> Self {
        Self {
            feature,
            uuid: None,
            confidence: None,
            classifications: Vec::new(),
            value,
            extra: BTreeMap::new(),
        }
    }

    /// Sets a stable uuid for the annotation.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Adds a confidence score in `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self, LabelwireError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(LabelwireError::invalid(
                "annotation.confidence",
                format!("confidence {confidence} outside [0, 1]"),
            ));
        }
        self.confidence = Some(confidence);
        Ok(self)
    }

    /// Attaches nested classifications.
    pub fn with_classifications(mut self, classifications: Vec<ClassificationAnnotation>) -> Self {
        self.classifications = classifications;
        self
    }
}

/// A non-geometric assertion over a data row.
#[derive(Clone, Debug, PartialEq)]
pub struct ClassificationAnnotation {
    pub feature: FeatureRef,
    pub uuid: Option<String>,
    pub confidence: Option<f64>,
    pub value: ClassificationValue,
    /// Unrecognized wire fields, preserved for lossless round trips.
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ClassificationAnnotation {
    pub fn new(feature: FeatureRef, value: ClassificationValue) -> Self {
        Self {
            feature,
            uuid: None,
            confidence: None,
            value,
            extra: BTreeMap::new(),
        }
    }

    /// Sets a stable uuid for the annotation.
    pub fn with_uuid(mut self, uuid: impl Into<String>) -> Self {
        self.uuid = Some(uuid.into());
        self
    }

    /// Adds a confidence score in `[0, 1]`.
    pub fn with_confidence(mut self, confidence: f64) -> Result<Self, LabelwireError> {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(LabelwireError::invalid(
                "annotation.confidence",
                format!("confidence {confidence} outside [0, 1]"),
            ));
        }
        self.confidence = Some(confidence);
        Ok(self)
    }
}

/// A single assertion about a data row.
#[derive(Clone, Debug, PartialEq)]
pub enum Annotation {
    Object(ObjectAnnotation),
    Classification(ClassificationAnnotation),
}

impl Annotation {
    /// The ontology feature this annotation asserts.
    pub fn feature(&self) -> &FeatureRef {
        match self {
            Annotation::Object(object) => &object.feature,
            Annotation::Classification(classification) => &classification.feature,
        }
    }

    /// The resolved feature identity.
    pub fn feature_identity(&self) -> FeatureIdentity {
        self.feature().identity()
    }

    pub fn uuid(&self) -> Option<&str> {
        match self {
            Annotation::Object(object) => object.uuid.as_deref(),
            Annotation::Classification(classification) => classification.uuid.as_deref(),
        }
    }

    pub fn confidence(&self) -> Option<f64> {
        match self {
            Annotation::Object(object) => object.confidence,
            Annotation::Classification(classification) => classification.confidence,
        }
    }

    /// Classification annotations nested under this one. Classifications
    /// nest through their answers, so only objects report children here.
    pub fn nested_classifications(&self) -> &[ClassificationAnnotation] {
        match self {
            Annotation::Object(object) => &object.classifications,
            Annotation::Classification(_) => &[],
        }
    }
}
