//! Frame-level annotations for video and DICOM media.
//!
//! A logical object that persists across frames is represented as one
//! frame-level annotation per frame, all sharing a feature identity (and
//! group key). On the wire these collapse into segments: maximal runs of
//! consecutive frames. `segment_runs` computes those runs and is the only
//! place the run rules live.

use crate::error::LabelwireError;

use super::geometry::{Line, Point, Polygon, Rectangle};

/// Geometry kinds that can appear on a single frame.
#[derive(Clone, Debug, PartialEq)]
pub enum FrameGeometry {
    Rectangle(Rectangle),
    Point(Point),
    Line(Line),
    Polygon(Polygon),
}

/// One frame of a video object.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoObject {
    /// 1-indexed frame number.
    pub frame: u32,
    /// Whether this frame is a keyframe. Non-keyframes are interpolated
    /// and never emitted on the wire.
    pub keyframe: bool,
    /// Index of the segment this frame belongs to, when known.
    pub segment_index: Option<usize>,
    pub geometry: FrameGeometry,
    /// Free-form grouping key. Values naming a DICOM plane are reserved
    /// for [`DicomPolyline`].
    pub group_key: Option<String>,
}

impl VideoObject {
    /// Creates a keyframe annotation at `frame` (1-indexed).
    pub fn new(frame: u32, geometry: FrameGeometry) -> Result<Self, LabelwireError> {
        if frame == 0 {
            return Err(LabelwireError::invalid(
                "video.frame",
                "frames are 1-indexed; got 0",
            ));
        }
        Ok(Self {
            frame,
            keyframe: true,
            segment_index: None,
            geometry,
            group_key: None,
        })
    }

    /// Marks this frame as interpolated rather than a keyframe.
    pub fn interpolated(mut self) -> Self {
        self.keyframe = false;
        self
    }

    /// Sets the segment index.
    pub fn with_segment_index(mut self, index: usize) -> Self {
        self.segment_index = Some(index);
        self
    }

    /// Sets the grouping key.
    pub fn with_group_key(mut self, key: impl Into<String>) -> Self {
        self.group_key = Some(key.into());
        self
    }
}

/// The anatomical plane of a DICOM polyline group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DicomPlane {
    Axial,
    Sagittal,
    Coronal,
}

impl DicomPlane {
    /// The wire spelling of this plane.
    pub fn as_str(&self) -> &'static str {
        match self {
            DicomPlane::Axial => "axial",
            DicomPlane::Sagittal => "sagittal",
            DicomPlane::Coronal => "coronal",
        }
    }

    /// Parses the wire spelling of a plane.
    pub fn from_str_opt(value: &str) -> Option<Self> {
        match value {
            "axial" => Some(DicomPlane::Axial),
            "sagittal" => Some(DicomPlane::Sagittal),
            "coronal" => Some(DicomPlane::Coronal),
            _ => None,
        }
    }
}

/// One frame of a DICOM polyline object.
#[derive(Clone, Debug, PartialEq)]
pub struct DicomPolyline {
    /// 1-indexed frame number.
    pub frame: u32,
    pub keyframe: bool,
    pub segment_index: Option<usize>,
    pub line: Line,
    pub plane: DicomPlane,
}

impl DicomPolyline {
    /// Creates a keyframe polyline at `frame` (1-indexed) on `plane`.
    pub fn new(frame: u32, line: Line, plane: DicomPlane) -> Result<Self, LabelwireError> {
        if frame == 0 {
            return Err(LabelwireError::invalid(
                "dicom.frame",
                "frames are 1-indexed; got 0",
            ));
        }
        Ok(Self {
            frame,
            keyframe: true,
            segment_index: None,
            line,
            plane,
        })
    }

    /// Sets the segment index.
    pub fn with_segment_index(mut self, index: usize) -> Self {
        self.segment_index = Some(index);
        self
    }
}

/// Splits a set of frames belonging to one logical object into segments:
/// maximal runs of consecutive frame numbers.
///
/// Input is `(frame, keyframe)` pairs in any order; output is, per
/// segment, the indices into the input slice sorted by frame. A run must
/// begin with a keyframe: a non-keyframe with no annotation at the
/// preceding frame has nothing to interpolate from and is rejected.
/// Duplicate frame numbers are rejected.
pub fn segment_runs(frames: &[(u32, bool)]) -> Result<Vec<Vec<usize>>, LabelwireError> {
    let mut order: Vec<usize> = (0..frames.len()).collect();
    order.sort_by_key(|&i| frames[i].0);

    let mut runs: Vec<Vec<usize>> = Vec::new();
    let mut prev_frame: Option<u32> = None;

    for &i in &order {
        let (frame, keyframe) = frames[i];
        match prev_frame {
            Some(prev) if frame == prev => {
                return Err(LabelwireError::invalid(
                    "video.frame",
                    format!("duplicate frame {frame} within one object"),
                ));
            }
            Some(prev) if frame == prev + 1 => {
                // Continues the current run.
                match runs.last_mut() {
                    Some(run) => run.push(i),
                    None => runs.push(vec![i]),
                }
            }
            _ => {
                if !keyframe {
                    return Err(LabelwireError::invalid(
                        "video.keyframe",
                        format!("frame {frame} is not a keyframe and has no predecessor"),
                    ));
                }
                runs.push(vec![i]);
            }
        }
        prev_frame = Some(frame);
    }

    Ok(runs)
}
