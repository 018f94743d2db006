/// YOLO face detector running on ONNX Runtime.
///
/// Scales each frame into a padded square, decodes the raw box rows, drops
/// overlaps and maps the survivors back to clamped source-image rectangles.
use std::cmp::Ordering;
use std::path::Path;

use ndarray::Array4;
use ort::session::Session;

use crate::detection::domain::face_detector::FaceDetector;
use crate::detection::infrastructure::math::bbox_iou;
use crate::detection::infrastructure::onnx_session::open_session;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;
use crate::shared::rectangle::Rectangle;

/// Square input used when the model leaves its spatial dims dynamic.
const FALLBACK_INPUT_SIZE: u32 = 640;

/// Boxes overlapping a stronger box by more than this are dropped.
const OVERLAP_LIMIT: f64 = 0.45;

/// Faces narrower or shorter than this many pixels are ignored.
const MIN_FACE_SIZE: i32 = 8;

/// YOLO's padding gray (114 of 255).
const PAD_VALUE: f32 = 114.0 / 255.0;

pub struct OnnxFaceDetector {
    session: Session,
    confidence: f64,
    input_size: u32,
}

impl OnnxFaceDetector {
    /// Loads the model and reads its NCHW input size.
    pub fn new(model_path: &Path, confidence: f64) -> Result<Self, BoxError> {
        let session = open_session(model_path)?;
        let input_size = model_input_size(&session).unwrap_or(FALLBACK_INPUT_SIZE);
        log::debug!("Face detector loaded (input {input_size}px, confidence {confidence})");
        Ok(Self {
            session,
            confidence,
            input_size,
        })
    }
}

fn model_input_size(session: &Session) -> Option<u32> {
    let input = session.inputs().first()?;
    let ort::value::ValueType::Tensor { shape, .. } = input.dtype() else {
        return None;
    };
    (shape.len() >= 4 && shape[2] > 0).then(|| shape[2] as u32)
}

impl FaceDetector for OnnxFaceDetector {
    fn detect(&mut self, frame: &Frame) -> Result<Vec<Rectangle>, BoxError> {
        if frame.is_empty() {
            return Ok(Vec::new());
        }

        let letterbox = Letterbox::fit(frame.width(), frame.height(), self.input_size);
        let input = ort::value::Tensor::from_array(letterbox.tensor(frame))?;
        let outputs = self.session.run(ort::inputs![input])?;
        if outputs.len() == 0 {
            return Err("face detector produced no outputs".into());
        }
        let output = outputs[0].try_extract_array::<f32>()?;
        let shape = output.shape().to_vec();
        if shape.len() != 3 {
            return Err(format!("unexpected detector output shape {shape:?}").into());
        }
        let rows = output.as_slice().ok_or("detector output is not contiguous")?;

        let candidates = decode_candidates(rows, &shape, self.confidence);
        Ok(suppress_overlaps(candidates, OVERLAP_LIMIT)
            .into_iter()
            .filter_map(|c| {
                let [x1, y1, x2, y2] = letterbox.to_source(c.bbox);
                Rectangle::from_corners_clamped((x1, y1, x2, y2), frame.width(), frame.height())
            })
            .filter(|r| r.width >= MIN_FACE_SIZE && r.height >= MIN_FACE_SIZE)
            .collect())
    }
}

/// Aspect-preserving fit of a `width` × `height` image into a padded square.
#[derive(Clone, Copy, Debug, PartialEq)]
struct Letterbox {
    size: u32,
    scale: f64,
    scaled_w: u32,
    scaled_h: u32,
    pad_x: u32,
    pad_y: u32,
}

impl Letterbox {
    fn fit(width: u32, height: u32, size: u32) -> Self {
        let scale = (size as f64 / width as f64).min(size as f64 / height as f64);
        let scaled_w = ((width as f64 * scale).round() as u32).min(size);
        let scaled_h = ((height as f64 * scale).round() as u32).min(size);
        Self {
            size,
            scale,
            scaled_w,
            scaled_h,
            pad_x: (size - scaled_w) / 2,
            pad_y: (size - scaled_h) / 2,
        }
    }

    /// NCHW tensor in `[0, 1]`, nearest-neighbour sampled, gray padded.
    fn tensor(&self, frame: &Frame) -> Array4<f32> {
        let size = self.size as usize;
        let mut tensor = Array4::<f32>::from_elem((1, 3, size, size), PAD_VALUE);
        let pixels = frame.as_ndarray();
        let max_x = frame.width() as usize - 1;
        let max_y = frame.height() as usize - 1;

        for y in 0..self.scaled_h as usize {
            let sy = ((y as f64 / self.scale) as usize).min(max_y);
            let ty = self.pad_y as usize + y;
            for x in 0..self.scaled_w as usize {
                let sx = ((x as f64 / self.scale) as usize).min(max_x);
                let tx = self.pad_x as usize + x;
                for c in 0..3 {
                    tensor[[0, c, ty, tx]] = f32::from(pixels[[sy, sx, c]]) / 255.0;
                }
            }
        }
        tensor
    }

    /// Maps `[x1, y1, x2, y2]` from model input space back to the source image.
    fn to_source(&self, [x1, y1, x2, y2]: [f64; 4]) -> [f64; 4] {
        let (px, py) = (self.pad_x as f64, self.pad_y as f64);
        [
            (x1 - px) / self.scale,
            (y1 - py) / self.scale,
            (x2 - px) / self.scale,
            (y2 - py) / self.scale,
        ]
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Candidate {
    bbox: [f64; 4],
    score: f64,
}

/// Decodes `[cx, cy, w, h, score, ...]` rows above `min_score`.
///
/// Output is either `[1, features, boxes]` or `[1, boxes, features]`; the
/// smaller axis is taken to be the feature axis.
fn decode_candidates(data: &[f32], shape: &[usize], min_score: f64) -> Vec<Candidate> {
    let features_first = shape[1] < shape[2];
    let (boxes, features) = if features_first {
        (shape[2], shape[1])
    } else {
        (shape[1], shape[2])
    };
    if features < 5 {
        return Vec::new();
    }

    let value = |row: usize, feature: usize| -> f64 {
        let idx = if features_first {
            feature * boxes + row
        } else {
            row * features + feature
        };
        data.get(idx).map_or(0.0, |&v| v as f64)
    };

    (0..boxes)
        .filter(|&row| value(row, 4) >= min_score)
        .map(|row| {
            let (cx, cy) = (value(row, 0), value(row, 1));
            let (half_w, half_h) = (value(row, 2) / 2.0, value(row, 3) / 2.0);
            Candidate {
                bbox: [cx - half_w, cy - half_h, cx + half_w, cy + half_h],
                score: value(row, 4),
            }
        })
        .collect()
}

/// Keeps the strongest boxes, dropping any that overlap a kept box by more
/// than `limit` IoU.
fn suppress_overlaps(mut candidates: Vec<Candidate>, limit: f64) -> Vec<Candidate> {
    candidates.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
    let mut kept: Vec<Candidate> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if kept
            .iter()
            .all(|k| bbox_iou(&k.bbox, &candidate.bbox) <= limit)
        {
            kept.push(candidate);
        }
    }
    kept
}
