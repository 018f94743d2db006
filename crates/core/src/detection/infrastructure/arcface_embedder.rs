/// ArcFace face embedder using ONNX Runtime.
///
/// Produces L2-normalized descriptors, so Euclidean distances fall in `[0, 2]`.
use std::path::Path;

use crate::dataset::domain::descriptor::Descriptor;
use crate::detection::domain::face_embedder::FaceEmbedder;
use crate::detection::infrastructure::math::l2_normalize;
use crate::detection::infrastructure::onnx_session::open_session;
use crate::shared::error::BoxError;
use crate::shared::frame::Frame;

const INPUT_SIZE: usize = 112;
const NORM_MEAN: f32 = 127.5;
const NORM_STD: f32 = 127.5;

pub struct ArcFaceEmbedder {
    session: ort::session::Session,
}

impl ArcFaceEmbedder {
    pub fn new(model_path: &Path) -> Result<Self, BoxError> {
        let session = open_session(model_path)?;
        log::debug!("Face embedder loaded from {}", model_path.display());
        Ok(Self { session })
    }
}

impl FaceEmbedder for ArcFaceEmbedder {
    fn embed(&mut self, crop: &Frame) -> Result<Descriptor, BoxError> {
        if crop.is_empty() {
            return Err("cannot embed an empty face crop".into());
        }
        let tensor = preprocess(crop);
        let input_value = ort::value::Tensor::from_array(tensor)?;
        let outputs = self.session.run(ort::inputs![input_value])?;
        let embedding_array = outputs[0].try_extract_array::<f32>()?;
        let embedding_slice = embedding_array
            .as_slice()
            .ok_or("Cannot get embedding slice")?;

        let mut embedding = embedding_slice.to_vec();
        l2_normalize(&mut embedding);
        Ok(Descriptor::new(embedding))
    }
}

/// Resize crop to 112x112, normalize, NCHW layout.
fn preprocess(crop: &Frame) -> ndarray::Array4<f32> {
    let src_w = crop.width() as usize;
    let src_h = crop.height() as usize;
    let rgb_data = crop.data();

    let mut tensor = ndarray::Array4::<f32>::zeros((1, 3, INPUT_SIZE, INPUT_SIZE));

    for y in 0..INPUT_SIZE {
        let src_y = (((y as f64 + 0.5) * src_h as f64 / INPUT_SIZE as f64) as usize).min(src_h - 1);
        for x in 0..INPUT_SIZE {
            let src_x =
                (((x as f64 + 0.5) * src_w as f64 / INPUT_SIZE as f64) as usize).min(src_w - 1);
            let offset = (src_y * src_w + src_x) * 3;
            for c in 0..3 {
                tensor[[0, c, y, x]] = (rgb_data[offset + c] as f32 - NORM_MEAN) / NORM_STD;
            }
        }
    }

    tensor
}
