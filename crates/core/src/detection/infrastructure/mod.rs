pub mod arcface_embedder;
pub mod detect_embed_engine;
mod math;
pub mod model_resolver;
pub mod onnx_face_detector;
mod onnx_session;
