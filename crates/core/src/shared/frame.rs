use ndarray::ArrayView3;

use crate::shared::rectangle::Rectangle;

const CHANNELS: usize = 3;

/// A decoded image: contiguous RGB bytes in row-major order.
///
/// Format conversion happens at I/O boundaries only; detection and
/// matching treat pixel data as opaque.
#[derive(Clone, Debug)]
pub struct Frame {
    data: Vec<u8>,
    width: u32,
    height: u32,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32) -> Self {
        debug_assert_eq!(
            data.len(),
            (width as usize) * (height as usize) * CHANNELS,
            "data length must equal width * height * 3"
        );
        Self {
            data,
            width,
            height,
        }
    }

    pub fn from_rgb_image(image: image::RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self::new(image.into_raw(), width, height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn as_ndarray(&self) -> ArrayView3<'_, u8> {
        ArrayView3::from_shape(
            (self.height as usize, self.width as usize, CHANNELS),
            &self.data,
        )
        .expect("Frame data length must match dimensions")
    }

    /// Luma (BT.601) replicated across all three channels.
    pub fn to_grayscale(&self) -> Frame {
        let mut data = Vec::with_capacity(self.data.len());
        for px in self.data.chunks_exact(CHANNELS) {
            let luma = 0.299 * px[0] as f32 + 0.587 * px[1] as f32 + 0.114 * px[2] as f32;
            let v = luma.round().clamp(0.0, 255.0) as u8;
            data.extend_from_slice(&[v, v, v]);
        }
        Frame::new(data, self.width, self.height)
    }

    /// Copies the pixels under `rect`, clipped to the frame.
    ///
    /// Returns `None` if the clipped area is empty.
    pub fn crop(&self, rect: &Rectangle) -> Option<Frame> {
        let x0 = rect.x.max(0) as u32;
        let y0 = rect.y.max(0) as u32;
        let x1 = (rect.right().max(0) as u32).min(self.width);
        let y1 = (rect.bottom().max(0) as u32).min(self.height);
        if x1 <= x0 || y1 <= y0 {
            return None;
        }

        let w = (x1 - x0) as usize;
        let stride = self.width as usize * CHANNELS;
        let mut data = Vec::with_capacity(w * (y1 - y0) as usize * CHANNELS);
        for row in y0..y1 {
            let start = row as usize * stride + x0 as usize * CHANNELS;
            data.extend_from_slice(&self.data[start..start + w * CHANNELS]);
        }
        Some(Frame::new(data, x1 - x0, y1 - y0))
    }

    pub fn flip_horizontal(&self) -> Frame {
        let w = self.width as usize;
        let mut data = Vec::with_capacity(self.data.len());
        for row in self.data.chunks_exact(w * CHANNELS) {
            for px in row.chunks_exact(CHANNELS).rev() {
                data.extend_from_slice(px);
            }
        }
        Frame::new(data, self.width, self.height)
    }
}
