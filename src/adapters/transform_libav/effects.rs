//! Per-pixel colour effects applied to packed RGB24 frames

use crate::domain::model::EffectDescriptor;

/// Rec.709 luma weights
const LUMA: [f32; 3] = [0.2126, 0.7152, 0.0722];

/// Classic sepia tone matrix, rows produce R, G, B
const SEPIA: [[f32; 3]; 3] = [
    [0.393, 0.769, 0.189],
    [0.349, 0.686, 0.168],
    [0.272, 0.534, 0.131],
];

#[derive(Debug, Clone)]
enum Stage {
    Matrix([[f32; 3]; 3]),
    Lut(Box<[u8; 256]>),
}

/// Ordered list of effects compiled into pixel operations
#[derive(Debug, Clone, Default)]
pub struct EffectChain {
    stages: Vec<Stage>,
}

impl EffectChain {
    pub fn new(effects: &[EffectDescriptor]) -> Self {
        let stages = effects
            .iter()
            .map(|effect| match effect {
                EffectDescriptor::Sepia => Stage::Matrix(SEPIA),
                EffectDescriptor::Grayscale => Stage::Matrix([LUMA, LUMA, LUMA]),
                EffectDescriptor::Contrast { amount } => Stage::Lut(Box::new(contrast_lut(*amount))),
            })
            .collect();
        Self { stages }
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Apply every stage to a frame plane with `stride` bytes per row
    pub fn apply_rgb24(&self, data: &mut [u8], width: usize, height: usize, stride: usize) {
        let row_bytes = width * 3;
        for y in 0..height {
            let start = y * stride;
            let Some(row) = data.get_mut(start..start + row_bytes) else {
                break;
            };
            for pixel in row.chunks_exact_mut(3) {
                for stage in &self.stages {
                    stage.apply(pixel);
                }
            }
        }
    }
}

impl Stage {
    fn apply(&self, pixel: &mut [u8]) {
        match self {
            Stage::Matrix(m) => {
                let (r, g, b) = (pixel[0] as f32, pixel[1] as f32, pixel[2] as f32);
                for (out, row) in pixel.iter_mut().zip(m.iter()) {
                    *out = clamp(row[0] * r + row[1] * g + row[2] * b);
                }
            }
            Stage::Lut(lut) => {
                for channel in pixel.iter_mut() {
                    *channel = lut[*channel as usize];
                }
            }
        }
    }
}

/// Stretch each channel away from mid-grey by `amount`
fn contrast_lut(amount: f32) -> [u8; 256] {
    let mut lut = [0u8; 256];
    for (value, slot) in lut.iter_mut().enumerate() {
        *slot = clamp((value as f32 - 128.0) * amount + 128.0);
    }
    lut
}

fn clamp(value: f32) -> u8 {
    value.round().clamp(0.0, 255.0) as u8
}
