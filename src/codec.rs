use crate::analyzer::ImageFeatures;
use crate::config::CodecConfig;
use crate::constants::{
    JPEG_MAX_FIDELITY_QUALITY, LARGE_IMAGE_PIXELS, LIBDEFLATER_HIGH_LEVEL, MAX_PNG_PRESET,
    SMALL_IMAGE_PIXELS, ZOPFLI_ITERATIONS,
};
use crate::decision::{Quality, TargetBox};
use crate::error::{CompressionError, Result};
use crate::formats::{ImageKind, OutputFormat};
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, GenericImageView, ImageFormat};
use oxipng::{Deflaters, Options};
use serde::Serialize;
use std::io::Cursor;
use std::num::NonZeroU8;

/// Pixel-level collaborator of the compressor. Implementations must be usable
/// from every worker thread at once.
pub trait Codec: Send + Sync {
    /// Decodes `bytes`, trusting `hint` when the caller already sniffed the format.
    fn decode(&self, bytes: &[u8], hint: Option<ImageKind>) -> Result<DynamicImage>;

    /// Encodes `image`; `features` describe the source content and let the
    /// encoder pick its effort and filters.
    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
        features: &ImageFeatures,
    ) -> Result<Vec<u8>>;

    fn resize(&self, image: &DynamicImage, target: TargetBox) -> DynamicImage;
}

/// Coarse content category the encoders tune for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentClass {
    /// Flat areas and few colors: logos, screenshots, diagrams
    Graphic,
    Mixed,
    Photo,
}

impl ContentClass {
    pub fn classify(difficulty: f64, config: &CodecConfig) -> Self {
        if difficulty <= config.graphic_difficulty {
            ContentClass::Graphic
        } else if difficulty > config.photo_difficulty {
            ContentClass::Photo
        } else {
            ContentClass::Mixed
        }
    }
}

/// oxipng preset for an image: more effort for graphics and small images,
/// never more than `base` for very large ones.
pub fn png_preset_for(base: u8, pixels: u64, content: ContentClass) -> u8 {
    let by_content = match content {
        ContentClass::Graphic => base.saturating_add(2),
        ContentClass::Mixed => base.saturating_add(1),
        ContentClass::Photo => base,
    };
    let preset = if pixels > LARGE_IMAGE_PIXELS {
        by_content.min(base)
    } else if pixels < SMALL_IMAGE_PIXELS {
        MAX_PNG_PRESET
    } else {
        by_content
    };
    preset.min(MAX_PNG_PRESET)
}

/// libwebp settings chosen from the content. Defaults mirror libwebp's own.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WebPTuning {
    pub lossless: bool,
    /// Lossy: visual quality. Lossless: compression effort
    pub quality: f32,
    pub method: i32,
    pub pass: i32,
    pub segments: i32,
    pub sns_strength: i32,
    pub filter_strength: i32,
    pub filter_sharpness: i32,
    pub filter_type: i32,
    pub alpha_quality: i32,
    /// Keep RGB values under fully transparent pixels
    pub exact: bool,
}

impl Default for WebPTuning {
    fn default() -> Self {
        Self {
            lossless: false,
            quality: 75.0,
            method: 4,
            pass: 1,
            segments: 4,
            sns_strength: 50,
            filter_strength: 60,
            filter_sharpness: 0,
            filter_type: 1,
            alpha_quality: 100,
            exact: false,
        }
    }
}

impl WebPTuning {
    pub fn for_content(quality: Quality, pixels: u64, content: ContentClass, has_alpha: bool) -> Self {
        let large = pixels > LARGE_IMAGE_PIXELS;
        let mut tuning = Self {
            method: if large { 4 } else { 6 },
            ..Self::default()
        };

        let q = match quality {
            Quality::Lossless => {
                tuning.lossless = true;
                tuning.exact = true;
                tuning.quality = match content {
                    ContentClass::Graphic => 100.0,
                    _ if large => 80.0,
                    _ => 90.0,
                };
                return tuning;
            }
            Quality::Level(q) => q,
        };

        tuning.quality = q as f32;
        let pass_for_quality = match q {
            90..=u8::MAX => 10,
            70..=89 => 6,
            _ => 4,
        };
        match content {
            ContentClass::Photo => {
                tuning.pass = pass_for_quality;
            }
            ContentClass::Graphic => {
                tuning.segments = 1;
                tuning.filter_type = 0;
                tuning.pass = 6;
            }
            ContentClass::Mixed => {
                tuning.pass = pass_for_quality;
                tuning.alpha_quality = match q {
                    90..=u8::MAX => (q as i32 + 5).min(100),
                    70..=89 => q as i32,
                    _ => (q as i32 - 10).max(50),
                };
            }
        }
        if has_alpha {
            tuning.alpha_quality = tuning.alpha_quality.max(80);
        }
        tuning
    }

    fn apply(&self, config: &mut webp::WebPConfig) {
        config.lossless = self.lossless as i32;
        config.quality = self.quality;
        config.method = self.method;
        config.pass = self.pass;
        config.segments = self.segments;
        config.sns_strength = self.sns_strength;
        config.filter_strength = self.filter_strength;
        config.filter_sharpness = self.filter_sharpness;
        config.filter_type = self.filter_type;
        config.alpha_quality = self.alpha_quality;
        config.exact = self.exact as i32;
    }
}

/// Default codec: `image` for decoding and JPEG, `oxipng` for PNG, `webp` for WebP.
#[derive(Debug, Clone, Default)]
pub struct ImageCodec {
    config: CodecConfig,
}

impl ImageCodec {
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    fn encode_jpeg(&self, image: &DynamicImage, quality: Quality) -> Result<Vec<u8>> {
        let quality = quality.level().unwrap_or(JPEG_MAX_FIDELITY_QUALITY);
        let rgb = image.to_rgb8();
        let mut buf = Vec::new();
        JpegEncoder::new_with_quality(&mut buf, quality)
            .encode(rgb.as_raw(), rgb.width(), rgb.height(), ExtendedColorType::Rgb8)
            .map_err(|e| encode_error(OutputFormat::Jpeg, e))?;
        Ok(buf)
    }

    fn encode_png(&self, image: &DynamicImage, content: ContentClass) -> Result<Vec<u8>> {
        let mut raw = Cursor::new(Vec::new());
        image
            .write_to(&mut raw, ImageFormat::Png)
            .map_err(|e| encode_error(OutputFormat::Png, e))?;

        let preset = png_preset_for(self.config.png_preset, pixel_count(image), content);
        oxipng::optimize_from_memory(raw.get_ref(), &self.png_options(preset))
            .map_err(|e| CompressionError::PngOptimization(e.to_string()))
    }

    fn png_options(&self, preset: u8) -> Options {
        let mut options = Options::from_preset(preset);
        options.deflate = match NonZeroU8::new(ZOPFLI_ITERATIONS) {
            Some(iterations) if self.config.png_zopfli => Deflaters::Zopfli { iterations },
            _ => Deflaters::Libdeflater {
                compression: LIBDEFLATER_HIGH_LEVEL,
            },
        };
        options
    }

    fn encode_webp(
        &self,
        image: &DynamicImage,
        quality: Quality,
        content: ContentClass,
        has_alpha: bool,
    ) -> Result<Vec<u8>> {
        let tuning = WebPTuning::for_content(quality, pixel_count(image), content, has_alpha);
        let mut config = webp::WebPConfig::new().map_err(|_| CompressionError::Encode {
            format: OutputFormat::WebP.to_string(),
            reason: "libwebp rejected the default configuration".to_string(),
        })?;
        tuning.apply(&mut config);

        let encoded = if image.color().has_alpha() {
            let rgba = image.to_rgba8();
            let encoder = webp::Encoder::from_rgba(rgba.as_raw(), rgba.width(), rgba.height());
            encoder.encode_advanced(&config)
        } else {
            let rgb = image.to_rgb8();
            let encoder = webp::Encoder::from_rgb(rgb.as_raw(), rgb.width(), rgb.height());
            encoder.encode_advanced(&config)
        };
        let memory = encoded.map_err(|e| CompressionError::Encode {
            format: OutputFormat::WebP.to_string(),
            reason: format!("{:?}", e),
        })?;

        Ok(memory.to_vec())
    }
}

impl Codec for ImageCodec {
    fn decode(&self, bytes: &[u8], hint: Option<ImageKind>) -> Result<DynamicImage> {
        if bytes.is_empty() {
            return Err(CompressionError::Decode("file is empty".to_string()));
        }
        let decoded = match hint {
            Some(kind) => image::load_from_memory_with_format(bytes, kind.to_image_format()),
            None => image::load_from_memory(bytes),
        };
        decoded.map_err(|e| CompressionError::Decode(e.to_string()))
    }

    fn encode(
        &self,
        image: &DynamicImage,
        format: OutputFormat,
        quality: Quality,
        features: &ImageFeatures,
    ) -> Result<Vec<u8>> {
        let content = ContentClass::classify(features.difficulty_score, &self.config);
        let bytes = match format {
            OutputFormat::Jpeg => self.encode_jpeg(image, quality)?,
            OutputFormat::Png => self.encode_png(image, content)?,
            OutputFormat::WebP => self.encode_webp(image, quality, content, features.has_alpha)?,
        };
        if bytes.is_empty() {
            return Err(CompressionError::EmptyOutput(format.to_string()));
        }
        Ok(bytes)
    }

    fn resize(&self, image: &DynamicImage, target: TargetBox) -> DynamicImage {
        image.resize_exact(target.width, target.height, FilterType::Lanczos3)
    }
}

fn pixel_count(image: &DynamicImage) -> u64 {
    let (width, height) = image.dimensions();
    width as u64 * height as u64
}

fn encode_error(format: OutputFormat, err: image::ImageError) -> CompressionError {
    CompressionError::Encode {
        format: format.to_string(),
        reason: err.to_string(),
    }
}
