use crate::config::MediaConfig;
use crate::entities::Category;
use crate::errors::ServiceError;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use image::{codecs::jpeg::JpegEncoder, imageops::FilterType, DynamicImage, ImageFormat, RgbImage};
use std::{io::ErrorKind, path::Path};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

const UPLOAD_DIR: &str = "apparel";
const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Image supplied inline with a product write.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Base64 payload, optionally as a `data:` URL
    pub data: String,
    pub filename: Option<String>,
}

/// Re-encoded JPEG ready to be written to storage.
#[derive(Debug)]
pub struct NormalizedImage {
    pub bytes: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Bounds product images to a maximum width and re-encodes them as JPEG.
#[derive(Debug, Clone)]
pub struct ImageNormalizer {
    config: MediaConfig,
}

impl ImageNormalizer {
    pub fn new(config: MediaConfig) -> Self {
        Self { config }
    }

    /// Public URL for a stored image reference.
    pub fn image_url(&self, reference: &str) -> String {
        format!("{}{}", self.config.url_prefix, reference)
    }

    /// Decodes, validates, normalizes and writes `upload`; returns the stored reference.
    #[instrument(skip(self, upload), fields(filename = upload.filename.as_deref().unwrap_or("")))]
    pub async fn store(
        &self,
        title: &str,
        category: Category,
        upload: &ImageUpload,
    ) -> Result<String, ServiceError> {
        let raw = self.decode_upload(upload)?;

        let max_width = self.config.max_width;
        let quality = self.config.jpeg_quality;
        let normalized = tokio::task::spawn_blocking(move || normalize(&raw, max_width, quality))
            .await
            .map_err(|e| ServiceError::InternalError(format!("image task failed: {}", e)))??;

        let file_name = storage_file_name(title, category);
        let dir = self.config.root.join(UPLOAD_DIR);
        tokio::fs::create_dir_all(&dir).await.map_err(|e| {
            ServiceError::InternalError(format!("cannot create {}: {}", dir.display(), e))
        })?;

        // existing files belong to other products; never overwrite them
        let mut candidate = file_name.clone();
        let reference = loop {
            let path = dir.join(&candidate);
            let opened = tokio::fs::OpenOptions::new()
                .write(true)
                .create_new(true)
                .open(&path)
                .await;
            match opened {
                Ok(mut file) => {
                    let written = match file.write_all(&normalized.bytes).await {
                        Ok(()) => file.flush().await,
                        Err(e) => Err(e),
                    };
                    written.map_err(|e| {
                        ServiceError::InternalError(format!(
                            "cannot write {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    break format!("{}/{}", UPLOAD_DIR, candidate);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    candidate = suffixed_file_name(&file_name);
                }
                Err(e) => {
                    return Err(ServiceError::InternalError(format!(
                        "cannot write {}: {}",
                        path.display(),
                        e
                    )))
                }
            }
        };

        info!(
            reference = %reference,
            width = normalized.width,
            height = normalized.height,
            bytes = normalized.bytes.len(),
            "Stored normalized product image"
        );
        Ok(reference)
    }

    /// Removes a stored image that no product ended up referencing.
    pub async fn discard(&self, reference: &str) {
        let path = self.config.root.join(reference);
        match tokio::fs::remove_file(&path).await {
            Ok(()) => debug!(reference = %reference, "Discarded unreferenced image"),
            Err(e) => warn!(reference = %reference, error = %e, "Could not discard image"),
        }
    }

    fn decode_upload(&self, upload: &ImageUpload) -> Result<Vec<u8>, ServiceError> {
        let payload = match upload.data.split_once(";base64,") {
            Some((prefix, rest)) if prefix.starts_with("data:") => rest,
            _ => upload.data.as_str(),
        };
        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|_| ServiceError::ValidationError("Image data is not valid base64.".into()))?;

        if bytes.is_empty() {
            return Err(ServiceError::ValidationError(
                "The submitted image file is empty.".into(),
            ));
        }
        if bytes.len() > self.config.max_bytes {
            return Err(ServiceError::ValidationError(format!(
                "Image size cannot exceed {}MB.",
                self.config.max_bytes / (1024 * 1024)
            )));
        }

        let extension = match upload.filename.as_deref() {
            Some(name) => Path::new(name)
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| e.to_ascii_lowercase())
                .unwrap_or_default(),
            None => match image::guess_format(&bytes) {
                Ok(ImageFormat::Jpeg) => "jpg".to_string(),
                Ok(ImageFormat::Png) => "png".to_string(),
                Ok(ImageFormat::WebP) => "webp".to_string(),
                _ => String::new(),
            },
        };
        if !SUPPORTED_EXTENSIONS.contains(&extension.as_str()) {
            return Err(ServiceError::ValidationError(format!(
                "Unsupported file extension. Allowed: {}",
                SUPPORTED_EXTENSIONS
                    .iter()
                    .map(|e| format!(".{}", e))
                    .collect::<Vec<_>>()
                    .join(", ")
            )));
        }

        Ok(bytes)
    }
}

/// `Polo_MALE.jpg` becomes `Polo_MALE_1a2b3c4.jpg`.
fn suffixed_file_name(file_name: &str) -> String {
    let stem = file_name.strip_suffix(".jpg").unwrap_or(file_name);
    let suffix = Uuid::new_v4().simple().to_string();
    format!("{}_{}.jpg", stem, &suffix[..7])
}

/// `{Title_With_Underscores}_{CATEGORY}.jpg`, restricted to filesystem-safe characters.
pub fn storage_file_name(title: &str, category: Category) -> String {
    let stem: String = title
        .trim()
        .chars()
        .filter_map(|c| {
            if c.is_whitespace() {
                Some('_')
            } else if c.is_alphanumeric() || c == '-' || c == '_' {
                Some(c)
            } else {
                None
            }
        })
        .collect();
    let stem = if stem.is_empty() { "product".to_string() } else { stem };
    format!("{}_{}.jpg", stem, category.code())
}

/// Flattens transparency onto white, downsizes to `max_width` and re-encodes as JPEG.
pub fn normalize(data: &[u8], max_width: u32, quality: u8) -> Result<NormalizedImage, ServiceError> {
    let img = image::load_from_memory(data)
        .map_err(|e| ServiceError::ValidationError(format!("Invalid image: {}", e)))?;

    let img = if img.width() > max_width {
        let height = ((img.height() as u64 * max_width as u64) / img.width() as u64).max(1) as u32;
        debug!(
            from_width = img.width(),
            to_width = max_width,
            "Resizing product image"
        );
        img.resize_exact(max_width, height, FilterType::Lanczos3)
    } else {
        img
    };

    let rgb = flatten_on_white(&img);
    let (width, height) = rgb.dimensions();

    let mut bytes = Vec::new();
    let encoder = JpegEncoder::new_with_quality(&mut bytes, quality);
    rgb.write_with_encoder(encoder)
        .map_err(|e| ServiceError::InternalError(format!("Image compression failed: {}", e)))?;

    Ok(NormalizedImage {
        bytes,
        width,
        height,
    })
}

fn flatten_on_white(img: &DynamicImage) -> RgbImage {
    if !img.color().has_alpha() {
        return img.to_rgb8();
    }
    let rgba = img.to_rgba8();
    let mut out = RgbImage::new(rgba.width(), rgba.height());
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let [r, g, b, a] = pixel.0;
        let alpha = a as u16;
        let blend = |c: u8| ((c as u16 * alpha + 255 * (255 - alpha)) / 255) as u8;
        out.put_pixel(x, y, image::Rgb([blend(r), blend(g), blend(b)]));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};
    use std::io::Cursor;

    fn png_bytes(width: u32, height: u32, pixel: Rgba<u8>) -> Vec<u8> {
        let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, pixel));
        let mut buf = Vec::new();
        img.write_to(&mut Cursor::new(&mut buf), ImageFormat::Png)
            .unwrap();
        buf
    }

    fn media_config(root: &Path) -> MediaConfig {
        MediaConfig {
            root: root.to_path_buf(),
            url_prefix: "/media/".into(),
            max_bytes: 5 * 1024 * 1024,
            max_width: 1200,
            jpeg_quality: 85,
        }
    }

    #[test]
    fn wide_images_are_scaled_to_max_width() {
        let out = normalize(&png_bytes(2400, 600, Rgba([10, 20, 30, 255])), 1200, 85).unwrap();
        assert_eq!((out.width, out.height), (1200, 300));
        assert_eq!(image::guess_format(&out.bytes).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn narrow_images_are_not_upscaled() {
        let out = normalize(&png_bytes(300, 400, Rgba([10, 20, 30, 255])), 1200, 85).unwrap();
        assert_eq!((out.width, out.height), (300, 400));
    }

    #[test]
    fn transparency_becomes_white() {
        let out = normalize(&png_bytes(16, 16, Rgba([255, 0, 0, 0])), 1200, 85).unwrap();
        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgb8();
        let [r, g, b] = decoded.get_pixel(8, 8).0;
        assert!(r > 240 && g > 240 && b > 240, "got {r},{g},{b}");
    }

    #[test]
    fn garbage_bytes_are_rejected() {
        let err = normalize(b"definitely not an image", 1200, 85).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn file_names_are_sanitized() {
        assert_eq!(
            storage_file_name("Classic Polo Tee", Category::Male),
            "Classic_Polo_Tee_MALE.jpg"
        );
        assert_eq!(
            storage_file_name("../../etc/passwd", Category::Female),
            "etcpasswd_FEMALE.jpg"
        );
    }

    #[tokio::test]
    async fn store_writes_jpeg_under_media_root() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = ImageNormalizer::new(media_config(dir.path()));
        let upload = ImageUpload {
            data: format!(
                "data:image/png;base64,{}",
                STANDARD.encode(png_bytes(1600, 800, Rgba([0, 128, 0, 255])))
            ),
            filename: Some("polo.png".into()),
        };

        let reference = normalizer
            .store("Polo", Category::Male, &upload)
            .await
            .unwrap();
        assert_eq!(reference, "apparel/Polo_MALE.jpg");
        assert_eq!(normalizer.image_url(&reference), "/media/apparel/Polo_MALE.jpg");

        let written = std::fs::read(dir.path().join(&reference)).unwrap();
        let img = image::load_from_memory(&written).unwrap();
        assert_eq!(img.width(), 1200);

        let second = normalizer
            .store("Polo", Category::Male, &upload)
            .await
            .unwrap();
        assert_ne!(second, reference);
        assert!(second.starts_with("apparel/Polo_MALE_"));
        assert_eq!(second.len(), reference.len() + 8);
        assert!(dir.path().join(&reference).exists());

        normalizer.discard(&second).await;
        assert!(!dir.path().join(&second).exists());
        assert!(dir.path().join(&reference).exists());
    }

    #[tokio::test]
    async fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let normalizer = ImageNormalizer::new(media_config(dir.path()));
        let upload = ImageUpload {
            data: STANDARD.encode(png_bytes(4, 4, Rgba([0, 0, 0, 255]))),
            filename: Some("polo.gif".into()),
        };

        let err = normalizer
            .store("Polo", Category::Male, &upload)
            .await
            .unwrap_err();
        assert!(err.to_string().contains(".jpg, .jpeg, .png, .webp"));
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = media_config(dir.path());
        config.max_bytes = 16;
        let normalizer = ImageNormalizer::new(config);
        let upload = ImageUpload {
            data: STANDARD.encode(png_bytes(4, 4, Rgba([0, 0, 0, 255]))),
            filename: None,
        };

        let err = normalizer
            .store("Polo", Category::Male, &upload)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }
}
