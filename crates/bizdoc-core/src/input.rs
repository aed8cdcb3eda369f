//! Document ingestion: image files and the first page of scanned PDFs.

use std::path::Path;

use image::{DynamicImage, GenericImageView};
use tracing::{debug, info};

use crate::error::InputError;
use crate::pdf;

/// Image extensions accepted by [`load_document`].
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "webp", "tiff", "tif", "bmp"];

/// Whether a path has an extension the pipeline can ingest.
pub fn is_supported(path: &Path) -> bool {
    let ext = extension_of(path);
    ext == "pdf" || IMAGE_EXTENSIONS.contains(&ext.as_str())
}

/// Load the image to analyze from a file.
///
/// `max_image_size` bounds the longer side; larger images are downscaled.
/// Zero disables downscaling.
pub fn load_document(path: &Path, max_image_size: u32) -> Result<DynamicImage, InputError> {
    if !path.exists() {
        return Err(InputError::NotFound(path.display().to_string()));
    }

    let extension = extension_of(path);
    if extension != "pdf" && !IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Err(InputError::Unsupported(if extension.is_empty() {
            path.display().to_string()
        } else {
            extension
        }));
    }

    let data = std::fs::read(path)
        .map_err(|e| InputError::Unreadable(format!("{}: {}", path.display(), e)))?;

    info!("Loading document: {}", path.display());
    load_document_bytes(&data, &extension, max_image_size)
}

/// Load the image to analyze from in-memory bytes.
///
/// `extension` selects the decoder: `"pdf"` reads the first page's embedded
/// scan, anything else is decoded as an image with format sniffing.
pub fn load_document_bytes(
    data: &[u8],
    extension: &str,
    max_image_size: u32,
) -> Result<DynamicImage, InputError> {
    let image = if extension.eq_ignore_ascii_case("pdf") {
        pdf::first_page_image(data)?
    } else {
        image::load_from_memory(data).map_err(|e| InputError::Unreadable(e.to_string()))?
    };

    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return Err(InputError::Empty);
    }

    Ok(fit_within(image, max_image_size))
}

/// Downscale so the longer side is at most `max_side`, keeping aspect ratio.
fn fit_within(image: DynamicImage, max_side: u32) -> DynamicImage {
    let (width, height) = image.dimensions();
    if max_side == 0 || width.max(height) <= max_side {
        return image;
    }

    debug!(
        "Downscaling {}x{} image to fit within {}px",
        width, height, max_side
    );
    image.resize(max_side, max_side, image::imageops::FilterType::Triangle)
}

fn extension_of(path: &Path) -> String {
    path.extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase()
}
