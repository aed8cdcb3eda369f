//! Page image extraction from scanned PDFs using lopdf.

use image::{DynamicImage, GrayImage, RgbImage};
use lopdf::{Dictionary, Document, Object, ObjectId};
use tracing::{debug, trace};

use crate::error::InputError;

/// Pulls the embedded scan image out of PDF pages.
///
/// Scanned certificates are stored as one raster image per page, so taking
/// the largest image XObject of a page recovers the scan without rendering.
pub struct PdfImageExtractor {
    document: Document,
}

impl PdfImageExtractor {
    /// Parse a PDF from bytes, decrypting it with the empty password if needed.
    pub fn load(data: &[u8]) -> Result<Self, InputError> {
        let mut document = Document::load_mem(data)
            .map_err(|e| InputError::Unreadable(format!("failed to parse PDF: {}", e)))?;

        if document.is_encrypted() {
            if document.decrypt("").is_err() {
                return Err(InputError::Encrypted);
            }
            debug!("Decrypted PDF with empty password");
        }

        if document.get_pages().is_empty() {
            return Err(InputError::EmptyPdf("PDF has no pages".to_string()));
        }

        Ok(Self { document })
    }

    /// Number of pages in the document.
    pub fn page_count(&self) -> u32 {
        self.document.get_pages().len() as u32
    }

    /// The largest decodable image on a page (1-indexed).
    pub fn page_image(&self, page: u32) -> Result<DynamicImage, InputError> {
        let pages = self.document.get_pages();
        let page_id = pages
            .get(&page)
            .ok_or_else(|| InputError::EmptyPdf(format!("PDF has no page {}", page)))?;

        let mut images = Vec::new();
        if let Some(resources) = self.page_resources(*page_id) {
            if let Ok(xobjects) = resources.get(b"XObject") {
                if let Ok((_, Object::Dictionary(xobj_dict))) = self.document.dereference(xobjects) {
                    for (_name, obj_ref) in xobj_dict.iter() {
                        if let Ok((_, obj)) = self.document.dereference(obj_ref) {
                            if let Some(img) = self.decode_image_object(obj) {
                                images.push(img);
                            }
                        }
                    }
                }
            }
        }

        debug!("Found {} images on page {}", images.len(), page);

        images
            .into_iter()
            .max_by_key(|img| img.width() as u64 * img.height() as u64)
            .ok_or_else(|| InputError::EmptyPdf(format!("no page image on page {}", page)))
    }

    fn decode_image_object(&self, obj: &Object) -> Option<DynamicImage> {
        let Object::Stream(stream) = obj else {
            return None;
        };
        let dict = &stream.dict;

        if dict.get(b"Subtype").ok()?.as_name().ok()? != b"Image" {
            return None;
        }

        let width = u32::try_from(dict.get(b"Width").ok()?.as_i64().ok()?).ok()?;
        let height = u32::try_from(dict.get(b"Height").ok()?.as_i64().ok()?).ok()?;
        trace!("Found image object: {}x{}", width, height);

        let filter = dict.get(b"Filter").ok().and_then(|f| match f {
            Object::Name(name) => Some(name.as_slice()),
            Object::Array(arr) => arr.last().and_then(|o| o.as_name().ok()),
            _ => None,
        });

        match filter {
            Some(b"DCTDecode") => {
                return image::load_from_memory_with_format(&stream.content, image::ImageFormat::Jpeg)
                    .ok();
            }
            Some(b"JPXDecode") | Some(b"CCITTFaxDecode") | Some(b"JBIG2Decode") => {
                trace!("Skipping image with unsupported filter");
                return None;
            }
            _ => {}
        }

        let bits = dict
            .get(b"BitsPerComponent")
            .ok()
            .and_then(|o| o.as_i64().ok())
            .unwrap_or(8);
        if bits != 8 {
            trace!("Unsupported bits per component: {}", bits);
            return None;
        }

        let color_space = dict
            .get(b"ColorSpace")
            .ok()
            .and_then(|o| match o {
                Object::Name(name) => Some(name.as_slice()),
                Object::Array(arr) => arr.first().and_then(|o| o.as_name().ok()),
                Object::Reference(r) => self.document.get_object(*r).ok().and_then(|o| o.as_name().ok()),
                _ => None,
            })
            .unwrap_or(b"DeviceRGB");

        let data = stream
            .decompressed_content()
            .unwrap_or_else(|_| stream.content.clone());

        raw_to_image(data, width, height, color_space)
    }

    fn page_resources(&self, page_id: ObjectId) -> Option<Dictionary> {
        let mut node_id = page_id;
        loop {
            let Object::Dictionary(dict) = self.document.get_object(node_id).ok()? else {
                return None;
            };

            if let Ok(resources) = dict.get(b"Resources") {
                if let Ok((_, Object::Dictionary(res_dict))) = self.document.dereference(resources) {
                    return Some(res_dict.clone());
                }
            }

            // Resources may be inherited from the page tree.
            match dict.get(b"Parent") {
                Ok(Object::Reference(parent_id)) => node_id = *parent_id,
                _ => return None,
            }
        }
    }
}

fn raw_to_image(data: Vec<u8>, width: u32, height: u32, color_space: &[u8]) -> Option<DynamicImage> {
    let pixels = (width as usize).checked_mul(height as usize)?;
    let channels = match color_space {
        b"DeviceRGB" | b"RGB" => 3,
        b"DeviceGray" | b"G" => 1,
        _ => 0,
    };
    let needed = pixels.checked_mul(channels)?;

    if channels == 0 || data.len() < needed {
        trace!(
            "Could not decode raw image: data_len={}, colorspace={:?}",
            data.len(),
            String::from_utf8_lossy(color_space)
        );
        return None;
    }

    let mut data = data;
    data.truncate(needed);
    if channels == 3 {
        RgbImage::from_raw(width, height, data).map(DynamicImage::ImageRgb8)
    } else {
        GrayImage::from_raw(width, height, data).map(DynamicImage::ImageLuma8)
    }
}
