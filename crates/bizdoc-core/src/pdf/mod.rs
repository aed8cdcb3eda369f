//! PDF ingestion. Only the first page of a PDF is analyzed.

mod extractor;

pub use extractor::PdfImageExtractor;

use image::DynamicImage;
use tracing::debug;

use crate::error::InputError;

/// Image of the first page of a PDF.
pub fn first_page_image(data: &[u8]) -> Result<DynamicImage, InputError> {
    let extractor = PdfImageExtractor::load(data)?;
    debug!("PDF has {} pages, analyzing page 1", extractor.page_count());
    extractor.page_image(1)
}

/// In-memory PDFs for tests.
#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Cursor;

    use image::DynamicImage;
    use lopdf::{dictionary, Dictionary, Document, Object, Stream};

    fn image_dict(width: u32, height: u32, color_space: &str) -> Dictionary {
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width,
            "Height" => height,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
        }
    }

    pub fn gray_xobject(width: u32, height: u32) -> Stream {
        let data = vec![200; (width * height) as usize];
        Stream::new(image_dict(width, height, "DeviceGray"), data)
    }

    pub fn rgb_xobject(width: u32, height: u32) -> Stream {
        let data = vec![90; (width * height * 3) as usize];
        Stream::new(image_dict(width, height, "DeviceRGB"), data)
    }

    pub fn jpeg_xobject(width: u32, height: u32) -> Stream {
        let mut jpeg = Vec::new();
        DynamicImage::new_rgb8(width, height)
            .write_to(&mut Cursor::new(&mut jpeg), image::ImageFormat::Jpeg)
            .unwrap();
        let mut dict = image_dict(width, height, "DeviceRGB");
        dict.set("Filter", "DCTDecode");
        Stream::new(dict, jpeg)
    }

    fn build_document(pages: Vec<Vec<Stream>>) -> Document {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();

        let mut kids: Vec<Object> = Vec::new();
        for images in pages {
            let mut xobjects = Dictionary::new();
            for (i, image) in images.into_iter().enumerate() {
                let image_id = doc.add_object(image);
                xobjects.set(format!("Im{}", i), image_id);
            }
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
                "Resources" => dictionary! { "XObject" => xobjects },
            });
            kids.push(page_id.into());
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);
        doc
    }

    fn save(mut doc: Document) -> Vec<u8> {
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    /// One page per entry, each holding the given image XObjects.
    pub fn build_pdf(pages: Vec<Vec<Stream>>) -> Vec<u8> {
        save(build_document(pages))
    }

    /// Like [`build_pdf`], with a standard security handler that has no keys.
    pub fn build_encrypted_pdf(pages: Vec<Vec<Stream>>) -> Vec<u8> {
        let mut doc = build_document(pages);
        let encrypt_id = doc.add_object(dictionary! {
            "Filter" => "Standard",
            "V" => 1,
            "R" => 2,
        });
        doc.trailer.set("Encrypt", encrypt_id);
        save(doc)
    }
}
