// ABOUTME: Public-API tests for document extraction: format detection, dispatch, persistence.
// ABOUTME: Builds PDF and PPTX fixtures in memory and checks names, counts and written files.

use lopdf::{dictionary, Document, Object, Stream};
use pluck_extract::{save_artifacts, Client, DocumentFormat, ExtractionRequest, SourceKind};
use std::fs;
use std::io::{Cursor, Write};
use std::path::Path;
use tempfile::TempDir;

/// Two pages: two JPEG images on the first, nothing on the second.
fn two_page_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let mut image = |marker: u8| {
        doc.add_object(Stream::new(
            dictionary! {
                "Type" => "XObject",
                "Subtype" => "Image",
                "Width" => 1,
                "Height" => 1,
                "ColorSpace" => "DeviceGray",
                "BitsPerComponent" => 8,
                "Filter" => "DCTDecode",
            },
            vec![0xFF, 0xD8, marker, 0xFF, 0xD9],
        ))
    };
    let first = image(1);
    let second = image(2);

    let pages_id = doc.new_object_id();
    let page1 = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! { "Im1" => first, "Im2" => second },
        },
    });
    let page2 = doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Resources" => lopdf::Dictionary::new(),
    });
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page1), Object::Reference(page2)],
            "Count" => 2,
        }),
    );
    let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

fn pptx_with_media() -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, data) in [
        ("ppt/slides/slide1.xml", &b"<p:sld/>"[..]),
        ("ppt/media/image1.png", &b"one"[..]),
        ("ppt/media/image2.jpeg", &b"two"[..]),
        ("ppt/media/image3.png", &b"three"[..]),
    ] {
        writer
            .start_file(name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(data).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[tokio::test]
async fn pdf_images_are_named_by_page_and_index() {
    let client = Client::builder().build().unwrap();
    let result = client
        .extract_document(two_page_pdf(), DocumentFormat::Pdf)
        .await
        .unwrap();

    assert_eq!(result.kind, SourceKind::Pdf);
    assert_eq!(result.count, 2);
    assert_eq!(result.filenames(), vec!["page1_0.jpeg", "page1_1.jpeg"]);
}

#[tokio::test]
async fn format_from_file_name_drives_dispatch() {
    let client = Client::builder().build().unwrap();
    let format = DocumentFormat::from_path(Path::new("Quarterly Results.PPTX")).unwrap();
    assert_eq!(format, DocumentFormat::Pptx);

    let request = ExtractionRequest::document(pptx_with_media(), format).with_name("Quarterly Results.PPTX");
    let result = client.extract(&request).await.unwrap();
    assert_eq!(result.filenames(), vec!["image1.png", "image2.jpeg", "image3.png"]);

    let err = DocumentFormat::from_path(Path::new("slides.key")).unwrap_err();
    assert!(err.is_invalid_input());
}

#[tokio::test]
async fn repeated_extraction_is_stable_and_overwrites() {
    let client = Client::builder().build().unwrap();
    let tmp = TempDir::new().unwrap();
    let out = tmp.path().join("extracted_images");

    let first = client
        .extract_document(pptx_with_media(), DocumentFormat::Pptx)
        .await
        .unwrap();
    let second = client
        .extract_document(pptx_with_media(), DocumentFormat::Pptx)
        .await
        .unwrap();
    assert_eq!(first.count, second.count);
    assert_eq!(first.filenames(), second.filenames());

    save_artifacts(&out, &first.artifacts).unwrap();
    let paths = save_artifacts(&out, &second.artifacts).unwrap();
    assert_eq!(paths.len(), 3);
    assert_eq!(fs::read_dir(&out).unwrap().count(), 3);
    assert_eq!(fs::read(out.join("image3.png")).unwrap(), b"three");
}
