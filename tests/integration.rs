//! Integration tests for the PDF toolbox library
//!
//! Fixture PDFs are generated with lopdf inside a temporary directory, so the
//! tests do not depend on files checked into the repository.

use image::{Rgb, RgbImage};
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, ObjectId, Stream, StringFormat};
use pdf_toolbox::pdf::{self, MergeOptions};
use pdf_toolbox::{raster, Error, Renderer};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Write a PDF with `pages` Letter pages, each showing "{label} page {n}"
///
/// The first page gets an outline entry titled "{label} start".
fn write_fixture(path: &Path, label: &str, pages: u32) -> PathBuf {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
        "Encoding" => "WinAnsiEncoding",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    let mut first_page: Option<ObjectId> = None;
    for n in 1..=pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new(
                    "Tj",
                    vec![Object::string_literal(format!("{} page {}", label, n))],
                ),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        first_page.get_or_insert(page_id);
        kids.push(page_id.into());
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );

    let outlines_id = doc.new_object_id();
    let item_id = doc.add_object(dictionary! {
        "Title" => Object::String(format!("{} start", label).into_bytes(), StringFormat::Literal),
        "Parent" => outlines_id,
        "Dest" => vec![first_page.unwrap().into(), "Fit".into()],
    });
    doc.objects.insert(
        outlines_id,
        Object::Dictionary(dictionary! {
            "Type" => "Outlines",
            "First" => item_id,
            "Last" => item_id,
            "Count" => 1,
        }),
    );

    let info_id = doc.add_object(dictionary! {
        "Title" => Object::String(label.as_bytes().to_vec(), StringFormat::Literal),
        "Producer" => Object::String(b"fixture".to_vec(), StringFormat::Literal),
    });
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
        "Outlines" => outlines_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.trailer.set("Info", info_id);

    doc.save(path).unwrap();
    path.to_path_buf()
}

fn write_image(path: &Path, width: u32, height: u32) -> PathBuf {
    RgbImage::from_fn(width, height, |x, y| Rgb([(x * 5) as u8, (y * 5) as u8, 128]))
        .save(path)
        .unwrap();
    path.to_path_buf()
}

fn page_text(path: &Path, page: u32) -> String {
    let doc = Document::load(path).unwrap();
    doc.extract_text(&[page]).unwrap()
}

fn page_dictionary(doc: &Document, page: u32) -> &lopdf::Dictionary {
    let page_id = *doc.get_pages().get(&page).unwrap();
    doc.get_dictionary(page_id).unwrap()
}

#[test]
fn test_page_count_and_full_range() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("report.pdf"), "Report", 4);

    assert_eq!(pdf::page_count(&input).unwrap(), 4);

    let output = pdf::extract_range(&input, 1, 4).unwrap();
    assert_eq!(output, temp_dir.path().join("report_from_1_to_4.pdf"));
    assert_eq!(pdf::page_count(&output).unwrap(), 4);
}

#[test]
fn test_extract_range_keeps_selected_pages() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("report.pdf"), "Report", 5);

    let output = pdf::extract_range(&input, 2, 3).unwrap();
    assert_eq!(pdf::page_count(&output).unwrap(), 2);
    assert!(page_text(&output, 1).contains("Report page 2"));
    assert!(page_text(&output, 2).contains("Report page 3"));
}

#[test]
fn test_extract_range_out_of_range() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("short.pdf"), "Short", 2);

    let result = pdf::extract_range(&input, 1, 7);
    assert!(matches!(
        result.unwrap_err(),
        Error::PageOutOfRange { page: 3, page_count: 2 }
    ));
    assert!(!temp_dir.path().join("short_from_1_to_7.pdf").exists());
}

#[test]
fn test_extract_last_page() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("report.pdf"), "Report", 3);

    let output = pdf::extract_last_page(&input).unwrap();
    assert_eq!(output, temp_dir.path().join("report_last_page.pdf"));
    assert_eq!(pdf::page_count(&output).unwrap(), 1);
    assert!(page_text(&output, 1).contains("Report page 3"));
}

#[test]
fn test_split_into_single_pages() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("deck.pdf"), "Deck", 3);

    let outputs = pdf::split_into_single_pages(&input).unwrap();
    let expected: Vec<PathBuf> = (1..=3)
        .map(|n| temp_dir.path().join(format!("deck_{}.pdf", n)))
        .collect();
    assert_eq!(outputs, expected);

    for (n, output) in outputs.iter().enumerate() {
        assert_eq!(pdf::page_count(output).unwrap(), 1);
        assert!(page_text(output, 1).contains(&format!("Deck page {}", n + 1)));
    }
}

#[test]
fn test_rotate_range_adds_to_existing_rotation() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("scan.pdf"), "Scan", 3);

    let rotated = pdf::rotate_range(&input, 1, 2, 90).unwrap();
    assert_eq!(rotated, temp_dir.path().join("scan_1_2_90.pdf"));

    let doc = Document::load(&rotated).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
    for page in 1..=2 {
        let rotate = page_dictionary(&doc, page).get(b"Rotate").unwrap().as_i64().unwrap();
        assert_eq!(rotate, 90);
    }

    let twice = pdf::rotate_range(&rotated, 1, 1, 300).unwrap();
    let doc = Document::load(&twice).unwrap();
    let rotate = page_dictionary(&doc, 1).get(b"Rotate").unwrap().as_i64().unwrap();
    assert_eq!(rotate, 30);
}

#[test]
fn test_encrypt_then_decrypt_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("secret.pdf"), "Secret", 3);
    assert!(!pdf::is_encrypted(&input).unwrap());

    let encrypted = pdf::encrypt(&input, "hunter2").unwrap().unwrap();
    assert_eq!(encrypted, temp_dir.path().join("secret_encrypted.pdf"));
    assert!(pdf::is_encrypted(&encrypted).unwrap());
    assert!(matches!(pdf::open(&encrypted).unwrap_err(), Error::PasswordRequired(_)));

    // Encrypting again is a no-op
    assert_eq!(pdf::encrypt(&encrypted, "hunter2").unwrap(), None);

    let decrypted = pdf::decrypt(&encrypted, "hunter2").unwrap().unwrap();
    assert_eq!(decrypted, temp_dir.path().join("secret_encrypted_uncrypted.pdf"));
    assert!(!pdf::is_encrypted(&decrypted).unwrap());
    assert_eq!(pdf::page_count(&decrypted).unwrap(), 3);
    for page in 1..=3 {
        let text = page_text(&decrypted, page);
        assert!(text.contains(&format!("Secret page {}", page)), "page {}: {:?}", page, text);
        assert_eq!(text, page_text(&input, page));
    }
    assert_eq!(
        pdf::extract_text(&decrypted).unwrap(),
        pdf::extract_text(&input).unwrap()
    );
    assert_eq!(pdf::metadata(&decrypted).unwrap().title.as_deref(), Some("Secret"));
}

#[test]
fn test_open_with_password_reads_every_page() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("locked.pdf"), "Locked", 2);
    let encrypted = pdf::encrypt(&input, "pw").unwrap().unwrap();

    let doc = pdf::open_with_password(&encrypted, Some("pw")).unwrap();
    assert_eq!(doc.get_pages().len(), 2);
    assert!(doc.extract_text(&[2]).unwrap().contains("Locked page 2"));

    let result = pdf::open_with_password(&encrypted, Some("nope"));
    assert!(matches!(result.unwrap_err(), Error::WrongPassword(_)));
}

#[test]
fn test_locked_file_needs_password_for_page_count() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("locked.pdf"), "Locked", 2);
    let encrypted = pdf::encrypt(&input, "pw").unwrap().unwrap();

    assert!(matches!(pdf::page_count(&encrypted).unwrap_err(), Error::PasswordRequired(_)));
    assert!(matches!(pdf::metadata(&encrypted).unwrap_err(), Error::PasswordRequired(_)));
}

#[test]
fn test_decrypt_with_wrong_password_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("secret.pdf"), "Secret", 1);
    let encrypted = pdf::encrypt(&input, "right").unwrap().unwrap();

    let result = pdf::decrypt(&encrypted, "wrong");
    assert!(matches!(result.unwrap_err(), Error::WrongPassword(_)));
    assert!(!temp_dir.path().join("secret_encrypted_uncrypted.pdf").exists());
}

#[test]
fn test_decrypt_unencrypted_is_noop() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("plain.pdf"), "Plain", 1);

    assert_eq!(pdf::decrypt(&input, "anything").unwrap(), None);
    assert!(!temp_dir.path().join("plain_uncrypted.pdf").exists());
}

#[test]
fn test_metadata_toc_and_text() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("book.pdf"), "Book", 2);

    let metadata = pdf::metadata(&input).unwrap();
    assert_eq!(metadata.format, "PDF 1.5");
    assert_eq!(metadata.title.as_deref(), Some("Book"));
    assert_eq!(metadata.get("producer").as_deref(), Some("fixture"));
    assert_eq!(metadata.encryption, None);

    let toc = pdf::table_of_contents(&input).unwrap();
    assert_eq!(toc.len(), 1);
    assert_eq!(toc[0].level, 1);
    assert_eq!(toc[0].title, "Book start");
    assert_eq!(toc[0].page, 1);

    let text = pdf::extract_text(&input).unwrap();
    assert!(text.contains("Book page 1"));
    assert!(text.contains("Book page 2"));
    assert!(!text.contains('\t'));
}

#[test]
fn test_merge_list_keeps_order() {
    let temp_dir = TempDir::new().unwrap();
    let first = write_fixture(&temp_dir.path().join("a.pdf"), "Alpha", 2);
    let second = write_fixture(&temp_dir.path().join("b.pdf"), "Beta", 3);
    let output = temp_dir.path().join("merged.pdf");

    pdf::merge_list(&[first, second], &output).unwrap();

    assert_eq!(pdf::page_count(&output).unwrap(), 5);
    assert!(page_text(&output, 1).contains("Alpha page 1"));
    assert!(page_text(&output, 3).contains("Beta page 1"));
    assert!(page_text(&output, 5).contains("Beta page 3"));
}

#[test]
fn test_merge_missing_input() {
    let temp_dir = TempDir::new().unwrap();
    let existing = write_fixture(&temp_dir.path().join("a.pdf"), "Alpha", 1);

    let options = MergeOptions {
        input_paths: vec![existing, temp_dir.path().join("missing.pdf")],
        output_path: temp_dir.path().join("merged.pdf"),
    };

    let result = pdf::merge_pdfs(&options);
    assert!(matches!(result.unwrap_err(), Error::FileNotFound(p) if p.ends_with("missing.pdf")));
    assert!(!options.output_path.exists());
}

#[test]
fn test_collect_and_merge_folder() {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path().join("library");
    let nested = root.join("2024").join("q1");
    std::fs::create_dir_all(&nested).unwrap();

    write_fixture(&root.join("top.pdf"), "Top", 1);
    write_fixture(&root.join("2024").join("mid.pdf"), "Mid", 2);
    write_fixture(&nested.join("deep.pdf"), "Deep", 3);
    std::fs::write(root.join("notes.txt"), "not a pdf").unwrap();
    write_image(&nested.join("cover.png"), 4, 4);

    let paths = pdf::collect_pdf_paths(&root).unwrap();
    assert_eq!(paths.len(), 3);
    assert!(paths.iter().all(|p| p.extension().unwrap() == "pdf"));

    let output = temp_dir.path().join("everything.pdf");
    pdf::merge_folder(&root, &output).unwrap();
    assert_eq!(pdf::page_count(&output).unwrap(), 6);
}

#[test]
fn test_watermark_prepends_one_stream_per_page() {
    let temp_dir = TempDir::new().unwrap();
    let input = write_fixture(&temp_dir.path().join("memo.pdf"), "Memo", 2);
    let logo = write_image(&temp_dir.path().join("logo.png"), 30, 10);

    let output = pdf::watermark(&input, &logo).unwrap();
    assert_eq!(output, temp_dir.path().join("memo_watermarked.pdf"));

    let doc = Document::load(&output).unwrap();
    assert_eq!(doc.get_pages().len(), 2);

    let mut image_ids = Vec::new();
    for page in 1..=2 {
        let page_dict = page_dictionary(&doc, page);
        let contents = page_dict.get(b"Contents").unwrap().as_array().unwrap();
        assert_eq!(contents.len(), 2);

        let first = doc
            .get_object(contents[0].as_reference().unwrap())
            .unwrap()
            .as_stream()
            .unwrap();
        let drawn = String::from_utf8(first.decompressed_content().unwrap_or_else(|_| first.content.clone())).unwrap();
        assert!(drawn.starts_with("q\n"));
        assert!(drawn.contains("/Wm0 Do"));

        let resources = page_dict.get(b"Resources").unwrap().as_dict().unwrap();
        let xobjects = resources.get(b"XObject").unwrap().as_dict().unwrap();
        image_ids.push(xobjects.get(b"Wm0").unwrap().as_reference().unwrap());
    }

    // One embedded image shared by every page
    assert_eq!(image_ids[0], image_ids[1]);
    assert!(page_text(&output, 2).contains("Memo page 2"));
}

#[test]
fn test_image_to_pdf_then_extract_images() {
    let temp_dir = TempDir::new().unwrap();
    let photo = write_image(&temp_dir.path().join("photo.png"), 48, 32);

    let document = raster::image_to_pdf(&photo).unwrap();
    assert_eq!(document, temp_dir.path().join("photo.pdf"));
    assert_eq!(pdf::page_count(&document).unwrap(), 1);

    let out_dir = temp_dir.path().join("images");
    std::fs::create_dir(&out_dir).unwrap();
    let images = pdf::extract_images_to(&document, &out_dir).unwrap();

    assert_eq!(images.len(), 1);
    let extracted = &images[0];
    assert_eq!((extracted.width, extracted.height), (48, 32));
    assert_eq!(extracted.name, "Im0");

    let png = extracted.path.as_ref().unwrap();
    assert_eq!(png, &out_dir.join(format!("{}.png", extracted.object_number)));
    let decoded = image::open(png).unwrap();
    assert_eq!((decoded.width(), decoded.height()), (48, 32));
    assert_eq!(decoded.to_rgb8().get_pixel(2, 3).0, [10, 15, 128]);
}

#[test]
fn test_pdf_to_images_keeps_pixel_size() {
    let renderer = match Renderer::bind() {
        Ok(renderer) => renderer,
        Err(e) => {
            eprintln!("Skipping rasterization test: {}", e);
            return;
        }
    };

    let temp_dir = TempDir::new().unwrap();
    let photo = write_image(&temp_dir.path().join("photo.png"), 64, 40);
    let document = raster::image_to_pdf(&photo).unwrap();

    let outputs = renderer.pdf_to_images(&document, 1, 1).unwrap();
    assert_eq!(outputs, vec![temp_dir.path().join("photo_1.jpg")]);

    let rendered = image::open(&outputs[0]).unwrap();
    assert_eq!((rendered.width(), rendered.height()), (64, 40));

    let result = renderer.render_page(&document, 2);
    assert!(matches!(result.unwrap_err(), Error::PageOutOfRange { page: 2, page_count: 1 }));
}
