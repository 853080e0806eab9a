//! PDF manipulation module

pub mod crypto;
pub mod document;
pub mod images;
pub mod merge;
pub mod metadata;
pub mod outline;
pub mod pages;
pub mod text;
pub mod watermark;
pub(crate) mod xobject;

// Re-export commonly used items
pub use crypto::{decrypt, decrypt_to, encrypt, encrypt_to};
pub use document::{is_encrypted, open, open_with_password};
pub use images::{extract_images, extract_images_to, ExtractedImage};
pub use merge::{collect_pdf_paths, merge_folder, merge_list, merge_pdfs, MergeOptions};
pub use metadata::{metadata, page_count, PdfMetadata};
pub use outline::{table_of_contents, TocEntry};
pub use pages::{
    copy_pages, extract_last_page, extract_range, rotate_range, split_into_single_pages,
    PageRangeOptions, DEFAULT_ROTATION,
};
pub use text::extract_text;
pub use watermark::{watermark, watermark_to, WatermarkOptions};
