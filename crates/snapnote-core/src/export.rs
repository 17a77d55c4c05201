//! Export flows shared by every client: Markdown, DOCX and ZIP archives.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::docx::{build_docx, DocxPackage};
use crate::error::Result;
use crate::util::{sanitize_file_name, to_iso8601};
use crate::zip::{build_zip, ZipEntry};
use crate::Note;

/// Separator placed between notes in a combined Markdown export.
pub const MARKDOWN_NOTE_SEPARATOR: &str = "\n\n---\n\n";

/// Export output format shared by all clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExportFormat {
    /// All notes in one Markdown document
    Markdown,
    /// A single note as a Word document
    Docx,
    /// A ZIP archive with one Markdown file per note
    Zip,
    /// A ZIP archive with one DOCX file per note
    DocxZip,
    /// Full JSON backup
    Json,
}

impl ExportFormat {
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Markdown => "md",
            Self::Docx => "docx",
            Self::Zip | Self::DocxZip => "zip",
            Self::Json => "json",
        }
    }

    /// Whether the rendered export is binary rather than UTF-8 text.
    #[must_use]
    pub const fn is_binary(self) -> bool {
        matches!(self, Self::Docx | Self::Zip | Self::DocxZip)
    }
}

/// A ZIP of DOCX files plus the number of attachments left out across all notes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxArchive {
    pub bytes: Vec<u8>,
    pub dropped_images: usize,
}

/// Render one note as Markdown.
///
/// Layout: title heading, metadata bullet list, trimmed body, then an
/// attachments section with one image reference per attachment, its data
/// URL inlined.
#[must_use]
pub fn to_markdown(note: &Note) -> String {
    let (created, updated) = note.resolved_timestamps();
    let mut output = String::new();

    let _ = writeln!(output, "# {}", note.display_title());
    let _ = writeln!(output);
    let _ = writeln!(output, "- 分类：{}", note.display_category());
    let _ = writeln!(output, "- 创建时间：{}", to_iso8601(created));
    let _ = writeln!(output, "- 更新时间：{}", to_iso8601(updated));

    let body = note.body.trim();
    if !body.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "{body}");
    }

    let images = note
        .attachments
        .images
        .iter()
        .filter_map(|image| image.data_url().map(|data_url| (image, data_url)))
        .collect::<Vec<_>>();
    if !images.is_empty() {
        let _ = writeln!(output);
        let _ = writeln!(output, "## 附件");
        for (image, data_url) in images {
            let _ = writeln!(output, "![attachment-{}]({data_url})", image.id);
        }
    }

    output.trim_end().to_string()
}

/// Render notes as one Markdown document separated by horizontal rules.
#[must_use]
pub fn build_markdown_export(notes: &[Note]) -> String {
    notes
        .iter()
        .map(to_markdown)
        .collect::<Vec<_>>()
        .join(MARKDOWN_NOTE_SEPARATOR)
}

/// Archive file name for a note's Markdown rendering.
#[must_use]
pub fn markdown_file_name(note: &Note) -> String {
    sanitize_file_name(&format!("{}-{}.md", note.file_stem(), note.id))
}

/// Archive file name for a note's DOCX rendering.
#[must_use]
pub fn docx_file_name(note: &Note) -> String {
    sanitize_file_name(&format!("{}-{}.docx", note.file_stem(), note.id))
}

/// Build a ZIP with one Markdown file per note followed by `extra_files`.
pub fn build_markdown_archive(notes: &[Note], extra_files: Vec<ZipEntry>) -> Result<Vec<u8>> {
    let mut entries = notes
        .iter()
        .map(|note| {
            ZipEntry::from_millis(
                markdown_file_name(note),
                to_markdown(note),
                note.updated_at_or_fallback(),
            )
        })
        .collect::<Vec<_>>();
    entries.extend(extra_files);

    build_zip(&entries)
}

/// Build a DOCX document for one note.
pub fn build_docx_export(note: &Note) -> Result<DocxPackage> {
    build_docx(note)
}

/// Render every note to DOCX and repackage the documents as one ZIP.
pub fn build_docx_archive(notes: &[Note]) -> Result<DocxArchive> {
    let mut entries = Vec::with_capacity(notes.len());
    let mut dropped_images = 0;

    for note in notes {
        let package = build_docx_export(note)?;
        dropped_images += package.dropped_images;
        entries.push(ZipEntry::from_millis(
            docx_file_name(note),
            package.bytes,
            note.updated_at_or_fallback(),
        ));
    }

    let bytes = build_markdown_archive(&[], entries)?;
    Ok(DocxArchive {
        bytes,
        dropped_images,
    })
}

/// Build a deterministic default file name for export flows.
#[must_use]
pub fn suggested_export_file_name(format: ExportFormat, timestamp_ms: i64) -> String {
    match format {
        ExportFormat::DocxZip => format!("snapnote-docx-{timestamp_ms}.zip"),
        _ => format!("snapnote-export-{timestamp_ms}.{}", format.extension()),
    }
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Read};

    use pretty_assertions::assert_eq;

    use super::*;
    use crate::models::{Attachments, Image};

    fn scenario_note() -> Note {
        Note {
            id: "n1".to_string(),
            title: "Test".to_string(),
            body: "line1\nline2\n\npara2".to_string(),
            category: "c1".to_string(),
            attachments: Attachments::default(),
            created_at: Some(0),
            updated_at: Some(0),
        }
    }

    fn read_entry(bytes: &[u8], name: &str) -> Vec<u8> {
        let mut archive = ::zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut file = archive.by_name(name).unwrap();
        let mut contents = Vec::new();
        file.read_to_end(&mut contents).unwrap();
        contents
    }

    #[test]
    fn to_markdown_renders_heading_metadata_and_body() {
        let rendered = to_markdown(&scenario_note());
        assert_eq!(
            rendered,
            "# Test\n\n\
             - 分类：c1\n\
             - 创建时间：1970-01-01T00:00:00.000Z\n\
             - 更新时间：1970-01-01T00:00:00.000Z\n\n\
             line1\nline2\n\npara2"
        );
    }

    #[test]
    fn to_markdown_uses_placeholder_title_and_inlines_images() {
        let mut note = scenario_note();
        note.title = String::new();
        let mut first = Image::from_bytes("image/png", &[1, 2, 3], None, None);
        first.id = "img_1".to_string();
        let mut second = Image::from_bytes("image/gif", &[4], None, None);
        second.id = "img_2".to_string();
        note.attachments.images = vec![first, second];

        let rendered = to_markdown(&note);
        assert!(rendered.starts_with(&format!("# {}", crate::models::UNTITLED_NOTE)));
        assert!(rendered.ends_with(
            "para2\n\n## 附件\n\
             ![attachment-img_1](data:image/png;base64,AQID)\n\
             ![attachment-img_2](data:image/gif;base64,BA==)"
        ));
    }

    #[test]
    fn to_markdown_blank_category_reads_as_uncategorized() {
        let mut note = scenario_note();
        note.category = String::new();
        let rendered = to_markdown(&note);
        assert!(rendered.contains("- 分类：未分类\n"));
        assert!(!rendered.contains("## 附件"));
    }

    #[test]
    fn markdown_export_joins_with_rules() {
        let mut second = scenario_note();
        second.id = "n2".to_string();
        second.title = "Second".to_string();

        let rendered = build_markdown_export(&[scenario_note(), second]);
        assert!(rendered.starts_with("# Test"));
        assert!(rendered.contains("- 分类：c1"));
        assert!(rendered.contains("line1\nline2\n\npara2"));
        assert!(rendered.contains("para2\n\n---\n\n# Second"));
        assert_eq!(rendered.matches(MARKDOWN_NOTE_SEPARATOR).count(), 1);
    }

    #[test]
    fn markdown_export_of_nothing_is_empty() {
        assert_eq!(build_markdown_export(&[]), "");
    }

    #[test]
    fn file_names_are_sanitized() {
        let mut note = scenario_note();
        note.title = "My Note?/Idea".to_string();
        assert_eq!(markdown_file_name(&note), "my_note-_idea-n1.md");
        assert_eq!(docx_file_name(&note), "my_note-_idea-n1.docx");
    }

    #[test]
    fn untitled_notes_get_ascii_file_names() {
        let mut note = scenario_note();
        note.title = "  ".to_string();
        assert_eq!(markdown_file_name(&note), "note-n1.md");
        assert_eq!(docx_file_name(&note), "note-n1.docx");

        let mut titled = scenario_note();
        titled.id = "n2".to_string();
        titled.title = "会议 记录".to_string();

        let bytes = build_markdown_archive(&[note, titled], Vec::new()).unwrap();
        let archive = ::zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"note-n1.md"));
        assert!(names.contains(&"会议_记录-n2.md"));
    }

    #[test]
    fn markdown_archive_contains_notes_then_extras() {
        let note = scenario_note();
        let extra = ZipEntry::from_millis("extra/readme.txt", b"hi".to_vec(), 0);
        let bytes = build_markdown_archive(std::slice::from_ref(&note), vec![extra]).unwrap();

        let archive = ::zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"test-n1.md"));
        assert!(names.contains(&"extra/readme.txt"));

        assert_eq!(
            String::from_utf8(read_entry(&bytes, "test-n1.md")).unwrap(),
            to_markdown(&note)
        );
    }

    #[test]
    fn docx_export_splits_body_into_paragraphs() {
        let package = build_docx_export(&scenario_note()).unwrap();
        let document = String::from_utf8(read_entry(&package.bytes, "word/document.xml")).unwrap();

        assert!(document.contains(
            r#"<w:p><w:r><w:t xml:space="preserve">line1</w:t><w:br/><w:t xml:space="preserve">line2</w:t></w:r></w:p>"#
        ));
        assert!(document
            .contains(r#"<w:p><w:r><w:t xml:space="preserve">para2</w:t></w:r></w:p>"#));
    }

    #[test]
    fn docx_archive_wraps_each_note() {
        let mut second = scenario_note();
        second.id = "n2".to_string();
        let mut broken = Image::from_bytes("image/png", &[1], None, None);
        broken.data_url = Some("data:image/png;base64,***".to_string());
        second.attachments.images.push(broken);

        let archive = build_docx_archive(&[scenario_note(), second]).unwrap();
        assert_eq!(archive.dropped_images, 1);

        let inner = read_entry(&archive.bytes, "test-n2.docx");
        let document = String::from_utf8(read_entry(&inner, "word/document.xml")).unwrap();
        assert!(document.contains("para2"));
    }

    #[test]
    fn suggested_export_file_name_uses_format_extension() {
        assert_eq!(
            suggested_export_file_name(ExportFormat::Json, 123),
            "snapnote-export-123.json"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::Markdown, 456),
            "snapnote-export-456.md"
        );
        assert_eq!(
            suggested_export_file_name(ExportFormat::DocxZip, 7),
            "snapnote-docx-7.zip"
        );
        assert!(ExportFormat::Docx.is_binary());
        assert!(!ExportFormat::Json.is_binary());
    }
}
