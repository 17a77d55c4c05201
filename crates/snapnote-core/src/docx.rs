//! OOXML (DOCX) package builder.
//!
//! A DOCX file is a ZIP archive with a fixed set of XML parts. Every part is
//! produced by template substitution; all note text goes through
//! [`escape_xml`] before it is placed in the markup.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::Result;
use crate::models::{Image, Note, UNTITLED_NOTE};
use crate::util::{data_url_to_bytes, escape_xml, infer_extension, to_iso8601};
use crate::zip::{build_zip, ZipEntry};

/// English Metric Units per pixel at 96 DPI.
pub const EMU_PER_PIXEL: f64 = 9525.0;
/// Width used when an image carries no size information.
pub const DEFAULT_IMAGE_WIDTH_PX: f64 = 720.0;
/// Height used when an image carries no size information.
pub const DEFAULT_IMAGE_HEIGHT_PX: f64 = 480.0;

/// Application name written into the document properties.
pub const APPLICATION_NAME: &str = "Snapnote";

const CATEGORY_LABEL: &str = "分类";
const CREATED_LABEL: &str = "创建时间";
const UPDATED_LABEL: &str = "更新时间";
const ATTACHMENTS_LABEL: &str = "附件";

const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#;
const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const REL_TYPE_BASE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";

static SECTION_BREAK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n{2,}").expect("Invalid regex"));

/// A finished DOCX file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxPackage {
    /// The `.docx` archive bytes
    pub bytes: Vec<u8>,
    /// Attachments that could not be decoded and were left out
    pub dropped_images: usize,
}

/// The named parts of a DOCX package before they are zipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocxParts {
    pub entries: Vec<ZipEntry>,
    pub dropped_images: usize,
}

impl DocxParts {
    /// Look up a part by its package path.
    pub fn part(&self, name: &str) -> Option<&ZipEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }
}

/// An attachment decoded and ready to embed.
#[derive(Debug, Clone, PartialEq)]
struct ImageEntry {
    rel_id: String,
    filename: String,
    extension: &'static str,
    width_emu: u64,
    height_emu: u64,
    doc_pr_id: usize,
    title: String,
    bytes: Vec<u8>,
}

/// Build a DOCX document for `note`.
pub fn build_docx(note: &Note) -> Result<DocxPackage> {
    let parts = docx_parts(note);
    let bytes = build_zip(&parts.entries)?;
    Ok(DocxPackage {
        bytes,
        dropped_images: parts.dropped_images,
    })
}

/// Generate every part of the DOCX package for `note`, in archive order.
pub fn docx_parts(note: &Note) -> DocxParts {
    let (images, dropped_images) = prepare_images(note);
    let (created, updated) = note.resolved_timestamps();

    let mut entries = vec![
        ZipEntry::from_millis("[Content_Types].xml", content_types_xml(&images), updated),
        ZipEntry::from_millis("_rels/.rels", root_rels_xml(), updated),
        ZipEntry::from_millis(
            "word/document.xml",
            document_xml(note, &images, created, updated),
            updated,
        ),
        ZipEntry::from_millis(
            "word/_rels/document.xml.rels",
            document_rels_xml(&images),
            updated,
        ),
        ZipEntry::from_millis("word/styles.xml", styles_xml(), updated),
        ZipEntry::from_millis("docProps/core.xml", core_xml(note, created, updated), updated),
        ZipEntry::from_millis("docProps/app.xml", app_xml(), updated),
    ];

    for image in images {
        entries.push(ZipEntry::from_millis(
            format!("word/media/{}", image.filename),
            image.bytes,
            updated,
        ));
    }

    DocxParts {
        entries,
        dropped_images,
    }
}

/// Drawing name for an attachment: its ID, or `图片 N` for the
/// `position`-th (1-based) image when the ID is blank.
pub fn image_title(image: &Image, position: usize) -> String {
    let id = image.id.trim();
    if id.is_empty() {
        format!("图片 {position}")
    } else {
        id.to_string()
    }
}

/// Image MIME type for an embedded attachment.
///
/// Prefers the data URL's type, then the attachment's recorded type, and
/// settles on `image/png` when neither names an image.
pub fn embedded_mime_type<'a>(decoded: &'a str, recorded: &'a str) -> &'a str {
    let is_image = |mime: &str| mime.trim().to_ascii_lowercase().starts_with("image/");
    if is_image(decoded) {
        decoded
    } else if is_image(recorded) {
        recorded
    } else {
        "image/png"
    }
}

/// Pixel size for an image, filling in missing dimensions.
///
/// With both dimensions missing the 720×480 default is used. With one
/// missing, the other is derived from the default aspect ratio.
pub fn image_size_px(width: Option<f64>, height: Option<f64>) -> (f64, f64) {
    let valid = |value: Option<f64>| value.filter(|px| px.is_finite() && *px > 0.0);

    match (valid(width), valid(height)) {
        (Some(width), Some(height)) => (width, height),
        (Some(width), None) => (width, width * DEFAULT_IMAGE_HEIGHT_PX / DEFAULT_IMAGE_WIDTH_PX),
        (None, Some(height)) => (height * DEFAULT_IMAGE_WIDTH_PX / DEFAULT_IMAGE_HEIGHT_PX, height),
        (None, None) => (DEFAULT_IMAGE_WIDTH_PX, DEFAULT_IMAGE_HEIGHT_PX),
    }
}

/// Convert pixels to EMU, rounded and never below 1.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn px_to_emu(px: f64) -> u64 {
    (px * EMU_PER_PIXEL).round().max(1.0) as u64
}

/// Split a note body into paragraph sections on blank-line boundaries.
pub fn split_sections(body: &str) -> Vec<String> {
    let normalized = body.replace("\r\n", "\n").replace('\r', "\n");
    SECTION_BREAK_RE
        .split(normalized.trim())
        .filter(|section| !section.trim().is_empty())
        .map(ToString::to_string)
        .collect()
}

fn prepare_images(note: &Note) -> (Vec<ImageEntry>, usize) {
    let mut prepared = Vec::new();
    let mut dropped = 0;

    for image in &note.attachments.images {
        let Some(data_url) = image.data_url() else {
            continue;
        };

        let decoded = match data_url_to_bytes(data_url) {
            Ok(decoded) => decoded,
            Err(error) => {
                tracing::warn!(
                    note_id = %note.id,
                    image_id = %image.id,
                    "Skipping attachment that could not be decoded: {error}"
                );
                dropped += 1;
                continue;
            }
        };

        let position = prepared.len() + 1;
        let extension =
            infer_extension(embedded_mime_type(&decoded.mime_type, &image.mime_type));
        let (width_px, height_px) = image_size_px(image.width, image.height);

        prepared.push(ImageEntry {
            rel_id: format!("rId{}", position + 1),
            filename: format!("image{position}.{extension}"),
            extension,
            width_emu: px_to_emu(width_px),
            height_emu: px_to_emu(height_px),
            doc_pr_id: position,
            title: image_title(image, position),
            bytes: decoded.bytes,
        });
    }

    (prepared, dropped)
}

fn image_content_type(extension: &str) -> &'static str {
    match extension {
        "jpg" => "image/jpeg",
        "gif" => "image/gif",
        "webp" => "image/webp",
        _ => "image/png",
    }
}

fn content_types_xml(images: &[ImageEntry]) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECLARATION);
    xml.push_str(
        r#"<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types">"#,
    );
    xml.push_str(r#"<Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/>"#);
    xml.push_str(r#"<Default Extension="xml" ContentType="application/xml"/>"#);

    let mut seen: Vec<&str> = Vec::new();
    for image in images {
        if seen.contains(&image.extension) {
            continue;
        }
        seen.push(image.extension);
        let _ = write!(
            xml,
            r#"<Default Extension="{}" ContentType="{}"/>"#,
            image.extension,
            image_content_type(image.extension)
        );
    }

    xml.push_str(r#"<Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/>"#);
    xml.push_str(r#"<Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/core.xml" ContentType="application/vnd.openxmlformats-package.core-properties+xml"/>"#);
    xml.push_str(r#"<Override PartName="/docProps/app.xml" ContentType="application/vnd.openxmlformats-officedocument.extended-properties+xml"/>"#);
    xml.push_str("</Types>");
    xml
}

fn root_rels_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Relationships xmlns="{ns}">"#,
            r#"<Relationship Id="rId1" Type="{base}/officeDocument" Target="word/document.xml"/>"#,
            r#"<Relationship Id="rId2" Type="http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties" Target="docProps/core.xml"/>"#,
            r#"<Relationship Id="rId3" Type="{base}/extended-properties" Target="docProps/app.xml"/>"#,
            "</Relationships>"
        ),
        decl = XML_DECLARATION,
        ns = NS_PACKAGE_RELS,
        base = REL_TYPE_BASE,
    )
}

fn document_rels_xml(images: &[ImageEntry]) -> String {
    let mut xml = String::new();
    xml.push_str(XML_DECLARATION);
    let _ = write!(xml, r#"<Relationships xmlns="{NS_PACKAGE_RELS}">"#);
    let _ = write!(
        xml,
        r#"<Relationship Id="rId1" Type="{REL_TYPE_BASE}/styles" Target="styles.xml"/>"#
    );
    for image in images {
        let _ = write!(
            xml,
            r#"<Relationship Id="{}" Type="{REL_TYPE_BASE}/image" Target="media/{}"/>"#,
            image.rel_id, image.filename
        );
    }
    xml.push_str("</Relationships>");
    xml
}

fn document_xml(note: &Note, images: &[ImageEntry], created: i64, updated: i64) -> String {
    let mut body = String::new();

    let title = note.title.trim();
    if !title.is_empty() {
        let _ = write!(
            body,
            r#"<w:p><w:pPr><w:pStyle w:val="Heading1"/></w:pPr><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#,
            escape_xml(title)
        );
    }

    body.push_str(&text_paragraph(&format!(
        "{CATEGORY_LABEL}：{}",
        note.display_category()
    )));
    body.push_str(&text_paragraph(&format!(
        "{CREATED_LABEL}：{}",
        to_iso8601(created)
    )));
    body.push_str(&text_paragraph(&format!(
        "{UPDATED_LABEL}：{}",
        to_iso8601(updated)
    )));

    for section in split_sections(&note.body) {
        body.push_str(&text_paragraph(&section));
    }

    if !images.is_empty() {
        body.push_str(&text_paragraph(ATTACHMENTS_LABEL));
        for image in images {
            body.push_str(&image_paragraph(image));
        }
    }

    format!(
        concat!(
            "{decl}",
            r#"<w:document xmlns:w="{w}" xmlns:r="{r}" xmlns:wp="{wp}" xmlns:a="{a}" xmlns:pic="{pic}">"#,
            "<w:body>{body}",
            r#"<w:sectPr><w:pgSz w:w="11906" w:h="16838"/>"#,
            r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
            "</w:sectPr></w:body></w:document>"
        ),
        decl = XML_DECLARATION,
        w = NS_W,
        r = NS_R,
        wp = NS_WP,
        a = NS_A,
        pic = NS_PIC,
        body = body,
    )
}

/// One paragraph with a single run; newlines become `<w:br/>`.
fn text_paragraph(text: &str) -> String {
    let runs = text
        .split('\n')
        .map(|line| format!(r#"<w:t xml:space="preserve">{}</w:t>"#, escape_xml(line)))
        .collect::<Vec<_>>()
        .join("<w:br/>");
    format!("<w:p><w:r>{runs}</w:r></w:p>")
}

fn image_paragraph(image: &ImageEntry) -> String {
    let title = escape_xml(&image.title);
    format!(
        concat!(
            "<w:p><w:r><w:drawing>",
            r#"<wp:inline distT="0" distB="0" distL="0" distR="0">"#,
            r#"<wp:extent cx="{cx}" cy="{cy}"/>"#,
            r#"<wp:docPr id="{id}" name="{title}" descr="{title}"/>"#,
            r#"<wp:cNvGraphicFramePr><a:graphicFrameLocks noChangeAspect="1"/></wp:cNvGraphicFramePr>"#,
            r#"<a:graphic><a:graphicData uri="{pic_ns}">"#,
            r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="{id}" name="{filename}"/><pic:cNvPicPr/></pic:nvPicPr>"#,
            r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
            r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
            r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
            "</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"
        ),
        cx = image.width_emu,
        cy = image.height_emu,
        id = image.doc_pr_id,
        title = title,
        pic_ns = NS_PIC,
        filename = escape_xml(&image.filename),
        rel = image.rel_id,
    )
}

fn styles_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<w:styles xmlns:w="{w}">"#,
            "<w:docDefaults><w:rPrDefault><w:rPr>",
            r#"<w:rFonts w:ascii="Calibri" w:hAnsi="Calibri" w:eastAsia="Microsoft YaHei" w:cs="Calibri"/>"#,
            r#"<w:sz w:val="22"/><w:szCs w:val="22"/>"#,
            "</w:rPr></w:rPrDefault>",
            r#"<w:pPrDefault><w:pPr><w:spacing w:after="160" w:line="276" w:lineRule="auto"/></w:pPr></w:pPrDefault>"#,
            "</w:docDefaults>",
            r#"<w:style w:type="paragraph" w:default="1" w:styleId="Normal">"#,
            r#"<w:name w:val="Normal"/><w:qFormat/></w:style>"#,
            r#"<w:style w:type="paragraph" w:styleId="Heading1">"#,
            r#"<w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:qFormat/>"#,
            r#"<w:pPr><w:keepNext/><w:spacing w:before="240" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr>"#,
            r#"<w:rPr><w:b/><w:sz w:val="32"/><w:szCs w:val="32"/></w:rPr></w:style>"#,
            "</w:styles>"
        ),
        decl = XML_DECLARATION,
        w = NS_W,
    )
}

fn core_xml(note: &Note, created: i64, updated: i64) -> String {
    let title = note.title.trim();
    let title = if title.is_empty() { UNTITLED_NOTE } else { title };

    format!(
        concat!(
            "{decl}",
            r#"<cp:coreProperties xmlns:cp="http://schemas.openxmlformats.org/package/2006/metadata/core-properties" "#,
            r#"xmlns:dc="http://purl.org/dc/elements/1.1/" xmlns:dcterms="http://purl.org/dc/terms/" "#,
            r#"xmlns:dcmitype="http://purl.org/dc/dcmitype/" xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance">"#,
            "<dc:title>{title}</dc:title>",
            "<dc:creator>{app}</dc:creator>",
            "<cp:lastModifiedBy>{app}</cp:lastModifiedBy>",
            "<cp:category>{category}</cp:category>",
            r#"<dcterms:created xsi:type="dcterms:W3CDTF">{created}</dcterms:created>"#,
            r#"<dcterms:modified xsi:type="dcterms:W3CDTF">{modified}</dcterms:modified>"#,
            "</cp:coreProperties>"
        ),
        decl = XML_DECLARATION,
        title = escape_xml(title),
        app = APPLICATION_NAME,
        category = escape_xml(note.display_category()),
        created = to_iso8601(created),
        modified = to_iso8601(updated),
    )
}

fn app_xml() -> String {
    format!(
        concat!(
            "{decl}",
            r#"<Properties xmlns="http://schemas.openxmlformats.org/officeDocument/2006/extended-properties" "#,
            r#"xmlns:vt="http://schemas.openxmlformats.org/officeDocument/2006/docPropsVTypes">"#,
            "<Application>{app}</Application><DocSecurity>0</DocSecurity><ScaleCrop>false</ScaleCrop>",
            "<LinksUpToDate>false</LinksUpToDate><SharedDoc>false</SharedDoc>",
            "<HyperlinksChanged>false</HyperlinksChanged><AppVersion>1.0000</AppVersion>",
            "</Properties>"
        ),
        decl = XML_DECLARATION,
        app = APPLICATION_NAME,
    )
}
