//! Locates embedded pictures in an Office Open XML package.
//!
//! Parts are followed through their relationships:
//! `xl/workbook.xml` → worksheet → drawing part → media entry.
//! Embedded pictures become memory-backed drawings that read their bytes
//! from the package on demand; linked pictures become file-backed drawings.

use super::types::{Drawing, DrawingSource};
use super::utils::cell_coordinate;
use crate::error::{AppError, Result};
use bytes::Bytes;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader as XmlReader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use zip::ZipArchive;

const WORKBOOK_PART: &str = "xl/workbook.xml";
const DRAWING_REL_SUFFIX: &str = "/drawing";

#[derive(Debug, Clone, PartialEq, Eq)]
struct Relationship {
    rel_type: String,
    target: String,
    external: bool,
}

/// One `xdr:pic` inside a drawing part.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct PictureRef {
    from: Option<(u32, u32)>,
    name: Option<String>,
    description: Option<String>,
    embed: Option<String>,
    link: Option<String>,
}

pub struct DrawingLocator {
    path: Arc<PathBuf>,
    /// Worksheet part per sheet, in workbook order.
    sheet_parts: Vec<Option<String>>,
}

impl DrawingLocator {
    pub fn open(path: &Path) -> Result<Self> {
        let mut archive = open_archive(path)?;
        let workbook_xml = read_entry_string(&mut archive, WORKBOOK_PART)?;
        let rels = match read_entry_string(&mut archive, &rels_part(WORKBOOK_PART)) {
            Ok(xml) => parse_relationships(&xml),
            Err(_) => HashMap::new(),
        };

        let sheet_parts = parse_sheet_rel_ids(&workbook_xml)
            .into_iter()
            .map(|rel_id| {
                rels.get(&rel_id)
                    .filter(|rel| !rel.external)
                    .map(|rel| resolve_part(WORKBOOK_PART, &rel.target))
            })
            .collect();

        Ok(Self {
            path: Arc::new(path.to_path_buf()),
            sheet_parts,
        })
    }

    /// Drawings of the sheet at a 1-based ordinal. Sheets without a drawing
    /// part have none.
    pub fn drawings(&self, ordinal: usize) -> Result<Vec<Drawing>> {
        let Some(Some(sheet_part)) = ordinal.checked_sub(1).and_then(|idx| self.sheet_parts.get(idx)) else {
            return Ok(Vec::new());
        };

        let mut archive = open_archive(&self.path)?;
        let sheet_rels = match read_entry_string(&mut archive, &rels_part(sheet_part)) {
            Ok(xml) => parse_relationships(&xml),
            Err(_) => return Ok(Vec::new()),
        };

        let mut drawing_parts: Vec<String> = sheet_rels
            .values()
            .filter(|rel| !rel.external && rel.rel_type.ends_with(DRAWING_REL_SUFFIX))
            .map(|rel| resolve_part(sheet_part, &rel.target))
            .collect();
        drawing_parts.sort();

        let mut drawings = Vec::new();
        for drawing_part in drawing_parts {
            let xml = read_entry_string(&mut archive, &drawing_part)?;
            let rels = match read_entry_string(&mut archive, &rels_part(&drawing_part)) {
                Ok(xml) => parse_relationships(&xml),
                Err(_) => HashMap::new(),
            };

            for picture in parse_drawing_pictures(&xml) {
                match self.to_drawing(&drawing_part, &rels, picture) {
                    Some(drawing) => drawings.push(drawing),
                    None => tracing::debug!("Picture in {} has no resolvable image", drawing_part),
                }
            }
        }

        tracing::debug!("Found {} drawing(s) for sheet {}", drawings.len(), ordinal);
        Ok(drawings)
    }

    fn to_drawing(&self, drawing_part: &str, rels: &HashMap<String, Relationship>, picture: PictureRef) -> Option<Drawing> {
        let coordinates = picture
            .from
            .map(|(col, row)| cell_coordinate(col, row))
            .unwrap_or_default();

        let source = if let Some(rel) = picture.embed.as_ref().and_then(|id| rels.get(id)) {
            let entry = resolve_part(drawing_part, &rel.target);
            memory_source(Arc::clone(&self.path), entry)
        } else if let Some(rel) = picture.link.as_ref().and_then(|id| rels.get(id)) {
            DrawingSource::File(linked_path(&rel.target))
        } else {
            return None;
        };

        Some(Drawing {
            coordinates,
            name: picture.name.filter(|s| !s.is_empty()),
            description: picture.description.filter(|s| !s.is_empty()),
            source,
        })
    }
}

fn memory_source(package: Arc<PathBuf>, entry: String) -> DrawingSource {
    let mime_type = mime_type_for(&entry).to_string();
    DrawingSource::Memory {
        mime_type,
        render: Arc::new(move || {
            let mut archive = open_archive(&package).map_err(io::Error::other)?;
            let mut file = archive.by_name(&entry).map_err(io::Error::other)?;
            let mut data = Vec::new();
            file.read_to_end(&mut data)?;
            Ok(Bytes::from(data))
        }),
    }
}

fn mime_type_for(entry: &str) -> &'static str {
    let ext = entry.rsplit('.').next().unwrap_or_default().to_ascii_lowercase();
    match ext.as_str() {
        "png" => "image/png",
        "gif" => "image/gif",
        "jpg" | "jpeg" => "image/jpeg",
        "bmp" => "image/bmp",
        "tif" | "tiff" => "image/tiff",
        "emf" => "image/x-emf",
        "wmf" => "image/x-wmf",
        _ => "application/octet-stream",
    }
}

fn linked_path(target: &str) -> PathBuf {
    let path = target
        .strip_prefix("file:///")
        .map(|rest| if cfg!(windows) { rest.to_string() } else { format!("/{}", rest) })
        .unwrap_or_else(|| target.to_string());
    PathBuf::from(path)
}

fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path)?;
    Ok(ZipArchive::new(file)?)
}

fn read_entry_string(archive: &mut ZipArchive<File>, name: &str) -> Result<String> {
    let mut entry = archive
        .by_name(name)
        .map_err(|e| AppError::FileProcessingError(format!("Missing part {}: {}", name, e)))?;
    let mut xml = String::new();
    entry.read_to_string(&mut xml)?;
    Ok(xml)
}

/// `xl/worksheets/sheet1.xml` → `xl/worksheets/_rels/sheet1.xml.rels`
fn rels_part(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolves a relationship target against the part that owns it.
fn resolve_part(owner: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match owner.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').collect(),
        None => Vec::new(),
    };
    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}

fn parse_relationships(xml: &str) -> HashMap<String, Relationship> {
    let mut relationships = HashMap::new();
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e) | Event::Start(e)) if e.local_name().as_ref() == b"Relationship" => {
                let mut id = None;
                let mut rel_type = String::new();
                let mut target = None;
                let mut external = false;

                for attr in e.attributes().filter_map(std::result::Result::ok) {
                    let Ok(value) = attr.decode_and_unescape_value(&reader) else {
                        continue;
                    };
                    match attr.key.local_name().as_ref() {
                        b"Id" => id = Some(value.to_string()),
                        b"Type" => rel_type = value.to_string(),
                        b"Target" => target = Some(value.to_string()),
                        b"TargetMode" => external = value.eq_ignore_ascii_case("External"),
                        _ => {}
                    }
                }

                if let (Some(id), Some(target)) = (id, target) {
                    relationships.insert(id, Relationship { rel_type, target, external });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("Malformed relationships part: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    relationships
}

/// Relationship ids of `<sheet>` elements, in workbook order.
fn parse_sheet_rel_ids(xml: &str) -> Vec<String> {
    let mut ids = Vec::new();
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Empty(e) | Event::Start(e)) if e.local_name().as_ref() == b"sheet" => {
                let rel_id = e
                    .attributes()
                    .filter_map(std::result::Result::ok)
                    .find(|attr| attr.key.as_ref() == b"r:id" || attr.key.local_name().as_ref() == b"id")
                    .and_then(|attr| attr.decode_and_unescape_value(&reader).ok().map(|v| v.to_string()));
                ids.push(rel_id.unwrap_or_default());
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("Malformed workbook part: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    ids
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Capture {
    None,
    Col,
    Row,
}

fn parse_drawing_pictures(xml: &str) -> Vec<PictureRef> {
    let mut pictures = Vec::new();
    let mut reader = XmlReader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();

    let mut anchor_from: Option<(u32, u32)> = None;
    let mut from_col: Option<u32> = None;
    let mut from_row: Option<u32> = None;
    let mut in_from = false;
    let mut capture = Capture::None;
    let mut current: Option<PictureRef> = None;

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"twoCellAnchor" | b"oneCellAnchor" | b"absoluteAnchor" => {
                    anchor_from = None;
                    from_col = None;
                    from_row = None;
                }
                b"from" => in_from = true,
                b"col" if in_from => capture = Capture::Col,
                b"row" if in_from => capture = Capture::Row,
                b"pic" => current = Some(PictureRef::default()),
                _ => {
                    if let Some(picture) = current.as_mut() {
                        read_picture_attributes(&reader, &e, picture);
                    }
                }
            },
            Ok(Event::Empty(e)) => {
                if let Some(picture) = current.as_mut() {
                    read_picture_attributes(&reader, &e, picture);
                }
            }
            Ok(Event::Text(e)) => {
                if capture != Capture::None {
                    if let Ok(text) = e.unescape() {
                        let parsed = text.trim().parse::<u32>().ok();
                        match capture {
                            Capture::Col => from_col = parsed,
                            Capture::Row => from_row = parsed,
                            Capture::None => {}
                        }
                    }
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"from" => {
                    in_from = false;
                    anchor_from = from_col.zip(from_row);
                }
                b"col" | b"row" => capture = Capture::None,
                b"pic" => {
                    if let Some(mut picture) = current.take() {
                        picture.from = anchor_from;
                        pictures.push(picture);
                    }
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::warn!("Malformed drawing part: {}", e);
                break;
            }
            _ => {}
        }
        buf.clear();
    }

    pictures
}

fn read_picture_attributes(reader: &XmlReader<&[u8]>, element: &BytesStart<'_>, picture: &mut PictureRef) {
    let element_name = element.local_name();
    for attr in element.attributes().filter_map(std::result::Result::ok) {
        let Ok(value) = attr.decode_and_unescape_value(reader) else {
            continue;
        };
        match (element_name.as_ref(), attr.key.local_name().as_ref()) {
            (b"cNvPr", b"name") => picture.name = Some(value.to_string()),
            (b"cNvPr", b"descr") => picture.description = Some(value.to_string()),
            (b"blip", b"embed") => picture.embed = Some(value.to_string()),
            (b"blip", b"link") => picture.link = Some(value.to_string()),
            _ => {}
        }
    }
}
