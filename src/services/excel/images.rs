use super::types::Drawing;
use super::utils::{parse_anchor, sanitize_file_component};
use crate::error::Result;
use crate::models::{BucketCount, DrawingDetail, ExtractionSummary, ImageReport};
use std::collections::HashMap;
use std::path::Path;

pub const DETAIL_SAMPLE_SIZE: usize = 10;

/// Counts of embedded drawings per column and row, and extraction to disk.
pub struct ImageInventory;

impl ImageInventory {
    pub fn inventory(&self, drawings: &[Drawing]) -> ImageReport {
        let mut by_column = Buckets::default();
        let mut by_row = Buckets::default();

        for drawing in drawings {
            let (column, row) = parse_anchor(&drawing.coordinates);
            by_column.add(column);
            by_row.add(row);
        }

        ImageReport {
            total: drawings.len(),
            rows_with_images: by_row.len(),
            by_column: by_column.into_counts(),
            by_row: by_row.into_counts(),
            details: Vec::new(),
            extraction: None,
        }
    }

    /// Anchor, name and description of the first `limit` drawings.
    pub fn details(&self, drawings: &[Drawing], limit: usize) -> Vec<DrawingDetail> {
        drawings
            .iter()
            .take(limit)
            .map(|d| DrawingDetail {
                coordinates: d.coordinates.clone(),
                name: d.name.clone(),
                description: d.description.clone(),
            })
            .collect()
    }

    /// Writes every drawing to `dir` as `{sheet}_{anchor}_{nnn}.{ext}`. A
    /// drawing that cannot be read or written is counted as failed and the
    /// remaining ones are still processed. Only a directory that cannot be
    /// created is an error.
    pub fn extract(&self, drawings: &[Drawing], sheet_name: &str, dir: &Path) -> Result<ExtractionSummary> {
        if !dir.is_dir() {
            std::fs::create_dir_all(dir)?;
            tracing::info!("Created directory: {}", dir.display());
        }

        let sheet_part = sanitize_file_component(sheet_name);
        let mut extracted = 0;
        let mut failed = 0;

        for (idx, drawing) in drawings.iter().enumerate() {
            let filename = format!(
                "{}_{}_{:03}.{}",
                sheet_part,
                drawing.coordinates,
                idx + 1,
                drawing.source.extension()
            );

            let written = drawing
                .source
                .read_bytes()
                .and_then(|data| std::fs::write(dir.join(&filename), &data));

            match written {
                Ok(()) => extracted += 1,
                Err(e) => {
                    failed += 1;
                    tracing::warn!("Failed to extract image {} ({}): {}", idx, drawing.coordinates, e);
                }
            }
        }

        tracing::info!("Extracted {} image(s) to: {}", extracted, dir.display());
        if failed > 0 {
            tracing::warn!("Failed to extract {} image(s)", failed);
        }

        Ok(ExtractionSummary {
            directory: dir.to_path_buf(),
            extracted,
            failed,
        })
    }
}

/// Occurrence counts that remember first-seen key order.
#[derive(Default)]
struct Buckets {
    index: HashMap<String, usize>,
    counts: Vec<BucketCount>,
}

impl Buckets {
    fn add(&mut self, key: String) {
        match self.index.get(&key) {
            Some(&pos) => self.counts[pos].count += 1,
            None => {
                self.index.insert(key.clone(), self.counts.len());
                self.counts.push(BucketCount { key, count: 1 });
            }
        }
    }

    fn len(&self) -> usize {
        self.counts.len()
    }

    fn into_counts(self) -> Vec<BucketCount> {
        self.counts
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::excel::types::DrawingSource;
    use bytes::Bytes;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::sync::Arc;

    fn memory(coordinates: &str, data: &'static [u8]) -> Drawing {
        Drawing::new(
            coordinates,
            DrawingSource::Memory {
                mime_type: "image/png".into(),
                render: Arc::new(move || Ok(Bytes::from_static(data))),
            },
        )
    }

    fn bucket(key: &str, count: usize) -> BucketCount {
        BucketCount { key: key.to_string(), count }
    }

    #[test]
    fn counts_by_column_and_distinct_rows() {
        let drawings = vec![
            memory("B2", b"x"),
            memory("B2", b"x"),
            memory("C2", b"x"),
            memory("AB12", b"x"),
            memory("???", b"x"),
        ];
        let report = ImageInventory.inventory(&drawings);

        assert_eq!(report.total, 5);
        assert_eq!(
            report.by_column,
            vec![bucket("B", 2), bucket("C", 1), bucket("AB", 1), bucket("Unknown", 1)]
        );
        assert_eq!(report.by_row, vec![bucket("2", 3), bucket("12", 1), bucket("Unknown", 1)]);
        assert_eq!(report.rows_with_images, 3);
    }

    #[test]
    fn empty_inventory() {
        let report = ImageInventory.inventory(&[]);
        assert_eq!(report.total, 0);
        assert_eq!(report.rows_with_images, 0);
        assert!(report.by_column.is_empty());
    }

    #[test]
    fn extraction_continues_after_failures() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("images");

        let broken = Drawing::new(
            "C3",
            DrawingSource::Memory {
                mime_type: "image/gif".into(),
                render: Arc::new(|| Err(io::Error::new(io::ErrorKind::Other, "render failed"))),
            },
        );
        let missing = Drawing::new("D4", DrawingSource::File(dir.path().join("missing.jpg")));
        let drawings = vec![memory("B2", b"one"), broken, missing, memory("E5", b"four")];

        let summary = ImageInventory.extract(&drawings, "Fotos 2024", &target).unwrap();

        assert_eq!(summary.extracted, 2);
        assert_eq!(summary.failed, 2);
        assert_eq!(std::fs::read(target.join("Fotos_2024_B2_001.png")).unwrap(), b"one");
        assert_eq!(std::fs::read(target.join("Fotos_2024_E5_004.png")).unwrap(), b"four");
        assert!(!target.join("Fotos_2024_C3_002.gif").exists());
    }

    #[test]
    fn file_backed_drawings_are_copied() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("photo.jpeg");
        std::fs::write(&source, b"jpeg-bytes").unwrap();

        let drawings = vec![Drawing::new("A1", DrawingSource::File(source))];
        let out = dir.path().join("out");
        let summary = ImageInventory.extract(&drawings, "Sheet1", &out).unwrap();

        assert_eq!(summary.extracted, 1);
        assert_eq!(std::fs::read(out.join("Sheet1_A1_001.jpeg")).unwrap(), b"jpeg-bytes");
    }

    #[test]
    fn details_are_capped() {
        let drawings: Vec<Drawing> = (1..=12).map(|i| memory(&format!("A{}", i), b"x")).collect();
        let details = ImageInventory.details(&drawings, DETAIL_SAMPLE_SIZE);
        assert_eq!(details.len(), 10);
        assert_eq!(details[9].coordinates, "A10");
    }
}
