use crate::models::{CrossSheetSummary, ImageReport, Report, SheetIdentity, SheetReport};

/// Collects the fragments produced by each analysis stage into one report.
#[derive(Debug, Default)]
pub struct ReportBuilder {
    file: String,
    sheets: Vec<SheetIdentity>,
    selected_sheet: Option<SheetIdentity>,
    no_data: bool,
    analysis: Option<SheetReport>,
    images: Option<ImageReport>,
    cross_sheet: Option<CrossSheetSummary>,
}

impl ReportBuilder {
    pub fn new(file: impl Into<String>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    pub fn sheets(mut self, sheets: Vec<SheetIdentity>) -> Self {
        self.sheets = sheets;
        self
    }

    pub fn selected_sheet(mut self, sheet: SheetIdentity) -> Self {
        self.selected_sheet = Some(sheet);
        self
    }

    pub fn no_data(mut self) -> Self {
        self.no_data = true;
        self
    }

    pub fn analysis(mut self, analysis: Option<SheetReport>) -> Self {
        self.analysis = analysis;
        self
    }

    pub fn images(mut self, images: ImageReport) -> Self {
        self.images = Some(images);
        self
    }

    pub fn cross_sheet(mut self, summary: CrossSheetSummary) -> Self {
        self.cross_sheet = Some(summary);
        self
    }

    pub fn build(self) -> Report {
        Report {
            file: self.file,
            generated_at: chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            sheets: self.sheets,
            selected_sheet: self.selected_sheet,
            no_data: self.no_data,
            analysis: self.analysis,
            images: self.images,
            cross_sheet: self.cross_sheet,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_from_fragments() {
        let report = ReportBuilder::new("book.xlsx")
            .sheets(vec![SheetIdentity::new(1, "A"), SheetIdentity::new(2, "B")])
            .selected_sheet(SheetIdentity::new(2, "B"))
            .no_data()
            .build();

        assert_eq!(report.file, "book.xlsx");
        assert_eq!(report.sheets.len(), 2);
        assert_eq!(report.selected_sheet, Some(SheetIdentity::new(2, "B")));
        assert!(report.no_data);
        assert!(report.analysis.is_none());
        assert_eq!(report.generated_at.len(), "2024-01-01 00:00:00".len());
    }
}
