#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::fs;

    use cardapio_kb::backend::{OcrEngine, PageSource};
    use cardapio_kb::checkpoint::Checkpoint;
    use cardapio_kb::config::{OcrConfig, PathsConfig};
    use cardapio_kb::errors::{PipelineError, PipelineResult};
    use cardapio_kb::model::{ExtractionDocument, PageRecord, Table};
    use cardapio_kb::output::read_json;
    use cardapio_kb::runs::run_batches;

    /// Scanned document: no text layer, every page has an image
    struct ScannedPdf {
        pages: u32,
    }

    impl PageSource for ScannedPdf {
        fn page_count(&self) -> u32 {
            self.pages
        }

        fn extract_page_text(&self, _page: u32) -> PipelineResult<String> {
            Ok(String::new())
        }

        fn extract_tables(&self, _page: u32) -> PipelineResult<Vec<Table>> {
            Ok(Vec::new())
        }

        fn has_images(&self, _page: u32) -> bool {
            true
        }

        fn page_image(&self, page: u32) -> PipelineResult<Vec<u8>> {
            Ok(vec![page as u8])
        }
    }

    /// Counts calls and fails on one chosen page
    struct CountingOcr {
        calls: Cell<usize>,
        seen_page_5: Cell<bool>,
        failing_page: Option<u8>,
    }

    impl CountingOcr {
        fn new(failing_page: Option<u8>) -> Self {
            Self {
                calls: Cell::new(0),
                seen_page_5: Cell::new(false),
                failing_page,
            }
        }
    }

    impl OcrEngine for CountingOcr {
        fn name(&self) -> &str {
            "counting"
        }

        fn ocr_image(&self, image: &[u8]) -> PipelineResult<String> {
            self.calls.set(self.calls.get() + 1);
            if image[0] == 5 {
                self.seen_page_5.set(true);
            }
            if Some(image[0]) == self.failing_page {
                return Err(PipelineError::Ocr("engine crashed".to_string()));
            }
            Ok(format!("Almoço\nArroz {}0g\n", image[0]))
        }
    }

    fn seeded_checkpoint(paths: &PathsConfig) -> Checkpoint {
        let mut checkpoint = Checkpoint::load(&paths.checkpoint()).unwrap();
        checkpoint.insert(PageRecord {
            ocr_applied: true,
            ..PageRecord::new(5, "Página cinco já processada")
        });
        checkpoint.save(Default::default()).unwrap();
        Checkpoint::load(&paths.checkpoint()).unwrap()
    }

    #[test]
    fn test_checkpointed_page_is_never_reprocessed() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig::new(dir.path());
        let mut checkpoint = seeded_checkpoint(&paths);

        let ocr = CountingOcr::new(None);
        let doc = run_batches(
            &ScannedPdf { pages: 191 },
            &ocr,
            &mut checkpoint,
            1..=10,
            10,
            &OcrConfig::default(),
        )
        .unwrap();

        assert!(!ocr.seen_page_5.get());
        assert_eq!(ocr.calls.get(), 9);
        let page5 = doc.pages.iter().find(|p| p.number == 5).unwrap();
        assert_eq!(page5.text, "Página cinco já processada");
    }

    #[test]
    fn test_checkpoint_written_after_each_batch() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig::new(dir.path());
        let mut checkpoint = Checkpoint::load(&paths.checkpoint()).unwrap();

        let ocr = CountingOcr::new(None);
        run_batches(
            &ScannedPdf { pages: 30 },
            &ocr,
            &mut checkpoint,
            1..=25,
            10,
            &OcrConfig::default(),
        )
        .unwrap();

        let saved: ExtractionDocument = read_json(&paths.checkpoint()).unwrap();
        assert_eq!(saved.pages.len(), 25);
        assert_eq!(saved.total_pages, 25);
        assert_eq!(saved.metadata.pages_processed, Some(25));
        assert_eq!(saved.metadata.total_chars, saved.total_chars());

        // only the checkpoint file remains in the data directory
        let names: Vec<String> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["extracao_progresso.json"]);
    }

    #[test]
    fn test_resume_after_interrupted_run() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig::new(dir.path());

        let mut first = Checkpoint::load(&paths.checkpoint()).unwrap();
        run_batches(&ScannedPdf { pages: 40 }, &CountingOcr::new(None), &mut first, 1..=20, 10, &OcrConfig::default())
            .unwrap();

        let mut resumed = Checkpoint::load(&paths.checkpoint()).unwrap();
        let ocr = CountingOcr::new(None);
        let doc = run_batches(&ScannedPdf { pages: 40 }, &ocr, &mut resumed, 1..=40, 10, &OcrConfig::default())
            .unwrap();

        assert_eq!(ocr.calls.get(), 20);
        assert_eq!(doc.pages.len(), 40);
        let numbers: Vec<u32> = doc.pages.iter().map(|p| p.number).collect();
        assert_eq!(numbers, (1..=40).collect::<Vec<u32>>());
    }

    #[test]
    fn test_ocr_failure_becomes_marker_and_run_continues() {
        let dir = tempfile::tempdir().unwrap();
        let paths = PathsConfig::new(dir.path());
        let mut checkpoint = Checkpoint::load(&paths.checkpoint()).unwrap();

        let ocr = CountingOcr::new(Some(3));
        let doc = run_batches(&ScannedPdf { pages: 5 }, &ocr, &mut checkpoint, 1..=5, 10, &OcrConfig::default())
            .unwrap();

        assert_eq!(doc.pages.len(), 5);
        assert!(doc.pages[2].text.starts_with("[ERRO OCR: "));
        assert!(doc.pages[2].text.contains("engine crashed"));
        assert!(doc.pages[3].text.starts_with("Almoço"));
    }
}
