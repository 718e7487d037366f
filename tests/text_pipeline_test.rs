use flat_etl::adapters::{FileSink, LineSource};
use flat_etl::app::pipelines::text_pipeline;
use flat_etl::core::{Loader, RecordSource, SinkProvisioner, Transformer, Uppercase, Verifier};
use flat_etl::domain::model::{Provisioning, TextLine};
use flat_etl::{EtlError, PipelineState};
use proptest::prelude::*;
use tempfile::TempDir;

fn text_lines(lines: &[String]) -> Vec<TextLine> {
    lines
        .iter()
        .enumerate()
        .map(|(i, text)| TextLine {
            line: i as u64 + 1,
            text: text.clone(),
        })
        .collect()
}

#[test]
fn test_scenario_uppercase_file_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("raw.txt");
    let output = temp_dir.path().join("processed.txt");
    std::fs::write(&source, "hello world\nhappy new year\n").unwrap();

    let mut pipeline = text_pipeline("scenario-a", &source, &output);
    let report = pipeline.run().unwrap();

    assert_eq!(pipeline.state(), PipelineState::Done);
    assert_eq!(report.records_extracted, 2);
    assert!(report.load.confirmed);
    assert!(report.verification.is_match());
    assert_eq!(report.verification.checked, 2);

    let read_back: Vec<String> = LineSource::new(&output)
        .read_records()
        .unwrap()
        .into_iter()
        .map(|l| l.text)
        .collect();
    assert_eq!(read_back, vec!["HELLO WORLD", "HAPPY NEW YEAR"]);
}

#[test]
fn test_missing_source_fails_while_extracting() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("processed.txt");

    let mut pipeline = text_pipeline("missing", temp_dir.path().join("raw.txt"), &output);
    let failure = pipeline.run().unwrap_err();

    assert_eq!(failure.stage, PipelineState::Extracting);
    assert!(matches!(failure.source, EtlError::SourceNotFound { .. }));
    assert_eq!(pipeline.state(), PipelineState::Failed);
    assert!(!output.exists());
}

#[test]
fn test_rerun_overwrites_output() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("raw.txt");
    let output = temp_dir.path().join("processed.txt");

    std::fs::write(&source, "first\nsecond\nthird\n").unwrap();
    let mut pipeline = text_pipeline("rerun", &source, &output);
    pipeline.run().unwrap();

    std::fs::write(&source, "only\n").unwrap();
    pipeline.reset().unwrap();
    pipeline.run().unwrap();

    assert_eq!(std::fs::read_to_string(&output).unwrap(), "ONLY\n");
}

#[test]
fn test_trailing_carriage_return_round_trips() {
    let temp_dir = TempDir::new().unwrap();
    let source = temp_dir.path().join("raw.txt");
    let output = temp_dir.path().join("processed.txt");
    std::fs::write(&source, "hello world\r\nold mac line\r").unwrap();

    let mut pipeline = text_pipeline("carriage-return", &source, &output);
    let report = pipeline.run().unwrap();

    assert_eq!(pipeline.state(), PipelineState::Done);
    assert!(report.verification.is_match());
    assert_eq!(
        std::fs::read_to_string(&output).unwrap(),
        "HELLO WORLD\nOLD MAC LINE\n"
    );
}

#[test]
fn test_file_sink_provisioning_is_idempotent() {
    let temp_dir = TempDir::new().unwrap();
    let output = temp_dir.path().join("processed.txt");
    let sink = FileSink::new(&output);

    let first = sink.provision().unwrap();
    let second = sink.provision().unwrap();

    assert_eq!(first, Provisioning::none_required());
    assert_eq!(first, second);
    assert!(!output.exists());

    std::fs::write(&output, "KEEP\n").unwrap();
    assert_eq!(sink.provision().unwrap(), Provisioning::none_required());
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "KEEP\n");
}

proptest! {
    #[test]
    fn prop_file_round_trip(lines in prop::collection::vec("[a-zA-Z0-9 ,.!ßé]{0,24}", 0..16)) {
        let temp_dir = TempDir::new().unwrap();
        let sink = FileSink::new(temp_dir.path().join("out.txt"));

        let transformed: Vec<String> = text_lines(&lines)
            .into_iter()
            .map(|line| Uppercase.transform(line).unwrap())
            .collect();
        sink.load(&transformed).unwrap();

        let read_back: Vec<String> = LineSource::new(sink.path())
            .read_records()
            .unwrap()
            .into_iter()
            .map(|l| l.text)
            .collect();
        prop_assert_eq!(&read_back, &transformed);
        prop_assert!(sink.verify(&transformed).unwrap().is_match());
    }

    #[test]
    fn prop_transform_preserves_order_and_is_deterministic(
        lines in prop::collection::vec("[a-z ]{0,12}", 0..32)
    ) {
        let first: Vec<String> = text_lines(&lines)
            .into_iter()
            .map(|line| Uppercase.transform(line).unwrap())
            .collect();
        let second: Vec<String> = text_lines(&lines)
            .into_iter()
            .map(|line| Uppercase.transform(line).unwrap())
            .collect();

        prop_assert_eq!(&first, &second);
        prop_assert_eq!(first.len(), lines.len());
        for (input, output) in lines.iter().zip(first.iter()) {
            prop_assert_eq!(&input.to_uppercase(), output);
        }
    }
}
