//! End-to-end acquisition against a scripted session

use pretty_assertions::assert_eq;
use rishah_core::{
    AcquireError, ArtifactAcquisition, CollectMode, GenerationReport, GenerationRequest, OutputStyle,
    SessionEvent, SingleReport,
};
use rishah_test_utils::{output_dir_from_prompt, setup_dirs, FakeSessionFactory};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const SVG: &str = r#"<svg xmlns="http://www.w3.org/2000/svg"><rect/></svg>"#;

fn request(source: PathBuf, output: PathBuf, style: OutputStyle) -> GenerationRequest {
    GenerationRequest::new(Some(source), Some(output), style).unwrap()
}

#[tokio::test]
async fn svg_style_reads_canonical_file() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new().with_file("generated.svg", SVG);
    let counters = factory.counters();

    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output.clone(), OutputStyle::Svg))
        .await
        .unwrap();

    assert_eq!(
        GenerationReport::from_result(&result),
        GenerationReport::Single(SingleReport {
            success: true,
            content: SVG.into(),
            style: "svg".into(),
            is_svg: true,
            file_name: "generated.svg".into(),
        })
    );
    assert_eq!(result.files(), vec![output.join("generated.svg").as_path()]);
    assert_eq!((counters.created(), counters.destroyed(), counters.stopped()), (1, 1, 1));
}

#[tokio::test]
async fn output_directory_is_created() {
    let (_root, source, output) = setup_dirs();
    let nested = output.join("a").join("b");
    assert!(!nested.exists());

    ArtifactAcquisition::new(Arc::new(FakeSessionFactory::new()))
        .acquire(&request(source, nested.clone(), OutputStyle::Description))
        .await
        .unwrap();

    assert!(nested.is_dir());
}

#[tokio::test]
async fn mermaid_reads_mmd_as_non_vector() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new().with_file("generated.mmd", "flowchart LR\n  A --> B");

    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output, OutputStyle::Mermaid))
        .await
        .unwrap();

    assert_eq!(
        GenerationReport::from_result(&result),
        GenerationReport::Single(SingleReport {
            success: true,
            content: "flowchart LR\n  A --> B".into(),
            style: "mermaid".into(),
            is_svg: false,
            file_name: "generated.mmd".into(),
        })
    );
}

#[tokio::test]
async fn mermaid_prefers_mmd_over_md() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new()
        .with_file("generated.md", "```mermaid\ngraph TD\n```")
        .with_file("generated.mmd", "graph TD\n  A --> B");

    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output, OutputStyle::Mermaid))
        .await
        .unwrap();

    let primary = result.primary().unwrap();
    assert_eq!(primary.file_name(), "generated.mmd");
    assert_eq!(primary.text(), Some("graph TD\n  A --> B"));
    assert_eq!(result.effective_style, OutputStyle::Mermaid);
}

#[tokio::test]
async fn mermaid_falls_back_to_svg() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new().with_file("generated.svg", SVG);

    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output, OutputStyle::Mermaid))
        .await
        .unwrap();

    assert_eq!(result.requested_style, OutputStyle::Mermaid);
    assert_eq!(result.effective_style, OutputStyle::Svg);
    match GenerationReport::from_result(&result) {
        GenerationReport::Single(report) => {
            assert_eq!(report.style, "svg");
            assert!(report.is_svg);
        }
        other => panic!("expected single report, got {other:?}"),
    }
}

#[tokio::test]
async fn description_is_not_vector() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new().with_file("generated.txt", "A box pointing at a circle.");

    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output, OutputStyle::Description))
        .await
        .unwrap();

    let primary = result.primary().unwrap();
    assert!(!primary.is_vector());
    assert_eq!(primary.text(), Some("A box pointing at a circle."));
}

#[tokio::test]
async fn unexpected_name_uses_first_listed_file() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new()
        .with_file("zeta.txt", "notes")
        .with_file("flow.svg", SVG);

    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output, OutputStyle::Sketch))
        .await
        .unwrap();

    let primary = result.primary().unwrap();
    assert_eq!(primary.file_name(), "flow.svg");
    assert!(primary.is_vector());
    assert_eq!(result.effective_style, OutputStyle::Sketch);
}

#[tokio::test]
async fn hidden_files_are_not_artifacts() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new()
        .with_file(".DS_Store", "finder metadata")
        .with_file("flow.svg", SVG);

    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output, OutputStyle::Sketch))
        .await
        .unwrap();

    assert_eq!(result.artifacts.len(), 1);
    assert_eq!(result.primary().unwrap().file_name(), "flow.svg");
}

#[tokio::test]
async fn empty_output_is_successful_empty_result() {
    let (_root, source, output) = setup_dirs();

    let result = ArtifactAcquisition::new(Arc::new(FakeSessionFactory::new()))
        .acquire(&request(source, output, OutputStyle::Clean))
        .await
        .unwrap();

    assert!(result.is_empty());
    let report = GenerationReport::from_result(&result);
    assert!(report.is_success());
    assert_eq!(
        report.to_json_line(),
        r#"{"success":true,"content":"","style":"clean","isSvg":false,"fileName":""}"#
    );
}

#[tokio::test]
async fn all_style_lists_every_file() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new()
        .with_file("recreation.svg", SVG)
        .with_file("description.txt", "A flowchart.")
        .with_file("diagram.md", "```mermaid\ngraph LR\n```");

    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output.clone(), OutputStyle::All))
        .await
        .unwrap();

    assert_eq!(result.collect_mode, CollectMode::ListOnly);
    assert!(result.artifacts.iter().all(|a| a.text().is_none()));
    assert_eq!(
        GenerationReport::from_result(&result),
        GenerationReport::Multi(rishah_core::MultiReport {
            success: true,
            files: ["description.txt", "diagram.md", "recreation.svg"]
                .iter()
                .map(|name| output.join(name).display().to_string())
                .collect(),
            output_dir: output.display().to_string(),
        })
    );
}

#[tokio::test]
async fn list_only_can_be_requested_for_single_styles() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new().with_file("generated.svg", SVG);

    let request = request(source, output, OutputStyle::Svg).with_collect_mode(CollectMode::ListOnly);
    let result = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request)
        .await
        .unwrap();

    assert!(matches!(GenerationReport::from_result(&result), GenerationReport::Multi(_)));
}

#[tokio::test]
async fn prompt_names_source_and_absolute_output() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new();
    let counters = factory.counters();

    ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source.clone(), output.clone(), OutputStyle::Detailed))
        .await
        .unwrap();

    let prompts = counters.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains(&source.display().to_string()));
    assert!(prompts[0].contains("detailed style"));
    assert_eq!(output_dir_from_prompt(&prompts[0]), Some(output));
}

#[tokio::test]
async fn missing_source_opens_no_session() {
    let (root, _source, output) = setup_dirs();
    let factory = FakeSessionFactory::new();
    let counters = factory.counters();

    let err = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(root.path().join("nope.png"), output.clone(), OutputStyle::Svg))
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::NotFound(_)));
    assert!(err.is_precondition());
    assert_eq!((counters.created(), counters.stopped()), (0, 0));
    assert!(!output.exists());
}

#[tokio::test]
async fn session_failure_tears_down() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new().with_file("generated.svg", SVG).failing_send();
    let counters = factory.counters();

    let err = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output.clone(), OutputStyle::Svg))
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::Session(_)));
    assert_eq!((counters.destroyed(), counters.stopped()), (1, 1));
    assert!(!output.join("generated.svg").exists());

    let report = GenerationReport::from_error(&err);
    assert_eq!(report.exit_code(), 1);
    match report {
        GenerationReport::Failure(f) => assert!(f.error.starts_with("Failed to generate image: ")),
        other => panic!("expected failure report, got {other:?}"),
    }
}

#[tokio::test]
async fn create_failure_still_stops_client() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new().failing_create();
    let counters = factory.counters();

    let err = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output, OutputStyle::Svg))
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::Session(_)));
    assert_eq!((counters.created(), counters.destroyed(), counters.stopped()), (0, 0, 1));
}

#[tokio::test]
async fn destroy_failure_is_reported_after_stop() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new().with_file("generated.svg", SVG).failing_destroy();
    let counters = factory.counters();

    let err = ArtifactAcquisition::new(Arc::new(factory))
        .acquire(&request(source, output, OutputStyle::Svg))
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::Session(_)));
    assert_eq!((counters.destroyed(), counters.stopped()), (1, 1));
}

#[tokio::test]
async fn hung_session_times_out() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new()
        .with_file("generated.svg", SVG)
        .with_delay(Duration::from_secs(30));
    let counters = factory.counters();

    let err = ArtifactAcquisition::new(Arc::new(factory))
        .with_timeout(Some(Duration::from_millis(50)))
        .acquire(&request(source, output.clone(), OutputStyle::Svg))
        .await
        .unwrap_err();

    assert!(matches!(err, AcquireError::Timeout { .. }));
    assert_eq!((counters.destroyed(), counters.stopped()), (1, 1));
    assert!(!output.join("generated.svg").exists());
}

#[tokio::test]
async fn progress_sees_tool_events() {
    let (_root, source, output) = setup_dirs();
    let factory = FakeSessionFactory::new()
        .with_tool("view")
        .with_event(SessionEvent::Message {
            content: "Looking at the sketch".into(),
        })
        .with_tool("create_file")
        .with_file("generated.svg", SVG);

    let tools = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&tools);

    ArtifactAcquisition::new(Arc::new(factory))
        .with_progress(Arc::new(move |event: &SessionEvent| {
            if let SessionEvent::ToolExecutionStart { tool_name } = event {
                sink.lock().unwrap().push(tool_name.clone());
            }
        }))
        .acquire(&request(source, output, OutputStyle::Svg))
        .await
        .unwrap();

    assert_eq!(*tools.lock().unwrap(), vec!["view", "create_file"]);
}
