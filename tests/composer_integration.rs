//! Requirements composition against an in-memory model service

use feature_gen::analyzer::{parse_components, AnalysisResult, BatchEntry};
use feature_gen::gateway::{MessageRole, MockModelService, MockReply, ModelGateway, RecordedCall};
use feature_gen::requirements::{
    ComposerError, OutputFormat, RequirementsComposer, TemplateStore, SYSTEM_PROMPT,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;

fn analysis(name: &str, raw: &str) -> AnalysisResult {
    AnalysisResult::new(Path::new(name), "llava", raw, parse_components(raw))
}

fn composer_with(mock: &Arc<MockModelService>, store: TemplateStore) -> RequirementsComposer {
    RequirementsComposer::new(Arc::new(ModelGateway::new(mock.clone())), store)
}

fn last_user_prompt(mock: &MockModelService) -> String {
    let chats = mock.chat_requests();
    let request = chats.last().expect("no chat request recorded");
    request
        .messages
        .iter()
        .find(|m| m.role == MessageRole::User)
        .map(|m| m.content.clone())
        .expect("no user message")
}

#[tokio::test]
async fn test_single_screen_uses_builtin_template() {
    let mock = Arc::new(MockModelService::with_models(["llama3:latest"]));
    mock.add_chat_reply(MockReply::text("# Login Requirements"));
    let composer = composer_with(&mock, TemplateStore::new(Vec::new()));

    let raw = "UI Components:\n- Email input\n- Sign in button";
    let login = analysis("login.png", raw);
    let document = composer
        .build_requirements(&login, "web_app", "llama3", OutputFormat::Markdown)
        .await
        .unwrap();

    assert_eq!(document, "# Login Requirements");

    let chats = mock.chat_requests();
    assert_eq!(chats[0].messages[0].role, MessageRole::System);
    assert_eq!(chats[0].messages[0].content, SYSTEM_PROMPT);

    let prompt = last_user_prompt(&mock);
    assert!(prompt.contains("**Image Analyzed**: login.png"));
    assert!(prompt.contains("- Sign in button"));
    assert!(prompt.contains("use Web Application format"));
}

#[tokio::test]
async fn test_unknown_template_falls_back_to_default_sections() {
    let mock = Arc::new(MockModelService::with_models(["llama3:latest"]));
    mock.add_chat_reply(MockReply::text("doc"));
    let composer = composer_with(&mock, TemplateStore::new(Vec::new()));

    composer
        .build_requirements(
            &analysis("home.png", "Layout:\n- Grid"),
            "does_not_exist",
            "llama3",
            OutputFormat::Json,
        )
        .await
        .unwrap();

    let prompt = last_user_prompt(&mock);
    for section in [
        "UI Components Overview",
        "Functional Requirements",
        "Technical Recommendations",
        "Implementation Guide",
    ] {
        let bullet = format!("- {section}");
        assert!(prompt.contains(&bullet), "missing {section}");
    }
    assert!(prompt.contains("structured json requirements"));
    assert!(!prompt.contains("**Recommended Tech Stack**"));
}

#[tokio::test]
async fn test_template_directory_shadows_builtin() {
    let temp = TempDir::new().unwrap();
    std::fs::write(
        temp.path().join("web_app.yaml"),
        "name: House Style\ndescription: Ours\nsections:\n  - Goals\n  - Screens\n",
    )
    .unwrap();

    let mock = Arc::new(MockModelService::with_models(["llama3:latest"]));
    mock.add_chat_reply(MockReply::text("doc"));
    let composer = composer_with(&mock, TemplateStore::new(vec![temp.path().to_path_buf()]));

    composer
        .build_requirements(
            &analysis("a.png", "text"),
            "web_app",
            "llama3",
            OutputFormat::Markdown,
        )
        .await
        .unwrap();

    let prompt = last_user_prompt(&mock);
    assert!(prompt.contains("use House Style format"));
    assert!(prompt.contains("- Goals\n- Screens\n"));
}

#[tokio::test]
async fn test_multi_screen_numbers_successful_entries() {
    let mock = Arc::new(MockModelService::with_models(["llama3:latest"]));
    mock.add_chat_reply(MockReply::text("# App"));
    let composer = composer_with(&mock, TemplateStore::new(Vec::new()));

    let entries = vec![
        BatchEntry::Analyzed(analysis("login.png", "Login form")),
        BatchEntry::Failed {
            image_path: PathBuf::from("broken.png"),
            error: "File not found: broken.png".to_string(),
        },
        BatchEntry::Analyzed(analysis("dashboard.png", "Charts")),
    ];

    composer
        .build_multi_screen_requirements(&entries, "dashboard", "llama3")
        .await
        .unwrap();

    let prompt = last_user_prompt(&mock);
    assert!(prompt.contains("Convert these 2 UI mockup analyses"));
    assert!(prompt.contains("### Screen 1: login.png\nLogin form"));
    assert!(prompt.contains("### Screen 2: dashboard.png\nCharts"));
    assert!(!prompt.contains("broken.png"));
    assert!(!prompt.contains("**Output Structure**"));
}

#[tokio::test]
async fn test_multi_screen_without_successes_fails() {
    let mock = Arc::new(MockModelService::with_models(["llama3:latest"]));
    let composer = composer_with(&mock, TemplateStore::new(Vec::new()));

    let entries = vec![BatchEntry::Failed {
        image_path: PathBuf::from("broken.png"),
        error: "boom".to_string(),
    }];

    let err = composer
        .build_multi_screen_requirements(&entries, "web_app", "llama3")
        .await
        .unwrap_err();
    assert!(matches!(err, ComposerError::NoAnalyses));
    assert_eq!(mock.generation_calls(), 0);
}

#[tokio::test]
async fn test_refine_embeds_document_and_feedback_verbatim() {
    let mock = Arc::new(MockModelService::with_models(["llama3:latest"]));
    mock.add_chat_reply(MockReply::text("# Refined"));
    let composer = composer_with(&mock, TemplateStore::new(Vec::new()));

    let document = "# Login\n\n## Functional Requirements\n- Users sign in with email\n";
    let feedback = "Add OAuth login with Google and GitHub";

    let refined = composer
        .refine_requirements(document, feedback, "llama3")
        .await
        .unwrap();

    assert_eq!(refined, "# Refined");
    let prompt = last_user_prompt(&mock);
    assert!(prompt.contains(document));
    assert!(prompt.contains(feedback));
}

#[tokio::test]
async fn test_missing_model_is_pulled_before_generation() {
    let mock = Arc::new(MockModelService::new());
    mock.add_chat_reply(MockReply::text("doc"));
    let composer = composer_with(&mock, TemplateStore::new(Vec::new()));

    composer
        .refine_requirements("doc", "shorter", "llama3")
        .await
        .unwrap();

    assert!(mock.calls().contains(&RecordedCall::Pull {
        model: "llama3".to_string()
    }));
}

#[test]
fn test_save_output_appends_extension_from_hint() {
    let temp = TempDir::new().unwrap();
    let mock = Arc::new(MockModelService::new());
    let composer = composer_with(&mock, TemplateStore::new(Vec::new()));

    let saved = composer
        .save_output("# Doc", &temp.path().join("requirements"), "markdown")
        .unwrap();
    assert_eq!(saved, temp.path().join("requirements.md"));
    assert_eq!(std::fs::read_to_string(&saved).unwrap(), "# Doc");

    let kept = composer
        .save_output("{}", &temp.path().join("notes.txt"), "json")
        .unwrap();
    assert_eq!(kept, temp.path().join("notes.txt"));

    let yaml = composer
        .save_output("a: 1", &temp.path().join("reqs"), "yaml")
        .unwrap();
    assert_eq!(yaml.extension().unwrap(), "yaml");
}

#[test]
fn test_save_output_into_missing_directory_fails() {
    let temp = TempDir::new().unwrap();
    let mock = Arc::new(MockModelService::new());
    let composer = composer_with(&mock, TemplateStore::new(Vec::new()));

    let err = composer
        .save_output("x", &temp.path().join("nope").join("out.md"), "markdown")
        .unwrap_err();
    assert!(matches!(err, ComposerError::Io { .. }));
}
