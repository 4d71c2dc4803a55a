use std::{sync::Arc, time::Duration};

use chatwidget_core::{
    ChatWidget, Event, InitError, KeyValueStore, MemoryStore, Message, Mount, Persistence, StaticPage,
    WidgetEnv, WidgetOptions,
    testkit::ScriptedWebhookClient,
    webhook::ISSUE_MESSAGE,
};
use serde_json::{Value, json};
use tracing_test::traced_test;

const WELCOME: &str = "Hello! How can I help you today?";

fn options(extra: Value) -> WidgetOptions {
    let mut base = json!({
        "chatbotId": "bot-1",
        "routingUrl": "https://route.example/functions/v1/chat",
        "metadata": { "page": "pricing" },
    });
    if let (Some(base), Some(extra)) = (base.as_object_mut(), extra.as_object()) {
        for (key, value) in extra {
            base.insert(key.clone(), value.clone());
        }
    }
    serde_json::from_value(base).expect("valid options")
}

fn env(store: Arc<MemoryStore>, client: Arc<ScriptedWebhookClient>) -> WidgetEnv {
    WidgetEnv::default().with_store(store).with_client(client)
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(10)).await;
}

fn contents(messages: &[Message]) -> Vec<String> {
    messages.iter().map(|m| m.content.clone()).collect()
}

#[tokio::test(start_paused = true)]
async fn auto_open_fires_after_delay_and_persists() {
    let store = Arc::new(MemoryStore::new());
    let client = Arc::new(ScriptedWebhookClient::new());
    let widget = ChatWidget::init(
        options(json!({ "theme": { "autoOpenBot": true, "openDelay": 2 } })),
        env(store.clone(), client),
    )
    .unwrap();

    assert!(!widget.snapshot().await.open);
    tokio::time::sleep(Duration::from_millis(1_999)).await;
    assert!(!widget.snapshot().await.open);
    tokio::time::sleep(Duration::from_millis(2)).await;
    assert!(widget.snapshot().await.open);

    let key = format!("chatbot_open_{}", widget.session_id());
    assert_eq!(store.get(&key).unwrap().as_deref(), Some("true"));
}

#[tokio::test(start_paused = true)]
async fn persisted_close_beats_auto_open() {
    let store = Arc::new(MemoryStore::new());
    let persistence = Persistence::new(store.clone());
    let session_id = persistence.get_or_create_session("bot-1");
    persistence.set_open_state(&session_id, false);

    let widget = ChatWidget::init(
        options(json!({ "theme": { "autoOpenBot": true, "openDelay": 1 } })),
        env(store, Arc::new(ScriptedWebhookClient::new())),
    )
    .unwrap();
    assert_eq!(widget.session_id(), session_id);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(!widget.snapshot().await.open);
}

#[tokio::test(start_paused = true)]
async fn hello_gets_hi() {
    let client = Arc::new(ScriptedWebhookClient::new().reply("Hi!"));
    let widget = ChatWidget::init(
        options(json!({})),
        env(Arc::new(MemoryStore::new()), client.clone()),
    )
    .unwrap();

    widget.send("Hello").await;
    settle().await;

    let state = widget.snapshot().await;
    assert_eq!(state.messages, vec![
        Message::bot(WELCOME),
        Message::user("Hello"),
        Message::bot("Hi!"),
    ]);

    let requests = client.requests();
    assert_eq!(requests.len(), 1);
    let (endpoint, payload) = &requests[0];
    assert_eq!(endpoint, "https://route.example/functions/v1/chat/bot-1");
    assert_eq!(
        payload,
        &json!({ "chatInput": "Hello", "sessionId": widget.session_id(), "page": "pricing" })
    );
}

#[tokio::test(start_paused = true)]
async fn server_error_shows_custom_message() {
    let client = Arc::new(ScriptedWebhookClient::new().status(500));
    let widget = ChatWidget::init(
        options(json!({ "theme": { "customErrorMessage": "Try again later." } })),
        env(Arc::new(MemoryStore::new()), client),
    )
    .unwrap();

    widget.send("Hello").await;
    settle().await;
    assert_eq!(
        contents(&widget.snapshot().await.messages),
        vec![WELCOME, "Hello", "Try again later."]
    );
}

#[tokio::test(start_paused = true)]
async fn reply_without_output_shows_issue_message() {
    let client = Arc::new(ScriptedWebhookClient::new().reply_without_output());
    let widget = ChatWidget::init(
        options(json!({})),
        env(Arc::new(MemoryStore::new()), client),
    )
    .unwrap();

    widget.send("Hello").await;
    settle().await;
    let state = widget.snapshot().await;
    assert_eq!(state.messages[2].content, ISSUE_MESSAGE);
}

#[tokio::test(start_paused = true)]
async fn only_latest_reply_is_applied() {
    let client = Arc::new(
        ScriptedWebhookClient::new()
            .reply_after(Duration::from_secs(5), "slow")
            .reply("fast"),
    );
    let widget = ChatWidget::init(
        options(json!({})),
        env(Arc::new(MemoryStore::new()), client),
    )
    .unwrap();

    widget.send("one").await;
    widget.send("two").await;
    settle().await;
    let state = widget.snapshot().await;
    assert_eq!(contents(&state.messages), vec![WELCOME, "one", "two", "fast"]);

    tokio::time::sleep(Duration::from_secs(10)).await;
    let state = widget.snapshot().await;
    assert_eq!(contents(&state.messages), vec![WELCOME, "one", "two", "fast"]);
    assert!(state.messages.iter().all(|m| !m.thinking));
}

#[tokio::test(start_paused = true)]
async fn reload_restores_session_and_history() {
    let store = Arc::new(MemoryStore::new());
    let first = ChatWidget::init(
        options(json!({})),
        env(
            store.clone(),
            Arc::new(ScriptedWebhookClient::new().reply("Hi!")),
        ),
    )
    .unwrap();
    first.toggle().await;
    first.send("Hello").await;
    settle().await;
    let session_id = first.session_id().to_string();
    drop(first);

    let second = ChatWidget::init(
        options(json!({})),
        env(store, Arc::new(ScriptedWebhookClient::new())),
    )
    .unwrap();
    assert_eq!(second.session_id(), session_id);
    let state = second.snapshot().await;
    assert!(state.open);
    assert_eq!(contents(&state.messages), vec![WELCOME, "Hello", "Hi!"]);
}

#[tokio::test(start_paused = true)]
async fn resume_picks_up_changes_made_while_suspended() {
    let store = Arc::new(MemoryStore::new());
    let widget = ChatWidget::init(
        options(json!({})),
        env(store.clone(), Arc::new(ScriptedWebhookClient::new())),
    )
    .unwrap();

    let persistence = Persistence::new(store);
    persistence.set_open_state(widget.session_id(), true);
    persistence.save_messages(
        widget.session_id(),
        &[Message::bot(WELCOME), Message::user("elsewhere")],
    );

    widget.resume().await;
    let state = widget.snapshot().await;
    assert!(state.open);
    assert_eq!(contents(&state.messages), vec![WELCOME, "elsewhere"]);
}

#[tokio::test(start_paused = true)]
async fn clear_chat_keeps_open_state() {
    let widget = ChatWidget::init(
        options(json!({})),
        env(
            Arc::new(MemoryStore::new()),
            Arc::new(ScriptedWebhookClient::new().reply("Hi!")),
        ),
    )
    .unwrap();
    widget.toggle().await;
    widget.send("Hello").await;
    settle().await;
    widget.clear_chat().await;

    let state = widget.snapshot().await;
    assert!(state.open);
    assert_eq!(contents(&state.messages), vec![WELCOME]);
}

#[tokio::test(start_paused = true)]
async fn teardown_aborts_pending_work() {
    let client = Arc::new(ScriptedWebhookClient::new().reply_after(Duration::from_secs(30), "late"));
    let widget = ChatWidget::init(
        options(json!({ "theme": { "autoOpenBot": true, "openDelay": 10 } })),
        env(Arc::new(MemoryStore::new()), client),
    )
    .unwrap();
    widget.send("Hello").await;
    assert_eq!(widget.active_tasks(), 2);

    widget.teardown();
    assert!(widget.is_torn_down());
    assert_eq!(widget.active_tasks(), 0);

    tokio::time::sleep(Duration::from_secs(60)).await;
    let state = widget.snapshot().await;
    assert!(!state.open);
    assert_eq!(state.messages.len(), 3);
    assert!(state.messages[2].thinking);

    widget.toggle().await;
    assert!(!widget.snapshot().await.open);
}

#[tokio::test]
#[traced_test]
async fn inline_mode_requires_container() {
    let result = ChatWidget::init(
        options(json!({ "mode": "inpage" })),
        WidgetEnv::default(),
    );
    assert!(matches!(
        result,
        Err(InitError::MissingContainer(ref id)) if id == "chatbot-container"
    ));
    assert!(logs_contain("inline container not found"));

    let host = Arc::new(StaticPage::new().with_element("help-pane"));
    let widget = ChatWidget::init(
        options(json!({ "mode": "inpage", "containerId": "help-pane" })),
        WidgetEnv::default().with_host(host),
    )
    .unwrap();
    let view = widget.view().await;
    assert_eq!(view.mount, Mount::Host("help-pane".into()));
    assert!(widget.snapshot().await.open);
}

#[test]
fn init_outside_runtime_fails() {
    let result = ChatWidget::init(options(json!({})), WidgetEnv::default());
    assert!(matches!(result, Err(InitError::NoRuntime)));
}

#[tokio::test(start_paused = true)]
async fn copy_button_writes_reply_to_clipboard() {
    let host = Arc::new(StaticPage::new());
    let client = Arc::new(ScriptedWebhookClient::new().reply("Hi!"));
    let widget = ChatWidget::init(
        options(json!({ "theme": { "showCopyToClipboard": true } })),
        env(Arc::new(MemoryStore::new()), client).with_host(host.clone()),
    )
    .unwrap();

    widget.send("Hello").await;
    settle().await;
    widget.dispatch(Event::CopyClicked(1)).await;
    assert_eq!(host.clipboard(), None);
    widget.dispatch(Event::CopyClicked(2)).await;
    assert_eq!(host.clipboard().as_deref(), Some("Hi!"));
}
