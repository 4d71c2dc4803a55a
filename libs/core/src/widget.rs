//! Widget lifecycle: construction, event dispatch, deferred work and teardown.
use std::{
    collections::BTreeSet,
    future::Future,
    sync::{
        Arc, Mutex as StdMutex, PoisonError,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use futures::{FutureExt, future::BoxFuture};
use thiserror::Error;
use tokio::{runtime::Handle, sync::Mutex, task::AbortHandle};
use tracing::{debug, error, info};

use crate::{
    config::{Config, Theme, WidgetOptions, normalize},
    controller::{Controller, Effect, Event},
    render::View,
    state::WidgetState,
    storage::{Persistence, SharedStore, memory_store},
    webhook::{HttpWebhookClient, SharedWebhookClient},
};

#[derive(Debug, Error)]
pub enum InitError {
    #[error("container element #{0} not found on the host page")]
    MissingContainer(String),
    #[error("chat widget must be initialised inside a tokio runtime")]
    NoRuntime,
}

/// Access to the embedding page.
pub trait HostPage: Send + Sync {
    fn has_element(&self, id: &str) -> bool;

    /// Places `text` on the visitor's clipboard.
    fn write_clipboard(&self, text: &str);
}

/// Host page with a fixed set of element ids. Clipboard writes are kept in memory.
#[derive(Debug, Clone, Default)]
pub struct StaticPage {
    element_ids: BTreeSet<String>,
    clipboard: Arc<StdMutex<Option<String>>>,
}

impl StaticPage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_element(mut self, id: impl Into<String>) -> Self {
        self.element_ids.insert(id.into());
        self
    }

    /// Last text written to the clipboard.
    pub fn clipboard(&self) -> Option<String> {
        self.clipboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl HostPage for StaticPage {
    fn has_element(&self, id: &str) -> bool {
        self.element_ids.contains(id)
    }

    fn write_clipboard(&self, text: &str) {
        *self
            .clipboard
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(text.to_string());
    }
}

/// Collaborators a widget needs from its environment.
#[derive(Clone)]
pub struct WidgetEnv {
    pub store: SharedStore,
    pub client: SharedWebhookClient,
    pub host: Arc<dyn HostPage>,
}

impl WidgetEnv {
    pub fn new(store: SharedStore, client: SharedWebhookClient, host: Arc<dyn HostPage>) -> Self {
        Self {
            store,
            client,
            host,
        }
    }

    pub fn with_store(mut self, store: SharedStore) -> Self {
        self.store = store;
        self
    }

    pub fn with_client(mut self, client: SharedWebhookClient) -> Self {
        self.client = client;
        self
    }

    pub fn with_host(mut self, host: Arc<dyn HostPage>) -> Self {
        self.host = host;
        self
    }
}

impl Default for WidgetEnv {
    fn default() -> Self {
        Self::new(
            memory_store(),
            Arc::new(HttpWebhookClient::default()),
            Arc::new(StaticPage::new()),
        )
    }
}

struct Shared {
    controller: Mutex<Controller>,
    client: SharedWebhookClient,
    host: Arc<dyn HostPage>,
    runtime: Handle,
    tasks: StdMutex<Vec<AbortHandle>>,
    closed: AtomicBool,
}

impl Shared {
    fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let handle = self.runtime.spawn(task).abort_handle();
        let mut tasks = self.tasks.lock().unwrap_or_else(PoisonError::into_inner);
        tasks.retain(|task| !task.is_finished());
        tasks.push(handle);
    }
}

/// One widget instance. Dropping it tears it down.
pub struct ChatWidget {
    shared: Arc<Shared>,
    config: Arc<Config>,
    session_id: String,
}

impl ChatWidget {
    /// Normalizes `options` against the built-in defaults and starts the widget.
    pub fn init(options: WidgetOptions, env: WidgetEnv) -> Result<Self, InitError> {
        Self::init_with_defaults(&Theme::default(), options, env)
    }

    pub fn init_with_defaults(
        defaults: &Theme,
        options: WidgetOptions,
        env: WidgetEnv,
    ) -> Result<Self, InitError> {
        let runtime = Handle::try_current().map_err(|_| InitError::NoRuntime)?;
        let config = Arc::new(normalize(defaults, options));

        if config.is_inline() && !env.host.has_element(&config.container_id) {
            error!(
                container_id = %config.container_id,
                "inline container not found; widget not rendered"
            );
            return Err(InitError::MissingContainer(config.container_id.clone()));
        }
        for key in config.unknown_options() {
            debug!(option = key, "unknown theme option kept as extra");
        }

        let (controller, effects) =
            Controller::new(Arc::clone(&config), Persistence::new(env.store));
        let session_id = controller.session_id().to_string();
        let shared = Arc::new(Shared {
            controller: Mutex::new(controller),
            client: env.client,
            host: env.host,
            runtime,
            tasks: StdMutex::new(Vec::new()),
            closed: AtomicBool::new(false),
        });
        for effect in effects {
            run_effect(&shared, effect);
        }

        Ok(Self {
            shared,
            config,
            session_id,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Applies `event` and starts any deferred work it asks for.
    pub async fn dispatch(&self, event: Event) {
        dispatch(Arc::clone(&self.shared), event).await;
    }

    /// Sends `text` as the visitor. Returns once the request is issued, not answered.
    pub async fn send(&self, text: impl Into<String>) {
        self.dispatch(Event::Send(text.into())).await;
    }

    pub async fn toggle(&self) {
        self.dispatch(Event::Toggle).await;
    }

    pub async fn clear_chat(&self) {
        self.dispatch(Event::ClearChat).await;
    }

    /// Reconciles with storage after the page is restored from the back-forward cache.
    pub async fn resume(&self) {
        self.dispatch(Event::Resumed).await;
    }

    pub async fn view(&self) -> View {
        self.shared.controller.lock().await.view()
    }

    pub async fn snapshot(&self) -> WidgetState {
        self.shared.controller.lock().await.state().clone()
    }

    /// Spawned tasks that have not finished yet.
    pub fn active_tasks(&self) -> usize {
        let tasks = self
            .shared
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        tasks.iter().filter(|task| !task.is_finished()).count()
    }

    pub fn is_torn_down(&self) -> bool {
        self.shared.closed.load(Ordering::SeqCst)
    }

    /// Aborts pending timers and in-flight deliveries. Later events are ignored.
    pub fn teardown(&self) {
        if self.shared.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut tasks = self
            .shared
            .tasks
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let aborted = tasks.len();
        for task in tasks.drain(..) {
            task.abort();
        }
        if let Ok(mut controller) = self.shared.controller.try_lock() {
            controller.invalidate();
        }
        info!(session_id = %self.session_id, aborted, "widget torn down");
    }
}

impl Drop for ChatWidget {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn dispatch(shared: Arc<Shared>, event: Event) -> BoxFuture<'static, ()> {
    async move {
        if shared.closed.load(Ordering::SeqCst) {
            debug!(?event, "event ignored after teardown");
            return;
        }
        let effects = shared.controller.lock().await.handle(event);
        for effect in effects {
            run_effect(&shared, effect);
        }
    }
    .boxed()
}

fn run_effect(shared: &Arc<Shared>, effect: Effect) {
    match effect {
        Effect::ScheduleAutoOpen(delay) => schedule(shared, delay, Event::AutoOpenElapsed),
        Effect::ScheduleFocus(delay) => schedule(shared, delay, Event::AutoFocusElapsed),
        Effect::CopyToClipboard(text) => {
            shared.host.write_clipboard(&text);
            debug!(length = text.chars().count(), "message copied to clipboard");
        }
        Effect::Deliver(delivery) => {
            let task_shared = Arc::clone(shared);
            shared.spawn(async move {
                debug!(request_id = delivery.request_id, endpoint = %delivery.endpoint, "delivering message");
                let outcome = task_shared
                    .client
                    .post(&delivery.endpoint, &delivery.payload)
                    .await;
                dispatch(
                    task_shared,
                    Event::ReplyReceived {
                        request_id: delivery.request_id,
                        outcome,
                    },
                )
                .await;
            });
        }
    }
}

fn schedule(shared: &Arc<Shared>, delay: Duration, event: Event) {
    let task_shared = Arc::clone(shared);
    shared.spawn(async move {
        tokio::time::sleep(delay).await;
        dispatch(task_shared, event).await;
    });
}
