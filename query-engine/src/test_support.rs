//! In-process gateway for pipeline tests.

use std::sync::{
    Arc,
    atomic::{AtomicBool, AtomicUsize, Ordering},
};

use ai_llm_service::{
    AiLlmError, FragmentStream, ModelGateway, ProviderError, ProviderErrorKind,
    config::llm_provider::LlmProvider, error_handler::Result,
};
use async_trait::async_trait;
use futures::{StreamExt, stream};

/// What the scripted model does when asked.
#[derive(Clone)]
pub(crate) enum Script {
    Answer(String),
    Fail(String),
    Hang,
}

/// A fragment or a mid-stream failure.
#[derive(Clone)]
pub(crate) enum Step {
    Text(&'static str),
    Fail(&'static str),
}

pub(crate) struct ScriptedGateway {
    single: Script,
    stream_open: Script,
    steps: Vec<Step>,
    hang_after_steps: bool,
    pub(crate) stream_dropped: Arc<AtomicBool>,
    pub(crate) fragments_pulled: Arc<AtomicUsize>,
    pub(crate) prompts: std::sync::Mutex<Vec<String>>,
}

pub(crate) fn upstream(msg: &str) -> AiLlmError {
    ProviderError::new(
        LlmProvider::Ollama,
        ProviderErrorKind::Upstream(msg.to_string()),
    )
    .into()
}

impl ScriptedGateway {
    pub(crate) fn answering(answer: &str) -> Self {
        Self::new(Script::Answer(answer.to_string()))
    }

    pub(crate) fn failing(msg: &str) -> Self {
        Self::new(Script::Fail(msg.to_string()))
    }

    pub(crate) fn hanging() -> Self {
        Self::new(Script::Hang)
    }

    /// Single-shot returns `single`; streaming opens fine with no steps.
    pub(crate) fn new(single: Script) -> Self {
        Self {
            single,
            stream_open: Script::Answer(String::new()),
            steps: Vec::new(),
            hang_after_steps: false,
            stream_dropped: Arc::new(AtomicBool::new(false)),
            fragments_pulled: Arc::new(AtomicUsize::new(0)),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn streaming(steps: Vec<Step>) -> Self {
        let mut gw = Self::new(Script::Fail("single-shot not scripted".into()));
        gw.steps = steps;
        gw
    }

    pub(crate) fn with_stream_open(mut self, open: Script) -> Self {
        self.stream_open = open;
        self
    }

    pub(crate) fn hang_after_steps(mut self) -> Self {
        self.hang_after_steps = true;
        self
    }

    fn record_prompt(&self, prompt: &str) {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
    }
}

/// Flags the stream as released when dropped.
struct DropFlag(Arc<AtomicBool>);

impl Drop for DropFlag {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl ModelGateway for ScriptedGateway {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.record_prompt(prompt);
        match &self.single {
            Script::Answer(a) => Ok(a.clone()),
            Script::Fail(msg) => Err(upstream(msg)),
            Script::Hang => futures::future::pending().await,
        }
    }

    async fn complete_streaming(&self, prompt: &str) -> Result<FragmentStream> {
        self.record_prompt(prompt);
        match &self.stream_open {
            Script::Answer(_) => {}
            Script::Fail(msg) => return Err(upstream(msg)),
            Script::Hang => futures::future::pending::<()>().await,
        }

        let guard = DropFlag(self.stream_dropped.clone());
        let pulled = self.fragments_pulled.clone();
        let steps = self.steps.clone().into_iter();
        let hang = self.hang_after_steps;

        let fragments = stream::unfold(
            (steps, guard, pulled),
            move |(mut steps, guard, pulled)| async move {
                let Some(step) = steps.next() else {
                    if hang {
                        futures::future::pending::<()>().await;
                    }
                    return None;
                };
                pulled.fetch_add(1, Ordering::SeqCst);
                let item = match step {
                    Step::Text(t) => Ok(t.to_string()),
                    Step::Fail(msg) => Err(upstream(msg)),
                };
                Some((item, (steps, guard, pulled)))
            },
        );

        Ok(fragments.boxed())
    }

    fn provider(&self) -> LlmProvider {
        LlmProvider::Ollama
    }

    fn model(&self) -> &str {
        "scripted"
    }
}
