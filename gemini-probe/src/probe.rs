//! Probe runner: enumerate available models, then smoke-test a fixed set.

use std::io::Write;
use std::time::Duration;

use gemini_probe_types::models::Model;
use tracing::debug;

use crate::client::Client;
use crate::error::{Error, FailureKind, Result};

/// 默认探测的模型列表。
pub const DEFAULT_PROBE_MODELS: [&str; 3] = [
    "gemini-1.5-flash",
    "gemini-2.0-flash-exp",
    "gemini-2.5-flash",
];

/// 默认提示词。
pub const DEFAULT_PROMPT: &str = "What is the capital of France? Answer in one sentence.";

/// 连续探测之间的固定停顿。
pub const DEFAULT_PAUSE: Duration = Duration::from_secs(2);

/// 探针视角下的远端生成服务。真实实现是 [`Client`]，
/// 测试中可注入任意替身。
#[allow(async_fn_in_trait)]
pub trait GenerativeService {
    /// 列出全部模型描述。
    async fn list_models(&self) -> Result<Vec<Model>>;

    /// 向指定模型发送一条提示并返回回答文本。
    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String>;
}

impl GenerativeService for Client {
    async fn list_models(&self) -> Result<Vec<Model>> {
        self.models().all().await
    }

    async fn generate_text(&self, model: &str, prompt: &str) -> Result<String> {
        self.models().generate_text(model, prompt).await
    }
}

/// 探测计划：模型列表、提示词与停顿时长。
#[derive(Debug, Clone)]
pub struct ProbePlan {
    pub models: Vec<String>,
    pub prompt: String,
    pub pause: Duration,
}

impl Default for ProbePlan {
    fn default() -> Self {
        Self {
            models: DEFAULT_PROBE_MODELS.iter().map(ToString::to_string).collect(),
            prompt: DEFAULT_PROMPT.to_string(),
            pause: DEFAULT_PAUSE,
        }
    }
}

/// 单个模型的探测结果。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeOutcome {
    /// 模型返回了文本回答。
    Answered(String),
    /// 探测失败，按 [`FailureKind`] 分类。
    Failed(FailureKind),
}

/// 一次完整运行的统计。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProbeSummary {
    pub answered: usize,
    pub not_found: usize,
    pub quota_exhausted: usize,
    pub failed: usize,
}

impl ProbeSummary {
    /// 探测总数。
    #[must_use]
    pub fn total(&self) -> usize {
        self.answered + self.not_found + self.quota_exhausted + self.failed
    }

    fn record(&mut self, outcome: &ProbeOutcome) {
        match outcome {
            ProbeOutcome::Answered(_) => self.answered += 1,
            ProbeOutcome::Failed(FailureKind::NotFound) => self.not_found += 1,
            ProbeOutcome::Failed(FailureKind::QuotaExhausted) => self.quota_exhausted += 1,
            ProbeOutcome::Failed(FailureKind::Other) => self.failed += 1,
        }
    }
}

/// 探针执行器：先枚举模型，再按计划逐个探测。
pub struct ProbeRunner<S> {
    service: S,
    plan: ProbePlan,
}

impl<S: GenerativeService> ProbeRunner<S> {
    /// 创建执行器。
    pub const fn new(service: S, plan: ProbePlan) -> Self {
        Self { service, plan }
    }

    /// 执行两个阶段并把全部输出写入 `out`。
    ///
    /// 枚举失败不影响探测阶段；单个探测失败也不会中断后续模型。
    /// 每次探测之后无条件停顿 `plan.pause`。
    ///
    /// # Errors
    /// 仅当写入 `out` 失败时返回错误。
    pub async fn run(&self, out: &mut impl Write) -> Result<ProbeSummary> {
        self.enumerate_models(out).await?;

        let mut summary = ProbeSummary::default();
        for model in &self.plan.models {
            let outcome = self.probe_model(model, out).await?;
            summary.record(&outcome);
            tokio::time::sleep(self.plan.pause).await;
        }
        Ok(summary)
    }

    async fn enumerate_models(&self, out: &mut impl Write) -> Result<()> {
        writeln!(out, "--- Listing Available Models ---")?;
        match self.service.list_models().await {
            Ok(models) => {
                let mut found = false;
                for model in models.iter().filter(|m| m.supports_generate_content()) {
                    writeln!(out, "- {}", model.name.as_deref().unwrap_or("<unnamed>"))?;
                    found = true;
                }
                if !found {
                    writeln!(out, "No models found with generateContent support.")?;
                }
                debug!(total = models.len(), "model listing complete");
            }
            Err(err) => {
                writeln!(out, "Error listing models: {err}")?;
            }
        }
        Ok(())
    }

    async fn probe_model(&self, model: &str, out: &mut impl Write) -> Result<ProbeOutcome> {
        writeln!(out, "\n--- Probing Model: {model} ---")?;
        writeln!(out, "QUESTION: {}", self.plan.prompt)?;
        match self.service.generate_text(model, &self.plan.prompt).await {
            Ok(answer) => {
                writeln!(out, "ANSWER: {answer}")?;
                debug!(model, "probe answered");
                Ok(ProbeOutcome::Answered(answer))
            }
            Err(err) => {
                let kind = FailureKind::classify(&err);
                writeln!(out, "{}", failure_message(kind, model, &err))?;
                debug!(model, ?kind, "probe failed");
                Ok(ProbeOutcome::Failed(kind))
            }
        }
    }
}

/// 将失败分类映射为输出行。
fn failure_message(kind: FailureKind, model: &str, err: &Error) -> String {
    match kind {
        FailureKind::NotFound => {
            format!("FAILED (404): Model {model} not available for this API key.")
        }
        FailureKind::QuotaExhausted => format!("FAILED (429): Quota exceeded for {model}."),
        FailureKind::Other => format!("FAILED: {err}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tokio::time::Instant;

    fn model(name: &str, methods: &[&str]) -> Model {
        Model {
            name: Some(name.to_string()),
            supported_generation_methods: methods.iter().map(ToString::to_string).collect(),
            ..Default::default()
        }
    }

    fn plan(models: &[&str], pause: Duration) -> ProbePlan {
        ProbePlan {
            models: models.iter().map(ToString::to_string).collect(),
            prompt: DEFAULT_PROMPT.to_string(),
            pause,
        }
    }

    #[derive(Default)]
    struct FakeService {
        listing: Option<Vec<Model>>,
        statuses: HashMap<String, u16>,
        calls: Mutex<Vec<(String, Instant)>>,
    }

    impl FakeService {
        fn with_listing(models: Vec<Model>) -> Self {
            Self {
                listing: Some(models),
                ..Default::default()
            }
        }

        fn probed_models(&self) -> Vec<String> {
            self.calls
                .lock()
                .unwrap()
                .iter()
                .map(|(model, _)| model.clone())
                .collect()
        }
    }

    impl GenerativeService for &FakeService {
        async fn list_models(&self) -> Result<Vec<Model>> {
            self.listing.clone().ok_or_else(|| Error::ApiError {
                status: 500,
                message: "listing unavailable".into(),
            })
        }

        async fn generate_text(&self, model: &str, _prompt: &str) -> Result<String> {
            self.calls
                .lock()
                .unwrap()
                .push((model.to_string(), Instant::now()));
            match self.statuses.get(model) {
                None => Ok(format!("{model}: Paris is the capital of France.")),
                Some(status) => Err(Error::ApiError {
                    status: *status,
                    message: "stubbed failure".into(),
                }),
            }
        }
    }

    async fn run_to_string(service: &FakeService, plan: ProbePlan) -> (String, ProbeSummary) {
        let runner = ProbeRunner::new(service, plan);
        let mut out = Vec::new();
        let summary = runner.run(&mut out).await.unwrap();
        (String::from_utf8(out).unwrap(), summary)
    }

    #[tokio::test(start_paused = true)]
    async fn enumeration_filters_by_capability() {
        let service = FakeService::with_listing(vec![
            model("models/gemini-2.5-flash", &["generateContent", "countTokens"]),
            model("models/embedding-001", &["embedContent"]),
            model("models/gemini-1.5-flash", &["generateContent"]),
        ]);
        let (output, _) = run_to_string(&service, plan(&[], Duration::ZERO)).await;

        assert!(output.contains("- models/gemini-2.5-flash"));
        assert!(output.contains("- models/gemini-1.5-flash"));
        assert!(!output.contains("embedding-001"));
        assert!(!output.contains("No models found"));
    }

    #[tokio::test(start_paused = true)]
    async fn enumeration_reports_none_found_once() {
        let service = FakeService::with_listing(vec![model(
            "models/embedding-001",
            &["embedContent"],
        )]);
        let (output, _) = run_to_string(&service, plan(&[], Duration::ZERO)).await;

        assert_eq!(
            output
                .matches("No models found with generateContent support.")
                .count(),
            1
        );
    }

    #[tokio::test(start_paused = true)]
    async fn probes_every_model_in_declared_order() {
        let service = FakeService::with_listing(Vec::new());
        let (output, summary) = run_to_string(
            &service,
            plan(&["model-a", "model-b", "model-c"], Duration::ZERO),
        )
        .await;

        assert_eq!(
            service.probed_models(),
            vec!["model-a", "model-b", "model-c"]
        );
        assert_eq!(summary.answered, 3);
        assert_eq!(summary.total(), 3);
        assert!(output.contains("QUESTION: What is the capital of France?"));
        assert!(output.contains("ANSWER: model-a: Paris is the capital of France."));
    }

    #[tokio::test(start_paused = true)]
    async fn error_tiers_map_to_distinct_messages() {
        let mut service = FakeService::with_listing(Vec::new());
        service.statuses.insert("model-a".into(), 404);
        service.statuses.insert("model-b".into(), 429);
        service.statuses.insert("model-c".into(), 500);

        let (output, summary) = run_to_string(
            &service,
            plan(&["model-a", "model-b", "model-c"], Duration::ZERO),
        )
        .await;

        assert!(output.contains("FAILED (404): Model model-a not available for this API key."));
        assert!(output.contains("FAILED (429): Quota exceeded for model-b."));
        assert!(output.contains("FAILED: API error (status 500): stubbed failure"));
        assert_eq!(summary.not_found, 1);
        assert_eq!(summary.quota_exhausted, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(service.probed_models().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn listing_failure_does_not_block_probes() {
        let service = FakeService::default();
        let (output, summary) =
            run_to_string(&service, plan(&["model-a", "model-b"], Duration::ZERO)).await;

        assert!(output.contains("Error listing models: API error (status 500)"));
        assert_eq!(summary.answered, 2);
        assert_eq!(service.probed_models().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn pause_applies_after_every_probe_including_failures() {
        let mut service = FakeService::with_listing(Vec::new());
        service.statuses.insert("model-b".into(), 404);

        let pause = Duration::from_secs(2);
        let started = Instant::now();
        let runner = ProbeRunner::new(&service, plan(&["model-a", "model-b", "model-c"], pause));
        let mut out = Vec::new();
        runner.run(&mut out).await.unwrap();

        let calls = service.calls.lock().unwrap();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[1].1 - calls[0].1, pause);
        assert_eq!(calls[2].1 - calls[1].1, pause);
        // The pause also follows the final probe.
        assert_eq!(started.elapsed(), pause * 3);
    }

    #[tokio::test(start_paused = true)]
    async fn summary_counts_mixed_outcomes() {
        let mut service = FakeService::with_listing(Vec::new());
        service.statuses.insert("model-b".into(), 429);

        let (_, summary) =
            run_to_string(&service, plan(&["model-a", "model-b"], Duration::ZERO)).await;
        assert_eq!(
            summary,
            ProbeSummary {
                answered: 1,
                quota_exhausted: 1,
                ..Default::default()
            }
        );
    }

    #[test]
    fn default_plan_matches_fixed_probe_set() {
        let plan = ProbePlan::default();
        assert_eq!(
            plan.models,
            vec!["gemini-1.5-flash", "gemini-2.0-flash-exp", "gemini-2.5-flash"]
        );
        assert_eq!(plan.pause, Duration::from_secs(2));
        assert!(plan.prompt.contains("capital of France"));
    }
}
