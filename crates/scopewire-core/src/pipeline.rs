//! Generator pipeline
//!
//! ```text
//! discover → [parse phase] → link → enumerate → validate plugins
//!          → resolve → group → [synthesis phase] → assemble → emit
//! ```
//!
//! Only the bracketed phases run on the sequence executor: one sequence per
//! source unit (filter → read → parse → extract) and one per provider group.
//! Results of each phase are collected in submission order before the next
//! stage starts, so the emitted plan does not depend on scheduling.
//!
//! No more sequences are outstanding than the executor has permits, and a
//! unit's deadline starts when its first step is granted one, so time spent
//! queued behind other units never counts against it. When a phase
//! fails, every sequence still outstanding is cancelled before the error is
//! returned.

use crate::config::GeneratorConfig;
use crate::discovery::SourceDiscovery;
use crate::emit::PlanEmitter;
use crate::error::{GeneratorError, Phase};
use crate::source::{DeclarationParser, ManifestParser, ParseError, SourceUnit};
use futures::stream::{self, StreamExt, TryStreamExt};
use scopewire_exec::{SequenceExecutor, SequenceTask, Step};
use scopewire_link::{Linker, PathEnumerator, ScopeGraph};
use scopewire_model::Declarations;
use scopewire_resolve::{
    group_providers, GenerationPlan, PluginValidator, ProviderDescription, ProviderGroup,
    ProviderSynthesizer, Resolver,
};
use serde::Serialize;
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Counters of one run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GenerationReport {
    pub units_scanned: usize,
    /// Units that declared anything
    pub units_parsed: usize,
    pub scopes: usize,
    pub paths: usize,
    /// Shared providers after deduplication
    pub providers: usize,
    /// Paths registered against a shared provider
    pub registrations: usize,
    pub extensions: usize,
    pub destination: Option<PathBuf>,
}

impl Display for GenerationReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Scanned {} units ({} with declarations)",
            self.units_scanned, self.units_parsed
        )?;
        writeln!(f, "  Scopes: {}", self.scopes)?;
        writeln!(f, "  Paths: {}", self.paths)?;
        writeln!(
            f,
            "  Providers: {} shared across {} paths",
            self.providers, self.registrations
        )?;
        write!(f, "  Extension providers: {}", self.extensions)?;
        if let Some(destination) = &self.destination {
            write!(f, "\n  Plan: {}", destination.display())?;
        }
        Ok(())
    }
}

/// Runs the whole generation pipeline
pub struct Generator {
    config: GeneratorConfig,
    parser: Arc<dyn DeclarationParser>,
    executor: SequenceExecutor,
}

impl Generator {
    /// Generator reading declaration manifests
    #[must_use]
    pub fn new(config: GeneratorConfig) -> Self {
        let executor = if config.max_concurrency == 0 {
            SequenceExecutor::default()
        } else {
            SequenceExecutor::new(config.max_concurrency)
        };
        Self {
            config,
            parser: Arc::new(ManifestParser::new()),
            executor,
        }
    }

    /// Replace the declaration parser
    #[must_use]
    pub fn with_parser(mut self, parser: impl DeclarationParser) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn executor(&self) -> &SequenceExecutor {
        &self.executor
    }

    /// Plan the configured source root and hand the plan to `emitter`
    ///
    /// Nothing is emitted unless every earlier stage succeeded.
    pub async fn generate(
        &self,
        emitter: &dyn PlanEmitter,
    ) -> Result<GenerationReport, GeneratorError> {
        let (plan, mut report) = self.plan().await?;
        emitter.emit(&plan)?;
        report.destination = emitter.destination().map(Path::to_path_buf);
        Ok(report)
    }

    /// Everything except emission
    pub async fn plan(&self) -> Result<(GenerationPlan, GenerationReport), GeneratorError> {
        let units = SourceDiscovery::from_config(&self.config).discover()?;
        let units_scanned = units.len();

        let parsed = self.parse_all(units).await?;
        let units_parsed = parsed.iter().filter(|d| d.is_some()).count();
        let declarations = merge(parsed);

        let (plan, mut report) = self.plan_declarations(declarations).await?;
        report.units_scanned = units_scanned;
        report.units_parsed = units_parsed;
        Ok((plan, report))
    }

    /// Parse units concurrently and merge their declarations in unit order
    pub async fn parse_units(&self, units: Vec<SourceUnit>) -> Result<Declarations, GeneratorError> {
        Ok(merge(self.parse_all(units).await?))
    }

    /// Link, resolve and synthesize already parsed declarations
    pub async fn plan_declarations(
        &self,
        declarations: Declarations,
    ) -> Result<(GenerationPlan, GenerationReport), GeneratorError> {
        let graph = Arc::new(Linker::new(declarations).link()?);

        let validator = PluginValidator::new(&graph);
        validator.check_cycles()?;
        let records = PathEnumerator::new(&graph).enumerate();
        validator.check_backing(&records)?;

        let providers = Resolver::new(&graph).resolve_all(&records)?;
        let groups = group_providers(&graph, providers);
        let descriptions = self.synthesize(&graph, groups).await?;
        let plan = GenerationPlan::assemble(&graph, &records, descriptions);

        let report = GenerationReport {
            scopes: graph.len(),
            paths: records.len(),
            providers: plan.providers.len(),
            registrations: plan.registry.len(),
            extensions: plan.extensions.len(),
            ..GenerationReport::default()
        };
        tracing::info!(
            "Planned {} providers for {} paths over {} scopes",
            report.providers,
            report.paths,
            report.scopes
        );
        Ok((plan, report))
    }

    async fn parse_all(
        &self,
        units: Vec<SourceUnit>,
    ) -> Result<Vec<Option<Declarations>>, GeneratorError> {
        tracing::info!("Parsing {} units", units.len());
        let timeout = self.config.parse_timeout();

        let sequences = units.into_iter().map(|unit| {
            let unit = Arc::new(unit);
            let parser = Arc::clone(&self.parser);
            async move {
                self.run_sequence(Phase::Parse, &unit.relative, timeout, || {
                    parse_sequence(Arc::clone(&parser), Arc::clone(&unit))
                })
                .await
            }
        });
        self.run_phase(Phase::Parse, sequences).await
    }

    async fn synthesize(
        &self,
        graph: &Arc<ScopeGraph>,
        groups: Vec<ProviderGroup>,
    ) -> Result<Vec<ProviderDescription>, GeneratorError> {
        tracing::info!("Synthesizing {} providers", groups.len());
        let timeout = self.config.synthesis_timeout();

        let sequences = groups.into_iter().map(|group| {
            let group = Arc::new(group);
            let graph = Arc::clone(graph);
            async move {
                let label = group.id.to_string();
                self.run_sequence(Phase::Synthesis, &label, timeout, || {
                    let graph = Arc::clone(&graph);
                    let group = Arc::clone(&group);
                    move || Step::Done(ProviderSynthesizer::new(&graph).describe(&group))
                })
                .await
            }
        });
        self.run_phase(Phase::Synthesis, sequences).await
    }

    /// Drive one phase with at most `limit` sequences outstanding
    ///
    /// Results come back in submission order. On the first failure the rest
    /// of the phase is dropped and every live sequence cancelled.
    async fn run_phase<T, I, Fut>(
        &self,
        phase: Phase,
        sequences: I,
    ) -> Result<Vec<T>, GeneratorError>
    where
        I: IntoIterator<Item = Fut>,
        Fut: Future<Output = Result<T, GeneratorError>>,
    {
        let outcome = stream::iter(sequences.into_iter().enumerate().map(
            |(index, sequence)| async move { sequence.await.map(|value| (index, value)) },
        ))
        .buffer_unordered(self.executor.limit())
        .try_collect::<Vec<_>>()
        .await;

        match outcome {
            Ok(mut indexed) => {
                indexed.sort_unstable_by_key(|(index, _)| *index);
                Ok(indexed.into_iter().map(|(_, value)| value).collect())
            }
            Err(err) => {
                tracing::warn!("{} failed, cancelling outstanding sequences: {}", phase, err);
                self.executor.cancel_all();
                Err(err)
            }
        }
    }

    /// Submit a sequence, resubmitting it after each timeout
    async fn run_sequence<T, S, F>(
        &self,
        phase: Phase,
        unit: &str,
        timeout: Duration,
        make: F,
    ) -> Result<T, GeneratorError>
    where
        T: Send + 'static,
        S: SequenceTask<T>,
        F: Fn() -> S,
    {
        let attempts = self.config.max_retries.saturating_add(1);
        let deadline = (!timeout.is_zero()).then_some(timeout);

        for attempt in 1..=attempts {
            let mut handle = self.executor.submit(make());
            if deadline.is_some() {
                handle.started().await;
            }
            match handle.wait(deadline).await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_timeout() => {
                    handle.cancel();
                    tracing::warn!(
                        "{} of {} timed out (attempt {}/{})",
                        phase,
                        unit,
                        attempt,
                        attempts
                    );
                }
                Err(err) => return Err(err.into()),
            }
        }

        Err(GeneratorError::RetriesExhausted {
            phase,
            unit: unit.to_string(),
            attempts,
        })
    }
}

fn merge(parsed: Vec<Option<Declarations>>) -> Declarations {
    let mut merged = Declarations::new();
    for declarations in parsed.into_iter().flatten() {
        merged.merge(declarations);
    }
    merged
}

type Parsed = Option<Declarations>;

fn parse_sequence(
    parser: Arc<dyn DeclarationParser>,
    unit: Arc<SourceUnit>,
) -> impl SequenceTask<Parsed> {
    move || {
        if !parser.accepts(&unit) {
            return Step::Done(None);
        }
        Step::next(move || read_step(parser, unit))
    }
}

fn read_step(parser: Arc<dyn DeclarationParser>, unit: Arc<SourceUnit>) -> Step<Parsed> {
    match std::fs::read_to_string(&unit.path) {
        Ok(text) => Step::next(move || parse_step(&*parser, unit, text)),
        Err(source) => {
            let err = ParseError::Read {
                path: unit.path.clone(),
                source,
            };
            tracing::warn!("Skipping {}: {}", unit, err);
            Step::Done(None)
        }
    }
}

fn parse_step(parser: &dyn DeclarationParser, unit: Arc<SourceUnit>, text: String) -> Step<Parsed> {
    match parser.parse(&unit, &text) {
        Ok(Some(declarations)) => Step::next(move || extract_step(&unit, declarations)),
        Ok(None) => {
            tracing::debug!("{} declares nothing", unit);
            Step::Done(None)
        }
        Err(err) => {
            tracing::warn!("Skipping {}: {}", unit, err);
            Step::Done(None)
        }
    }
}

fn extract_step(unit: &SourceUnit, declarations: Declarations) -> Step<Parsed> {
    tracing::debug!(
        "{}: {} scopes, {} contracts, {} companions, {} extensions",
        unit,
        declarations.scopes.len(),
        declarations.contracts.len(),
        declarations.companions.len(),
        declarations.extensions.len()
    );
    Step::Done(Some(declarations))
}
