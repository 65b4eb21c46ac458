// SPDX-License-Identifier: MIT

//! The session façade (C9): the client-visible `init`/`updateFiles`/
//! `updateSession`/queries/`runStmt`/`buildExecutable`/`buildDoc`/`shutdown`
//! surface (§4.4).
//!
//! `IdeSession` is a plain value: mutating operations return a *new*
//! value rather than mutating `self` in place, so an older handle stays
//! around — stale, but inspectable — after a mutation (§8 scenario 4).
//! What actually changes is process-wide: the token cell and the virtual
//! file store are process singletons (§3, §5), so every session value,
//! old or new, checks its remembered token against the one true counter.

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex as SyncMutex;

use ics_core::{
    AutoCompletionEntry, ComputedResult, Diagnostic, Diff, ExpTypeEntry, ImportEntry, Mutation,
    PackageDependency, SessionConfig, SessionError, SessionId, SpanInfoEntry, StateToken,
    TokenCell, UpdateBatch, UseSiteEntry, VirtualFileStore,
};
use ics_wire::{ProgressFrame, Request, ResultFrame, RunOutcome, WorkerFrame};

use crate::link::Canceller;
use crate::spawn::WorkerSpawner;
use crate::supervisor::WorkerSupervisor;

static TOKEN_CELL: OnceLock<TokenCell> = OnceLock::new();
static VFS: OnceLock<VirtualFileStore> = OnceLock::new();
/// Makes "check current token, apply effects, advance token" atomic
/// across the several independent locks (token cell, vfs) those steps
/// touch — `TokenCell`'s own mutex only atomically guards the counter
/// itself, not a multi-step sequence spanning other state in between.
static MUTATION_LOCK: OnceLock<SyncMutex<()>> = OnceLock::new();

fn token_cell() -> &'static TokenCell {
    TOKEN_CELL.get_or_init(TokenCell::new)
}

fn vfs() -> &'static VirtualFileStore {
    VFS.get_or_init(VirtualFileStore::new)
}

fn mutation_lock() -> &'static SyncMutex<()> {
    MUTATION_LOCK.get_or_init(|| SyncMutex::new(()))
}

/// Client-side mirror of the per-module state the worker diffs against
/// (ToyEngine keeps the same kind of running state server-side purely to
/// compute `ModuleDiff`s). The facade folds each `ComputedResult`'s diffs
/// into this so that `getImports`/`getSpanInfo`/etc. can answer with a
/// full current snapshot, the way spec.md's query signatures imply,
/// rather than exposing only the latest diff.
#[derive(Clone, Default)]
struct ModuleSnapshots {
    imports: HashMap<String, Vec<ImportEntry>>,
    auto_completion: HashMap<String, Vec<AutoCompletionEntry>>,
    span_info: HashMap<String, Vec<SpanInfoEntry>>,
    package_deps: HashMap<String, Vec<PackageDependency>>,
    exp_types: HashMap<String, Vec<ExpTypeEntry>>,
    use_sites: HashMap<String, Vec<UseSiteEntry>>,
}

fn fold_diff<T: Clone + PartialEq>(current: &mut Vec<T>, diff: &Diff<T>) {
    current.retain(|item| !diff.removed.contains(item));
    current.extend(diff.added.iter().cloned());
}

impl ModuleSnapshots {
    fn folded(&self, diffs: &HashMap<String, ics_core::ModuleDiff>) -> ModuleSnapshots {
        let mut next = self.clone();
        for (module, diff) in diffs {
            fold_diff(next.imports.entry(module.clone()).or_default(), &diff.imports);
            fold_diff(next.auto_completion.entry(module.clone()).or_default(), &diff.auto_completion);
            fold_diff(next.span_info.entry(module.clone()).or_default(), &diff.span_info);
            fold_diff(next.package_deps.entry(module.clone()).or_default(), &diff.package_deps);
            fold_diff(next.exp_types.entry(module.clone()).or_default(), &diff.exp_types);
            fold_diff(next.use_sites.entry(module.clone()).or_default(), &diff.use_sites);
        }
        next
    }
}

/// A client-held handle to one interactive compilation session (§3, §9
/// GLOSSARY). `Clone` is cheap: everything process-wide is behind an
/// `Arc`/singleton, and everything session-local is either `Copy`
/// (`StateToken`) or itself `Arc`-wrapped.
#[derive(Clone)]
pub struct IdeSession {
    id: SessionId,
    config: Arc<SessionConfig>,
    token: StateToken,
    computed: Option<Arc<ComputedResult>>,
    loaded_module_diff: Diff<String>,
    modules: Arc<ModuleSnapshots>,
    worker: Arc<WorkerSupervisor>,
    dynamic_options: Option<Vec<String>>,
    generate_code: bool,
    env_overlay: Vec<(String, Option<String>)>,
}

impl IdeSession {
    /// `init` (§4.4): remembers `currentToken` without advancing it —
    /// a new session starts already in sync, since nothing about the
    /// process-wide state changed by creating it. The worker process
    /// itself is not spawned yet; the first mutating call spawns it
    /// lazily via [`WorkerSupervisor::ensure_link`].
    pub fn init(config: SessionConfig, spawner: Arc<dyn WorkerSpawner>) -> IdeSession {
        let token = token_cell().current();
        let worker = Arc::new(WorkerSupervisor::new(
            spawner,
            config.initial_static_options.clone(),
            config.temp_dir.clone(),
        ));
        tracing::info!(sources_dir = ?config.sources_dir, "session initialised");
        IdeSession {
            id: SessionId::new(),
            config: Arc::new(config),
            token,
            computed: None,
            loaded_module_diff: Diff::default(),
            modules: Arc::new(ModuleSnapshots::default()),
            worker,
            dynamic_options: None,
            generate_code: false,
            env_overlay: Vec::new(),
        }
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn token(&self) -> StateToken {
        self.token
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Session restart counter (SPEC_FULL §3): advisory only, observes
    /// worker replacement independently of the state token. Not gated
    /// by `StaleSession` — it describes the worker object, not anything
    /// the token's linear-history guarantee is about.
    pub fn restart_count(&self) -> u64 {
        self.worker.restart_count()
    }

    fn check_token(&self) -> Result<(), SessionError> {
        token_cell().check(self.token)
    }

    fn computed(&self) -> Result<&Arc<ComputedResult>, SessionError> {
        self.computed.as_ref().ok_or(SessionError::NoComputedYet)
    }

    /// `updateFiles` (§4.4): applies `batch` atomically, advances the
    /// token, and invalidates `Computed`.
    ///
    /// The worker is a separate process with no access to this session's
    /// in-memory overlay (§9's open question, resolved here): a put/delete
    /// is mirrored to the real file under `sourcesDir`/`dataDir` as well
    /// as the overlay, so the two never diverge and a subsequent compile
    /// sees exactly what the overlay says it should. The overlay remains
    /// the source of truth for `getSourceModule`/`getDataFile`, which
    /// read it first — this just keeps disk from ever lagging behind it.
    pub fn update_files(&self, batch: UpdateBatch) -> Result<IdeSession, SessionError> {
        let _guard = mutation_lock().lock();
        self.check_token()?;

        let mut dynamic_options = self.dynamic_options.clone();
        let mut generate_code = self.generate_code;
        let mut env_overlay = self.env_overlay.clone();
        batch.apply(vfs(), &mut dynamic_options, &mut generate_code, &mut env_overlay);
        self.flush_to_disk(batch.mutations())?;

        let token = token_cell().advance();
        tracing::debug!(session = %self.id, new_token = %token, "files updated");

        Ok(IdeSession {
            token,
            computed: None,
            dynamic_options,
            generate_code,
            env_overlay,
            ..self.clone()
        })
    }

    fn flush_to_disk(&self, mutations: &[Mutation]) -> Result<(), SessionError> {
        for mutation in mutations {
            match mutation {
                Mutation::PutModule { path, contents, .. } => {
                    write_through(&self.config.sources_dir, path, contents)?
                }
                Mutation::DeleteModule { path, .. } => delete_through(&self.config.sources_dir, path)?,
                Mutation::PutDataFile { path, contents } => {
                    write_through(&self.config.data_dir, path, contents)?
                }
                Mutation::DeleteDataFile { path } => delete_through(&self.config.data_dir, path)?,
                Mutation::SetDynamicOptions(_)
                | Mutation::SetGenerateCode(_)
                | Mutation::SetEnvOverlay(_) => {}
            }
        }
        Ok(())
    }

    /// `updateSession` (§4.4): fails `StaleSession` synchronously;
    /// otherwise advances the token at enqueue time (the spec permits
    /// either consistent choice for §8 scenario 6; this is ours — see
    /// `DESIGN.md`) and enqueues a `Compile` request, returning an
    /// [`UpdateHandle`] immediately.
    pub async fn update_session(&self) -> Result<UpdateHandle, SessionError> {
        let token = {
            let _guard = mutation_lock().lock();
            self.check_token()?;
            token_cell().advance()
        };
        tracing::info!(session = %self.id, new_token = %token, "compile enqueued");

        let link = self.worker.ensure_link().await?;
        let request = Request::Compile {
            dynamic_options: self.dynamic_options.clone(),
            sources_dir: self.config.sources_dir.clone(),
            generate_code: self.generate_code,
            source_extensions: self.config.source_extensions.clone(),
        };
        let progress = link.send_compile(request).await?;

        Ok(UpdateHandle {
            prev_computed: self.computed.clone(),
            next: IdeSession {
                token,
                computed: None,
                // Sent above; absence in the next request means "reuse
                // previous" per §9, so the worker-side state is now the
                // source of truth and this session value doesn't resend it.
                dynamic_options: None,
                ..self.clone()
            },
            progress,
        })
    }

    /// `getSourceModule` (§4.4): overlay-or-disk read under `sourcesDir`.
    pub fn get_source_module(&self, name: &str) -> Result<Vec<u8>, SessionError> {
        self.check_token()?;
        let path = format!("{name}.hs");
        vfs().read(&path, &self.config.sources_dir)
    }

    /// `getDataFile` (§4.4): overlay-or-disk read under `dataDir`.
    pub fn get_data_file(&self, path: &str) -> Result<Vec<u8>, SessionError> {
        self.check_token()?;
        vfs().read(path, &self.config.data_dir)
    }

    /// `getAllSourceModules` (SPEC_FULL §3 supplement): every overlay
    /// entry whose path carries one of `sourceExtensions`.
    pub fn get_all_source_modules(&self) -> Result<Vec<String>, SessionError> {
        self.check_token()?;
        let exts = &self.config.source_extensions;
        Ok(vfs()
            .overlay_paths()
            .into_iter()
            .filter(|path| exts.iter().any(|ext| path.ends_with(&format!(".{ext}"))))
            .collect())
    }

    /// `getAllDataFiles` (SPEC_FULL §3 supplement): every overlay entry
    /// that isn't a source module by the same criterion.
    pub fn get_all_data_files(&self) -> Result<Vec<String>, SessionError> {
        self.check_token()?;
        let exts = &self.config.source_extensions;
        Ok(vfs()
            .overlay_paths()
            .into_iter()
            .filter(|path| !exts.iter().any(|ext| path.ends_with(&format!(".{ext}"))))
            .collect())
    }

    pub fn get_source_errors(&self) -> Result<Vec<Diagnostic>, SessionError> {
        self.check_token()?;
        Ok(self.computed()?.diagnostics.clone())
    }

    pub fn get_loaded_modules(&self) -> Result<Vec<String>, SessionError> {
        self.check_token()?;
        Ok(self.computed()?.loaded_modules.clone())
    }

    /// Added/removed loaded modules vs. the previous `Computed`
    /// (SPEC_FULL §3 supplement).
    pub fn get_loaded_modules_diff(&self) -> Result<Diff<String>, SessionError> {
        self.check_token()?;
        self.computed()?;
        Ok(self.loaded_module_diff.clone())
    }

    pub fn get_imports(&self, module: &str) -> Result<Vec<ImportEntry>, SessionError> {
        self.check_token()?;
        self.computed()?;
        Ok(self.modules.imports.get(module).cloned().unwrap_or_default())
    }

    pub fn get_span_info(&self, module: &str) -> Result<Vec<SpanInfoEntry>, SessionError> {
        self.check_token()?;
        self.computed()?;
        Ok(self.modules.span_info.get(module).cloned().unwrap_or_default())
    }

    pub fn get_exp_types(&self, module: &str) -> Result<Vec<ExpTypeEntry>, SessionError> {
        self.check_token()?;
        self.computed()?;
        Ok(self.modules.exp_types.get(module).cloned().unwrap_or_default())
    }

    pub fn get_use_sites(&self, module: &str) -> Result<Vec<UseSiteEntry>, SessionError> {
        self.check_token()?;
        self.computed()?;
        Ok(self.modules.use_sites.get(module).cloned().unwrap_or_default())
    }

    pub fn get_auto_completion(&self, module: &str) -> Result<Vec<AutoCompletionEntry>, SessionError> {
        self.check_token()?;
        self.computed()?;
        Ok(self.modules.auto_completion.get(module).cloned().unwrap_or_default())
    }

    pub(crate) fn all_package_deps(&self) -> Result<Vec<PackageDependency>, SessionError> {
        self.check_token()?;
        self.computed()?;
        let mut deps: Vec<PackageDependency> =
            self.modules.package_deps.values().flatten().cloned().collect();
        deps.sort_by(|a, b| a.package.cmp(&b.package));
        deps.dedup_by(|a, b| a.package == b.package);
        Ok(deps)
    }

    /// `runStmt` (§4.4, §4.7): starts executing `identifier` inside
    /// `module` in the worker. Does not itself touch the state token —
    /// running a statement has no effect on `Computed` or file state.
    pub async fn run_stmt(
        &self,
        module: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Result<RunHandle, SessionError> {
        self.check_token()?;
        let link = self.worker.ensure_link().await?;
        let request = Request::Run {
            module: module.into(),
            identifier: identifier.into(),
            env_overlay: self.env_overlay.clone(),
        };
        let progress = link.send_run(request).await?;
        Ok(RunHandle { progress })
    }

    /// `buildExecutable` (§4.4, C10): drives the package-build pipeline
    /// for each named executable target.
    pub async fn build_executable(
        &self,
        targets: &[String],
        on_progress: impl FnMut(&str),
    ) -> Result<crate::build::BuildOutcome, SessionError> {
        self.check_token()?;
        let computed = self.computed()?.clone();
        let pkg_deps = self.all_package_deps()?;
        crate::build::build_executables(&self.config, &computed, &pkg_deps, targets, on_progress).await
    }

    /// `buildDoc` (§4.4, C10): drives Haddock over the current snapshot.
    pub async fn build_doc(
        &self,
        on_progress: impl FnMut(&str),
    ) -> Result<crate::build::BuildOutcome, SessionError> {
        self.check_token()?;
        let computed = self.computed()?.clone();
        let pkg_deps = self.all_package_deps()?;
        crate::build::build_doc(&self.config, &computed, &pkg_deps, on_progress).await
    }

    /// `shutdown` (§4.4): advances the token (every further operation on
    /// any outstanding handle, including this one, now fails
    /// `StaleSession`) and tells the worker to exit.
    ///
    /// When `delete_temp_files_on_shutdown` is set (§3 `SessionConfig`,
    /// default `true`), the session's `tempDir` tree is removed once the
    /// worker has exited.
    pub async fn shutdown(&self) -> Result<(), SessionError> {
        {
            let _guard = mutation_lock().lock();
            self.check_token()?;
            token_cell().advance();
        }
        tracing::info!(session = %self.id, "session shutting down");
        self.worker.shutdown().await;

        if self.config.delete_temp_files_on_shutdown {
            match std::fs::remove_dir_all(&self.config.temp_dir) {
                Ok(()) => {}
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
                Err(err) => {
                    tracing::warn!(session = %self.id, temp_dir = ?self.config.temp_dir, %err, "failed to remove temp dir on shutdown");
                    return Err(SessionError::Io(err));
                }
            }
        }

        Ok(())
    }
}

/// The still-in-flight result of `updateSession` (§4.4, §5).
pub struct UpdateHandle {
    prev_computed: Option<Arc<ComputedResult>>,
    next: IdeSession,
    progress: crate::link::ProgressHandle,
}

impl UpdateHandle {
    /// Drains `Progress(Compiling(_))` frames to `on_progress` and
    /// returns the next session value once the terminal result arrives.
    ///
    /// A transport failure (`WorkerGone`/`ProtocolViolation`/`Io`) is
    /// folded into an `OtherError` diagnostic on the returned session
    /// rather than propagated (§7: these are local to the worker, not
    /// the session); only `Cancelled` propagates, since scenario 6 treats
    /// it as something the caller asked for and must observe.
    pub async fn wait(
        self,
        mut on_progress: impl FnMut(&ics_core::Progress),
    ) -> Result<IdeSession, SessionError> {
        let UpdateHandle { prev_computed, next, progress } = self;

        let outcome = progress
            .wait(|frame| {
                if let WorkerFrame::Progress(ProgressFrame::Compiling(p)) = frame {
                    on_progress(p);
                }
            })
            .await;

        let computed = match outcome {
            Ok(WorkerFrame::Result(ResultFrame::Computed(computed))) => computed,
            Ok(WorkerFrame::Result(ResultFrame::Run(_))) => ComputedResult {
                diagnostics: vec![Diagnostic::other(
                    "worker returned a Run result for a Compile request",
                )],
                ..Default::default()
            },
            Ok(_) => unreachable!("ProgressHandle::wait never returns a non-Result frame"),
            Err(SessionError::Cancelled) => return Err(SessionError::Cancelled),
            Err(err @ (SessionError::WorkerGone | SessionError::ProtocolViolation(_) | SessionError::Io(_))) => {
                tracing::warn!(%err, "compile request did not complete cleanly, recovering locally");
                ComputedResult { diagnostics: vec![Diagnostic::other(err.to_string())], ..Default::default() }
            }
            Err(other) => return Err(other),
        };

        let loaded_module_diff = computed.loaded_module_diff(prev_computed.as_deref());
        let modules = next.modules.folded(&computed.module_diffs);

        Ok(IdeSession {
            computed: Some(Arc::new(computed)),
            loaded_module_diff,
            modules: Arc::new(modules),
            ..next
        })
    }

    pub fn canceller(&self) -> Canceller {
        self.progress.canceller()
    }
}

/// The still-in-flight result of `runStmt` (§4.4, §4.7).
pub struct RunHandle {
    progress: crate::link::ProgressHandle,
}

impl RunHandle {
    /// Drains `Progress(Output(_))` frames to `on_output` and returns the
    /// run's outcome. A transport failure folds into
    /// `RunOutcome::Exception` for the same reason `UpdateHandle::wait`
    /// folds into an `OtherError` diagnostic; `Cancelled` still propagates.
    pub async fn wait(self, mut on_output: impl FnMut(&[u8])) -> Result<RunOutcome, SessionError> {
        let outcome = self
            .progress
            .wait(|frame| {
                if let WorkerFrame::Progress(ProgressFrame::Output(bytes)) = frame {
                    on_output(bytes);
                }
            })
            .await;

        match outcome {
            Ok(WorkerFrame::Result(ResultFrame::Run(run_outcome))) => Ok(run_outcome),
            Ok(WorkerFrame::Result(ResultFrame::Computed(_))) => Ok(RunOutcome::Exception {
                message: "worker returned a Compile result for a Run request".to_string(),
            }),
            Ok(_) => unreachable!("ProgressHandle::wait never returns a non-Result frame"),
            Err(SessionError::Cancelled) => Err(SessionError::Cancelled),
            Err(err @ (SessionError::WorkerGone | SessionError::ProtocolViolation(_) | SessionError::Io(_))) => {
                Ok(RunOutcome::Exception { message: err.to_string() })
            }
            Err(other) => Err(other),
        }
    }

    pub fn canceller(&self) -> Canceller {
        self.progress.canceller()
    }
}

fn write_through(base: &Path, path: &str, contents: &[u8]) -> Result<(), SessionError> {
    let full = base.join(path);
    if let Some(parent) = full.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(full, contents).map_err(SessionError::Io)
}

fn delete_through(base: &Path, path: &str) -> Result<(), SessionError> {
    match std::fs::remove_file(base.join(path)) {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(SessionError::Io(err)),
    }
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
