//! Generation Session
//!
//! Explicit context object for the VM-backed generation flow. Owns the
//! shared output buffer, the bound VM, the command channel and the
//! completion race. Everything the original deployment kept in
//! module-level globals lives here, passed to whoever needs it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{info, warn};

use crate::config::ProtocolConfig;
use crate::error::{Error, Result};
use crate::models::{AccountRecord, GenerationRequest};
use crate::projector::ResultProjector;
use crate::protocol::{CommandChannel, CompletionRace, RaceOutcome};
use crate::script::ScriptBuilder;
use crate::terminal::{OutputBuffer, PromptDetector};
use crate::vm::VirtualMachine;

/// One VM-backed credential generation context
///
/// Only one generation is meant to be in flight at a time; the busy guard
/// rejects a second concurrent call rather than letting two commands race
/// the same buffer with no way to attribute bytes to either.
pub struct GenerationSession {
    buffer: Arc<OutputBuffer>,
    vm: Arc<dyn VirtualMachine>,
    channel: Arc<CommandChannel>,
    race: CompletionRace,
    prompt: PromptDetector,
    timing: ProtocolConfig,
    generating: AtomicBool,
}

impl GenerationSession {
    /// Create a session with its own buffer
    pub fn new(vm: Arc<dyn VirtualMachine>, timing: ProtocolConfig) -> Self {
        let buffer = Arc::new(OutputBuffer::with_cap(timing.buffer_cap));
        Self::with_buffer(vm, buffer, timing)
    }

    /// Create a session over an existing buffer
    ///
    /// Used when the embedder already mirrors a terminal sink into a buffer
    /// (see [`MirrorSink`]) and the session should watch that one.
    ///
    /// [`MirrorSink`]: crate::terminal::MirrorSink
    pub fn with_buffer(
        vm: Arc<dyn VirtualMachine>,
        buffer: Arc<OutputBuffer>,
        timing: ProtocolConfig,
    ) -> Self {
        let channel = Arc::new(
            CommandChannel::new(Arc::clone(&buffer))
                .with_timing(timing.command_poll(), timing.dispatch_cap()),
        );
        channel.bind(Arc::clone(&vm));
        let race = CompletionRace::new(Arc::clone(&buffer), Arc::clone(&channel))
            .with_json_poll(timing.json_poll());

        Self {
            buffer,
            vm,
            channel,
            race,
            prompt: PromptDetector::new(),
            timing,
            generating: AtomicBool::new(false),
        }
    }

    /// The shared output buffer this session watches
    pub fn buffer(&self) -> &Arc<OutputBuffer> {
        &self.buffer
    }

    /// The command channel into the VM
    pub fn channel(&self) -> &Arc<CommandChannel> {
        &self.channel
    }

    /// Whether a generation is currently in flight
    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Boot the VM and wait for its shell to come up
    pub async fn boot(&self) -> Result<()> {
        info!("Initializing VM");
        self.vm.init().await?;
        self.wait_for_shell(self.timing.boot_wait()).await
    }

    /// Wait for a shell prompt to appear in the output stream
    ///
    /// The VM gives no ready signal, so readiness is inferred from
    /// prompt-looking output. Polls once per boot interval up to `budget`.
    pub async fn wait_for_shell(&self, budget: Duration) -> Result<()> {
        let deadline = Instant::now() + budget;
        loop {
            if self.prompt.contains_prompt(&self.buffer.snapshot()) {
                info!("Shell prompt detected; VM is ready");
                return Ok(());
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(Error::ShellNotReady { duration: budget });
            }
            tokio::time::sleep(self.timing.boot_poll().min(deadline - now)).await;
        }
    }

    /// Run one credential generation through the VM
    ///
    /// Total apart from the busy guard: every protocol-level failure comes
    /// back as a `failed` record, never as an error.
    pub async fn generate(&self, request: &GenerationRequest) -> Result<AccountRecord> {
        if self.generating.swap(true, Ordering::AcqRel) {
            return Err(Error::GenerationInProgress);
        }
        let record = self.run_generation(request).await;
        self.generating.store(false, Ordering::Release);
        Ok(record)
    }

    async fn run_generation(&self, request: &GenerationRequest) -> AccountRecord {
        info!(
            "Starting account generation for {} {}",
            request.first_name, request.last_name
        );

        // Fresh mark for a fresh race: stale JSON from an earlier run must
        // not satisfy this one.
        self.buffer.clear();

        let script = ScriptBuilder::new(request);

        info!("Staging generation script in the VM");
        if let Err(e) = self
            .channel
            .send_with_wait(&script.staging_command(), self.timing.script_stage_wait())
            .await
        {
            warn!("Failed to stage generation script: {}", e);
            return ResultProjector::project(
                &RaceOutcome::Failed {
                    reason: e.to_string(),
                },
                request,
            );
        }
        tokio::time::sleep(self.timing.script_settle()).await;

        info!("Running generation script; this may take a few minutes");
        let outcome = self
            .race
            .run_and_collect(
                &script.run_command(),
                self.timing.script_exec_wait(),
                self.timing.script_json_wait(),
            )
            .await;

        ResultProjector::project(&outcome, request)
    }
}

impl std::fmt::Debug for GenerationSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenerationSession")
            .field("generating", &self.is_generating())
            .field("buffer_len", &self.buffer.len())
            .finish()
    }
}
