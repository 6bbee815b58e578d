use clap::Args;

/// Flags shared by all three driver binaries (spec.md §6.4): logging
/// verbosity and the thread-pool sizing/memory-ceiling knobs spec.md §5's
/// "Memory budget" and §9's "Global mutable state" describe.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Increase logging verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short = 'v', long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress the warnings this tool emits by default.
    #[arg(short = 'q', long, global = true)]
    pub quiet: bool,

    /// Worker threads for the shared thread pool. Defaults to the number
    /// of logical CPUs.
    #[arg(long, global = true)]
    pub threads: Option<usize>,

    /// Soft memory ceiling, in gigabytes, the thread pool reserves work
    /// against before raising it (spec.md §5's "never deadlocks" policy).
    #[arg(long = "max-memory", global = true)]
    pub max_memory_gb: Option<f64>,
}

impl CommonArgs {
    /// Bring up logging and size the global thread pool. Must run before
    /// any call that might touch `thread_pool::global()` (every `parallel_for`
    /// call anywhere downstream does), since the pool only accepts sizing
    /// on its first initialization.
    pub fn apply(&self) {
        let effective_verbosity = self.verbose + u8::from(!self.quiet);
        logger::Logger::init(effective_verbosity);

        let threads = self.threads.unwrap_or_else(num_cpus::get).max(1);
        let memory_limit = self.max_memory_gb.map_or(usize::MAX, |gb| (gb * 1e9) as usize);
        thread_pool::init(threads, memory_limit);

        log::info!("biograph-core: {threads} worker threads, memory ceiling {}", format_bytes(memory_limit));
    }
}

/// Map a failure to one of spec.md §6.4's exit codes. Since the workspace's
/// per-crate error enums (`SeqRepoError::Io`, `PartRepoError::Io`, ...) each
/// wrap `std::io::Error` rather than sharing one type, this walks the
/// `anyhow` cause chain looking for an I/O source rather than matching on
/// every concrete error type -- a documented simplification (see
/// DESIGN.md) relative to a hand-written match arm per crate.
#[must_use]
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    for cause in err.chain() {
        if cause.downcast_ref::<std::io::Error>().is_some() {
            return 2;
        }
        let msg = cause.to_string();
        if msg.contains("corrupt") || msg.contains("disagree") {
            return 3;
        }
        if msg.contains("overflow") || msg.contains("too small") || msg.contains("density") {
            return 4;
        }
    }
    1
}

fn format_bytes(bytes: usize) -> String {
    if bytes == usize::MAX {
        return "unbounded".to_string();
    }
    let gb = bytes as f64 / 1e9;
    format!("{gb:.2} GB")
}
