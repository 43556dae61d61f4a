//! Core modules for Proctor

pub mod scorer;
pub mod clock;
pub mod filters;
pub mod signals;
pub mod ledger;
pub mod evidence;
pub mod registry;
pub mod monitor;
pub mod replay;
pub mod api;

pub use scorer::SuspicionScorer;
pub use clock::{Clock, SystemClock, ManualClock};
pub use filters::{HeadSmoother, PhoneDebouncer, SignalFilters};
pub use signals::{SignalProvider, NeutralSignals, ScriptedSignals, gather_signals};
pub use ledger::{Ledger, JsonlLedger, MemoryLedger};
pub use evidence::{EvidenceTrigger, EvidenceSink, FsEvidenceStore, evidence_filename, is_valid_evidence_name};
pub use registry::{Session, SessionHandle, SessionRegistry, CycleOutcome};
pub use monitor::{Proctor, AnalysisOutput, TabEvent, TabEventOutcome};
pub use replay::{Replayer, ReplayRecord, ReplayStep};
pub use api::{create_router, run_server};
