//! # Sysconf Requests
//!
//! Ordered, deduplicating execution of host configuration commands.
//!
//! ```text
//! payload ──> RequestHandlers::handle_request
//!               │ RequestFactory: categories in fixed order
//!               │   ipbx ─> agentbus ─> chown_autoprov_config
//!               ▼
//!             Request [Command, Command, ...] + observers
//!               │ put
//!               ▼
//!             RequestQueue ──(on put / on get)──> DuplicateRequestOptimizer
//!               │ get (single consumer, FIFO)
//!               ▼
//!             RequestProcessor ─> Request::execute
//!                                   ├─ Command::execute ─> Executor (skipped if optimized)
//!                                   └─ observers: completion event, sync waiter
//! ```

mod agentbus;
mod asterisk;
mod chown_autoprov;
mod command;
mod error;
mod events_handler;
mod executor;
mod factory;
mod handlers;
mod observer;
mod optimizer;
mod processor;
mod queue;
mod request;

pub use agentbus::{AgentBusCommand, AgentBusCommandFactory, AgentBusExecutor, AGENTBUS_EXECUTOR};
pub use asterisk::{
    AsteriskCommandExecutor, AsteriskCommandFactory, AsteriskSettings, ASTERISK_EXECUTOR,
};
pub use chown_autoprov::{
    lookup_account, Account, ChownAutoprovExecutor, ChownAutoprovSettings,
    CHOWN_AUTOPROV_EXECUTOR,
};
pub use command::{Command, CommandFactory, SimpleCommandFactory};
pub use error::{RequestError, Result};
pub use events_handler::ReloadEventHandler;
pub use executor::{Executor, ExecutorId, ProcessOutput, ProcessRunner, SystemProcessRunner};
pub use factory::{CommandCategory, RequestFactory};
pub use handlers::{HandlingMode, RequestHandlers, DEFAULT_SYNC_TIMEOUT};
pub use observer::{RequestCompletedEventObserver, SyncRequestObserver};
pub use optimizer::{DuplicateRequestOptimizer, RequestOptimizer};
pub use processor::RequestProcessor;
pub use queue::RequestQueue;
pub use request::{Request, RequestObserver};
