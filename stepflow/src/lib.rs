//! # Stepflow
//!
//! A minimal, correct asynchronous step pipeline with cooperative
//! cancellation and deterministic resource teardown.
//!
//! Stepflow provides two cooperating building blocks:
//!
//! - **Step pipelines**: chain a fixed sequence of cancellable async steps,
//!   each consuming the previous step's output. The first failure surfaces
//!   unchanged to the caller; nothing is swallowed into a sentinel value.
//! - **Cancellable resources**: wrap anything that needs asynchronous
//!   teardown behind an idempotent, awaitable `dispose`, safe to request
//!   from concurrent call sites.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use stepflow::prelude::*;
//!
//! let pipeline = PipelineBuilder::new("sum")
//!     .step_fn("start", |_, _| async { anyhow::Ok(3) })
//!     .step_fn("increment", |x: i32, _| async move { anyhow::Ok(x + 1) })
//!     .build();
//!
//! let token = CancelToken::new();
//! let outcome = pipeline.run(0, &token).await?;
//! assert_eq!(outcome.outputs.iter().sum::<i32>(), 7);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod cancellation;
pub mod errors;
pub mod observability;
pub mod pipeline;
pub mod resource;
pub mod steps;
pub mod testing;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::cancellation::{
        run_with_teardown, CancelToken, CleanupStack, DisposeGuard,
    };
    pub use crate::errors::StepflowError;
    pub use crate::pipeline::{
        LoggingReportSink, NoOpReportSink, Pipeline, PipelineBuilder, ReportSink,
        RunId, RunOutcome, RunReport, StepReport, StepStatus,
    };
    pub use crate::resource::{
        using, BufferSink, CancellableResource, DisposalState, Operate, Teardown,
    };
    pub use crate::steps::{FnStep, PassthroughStep, Step};
}
