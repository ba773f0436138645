//! # gsa-algo: Power Flow, Dispatch, and Contingency Screening
//!
//! The analysis layer of GSA. Three runners share one network model and one
//! violation-classification policy:
//!
//! | entry point | what it does |
//! |---|---|
//! | [`run_power_flow`] | Newton-Raphson AC solve, violations, energy summary |
//! | [`run_dispatch`] | least-cost constrained dispatch plus AC verification |
//! | [`run_n1`] | N-1 branch-outage screening over a solved base case |
//!
//! ## Outcome discipline
//!
//! Solver-level faults never escape as raised errors. Each runner returns
//! `Result<Report, SolveFailure>` where the failure is data: a kind
//! (convergence vs. anything else) plus detail text. The contingency engine
//! consumes those failures into FAIL report rows and itself always returns
//! a complete report.
//!
//! ## Example
//!
//! ```ignore
//! use gsa_algo::{run_power_flow, run_n1, N1Options, PfOptions};
//!
//! let mut net = gsa_cases::load_case("case9")?;
//! let report = run_power_flow(&mut net, &PfOptions::default())
//!     .expect("healthy base case");
//! assert!(report.violations.is_clean());
//!
//! let screening = run_n1(&net, &N1Options::default());
//! println!("{}/{} outages secure", screening.len() - screening.failures(), screening.len());
//! ```

pub mod contingency;
pub mod dispatch;
pub mod outcome;
pub mod pf;
pub mod violations;

pub use contingency::{
    run_n1, ContingencyOutcome, N1Options, N1Report, OutcomeStatus, Resolve,
};
pub use dispatch::{run_dispatch, DispatchReport, OpfOptions};
pub use outcome::{FailureKind, PowerSummary, SolveFailure, SolveOutcome};
pub use pf::{run_power_flow, BusType, InitStrategy, PfOptions, PfReport};
pub use violations::{classify, ViolationLimits, ViolationSummary};
