//! shoplens - terminal dashboard for e-commerce analytics.
//!
//! Fetches the pre-aggregated analysis payload from the analytics service,
//! validates it, and maps each metric to a chart or text view.
//!
//! ```no_run
//! use shoplens::client::AnalysisClient;
//! use shoplens::session::{PayloadSource, Session};
//! use std::time::Duration;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let client = AnalysisClient::new("http://localhost:5001/api/analysis", Duration::from_secs(30))?;
//! let session = Session::new(PayloadSource::Http(client));
//! session.start();
//! if let Some(payload) = session.settled().await.payload() {
//!     let views = shoplens::views::build_views(payload);
//!     println!("{} views", views.len());
//! }
//! # Ok(())
//! # }
//! ```

pub mod cli;
pub mod client;
pub mod config;
pub mod contract;
pub mod provision;
pub mod report;
pub mod session;
pub mod views;

pub use client::{AnalysisClient, FetchError};
pub use contract::{decode, AnalysisPayload, DecodeError, DecodeErrorKind};
pub use session::{PayloadSource, Session, SessionState, FAILURE_MESSAGE};
pub use views::{build_views, View};
