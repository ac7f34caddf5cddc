use anyhow::Context;
use http::StatusCode;
use once_cell::sync::OnceCell;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{error, info};

use super::config::DispatcherConfig;
use super::core::{Dispatch, OperationDispatcher};
use crate::context::RequestContext;
use crate::spec::{load_contract, Contract};

type ContractLoader = Box<dyn Fn() -> anyhow::Result<Contract> + Send + Sync>;

/// Builds the [`OperationDispatcher`] on first use.
///
/// Concurrent first requests block on a single build and then share its
/// result. A failed build is not remembered: that request gets a 500 and the
/// next one tries again.
pub struct LazyDispatcher {
    loader: ContractLoader,
    config: DispatcherConfig,
    cell: OnceCell<OperationDispatcher>,
    build_attempts: AtomicUsize,
}

impl LazyDispatcher {
    pub fn new<F>(loader: F, config: DispatcherConfig) -> Self
    where
        F: Fn() -> anyhow::Result<Contract> + Send + Sync + 'static,
    {
        Self {
            loader: Box::new(loader),
            config,
            cell: OnceCell::new(),
            build_attempts: AtomicUsize::new(0),
        }
    }

    /// Load the contract from a YAML or JSON file on first use.
    pub fn from_path(path: impl Into<PathBuf>, config: DispatcherConfig) -> Self {
        let path = path.into();
        Self::new(move || load_contract(&path), config)
    }

    /// The dispatcher, building it if this is the first call.
    pub fn get(&self) -> anyhow::Result<&OperationDispatcher> {
        self.cell.get_or_try_init(|| {
            let attempt = self.build_attempts.fetch_add(1, Ordering::SeqCst) + 1;
            info!(attempt, "Building dispatcher");
            let contract = (self.loader)().context("Failed to load contract")?;
            OperationDispatcher::compile(contract, self.config.clone())
                .context("Failed to compile contract")
        })
    }

    #[must_use]
    pub fn is_built(&self) -> bool {
        self.cell.get().is_some()
    }

    /// How many builds have been started, successful or not.
    #[must_use]
    pub fn build_attempts(&self) -> usize {
        self.build_attempts.load(Ordering::SeqCst)
    }

    pub fn dispatch(&self, ctx: &mut RequestContext) -> Dispatch {
        match self.get() {
            Ok(dispatcher) => dispatcher.handle(ctx),
            Err(err) => {
                error!(
                    request_id = %ctx.request_id,
                    error = %format_args!("{err:#}"),
                    "Dispatcher unavailable"
                );
                ctx.content_type = Some("application/json".to_string());
                ctx.respond(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({"error": "Internal Server Error", "code": "INITIALIZATION_FAILED"}),
                );
                Dispatch::Handled
            }
        }
    }
}
