// bagworks/src/registry.rs

//! `Workflows<E>`: a registry of pipelines keyed by their context type.
//! Each storefront workflow runs over its own context struct, so the context
//! type is enough to find the pipeline.

use crate::error::BagworksError;
use crate::pipeline::{ContextData, Pipeline, PipelineResult};

use async_trait::async_trait;
use parking_lot::RwLock;
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{event, instrument, Level};

#[async_trait]
trait ErasedPipeline<AppErr>: Send + Sync
where
  AppErr: std::error::Error + Send + Sync + 'static,
{
  fn name(&self) -> &'static str;

  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr>;
}

struct PipelineEntry<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<BagworksError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<BagworksError> + Send + Sync + 'static,
{
  pipeline: Arc<Pipeline<TData, HandlerErr>>,
  _phantom: PhantomData<fn() -> AppErr>,
}

#[async_trait]
impl<TData, HandlerErr, AppErr> ErasedPipeline<AppErr> for PipelineEntry<TData, HandlerErr, AppErr>
where
  TData: 'static + Send + Sync,
  HandlerErr: std::error::Error + From<BagworksError> + Send + Sync + 'static,
  AppErr: std::error::Error + From<HandlerErr> + From<BagworksError> + Send + Sync + 'static,
{
  fn name(&self) -> &'static str {
    self.pipeline.name()
  }

  async fn run_erased(&self, ctx_obj: Box<dyn Any + Send>) -> Result<PipelineResult, AppErr> {
    let ctx_data = match ctx_obj.downcast::<ContextData<TData>>() {
      Ok(boxed) => *boxed,
      Err(_) => {
        let expected = std::any::type_name::<ContextData<TData>>();
        event!(Level::ERROR, expected, "Context type mismatch in workflow registry.");
        return Err(AppErr::from(BagworksError::Internal(format!(
          "workflow context type mismatch, expected {}",
          expected
        ))));
      }
    };
    self.pipeline.run(ctx_data).await.map_err(AppErr::from)
  }
}

pub struct Workflows<AppErr = BagworksError>
where
  AppErr: std::error::Error + From<BagworksError> + Send + Sync + 'static,
{
  entries: RwLock<HashMap<TypeId, Arc<dyn ErasedPipeline<AppErr>>>>,
}

impl<AppErr> Default for Workflows<AppErr>
where
  AppErr: std::error::Error + From<BagworksError> + Send + Sync + 'static,
{
  fn default() -> Self {
    Self::new()
  }
}

impl<AppErr> Workflows<AppErr>
where
  AppErr: std::error::Error + From<BagworksError> + Send + Sync + 'static,
{
  pub fn new() -> Self {
    Self {
      entries: RwLock::new(HashMap::new()),
    }
  }

  /// Registers `pipeline` under its context type. A later registration for the
  /// same type replaces the earlier one.
  pub fn register<TData, HandlerErr>(&self, pipeline: Pipeline<TData, HandlerErr>)
  where
    TData: 'static + Send + Sync,
    HandlerErr: std::error::Error + From<BagworksError> + Send + Sync + 'static,
    AppErr: From<HandlerErr>,
  {
    event!(
      Level::DEBUG,
      pipeline = pipeline.name(),
      context_type = %std::any::type_name::<TData>(),
      "Registering workflow."
    );
    let entry = PipelineEntry::<TData, HandlerErr, AppErr> {
      pipeline: Arc::new(pipeline),
      _phantom: PhantomData,
    };
    self.entries.write().insert(TypeId::of::<TData>(), Arc::new(entry));
  }

  pub fn is_registered<TData: 'static>(&self) -> bool {
    self.entries.read().contains_key(&TypeId::of::<TData>())
  }

  /// Runs the pipeline registered for `TData`.
  #[instrument(name = "Workflows::run", skip_all, fields(context_type = %std::any::type_name::<TData>()))]
  pub async fn run<TData>(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, AppErr>
  where
    TData: 'static + Send + Sync,
  {
    let entry = self.entries.read().get(&TypeId::of::<TData>()).cloned();
    let entry = entry.ok_or_else(|| {
      let type_name = std::any::type_name::<TData>();
      event!(Level::ERROR, "No workflow registered for {}.", type_name);
      AppErr::from(BagworksError::Configuration(format!(
        "no workflow registered for {}",
        type_name
      )))
    })?;
    event!(Level::DEBUG, pipeline = entry.name(), "Dispatching workflow.");
    entry.run_erased(Box::new(ctx_data)).await
  }
}
