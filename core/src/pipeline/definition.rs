// bagworks/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` type: an ordered list of named steps and the
//! async handlers attached to them.

use crate::error::BagworksError;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::PipelineControl;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

/// A step handler. It receives a clone of the run's `ContextData` and resolves
/// to a flow signal or the pipeline's error type.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// Predicate evaluated before a step; `true` skips it.
pub type SkipCondition<TData> = Arc<dyn Fn(&TData) -> bool + Send + Sync + 'static>;

/// One named step.
///
/// A `best_effort` step is its own failure domain: a handler error is logged
/// and the run carries on with the next step.
#[derive(Clone)]
pub struct StepDef<TData: 'static + Send + Sync> {
  pub name: String,
  pub best_effort: bool,
  pub skip_if: Option<SkipCondition<TData>>,
}

impl<TData: 'static + Send + Sync> std::fmt::Debug for StepDef<TData> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.debug_struct("StepDef")
      .field("name", &self.name)
      .field("best_effort", &self.best_effort)
      .field("skip_if_present", &self.skip_if.is_some())
      .finish()
  }
}

pub struct Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<BagworksError> + Send + Sync + 'static,
{
  pub(crate) name: &'static str,
  pub(crate) steps: Vec<StepDef<TData>>,
  pub(crate) handlers: HashMap<String, Vec<Handler<TData, Err>>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<BagworksError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(step name, best_effort)` pairs, in run order.
  pub fn new(name: &'static str, step_defs: &[(&str, bool)]) -> Self {
    let steps = step_defs
      .iter()
      .map(|(step_name, best_effort)| StepDef {
        name: (*step_name).to_string(),
        best_effort: *best_effort,
        skip_if: None,
      })
      .collect();

    Self {
      name,
      steps,
      handlers: HashMap::new(),
    }
  }

  pub fn name(&self) -> &'static str {
    self.name
  }

  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics on an unknown step name: that is a wiring bug, not a runtime error.
  fn step_mut(&mut self, step_name: &str) -> &mut StepDef<TData> {
    let pipeline_name = self.name;
    self
      .steps
      .iter_mut()
      .find(|s| s.name == step_name)
      .unwrap_or_else(|| panic!("pipeline '{}' has no step named '{}'", pipeline_name, step_name))
  }

  /// Attaches a handler to a step. Handlers on the same step run in the order
  /// they were attached.
  pub fn on_root<F, UserErr>(
    &mut self,
    step_name: &str,
    handler_fn: impl Fn(ContextData<TData>) -> F + Send + Sync + 'static,
  ) where
    F: Future<Output = Result<PipelineControl, UserErr>> + Send + 'static,
    UserErr: Into<Err> + Send + Sync + 'static,
  {
    self.step_mut(step_name);
    let handler: Handler<TData, Err> = Box::new(move |ctx_data| {
      let user_fut = handler_fn(ctx_data);
      Box::pin(async move { user_fut.await.map_err(Into::into) })
    });
    self.handlers.entry(step_name.to_string()).or_default().push(handler);
  }

  pub fn skip_step_if(&mut self, step_name: &str, condition: impl Fn(&TData) -> bool + Send + Sync + 'static) {
    self.step_mut(step_name).skip_if = Some(Arc::new(condition));
  }

  pub fn set_best_effort(&mut self, step_name: &str, best_effort: bool) {
    self.step_mut(step_name).best_effort = best_effort;
  }
}
