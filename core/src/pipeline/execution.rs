// bagworks/src/pipeline/execution.rs

//! `Pipeline::run()`: walks the steps in order against one shared context.

use crate::error::BagworksError;
use crate::pipeline::context_data::ContextData;
use crate::pipeline::control::{PipelineControl, PipelineResult};
use crate::pipeline::definition::Pipeline;
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<BagworksError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// A required step's handler error aborts the run and is returned as is.
  /// A best-effort step's error is logged and swallowed. A required step with
  /// no handlers fails with [`BagworksError::StepHandlerMissing`].
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(pipeline = self.name, num_steps = self.steps.len()),
    err(Display)
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "pipeline_step",
        step_name,
        step_index = step_idx,
        best_effort = step_def.best_effort
      );

      if let Some(skip_if) = &step_def.skip_if {
        let skip = {
          let guard = ctx_data.read();
          skip_if(&guard)
        };
        if skip {
          step_span.in_scope(|| event!(Level::DEBUG, "Step skipped by condition."));
          continue;
        }
      }

      let handlers = match self.handlers.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.best_effort => {
          step_span.in_scope(|| event!(Level::DEBUG, "Best-effort step has no handlers, skipping."));
          continue;
        }
        _ => {
          step_span.in_scope(|| event!(Level::ERROR, "Required step has no handlers."));
          return Err(Err::from(BagworksError::StepHandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      for (handler_idx, handler_fn) in handlers.iter().enumerate() {
        let outcome = handler_fn(ctx_data.clone())
          .instrument(span!(parent: &step_span, Level::DEBUG, "step_handler", handler_index = handler_idx))
          .await;

        match outcome {
          Ok(PipelineControl::Continue) => {}
          Ok(PipelineControl::Stop) => {
            step_span.in_scope(|| event!(Level::INFO, "Pipeline stopped by handler."));
            return Ok(PipelineResult::Stopped);
          }
          Err(e) if step_def.best_effort => {
            step_span.in_scope(|| event!(Level::WARN, error = %e, "Best-effort step failed; continuing."));
            break;
          }
          Err(e) => {
            step_span.in_scope(|| event!(Level::ERROR, error = %e, "Step failed."));
            return Err(e);
          }
        }
      }
    }

    Ok(PipelineResult::Completed)
  }
}
