//! Transform steps and ordered pipelines of named steps.
//!
//! A [`Transform<D>`] consumes one data unit and returns one of the same
//! kind. Two kinds are used in this crate:
//!
//! - [`RawRecording`]: continuous [C, T] data, before windowing
//!   (see [`raw`]).
//! - `Array2<f32>`: a single [C, W] window, after windowing (see [`window`]).
//!
//! A [`Pipeline<D>`] is itself a `Transform<D>` that applies its steps in the
//! order they were added. The first failing step aborts the pipeline and its
//! error is returned unchanged.
//!
//! ```
//! use epochset::transform::{WindowPipeline, Transform};
//! use epochset::transform::window::{FilterWindowTransformer, ZscoreWindowTransformer};
//! use ndarray::Array2;
//!
//! let pipeline = WindowPipeline::empty()
//!     .step("FIR_filter", FilterWindowTransformer::new(250.0, Some(8.0), Some(12.0))?)?
//!     .step("zscorer", ZscoreWindowTransformer)?;
//! assert_eq!(pipeline.names(), vec!["FIR_filter", "zscorer"]);
//!
//! let out = pipeline.transform(Array2::<f32>::ones((22, 200)))?;
//! assert_eq!(out.dim(), (22, 200));
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod raw;
pub mod window;

use anyhow::Result;
use log::debug;
use ndarray::Array2;

use crate::error::Error;
use crate::raw::RawRecording;

/// One processing step over data units of type `D`.
///
/// Transforms take `&self`: all parameters are fixed at construction, so
/// applying the same transform twice to the same input gives the same output.
pub trait Transform<D>: Send + Sync {
    fn transform(&self, data: D) -> Result<D>;
}

impl<D, F> Transform<D> for F
where
    F: Fn(D) -> Result<D> + Send + Sync,
{
    fn transform(&self, data: D) -> Result<D> {
        self(data)
    }
}

/// Pipeline over continuous recordings.
pub type RawPipeline = Pipeline<RawRecording>;

/// Pipeline over single windows.
pub type WindowPipeline = Pipeline<Array2<f32>>;

/// Ordered sequence of named transform steps.
pub struct Pipeline<D> {
    steps: Vec<(String, Box<dyn Transform<D>>)>,
}

impl<D> Pipeline<D> {
    /// A pipeline with no steps; applying it returns the input unchanged.
    pub fn empty() -> Self {
        Self { steps: Vec::new() }
    }

    /// Build a pipeline from `(name, step)` pairs, keeping their order.
    pub fn new<I, S>(steps: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, Box<dyn Transform<D>>)>,
        S: Into<String>,
    {
        steps
            .into_iter()
            .try_fold(Self::empty(), |p, (name, step)| p.push(name.into(), step))
    }

    /// Append a step. Names must be non-empty and unique within the pipeline.
    pub fn step<T>(self, name: impl Into<String>, transform: T) -> Result<Self>
    where
        T: Transform<D> + 'static,
    {
        self.push(name.into(), Box::new(transform))
    }

    fn push(mut self, name: String, transform: Box<dyn Transform<D>>) -> Result<Self> {
        if name.is_empty() {
            return Err(Error::EmptyStepName.into());
        }
        if self.steps.iter().any(|(n, _)| *n == name) {
            return Err(Error::DuplicateStep(name).into());
        }
        self.steps.push((name, transform));
        Ok(self)
    }

    /// Step names in application order.
    pub fn names(&self) -> Vec<&str> {
        self.steps.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Look a step up by name.
    pub fn named_step(&self, name: &str) -> Option<&dyn Transform<D>> {
        self.steps
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, t)| t.as_ref())
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl<D> Default for Pipeline<D> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<D> Transform<D> for Pipeline<D> {
    fn transform(&self, data: D) -> Result<D> {
        self.steps.iter().try_fold(data, |acc, (name, step)| {
            debug!("applying step `{name}`");
            step.transform(acc)
        })
    }
}

impl<D> std::fmt::Debug for Pipeline<D> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline").field("steps", &self.names()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;

    fn add(k: i64) -> impl Fn(i64) -> Result<i64> + Send + Sync {
        move |x| Ok(x + k)
    }

    fn mul(k: i64) -> impl Fn(i64) -> Result<i64> + Send + Sync {
        move |x| Ok(x * k)
    }

    #[test]
    fn steps_apply_in_construction_order() {
        let p = Pipeline::<i64>::empty().step("add", add(3)).unwrap().step("mul", mul(2)).unwrap();
        assert_eq!(p.transform(1).unwrap(), 8); // (1 + 3) * 2

        let q = Pipeline::<i64>::empty().step("mul", mul(2)).unwrap().step("add", add(3)).unwrap();
        assert_eq!(q.transform(1).unwrap(), 5); // 1 * 2 + 3
    }

    #[test]
    fn new_keeps_iterator_order() {
        let steps: Vec<(&str, Box<dyn Transform<i64>>)> = vec![
            ("a", Box::new(mul(10))),
            ("b", Box::new(add(1))),
            ("c", Box::new(mul(10))),
        ];
        let p = Pipeline::new(steps).unwrap();
        assert_eq!(p.names(), vec!["a", "b", "c"]);
        assert_eq!(p.transform(2).unwrap(), 210);
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let p: Pipeline<i64> = Pipeline::empty();
        assert!(p.is_empty());
        assert_eq!(p.transform(42).unwrap(), 42);
    }

    #[test]
    fn duplicate_and_empty_names_rejected() {
        let err = Pipeline::<i64>::empty()
            .step("zscorer", add(1))
            .unwrap()
            .step("zscorer", add(2))
            .unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::DuplicateStep("zscorer".into())));

        let err = Pipeline::<i64>::empty().step("", add(1)).unwrap_err();
        assert_eq!(err.downcast_ref::<Error>(), Some(&Error::EmptyStepName));
    }

    #[test]
    fn first_error_stops_the_chain() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let calls = Arc::new(AtomicUsize::new(0));
        let counted = {
            let calls = calls.clone();
            move |x: i64| -> Result<i64> {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(x)
            }
        };
        let failing = |_x: i64| -> Result<i64> { bail!("step exploded") };

        let p = Pipeline::<i64>::empty()
            .step("fail", failing).unwrap()
            .step("count", counted).unwrap();
        let err = p.transform(0).unwrap_err();
        assert_eq!(err.to_string(), "step exploded");
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn nested_pipelines_compose() {
        let inner = Pipeline::<i64>::empty().step("add", add(1)).unwrap();
        let outer = Pipeline::<i64>::empty()
            .step("inner", inner).unwrap()
            .step("mul", mul(3)).unwrap();
        assert_eq!(outer.transform(1).unwrap(), 6);
        assert!(outer.named_step("inner").is_some());
        assert!(outer.named_step("missing").is_none());
    }
}
