use log::trace;
use mapsail_datasource::{DatasourceError, DatasourceResult, Feature, Featureset};
use pyo3::prelude::*;
use pyo3::types::PyIterator;

use crate::conversion::feature_from_py;
use crate::datasource::PythonDatasourceOptions;
use crate::error::{PythonDatasourceError, PythonDatasourceResult};
use crate::guard::{with_runtime, ExclusiveGuard};

/// A position in a Python iterator.
/// `current` is the element that has been fetched but not yet yielded.
struct Cursor {
    iterator: Py<PyIterator>,
    current: PyObject,
}

enum CursorState {
    Active(Cursor),
    /// Advancing the iterator failed after the previous feature was yielded.
    /// The error is reported by the next pull.
    Failed(DatasourceError),
    Exhausted,
}

fn advance<'py>(iterator: &Bound<'py, PyIterator>) -> PyResult<Option<Bound<'py, PyAny>>> {
    iterator.clone().next().transpose()
}

impl CursorState {
    fn start<'py>(
        _guard: &ExclusiveGuard<'py>,
        iterable: &Bound<'py, PyAny>,
    ) -> PythonDatasourceResult<Self> {
        let iterator = iterable.try_iter()?;
        match advance(&iterator)? {
            Some(current) => Ok(CursorState::Active(Cursor {
                iterator: iterator.unbind(),
                current: current.unbind(),
            })),
            None => Ok(CursorState::Exhausted),
        }
    }
}

impl Cursor {
    /// Converts the current element and moves to the next one.
    fn step(
        self,
        guard: &ExclusiveGuard<'_>,
        traceback_limit: Option<usize>,
    ) -> (DatasourceResult<Option<Feature>>, CursorState) {
        let py = guard.py();
        let Cursor { iterator, current } = self;
        let feature = match feature_from_py(current.bind(py)) {
            Ok(x) => x,
            Err(e) => {
                return (
                    Err(e.into_datasource_error(py, traceback_limit)),
                    CursorState::Exhausted,
                )
            }
        };
        let iterator = iterator.into_bound(py);
        let state = match advance(&iterator) {
            Ok(Some(next)) => CursorState::Active(Cursor {
                iterator: iterator.unbind(),
                current: next.unbind(),
            }),
            Ok(None) => {
                trace!("Python feature iterator exhausted");
                CursorState::Exhausted
            }
            Err(e) => CursorState::Failed(
                PythonDatasourceError::from(e).into_datasource_error(py, traceback_limit),
            ),
        };
        (Ok(Some(feature)), state)
    }
}

/// A lazy, single-pass feature sequence backed by a Python iterable.
///
/// Each pull acquires the [`ExclusiveGuard`] separately, so the host is free
/// to do other work between pulls. Once the sequence ends, or an error is
/// reported, every later pull returns `Ok(None)` without touching the Python runtime.
pub struct PythonFeatureset {
    state: CursorState,
    options: PythonDatasourceOptions,
}

impl PythonFeatureset {
    /// Starts iterating over the Python iterable.
    /// The first element is fetched eagerly so that exhaustion is known without the guard.
    pub(crate) fn try_new<'py>(
        guard: &ExclusiveGuard<'py>,
        iterable: &Bound<'py, PyAny>,
        options: PythonDatasourceOptions,
    ) -> PythonDatasourceResult<Self> {
        let state = CursorState::start(guard, iterable)?;
        Ok(Self { state, options })
    }

    pub fn is_exhausted(&self) -> bool {
        matches!(self.state, CursorState::Exhausted)
    }
}

impl Featureset for PythonFeatureset {
    fn next(&mut self) -> DatasourceResult<Option<Feature>> {
        let cursor = match std::mem::replace(&mut self.state, CursorState::Exhausted) {
            CursorState::Exhausted => return Ok(None),
            CursorState::Failed(e) => return Err(e),
            CursorState::Active(cursor) => cursor,
        };
        let traceback_limit = self.options.traceback_limit;
        let (feature, state) = with_runtime(|guard| cursor.step(guard, traceback_limit));
        self.state = state;
        feature
    }
}

impl Drop for PythonFeatureset {
    fn drop(&mut self) {
        if let CursorState::Active(cursor) =
            std::mem::replace(&mut self.state, CursorState::Exhausted)
        {
            // Dropping the iterator may run Python code (e.g. `finally` blocks in generators).
            with_runtime(|_| drop(cursor));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::load_module;

    const MODULE_SOURCE_CODE: &str = r#"
class Feature:
    def __init__(self, id):
        self.id = id

state = {"closed": False}

def generate(n):
    try:
        for i in range(n):
            yield Feature(i)
    finally:
        state["closed"] = True

def failing():
    yield Feature(1)
    raise KeyError("gone")
"#;

    fn start(name: &str, function: &str, args: Vec<i64>) -> PyResult<PythonFeatureset> {
        with_runtime(|guard| {
            let module = load_module(guard.py(), name, MODULE_SOURCE_CODE)?;
            let iterable = module
                .getattr(function)?
                .call1(pyo3::types::PyTuple::new(guard.py(), args)?)?;
            PythonFeatureset::try_new(guard, &iterable, PythonDatasourceOptions::default())
                .map_err(|e| match e {
                    PythonDatasourceError::PythonError(e) => e,
                    e => pyo3::exceptions::PyRuntimeError::new_err(e.to_string()),
                })
        })
    }

    fn generator_closed(name: &str) -> PyResult<bool> {
        with_runtime(|guard| {
            guard
                .py()
                .import(name)?
                .getattr("state")?
                .get_item("closed")?
                .extract()
        })
    }

    #[test]
    fn test_featureset_releases_abandoned_iterator() -> PyResult<()> {
        pyo3::prepare_freethreaded_python();

        let mut featureset = start("test_featureset_abandoned", "generate", vec![10])?;
        let ids = (0..2)
            .map(|_| featureset.next().map(|x| x.map(|f| f.id())))
            .collect::<Vec<_>>();
        assert_eq!(ids, vec![Ok(Some(0)), Ok(Some(1))]);
        assert!(!generator_closed("test_featureset_abandoned")?);
        drop(featureset);
        assert!(generator_closed("test_featureset_abandoned")?);
        Ok(())
    }

    #[test]
    fn test_featureset_reports_iteration_error_after_yielded_feature() -> PyResult<()> {
        pyo3::prepare_freethreaded_python();

        let mut featureset = start("test_featureset_failing", "failing", vec![])?;
        assert_eq!(featureset.next().map(|x| x.map(|f| f.id())), Ok(Some(1)));
        let err = match featureset.next() {
            Err(e) => e,
            Ok(_) => return Err(pyo3::exceptions::PyRuntimeError::new_err("expected an error")),
        };
        assert!(err.message().contains("KeyError: 'gone'"));
        assert_eq!(featureset.next(), Ok(None));
        assert!(featureset.is_exhausted());
        Ok(())
    }

    #[test]
    fn test_featureset_empty_iterable() -> PyResult<()> {
        pyo3::prepare_freethreaded_python();

        let mut featureset = start("test_featureset_empty", "generate", vec![0])?;
        assert!(featureset.is_exhausted());
        assert_eq!(featureset.next(), Ok(None));
        assert!(generator_closed("test_featureset_empty")?);
        Ok(())
    }
}
