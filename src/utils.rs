//! Python conversion helpers for the `python-bindings` surface.
//!
//! Converts array-likes into owned `ndarray` buffers and parses the string
//! and tuple arguments of the Python constructors into validated Rust
//! configuration. Everything here is feature-gated.
#[cfg(feature = "python-bindings")]
use ndarray::{Array1, Array2};

#[cfg(feature = "python-bindings")]
use numpy::{PyReadonlyArray1, PyReadonlyArray2, PyUntypedArrayMethods};

#[cfg(feature = "python-bindings")]
use pyo3::{
    exceptions::{PyTypeError, PyValueError},
    prelude::*,
    types::PyAny,
};

#[cfg(feature = "python-bindings")]
use crate::{
    data::{domain::Domain, node_data::NodeData},
    leaf::NormalOptions,
    learner::factory::LeafConfig,
};

#[cfg(feature = "python-bindings")]
fn narrow(values: impl Iterator<Item = i64>) -> PyResult<Vec<i32>> {
    values
        .map(|v| {
            i32::try_from(v)
                .map_err(|_| PyValueError::new_err(format!("value {v} does not fit in int32")))
        })
        .collect()
}

/// Child column from a 1-D int32/int64 ndarray, a pandas Series, or a
/// sequence of ints.
#[cfg(feature = "python-bindings")]
pub fn extract_i32_array<'py>(raw: &Bound<'py, PyAny>) -> PyResult<Array1<i32>> {
    if let Ok(arr) = raw.extract::<PyReadonlyArray1<i32>>() {
        return Ok(arr.as_array().to_owned());
    }
    if let Ok(arr) = raw.extract::<PyReadonlyArray1<i64>>() {
        return Ok(Array1::from(narrow(arr.as_array().iter().copied())?));
    }
    if let Ok(obj) = raw.call_method1("to_numpy", ()) {
        if let Ok(arr) = obj.extract::<PyReadonlyArray1<i64>>() {
            return Ok(Array1::from(narrow(arr.as_array().iter().copied())?));
        }
    }
    let vec: Vec<i32> = raw.extract().map_err(|_| {
        PyTypeError::new_err("expected a 1-D numpy.ndarray, pandas.Series, or sequence of int")
    })?;
    Ok(Array1::from(vec))
}

/// Parent matrix `[rows, parents]`; `None` means no parents.
#[cfg(feature = "python-bindings")]
pub fn extract_i32_matrix<'py>(raw: Option<&Bound<'py, PyAny>>, rows: usize) -> PyResult<Array2<i32>> {
    let Some(raw) = raw else {
        return Ok(Array2::zeros((rows, 0)));
    };
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<i32>>() {
        return Ok(arr.as_array().to_owned());
    }
    if let Ok(arr) = raw.extract::<PyReadonlyArray2<i64>>() {
        let shape = (arr.shape()[0], arr.shape()[1]);
        let values = narrow(arr.as_array().iter().copied())?;
        return Array2::from_shape_vec(shape, values)
            .map_err(|e| PyValueError::new_err(e.to_string()));
    }
    let nested: Vec<Vec<i32>> = raw.extract().map_err(|_| {
        PyTypeError::new_err("expected a 2-D numpy.ndarray or a sequence of int sequences")
    })?;
    let width = nested.first().map_or(0, Vec::len);
    if nested.iter().any(|row| row.len() != width) {
        return Err(PyValueError::new_err("parent rows must all have the same length"));
    }
    let n = nested.len();
    Array2::from_shape_vec((n, width), nested.into_iter().flatten().collect())
        .map_err(|e| PyValueError::new_err(e.to_string()))
}

/// Validated node data from Python arguments.
#[cfg(feature = "python-bindings")]
pub fn build_node_data<'py>(
    child: &Bound<'py, PyAny>, parents: Option<&Bound<'py, PyAny>>, child_bounds: (i32, i32),
    parent_bounds: Vec<(i32, i32)>,
) -> PyResult<NodeData> {
    let child = extract_i32_array(child)?;
    let parents = extract_i32_matrix(parents, child.len())?;
    let child_domain = Domain::new(child_bounds.0, child_bounds.1)?;
    let parent_domains =
        parent_bounds.into_iter().map(|(lwb, upb)| Domain::new(lwb, upb)).collect::<Result<Vec<_>, _>>()?;
    Ok(NodeData::new(child, parents, child_domain, parent_domains)?)
}

/// Leaf learner from its Python name.
#[cfg(feature = "python-bindings")]
pub fn parse_leaf_config(name: &str, normal: Option<(f64, f64, f64)>) -> PyResult<LeafConfig> {
    let leaf = match name.to_lowercase().as_str() {
        "adaptive" => LeafConfig::adaptive(),
        "mml_adaptive" => LeafConfig::mml_adaptive(),
        "adaptive2" => LeafConfig::adaptive2(),
        "mml_adaptive2" => LeafConfig::mml_adaptive2(),
        "ml" | "maximum_likelihood" => LeafConfig::MaximumLikelihood,
        "mml87" => LeafConfig::Mml87,
        "normal" => {
            let options = match normal {
                Some((precision, mu_range, sigma_range)) => {
                    NormalOptions::new(precision, mu_range, sigma_range)?
                }
                None => NormalOptions::default(),
            };
            LeafConfig::Normal(options)
        }
        other => {
            return Err(PyValueError::new_err(format!(
                "invalid leaf {:?} (expected 'adaptive', 'mml_adaptive', 'adaptive2', \
                 'mml_adaptive2', 'ml', 'mml87', or 'normal')",
                other
            )));
        }
    };
    Ok(leaf)
}
