//! Callable values

use crate::error::{Error, Result};
use crate::value::Value;
use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;

type FnBody = dyn Fn(&[Value]) -> Result<Value> + Send + Sync;

/// A first-class function value
///
/// Cheap to clone; two `Func`s are equal only when they share the same body.
///
/// # Example
///
/// ```rust
/// use loam_core::{Func, Value};
///
/// let inc = Func::new("inc", |args| match args {
///     [Value::Long(n)] => Ok(Value::Long(n + 1)),
///     _ => Err(loam_core::Error::user("inc expects one long")),
/// });
/// assert_eq!(inc.invoke1(Value::Long(1)).unwrap(), Value::Long(2));
/// ```
#[derive(Clone)]
pub struct Func {
    name: Arc<str>,
    body: Arc<FnBody>,
}

impl Func {
    /// Create a named function
    #[must_use]
    pub fn new<F>(name: impl Into<Arc<str>>, body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            body: Arc::new(body),
        }
    }

    /// Create an anonymous function
    #[inline]
    #[must_use]
    pub fn anonymous<F>(body: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Value> + Send + Sync + 'static,
    {
        Self::new("fn", body)
    }

    /// Function name used in diagnostics
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Call with an argument slice
    ///
    /// # Errors
    /// Propagates whatever the function body returns
    #[inline]
    pub fn invoke(&self, args: &[Value]) -> Result<Value> {
        (self.body)(args)
    }

    /// Call with no arguments
    ///
    /// # Errors
    /// Propagates whatever the function body returns
    #[inline]
    pub fn invoke0(&self) -> Result<Value> {
        self.invoke(&[])
    }

    /// Call with one argument
    ///
    /// # Errors
    /// Propagates whatever the function body returns
    #[inline]
    pub fn invoke1(&self, a: Value) -> Result<Value> {
        self.invoke(&[a])
    }

    /// Call with two arguments
    ///
    /// # Errors
    /// Propagates whatever the function body returns
    #[inline]
    pub fn invoke2(&self, a: Value, b: Value) -> Result<Value> {
        self.invoke(&[a, b])
    }

    /// Call with a leading argument followed by `rest`
    ///
    /// # Errors
    /// Propagates whatever the function body returns
    pub fn apply_to(&self, first: Value, rest: &[Value]) -> Result<Value> {
        let mut args = Vec::with_capacity(rest.len() + 1);
        args.push(first);
        args.extend_from_slice(rest);
        self.invoke(&args)
    }

    /// Arity error naming this function
    #[inline]
    #[must_use]
    pub fn arity_error(&self, given: usize) -> Error {
        Error::Arity {
            name: self.name.to_string(),
            given,
        }
    }

    /// Identity comparison
    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.body, &other.body)
    }

    /// Identity-derived hash
    #[inline]
    #[must_use]
    pub fn identity_hash(&self) -> i32 {
        let addr = Arc::as_ptr(&self.body).cast::<()>() as usize;
        crate::hash::long_hash_code(addr as i64)
    }
}

impl Debug for Func {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#<fn {}>", self.name)
    }
}
