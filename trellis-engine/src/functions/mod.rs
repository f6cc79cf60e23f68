//! Name → callback registries for annotation and head functions.

pub mod annotation;

use std::fmt;
use std::sync::Arc;

use trellis_core::constants::{ANN_AVERAGE, ANN_AVERAGE_LOWER, ANN_MAXIMUM, ANN_MINIMUM};
use trellis_core::types::collections::FxHashMap;
use trellis_core::{Bound, HeadTerm, NodeId, Rule, TrellisError, TrellisResult};

/// Computes a head bound from per-clause annotations and weights.
pub type AnnotationFn = Arc<dyn Fn(&[&[Bound]], &[f64]) -> (f64, f64) + Send + Sync>;

/// Maps the groundings of a head argument to target node ids.
pub type HeadFn = Arc<dyn Fn(&[NodeId]) -> Vec<NodeId> + Send + Sync>;

#[derive(Clone)]
pub struct FunctionRegistry {
    annotations: FxHashMap<String, AnnotationFn>,
    heads: FxHashMap<String, HeadFn>,
}

impl FunctionRegistry {
    /// A registry holding the built-in annotation functions.
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register_annotation(ANN_AVERAGE, annotation::average);
        registry.register_annotation(ANN_AVERAGE_LOWER, annotation::average_lower);
        registry.register_annotation(ANN_MAXIMUM, annotation::maximum);
        registry.register_annotation(ANN_MINIMUM, annotation::minimum);
        registry
    }

    pub fn empty() -> Self {
        Self {
            annotations: FxHashMap::default(),
            heads: FxHashMap::default(),
        }
    }

    /// Register (or replace) an annotation function.
    pub fn register_annotation<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[&[Bound]], &[f64]) -> (f64, f64) + Send + Sync + 'static,
    {
        self.annotations.insert(name.to_string(), Arc::new(function));
    }

    /// Register (or replace) a head function.
    pub fn register_head<F>(&mut self, name: &str, function: F)
    where
        F: Fn(&[NodeId]) -> Vec<NodeId> + Send + Sync + 'static,
    {
        self.heads.insert(name.to_string(), Arc::new(function));
    }

    pub fn annotation(&self, name: &str) -> Option<&AnnotationFn> {
        self.annotations.get(name)
    }

    pub fn head(&self, name: &str) -> Option<&HeadFn> {
        self.heads.get(name)
    }

    pub fn has_annotation(&self, name: &str) -> bool {
        self.annotations.contains_key(name)
    }

    pub fn has_head(&self, name: &str) -> bool {
        self.heads.contains_key(name)
    }

    /// Every function the rule names must be registered.
    pub fn check_rule(&self, rule: &Rule) -> TrellisResult<()> {
        if let Some(name) = &rule.annotation_function {
            if !self.has_annotation(name) {
                return Err(TrellisError::UnknownAnnotationFunction {
                    name: name.clone(),
                    rule: rule.name.clone(),
                });
            }
        }
        for term in &rule.head {
            if let HeadTerm::Function { name, .. } = term {
                if !self.has_head(name) {
                    return Err(TrellisError::UnknownHeadFunction {
                        name: name.clone(),
                        rule: rule.name.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

impl Default for FunctionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for FunctionRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut annotations: Vec<&str> = self.annotations.keys().map(String::as_str).collect();
        let mut heads: Vec<&str> = self.heads.keys().map(String::as_str).collect();
        annotations.sort_unstable();
        heads.sort_unstable();
        f.debug_struct("FunctionRegistry")
            .field("annotations", &annotations)
            .field("heads", &heads)
            .finish()
    }
}
