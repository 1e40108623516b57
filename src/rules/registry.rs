//! Rule registration, dependency validation, and dependency-depth ordering
//! via DFS white/gray/black coloring.

use std::collections::HashMap;
use std::sync::Arc;

use super::Rule;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("rule `{0}` is already registered")]
    DuplicateRule(String),
    #[error("rule `{0}` depends on unregistered rule `{1}`")]
    UnknownDependency(String, String),
    #[error("circular dependency detected involving rule `{0}`")]
    CircularDependency(String),
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Color {
    White,
    Gray,
    Black,
}

pub struct RuleRegistry {
    /// Rules are kept behind `Arc` (not `Box`) so the engine can clone a
    /// handle into a `'static` task spawned onto the worker pool without
    /// borrowing the registry across an await point.
    rules: HashMap<String, Arc<dyn Rule>>,
    /// Insertion order, used as the stable tie-break within a priority
    /// level.
    insertion_order: Vec<String>,
}

impl Default for RuleRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleRegistry {
    pub fn new() -> Self {
        Self { rules: HashMap::new(), insertion_order: Vec::new() }
    }

    pub fn register(&mut self, rule: Box<dyn Rule>) -> Result<(), RegistryError> {
        let name = rule.name().to_string();
        if self.rules.contains_key(&name) {
            return Err(RegistryError::DuplicateRule(name));
        }
        self.insertion_order.push(name.clone());
        self.rules.insert(name, Arc::from(rule));
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Rule>> {
        self.rules.get(name).cloned()
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn validate_dependencies(&self) -> Result<(), RegistryError> {
        for name in &self.insertion_order {
            let rule = &self.rules[name];
            for dep in rule.dependencies() {
                if !self.rules.contains_key(dep) {
                    return Err(RegistryError::UnknownDependency(name.clone(), dep.clone()));
                }
            }
        }
        Ok(())
    }

    /// Group registered rules by dependency depth (leaf = 0), each level
    /// ordered by descending priority then stable insertion order.
    pub fn build_levels(&self) -> Result<Vec<Vec<String>>, RegistryError> {
        self.validate_dependencies()?;

        let mut color: HashMap<String, Color> =
            self.insertion_order.iter().map(|n| (n.clone(), Color::White)).collect();
        let mut depth: HashMap<String, usize> = HashMap::new();

        for name in &self.insertion_order {
            self.visit(name, &mut color, &mut depth)?;
        }

        let max_depth = depth.values().copied().max().unwrap_or(0);
        let mut levels: Vec<Vec<String>> = vec![Vec::new(); max_depth + 1];
        for name in &self.insertion_order {
            levels[depth[name]].push(name.clone());
        }

        let position: HashMap<&String, usize> =
            self.insertion_order.iter().enumerate().map(|(i, n)| (n, i)).collect();

        for level in &mut levels {
            level.sort_by(|a, b| {
                let pa = self.rules[a].priority();
                let pb = self.rules[b].priority();
                pb.cmp(&pa).then_with(|| position[a].cmp(&position[b]))
            });
        }

        Ok(levels)
    }

    fn visit(
        &self,
        name: &str,
        color: &mut HashMap<String, Color>,
        depth: &mut HashMap<String, usize>,
    ) -> Result<usize, RegistryError> {
        if let Some(d) = depth.get(name) {
            return Ok(*d);
        }
        match color.get(name) {
            Some(Color::Gray) => return Err(RegistryError::CircularDependency(name.to_string())),
            Some(Color::Black) => return Ok(depth[name]),
            _ => {}
        }

        color.insert(name.to_string(), Color::Gray);
        let rule = &self.rules[name];
        let mut max_dep_depth: Option<usize> = None;
        for dep in rule.dependencies() {
            let dep_depth = self.visit(dep, color, depth)?;
            max_dep_depth = Some(max_dep_depth.map_or(dep_depth, |m| m.max(dep_depth)));
        }

        let this_depth = max_dep_depth.map_or(0, |d| d + 1);
        color.insert(name.to_string(), Color::Black);
        depth.insert(name.to_string(), this_depth);
        Ok(this_depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Severity, StructuredQuery, ValidationResult};
    use async_trait::async_trait;

    struct StubRule {
        name: &'static str,
        deps: Vec<String>,
        priority: i32,
    }

    #[async_trait]
    impl Rule for StubRule {
        fn name(&self) -> &str {
            self.name
        }
        fn dependencies(&self) -> &[String] {
            &self.deps
        }
        fn priority(&self) -> i32 {
            self.priority
        }
        fn severity(&self) -> Severity {
            Severity::Error
        }
        async fn validate(&self, _sq: &StructuredQuery) -> ValidationResult {
            ValidationResult::ok(self.name)
        }
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(StubRule { name: "a", deps: vec![], priority: 0 })).unwrap();
        let err = registry
            .register(Box::new(StubRule { name: "a", deps: vec![], priority: 0 }))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateRule("a".to_string()));
    }

    #[test]
    fn unregistered_dependency_is_rejected() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Box::new(StubRule { name: "b", deps: vec!["a".to_string()], priority: 0 }))
            .unwrap();
        let err = registry.build_levels().unwrap_err();
        assert_eq!(err, RegistryError::UnknownDependency("b".to_string(), "a".to_string()));
    }

    #[test]
    fn s9_circular_dependency_is_rejected() {
        let mut registry = RuleRegistry::new();
        registry
            .register(Box::new(StubRule { name: "x", deps: vec!["y".to_string()], priority: 0 }))
            .unwrap();
        registry
            .register(Box::new(StubRule { name: "y", deps: vec!["x".to_string()], priority: 0 }))
            .unwrap();
        assert!(matches!(registry.build_levels(), Err(RegistryError::CircularDependency(_))));
    }

    #[test]
    fn levels_group_by_dependency_depth_and_order_by_priority() {
        let mut registry = RuleRegistry::new();
        registry.register(Box::new(StubRule { name: "a", deps: vec![], priority: 1 })).unwrap();
        registry.register(Box::new(StubRule { name: "b", deps: vec![], priority: 5 })).unwrap();
        registry
            .register(Box::new(StubRule { name: "c", deps: vec!["a".to_string()], priority: 0 }))
            .unwrap();

        let levels = registry.build_levels().unwrap();
        assert_eq!(levels[0], vec!["b".to_string(), "a".to_string()]);
        assert_eq!(levels[1], vec!["c".to_string()]);
    }
}
