use crate::di::{ComponentDescriptor, ComponentRegistry};
use crate::error::ComponentreeError;

/// Outcome of a dependency graph scan.
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// One `Circularity` error per cyclic chain found, across all roots.
    pub circularities: Vec<ComponentreeError>,
    /// `(component, missing dependency)` pairs.
    pub unresolved: Vec<(String, String)>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.circularities.is_empty()
    }

    /// Convert into the aggregate error if any cycle was found.
    pub fn into_result(self) -> Result<(), ComponentreeError> {
        if self.circularities.is_empty() {
            return Ok(());
        }
        Err(ComponentreeError::InvalidGraph {
            count: self.circularities.len(),
            errors: self.circularities,
        })
    }
}

/// Proves that no component injects itself, directly or transitively.
///
/// Every descriptor is used as a root of its own depth-first walk, so one
/// cycle is reported once for each root that reaches it.
pub struct DependencyValidator<'a> {
    registry: &'a ComponentRegistry,
}

impl<'a> DependencyValidator<'a> {
    pub fn new(registry: &'a ComponentRegistry) -> Self {
        Self { registry }
    }

    pub fn validate(&self) -> ValidationReport {
        let mut report = ValidationReport::default();
        for root in self.registry.iter() {
            let mut chain = vec![root.name().to_string()];
            self.walk(root, &mut chain, &mut report);
        }
        report
    }

    /// Cyclic chains reachable from a single root.
    pub fn validate_root(&self, root: &ComponentDescriptor) -> Vec<ComponentreeError> {
        let mut report = ValidationReport::default();
        let mut chain = vec![root.name().to_string()];
        self.walk(root, &mut chain, &mut report);
        report.circularities
    }

    fn walk(
        &self,
        descriptor: &ComponentDescriptor,
        chain: &mut Vec<String>,
        report: &mut ValidationReport,
    ) {
        for dependency in descriptor.dependencies() {
            if chain.contains(&dependency.name) {
                let mut cycle = chain.clone();
                cycle.push(dependency.name.clone());
                report
                    .circularities
                    .push(ComponentreeError::Circularity { chain: cycle });
                continue;
            }

            let Ok(next) = self.registry.get(&dependency.name) else {
                let pair = (descriptor.name().to_string(), dependency.name.clone());
                if !report.unresolved.contains(&pair) {
                    report.unresolved.push(pair);
                }
                continue;
            };

            chain.push(dependency.name.clone());
            self.walk(next, chain, report);
            chain.pop();
        }
    }
}
