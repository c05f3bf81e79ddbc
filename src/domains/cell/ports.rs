use crate::common::DomainResult;

/// Port the planning pipeline depends on for scenario text.
/// Implementations (adapters) provide filesystem or network-backed sources.
pub trait ScenarioDataSource: Send + Sync {
    fn load_scenario(&self, name: &str) -> DomainResult<String>;
}
