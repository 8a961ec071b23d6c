use crate::error::AppError;
use crate::view::manager::ViewManager;

/// What [`IndexBuilder::build`] did to one index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildOutcome {
    Created,
    Recreated,
    Untouched,
}

/// Creates the view indexes, optionally destroying existing ones first.
#[derive(Clone)]
pub struct IndexBuilder {
    managers: Vec<(String, ViewManager)>,
}

impl IndexBuilder {
    pub fn new() -> Self {
        Self {
            managers: Vec::new(),
        }
    }

    pub fn with_manager(mut self, name: &str, manager: ViewManager) -> Self {
        self.managers.push((name.to_string(), manager));
        self
    }

    pub fn managers(&self) -> impl Iterator<Item = (&str, &ViewManager)> {
        self.managers.iter().map(|(name, m)| (name.as_str(), m))
    }

    pub async fn build(&self, destroy: bool) -> Result<Vec<(String, BuildOutcome)>, AppError> {
        let mut outcomes = Vec::with_capacity(self.managers.len());

        for (name, manager) in &self.managers {
            let outcome = if !manager.index_exists().await? {
                manager.create().await?;
                BuildOutcome::Created
            } else if destroy {
                manager.drop_and_create().await?;
                BuildOutcome::Recreated
            } else {
                BuildOutcome::Untouched
            };

            tracing::info!(
                manager = %name,
                index = %manager.name(),
                outcome = ?outcome,
                "Built index"
            );
            outcomes.push((name.clone(), outcome));
        }

        Ok(outcomes)
    }
}

impl Default for IndexBuilder {
    fn default() -> Self {
        Self::new()
    }
}
