//! Recipe registry
//!
//! Built once through [`RegistryBuilder`], then shared read-only (typically
//! behind an `Arc`) by every request.

use tracing::warn;

use super::shape::ExpectedShape;
use super::{PortfolioRecipe, ProductionPlanningRecipe, Recipe, StaffingRecipe};
use crate::model::ProblemCategory;

/// Immutable category -> recipe map
pub struct RecipeRegistry {
    recipes: Vec<Box<dyn Recipe>>,
}

impl RecipeRegistry {
    /// Start an empty registry
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder {
            recipes: Vec::new(),
        }
    }

    /// Registry with every built-in recipe
    pub fn with_builtin() -> Self {
        Self::builder()
            .register(ProductionPlanningRecipe::new())
            .register(StaffingRecipe::new())
            .register(PortfolioRecipe::new())
            .build()
    }

    /// Recipe for a category, if one is registered
    pub fn lookup(&self, category: ProblemCategory) -> Option<&dyn Recipe> {
        self.recipes
            .iter()
            .find(|r| r.category() == category)
            .map(|r| r.as_ref())
    }

    /// Shape a model of this category must conform to
    pub fn shape_for(&self, category: ProblemCategory) -> ExpectedShape {
        self.lookup(category)
            .map(|r| r.shape().clone())
            .unwrap_or_else(|| ExpectedShape::generic(category))
    }

    /// Registered categories, in registration order
    pub fn categories(&self) -> Vec<ProblemCategory> {
        self.recipes.iter().map(|r| r.category()).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &dyn Recipe> {
        self.recipes.iter().map(|r| r.as_ref())
    }

    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }
}

impl Default for RecipeRegistry {
    fn default() -> Self {
        Self::with_builtin()
    }
}

impl std::fmt::Debug for RecipeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecipeRegistry")
            .field("categories", &self.categories())
            .finish()
    }
}

/// Collects recipes before the registry is frozen
pub struct RegistryBuilder {
    recipes: Vec<Box<dyn Recipe>>,
}

impl RegistryBuilder {
    /// Register a recipe; a later recipe for the same category replaces the
    /// earlier one
    pub fn register(mut self, recipe: impl Recipe + 'static) -> Self {
        let category = recipe.category();
        if !category.is_known() {
            warn!("ignoring recipe registered for the unknown category");
            return self;
        }
        if let Some(slot) = self.recipes.iter_mut().find(|r| r.category() == category) {
            warn!(%category, "replacing previously registered recipe");
            *slot = Box::new(recipe);
        } else {
            self.recipes.push(Box::new(recipe));
        }
        self
    }

    pub fn build(self) -> RecipeRegistry {
        RecipeRegistry {
            recipes: self.recipes,
        }
    }
}
