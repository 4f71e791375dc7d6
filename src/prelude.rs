//! Convenience re-exports for common usage.
//!
//! # Usage
//!
//! ```
//! use authorfold::prelude::*;
//! ```

pub use crate::classification::LogisticRegression;
pub use crate::features::{FeatureBuilder, FeatureMatrix, FeatureSource};
pub use crate::linear_model::Ridge;
pub use crate::model_selection::{
    ExclusionGroups, FoldData, FoldScheduler, GroupedLeaveOneOut, Prediction,
};
pub use crate::preprocessing::FoldNormalizer;
pub use crate::primitives::Matrix;
pub use crate::traits::{FittedModel, ModelAdapter, Task};
pub use crate::vocabulary::{SelectionPolicy, Vocabulary, VocabularySelector};
