//! Authorfold: author-grouped leave-one-out evaluation of text models.
//!
//! Authorfold asks whether the words in a document predict a label (a class
//! such as "reviewed" vs. "random", or a number such as publication date)
//! under an evaluation protocol that never lets a document, or any other
//! document by the same author, leak into the model used to predict it.
//!
//! # Quick Start
//!
//! ```
//! use authorfold::prelude::*;
//!
//! // Three authors, four documents; documents 0 and 2 share an author
//! let x = Matrix::from_vec(4, 1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
//! let features = FeatureMatrix::new(x, false);
//! let targets = [3.0, 5.0, 7.0, 9.0];
//! let ids: Vec<String> = (0..4).map(|i| format!("doc{i}")).collect();
//! let groups = ExclusionGroups::build(&["A", "B", "A", "C"], &[]).unwrap();
//!
//! let data = FoldData::new(&features, &targets, &ids, &groups).unwrap();
//! let engine = GroupedLeaveOneOut::new(Ridge::new(1e-6), 1e-6);
//! let result = engine.run(&data, &FoldScheduler::new(2).unwrap()).unwrap();
//!
//! // Document 0 is predicted from documents 1 and 3 only
//! assert!((result.predictions[0].value().unwrap() - 3.0).abs() < 1e-3);
//! ```
//!
//! # Modules
//!
//! - [`corpus`]: Word-count corpus reader
//! - [`metadata`]: Metadata loading, filters, targets and banned sets
//! - [`vocabulary`]: Frequency and bi-normal separation vocabulary selection
//! - [`features`]: Length-normalized feature vectors
//! - [`preprocessing`]: Per-fold normalization
//! - [`linear_model`]: Ridge regression adapter
//! - [`classification`]: Logistic regression adapter
//! - [`model_selection`]: Exclusion groups, fold engine and scheduler
//! - [`report`]: Prediction, coefficient and term-score output
//! - [`config`]: TOML run configuration
//! - [`pipeline`]: End-to-end runs

pub mod classification;
pub mod config;
pub mod corpus;
pub mod error;
pub mod features;
pub mod linear_model;
pub mod metadata;
pub mod model_selection;
pub mod pipeline;
pub mod prelude;
pub mod preprocessing;
pub mod primitives;
pub mod report;
pub mod traits;
pub mod vocabulary;

pub use error::{AuthorfoldError, Result};
pub use traits::{FittedModel, ModelAdapter, Task};
