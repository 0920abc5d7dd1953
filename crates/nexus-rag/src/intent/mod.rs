//! Intent classification of user turns

pub mod classifier;

pub use classifier::IntentClassifier;
