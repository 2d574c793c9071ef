mod genetic_algorithm;
mod phenotype;

#[doc(inline)]
pub use genetic_algorithm::{GaConfig, GaPart, GeneticAlgorithm};
#[doc(inline)]
pub use phenotype::Phenotype;
