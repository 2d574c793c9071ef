use serde::{Deserialize, Serialize};

use polynest::io::ext_repr::{ExtInstance, ExtSolution};

use crate::config::NestConfig;

#[derive(Serialize, Deserialize, Clone)]
pub struct NestOutput {
    #[serde(flatten)]
    pub instance: ExtInstance,
    pub solution: ExtSolution,
    pub config: NestConfig,
    /// Generations bred before the solution was written
    pub generations: usize,
    pub run_time_sec: u64,
}
