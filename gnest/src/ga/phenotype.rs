/// One candidate solution: an order in which to place the parts and a rotation per part.
#[derive(Debug, Clone, PartialEq)]
pub struct Phenotype {
    /// Indices into the part list, in placement order
    pub placement: Vec<usize>,
    /// Rotation in degrees of the part at the same position of `placement`
    pub rotation: Vec<f64>,
    /// Assigned once the phenotype is evaluated. Lower is better
    pub fitness: Option<f64>,
}

impl Phenotype {
    pub fn new(placement: Vec<usize>, rotation: Vec<f64>) -> Self {
        debug_assert_eq!(placement.len(), rotation.len());
        Phenotype {
            placement,
            rotation,
            fitness: None,
        }
    }

    pub fn len(&self) -> usize {
        self.placement.len()
    }

    pub fn is_empty(&self) -> bool {
        self.placement.is_empty()
    }

    pub fn is_evaluated(&self) -> bool {
        self.fitness.is_some()
    }

    /// Genes as `(part, rotation)` pairs.
    pub fn genes(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.placement.iter().copied().zip(self.rotation.iter().copied())
    }
}
