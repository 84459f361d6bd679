pub mod design;
pub mod diagnostics;
pub mod fit;
pub mod linalg;
pub mod model;
pub mod select;

use crate::data::{Dataset, FeatureSet, Partition};
use crate::error::Result;
use crate::family::FamilyKind;

pub use design::{DesignTemplate, PredictorForm};
pub use fit::FitControl;
pub use model::{standard_specs, FittedModel, ModelSpec};
pub use select::{fit_family, select_family, FamilyFit, FamilySelection};

/// A fitted model together with the partition it was trained on. Evaluation
/// only ever uses this partition's holdout rows.
#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub model: FittedModel,
    pub partition: Partition,
}

pub fn train_models(
    dataset: &Dataset,
    specs: &[ModelSpec],
    family: FamilyKind,
    partition_for: impl Fn(FeatureSet) -> Partition,
    control: FitControl,
) -> Result<Vec<TrainedModel>> {
    specs
        .iter()
        .map(|spec| {
            let partition = partition_for(spec.features);
            let train = dataset.select_rows(&partition.train)?;
            let model = FittedModel::fit(*spec, family, &train, control)?;
            Ok(TrainedModel { model, partition })
        })
        .collect()
}
