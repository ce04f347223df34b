pub mod sequence;

pub use sequence::{SequenceDataset, TtcRecord, write_results_csv};
