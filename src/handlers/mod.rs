pub mod controller;

pub use controller::AnalysisController;
