pub mod simulator;

pub use simulator::{
    run_simulator, SimRecord, SimulatedOperation, SimulatorConfig, SimulatorReport,
    SimulatorStats, Violation,
};
