//! Config test harness
//!
//! Launches each daemon with each of its sample configs and checks the
//! console: documentation completeness, config write-out, and liveness.
//! One broken config never stops the others.

mod descriptor;
mod driver;
mod probes;
mod report;
mod suite;

pub use descriptor::{AppConfigSet, AppDescriptor, Descriptor, Extension};
pub use driver::ConfigTest;
pub use probes::{
    scan_online_help, written_path, DocFinding, DocReport, DocumentationProbe, LivenessProbe,
    Probe, RoundTripProbe,
};
pub use report::{ConfigReport, SuiteReport};
pub use suite::{check_configs_tested, Suite, SuiteOptions};
