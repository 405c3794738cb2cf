pub mod config;
pub mod coordinator;
pub mod dispatch;
pub mod job;
pub mod metrics;
pub mod provisioner;
pub mod testing;
pub mod transfer;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, LogFormat,
    LoggingConfig,
};
pub use coordinator::{
    command_channel, create_coordinator, CommandReceiver, CoordinatorConfig, CoordinatorError,
    CoordinatorHandle, CoordinatorStatus, GenerationCoordinator,
};
pub use dispatch::{
    ContentProducer, DispatchError, LocalWorker, StaticContent, WorkerConfig, WorkerDispatcher,
    WorkerError,
};
pub use job::{JobId, JobOutcome, JobPhase, GENERATION_FAILED};
pub use provisioner::{FileProvisioner, FsProvisioner, ProvisionError, ProvisionerConfig};
pub use transfer::{
    ControllerHandle, DuplicateTransfer, HandleTransfer, TargetContext, TransferError,
    TransferableHandle,
};
