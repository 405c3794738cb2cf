//! File provisioner: creates and closes output files off the control loop.
//!
//! The coordinator asks a `FileProvisioner` to create the output file for a
//! job and, once the worker is done, to close the controller's handle. Both
//! calls are awaited on spawned tasks, never on the coordinator loop itself.
//!
//! # Example
//!
//! ```ignore
//! use handoff_core::provisioner::{FileProvisioner, FsProvisioner};
//! use handoff_core::transfer::TargetContext;
//!
//! let provisioner = FsProvisioner::with_defaults();
//! let file = provisioner
//!     .create_file(Path::new("/tmp/page.mhtml"), &TargetContext::new(4, 1))
//!     .await?;
//! // hand `file.worker` to the worker, keep `file.controller`
//! provisioner.close_file(file.controller).await?;
//! ```

mod config;
mod error;
mod fs_provisioner;
mod traits;

pub use config::ProvisionerConfig;
pub use error::ProvisionError;
pub use fs_provisioner::FsProvisioner;
pub use traits::{FileProvisioner, ProvisionedFile};
