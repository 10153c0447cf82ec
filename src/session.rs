//! Mount session lifecycle
//!
//! One session binds one description to one mount point for the life of
//! the process. `run` blocks until the filesystem is unmounted, either
//! externally or because the operator pressed CTRL+C.

use crate::archive::Archiver;
use crate::config::Config;
use crate::description::Description;
use crate::error::{Error, Result};
use crate::fs::{DescriptionFs, DescriptionView};
use fuser::MountOption;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// A description ready to be mounted
pub struct MountSession {
    fs: DescriptionFs,
    mount_point: PathBuf,
    options: Vec<MountOption>,
}

impl MountSession {
    /// Check the description and mount point, then build the view
    pub fn new(
        description: Description,
        mount_point: impl Into<PathBuf>,
        config: &Config,
        archiver: Arc<dyn Archiver>,
    ) -> Result<Self> {
        let mount_point = mount_point.into();

        if std::fs::read_dir(&description.path).is_err() {
            return Err(Error::StoreUnavailable(description.path));
        }
        if !mount_point.is_dir() {
            return Err(Error::InvalidMountPoint(mount_point));
        }

        info!("Preparing description '{}' from {:?}", description.name, description.path);
        let view = DescriptionView::open(description, archiver)?;
        let fs = DescriptionFs::new(view, Duration::from_secs(config.mount.attr_ttl_secs));

        Ok(Self {
            fs,
            mount_point,
            options: mount_options(config),
        })
    }

    pub fn mount_point(&self) -> &Path {
        &self.mount_point
    }

    pub fn options(&self) -> &[MountOption] {
        &self.options
    }

    /// Mount and serve until unmounted
    pub fn run(self) -> Result<()> {
        let mount_point = self.mount_point;
        let mut session = fuser::Session::new(self.fs, &mount_point, &self.options)
            .map_err(|e| Error::Mount(format!("{:?}: {}", mount_point, e)))?;
        let mut unmounter = session.unmount_callable();

        println!("Mounting file system.");
        println!(
            "You will be able to access the files under '{}' using a different shell.",
            mount_point.display()
        );
        println!("Press CTRL+C when you are done.");

        let runtime = tokio::runtime::Runtime::new().map_err(|e| Error::Internal(e.to_string()))?;
        runtime.block_on(async move {
            let mut event_loop = tokio::task::spawn_blocking(move || session.run());

            let finished = tokio::select! {
                finished = &mut event_loop => finished,
                signal = tokio::signal::ctrl_c() => {
                    signal?;
                    info!("Interrupted, unmounting {:?}", mount_point);
                    unmounter.unmount()?;
                    event_loop.await
                }
            };

            finished.map_err(|e| Error::Internal(e.to_string()))??;
            info!("Unmounted {:?}", mount_point);
            Ok::<(), Error>(())
        })
    }
}

/// Mount options derived from configuration
///
/// `AutoUnmount` is only passed with an explicit `AllowOther`; fuser
/// would otherwise add `AllowOther` on its own.
pub fn mount_options(config: &Config) -> Vec<MountOption> {
    let mut options = vec![
        MountOption::FSName(config.mount.fs_name.clone()),
        MountOption::RO,
    ];

    if config.mount.allow_other {
        options.push(MountOption::AllowOther);
        if config.mount.auto_unmount {
            options.push(MountOption::AutoUnmount);
        }
    } else if config.mount.auto_unmount {
        warn!("auto_unmount ignored without allow_other");
    }

    options
}
