use std::sync::Arc;

use crate::adapters::{FfmpegExecAdapter, FfprobeAdapter, LocalFsAdapter, ToolResolver};
use crate::app::{inspect_interactor::InspectInteractor, slice_interactor::SliceInteractor};
use crate::domain::model::SlicerSettings;
use crate::ports::{ExecutePort, FsPort, ProbePort, ToolPort};

pub trait AppContainer: Send + Sync {
    fn slice_interactor(&self) -> Arc<SliceInteractor>;
    fn inspect_interactor(&self) -> Arc<InspectInteractor>;
}

pub struct DefaultAppContainer {
    slice_interactor: Arc<SliceInteractor>,
    inspect_interactor: Arc<InspectInteractor>,
}

impl DefaultAppContainer {
    /// Wire the local adapters; one resolver is shared so its cache covers every use
    pub fn new(settings: &SlicerSettings) -> Self {
        let fs_port: Arc<dyn FsPort> = Arc::new(LocalFsAdapter::new());
        let tool_port: Arc<dyn ToolPort> = Arc::new(ToolResolver::system(
            settings.tools.clone(),
            Arc::clone(&fs_port),
        ));
        let probe_port: Arc<dyn ProbePort> = Arc::new(FfprobeAdapter::new(Arc::clone(&tool_port)));
        let execute_port: Arc<dyn ExecutePort> = Arc::new(FfmpegExecAdapter::new());

        let slice_interactor = Arc::new(
            SliceInteractor::new(
                Arc::clone(&tool_port),
                Arc::clone(&probe_port),
                execute_port,
                fs_port,
            )
            .with_encoder(settings.encoder.clone()),
        );

        let inspect_interactor = Arc::new(InspectInteractor::new(tool_port, probe_port));

        Self {
            slice_interactor,
            inspect_interactor,
        }
    }
}

impl AppContainer for DefaultAppContainer {
    fn slice_interactor(&self) -> Arc<SliceInteractor> {
        Arc::clone(&self.slice_interactor)
    }

    fn inspect_interactor(&self) -> Arc<InspectInteractor> {
        Arc::clone(&self.inspect_interactor)
    }
}
