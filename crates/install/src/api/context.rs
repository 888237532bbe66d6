use extman_events::EventSender;
use std::path::PathBuf;

/// Installation request
#[derive(Clone, Debug)]
pub struct InstallContext {
    /// Descriptor inside the unpacked extension package
    pub manifest_path: PathBuf,
    /// Replace files of an existing installation instead of failing
    pub overwrite: bool,
    /// Route to update when the extension is already present
    pub upgrade: bool,

    /// Event sender for progress reporting
    pub event_sender: Option<EventSender>,
}

context_builder! {
    InstallContext {
        manifest_path: PathBuf,
        overwrite: bool,
        upgrade: bool,
    }
}

/// Update request
#[derive(Clone, Debug)]
pub struct UpdateContext {
    /// Descriptor inside the unpacked extension package
    pub manifest_path: PathBuf,

    /// Event sender for progress reporting
    pub event_sender: Option<EventSender>,
}

context_builder! {
    UpdateContext {
        manifest_path: PathBuf,
    }
}

/// Uninstall request
#[derive(Clone, Debug)]
pub struct UninstallContext {
    /// Registry id of the extension to remove
    pub extension_id: i64,

    /// Event sender for progress reporting
    pub event_sender: Option<EventSender>,
}

context_builder! {
    UninstallContext {
        extension_id: i64,
    }
}
