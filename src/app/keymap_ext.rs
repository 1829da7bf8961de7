use crate::app::App;
use crate::error::TemplateError;
use crate::launcher::Launcher;
use std::path::PathBuf;

/// Lookups the key handlers need about the current selection.
pub trait AppKeymapExt {
    fn current_host_path(&self) -> Option<PathBuf>;
    fn resolved_command(&self) -> Option<Result<String, TemplateError>>;
}

impl AppKeymapExt for App {
    fn current_host_path(&self) -> Option<PathBuf> {
        let group = self.current_group()?;
        let host = self.current_host()?;
        Some(self.catalog.host_store().host_path(&group.name, &host.name))
    }

    fn resolved_command(&self) -> Option<Result<String, TemplateError>> {
        let row = self.current_association()?;
        let destination = self.current_host()?.destination(&row.destination)?;
        let service = self.catalog.service(&row.service)?;
        Some(Launcher::resolve(destination, service, &row.arguments))
    }
}
