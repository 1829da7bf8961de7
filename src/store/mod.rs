mod hosts;
mod services;

pub use hosts::HostStore;
pub use services::ServiceStore;

/// Asks the user a yes/no question before a destructive step.
pub trait Confirm {
    fn confirm(&mut self, title: &str, message: &str) -> bool;
}

impl<F: FnMut(&str, &str) -> bool> Confirm for F {
    fn confirm(&mut self, title: &str, message: &str) -> bool {
        self(title, message)
    }
}
