use crate::error::{LaunchError, TemplateError};
use crate::model::{Arguments, Destination, Host, ProcessId, ProcessRecord, Service, StatusIcon};
use crate::template;
use std::collections::BTreeMap;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};

/// Starts services against destinations and keeps track of the resulting
/// processes for the rest of the session.
#[derive(Debug)]
pub struct Launcher {
    records: Vec<ProcessRecord>,
    live: BTreeMap<ProcessId, Child>,
    last_id: ProcessId,
    poll_interval: Duration,
    // None while no process is live
    next_poll: Option<Instant>,
}

impl Launcher {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            records: Vec::new(),
            live: BTreeMap::new(),
            last_id: 0,
            poll_interval,
            next_poll: None,
        }
    }

    /// Expand the service command for a destination. `address` is the
    /// destination value; `arguments` may add fields or override it.
    pub fn resolve(destination: &Destination, service: &Service, arguments: &Arguments) -> Result<String, TemplateError> {
        let mut fields = BTreeMap::new();
        fields.insert("address".to_string(), destination.value.clone());
        fields.extend(arguments.iter().map(|(k, v)| (k.clone(), v.clone())));
        template::expand(&service.command, &fields)
    }

    pub fn launch(
        &mut self,
        host: &Host,
        destination: &Destination,
        service: &Service,
        arguments: &Arguments,
    ) -> Result<ProcessId, LaunchError> {
        let command = match Self::resolve(destination, service, arguments) {
            Ok(command) => command,
            Err(e) => {
                let missing = match &e {
                    TemplateError::MissingField { field } => field.as_str(),
                    TemplateError::Malformed { .. } => "-",
                };
                tracing::error!(
                    "Unable to launch the service\nHost: {}\nDestination: {} ({})\nService: {}\nCommand: {}\nMissing argument: {}\nError: {}",
                    host.name,
                    destination.name,
                    destination.value,
                    service.name,
                    service.command,
                    missing,
                    e
                );
                return Err(e.into());
            }
        };

        let mut process = Command::new("sh");
        process.arg("-c").arg(&command);
        if !service.terminal {
            process
                .stdin(Stdio::null())
                .stdout(Stdio::null())
                .stderr(Stdio::null());
        }

        let child = process.spawn().map_err(|source| {
            tracing::error!("Failed to spawn '{}': {}", command, source);
            LaunchError::Spawn {
                command: command.clone(),
                source,
            }
        })?;

        self.last_id += 1;
        let id = self.last_id;
        let pid = child.id();
        let mut record = ProcessRecord::new(id, &host.name, &destination.name, &service.name, &command, pid);
        record.add_detail("Process started", StatusIcon::Start);
        tracing::info!("Started process #{} (PID {}): {}", id, pid, command);

        self.records.push(record);
        self.live.insert(id, child);
        self.arm_timer();
        Ok(id)
    }

    fn arm_timer(&mut self) {
        if self.next_poll.is_none() {
            self.next_poll = Some(Instant::now() + self.poll_interval);
        }
    }

    pub fn is_polling(&self) -> bool {
        self.next_poll.is_some()
    }

    /// True when the poll timer is armed and has expired.
    pub fn poll_due(&self, now: Instant) -> bool {
        self.next_poll.is_some_and(|due| now >= due)
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }

    /// Check every live process without blocking. Exited processes get their
    /// exit status recorded and are no longer tracked. Returns their ids.
    pub fn poll_all(&mut self) -> Vec<ProcessId> {
        let mut exited = Vec::new();
        for (id, child) in self.live.iter_mut() {
            match child.try_wait() {
                Ok(Some(status)) => exited.push((*id, Ok(status))),
                Ok(None) => {}
                Err(e) => exited.push((*id, Err(e))),
            }
        }

        for (id, outcome) in &exited {
            self.live.remove(id);
            let (status, icon) = match outcome {
                Ok(status) => (describe_exit(status), StatusIcon::Stop),
                Err(e) => (format!("Unable to check the process: {}", e), StatusIcon::Stop),
            };
            if let Some(record) = self.record_mut(*id) {
                tracing::info!("Process #{} (PID {}): {}", id, record.pid, status);
                record.add_detail(status, icon);
            }
        }

        self.next_poll = if self.live.is_empty() {
            None
        } else {
            Some(Instant::now() + self.poll_interval)
        };
        exited.into_iter().map(|(id, _)| id).collect()
    }

    /// Block until a process exits. Used for terminal services, which own
    /// the terminal until they finish.
    pub fn wait(&mut self, id: ProcessId) -> Result<(), LaunchError> {
        let Some(mut child) = self.live.remove(&id) else {
            return Err(self.not_running(id));
        };
        let status = match child.wait() {
            Ok(status) => describe_exit(&status),
            Err(e) => format!("Unable to wait for the process: {}", e),
        };
        if let Some(record) = self.record_mut(id) {
            tracing::info!("Process #{} (PID {}): {}", id, record.pid, status);
            record.add_detail(status, StatusIcon::Stop);
        }
        if self.live.is_empty() {
            self.next_poll = None;
        }
        Ok(())
    }

    pub fn pause(&mut self, id: ProcessId) -> Result<(), LaunchError> {
        let pid = self.live_pid(id)?;
        signals::stop(pid)?;
        tracing::info!("The process with the PID {} was paused", pid);
        self.add_detail(id, "Process paused", StatusIcon::Pause);
        Ok(())
    }

    pub fn resume(&mut self, id: ProcessId) -> Result<(), LaunchError> {
        let pid = self.live_pid(id)?;
        signals::resume(pid)?;
        tracing::info!("The process with the PID {} was resumed", pid);
        self.add_detail(id, "Process resumed", StatusIcon::Start);
        Ok(())
    }

    /// Resume the process, so a paused one can handle it, then terminate it.
    pub fn kill(&mut self, id: ProcessId) -> Result<(), LaunchError> {
        let pid = self.live_pid(id)?;
        signals::resume(pid)?;
        signals::terminate(pid)?;
        tracing::info!("The process with the PID {} was terminated", pid);
        self.add_detail(id, "Process terminated", StatusIcon::Stop);
        Ok(())
    }

    pub fn is_running(&self, id: ProcessId) -> bool {
        self.live.contains_key(&id)
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn records(&self) -> &[ProcessRecord] {
        &self.records
    }

    pub fn record(&self, id: ProcessId) -> Option<&ProcessRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    fn record_mut(&mut self, id: ProcessId) -> Option<&mut ProcessRecord> {
        self.records.iter_mut().find(|r| r.id == id)
    }

    fn add_detail(&mut self, id: ProcessId, status: &str, icon: StatusIcon) {
        if let Some(record) = self.record_mut(id) {
            record.add_detail(status, icon);
        }
    }

    fn not_running(&self, id: ProcessId) -> LaunchError {
        if self.record(id).is_some() {
            LaunchError::NotRunning(id)
        } else {
            LaunchError::UnknownProcess(id)
        }
    }

    fn live_pid(&self, id: ProcessId) -> Result<u32, LaunchError> {
        self.live
            .get(&id)
            .map(Child::id)
            .ok_or_else(|| self.not_running(id))
    }
}

fn describe_exit(status: &ExitStatus) -> String {
    if let Some(code) = status.code() {
        return format!("Exit code: {}", code);
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return format!("Killed by signal {}", signal);
        }
    }
    "Exited".to_string()
}

#[cfg(unix)]
mod signals {
    use crate::error::LaunchError;
    use nix::sys::signal::{kill, Signal};
    use nix::unistd::Pid;

    fn send(pid: u32, signal: Signal) -> Result<(), LaunchError> {
        kill(Pid::from_raw(pid as i32), signal).map_err(|e| LaunchError::Signal {
            pid,
            reason: e.to_string(),
        })
    }

    pub fn stop(pid: u32) -> Result<(), LaunchError> {
        send(pid, Signal::SIGSTOP)
    }

    pub fn resume(pid: u32) -> Result<(), LaunchError> {
        send(pid, Signal::SIGCONT)
    }

    pub fn terminate(pid: u32) -> Result<(), LaunchError> {
        send(pid, Signal::SIGTERM)
    }
}

#[cfg(not(unix))]
mod signals {
    use crate::error::LaunchError;

    fn unsupported(pid: u32) -> Result<(), LaunchError> {
        Err(LaunchError::Signal {
            pid,
            reason: "signals are not supported on this platform".to_string(),
        })
    }

    pub fn stop(pid: u32) -> Result<(), LaunchError> {
        unsupported(pid)
    }

    pub fn resume(pid: u32) -> Result<(), LaunchError> {
        unsupported(pid)
    }

    pub fn terminate(pid: u32) -> Result<(), LaunchError> {
        unsupported(pid)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::model::DestinationType;
    use std::thread;

    fn fixture(command: &str) -> (Host, Destination, Service) {
        let destination = Destination::new("lan", "10.0.0.5", DestinationType::Ipv4);
        let mut host = Host::new("box", "Test box");
        host.destinations.insert("lan".into(), destination.clone());
        (host, destination, Service::new("svc", "Test service", command))
    }

    fn poll_until_idle(launcher: &mut Launcher) {
        for _ in 0..200 {
            launcher.poll_all();
            if launcher.live_count() == 0 {
                return;
            }
            thread::sleep(Duration::from_millis(25));
        }
        panic!("processes did not exit in time");
    }

    fn statuses(launcher: &Launcher, id: ProcessId) -> Vec<String> {
        launcher
            .record(id)
            .unwrap()
            .details
            .iter()
            .map(|d| d.status.clone())
            .collect()
    }

    #[test]
    fn resolves_address_and_arguments() {
        let (_, destination, service) = fixture("ssh -p {port} {address}");
        let arguments = Arguments::from([("port".to_string(), "2222".to_string())]);
        assert_eq!(
            Launcher::resolve(&destination, &service, &arguments).unwrap(),
            "ssh -p 2222 10.0.0.5"
        );
        assert_eq!(
            Launcher::resolve(&destination, &Service::new("ssh", "", "ssh {address}"), &Arguments::new()).unwrap(),
            "ssh 10.0.0.5"
        );
    }

    #[test]
    fn missing_argument_spawns_nothing() {
        let (host, destination, service) = fixture("ssh -p {port} {address}");
        let mut launcher = Launcher::new(Duration::from_millis(100));
        let err = launcher
            .launch(&host, &destination, &service, &Arguments::new())
            .unwrap_err();

        assert!(matches!(
            err,
            LaunchError::Template(TemplateError::MissingField { ref field }) if field == "port"
        ));
        assert!(launcher.records().is_empty());
        assert!(!launcher.is_polling());
    }

    #[test]
    fn exit_code_is_recorded_once() {
        let (host, destination, service) = fixture("exit 3");
        let mut launcher = Launcher::new(Duration::from_millis(100));
        let id = launcher.launch(&host, &destination, &service, &Arguments::new()).unwrap();
        assert_eq!(id, 1);
        assert!(launcher.is_polling());

        poll_until_idle(&mut launcher);
        assert!(launcher.poll_all().is_empty());
        assert_eq!(statuses(&launcher, id), vec!["Process started", "Exit code: 3"]);
        assert!(!launcher.is_polling());
    }

    #[test]
    fn ids_increase_across_launches() {
        let (host, destination, service) = fixture("true");
        let mut launcher = Launcher::new(Duration::from_millis(100));
        let first = launcher.launch(&host, &destination, &service, &Arguments::new()).unwrap();
        let second = launcher.launch(&host, &destination, &service, &Arguments::new()).unwrap();
        poll_until_idle(&mut launcher);
        let third = launcher.launch(&host, &destination, &service, &Arguments::new()).unwrap();
        assert_eq!((first, second, third), (1, 2, 3));
        poll_until_idle(&mut launcher);
    }

    #[test]
    fn pause_resume_and_kill_are_logged_in_order() {
        let (host, destination, service) = fixture("sleep 30");
        let mut launcher = Launcher::new(Duration::from_millis(100));
        let id = launcher.launch(&host, &destination, &service, &Arguments::new()).unwrap();

        launcher.pause(id).unwrap();
        launcher.resume(id).unwrap();
        launcher.pause(id).unwrap();
        launcher.kill(id).unwrap();
        poll_until_idle(&mut launcher);

        let record = launcher.record(id).unwrap();
        let icons: Vec<StatusIcon> = record.details.iter().map(|d| d.icon).collect();
        assert_eq!(
            statuses(&launcher, id),
            vec![
                "Process started",
                "Process paused",
                "Process resumed",
                "Process paused",
                "Process terminated",
                "Killed by signal 15",
            ]
        );
        assert_eq!(icons[1], StatusIcon::Pause);
        assert_eq!(icons[4], StatusIcon::Stop);
        assert!(matches!(launcher.kill(id), Err(LaunchError::NotRunning(_))));
        assert!(matches!(launcher.pause(99), Err(LaunchError::UnknownProcess(99))));
    }

    #[test]
    fn timer_is_due_after_the_interval() {
        let (host, destination, service) = fixture("sleep 5");
        let mut launcher = Launcher::new(Duration::from_millis(1000));
        let id = launcher.launch(&host, &destination, &service, &Arguments::new()).unwrap();

        let now = Instant::now();
        assert!(!launcher.poll_due(now));
        assert!(launcher.poll_due(now + Duration::from_millis(1500)));

        launcher.kill(id).unwrap();
        poll_until_idle(&mut launcher);
        assert!(!launcher.poll_due(now + Duration::from_secs(60)));
    }
}
