//! Process identity
//!
//! Auxiliary processes are launched with `--process-type=<kind>`. A process
//! without the flag, or with kind `main`/`browser`, is the main process.

const PROCESS_TYPE_FLAG: &str = "--process-type";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessIdentity {
    process_type: Option<String>,
}

impl ProcessIdentity {
    pub fn main() -> Self {
        Self { process_type: None }
    }

    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let arg = arg.as_ref();
            if let Some(kind) = arg.strip_prefix(PROCESS_TYPE_FLAG) {
                let kind = match kind.strip_prefix('=') {
                    Some(kind) => Some(kind.to_string()),
                    None if kind.is_empty() => args.next().map(|k| k.as_ref().to_string()),
                    None => continue,
                };
                return Self { process_type: kind };
            }
        }
        Self::main()
    }

    pub fn current() -> Self {
        Self::from_args(std::env::args().skip(1))
    }

    pub fn process_type(&self) -> Option<&str> {
        self.process_type.as_deref()
    }

    pub fn is_main(&self) -> bool {
        matches!(self.process_type(), None | Some("") | Some("main") | Some("browser"))
    }
}

#[derive(Debug, Clone)]
pub struct ProcessGuard {
    identity: ProcessIdentity,
}

impl ProcessGuard {
    pub fn new(identity: ProcessIdentity) -> Self {
        Self { identity }
    }

    pub fn identity(&self) -> &ProcessIdentity {
        &self.identity
    }

    pub fn is_main_process(&self) -> bool {
        self.identity.is_main()
    }

    /// Runs `f` only in the main process
    pub fn run_only_in_main_process<T>(&self, f: impl FnOnce() -> T) -> Option<T> {
        if self.is_main_process() {
            Some(f())
        } else {
            tracing::debug!(
                process_type = ?self.identity.process_type(),
                "Skipping main-process work"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_from_args() {
        assert!(ProcessIdentity::from_args(Vec::<String>::new()).is_main());
        assert!(ProcessIdentity::from_args(["--verbose"]).is_main());
        assert!(ProcessIdentity::from_args(["--process-type=browser"]).is_main());

        let renderer = ProcessIdentity::from_args(["--process-type=renderer"]);
        assert!(!renderer.is_main());
        assert_eq!(renderer.process_type(), Some("renderer"));

        let gpu = ProcessIdentity::from_args(["--foo", "--process-type", "gpu"]);
        assert_eq!(gpu.process_type(), Some("gpu"));
        assert!(!gpu.is_main());

        assert!(ProcessIdentity::from_args(["--process-typeish"]).is_main());
    }

    #[test]
    fn test_run_only_in_main_process() {
        let main = ProcessGuard::new(ProcessIdentity::main());
        assert_eq!(main.run_only_in_main_process(|| 7), Some(7));

        let aux = ProcessGuard::new(ProcessIdentity::from_args(["--process-type=media"]));
        let mut ran = false;
        assert_eq!(aux.run_only_in_main_process(|| ran = true), None);
        assert!(!ran);
    }
}
