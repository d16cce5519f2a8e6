use std::env;

/// Set by the AWS Lambda runtime for every function invocation environment.
pub const AWS_LAMBDA_FUNCTION_NAME_ENV: &str = "AWS_LAMBDA_FUNCTION_NAME";

/// Where the process runs, as far as ticket management is concerned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionContext {
    pub is_linux: bool,
    pub function_name: Option<String>,
}

impl ExecutionContext {
    /// Reads the platform and the serverless runtime marker of the current process.
    pub fn detect() -> Self {
        Self {
            is_linux: cfg!(target_os = "linux"),
            function_name: env::var(AWS_LAMBDA_FUNCTION_NAME_ENV).ok(),
        }
    }

    /// A context that never enables ticket management, e.g. local development.
    pub fn local() -> Self {
        Self {
            is_linux: cfg!(target_os = "linux"),
            function_name: None,
        }
    }

    /// Ticket management only happens on Linux inside a function runtime.
    pub fn is_target(&self) -> bool {
        self.is_linux && self.function_name.as_deref().is_some_and(|name| !name.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::ExecutionContext;

    #[test]
    fn requires_linux_and_function_name() {
        let context = |is_linux, function_name: Option<&str>| ExecutionContext {
            is_linux,
            function_name: function_name.map(str::to_owned),
        };

        assert!(context(true, Some("sample1")).is_target());
        assert!(!context(true, Some("")).is_target());
        assert!(!context(true, None).is_target());
        assert!(!context(false, Some("sample1")).is_target());
        assert!(!ExecutionContext::local().is_target());
    }
}
