//! Dependency probing for local modules.

use anyhow::Result;

use crate::core::dependent::DependentDescriptor;
use crate::core::module::DiscoveredModule;
use crate::discovery::ProbeOutcome;
use crate::modfile::{self, ModFile};
use crate::sources::toolchain::GoToolchain;
use crate::util::cancel::{is_cancellation, CancelToken};

/// Answers "does this module depend on the target, and at what version?".
///
/// The `go` toolchain is asked first. When it fails for any reason other
/// than cancellation, the module's `go.mod` is parsed instead.
#[derive(Clone)]
pub struct LocalProber {
    toolchain: GoToolchain,
}

impl LocalProber {
    pub fn new(toolchain: GoToolchain) -> Self {
        LocalProber { toolchain }
    }

    fn modfile(&self, module: &DiscoveredModule) -> Result<ModFile> {
        ModFile::load(&module.location.join(modfile::FILE_NAME))
    }

    /// Whether `module` requires `target` or one of its nested modules.
    pub fn depends_on(
        &self,
        module: &DiscoveredModule,
        target: &str,
        cancel: &CancelToken,
    ) -> Result<bool> {
        match self
            .toolchain
            .build_list_contains(&module.location, target, cancel)
        {
            Ok(found) => Ok(found),
            Err(e) if is_cancellation(&e) => Err(e),
            Err(e) => {
                tracing::debug!(
                    "go list failed in {}, reading go.mod: {:#}",
                    module.location.display(),
                    e
                );
                Ok(self.modfile(module)?.depends_on(target))
            }
        }
    }

    /// The version of `target` the module builds against, if it requires it.
    ///
    /// A versioned replacement wins over the required version.
    pub fn pinned_version(
        &self,
        module: &DiscoveredModule,
        target: &str,
        cancel: &CancelToken,
    ) -> Result<Option<String>> {
        match self.toolchain.module_info(&module.location, target, cancel) {
            Ok(info) if !info.main => {
                if let Some(version) = info.effective_version() {
                    return Ok(Some(version));
                }
            }
            Ok(_) => {}
            Err(e) if is_cancellation(&e) => return Err(e),
            Err(e) => tracing::debug!(
                "go list -json failed in {}, reading go.mod: {:#}",
                module.location.display(),
                e
            ),
        }

        Ok(self.modfile(module)?.effective_version(target))
    }

    /// Probe one module. The target module never depends on itself.
    pub fn probe(&self, module: &DiscoveredModule, target: &str, cancel: &CancelToken) -> ProbeOutcome {
        if module.identifier == target {
            return ProbeOutcome::NoMatch;
        }

        match self.depends_on(module, target, cancel) {
            Ok(true) => {}
            Ok(false) => return ProbeOutcome::NoMatch,
            Err(e) => return ProbeOutcome::failed(module.location.display(), &e),
        }

        let version = match self.pinned_version(module, target, cancel) {
            Ok(version) => version,
            Err(e) if is_cancellation(&e) => {
                return ProbeOutcome::failed(module.location.display(), &e)
            }
            Err(e) => {
                tracing::debug!(
                    "no pinned version of {} in {}: {:#}",
                    target,
                    module.location.display(),
                    e
                );
                None
            }
        };

        ProbeOutcome::Match(
            DependentDescriptor::from_module(&module.identifier)
                .with_current_version(version)
                .with_local_path(&module.location),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::test_support::{MockExecutor, MockProcessOutput, TestWorkspace};

    const LIB: &str = "github.com/acme/lib";

    fn prober(exec: MockExecutor) -> LocalProber {
        LocalProber::new(GoToolchain::new(Arc::new(exec), "go"))
    }

    fn failing_go() -> LocalProber {
        let mut exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::failure(1, "go: cannot find main module"));
        prober(exec)
    }

    #[test]
    fn test_toolchain_answer_is_used() {
        let ws = TestWorkspace::new();
        let module = ws.module("api", "github.com/acme/api", &[]);

        let mut exec = MockExecutor::new();
        exec.expect(
            "go list -m all",
            MockProcessOutput::success("github.com/acme/api\ngithub.com/acme/lib v0.8.0\n"),
        );
        exec.expect(
            "go list -m -json github.com/acme/lib",
            MockProcessOutput::success(r#"{"Path": "github.com/acme/lib", "Version": "v0.8.0"}"#),
        );

        match prober(exec).probe(&module, LIB, &CancelToken::new()) {
            ProbeOutcome::Match(d) => {
                assert_eq!(d.module, "github.com/acme/api");
                assert_eq!(d.current_version.as_deref(), Some("v0.8.0"));
                assert_eq!(d.local_path.as_deref(), Some(module.location.as_path()));
            }
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_falls_back_to_go_mod() {
        let ws = TestWorkspace::new();
        let module = ws.module("api", "github.com/acme/api", &[(LIB, "v0.9.0")]);

        match failing_go().probe(&module, LIB, &CancelToken::new()) {
            ProbeOutcome::Match(d) => assert_eq!(d.current_version.as_deref(), Some("v0.9.0")),
            other => panic!("unexpected outcome: {:?}", other),
        }
    }

    #[test]
    fn test_fallback_honors_replace() {
        let ws = TestWorkspace::new();
        let module = ws.module_with(
            "api",
            "module github.com/acme/api\n\nrequire github.com/acme/lib v0.9.0\n\nreplace github.com/acme/lib => github.com/fork/lib v0.9.1\n",
        );

        assert_eq!(
            failing_go()
                .pinned_version(&module, LIB, &CancelToken::new())
                .unwrap()
                .as_deref(),
            Some("v0.9.1")
        );
    }

    #[test]
    fn test_non_dependent_is_no_match() {
        let ws = TestWorkspace::new();
        let module = ws.module("web", "github.com/acme/web", &[("github.com/other/x", "v1.0.0")]);

        assert_eq!(
            failing_go().probe(&module, LIB, &CancelToken::new()),
            ProbeOutcome::NoMatch
        );
    }

    #[test]
    fn test_target_is_not_its_own_dependent() {
        let ws = TestWorkspace::new();
        let module = ws.module("lib", LIB, &[]);

        assert_eq!(
            failing_go().probe(&module, LIB, &CancelToken::new()),
            ProbeOutcome::NoMatch
        );
    }

    #[test]
    fn test_unreadable_module_fails_without_panicking() {
        let ws = TestWorkspace::new();
        let module = DiscoveredModule::new(ws.root().join("gone"), "github.com/acme/gone");

        assert!(matches!(
            failing_go().probe(&module, LIB, &CancelToken::new()),
            ProbeOutcome::Failed(_)
        ));
    }

    #[test]
    fn test_cancellation_skips_fallback() {
        let ws = TestWorkspace::new();
        let module = ws.module("api", "github.com/acme/api", &[(LIB, "v0.9.0")]);
        let cancel = CancelToken::new();
        cancel.cancel();

        let mut exec = MockExecutor::new();
        exec.set_default(MockProcessOutput::success(""));
        let err = prober(exec).depends_on(&module, LIB, &cancel).unwrap_err();
        assert!(is_cancellation(&err));
    }
}
