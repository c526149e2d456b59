// src/replacer/options.rs
// =============================================================================
// Knobs for the link replacer.
//
// - FailurePolicy: what to do when the archive can't be reached for a link
// - save_unarchived: ask the archive to save links it has never seen
// - LinkHooks: optional callbacks fired at fixed points of the pipeline
// =============================================================================

use std::fmt;

// What happens when looking up one link fails at the HTTP layer
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the failure, skip the link and keep going
    #[default]
    Continue,
    /// Stop at the first failure and return it
    Abort,
}

type LinkCallback = Box<dyn Fn(&str) + Send + Sync>;
type ReplaceCallback = Box<dyn Fn(&str, &str) + Send + Sync>;

// Callbacks invoked while links are processed. Each one is optional.
//
// - on_link_process: right before a link is looked up
// - on_link_ignore: a link was skipped because its host is blocked
// - on_link_replace: a link will be replaced (receives link and snapshot URL)
#[derive(Default)]
pub struct LinkHooks {
    pub on_link_process: Option<LinkCallback>,
    pub on_link_ignore: Option<LinkCallback>,
    pub on_link_replace: Option<ReplaceCallback>,
}

impl LinkHooks {
    pub fn on_link_process(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_link_process = Some(Box::new(f));
        self
    }

    pub fn on_link_ignore(mut self, f: impl Fn(&str) + Send + Sync + 'static) -> Self {
        self.on_link_ignore = Some(Box::new(f));
        self
    }

    pub fn on_link_replace(mut self, f: impl Fn(&str, &str) + Send + Sync + 'static) -> Self {
        self.on_link_replace = Some(Box::new(f));
        self
    }

    pub(crate) fn link_process(&self, link: &str) {
        if let Some(f) = &self.on_link_process {
            f(link);
        }
    }

    pub(crate) fn link_ignore(&self, link: &str) {
        if let Some(f) = &self.on_link_ignore {
            f(link);
        }
    }

    pub(crate) fn link_replace(&self, link: &str, snapshot: &str) {
        if let Some(f) = &self.on_link_replace {
            f(link, snapshot);
        }
    }
}

// Closures don't implement Debug, so just show which hooks are set
impl fmt::Debug for LinkHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LinkHooks")
            .field("on_link_process", &self.on_link_process.is_some())
            .field("on_link_ignore", &self.on_link_ignore.is_some())
            .field("on_link_replace", &self.on_link_replace.is_some())
            .finish()
    }
}

#[derive(Debug, Default)]
pub struct ReplacerOptions {
    pub failure_policy: FailurePolicy,
    pub save_unarchived: bool,
    pub hooks: LinkHooks,
}
