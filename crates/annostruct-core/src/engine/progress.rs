use crate::core::models::ids::NodeId;

/// What the resolver is doing, as observed by a [`ResolutionReporter`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionEvent {
    /// The requested kind was already cached on the node.
    CacheHit { kind: &'static str, node: NodeId },
    /// The provider already ran on this target and is not run again.
    AlreadyComputed { provider: String, target: NodeId },

    ProviderStart { provider: String, target: NodeId },
    ProviderFinish {
        provider: String,
        target: NodeId,
        writes: usize,
    },
    ProviderFailed { provider: String, target: NodeId },
}

pub type ResolutionCallback = Box<dyn Fn(ResolutionEvent) + Send + Sync>;

#[derive(Default)]
pub struct ResolutionReporter {
    callback: Option<ResolutionCallback>,
}

impl ResolutionReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ResolutionCallback) -> Self {
        Self {
            callback: Some(callback),
        }
    }

    #[inline]
    pub fn report(&self, event: ResolutionEvent) {
        if let Some(cb) = &self.callback {
            cb(event);
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.callback.is_some()
    }
}

impl std::fmt::Debug for ResolutionReporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionReporter")
            .field("active", &self.is_active())
            .finish()
    }
}
