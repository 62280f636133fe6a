//! Access routing - Hands the VM access endpoint to the access view

/// Input of the access view: the endpoint, exactly as the backend sent it
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessHandoff {
    endpoint: Option<String>,
}

/// What the access view should show for a hand-off
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessPresentation<'a> {
    /// A usable endpoint the operator can open
    Ready(&'a str),
    /// No endpoint was provided
    Degraded,
}

impl AccessHandoff {
    pub fn presentation(&self) -> AccessPresentation<'_> {
        match self.endpoint.as_deref() {
            Some(endpoint) if !endpoint.trim().is_empty() => AccessPresentation::Ready(endpoint),
            _ => AccessPresentation::Degraded,
        }
    }
}

/// Builds hand-offs for the access view. Holds no state of its own.
pub struct AccessRouter;

impl AccessRouter {
    pub fn hand_off(endpoint: Option<&str>) -> AccessHandoff {
        AccessHandoff {
            endpoint: endpoint.map(str::to_owned),
        }
    }
}
