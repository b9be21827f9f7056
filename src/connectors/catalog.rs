//! Static endpoint metadata, served so integrators can discover what an
//! instance offers.

use serde::Serialize;

/// One documented endpoint parameter.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct ParamInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub example_value: &'static str,
}

/// One endpoint exposed by a connector.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct EndpointInfo {
    pub name: &'static str,
    pub methods: &'static [&'static str],
    pub description: &'static str,
    pub long_description: &'static str,
    pub display_category: &'static str,
    pub display_order: u32,
    pub parameters: &'static [ParamInfo],
}

/// Endpoints sorted the way they are displayed: by category, then order.
pub fn display_sorted(endpoints: &[EndpointInfo]) -> Vec<EndpointInfo> {
    let mut sorted = endpoints.to_vec();
    sorted.sort_by(|a, b| {
        (a.display_category, a.display_order, a.name).cmp(&(b.display_category, b.display_order, b.name))
    });
    sorted
}
