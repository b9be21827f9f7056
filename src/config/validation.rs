//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check connector instances (unique slugs, usable base URLs)
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::collections::HashSet;
use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::GatewayConfig;

/// A single semantic problem found in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("invalid bind address '{0}'")]
    BindAddress(String),

    #[error("invalid metrics address '{0}'")]
    MetricsAddress(String),

    #[error("timeouts.request_secs must be greater than 0")]
    RequestTimeout,

    #[error("{kind} instance has an empty slug")]
    EmptySlug { kind: &'static str },

    #[error("{kind} slug '{slug}' may only contain a-z, 0-9, '-' and '_'")]
    SlugCharacters { kind: &'static str, slug: String },

    #[error("{kind} slug '{slug}' is declared more than once")]
    DuplicateSlug { kind: &'static str, slug: String },

    #[error("{kind} '{slug}': url '{url}' is not an absolute http(s) URL")]
    InvalidUrl {
        kind: &'static str,
        slug: String,
        url: String,
    },

    #[error("{kind} '{slug}': url '{url}' must end with '/'")]
    MissingTrailingSlash {
        kind: &'static str,
        slug: String,
        url: String,
    },

    #[error("keycloak '{0}': client_id is required")]
    MissingClientId(String),
}

/// Validate a parsed configuration, collecting every problem.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BindAddress(config.listener.bind_address.clone()));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::MetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::RequestTimeout);
    }

    check_instances(
        "ia_delib",
        config.ia_delib.iter().map(|c| (c.slug.as_str(), c.url.as_str())),
        &mut errors,
    );
    check_instances(
        "keycloak",
        config.keycloak.iter().map(|c| (c.slug.as_str(), c.url.as_str())),
        &mut errors,
    );
    for instance in &config.keycloak {
        if instance.client_id.is_empty() {
            errors.push(ValidationError::MissingClientId(instance.slug.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_instances<'a>(
    kind: &'static str,
    instances: impl Iterator<Item = (&'a str, &'a str)>,
    errors: &mut Vec<ValidationError>,
) {
    let mut seen = HashSet::new();
    for (slug, base_url) in instances {
        if slug.is_empty() {
            errors.push(ValidationError::EmptySlug { kind });
        } else if !slug
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
        {
            errors.push(ValidationError::SlugCharacters {
                kind,
                slug: slug.to_string(),
            });
        }
        if !slug.is_empty() && !seen.insert(slug) {
            errors.push(ValidationError::DuplicateSlug {
                kind,
                slug: slug.to_string(),
            });
        }

        match url::Url::parse(base_url) {
            Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {
                // Endpoint paths are appended verbatim.
                if !base_url.ends_with('/') {
                    errors.push(ValidationError::MissingTrailingSlash {
                        kind,
                        slug: slug.to_string(),
                        url: base_url.to_string(),
                    });
                }
            }
            _ => errors.push(ValidationError::InvalidUrl {
                kind,
                slug: slug.to_string(),
                url: base_url.to_string(),
            }),
        }
    }
}
