//! Command handlers, one module per subcommand.
//!
//! Handlers receive already-parsed arguments and the loaded [`AppConfig`];
//! the adapter wiring shared between them lives here.

pub mod completions;
pub mod config;
pub mod generate;
pub mod init;
pub mod ports;

use berth_adapters::{FilePortLedger, LocalFilesystem, NoProbe, RouteFileResolver, TcpPortProbe};
use berth_core::application::{EndpointPublisher, PortAllocator, PortProbe};
use berth_core::error::{BerthError, BerthResult};

use crate::config::AppConfig;

/// Allocator over the configured ledger file and host probe.
pub(crate) fn build_allocator(config: &AppConfig) -> BerthResult<PortAllocator> {
    if config.ports.base == 0 {
        return Err(BerthError::Configuration {
            message: "ports.base must be between 1 and 65535".into(),
        });
    }
    if config.ports.max_scan == 0 {
        return Err(BerthError::Configuration {
            message: "ports.max_scan must be at least 1".into(),
        });
    }

    let ledger = FilePortLedger::new(&config.ledger.path).with_lock_timeout(config.lock_timeout());
    let probe: Box<dyn PortProbe> = if config.ports.probe_host {
        Box::new(TcpPortProbe::new())
    } else {
        Box::new(NoProbe)
    };

    Ok(PortAllocator::new(Box::new(ledger), probe)
        .with_base(config.ports.base)
        .with_max_scan(config.ports.max_scan))
}

/// Publisher over the configured route table and the local filesystem.
pub(crate) fn build_publisher(config: &AppConfig) -> EndpointPublisher {
    let resolver = RouteFileResolver::new(&config.publish.routes_path)
        .with_domain_suffix(config.publish.domain_suffix.clone())
        .with_lock_timeout(config.lock_timeout());

    EndpointPublisher::new(Box::new(resolver), Box::new(LocalFilesystem::new()))
        .with_domain_suffix(config.publish.domain_suffix.clone())
        .with_summary_file(config.summary_file())
}
