//! Web server command.

use console::style;

use crate::config::Settings;
use crate::server::AppState;

use super::super::helpers::open_configured_store;

/// Start the web server.
pub async fn cmd_serve(settings: &Settings, bind: Option<&str>) -> anyhow::Result<()> {
    let (host, port) = match bind {
        Some(bind) => parse_bind_address(bind, &settings.host, settings.port),
        None => (settings.host.clone(), settings.port),
    };

    println!("{} Opening prospect store...", style("→").cyan());
    let store = match open_configured_store(settings).await {
        Ok(store) => {
            println!("  {} Store ready", style("✓").green());
            store
        }
        Err(e) => {
            eprintln!("  {} Failed to open store: {}", style("✗").red(), e);
            return Err(e);
        }
    };

    println!(
        "{} Starting prospect server at http://{}:{}",
        style("→").cyan(),
        host,
        port
    );
    println!("  Press Ctrl+C to stop");

    let state = AppState::new(store, settings.list_tag_defaults());
    crate::server::serve(state, &host, port).await
}

/// Parse a bind address that can be:
/// - Just a port: "4000" -> <default host>:4000
/// - Just a host: "0.0.0.0" -> 0.0.0.0:<default port>
/// - Host and port: "0.0.0.0:4000" -> 0.0.0.0:4000
fn parse_bind_address(bind: &str, default_host: &str, default_port: u16) -> (String, u16) {
    // Try parsing as just a port number
    if let Ok(port) = bind.parse::<u16>() {
        return (default_host.to_string(), port);
    }

    // Try parsing as host:port
    if let Some((host, port_str)) = bind.rsplit_once(':') {
        if let Ok(port) = port_str.parse::<u16>() {
            return (host.to_string(), port);
        }
    }

    // Must be just a host, use default port
    (bind.to_string(), default_port)
}
