//! Testcontainers setup for etcd.
//!
//! Provides helpers to spin up a single-node etcd for integration tests.

use testcontainers::{clients::Cli, core::WaitFor, Container, GenericImage};

/// Create a single-node etcd container listening on 2379.
///
/// Waits for "ready to serve client requests" on stderr.
pub fn etcd_container(docker: &Cli) -> Container<'_, GenericImage> {
    let image = GenericImage::new("quay.io/coreos/etcd", "v3.5.13")
        .with_env_var("ETCD_LISTEN_CLIENT_URLS", "http://0.0.0.0:2379")
        .with_env_var("ETCD_ADVERTISE_CLIENT_URLS", "http://0.0.0.0:2379")
        .with_exposed_port(2379)
        .with_wait_for(WaitFor::message_on_stderr("ready to serve client requests"));
    docker.run(image)
}

/// Get the client endpoint for a container.
pub fn etcd_endpoint(container: &Container<'_, GenericImage>) -> String {
    let port = container.get_host_port_ipv4(2379);
    format!("http://127.0.0.1:{}", port)
}
